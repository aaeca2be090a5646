//! Tests for the register catalog

use selfde_core::feature::VectorLayout;
use selfde_core::registers::catalog::{NumberingScheme, FPU_XMM0, FPU_YMM0, GPR_EAX};
use selfde_core::registers::{GenericRole, RegisterCatalog, RegisterError, RegisterId, RegisterSetId, Storage};

const LAYOUTS: [VectorLayout; 2] = [VectorLayout::Legacy, VectorLayout::Extended];

#[test]
fn test_register_sets_and_counts()
{
    let legacy = RegisterCatalog::for_layout(VectorLayout::Legacy);
    let sets = legacy.register_sets();
    assert_eq!(sets.len(), 4);
    assert_eq!(sets[0].id, RegisterSetId::All);
    assert!(sets[0].registers.is_none());
    assert_eq!(sets[0].count, 73 + 34 + 3);
    assert_eq!(sets[1].count, 73);
    assert_eq!(sets[2].count, 34);
    assert_eq!(sets[3].count, 3);

    let extended = RegisterCatalog::for_layout(VectorLayout::Extended);
    let sets = extended.register_sets();
    assert_eq!(sets[0].count, 73 + 50 + 3);
    assert_eq!(sets[2].count, 50);

    for layout in LAYOUTS {
        for set in RegisterCatalog::for_layout(layout).register_sets().iter().skip(1) {
            assert_eq!(set.registers.map(<[_]>::len), Some(set.count), "{}", set.name);
        }
    }
}

#[test]
fn test_set_lookup_by_raw_id()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    assert_eq!(catalog.set(1).unwrap().name, "General Purpose Registers");
    assert_eq!(catalog.set(3).unwrap().id, RegisterSetId::ExceptionState);
    assert_eq!(catalog.set(4).unwrap_err(), RegisterError::UnknownRegisterSet(4));
}

#[test]
fn test_descriptors_fit_native_structures()
{
    for layout in LAYOUTS {
        let catalog = RegisterCatalog::for_layout(layout);
        for descriptor in catalog.descriptors() {
            assert!(descriptor.size > 0, "{}", descriptor.name);
            assert!(
                descriptor.native_end() <= catalog.native_size(descriptor.set),
                "{} overruns its {:?} structure",
                descriptor.name,
                layout
            );
        }
    }
}

#[test]
fn test_subregisters_name_existing_parents()
{
    for layout in LAYOUTS {
        let catalog = RegisterCatalog::for_layout(layout);
        for descriptor in catalog.descriptors().filter(|d| d.is_subregister()) {
            let parent = catalog.find_by_name(descriptor.contained_in.unwrap()).unwrap();
            assert_eq!(parent.set, descriptor.set);
            assert!(parent.size > descriptor.size);
            assert!(descriptor.offset >= parent.offset);
        }
    }
}

#[test]
fn test_descriptor_lookup_by_id()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    assert_eq!(catalog.descriptor(RegisterId::gpr(0)).unwrap().name, "rax");
    assert_eq!(catalog.descriptor(RegisterId::gpr(16)).unwrap().name, "rip");
    assert_eq!(catalog.descriptor(RegisterId::gpr(GPR_EAX)).unwrap().name, "eax");
    assert_eq!(catalog.descriptor(RegisterId::fpu(FPU_XMM0 + 15)).unwrap().name, "xmm15");
    assert_eq!(catalog.descriptor(RegisterId::exc(2)).unwrap().name, "faultvaddr");

    assert_eq!(
        catalog.descriptor(RegisterId::gpr(73)).unwrap_err(),
        RegisterError::UnknownRegister { set: 1, index: 73 }
    );
    // No ymm registers without AVX
    assert!(catalog.descriptor(RegisterId::fpu(FPU_YMM0)).is_err());
    // The aggregate set has no registers of its own
    assert!(catalog.descriptor(RegisterId::new(0, 0)).is_err());
    assert_eq!(
        catalog.descriptor(RegisterId::new(9, 0)).unwrap_err(),
        RegisterError::UnknownRegisterSet(9)
    );
}

#[test]
fn test_find_by_name_and_alias()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    assert_eq!(catalog.find_by_name("rsp").unwrap().index, 7);
    // "sp" is both rsp's alias and the 16-bit view; the 64-bit register comes first
    assert_eq!(catalog.find_by_name("sp").unwrap().name, "rsp");
    assert_eq!(catalog.find_by_name("spl").unwrap().contained_in, Some("rsp"));
    assert_eq!(catalog.find_by_name("pc").unwrap().name, "rip");
    assert_eq!(catalog.find_by_name("flags").unwrap().name, "rflags");
    assert_eq!(catalog.find_by_name("arg1").unwrap().name, "rdi");
    assert_eq!(catalog.find_by_name("mxcsr").unwrap().set, RegisterSetId::FloatingPoint);
    assert!(catalog.find_by_name("ymm0").is_none());
    assert!(catalog.find_by_name("nope").is_none());

    let extended = RegisterCatalog::for_layout(VectorLayout::Extended);
    assert_eq!(extended.find_by_name("ymm3").unwrap().size, 32);
    assert_eq!(extended.find_by_name("xmm3").unwrap().contained_in, Some("ymm3"));
}

#[test]
fn test_find_by_generic_role()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    let expected = [
        (GenericRole::Pc, "rip"),
        (GenericRole::Sp, "rsp"),
        (GenericRole::Fp, "rbp"),
        (GenericRole::Flags, "rflags"),
        (GenericRole::Arg1, "rdi"),
        (GenericRole::Arg2, "rsi"),
        (GenericRole::Arg3, "rdx"),
        (GenericRole::Arg4, "rcx"),
        (GenericRole::Arg5, "r8"),
        (GenericRole::Arg6, "r9"),
    ];
    for (role, name) in expected {
        assert_eq!(catalog.find_by_generic(role).unwrap().name, name);
    }
    assert!(catalog.find_by_generic(GenericRole::Ra).is_none());
}

#[test]
fn test_find_by_dwarf_and_ehframe()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    assert_eq!(catalog.find_by_dwarf(0).unwrap().name, "rax");
    assert_eq!(catalog.find_by_dwarf(1).unwrap().name, "rdx");
    assert_eq!(catalog.find_by_dwarf(7).unwrap().name, "rsp");
    assert_eq!(catalog.find_by_dwarf(16).unwrap().name, "rip");
    assert_eq!(catalog.find_by_dwarf(17).unwrap().name, "xmm0");
    assert_eq!(catalog.find_by_dwarf(33).unwrap().name, "stmm0");
    assert_eq!(catalog.find_by_ehframe(6).unwrap().name, "rbp");
    assert!(catalog.find_by_dwarf(100).is_none());
}

#[test]
fn test_shared_numbers_resolve_to_ymm()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Extended);
    assert_eq!(catalog.find_by_dwarf(17).unwrap().name, "ymm0");
    assert_eq!(catalog.find_by_dwarf(32).unwrap().name, "ymm15");
    assert_eq!(catalog.find_by_wire(40).unwrap().name, "ymm0");
}

#[test]
fn test_find_by_wire()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    assert_eq!(catalog.find_by_wire(0).unwrap().name, "rax");
    assert_eq!(catalog.find_by_wire(17).unwrap().name, "rflags");
    assert_eq!(catalog.find_by_wire(22).unwrap().name, "fs");
    assert_eq!(catalog.find_by_wire(24).unwrap().name, "stmm0");
    assert_eq!(catalog.find_by_wire(55).unwrap().name, "xmm15");
    assert_eq!(catalog.find_by_number(NumberingScheme::Generic, 0).unwrap().name, "rip");
}

#[test]
fn test_missing_numbers_use_sentinel()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    let rflags = catalog.find_by_name("rflags").unwrap();
    assert_eq!(rflags.number(NumberingScheme::Dwarf), None);
    assert_eq!(rflags.raw_number(NumberingScheme::Dwarf), u32::MAX);
    assert_eq!(rflags.raw_number(NumberingScheme::Wire), 17);
}

#[test]
fn test_thirty_two_bit_views_zero_extend()
{
    let catalog = RegisterCatalog::for_layout(VectorLayout::Legacy);
    let eax = catalog.find_by_name("eax").unwrap();
    assert_eq!(eax.storage, Storage::ZeroExtended { parent: 0 });
    let ax = catalog.find_by_name("ax").unwrap();
    assert_eq!(ax.storage, Storage::Direct);
    let ah = catalog.find_by_name("ah").unwrap();
    assert_eq!((ah.offset, ah.size), (1, 1));
    assert!(eax.invalidates.contains(&"rax"));
    assert!(eax.invalidates.contains(&"al"));
}

#[test]
fn test_canonical_lengths()
{
    assert_eq!(RegisterCatalog::for_layout(VectorLayout::Legacy).canonical_len(), 547);
    assert_eq!(RegisterCatalog::for_layout(VectorLayout::Extended).canonical_len(), 803);
}

#[test]
fn test_host_catalog_matches_detected_layout()
{
    let catalog = RegisterCatalog::host();
    assert_eq!(catalog.layout(), selfde_core::feature::vector_layout());
}
