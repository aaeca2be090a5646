//! Tests for register marshaling

use selfde_core::feature::VectorLayout;
use selfde_core::registers::catalog::{FPU_MXCSRMASK, FPU_STMM0, FPU_XMM0, FPU_YMM0, GPR_EAX, GPR_FULL_COUNT};
use selfde_core::registers::marshal::{CANONICAL_REGISTER_COUNT, EXTENDED_CONTEXT_LEN, LEGACY_CONTEXT_LEN};
use selfde_core::registers::{RegisterContext, RegisterError, RegisterId, RegisterMarshaler, RegisterSetId};

const LAYOUTS: [VectorLayout; 2] = [VectorLayout::Legacy, VectorLayout::Extended];

fn pattern(len: usize, seed: u8) -> Vec<u8>
{
    (0..len).map(|i| seed.wrapping_add((i as u8).wrapping_mul(7))).collect()
}

#[test]
fn test_context_lengths()
{
    assert_eq!(RegisterMarshaler::new(VectorLayout::Legacy).context_len(), LEGACY_CONTEXT_LEN);
    assert_eq!(RegisterMarshaler::new(VectorLayout::Extended).context_len(), EXTENDED_CONTEXT_LEN);
    for layout in LAYOUTS {
        let marshaler = RegisterMarshaler::new(layout);
        assert_eq!(marshaler.canonical_order().len(), CANONICAL_REGISTER_COUNT);
        assert_eq!(marshaler.context_len(), marshaler.catalog().canonical_len());
        let context = RegisterContext::new(layout);
        assert_eq!(marshaler.encode(&context).unwrap().len(), marshaler.context_len());
    }
}

#[test]
fn test_canonical_order_blocks()
{
    let legacy = RegisterMarshaler::new(VectorLayout::Legacy);
    let names: Vec<&str> = legacy
        .canonical_order()
        .iter()
        .map(|id| legacy.catalog().descriptor(*id).unwrap().name)
        .collect();
    assert_eq!(&names[..3], &["rax", "rbx", "rcx"]);
    assert_eq!(names[20], "gs");
    assert_eq!(names[21], "fctrl");
    assert_eq!(names[30], "mxcsrmask");
    assert_eq!(names[31], "stmm0");
    assert_eq!(names[39], "xmm0");
    assert_eq!(names[54], "xmm15");
    assert_eq!(&names[55..], &["trapno", "err", "faultvaddr"]);

    let extended = RegisterMarshaler::new(VectorLayout::Extended);
    let vector = extended.catalog().descriptor(extended.canonical_order()[39]).unwrap();
    assert_eq!(vector.name, "ymm0");
}

#[test]
fn test_canonical_order_block_boundaries()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let order = marshaler.canonical_order();
    let full = GPR_FULL_COUNT as usize;
    let scalars = FPU_MXCSRMASK as usize + 1;

    assert_eq!(order[full - 1], RegisterId::gpr(GPR_FULL_COUNT - 1));
    assert_eq!(order[full], RegisterId::fpu(0));
    assert_eq!(order[full + scalars - 1], RegisterId::fpu(FPU_MXCSRMASK));
    assert_eq!(order[full + scalars], RegisterId::fpu(FPU_STMM0));
    assert_eq!(order[full + scalars + 8], RegisterId::fpu(FPU_XMM0));
    // 32-bit views are never serialized
    assert!(!order.contains(&RegisterId::gpr(GPR_EAX)));
}

#[test]
fn test_every_register_round_trips()
{
    for layout in LAYOUTS {
        let marshaler = RegisterMarshaler::new(layout);
        for (n, descriptor) in marshaler.catalog().descriptors().enumerate() {
            let mut context = RegisterContext::new(layout);
            let value = pattern(descriptor.size, n as u8 + 1);
            marshaler.set_register(descriptor.id(), &mut context, &value).unwrap();
            let read = marshaler.get_register(descriptor.id(), &context).unwrap();
            assert_eq!(read.as_slice(), value.as_slice(), "{} ({:?})", descriptor.name, layout);
        }
    }
}

#[test]
fn test_decode_then_encode_is_identity()
{
    for layout in LAYOUTS {
        let marshaler = RegisterMarshaler::new(layout);
        let buffer = pattern(marshaler.context_len(), 0x11);

        let mut context = RegisterContext::new(layout);
        marshaler.decode_from(&mut context, &buffer).unwrap();
        let encoded = marshaler.encode(&context).unwrap();
        assert_eq!(encoded, buffer);

        let mut again = RegisterContext::new(layout);
        marshaler.decode_from(&mut again, &encoded).unwrap();
        assert_eq!(again, context);
        assert_eq!(marshaler.encode(&again).unwrap(), encoded);
    }
}

#[test]
fn test_decoded_fields_land_in_native_slots()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let mut buffer = vec![0u8; LEGACY_CONTEXT_LEN];
    // rip is the 17th register of the canonical buffer
    buffer[16 * 8..17 * 8].copy_from_slice(&0x1000_2000_3000_4000u64.to_le_bytes());
    // faultvaddr is last
    buffer[LEGACY_CONTEXT_LEN - 8..].copy_from_slice(&0xdead_beefu64.to_le_bytes());

    let mut context = RegisterContext::new(VectorLayout::Legacy);
    marshaler.decode_from(&mut context, &buffer).unwrap();
    assert_eq!(context.instruction_pointer(), 0x1000_2000_3000_4000);
    assert_eq!(context.fault_address(), 0xdead_beef);
}

#[test]
fn test_size_mismatch_leaves_context_unchanged()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let mut context = RegisterContext::new(VectorLayout::Legacy);
    marshaler.set_register(RegisterId::gpr(0), &mut context, &[0xaa; 8]).unwrap();
    let before = context.clone();

    let err = marshaler
        .set_register(RegisterId::gpr(0), &mut context, &[0x55; 4])
        .unwrap_err();
    assert_eq!(
        err,
        RegisterError::SizeMismatch {
            name: "rax",
            expected: 8,
            actual: 4
        }
    );
    assert!(marshaler.set_register(RegisterId::gpr(0), &mut context, &[0x55; 9]).is_err());
    assert_eq!(context, before);
}

#[test]
fn test_unknown_register_is_rejected()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let mut context = RegisterContext::new(VectorLayout::Legacy);
    assert_eq!(
        marshaler.get_register(RegisterId::exc(3), &context).unwrap_err(),
        RegisterError::UnknownRegister { set: 3, index: 3 }
    );
    assert!(marshaler
        .set_register(RegisterId::fpu(FPU_YMM0), &mut context, &[0; 32])
        .is_err());
}

#[test]
fn test_thirty_two_bit_write_clears_upper_half()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let mut context = RegisterContext::new(VectorLayout::Legacy);
    marshaler
        .set_register(RegisterId::gpr(0), &mut context, &u64::MAX.to_le_bytes())
        .unwrap();
    marshaler
        .set_register(RegisterId::gpr(GPR_EAX), &mut context, &0xffff_ffffu32.to_le_bytes())
        .unwrap();

    let rax = marshaler.get_register(RegisterId::gpr(0), &context).unwrap();
    assert_eq!(rax.as_slice(), &0x0000_0000_ffff_ffffu64.to_le_bytes());
    assert_eq!(context.gpr("rax"), Some(0x0000_0000_ffff_ffff));
}

#[test]
fn test_narrow_writes_preserve_other_bytes()
{
    let mut context = RegisterContext::new(VectorLayout::Legacy);
    context.set_gpr("rbx", 0x1122_3344_5566_7788).unwrap();
    context.set_gpr("bx", 0xaabb).unwrap();
    assert_eq!(context.gpr("rbx"), Some(0x1122_3344_5566_aabb));
    context.set_gpr("bh", 0xcc).unwrap();
    assert_eq!(context.gpr("rbx"), Some(0x1122_3344_5566_ccbb));
    assert_eq!(context.gpr("bl"), Some(0xbb));
    context.set_gpr("r9d", 0x0102_0304).unwrap();
    assert_eq!(context.gpr("r9"), Some(0x0102_0304));

    assert_eq!(
        context.set_gpr("xmm0", 1).unwrap_err(),
        RegisterError::UnknownRegisterName("xmm0".to_string())
    );
    assert_eq!(context.gpr("bogus"), None);
}

#[test]
fn test_ymm_write_is_visible_through_xmm()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Extended);
    let mut context = RegisterContext::new(VectorLayout::Extended);
    let value = pattern(32, 0x40);
    marshaler
        .set_register(RegisterId::fpu(FPU_YMM0 + 5), &mut context, &value)
        .unwrap();

    let xmm = marshaler.get_register(RegisterId::fpu(FPU_XMM0 + 5), &context).unwrap();
    assert_eq!(xmm.as_slice(), &value[..16]);

    // Writing xmm touches only the low half
    marshaler
        .set_register(RegisterId::fpu(FPU_XMM0 + 5), &mut context, &[0; 16])
        .unwrap();
    let ymm = marshaler.get_register(RegisterId::fpu(FPU_YMM0 + 5), &context).unwrap();
    assert_eq!(&ymm[..16], &[0; 16]);
    assert_eq!(&ymm[16..], &value[16..]);
}

#[test]
fn test_trapno_covers_trap_number_and_cpu()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let mut context = RegisterContext::new(VectorLayout::Legacy);
    marshaler
        .set_register(RegisterId::exc(0), &mut context, &[0x03, 0x00, 0x02, 0x00])
        .unwrap();
    assert_eq!(context.trap_number(), 3);
    assert_eq!(context.trap_cpu(), 2);

    marshaler
        .set_register(RegisterId::exc(1), &mut context, &0x14u32.to_le_bytes())
        .unwrap();
    assert_eq!(context.error_code(), 0x14);
}

#[test]
fn test_read_into_small_buffer_fails()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let context = RegisterContext::new(VectorLayout::Legacy);
    let mut small = [0u8; 4];
    assert_eq!(
        marshaler
            .read_register_into(RegisterId::gpr(16), &context, &mut small)
            .unwrap_err(),
        RegisterError::BufferTooSmall { needed: 8, available: 4 }
    );

    let mut large = [0xffu8; 16];
    assert_eq!(marshaler.read_register_into(RegisterId::gpr(16), &context, &mut large), Ok(8));
    assert_eq!(&large[..8], &[0; 8]);
    assert_eq!(&large[8..], &[0xff; 8]);

    let mut short = vec![0u8; LEGACY_CONTEXT_LEN - 1];
    assert!(matches!(
        marshaler.encode_into(&context, &mut short),
        Err(RegisterError::BufferTooSmall { .. })
    ));
}

#[test]
fn test_decode_rejects_wrong_length()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Extended);
    let mut context = RegisterContext::new(VectorLayout::Extended);
    context.set_gpr("rax", 42).unwrap();
    let before = context.clone();

    let err = marshaler
        .decode_from(&mut context, &vec![0u8; LEGACY_CONTEXT_LEN])
        .unwrap_err();
    assert_eq!(
        err,
        RegisterError::ContextLengthMismatch {
            expected: EXTENDED_CONTEXT_LEN,
            actual: LEGACY_CONTEXT_LEN
        }
    );
    assert_eq!(context, before);
}

#[test]
fn test_layout_mismatch_is_rejected()
{
    let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
    let mut context = RegisterContext::new(VectorLayout::Extended);
    let expected = RegisterError::LayoutMismatch {
        expected: VectorLayout::Legacy,
        actual: VectorLayout::Extended,
    };
    assert_eq!(marshaler.get_register(RegisterId::gpr(0), &context).unwrap_err(), expected);
    assert_eq!(marshaler.encode(&context).unwrap_err(), expected);
    assert_eq!(
        marshaler
            .set_register(RegisterId::gpr(0), &mut context, &[0; 8])
            .unwrap_err(),
        expected
    );
}

#[test]
fn test_context_regions()
{
    let context = RegisterContext::new(VectorLayout::Extended);
    let catalog = RegisterMarshaler::new(VectorLayout::Extended).catalog();
    for set in [RegisterSetId::GeneralPurpose, RegisterSetId::FloatingPoint, RegisterSetId::ExceptionState] {
        assert_eq!(context.region(set).unwrap().len(), catalog.native_size(set));
    }
    assert!(context.region(RegisterSetId::All).is_none());
}
