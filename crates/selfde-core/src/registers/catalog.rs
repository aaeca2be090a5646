//! # Register Catalog
//!
//! Static descriptor tables for every addressable x86-64 register.
//!
//! There are two catalogs, one per [`VectorLayout`]. They share the general
//! purpose and exception tables and differ only in the floating point set:
//! the extended catalog adds `ymm0`–`ymm15` and declares each `xmmN` as the
//! low half of `ymmN`.
//!
//! Every descriptor carries four independent numbering schemes. Each one is
//! either populated or `None`; nothing is ever guessed:
//!
//! | scheme   | used by                                   |
//! |----------|-------------------------------------------|
//! | eh_frame | stack unwinders (`.eh_frame` CFI)         |
//! | DWARF    | debug information                         |
//! | generic  | cross-architecture roles (pc, sp, fp, ...)|
//! | wire     | remote debugging protocol register number |
//!
//! On x86-64 the eh_frame and DWARF numbers are identical.
//!
//! Offsets are byte offsets into the native Mach structure of the set:
//! `x86_thread_state64_t` (GPR), `x86_float_state64_t` /
//! `x86_avx_state64_t` (FPU) and `x86_exception_state64_t` (EXC).
//!
//! ## References
//!
//! - [System V AMD64 ABI, DWARF register mapping](https://gitlab.com/x86-psABIs/x86-64-ABI)
//! - [xnu `mach/i386/_structs.h`](https://github.com/apple-oss-distributions/xnu/blob/main/osfmk/mach/i386/_structs.h)

use crate::feature::{self, VectorLayout};
use crate::registers::context::{
    AVX_STATE_SIZE, EXCEPTION_STATE_SIZE, FLOAT_STATE_SIZE, STMM_OFFSET, THREAD_STATE_SIZE, XMM_OFFSET, YMMH_OFFSET,
};
use crate::registers::error::RegisterError;
use crate::registers::RegisterId;

/// Raw value used by external consumers for "no number in this scheme".
pub const INVALID_REGNUM: u32 = u32::MAX;

/// Register set ids, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RegisterSetId
{
    /// Synthetic aggregate of every register; has no descriptor list
    All = 0,
    /// `x86_thread_state64_t` and its narrower views
    GeneralPurpose = 1,
    /// `x87`/SSE/AVX state
    FloatingPoint = 2,
    /// `x86_exception_state64_t`
    ExceptionState = 3,
}

impl TryFrom<u32> for RegisterSetId
{
    type Error = RegisterError;

    fn try_from(value: u32) -> Result<Self, Self::Error>
    {
        match value {
            0 => Ok(RegisterSetId::All),
            1 => Ok(RegisterSetId::GeneralPurpose),
            2 => Ok(RegisterSetId::FloatingPoint),
            3 => Ok(RegisterSetId::ExceptionState),
            other => Err(RegisterError::UnknownRegisterSet(other)),
        }
    }
}

/// How a register value is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind
{
    /// Unsigned integer
    Uint,
    /// Signed integer
    Sint,
    /// IEEE 754 float
    Ieee754,
    /// Vector of smaller elements
    Vector,
}

/// Preferred display format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat
{
    Binary,
    Decimal,
    Hex,
    Float,
    VectorOfSInt8,
    VectorOfUInt8,
    VectorOfSInt16,
    VectorOfUInt16,
    VectorOfSInt32,
    VectorOfUInt32,
    VectorOfFloat32,
    VectorOfUInt128,
}

/// Cross-architecture register role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum GenericRole
{
    Pc = 0,
    Sp = 1,
    Fp = 2,
    Ra = 3,
    Flags = 4,
    Arg1 = 5,
    Arg2 = 6,
    Arg3 = 7,
    Arg4 = 8,
    Arg5 = 9,
    Arg6 = 10,
    Arg7 = 11,
    Arg8 = 12,
}

impl GenericRole
{
    /// Generic register number of the role.
    pub fn number(self) -> u32
    {
        self as u32
    }

    /// Conventional role name (`"pc"`, `"arg1"`, ...).
    pub fn name(self) -> &'static str
    {
        match self {
            GenericRole::Pc => "pc",
            GenericRole::Sp => "sp",
            GenericRole::Fp => "fp",
            GenericRole::Ra => "ra",
            GenericRole::Flags => "flags",
            GenericRole::Arg1 => "arg1",
            GenericRole::Arg2 => "arg2",
            GenericRole::Arg3 => "arg3",
            GenericRole::Arg4 => "arg4",
            GenericRole::Arg5 => "arg5",
            GenericRole::Arg6 => "arg6",
            GenericRole::Arg7 => "arg7",
            GenericRole::Arg8 => "arg8",
        }
    }
}

/// Register numbering scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingScheme
{
    EhFrame,
    Dwarf,
    Generic,
    Wire,
}

/// Where the bytes of a register live inside its native structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage
{
    /// `size` contiguous bytes at `offset`
    Direct,
    /// Contiguous, and a write clears the 8-byte parent at `parent` first
    /// (32-bit general purpose views)
    ZeroExtended
    {
        /// Offset of the 64-bit parent register
        parent: usize,
    },
    /// Low half at `offset`, high half at `high` (AVX `ymm` registers)
    Split
    {
        /// Offset of the upper 16 bytes
        high: usize,
    },
}

/// Metadata for one addressable register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterDescriptor
{
    pub set: RegisterSetId,
    /// Dense native index inside the set
    pub index: u32,
    pub name: &'static str,
    pub alt_name: Option<&'static str>,
    pub kind: ValueKind,
    pub format: DisplayFormat,
    /// Size in bytes
    pub size: usize,
    /// Byte offset inside the native structure of the set
    pub offset: usize,
    pub storage: Storage,
    pub ehframe: Option<u32>,
    pub dwarf: Option<u32>,
    pub generic: Option<GenericRole>,
    pub wire: Option<u32>,
    /// Wider register whose storage this one is a sub-range of
    pub contained_in: Option<&'static str>,
    /// Registers that become stale when this one is written
    pub invalidates: &'static [&'static str],
}

impl RegisterDescriptor
{
    const fn new(
        set: RegisterSetId,
        index: u32,
        name: &'static str,
        kind: ValueKind,
        format: DisplayFormat,
        size: usize,
        offset: usize,
    ) -> Self
    {
        Self {
            set,
            index,
            name,
            alt_name: None,
            kind,
            format,
            size,
            offset,
            storage: Storage::Direct,
            ehframe: None,
            dwarf: None,
            generic: None,
            wire: None,
            contained_in: None,
            invalidates: &[],
        }
    }

    const fn dwarf(self, number: u32) -> Self
    {
        Self {
            ehframe: Some(number),
            dwarf: Some(number),
            ..self
        }
    }

    const fn wire(self, number: u32) -> Self
    {
        Self {
            wire: Some(number),
            ..self
        }
    }

    const fn role(self, role: GenericRole, alt_name: &'static str) -> Self
    {
        Self {
            generic: Some(role),
            alt_name: Some(alt_name),
            ..self
        }
    }

    const fn invalidating(self, invalidates: &'static [&'static str]) -> Self
    {
        Self { invalidates, ..self }
    }

    const fn within(self, parent: &'static str, storage: Storage) -> Self
    {
        Self {
            contained_in: Some(parent),
            storage,
            ..self
        }
    }

    /// The id addressing this register.
    pub fn id(&self) -> RegisterId
    {
        RegisterId::new(self.set as u32, self.index)
    }

    /// Number of this register in `scheme`, if it has one.
    pub fn number(&self, scheme: NumberingScheme) -> Option<u32>
    {
        match scheme {
            NumberingScheme::EhFrame => self.ehframe,
            NumberingScheme::Dwarf => self.dwarf,
            NumberingScheme::Generic => self.generic.map(GenericRole::number),
            NumberingScheme::Wire => self.wire,
        }
    }

    /// Like [`RegisterDescriptor::number`], with [`INVALID_REGNUM`] for "none".
    pub fn raw_number(&self, scheme: NumberingScheme) -> u32
    {
        self.number(scheme).unwrap_or(INVALID_REGNUM)
    }

    /// `true` for narrower views of a wider register.
    pub fn is_subregister(&self) -> bool
    {
        self.contained_in.is_some()
    }

    /// One past the last native byte this register touches.
    pub fn native_end(&self) -> usize
    {
        match self.storage {
            Storage::Split { high } => high + self.size / 2,
            Storage::Direct | Storage::ZeroExtended { .. } => self.offset + self.size,
        }
    }
}

/// A named group of registers
#[derive(Debug, Clone, Copy)]
pub struct RegisterSet
{
    pub id: RegisterSetId,
    pub name: &'static str,
    /// `None` for the synthetic all-registers aggregate
    pub registers: Option<&'static [RegisterDescriptor]>,
    /// Number of registers in the set (for the aggregate, in all sets)
    pub count: usize,
}

/// The register sets for one vector layout
#[derive(Debug)]
pub struct RegisterCatalog
{
    layout: VectorLayout,
    sets: [RegisterSet; 4],
}

impl RegisterCatalog
{
    /// Catalog for an explicit layout.
    pub fn for_layout(layout: VectorLayout) -> &'static RegisterCatalog
    {
        match layout {
            VectorLayout::Legacy => &LEGACY_CATALOG,
            VectorLayout::Extended => &EXTENDED_CATALOG,
        }
    }

    /// Catalog for the layout detected on this host.
    pub fn host() -> &'static RegisterCatalog
    {
        Self::for_layout(feature::vector_layout())
    }

    pub fn layout(&self) -> VectorLayout
    {
        self.layout
    }

    /// All register sets, the aggregate first. The slice length is the set count.
    pub fn register_sets(&self) -> &[RegisterSet]
    {
        &self.sets
    }

    /// Look up a register set by raw id.
    ///
    /// ## Errors
    ///
    /// [`RegisterError::UnknownRegisterSet`] for ids past the last set.
    pub fn set(&self, id: u32) -> Result<&RegisterSet, RegisterError>
    {
        let id = RegisterSetId::try_from(id)?;
        Ok(&self.sets[id as usize])
    }

    /// Look up a single descriptor.
    ///
    /// The aggregate set has no descriptors of its own, so ids naming it are
    /// rejected like any other unknown register.
    ///
    /// ## Errors
    ///
    /// [`RegisterError::UnknownRegisterSet`] or [`RegisterError::UnknownRegister`].
    pub fn descriptor(&self, id: RegisterId) -> Result<&'static RegisterDescriptor, RegisterError>
    {
        let unknown = RegisterError::UnknownRegister {
            set: id.set,
            index: id.index,
        };
        let registers = self.set(id.set)?.registers.ok_or_else(|| unknown.clone())?;
        // Dense indices follow table position except in the AVX table, which lists ymm before xmm.
        match registers.get(id.index as usize) {
            Some(descriptor) if descriptor.index == id.index => Ok(descriptor),
            _ => registers.iter().find(|d| d.index == id.index).ok_or(unknown),
        }
    }

    /// Every descriptor of every concrete set, in set order.
    pub fn descriptors(&self) -> impl Iterator<Item = &'static RegisterDescriptor> + '_
    {
        self.sets
            .iter()
            .filter_map(|set| set.registers)
            .flat_map(|registers| registers.iter())
    }

    /// Find a register by primary or alternate name.
    pub fn find_by_name(&self, name: &str) -> Option<&'static RegisterDescriptor>
    {
        self.descriptors()
            .find(|d| d.name == name || d.alt_name == Some(name))
    }

    /// Find the register numbered `number` in `scheme`.
    ///
    /// eh_frame, DWARF and wire numbers are shared between `xmmN` and `ymmN`
    /// in the extended catalog; the wider register is returned.
    pub fn find_by_number(&self, scheme: NumberingScheme, number: u32) -> Option<&'static RegisterDescriptor>
    {
        self.descriptors()
            .filter(|d| d.number(scheme) == Some(number))
            .max_by_key(|d| d.size)
    }

    pub fn find_by_generic(&self, role: GenericRole) -> Option<&'static RegisterDescriptor>
    {
        self.descriptors().find(|d| d.generic == Some(role))
    }

    pub fn find_by_dwarf(&self, number: u32) -> Option<&'static RegisterDescriptor>
    {
        self.find_by_number(NumberingScheme::Dwarf, number)
    }

    pub fn find_by_ehframe(&self, number: u32) -> Option<&'static RegisterDescriptor>
    {
        self.find_by_number(NumberingScheme::EhFrame, number)
    }

    pub fn find_by_wire(&self, number: u32) -> Option<&'static RegisterDescriptor>
    {
        self.find_by_number(NumberingScheme::Wire, number)
    }

    /// Size in bytes of the native structure backing `set`.
    pub fn native_size(&self, set: RegisterSetId) -> usize
    {
        match (set, self.layout) {
            (RegisterSetId::GeneralPurpose, _) => THREAD_STATE_SIZE,
            (RegisterSetId::FloatingPoint, VectorLayout::Legacy) => FLOAT_STATE_SIZE,
            (RegisterSetId::FloatingPoint, VectorLayout::Extended) => AVX_STATE_SIZE,
            (RegisterSetId::ExceptionState, _) => EXCEPTION_STATE_SIZE,
            (RegisterSetId::All, _) => 0,
        }
    }

    /// Length of the canonical buffer for this catalog's layout.
    ///
    /// Sub-registers (including `xmmN` under `ymmN`) are not serialized on
    /// their own.
    pub fn canonical_len(&self) -> usize
    {
        self.descriptors()
            .filter(|descriptor| !descriptor.is_subregister())
            .map(|descriptor| descriptor.size)
            .sum()
    }
}

const fn gpr(index: u32, name: &'static str, offset: usize) -> RegisterDescriptor
{
    RegisterDescriptor::new(
        RegisterSetId::GeneralPurpose,
        index,
        name,
        ValueKind::Uint,
        DisplayFormat::Hex,
        8,
        offset,
    )
}

/// A narrower view of the 64-bit register at `parent_offset`, starting `byte` bytes in.
const fn view(
    index: u32,
    name: &'static str,
    size: usize,
    byte: usize,
    parent: &'static str,
    parent_offset: usize,
    family: &'static [&'static str],
) -> RegisterDescriptor
{
    let storage = if size == 4 {
        Storage::ZeroExtended { parent: parent_offset }
    } else {
        Storage::Direct
    };
    RegisterDescriptor::new(
        RegisterSetId::GeneralPurpose,
        index,
        name,
        ValueKind::Uint,
        DisplayFormat::Hex,
        size,
        parent_offset + byte,
    )
    .within(parent, storage)
    .invalidating(family)
}

const fn fpu(index: u32, name: &'static str, size: usize, offset: usize) -> RegisterDescriptor
{
    RegisterDescriptor::new(
        RegisterSetId::FloatingPoint,
        index,
        name,
        ValueKind::Uint,
        DisplayFormat::Hex,
        size,
        offset,
    )
}

const fn stmm(n: u32, name: &'static str) -> RegisterDescriptor
{
    RegisterDescriptor::new(
        RegisterSetId::FloatingPoint,
        FPU_STMM0 + n,
        name,
        ValueKind::Vector,
        DisplayFormat::VectorOfUInt8,
        10,
        STMM_OFFSET + 16 * n as usize,
    )
    .dwarf(DWARF_STMM0 + n)
    .wire(WIRE_STMM0 + n)
}

const fn xmm(n: u32, name: &'static str) -> RegisterDescriptor
{
    RegisterDescriptor::new(
        RegisterSetId::FloatingPoint,
        FPU_XMM0 + n,
        name,
        ValueKind::Vector,
        DisplayFormat::VectorOfUInt8,
        16,
        XMM_OFFSET + 16 * n as usize,
    )
    .dwarf(DWARF_XMM0 + n)
    .wire(WIRE_XMM0 + n)
}

const fn xmm_in(n: u32, name: &'static str, parent: &'static str) -> RegisterDescriptor
{
    xmm(n, name).within(parent, Storage::Direct)
}

const fn ymm(n: u32, name: &'static str) -> RegisterDescriptor
{
    RegisterDescriptor {
        index: FPU_YMM0 + n,
        name,
        size: 32,
        storage: Storage::Split {
            high: YMMH_OFFSET + 16 * n as usize,
        },
        ..xmm(n, name)
    }
}

const fn exc(index: u32, name: &'static str, size: usize, offset: usize) -> RegisterDescriptor
{
    RegisterDescriptor::new(
        RegisterSetId::ExceptionState,
        index,
        name,
        ValueKind::Uint,
        DisplayFormat::Hex,
        size,
        offset,
    )
}

/// Dense index of the first 32-bit general purpose view.
pub const GPR_EAX: u32 = 21;
/// Number of 64-bit general purpose registers.
pub const GPR_FULL_COUNT: u32 = 21;
/// Dense index of the last floating point scalar.
pub const FPU_MXCSRMASK: u32 = 9;
pub const FPU_STMM0: u32 = 10;
pub const FPU_XMM0: u32 = 18;
pub const FPU_YMM0: u32 = 34;

const DWARF_XMM0: u32 = 17;
const DWARF_STMM0: u32 = 33;
const WIRE_STMM0: u32 = 24;
const WIRE_XMM0: u32 = 40;

const RAX: &[&str] = &["rax", "eax", "ax", "ah", "al"];
const RBX: &[&str] = &["rbx", "ebx", "bx", "bh", "bl"];
const RCX: &[&str] = &["rcx", "ecx", "cx", "ch", "cl"];
const RDX: &[&str] = &["rdx", "edx", "dx", "dh", "dl"];
const RDI: &[&str] = &["rdi", "edi", "di", "dil"];
const RSI: &[&str] = &["rsi", "esi", "si", "sil"];
const RBP: &[&str] = &["rbp", "ebp", "bp", "bpl"];
const RSP: &[&str] = &["rsp", "esp", "sp", "spl"];
const R8: &[&str] = &["r8", "r8d", "r8w", "r8l"];
const R9: &[&str] = &["r9", "r9d", "r9w", "r9l"];
const R10: &[&str] = &["r10", "r10d", "r10w", "r10l"];
const R11: &[&str] = &["r11", "r11d", "r11w", "r11l"];
const R12: &[&str] = &["r12", "r12d", "r12w", "r12l"];
const R13: &[&str] = &["r13", "r13d", "r13w", "r13l"];
const R14: &[&str] = &["r14", "r14d", "r14w", "r14l"];
const R15: &[&str] = &["r15", "r15d", "r15w", "r15l"];

static GPR_REGISTERS: [RegisterDescriptor; GPR_COUNT] = [
    gpr(0, "rax", 0).dwarf(0).wire(0).invalidating(RAX),
    gpr(1, "rbx", 8).dwarf(3).wire(1).invalidating(RBX),
    gpr(2, "rcx", 16).dwarf(2).wire(2).role(GenericRole::Arg4, "arg4").invalidating(RCX),
    gpr(3, "rdx", 24).dwarf(1).wire(3).role(GenericRole::Arg3, "arg3").invalidating(RDX),
    gpr(4, "rdi", 32).dwarf(5).wire(5).role(GenericRole::Arg1, "arg1").invalidating(RDI),
    gpr(5, "rsi", 40).dwarf(4).wire(4).role(GenericRole::Arg2, "arg2").invalidating(RSI),
    gpr(6, "rbp", 48).dwarf(6).wire(6).role(GenericRole::Fp, "fp").invalidating(RBP),
    gpr(7, "rsp", 56).dwarf(7).wire(7).role(GenericRole::Sp, "sp").invalidating(RSP),
    gpr(8, "r8", 64).dwarf(8).wire(8).role(GenericRole::Arg5, "arg5").invalidating(R8),
    gpr(9, "r9", 72).dwarf(9).wire(9).role(GenericRole::Arg6, "arg6").invalidating(R9),
    gpr(10, "r10", 80).dwarf(10).wire(10).invalidating(R10),
    gpr(11, "r11", 88).dwarf(11).wire(11).invalidating(R11),
    gpr(12, "r12", 96).dwarf(12).wire(12).invalidating(R12),
    gpr(13, "r13", 104).dwarf(13).wire(13).invalidating(R13),
    gpr(14, "r14", 112).dwarf(14).wire(14).invalidating(R14),
    gpr(15, "r15", 120).dwarf(15).wire(15).invalidating(R15),
    gpr(16, "rip", 128).dwarf(16).wire(16).role(GenericRole::Pc, "pc"),
    gpr(17, "rflags", 136).wire(17).role(GenericRole::Flags, "flags"),
    gpr(18, "cs", 144).wire(18),
    gpr(19, "fs", 152).wire(22),
    gpr(20, "gs", 160).wire(23),
    view(21, "eax", 4, 0, "rax", 0, RAX),
    view(22, "ebx", 4, 0, "rbx", 8, RBX),
    view(23, "ecx", 4, 0, "rcx", 16, RCX),
    view(24, "edx", 4, 0, "rdx", 24, RDX),
    view(25, "edi", 4, 0, "rdi", 32, RDI),
    view(26, "esi", 4, 0, "rsi", 40, RSI),
    view(27, "ebp", 4, 0, "rbp", 48, RBP),
    view(28, "esp", 4, 0, "rsp", 56, RSP),
    view(29, "r8d", 4, 0, "r8", 64, R8),
    view(30, "r9d", 4, 0, "r9", 72, R9),
    view(31, "r10d", 4, 0, "r10", 80, R10),
    view(32, "r11d", 4, 0, "r11", 88, R11),
    view(33, "r12d", 4, 0, "r12", 96, R12),
    view(34, "r13d", 4, 0, "r13", 104, R13),
    view(35, "r14d", 4, 0, "r14", 112, R14),
    view(36, "r15d", 4, 0, "r15", 120, R15),
    view(37, "ax", 2, 0, "rax", 0, RAX),
    view(38, "bx", 2, 0, "rbx", 8, RBX),
    view(39, "cx", 2, 0, "rcx", 16, RCX),
    view(40, "dx", 2, 0, "rdx", 24, RDX),
    view(41, "di", 2, 0, "rdi", 32, RDI),
    view(42, "si", 2, 0, "rsi", 40, RSI),
    view(43, "bp", 2, 0, "rbp", 48, RBP),
    view(44, "sp", 2, 0, "rsp", 56, RSP),
    view(45, "r8w", 2, 0, "r8", 64, R8),
    view(46, "r9w", 2, 0, "r9", 72, R9),
    view(47, "r10w", 2, 0, "r10", 80, R10),
    view(48, "r11w", 2, 0, "r11", 88, R11),
    view(49, "r12w", 2, 0, "r12", 96, R12),
    view(50, "r13w", 2, 0, "r13", 104, R13),
    view(51, "r14w", 2, 0, "r14", 112, R14),
    view(52, "r15w", 2, 0, "r15", 120, R15),
    view(53, "ah", 1, 1, "rax", 0, RAX),
    view(54, "bh", 1, 1, "rbx", 8, RBX),
    view(55, "ch", 1, 1, "rcx", 16, RCX),
    view(56, "dh", 1, 1, "rdx", 24, RDX),
    view(57, "al", 1, 0, "rax", 0, RAX),
    view(58, "bl", 1, 0, "rbx", 8, RBX),
    view(59, "cl", 1, 0, "rcx", 16, RCX),
    view(60, "dl", 1, 0, "rdx", 24, RDX),
    view(61, "dil", 1, 0, "rdi", 32, RDI),
    view(62, "sil", 1, 0, "rsi", 40, RSI),
    view(63, "bpl", 1, 0, "rbp", 48, RBP),
    view(64, "spl", 1, 0, "rsp", 56, RSP),
    view(65, "r8l", 1, 0, "r8", 64, R8),
    view(66, "r9l", 1, 0, "r9", 72, R9),
    view(67, "r10l", 1, 0, "r10", 80, R10),
    view(68, "r11l", 1, 0, "r11", 88, R11),
    view(69, "r12l", 1, 0, "r12", 96, R12),
    view(70, "r13l", 1, 0, "r13", 104, R13),
    view(71, "r14l", 1, 0, "r14", 112, R14),
    view(72, "r15l", 1, 0, "r15", 120, R15),
];

// x87 control/status fields share offsets between the float and AVX structures.
const FPU_SCALARS: [RegisterDescriptor; 10] = [
    fpu(0, "fctrl", 2, 8),
    fpu(1, "fstat", 2, 10),
    fpu(2, "ftag", 1, 12),
    fpu(3, "fop", 2, 14),
    fpu(4, "fioff", 4, 16),
    fpu(5, "fiseg", 2, 20),
    fpu(6, "fooff", 4, 24),
    fpu(7, "foseg", 2, 28),
    fpu(8, "mxcsr", 4, 32),
    fpu(9, "mxcsrmask", 4, 36),
];

const STMM: [RegisterDescriptor; 8] = [
    stmm(0, "stmm0"),
    stmm(1, "stmm1"),
    stmm(2, "stmm2"),
    stmm(3, "stmm3"),
    stmm(4, "stmm4"),
    stmm(5, "stmm5"),
    stmm(6, "stmm6"),
    stmm(7, "stmm7"),
];

static FPU_REGISTERS_LEGACY: [RegisterDescriptor; FPU_LEGACY_COUNT] = [
    FPU_SCALARS[0],
    FPU_SCALARS[1],
    FPU_SCALARS[2],
    FPU_SCALARS[3],
    FPU_SCALARS[4],
    FPU_SCALARS[5],
    FPU_SCALARS[6],
    FPU_SCALARS[7],
    FPU_SCALARS[8],
    FPU_SCALARS[9],
    STMM[0],
    STMM[1],
    STMM[2],
    STMM[3],
    STMM[4],
    STMM[5],
    STMM[6],
    STMM[7],
    xmm(0, "xmm0"),
    xmm(1, "xmm1"),
    xmm(2, "xmm2"),
    xmm(3, "xmm3"),
    xmm(4, "xmm4"),
    xmm(5, "xmm5"),
    xmm(6, "xmm6"),
    xmm(7, "xmm7"),
    xmm(8, "xmm8"),
    xmm(9, "xmm9"),
    xmm(10, "xmm10"),
    xmm(11, "xmm11"),
    xmm(12, "xmm12"),
    xmm(13, "xmm13"),
    xmm(14, "xmm14"),
    xmm(15, "xmm15"),
];

static FPU_REGISTERS_EXTENDED: [RegisterDescriptor; FPU_EXTENDED_COUNT] = [
    FPU_SCALARS[0],
    FPU_SCALARS[1],
    FPU_SCALARS[2],
    FPU_SCALARS[3],
    FPU_SCALARS[4],
    FPU_SCALARS[5],
    FPU_SCALARS[6],
    FPU_SCALARS[7],
    FPU_SCALARS[8],
    FPU_SCALARS[9],
    STMM[0],
    STMM[1],
    STMM[2],
    STMM[3],
    STMM[4],
    STMM[5],
    STMM[6],
    STMM[7],
    ymm(0, "ymm0"),
    ymm(1, "ymm1"),
    ymm(2, "ymm2"),
    ymm(3, "ymm3"),
    ymm(4, "ymm4"),
    ymm(5, "ymm5"),
    ymm(6, "ymm6"),
    ymm(7, "ymm7"),
    ymm(8, "ymm8"),
    ymm(9, "ymm9"),
    ymm(10, "ymm10"),
    ymm(11, "ymm11"),
    ymm(12, "ymm12"),
    ymm(13, "ymm13"),
    ymm(14, "ymm14"),
    ymm(15, "ymm15"),
    xmm_in(0, "xmm0", "ymm0"),
    xmm_in(1, "xmm1", "ymm1"),
    xmm_in(2, "xmm2", "ymm2"),
    xmm_in(3, "xmm3", "ymm3"),
    xmm_in(4, "xmm4", "ymm4"),
    xmm_in(5, "xmm5", "ymm5"),
    xmm_in(6, "xmm6", "ymm6"),
    xmm_in(7, "xmm7", "ymm7"),
    xmm_in(8, "xmm8", "ymm8"),
    xmm_in(9, "xmm9", "ymm9"),
    xmm_in(10, "xmm10", "ymm10"),
    xmm_in(11, "xmm11", "ymm11"),
    xmm_in(12, "xmm12", "ymm12"),
    xmm_in(13, "xmm13", "ymm13"),
    xmm_in(14, "xmm14", "ymm14"),
    xmm_in(15, "xmm15", "ymm15"),
];

// trapno is exposed as 32 bits: the 16-bit trap number followed by the 16-bit cpu field.
static EXC_REGISTERS: [RegisterDescriptor; EXC_REGISTER_COUNT] = [
    exc(0, "trapno", 4, 0),
    exc(1, "err", 4, 4),
    exc(2, "faultvaddr", 8, 8),
];

const GPR_COUNT: usize = 73;
const FPU_LEGACY_COUNT: usize = 34;
const FPU_EXTENDED_COUNT: usize = 50;
const EXC_REGISTER_COUNT: usize = 3;

static LEGACY_CATALOG: RegisterCatalog = RegisterCatalog {
    layout: VectorLayout::Legacy,
    sets: [
        RegisterSet {
            id: RegisterSetId::All,
            name: "x86_64 Registers",
            registers: None,
            count: GPR_COUNT + FPU_LEGACY_COUNT + EXC_REGISTER_COUNT,
        },
        RegisterSet {
            id: RegisterSetId::GeneralPurpose,
            name: "General Purpose Registers",
            registers: Some(&GPR_REGISTERS),
            count: GPR_COUNT,
        },
        RegisterSet {
            id: RegisterSetId::FloatingPoint,
            name: "Floating Point Registers",
            registers: Some(&FPU_REGISTERS_LEGACY),
            count: FPU_LEGACY_COUNT,
        },
        RegisterSet {
            id: RegisterSetId::ExceptionState,
            name: "Exception State Registers",
            registers: Some(&EXC_REGISTERS),
            count: EXC_REGISTER_COUNT,
        },
    ],
};

static EXTENDED_CATALOG: RegisterCatalog = RegisterCatalog {
    layout: VectorLayout::Extended,
    sets: [
        RegisterSet {
            id: RegisterSetId::All,
            name: "x86_64 Registers",
            registers: None,
            count: GPR_COUNT + FPU_EXTENDED_COUNT + EXC_REGISTER_COUNT,
        },
        RegisterSet {
            id: RegisterSetId::GeneralPurpose,
            name: "General Purpose Registers",
            registers: Some(&GPR_REGISTERS),
            count: GPR_COUNT,
        },
        RegisterSet {
            id: RegisterSetId::FloatingPoint,
            name: "Floating Point Registers",
            registers: Some(&FPU_REGISTERS_EXTENDED),
            count: FPU_EXTENDED_COUNT,
        },
        RegisterSet {
            id: RegisterSetId::ExceptionState,
            name: "Exception State Registers",
            registers: Some(&EXC_REGISTERS),
            count: EXC_REGISTER_COUNT,
        },
    ],
};
