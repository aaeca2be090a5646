//! # Register Context
//!
//! The complete register state of one x86-64 thread, kept as byte images of
//! the native Mach structures:
//!
//! | structure                  | flavor                  | bytes | `natural_t` count |
//! |----------------------------|-------------------------|-------|-------------------|
//! | `x86_thread_state64_t`     | `x86_THREAD_STATE64`    | 168   | 42                |
//! | `x86_float_state64_t`      | `x86_FLOAT_STATE64`     | 524   | 131               |
//! | `x86_avx_state64_t`        | `x86_AVX_STATE64`       | 844   | 211               |
//! | `x86_exception_state64_t`  | `x86_EXCEPTION_STATE64` | 16    | 4                 |
//!
//! Keeping bytes rather than `#[repr(C)]` structs lets the catalog offsets be
//! applied with checked slicing and no pointer casts; the kernel backend
//! copies these images to and from `thread_get_state` buffers.
//!
//! Exactly one of the float and AVX images exists in a context, chosen by
//! its [`VectorLayout`].

use crate::feature::VectorLayout;
use crate::registers::catalog::{RegisterCatalog, RegisterDescriptor, RegisterSetId};
use crate::registers::error::RegisterError;
use crate::registers::marshal::RegisterMarshaler;

/// `sizeof(x86_thread_state64_t)`
pub const THREAD_STATE_SIZE: usize = 168;
/// `sizeof(x86_float_state64_t)`
pub const FLOAT_STATE_SIZE: usize = 524;
/// `sizeof(x86_avx_state64_t)`
pub const AVX_STATE_SIZE: usize = 844;
/// `sizeof(x86_exception_state64_t)`
pub const EXCEPTION_STATE_SIZE: usize = 16;

/// Offset of `__fpu_stmm0` in both floating point structures.
pub const STMM_OFFSET: usize = 40;
/// Offset of `__fpu_xmm0` in both floating point structures.
pub const XMM_OFFSET: usize = 168;
/// Offset of `__fpu_ymmh0` in `x86_avx_state64_t`.
pub const YMMH_OFFSET: usize = 588;

const RBP_OFFSET: usize = 48;
const RSP_OFFSET: usize = 56;
const RIP_OFFSET: usize = 128;
const RFLAGS_OFFSET: usize = 136;

const TRAPNO_OFFSET: usize = 0;
const CPU_OFFSET: usize = 2;
const ERR_OFFSET: usize = 4;
const FAULTVADDR_OFFSET: usize = 8;

/// Floating point / vector state in one of its two representations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorState
{
    /// `x86_float_state64_t`
    Legacy([u8; FLOAT_STATE_SIZE]),
    /// `x86_avx_state64_t`
    Extended([u8; AVX_STATE_SIZE]),
}

impl VectorState
{
    /// Zeroed state for `layout`.
    pub fn new(layout: VectorLayout) -> Self
    {
        match layout {
            VectorLayout::Legacy => VectorState::Legacy([0; FLOAT_STATE_SIZE]),
            VectorLayout::Extended => VectorState::Extended([0; AVX_STATE_SIZE]),
        }
    }

    pub fn layout(&self) -> VectorLayout
    {
        match self {
            VectorState::Legacy(_) => VectorLayout::Legacy,
            VectorState::Extended(_) => VectorLayout::Extended,
        }
    }

    pub fn as_bytes(&self) -> &[u8]
    {
        match self {
            VectorState::Legacy(bytes) => &bytes[..],
            VectorState::Extended(bytes) => &bytes[..],
        }
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8]
    {
        match self {
            VectorState::Legacy(bytes) => &mut bytes[..],
            VectorState::Extended(bytes) => &mut bytes[..],
        }
    }
}

/// Full register state of one thread
///
/// A context does no locking of its own. When it mirrors a live thread, the
/// caller keeps that thread suspended between capture and apply.
///
/// ```rust
/// use selfde_core::feature::VectorLayout;
/// use selfde_core::registers::RegisterContext;
///
/// let mut context = RegisterContext::new(VectorLayout::Legacy);
/// context.set_instruction_pointer(0x1000_2000);
/// assert_eq!(context.instruction_pointer(), 0x1000_2000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterContext
{
    gpr: [u8; THREAD_STATE_SIZE],
    vector: VectorState,
    exception: [u8; EXCEPTION_STATE_SIZE],
}

impl RegisterContext
{
    /// A zeroed context for `layout`.
    pub fn new(layout: VectorLayout) -> Self
    {
        Self {
            gpr: [0; THREAD_STATE_SIZE],
            vector: VectorState::new(layout),
            exception: [0; EXCEPTION_STATE_SIZE],
        }
    }

    pub fn layout(&self) -> VectorLayout
    {
        self.vector.layout()
    }

    pub fn vector_state(&self) -> &VectorState
    {
        &self.vector
    }

    /// Native bytes backing register set `set`; `None` for the aggregate set.
    pub fn region(&self, set: RegisterSetId) -> Option<&[u8]>
    {
        match set {
            RegisterSetId::GeneralPurpose => Some(&self.gpr[..]),
            RegisterSetId::FloatingPoint => Some(self.vector.as_bytes()),
            RegisterSetId::ExceptionState => Some(&self.exception[..]),
            RegisterSetId::All => None,
        }
    }

    /// Mutable form of [`RegisterContext::region`].
    pub fn region_mut(&mut self, set: RegisterSetId) -> Option<&mut [u8]>
    {
        match set {
            RegisterSetId::GeneralPurpose => Some(&mut self.gpr[..]),
            RegisterSetId::FloatingPoint => Some(self.vector.as_bytes_mut()),
            RegisterSetId::ExceptionState => Some(&mut self.exception[..]),
            RegisterSetId::All => None,
        }
    }

    /// `x86_thread_state64_t` image.
    pub fn gpr_bytes(&self) -> &[u8; THREAD_STATE_SIZE]
    {
        &self.gpr
    }

    pub fn gpr_bytes_mut(&mut self) -> &mut [u8; THREAD_STATE_SIZE]
    {
        &mut self.gpr
    }

    /// `x86_float_state64_t` or `x86_avx_state64_t` image.
    pub fn vector_bytes(&self) -> &[u8]
    {
        self.vector.as_bytes()
    }

    pub fn vector_bytes_mut(&mut self) -> &mut [u8]
    {
        self.vector.as_bytes_mut()
    }

    /// `x86_exception_state64_t` image.
    pub fn exception_bytes(&self) -> &[u8; EXCEPTION_STATE_SIZE]
    {
        &self.exception
    }

    pub fn exception_bytes_mut(&mut self) -> &mut [u8; EXCEPTION_STATE_SIZE]
    {
        &mut self.exception
    }

    /// Value of the general purpose register (or view) called `name`,
    /// zero-extended to 64 bits.
    ///
    /// Returns `None` when no general purpose register has that name.
    pub fn gpr(&self, name: &str) -> Option<u64>
    {
        let descriptor = self.gpr_descriptor(name)?;
        let mut raw = [0u8; 8];
        raw[..descriptor.size].copy_from_slice(&self.gpr[descriptor.offset..descriptor.offset + descriptor.size]);
        Some(u64::from_le_bytes(raw))
    }

    /// Write the low bytes of `value` to the general purpose register `name`.
    ///
    /// Narrow views follow the usual aliasing rules: 32-bit writes clear the
    /// upper half of the parent register.
    ///
    /// ## Errors
    ///
    /// [`RegisterError::UnknownRegisterName`] if no general purpose register has that name.
    pub fn set_gpr(&mut self, name: &str, value: u64) -> Result<(), RegisterError>
    {
        let descriptor = self
            .gpr_descriptor(name)
            .ok_or_else(|| RegisterError::UnknownRegisterName(name.to_string()))?;
        let bytes = value.to_le_bytes();
        RegisterMarshaler::new(self.layout()).set_register(descriptor.id(), self, &bytes[..descriptor.size])
    }

    fn gpr_descriptor(&self, name: &str) -> Option<&'static RegisterDescriptor>
    {
        RegisterCatalog::for_layout(self.layout())
            .find_by_name(name)
            .filter(|descriptor| descriptor.set == RegisterSetId::GeneralPurpose)
    }

    /// `rip`
    pub fn instruction_pointer(&self) -> u64
    {
        read_u64(&self.gpr, RIP_OFFSET)
    }

    pub fn set_instruction_pointer(&mut self, value: u64)
    {
        write_u64(&mut self.gpr, RIP_OFFSET, value);
    }

    /// `rsp`
    pub fn stack_pointer(&self) -> u64
    {
        read_u64(&self.gpr, RSP_OFFSET)
    }

    pub fn set_stack_pointer(&mut self, value: u64)
    {
        write_u64(&mut self.gpr, RSP_OFFSET, value);
    }

    /// `rbp`
    pub fn frame_pointer(&self) -> u64
    {
        read_u64(&self.gpr, RBP_OFFSET)
    }

    /// `rflags`
    pub fn flags(&self) -> u64
    {
        read_u64(&self.gpr, RFLAGS_OFFSET)
    }

    pub fn set_flags(&mut self, value: u64)
    {
        write_u64(&mut self.gpr, RFLAGS_OFFSET, value);
    }

    /// `__trapno`, the 16-bit trap number.
    pub fn trap_number(&self) -> u16
    {
        read_u16(&self.exception, TRAPNO_OFFSET)
    }

    /// `__cpu`, the CPU the trap was taken on.
    pub fn trap_cpu(&self) -> u16
    {
        read_u16(&self.exception, CPU_OFFSET)
    }

    /// `__err`, the hardware error code.
    pub fn error_code(&self) -> u32
    {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.exception[ERR_OFFSET..ERR_OFFSET + 4]);
        u32::from_le_bytes(raw)
    }

    /// `__faultvaddr`, the faulting address of a memory access.
    pub fn fault_address(&self) -> u64
    {
        read_u64(&self.exception, FAULTVADDR_OFFSET)
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16
{
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u64(bytes: &[u8], offset: usize) -> u64
{
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(raw)
}

fn write_u64(bytes: &mut [u8], offset: usize, value: u64)
{
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn vector_region_matches_layout()
    {
        let legacy = RegisterContext::new(VectorLayout::Legacy);
        let extended = RegisterContext::new(VectorLayout::Extended);
        assert_eq!(legacy.vector_bytes().len(), FLOAT_STATE_SIZE);
        assert_eq!(extended.vector_bytes().len(), AVX_STATE_SIZE);
        assert!(legacy.region(RegisterSetId::All).is_none());
    }

    #[test]
    fn exception_fields_decode_little_endian()
    {
        let mut context = RegisterContext::new(VectorLayout::Legacy);
        context.exception_bytes_mut().copy_from_slice(&[
            0x0e, 0x00, 0x03, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);
        assert_eq!(context.trap_number(), 14);
        assert_eq!(context.trap_cpu(), 3);
        assert_eq!(context.error_code(), 6);
        assert_eq!(context.fault_address(), 0x1000);
    }

    #[test]
    fn named_gpr_access_follows_aliasing()
    {
        let mut context = RegisterContext::new(VectorLayout::Extended);
        context.set_gpr("rbx", 0x1122_3344_5566_7788).unwrap();
        assert_eq!(context.gpr("bx"), Some(0x7788));
        assert_eq!(context.gpr("bh"), Some(0x77));

        context.set_gpr("ebx", 0xdead_beef).unwrap();
        assert_eq!(context.gpr("rbx"), Some(0xdead_beef));

        assert_eq!(context.gpr("xmm0"), None);
        assert!(matches!(
            context.set_gpr("nope", 1),
            Err(RegisterError::UnknownRegisterName(_))
        ));
    }
}
