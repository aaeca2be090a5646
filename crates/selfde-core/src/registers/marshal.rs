//! # Register Marshaling
//!
//! Size-exact access to single registers and the canonical flat buffer.
//!
//! ## Canonical buffer
//!
//! A whole context is serialized in a fixed order that differs from the
//! native structure layout:
//!
//! | block                       | registers                                          | bytes        |
//! |-----------------------------|----------------------------------------------------|--------------|
//! | general purpose             | `rax`..`gs` (64-bit names only)                    | 21 × 8       |
//! | x87/SSE control and status  | `fctrl fstat ftag fop fioff fiseg fooff foseg mxcsr mxcsrmask` | 27 |
//! | x87 stack                   | `stmm0`..`stmm7`                                   | 8 × 10       |
//! | vectors                     | `xmm0`..`xmm15` (legacy) / `ymm0`..`ymm15` (extended) | 16 × 16 / 16 × 32 |
//! | exception state             | `trapno err faultvaddr`                            | 4 + 4 + 8    |
//!
//! That is 547 bytes for the legacy layout and 803 for the extended one.
//!
//! ## Aliasing
//!
//! - Writing a 32-bit general purpose view clears the upper half of the
//!   64-bit register, as the hardware does. 16- and 8-bit writes leave the
//!   other bytes alone.
//! - `ymmN` is stored as two non-adjacent halves (`xmmN` and `ymmhN`);
//!   reading or writing `xmmN` touches only the low half.
//! - `trapno` is the 16-bit trap number followed by the 16-bit cpu field.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::feature::{self, VectorLayout};
use crate::registers::catalog::{
    RegisterCatalog, RegisterDescriptor, Storage, FPU_MXCSRMASK, FPU_STMM0, FPU_XMM0, FPU_YMM0, GPR_FULL_COUNT,
};
use crate::registers::context::RegisterContext;
use crate::registers::error::RegisterError;
use crate::registers::RegisterId;

/// Number of registers in the canonical sequence (both layouts).
pub const CANONICAL_REGISTER_COUNT: usize = 58;

/// Canonical buffer length for the legacy layout.
pub const LEGACY_CONTEXT_LEN: usize = 547;
/// Canonical buffer length for the extended layout.
pub const EXTENDED_CONTEXT_LEN: usize = 803;

/// A single register value; never larger than a `ymm` register.
pub type RegisterValue = SmallVec<[u8; 32]>;

const fn canonical_order(first_vector: u32) -> [RegisterId; CANONICAL_REGISTER_COUNT]
{
    let mut order = [RegisterId::new(0, 0); CANONICAL_REGISTER_COUNT];
    let mut slot = 0;
    let mut index = 0;
    while index < GPR_FULL_COUNT {
        order[slot] = RegisterId::gpr(index);
        slot += 1;
        index += 1;
    }
    // fctrl..mxcsrmask
    index = 0;
    while index <= FPU_MXCSRMASK {
        order[slot] = RegisterId::fpu(index);
        slot += 1;
        index += 1;
    }
    index = 0;
    while index < 8 {
        order[slot] = RegisterId::fpu(FPU_STMM0 + index);
        slot += 1;
        index += 1;
    }
    index = 0;
    while index < 16 {
        order[slot] = RegisterId::fpu(first_vector + index);
        slot += 1;
        index += 1;
    }
    index = 0;
    while index < 3 {
        order[slot] = RegisterId::exc(index);
        slot += 1;
        index += 1;
    }
    order
}

static LEGACY_ORDER: [RegisterId; CANONICAL_REGISTER_COUNT] = canonical_order(FPU_XMM0);
static EXTENDED_ORDER: [RegisterId; CANONICAL_REGISTER_COUNT] = canonical_order(FPU_YMM0);

/// Reads and writes registers of contexts of one vector layout
///
/// A marshaler is bound to one catalog. Contexts built for the other layout
/// are rejected with [`RegisterError::LayoutMismatch`].
///
/// ```rust
/// use selfde_core::feature::VectorLayout;
/// use selfde_core::registers::{RegisterContext, RegisterId, RegisterMarshaler};
///
/// let marshaler = RegisterMarshaler::new(VectorLayout::Legacy);
/// let mut context = RegisterContext::new(VectorLayout::Legacy);
///
/// // eax is the first 32-bit view
/// marshaler.set_register(RegisterId::gpr(21), &mut context, &[0xff; 4])?;
/// assert_eq!(marshaler.get_register(RegisterId::gpr(0), &context)?.as_slice(), &[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]);
/// assert_eq!(marshaler.encode(&context)?.len(), marshaler.context_len());
/// # Ok::<(), selfde_core::registers::RegisterError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RegisterMarshaler
{
    catalog: &'static RegisterCatalog,
}

impl RegisterMarshaler
{
    pub fn new(layout: VectorLayout) -> Self
    {
        Self {
            catalog: RegisterCatalog::for_layout(layout),
        }
    }

    /// Marshaler for the layout detected on this host.
    pub fn host() -> Self
    {
        Self::new(feature::vector_layout())
    }

    pub fn catalog(&self) -> &'static RegisterCatalog
    {
        self.catalog
    }

    pub fn layout(&self) -> VectorLayout
    {
        self.catalog.layout()
    }

    /// Register ids in canonical buffer order.
    pub fn canonical_order(&self) -> &'static [RegisterId]
    {
        match self.layout() {
            VectorLayout::Legacy => &LEGACY_ORDER,
            VectorLayout::Extended => &EXTENDED_ORDER,
        }
    }

    /// Length of the canonical buffer.
    pub fn context_len(&self) -> usize
    {
        match self.layout() {
            VectorLayout::Legacy => LEGACY_CONTEXT_LEN,
            VectorLayout::Extended => EXTENDED_CONTEXT_LEN,
        }
    }

    /// Copy out the value of register `id`.
    ///
    /// The value is exactly the declared size of the register.
    ///
    /// ## Errors
    ///
    /// - [`RegisterError::UnknownRegister`] / [`RegisterError::UnknownRegisterSet`]
    /// - [`RegisterError::LayoutMismatch`] if `context` uses the other layout
    pub fn get_register(&self, id: RegisterId, context: &RegisterContext) -> Result<RegisterValue, RegisterError>
    {
        let descriptor = self.catalog.descriptor(id)?;
        let mut value: RegisterValue = SmallVec::from_elem(0, descriptor.size);
        self.read_descriptor(descriptor, context, &mut value)?;
        Ok(value)
    }

    /// Copy the value of register `id` into the front of `dest`.
    ///
    /// ## Returns
    ///
    /// The number of bytes written (the register size).
    ///
    /// ## Errors
    ///
    /// As [`RegisterMarshaler::get_register`], plus [`RegisterError::BufferTooSmall`].
    pub fn read_register_into(&self, id: RegisterId, context: &RegisterContext, dest: &mut [u8])
        -> Result<usize, RegisterError>
    {
        let descriptor = self.catalog.descriptor(id)?;
        if dest.len() < descriptor.size {
            return Err(RegisterError::BufferTooSmall {
                needed: descriptor.size,
                available: dest.len(),
            });
        }
        self.read_descriptor(descriptor, context, &mut dest[..descriptor.size])?;
        Ok(descriptor.size)
    }

    /// Overwrite register `id` with `bytes`.
    ///
    /// `bytes` must be exactly the declared size; the context is untouched on
    /// any error.
    ///
    /// ## Errors
    ///
    /// - [`RegisterError::SizeMismatch`] for a wrong length
    /// - [`RegisterError::UnknownRegister`] / [`RegisterError::UnknownRegisterSet`]
    /// - [`RegisterError::LayoutMismatch`]
    pub fn set_register(&self, id: RegisterId, context: &mut RegisterContext, bytes: &[u8]) -> Result<(), RegisterError>
    {
        let descriptor = self.catalog.descriptor(id)?;
        if bytes.len() != descriptor.size {
            return Err(RegisterError::SizeMismatch {
                name: descriptor.name,
                expected: descriptor.size,
                actual: bytes.len(),
            });
        }
        self.write_descriptor(descriptor, context, bytes)?;
        trace!(register = descriptor.name, "Register written");
        Ok(())
    }

    /// Serialize `context` into `dest` in canonical order.
    ///
    /// ## Returns
    ///
    /// The number of bytes written, always [`RegisterMarshaler::context_len`].
    ///
    /// ## Errors
    ///
    /// - [`RegisterError::BufferTooSmall`] when `dest` is shorter than the canonical length
    /// - [`RegisterError::LayoutMismatch`]
    pub fn encode_into(&self, context: &RegisterContext, dest: &mut [u8]) -> Result<usize, RegisterError>
    {
        self.check_layout(context)?;
        let needed = self.context_len();
        if dest.len() < needed {
            return Err(RegisterError::BufferTooSmall {
                needed,
                available: dest.len(),
            });
        }
        let mut cursor = 0;
        for id in self.canonical_order() {
            let descriptor = self.catalog.descriptor(*id)?;
            let end = cursor + descriptor.size;
            self.read_descriptor(descriptor, context, &mut dest[cursor..end])?;
            cursor = end;
        }
        Ok(cursor)
    }

    /// Serialize `context` into a new canonical buffer.
    ///
    /// ## Errors
    ///
    /// [`RegisterError::LayoutMismatch`]
    pub fn encode(&self, context: &RegisterContext) -> Result<Vec<u8>, RegisterError>
    {
        let mut buffer = vec![0; self.context_len()];
        self.encode_into(context, &mut buffer)?;
        Ok(buffer)
    }

    /// Replace every register of `context` from a canonical buffer.
    ///
    /// The buffer must be exactly the canonical length. Either every register
    /// is written or, on error, none is.
    ///
    /// ## Errors
    ///
    /// - [`RegisterError::ContextLengthMismatch`]
    /// - [`RegisterError::LayoutMismatch`]
    pub fn decode_from(&self, context: &mut RegisterContext, source: &[u8]) -> Result<(), RegisterError>
    {
        self.check_layout(context)?;
        if source.len() != self.context_len() {
            return Err(RegisterError::ContextLengthMismatch {
                expected: self.context_len(),
                actual: source.len(),
            });
        }
        let mut next = context.clone();
        let mut cursor = 0;
        for id in self.canonical_order() {
            let descriptor = self.catalog.descriptor(*id)?;
            let end = cursor + descriptor.size;
            self.write_descriptor(descriptor, &mut next, &source[cursor..end])?;
            cursor = end;
        }
        *context = next;
        debug!(bytes = cursor, layout = self.layout().name(), "Register context decoded");
        Ok(())
    }

    fn check_layout(&self, context: &RegisterContext) -> Result<(), RegisterError>
    {
        if context.layout() == self.layout() {
            Ok(())
        } else {
            Err(RegisterError::LayoutMismatch {
                expected: self.layout(),
                actual: context.layout(),
            })
        }
    }

    fn read_descriptor(&self, descriptor: &RegisterDescriptor, context: &RegisterContext, dest: &mut [u8])
        -> Result<(), RegisterError>
    {
        self.check_layout(context)?;
        let region = context.region(descriptor.set).ok_or(RegisterError::UnknownRegister {
            set: descriptor.set as u32,
            index: descriptor.index,
        })?;
        match descriptor.storage {
            Storage::Split { high } => {
                let half = descriptor.size / 2;
                dest[..half].copy_from_slice(&region[descriptor.offset..descriptor.offset + half]);
                dest[half..].copy_from_slice(&region[high..high + half]);
            }
            Storage::Direct | Storage::ZeroExtended { .. } => {
                dest.copy_from_slice(&region[descriptor.offset..descriptor.offset + descriptor.size]);
            }
        }
        Ok(())
    }

    fn write_descriptor(&self, descriptor: &RegisterDescriptor, context: &mut RegisterContext, source: &[u8])
        -> Result<(), RegisterError>
    {
        self.check_layout(context)?;
        let region = context
            .region_mut(descriptor.set)
            .ok_or(RegisterError::UnknownRegister {
                set: descriptor.set as u32,
                index: descriptor.index,
            })?;
        match descriptor.storage {
            Storage::Split { high } => {
                let half = descriptor.size / 2;
                region[descriptor.offset..descriptor.offset + half].copy_from_slice(&source[..half]);
                region[high..high + half].copy_from_slice(&source[half..]);
            }
            Storage::ZeroExtended { parent } => {
                region[parent..parent + 8].fill(0);
                region[descriptor.offset..descriptor.offset + descriptor.size].copy_from_slice(source);
            }
            Storage::Direct => {
                region[descriptor.offset..descriptor.offset + descriptor.size].copy_from_slice(source);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn canonical_lengths_match_catalog_sizes()
    {
        for layout in [VectorLayout::Legacy, VectorLayout::Extended] {
            let marshaler = RegisterMarshaler::new(layout);
            let total: usize = marshaler
                .canonical_order()
                .iter()
                .map(|id| marshaler.catalog().descriptor(*id).unwrap().size)
                .sum();
            assert_eq!(total, marshaler.context_len(), "{layout:?}");
        }
    }

    #[test]
    fn canonical_order_excludes_subregisters()
    {
        let marshaler = RegisterMarshaler::new(VectorLayout::Extended);
        for id in marshaler.canonical_order() {
            let descriptor = marshaler.catalog().descriptor(*id).unwrap();
            assert!(!descriptor.is_subregister(), "{}", descriptor.name);
        }
    }
}
