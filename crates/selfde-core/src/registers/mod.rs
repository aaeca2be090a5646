//! # x86-64 Registers
//!
//! Register metadata and register state for one x86-64 thread.
//!
//! - [`catalog`]: the static descriptor tables (names, sizes, native byte
//!   offsets and the eh_frame / DWARF / generic / wire numbering schemes)
//! - [`context`]: [`RegisterContext`], the byte images of the native Mach
//!   thread-state structures
//! - [`marshal`]: size-exact per-register access and the canonical flat
//!   buffer used to move a whole context at once
//!
//! Which floating-point table is in effect depends on
//! [`crate::feature::vector_layout`], resolved once per process.

pub mod catalog;
pub mod context;
pub mod error;
pub mod marshal;

pub use catalog::{
    DisplayFormat, GenericRole, RegisterCatalog, RegisterDescriptor, RegisterSet, RegisterSetId, Storage, ValueKind,
    INVALID_REGNUM,
};
pub use context::{RegisterContext, VectorState};
pub use error::RegisterError;
pub use marshal::RegisterMarshaler;

/// Identifies one register: a register set plus the dense native index
/// of the register inside that set
///
/// The dense index is the register's position in the native numbering
/// (`rax` = 0, `rbx` = 1, ...), not any of the external numbering schemes.
/// Use [`RegisterCatalog::find_by_dwarf`] and friends to translate those.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterId
{
    /// Raw register set id (see [`RegisterSetId`])
    pub set: u32,
    /// Dense native index inside the set
    pub index: u32,
}

impl RegisterId
{
    /// Create a register id from raw parts.
    pub const fn new(set: u32, index: u32) -> Self
    {
        Self { set, index }
    }

    /// General purpose register `index`.
    pub const fn gpr(index: u32) -> Self
    {
        Self::new(RegisterSetId::GeneralPurpose as u32, index)
    }

    /// Floating point / vector register `index`.
    pub const fn fpu(index: u32) -> Self
    {
        Self::new(RegisterSetId::FloatingPoint as u32, index)
    }

    /// Exception state register `index`.
    pub const fn exc(index: u32) -> Self
    {
        Self::new(RegisterSetId::ExceptionState as u32, index)
    }
}
