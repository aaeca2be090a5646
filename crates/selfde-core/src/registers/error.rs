//! Register marshaling errors.
//!
//! Every variant here is a violation of the caller's side of the marshaling
//! contract. The context is never modified when one of these is returned.

use thiserror::Error;

use crate::feature::VectorLayout;

/// Register-level contract violation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError
{
    /// The register set id does not exist
    #[error("Unknown register set {0}")]
    UnknownRegisterSet(u32),

    /// The register set exists but has no register with this dense index
    #[error("Unknown register {index} in set {set}")]
    UnknownRegister
    {
        /// Register set id
        set: u32,
        /// Dense native index inside the set
        index: u32,
    },

    /// No register carries this name (or alias)
    #[error("Unknown register name '{0}'")]
    UnknownRegisterName(String),

    /// A per-register write supplied the wrong number of bytes
    #[error("Register {name} is {expected} bytes, got {actual}")]
    SizeMismatch
    {
        /// Register name
        name: &'static str,
        /// Size declared by the catalog
        expected: usize,
        /// Size supplied by the caller
        actual: usize,
    },

    /// Destination buffer cannot hold the value being read
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall
    {
        /// Bytes required
        needed: usize,
        /// Bytes available
        available: usize,
    },

    /// A full-context write supplied the wrong number of bytes
    #[error("Register context is {expected} bytes, got {actual}")]
    ContextLengthMismatch
    {
        /// Canonical length for the active layout
        expected: usize,
        /// Length supplied by the caller
        actual: usize,
    },

    /// The context was built for a different vector layout than the catalog in use
    #[error("Register context uses the {actual:?} layout, catalog expects {expected:?}")]
    LayoutMismatch
    {
        /// Layout of the catalog/marshaler
        expected: VectorLayout,
        /// Layout of the context
        actual: VectorLayout,
    },
}
