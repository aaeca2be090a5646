//! # Core Types
//!
//! Identifiers shared by the monitor, the controller and the kernel backend.
//!
//! On macOS every identifier here is a Mach port name (`mach_port_t`), which
//! is a 32-bit value local to the task that holds the right.

use std::fmt;

/// A task (process) identity, i.e. the task port name
///
/// ```rust
/// use selfde_core::types::TaskId;
///
/// let task = TaskId::from(0x103);
/// assert_eq!(task.raw(), 0x103);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u32);

impl TaskId
{
    /// Get the raw port name
    pub fn raw(&self) -> u32
    {
        self.0
    }
}

impl From<u32> for TaskId
{
    fn from(value: u32) -> Self
    {
        Self(value)
    }
}

/// A thread identity, i.e. the thread port name
///
/// Exception messages carry the faulting thread as a port right, so this is
/// the value [`crate::exception::ExceptionRecord::thread`] holds.
///
/// ```rust
/// use selfde_core::types::ThreadId;
///
/// let thread = ThreadId::from(0x1a03);
/// assert_eq!(thread.raw(), 0x1a03);
/// assert_eq!(thread.to_string(), "0x1a03");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u32);

impl ThreadId
{
    /// Get the raw port name
    pub fn raw(&self) -> u32
    {
        self.0
    }
}

impl From<u32> for ThreadId
{
    fn from(value: u32) -> Self
    {
        Self(value)
    }
}

impl fmt::Display for ThreadId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{:#x}", self.0)
    }
}

/// Name of a Mach port right (the exception endpoint)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortName(pub u32);

impl PortName
{
    /// `MACH_PORT_NULL`
    pub const NULL: PortName = PortName(0);

    /// Get the raw port name
    pub fn raw(&self) -> u32
    {
        self.0
    }
}

impl From<u32> for PortName
{
    fn from(value: u32) -> Self
    {
        Self(value)
    }
}
