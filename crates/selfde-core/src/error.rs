//! # Error Types
//!
//! Error handling for the self-debugging backend.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! There are three families of failure:
//!
//! 1. **Caller-contract violations** ([`RegisterError`]): wrong sizes, unknown
//!    register ids, undersized buffers. Nothing is mutated when these occur.
//! 2. **Kernel failures** ([`MachError`]): the raw `kern_return_t` is kept so
//!    it can be handed back to the caller unmodified.
//! 3. **Thread/monitor lifecycle errors**: spawning the listener, using the
//!    mailbox before monitoring started, and so on.
//!
//! Feature detection never fails; an undeterminable host resolves to the
//! legacy register layout instead.

use thiserror::Error;

pub use crate::registers::error::RegisterError;

/// Main error type for controller operations
#[derive(Error, Debug)]
pub enum SelfdeError
{
    /// A register id, size or buffer did not satisfy the marshaling contract
    #[error("Register error: {0}")]
    Register(#[from] RegisterError),

    /// A Mach kernel call failed
    ///
    /// The original numeric status is available through [`MachError::code`].
    ///
    /// See: [Mach Kernel Return Codes](https://developer.apple.com/documentation/kernel/kern_return_t)
    #[error("Mach API error: {0}")]
    Mach(#[from] MachError),

    /// The exception listener thread could not be created
    #[error("Failed to spawn exception monitoring thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    /// The listener thread exited before reporting that it was receiving
    #[error("Exception monitoring thread exited before it became ready")]
    MonitorNotReady,

    /// `start()` was called on a controller that is already monitoring
    #[error("Exception monitoring is already running")]
    MonitorAlreadyStarted,

    /// An operation needed the monitor, but `start()` has not been called
    #[error("Exception monitoring has not been started")]
    MonitorNotStarted,

    /// The listener side of the mailbox is gone
    ///
    /// This only happens when the exception endpoint was destroyed out from
    /// under the listener thread.
    #[error("Exception mailbox closed")]
    MailboxClosed,

    /// The operation is not available on this host
    #[error("Unsupported on this platform: {0}")]
    Unsupported(&'static str),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for `Result<T, SelfdeError>`
///
/// ```rust
/// use selfde_core::error::SelfdeResult;
/// fn foo() -> SelfdeResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type SelfdeResult<T> = std::result::Result<T, SelfdeError>;

/// `KERN_SUCCESS`
pub const KERN_SUCCESS: i32 = 0;
const KERN_INVALID_ADDRESS: i32 = 1;
const KERN_PROTECTION_FAILURE: i32 = 2;
const KERN_NO_SPACE: i32 = 3;
const KERN_INVALID_ARGUMENT: i32 = 4;
const KERN_FAILURE: i32 = 5;
const KERN_RESOURCE_SHORTAGE: i32 = 6;
const KERN_ABORTED: i32 = 14;
const KERN_INVALID_NAME: i32 = 15;
const KERN_INVALID_TASK: i32 = 16;
const KERN_INVALID_RIGHT: i32 = 17;
const KERN_INVALID_VALUE: i32 = 18;
const KERN_TERMINATED: i32 = 37;
const MACH_RCV_INVALID_NAME: i32 = 0x1000_4002;
const MACH_RCV_TOO_LARGE: i32 = 0x1000_4004;
const MACH_RCV_INTERRUPTED: i32 = 0x1000_4005;
const MACH_RCV_PORT_DIED: i32 = 0x1000_4009;
const MACH_SEND_INVALID_DEST: i32 = 0x1000_0003;

/// Mach kernel API error
///
/// Mach APIs return `kern_return_t` (and `mach_msg` returns
/// `mach_msg_return_t`), which are plain integer codes. Known codes become
/// named variants; anything else is kept verbatim in [`MachError::Unknown`].
/// [`MachError::code`] always yields the exact value the kernel reported.
///
/// ## References
///
/// - [kern_return_t documentation](https://developer.apple.com/documentation/kernel/kern_return_t)
/// - [mach_msg return codes](https://developer.apple.com/documentation/kernel/mach_msg_return_t)
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachError
{
    /// `KERN_INVALID_ADDRESS` (1)
    #[error("KERN_INVALID_ADDRESS: Specified address is not currently valid")]
    InvalidAddress,

    /// `KERN_PROTECTION_FAILURE` (2)
    ///
    /// The operation was blocked by the kernel's security policy.
    #[error("KERN_PROTECTION_FAILURE: Permission denied")]
    ProtectionFailure,

    /// `KERN_NO_SPACE` (3)
    ///
    /// The port name space is full.
    #[error("KERN_NO_SPACE: No room left in the name space")]
    NoSpace,

    /// `KERN_INVALID_ARGUMENT` (4)
    #[error("KERN_INVALID_ARGUMENT: Invalid argument")]
    InvalidArgument,

    /// `KERN_FAILURE` (5)
    #[error("KERN_FAILURE: Operation failed")]
    Failure,

    /// `KERN_RESOURCE_SHORTAGE` (6)
    #[error("KERN_RESOURCE_SHORTAGE: Kernel resources exhausted")]
    ResourceShortage,

    /// `KERN_ABORTED` (14)
    #[error("KERN_ABORTED: Operation was aborted")]
    Aborted,

    /// `KERN_INVALID_NAME` (15)
    #[error("KERN_INVALID_NAME: Port name does not denote a right")]
    InvalidName,

    /// `KERN_INVALID_TASK` (16)
    #[error("KERN_INVALID_TASK: Target task is not active")]
    InvalidTask,

    /// `KERN_INVALID_RIGHT` (17)
    #[error("KERN_INVALID_RIGHT: Port name denotes the wrong kind of right")]
    InvalidRight,

    /// `KERN_INVALID_VALUE` (18)
    #[error("KERN_INVALID_VALUE: Invalid value")]
    InvalidValue,

    /// `KERN_TERMINATED` (37)
    ///
    /// The thread or task has already terminated.
    #[error("KERN_TERMINATED: Target has terminated")]
    Terminated,

    /// `MACH_RCV_INVALID_NAME`
    ///
    /// The receive right named in `mach_msg` no longer exists.
    #[error("MACH_RCV_INVALID_NAME: Exception port is invalid")]
    ReceiveInvalidName,

    /// `MACH_RCV_TOO_LARGE`
    ///
    /// The message did not fit the receive buffer and was discarded.
    #[error("MACH_RCV_TOO_LARGE: Message too large for receive buffer")]
    ReceiveTooLarge,

    /// `MACH_RCV_INTERRUPTED`
    #[error("MACH_RCV_INTERRUPTED: Receive was interrupted")]
    ReceiveInterrupted,

    /// `MACH_RCV_PORT_DIED`
    ///
    /// The exception port was destroyed while we were waiting on it.
    #[error("MACH_RCV_PORT_DIED: Exception port was destroyed")]
    ReceivePortDied,

    /// `MACH_SEND_INVALID_DEST`
    #[error("MACH_SEND_INVALID_DEST: Reply port is invalid")]
    SendInvalidDestination,

    /// Unknown Mach error code
    ///
    /// The integer value is preserved so you can look it up.
    #[error("Unknown Mach error: {0:#x}")]
    Unknown(i32),
}

impl MachError
{
    /// The numeric status exactly as the kernel returned it.
    pub fn code(self) -> i32
    {
        match self {
            MachError::InvalidAddress => KERN_INVALID_ADDRESS,
            MachError::ProtectionFailure => KERN_PROTECTION_FAILURE,
            MachError::NoSpace => KERN_NO_SPACE,
            MachError::InvalidArgument => KERN_INVALID_ARGUMENT,
            MachError::Failure => KERN_FAILURE,
            MachError::ResourceShortage => KERN_RESOURCE_SHORTAGE,
            MachError::Aborted => KERN_ABORTED,
            MachError::InvalidName => KERN_INVALID_NAME,
            MachError::InvalidTask => KERN_INVALID_TASK,
            MachError::InvalidRight => KERN_INVALID_RIGHT,
            MachError::InvalidValue => KERN_INVALID_VALUE,
            MachError::Terminated => KERN_TERMINATED,
            MachError::ReceiveInvalidName => MACH_RCV_INVALID_NAME,
            MachError::ReceiveTooLarge => MACH_RCV_TOO_LARGE,
            MachError::ReceiveInterrupted => MACH_RCV_INTERRUPTED,
            MachError::ReceivePortDied => MACH_RCV_PORT_DIED,
            MachError::SendInvalidDestination => MACH_SEND_INVALID_DEST,
            MachError::Unknown(code) => code,
        }
    }

    /// `true` when the exception endpoint itself is gone and receiving on it
    /// again can never succeed.
    pub fn is_endpoint_closed(self) -> bool
    {
        matches!(self, MachError::ReceivePortDied | MachError::ReceiveInvalidName)
    }

    /// `true` for a receive that was interrupted and may simply be retried.
    pub fn is_interrupted(self) -> bool
    {
        matches!(self, MachError::ReceiveInterrupted)
    }

    /// `true` for a receive whose message was dropped by the kernel; the
    /// endpoint itself is still usable.
    pub fn is_message_discarded(self) -> bool
    {
        matches!(self, MachError::ReceiveTooLarge)
    }

    /// Turn a raw status into `Ok(())` or the matching error.
    ///
    /// ## Errors
    ///
    /// Returns the converted [`MachError`] for any status other than
    /// `KERN_SUCCESS`.
    pub fn check(code: i32) -> Result<(), MachError>
    {
        if code == KERN_SUCCESS {
            Ok(())
        } else {
            Err(MachError::from(code))
        }
    }
}

/// Convert a `kern_return_t` to a `MachError`
///
/// `KERN_SUCCESS` is not an error; converting it yields `Unknown(0)`, so
/// callers check for success first (or use [`MachError::check`]).
impl From<i32> for MachError
{
    fn from(code: i32) -> Self
    {
        match code {
            KERN_INVALID_ADDRESS => MachError::InvalidAddress,
            KERN_PROTECTION_FAILURE => MachError::ProtectionFailure,
            KERN_NO_SPACE => MachError::NoSpace,
            KERN_INVALID_ARGUMENT => MachError::InvalidArgument,
            KERN_FAILURE => MachError::Failure,
            KERN_RESOURCE_SHORTAGE => MachError::ResourceShortage,
            KERN_ABORTED => MachError::Aborted,
            KERN_INVALID_NAME => MachError::InvalidName,
            KERN_INVALID_TASK => MachError::InvalidTask,
            KERN_INVALID_RIGHT => MachError::InvalidRight,
            KERN_INVALID_VALUE => MachError::InvalidValue,
            KERN_TERMINATED => MachError::Terminated,
            MACH_RCV_INVALID_NAME => MachError::ReceiveInvalidName,
            MACH_RCV_TOO_LARGE => MachError::ReceiveTooLarge,
            MACH_RCV_INTERRUPTED => MachError::ReceiveInterrupted,
            MACH_RCV_PORT_DIED => MachError::ReceivePortDied,
            MACH_SEND_INVALID_DEST => MachError::SendInvalidDestination,
            _ => MachError::Unknown(code),
        }
    }
}
