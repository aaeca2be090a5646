//! # Exception Records
//!
//! Platform-independent description of a Mach exception raised on a
//! monitored thread, as handed from the listener thread to the controller.
//!
//! ## Exception Types
//!
//! | value | name                  | [`ExceptionClass`]       |
//! |-------|-----------------------|--------------------------|
//! | 1     | `EXC_BAD_ACCESS`      | `BadAccess`              |
//! | 2     | `EXC_BAD_INSTRUCTION` | `BadInstruction`         |
//! | 3     | `EXC_ARITHMETIC`      | `Arithmetic`             |
//! | 4     | `EXC_EMULATION`       | `Emulation`              |
//! | 5     | `EXC_SOFTWARE`        | `Software`               |
//! | 6     | `EXC_BREAKPOINT`      | `Breakpoint`             |
//! | 7     | `EXC_SYSCALL`         | `Syscall`                |
//! | 8     | `EXC_MACH_SYSCALL`    | `MachSyscall`            |
//! | 9     | `EXC_RPC_ALERT`       | `RpcAlert`               |
//! | 10    | `EXC_CRASH`           | `Crash`                  |
//! | 11    | `EXC_RESOURCE`        | `Resource`               |
//! | 12    | `EXC_GUARD`           | `Guard`                  |
//! | 13    | `EXC_CORPSE_NOTIFY`   | `CorpseNotify`           |
//!
//! ## References
//!
//! - [exception_types.h](https://github.com/apple-oss-distributions/xnu/blob/main/osfmk/mach/exception_types.h)

use std::fmt;

use bitflags::bitflags;

use crate::types::ThreadId;

/// `EXC_SOFT_SIGNAL`: first code of an `EXC_SOFTWARE` exception carrying a Unix signal.
pub const EXC_SOFT_SIGNAL: i64 = 0x10003;

/// `SIGTRAP`, reported for breakpoints.
pub const SIGTRAP: u32 = 5;

// Pseudo-signal numbers for exceptions that have no natural Unix signal.
const SIGNAL_BAD_ACCESS: u32 = 0x91;
const SIGNAL_BAD_INSTRUCTION: u32 = 0x92;
const SIGNAL_ARITHMETIC: u32 = 0x93;
const SIGNAL_EMULATION: u32 = 0x94;
const SIGNAL_SOFTWARE: u32 = 0x95;

/// Kind of a Mach exception
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionClass
{
    BadAccess,
    BadInstruction,
    Arithmetic,
    Emulation,
    Software,
    Breakpoint,
    Syscall,
    MachSyscall,
    RpcAlert,
    Crash,
    Resource,
    Guard,
    CorpseNotify,
    /// Any value the kernel headers do not define
    Unknown(i32),
}

impl ExceptionClass
{
    /// Classify a raw `exception_type_t`.
    pub fn from_raw(raw: i32) -> Self
    {
        match raw {
            1 => ExceptionClass::BadAccess,
            2 => ExceptionClass::BadInstruction,
            3 => ExceptionClass::Arithmetic,
            4 => ExceptionClass::Emulation,
            5 => ExceptionClass::Software,
            6 => ExceptionClass::Breakpoint,
            7 => ExceptionClass::Syscall,
            8 => ExceptionClass::MachSyscall,
            9 => ExceptionClass::RpcAlert,
            10 => ExceptionClass::Crash,
            11 => ExceptionClass::Resource,
            12 => ExceptionClass::Guard,
            13 => ExceptionClass::CorpseNotify,
            other => ExceptionClass::Unknown(other),
        }
    }

    /// The raw `exception_type_t` value.
    pub fn raw(self) -> i32
    {
        match self {
            ExceptionClass::BadAccess => 1,
            ExceptionClass::BadInstruction => 2,
            ExceptionClass::Arithmetic => 3,
            ExceptionClass::Emulation => 4,
            ExceptionClass::Software => 5,
            ExceptionClass::Breakpoint => 6,
            ExceptionClass::Syscall => 7,
            ExceptionClass::MachSyscall => 8,
            ExceptionClass::RpcAlert => 9,
            ExceptionClass::Crash => 10,
            ExceptionClass::Resource => 11,
            ExceptionClass::Guard => 12,
            ExceptionClass::CorpseNotify => 13,
            ExceptionClass::Unknown(raw) => raw,
        }
    }

    /// Short human-readable description.
    pub fn reason(self) -> &'static str
    {
        match self {
            ExceptionClass::BadAccess => "bad access",
            ExceptionClass::BadInstruction => "bad instruction",
            ExceptionClass::Arithmetic => "arithmetic",
            ExceptionClass::Emulation => "emulation",
            ExceptionClass::Software => "software",
            ExceptionClass::Breakpoint => "breakpoint",
            ExceptionClass::Syscall => "syscall",
            ExceptionClass::MachSyscall => "mach syscall",
            ExceptionClass::RpcAlert => "RPC alert",
            ExceptionClass::Crash => "crash",
            ExceptionClass::Resource => "resource",
            ExceptionClass::Guard => "guard",
            ExceptionClass::CorpseNotify => "corpse notify",
            ExceptionClass::Unknown(_) => "<unknown>",
        }
    }
}

impl fmt::Display for ExceptionClass
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.reason())
    }
}

bitflags! {
    /// `exception_mask_t`: which exception types are routed to a port
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExceptionMask: u32
    {
        const BAD_ACCESS = 1 << 1;
        const BAD_INSTRUCTION = 1 << 2;
        const ARITHMETIC = 1 << 3;
        const EMULATION = 1 << 4;
        const SOFTWARE = 1 << 5;
        const BREAKPOINT = 1 << 6;
        const SYSCALL = 1 << 7;
        const MACH_SYSCALL = 1 << 8;
        const RPC_ALERT = 1 << 9;
        const CRASH = 1 << 10;
        const RESOURCE = 1 << 11;
        const GUARD = 1 << 12;
        const CORPSE_NOTIFY = 1 << 13;

        /// Faults a self-debugging controller wants to see. `EXC_MASK_MACHINE`
        /// is zero on x86-64 and contributes nothing.
        const MONITORED = Self::BAD_ACCESS.bits()
            | Self::BAD_INSTRUCTION.bits()
            | Self::ARITHMETIC.bits()
            | Self::EMULATION.bits()
            | Self::SOFTWARE.bits()
            | Self::BREAKPOINT.bits()
            | Self::RPC_ALERT.bits();
    }
}

impl Default for ExceptionMask
{
    fn default() -> Self
    {
        ExceptionMask::MONITORED
    }
}

/// One exception taken on a monitored thread
///
/// By the time a record reaches the controller the faulting thread has been
/// suspended, so its registers can be read and modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionRecord
{
    /// Thread that raised the exception
    pub thread: ThreadId,
    /// Exception type
    pub class: ExceptionClass,
    /// Exception codes, widened to 64 bits
    pub codes: Vec<i64>,
}

impl ExceptionRecord
{
    pub fn new(thread: ThreadId, class: ExceptionClass, codes: Vec<i64>) -> Self
    {
        Self { thread, class, codes }
    }

    /// Unix-style signal number for this exception.
    ///
    /// Breakpoints report `SIGTRAP`. Software exceptions carrying a Unix
    /// signal (`[EXC_SOFT_SIGNAL, signo]`) report that signal. The hardware
    /// faults map to pseudo-signals `0x91`..`0x95`; anything else is 0.
    pub fn signal_number(&self) -> u32
    {
        match self.class {
            ExceptionClass::Breakpoint => SIGTRAP,
            ExceptionClass::BadAccess => SIGNAL_BAD_ACCESS,
            ExceptionClass::BadInstruction => SIGNAL_BAD_INSTRUCTION,
            ExceptionClass::Arithmetic => SIGNAL_ARITHMETIC,
            ExceptionClass::Emulation => SIGNAL_EMULATION,
            ExceptionClass::Software => match self.codes.as_slice() {
                [EXC_SOFT_SIGNAL, signal] => u32::try_from(*signal).unwrap_or(SIGNAL_SOFTWARE),
                _ => SIGNAL_SOFTWARE,
            },
            _ => 0,
        }
    }

    pub fn is_breakpoint(&self) -> bool
    {
        self.class == ExceptionClass::Breakpoint
    }

    pub fn is_bad_access(&self) -> bool
    {
        self.class == ExceptionClass::BadAccess
    }

    pub fn is_bad_instruction(&self) -> bool
    {
        self.class == ExceptionClass::BadInstruction
    }

    /// Faulting address for a bad access (second code), if present.
    pub fn fault_address(&self) -> Option<u64>
    {
        match (self.class, self.codes.get(1)) {
            (ExceptionClass::BadAccess, Some(address)) => Some(*address as u64),
            _ => None,
        }
    }
}

impl fmt::Display for ExceptionRecord
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} on thread {} (codes", self.class, self.thread)?;
        for code in &self.codes {
            write!(f, " {code:#x}")?;
        }
        write!(f, ")")
    }
}
