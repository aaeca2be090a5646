//! # Mach Constants
//!
//! Thread state flavors, exception port parameters and port rights used by
//! the x86-64 backend.
//!
//! ## Organization
//!
//! - Thread state flavors and counts
//! - Exception port registration
//! - Thread information
//! - Port rights and message types

use libc::{c_int, mach_msg_type_number_t};

use crate::registers::context::{AVX_STATE_SIZE, EXCEPTION_STATE_SIZE, FLOAT_STATE_SIZE, THREAD_STATE_SIZE};

// ============================================================================
// Thread State Flavors
// ============================================================================

/// `x86_THREAD_STATE64` (flavor 4)
///
/// General purpose registers: `rax`..`r15`, `rip`, `rflags`, `cs`, `fs`, `gs`.
pub const X86_THREAD_STATE64: c_int = 4;

/// `x86_THREAD_STATE64_COUNT` (42 `natural_t` values)
pub const X86_THREAD_STATE64_COUNT: mach_msg_type_number_t = (THREAD_STATE_SIZE / 4) as mach_msg_type_number_t;

/// `x86_FLOAT_STATE64` (flavor 5)
///
/// x87 control/status, `stmm0`..`stmm7`, `xmm0`..`xmm15`, `mxcsr`.
pub const X86_FLOAT_STATE64: c_int = 5;

/// `x86_FLOAT_STATE64_COUNT` (131 `natural_t` values)
pub const X86_FLOAT_STATE64_COUNT: mach_msg_type_number_t = (FLOAT_STATE_SIZE / 4) as mach_msg_type_number_t;

/// `x86_EXCEPTION_STATE64` (flavor 6)
///
/// `trapno`, `cpu`, `err`, `faultvaddr`. Read-only.
pub const X86_EXCEPTION_STATE64: c_int = 6;

/// `x86_EXCEPTION_STATE64_COUNT` (4 `natural_t` values)
pub const X86_EXCEPTION_STATE64_COUNT: mach_msg_type_number_t = (EXCEPTION_STATE_SIZE / 4) as mach_msg_type_number_t;

/// `x86_AVX_STATE64` (flavor 17)
///
/// The float state followed by the upper halves `ymmh0`..`ymmh15`.
pub const X86_AVX_STATE64: c_int = 17;

/// `x86_AVX_STATE64_COUNT` (211 `natural_t` values)
pub const X86_AVX_STATE64_COUNT: mach_msg_type_number_t = (AVX_STATE_SIZE / 4) as mach_msg_type_number_t;

/// Trap flag in `rflags`; set to single-step one instruction
pub const RFLAGS_TRAP_FLAG: u64 = 0x100;

// ============================================================================
// Exception Ports
// ============================================================================

/// `EXCEPTION_DEFAULT`: send `exception_raise` messages (thread, task, type, codes)
pub const EXCEPTION_DEFAULT: c_int = 1;

/// `THREAD_STATE_NONE`: no state is sent with default-behavior messages
pub const THREAD_STATE_NONE: c_int = 13;

// ============================================================================
// Thread Information
// ============================================================================

/// `THREAD_BASIC_INFO` flavor for `thread_info()`
pub const THREAD_BASIC_INFO: c_int = 3;

/// `THREAD_BASIC_INFO_COUNT` (10 `integer_t` values)
pub const THREAD_BASIC_INFO_COUNT: mach_msg_type_number_t = 10;

/// `TH_STATE_RUNNING`
pub const TH_STATE_RUNNING: c_int = 1;
/// `TH_STATE_STOPPED`
pub const TH_STATE_STOPPED: c_int = 2;
/// `TH_STATE_WAITING`
pub const TH_STATE_WAITING: c_int = 3;
/// `TH_STATE_UNINTERRUPTIBLE`
pub const TH_STATE_UNINTERRUPTIBLE: c_int = 4;
/// `TH_STATE_HALTED`
pub const TH_STATE_HALTED: c_int = 5;

// ============================================================================
// Port Rights
// ============================================================================

/// `MACH_PORT_RIGHT_RECEIVE`
pub const MACH_PORT_RIGHT_RECEIVE: u32 = 1;

/// `MACH_MSG_TYPE_MAKE_SEND`
pub const MACH_MSG_TYPE_MAKE_SEND: u32 = 20;

// ============================================================================
// Messages
// ============================================================================

/// `sizeof(mach_msg_max_trailer_t)`: the most trailer a receive can append
pub const MAX_TRAILER_SIZE: usize = 68;
