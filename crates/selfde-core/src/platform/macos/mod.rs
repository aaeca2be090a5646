//! # macOS x86-64 Backend
//!
//! Mach implementation of the exception monitor's kernel seam, plus thread
//! control and register transfer for threads of the calling task.
//!
//! macOS delivers hardware and software exceptions as Mach messages rather
//! than signals. A thread's exceptions are routed to a port with
//! `thread_set_exception_ports()`; whoever holds the receive right gets one
//! message per exception and the faulting thread waits until it is answered.
//!
//! ## Key Mach APIs Used
//!
//! - `mach_port_allocate()` / `mach_port_insert_right()`: create the exception endpoint
//! - `thread_set_exception_ports()`: route a thread's exceptions to it
//! - `mach_msg()`: receive exception requests and send replies (from `mach2`)
//! - `thread_suspend()` / `thread_abort_safely()`: stop the faulting thread
//! - `thread_get_state()` / `thread_set_state()`: move register state
//!
//! ## Dependencies
//!
//! As elsewhere, `mach2` supplies the message structures and the calls it
//! binds well; the remaining calls are declared in [`ffi`], with `libc` for
//! the C types.
//!
//! ## References
//!
//! - [Apple Mach Kernel Programming](https://developer.apple.com/library/archive/documentation/Darwin/Conceptual/KernelProgramming/Mach/Mach.html)

pub mod constants;
pub mod ffi;
pub mod kernel;
pub mod thread;

pub use kernel::{MachEndpoint, MachKernel};
pub use thread::{raise_breakpoint, MachThread, RunState};
