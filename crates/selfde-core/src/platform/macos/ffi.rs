//! # Mach API FFI Declarations
//!
//! The `extern "C"` declarations the exception monitor and thread control
//! need. Message send/receive (`mach_msg`), `task_threads` and
//! `mach_task_self` come from the `mach2` crate; everything else is declared
//! here so the full set of thread and port calls can be reviewed in one place.
//!
//! All of these operate on the calling task only. No entitlements are needed
//! for a process to debug its own threads.
//!
//! ## Safety Notes
//!
//! Every function here is `unsafe`: the caller supplies raw port names and
//! state buffers whose size must match the requested flavor. Safe wrappers
//! live in [`super::thread`] and [`super::kernel`].
//!
//! ## References
//!
//! - [Mach System Calls](https://developer.apple.com/documentation/kernel)
//! - [thread_act.defs](https://github.com/apple-oss-distributions/xnu/blob/main/osfmk/mach/thread_act.defs)

// Allow doc comments in extern blocks - they're useful for developers even if rustdoc doesn't generate docs
#![allow(unused_doc_comments)]

use libc::{
    c_int, kern_return_t, mach_msg_type_number_t, mach_port_t, natural_t, thread_act_t, vm_address_t, vm_map_t, vm_size_t,
};

/// `integer_t`
pub type IntegerT = c_int;
/// `mach_port_name_t`
pub type MachPortName = u32;
/// `mach_port_right_t`
pub type MachPortRight = u32;
/// `mach_msg_type_name_t`
pub type MachMsgTypeName = u32;

/// `thread_basic_info` (flavor `THREAD_BASIC_INFO`)
///
/// Only `run_state` and `suspend_count` are consumed; the layout is declared
/// in full so `thread_info` can fill it.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadBasicInfo
{
    /// User run time (seconds, microseconds)
    pub user_time: [IntegerT; 2],
    /// System run time (seconds, microseconds)
    pub system_time: [IntegerT; 2],
    /// Scaled CPU usage percentage
    pub cpu_usage: IntegerT,
    /// Scheduling policy in effect
    pub policy: IntegerT,
    /// `TH_STATE_*`
    pub run_state: IntegerT,
    /// `TH_FLAGS_*`
    pub flags: IntegerT,
    /// Suspend count for this thread
    pub suspend_count: IntegerT,
    /// Seconds the thread has been sleeping
    pub sleep_time: IntegerT,
}

// Port and Task Functions
#[link(name = "c", kind = "dylib")]
extern "C" {
    /// Identity of the calling thread
    ///
    /// Returns a send right to the calling thread's port; the caller owns one
    /// reference on it.
    pub fn mach_thread_self() -> thread_act_t;

    /// Create a port right in `task`
    ///
    /// ## Parameters
    ///
    /// - `task`: Task that will hold the right (use `mach_task_self()`)
    /// - `right`: `MACH_PORT_RIGHT_RECEIVE` for an exception endpoint
    /// - `name`: Output - name of the new right
    ///
    /// ## Returns
    ///
    /// - `KERN_SUCCESS` (0) on success
    /// - `KERN_NO_SPACE` if the task's port name space is full
    /// - `KERN_RESOURCE_SHORTAGE` if the kernel is out of memory
    ///
    /// See: [mach_port_allocate](https://developer.apple.com/documentation/kernel/1578808-mach_port_allocate)
    pub fn mach_port_allocate(task: mach_port_t, right: MachPortRight, name: *mut MachPortName)
        -> kern_return_t;

    /// Add a right to an existing port name
    ///
    /// Used with `MACH_MSG_TYPE_MAKE_SEND` so the kernel can send exception
    /// messages to a port we hold the receive right for.
    ///
    /// See: [mach_port_insert_right](https://developer.apple.com/documentation/kernel/1578831-mach_port_insert_right)
    pub fn mach_port_insert_right(
        task: mach_port_t,
        name: MachPortName,
        poly: mach_port_t,
        poly_poly: MachMsgTypeName,
    ) -> kern_return_t;

    /// Release a reference on a port right
    ///
    /// Also used to drop the dead name left behind once a receive right is destroyed.
    pub fn mach_port_deallocate(task: mach_port_t, name: MachPortName) -> kern_return_t;

    /// Change the number of user references a name has for `right`
    ///
    /// A delta of -1 on `MACH_PORT_RIGHT_RECEIVE` destroys the receive right.
    ///
    /// See: [mach_port_mod_refs](https://developer.apple.com/documentation/kernel/1578774-mach_port_mod_refs)
    pub fn mach_port_mod_refs(task: mach_port_t, name: MachPortName, right: MachPortRight, delta: IntegerT)
        -> kern_return_t;

    /// Free memory returned out-of-line by the kernel (e.g. the `task_threads` array)
    ///
    /// See: [vm_deallocate(3) man page](https://developer.apple.com/documentation/kernel/1585284-vm_deallocate/)
    pub fn vm_deallocate(target_task: vm_map_t, address: vm_address_t, size: vm_size_t) -> kern_return_t;
}

// Thread Functions
#[link(name = "c", kind = "dylib")]
extern "C" {
    /// Read one flavor of thread state
    ///
    /// ## Parameters
    ///
    /// - `target_act`: Thread port
    /// - `flavor`: `x86_THREAD_STATE64`, `x86_FLOAT_STATE64`, `x86_AVX_STATE64` or `x86_EXCEPTION_STATE64`
    /// - `old_state`: Output buffer
    /// - `old_state_count`: Input/output - buffer size / size used, in `natural_t` units
    ///
    /// ## Returns
    ///
    /// - `KERN_SUCCESS` (0) on success
    /// - `KERN_INVALID_ARGUMENT` if the flavor is not supported on this host
    ///
    /// See: [thread_get_state(3) man page](https://developer.apple.com/documentation/kernel/1418576-thread_get_state/)
    pub fn thread_get_state(
        target_act: thread_act_t,
        flavor: c_int,
        old_state: *mut natural_t,
        old_state_count: *mut mach_msg_type_number_t,
    ) -> kern_return_t;

    /// Write one flavor of thread state
    ///
    /// The thread must be suspended (and not the calling thread).
    ///
    /// See: [thread_set_state(3) man page](https://developer.apple.com/documentation/kernel/1418827-thread_set_state/)
    pub fn thread_set_state(
        target_act: thread_act_t,
        flavor: c_int,
        new_state: *const natural_t,
        new_state_count: mach_msg_type_number_t,
    ) -> kern_return_t;

    /// Increment the suspend count of a thread
    ///
    /// See: [thread_suspend(3) man page](https://developer.apple.com/documentation/kernel/1402804-thread_suspend/)
    pub fn thread_suspend(target_act: thread_act_t) -> kern_return_t;

    /// Decrement the suspend count of a thread
    ///
    /// See: [thread_resume(3) man page](https://developer.apple.com/documentation/kernel/1402805-thread_resume/)
    pub fn thread_resume(target_act: thread_act_t) -> kern_return_t;

    /// Abort any kernel call the thread is blocked in
    ///
    /// The aborted call returns `KERN_ABORTED` (or `MACH_RCV_INTERRUPTED`) to
    /// the thread once it resumes.
    pub fn thread_abort(target_act: thread_act_t) -> kern_return_t;

    /// Abort a blocking kernel call only where it can be restarted cleanly
    ///
    /// Unlike `thread_abort`, leaves the thread in a state where its
    /// registers are consistent and can be read or written.
    pub fn thread_abort_safely(target_act: thread_act_t) -> kern_return_t;

    /// Query scheduling information about a thread
    ///
    /// With `THREAD_BASIC_INFO` fills a [`ThreadBasicInfo`].
    pub fn thread_info(
        target_act: thread_act_t,
        flavor: c_int,
        thread_info_out: *mut IntegerT,
        thread_info_out_count: *mut mach_msg_type_number_t,
    ) -> kern_return_t;

    /// Route a thread's exceptions to a port
    ///
    /// ## Parameters
    ///
    /// - `thread`: Thread whose exceptions are redirected
    /// - `exception_mask`: `EXC_MASK_*` bits to redirect
    /// - `new_port`: Port holding a send right the kernel can use
    /// - `behavior`: `EXCEPTION_DEFAULT` (plain `exception_raise` messages)
    /// - `new_flavor`: Thread state flavor sent with state behaviors; `THREAD_STATE_NONE` here
    ///
    /// See: [thread_set_exception_ports](https://developer.apple.com/documentation/kernel/1418725-thread_set_exception_ports)
    pub fn thread_set_exception_ports(
        thread: thread_act_t,
        exception_mask: u32,
        new_port: mach_port_t,
        behavior: c_int,
        new_flavor: c_int,
    ) -> kern_return_t;
}
