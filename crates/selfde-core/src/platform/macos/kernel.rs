//! # Mach Exception Kernel
//!
//! [`ExceptionKernel`] and [`ExceptionEndpoint`] over the real Mach calls.
//!
//! ## Message Protocol
//!
//! Threads are registered with `EXCEPTION_DEFAULT` behavior, so every
//! exception arrives as an `exception_raise` request (message id 2401)
//! carrying the thread and task ports, the exception type and up to two
//! 32-bit codes. Requests are received into a buffer with room for the
//! largest trailer the kernel may append; a message that still does not fit
//! is discarded by the kernel and reported as `MACH_RCV_TOO_LARGE`. The reply is a `__Reply__exception_raise_t` sent to the
//! request's reply port with id `request + 100` and a `RetCode` of
//! `KERN_SUCCESS`.
//!
//! ## References
//!
//! - [mach_msg(3) man page](https://developer.apple.com/documentation/kernel/1402149-mach_msg/)
//! - [exc.defs](https://github.com/apple-oss-distributions/xnu/blob/main/osfmk/mach/exc.defs)

use std::mem::MaybeUninit;

use libc::{mach_msg_type_number_t, thread_act_t, vm_address_t, vm_size_t};
use mach2::exc::{__Reply__exception_raise_t, __Request__exception_raise_t};
use mach2::kern_return::KERN_SUCCESS;
use mach2::message::{
    mach_msg, mach_msg_header_t, mach_msg_size_t, MACH_MSGH_BITS, MACH_MSG_SUCCESS, MACH_MSG_TIMEOUT_NONE,
    MACH_MSG_TYPE_MOVE_SEND_ONCE, MACH_RCV_MSG, MACH_SEND_MSG,
};
use mach2::ndr::NDR_record;
use mach2::port::MACH_PORT_NULL;
use mach2::task::task_threads;
use mach2::traps::mach_task_self;
use tracing::{debug, trace, warn};

use crate::error::MachError;
use crate::exception::{ExceptionClass, ExceptionMask, ExceptionRecord};
use crate::monitor::{ExceptionEndpoint, ExceptionKernel, ExceptionMessage, ReplyToken};
use crate::platform::macos::thread::MachThread;
use crate::platform::macos::{constants, ffi};
use crate::types::{PortName, TaskId, ThreadId};

/// The calling task's Mach kernel interface
#[derive(Debug, Clone, Copy, Default)]
pub struct MachKernel;

impl MachKernel
{
    pub fn new() -> Self
    {
        MachKernel
    }
}

impl ExceptionKernel for MachKernel
{
    type Endpoint = MachEndpoint;

    fn current_task(&self) -> TaskId
    {
        TaskId(unsafe { mach_task_self() })
    }

    fn current_thread(&self) -> ThreadId
    {
        MachThread::current().id()
    }

    fn open_endpoint(&self) -> Result<MachEndpoint, MachError>
    {
        let task = unsafe { mach_task_self() };
        let mut name: ffi::MachPortName = 0;
        MachError::check(unsafe { ffi::mach_port_allocate(task, constants::MACH_PORT_RIGHT_RECEIVE, &mut name) })?;
        MachError::check(unsafe { ffi::mach_port_insert_right(task, name, name, constants::MACH_MSG_TYPE_MAKE_SEND) })?;
        debug!(port = name, "Allocated exception port");
        Ok(MachEndpoint { port: name })
    }

    fn watch_thread(&self, port: PortName, thread: ThreadId, mask: ExceptionMask) -> Result<(), MachError>
    {
        MachError::check(unsafe {
            ffi::thread_set_exception_ports(
                thread.raw(),
                mask.bits(),
                port.raw(),
                constants::EXCEPTION_DEFAULT,
                constants::THREAD_STATE_NONE,
            )
        })
    }

    fn task_threads(&self, task: TaskId) -> Result<Vec<ThreadId>, MachError>
    {
        let mut threads: *mut thread_act_t = std::ptr::null_mut();
        let mut count: mach_msg_type_number_t = 0;
        MachError::check(unsafe { task_threads(task.raw(), &mut threads, &mut count) })?;
        if threads.is_null() || count == 0 {
            return Ok(Vec::new());
        }

        let ids = unsafe { std::slice::from_raw_parts(threads, count as usize) }
            .iter()
            .map(|port| ThreadId(*port))
            .collect();

        let size = (count as usize).saturating_mul(std::mem::size_of::<thread_act_t>()) as vm_size_t;
        let kr = unsafe { ffi::vm_deallocate(mach_task_self(), threads as vm_address_t, size) };
        if let Err(err) = MachError::check(kr) {
            warn!(count, "Failed to free thread list: {err}");
        }
        Ok(ids)
    }
}

/// A receive right exceptions are delivered to
///
/// The receive right and its send right are released on drop, so an endpoint
/// that never reached a listener does not leak the port.
#[derive(Debug)]
pub struct MachEndpoint
{
    port: ffi::MachPortName,
}

// A request followed by room for the largest trailer.
#[repr(C)]
struct RequestBuffer
{
    request: __Request__exception_raise_t,
    _trailer: [u8; constants::MAX_TRAILER_SIZE],
}

impl Drop for MachEndpoint
{
    fn drop(&mut self)
    {
        let task = unsafe { mach_task_self() };
        // Destroying the receive right leaves our send right as a dead name
        let kr = unsafe { ffi::mach_port_mod_refs(task, self.port, constants::MACH_PORT_RIGHT_RECEIVE, -1) };
        if let Err(err) = MachError::check(kr) {
            warn!(port = self.port, "Failed to destroy exception port: {err}");
            return;
        }
        if let Err(err) = MachError::check(unsafe { ffi::mach_port_deallocate(task, self.port) }) {
            warn!(port = self.port, "Failed to release exception port name: {err}");
            return;
        }
        debug!(port = self.port, "Released exception port");
    }
}

impl ExceptionEndpoint for MachEndpoint
{
    fn port(&self) -> PortName
    {
        PortName(self.port)
    }

    fn current_thread(&self) -> ThreadId
    {
        MachThread::current().id()
    }

    fn receive(&mut self) -> Result<ExceptionMessage, MachError>
    {
        let mut buffer = MaybeUninit::<RequestBuffer>::zeroed();
        let recv_size = std::mem::size_of::<RequestBuffer>() as mach_msg_size_t;

        let kr = unsafe {
            mach_msg(
                buffer.as_mut_ptr() as *mut mach_msg_header_t,
                MACH_RCV_MSG,
                0,
                recv_size,
                self.port,
                MACH_MSG_TIMEOUT_NONE,
                MACH_PORT_NULL,
            )
        };
        if kr != MACH_MSG_SUCCESS {
            return Err(MachError::from(kr));
        }

        let message = unsafe { buffer.assume_init() }.request;
        let code_count = (message.codeCnt as usize).min(message.code.len());
        let codes = message.code[..code_count].iter().map(|code| i64::from(*code)).collect();
        let record = ExceptionRecord::new(
            ThreadId(message.thread.name),
            ExceptionClass::from_raw(message.exception),
            codes,
        );
        trace!(id = message.Head.msgh_id, "Received exception_raise request");

        Ok(ExceptionMessage {
            record,
            reply: ReplyToken {
                port: message.Head.msgh_remote_port,
                id: message.Head.msgh_id,
            },
        })
    }

    fn suspend_thread(&mut self, thread: ThreadId) -> Result<(), MachError>
    {
        let thread = MachThread::new(thread);
        thread.suspend()?;
        thread.abort_safely()
    }

    fn reply(&mut self, token: &ReplyToken) -> Result<(), MachError>
    {
        let mut reply = __Reply__exception_raise_t {
            Head: mach_msg_header_t {
                msgh_bits: MACH_MSGH_BITS(MACH_MSG_TYPE_MOVE_SEND_ONCE, 0),
                msgh_size: std::mem::size_of::<__Reply__exception_raise_t>() as mach_msg_size_t,
                msgh_remote_port: token.port,
                msgh_local_port: MACH_PORT_NULL,
                msgh_voucher_port: MACH_PORT_NULL,
                msgh_id: token.id + 100,
            },
            NDR: unsafe { NDR_record },
            RetCode: KERN_SUCCESS,
        };

        let kr = unsafe {
            mach_msg(
                &mut reply.Head,
                MACH_SEND_MSG,
                reply.Head.msgh_size,
                0,
                MACH_PORT_NULL,
                MACH_MSG_TIMEOUT_NONE,
                MACH_PORT_NULL,
            )
        };
        MachError::check(kr)
    }
}
