//! # Exception Monitor
//!
//! A dedicated listener thread that owns the exception endpoint.
//!
//! ## Serve loop
//!
//! For every exception message the listener:
//!
//! 1. suspends the faulting thread and aborts any blocking call it is in,
//! 2. hands an [`ExceptionRecord`] to the controller through the
//!    [`mailbox`],
//! 3. replies `KERN_SUCCESS` to the kernel,
//!
//! and then goes back to receiving. The faulting thread stays suspended
//! after the reply; resuming it is up to the controller.
//!
//! An interrupted receive, or one whose oversized message the kernel
//! discarded, is retried. Any other receive failure ends the loop, as do a
//! destroyed endpoint and a dropped controller side of the mailbox. There is
//! no stop request.
//!
//! ## Kernel seam
//!
//! The listener and the controller talk to the kernel through two traits,
//! [`ExceptionKernel`] and [`ExceptionEndpoint`]. The Mach implementation
//! lives in [`crate::platform::macos`]; tests substitute scripted fakes.
//!
//! ## References
//!
//! - [mach_msg(3) man page](https://developer.apple.com/documentation/kernel/1402149-mach_msg/)
//! - [thread_set_exception_ports](https://developer.apple.com/documentation/kernel/1418725-thread_set_exception_ports)

pub mod mailbox;

use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, trace, warn};

use crate::error::{MachError, SelfdeError, SelfdeResult};
use crate::exception::{ExceptionMask, ExceptionRecord};
use crate::types::{PortName, TaskId, ThreadId};

pub use mailbox::{MailboxReceiver, MailboxSender};

/// Default name of the listener thread.
pub const MONITOR_THREAD_NAME: &str = "Exception monitoring thread";

/// What the kernel needs to route a reply back to the raising thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyToken
{
    /// Reply port (`msgh_remote_port` of the reply)
    pub port: u32,
    /// Request message id; the reply carries `id + 100`
    pub id: i32,
}

/// A received exception message: the record plus the reply routing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionMessage
{
    pub record: ExceptionRecord,
    pub reply: ReplyToken,
}

/// Listener-side view of the kernel
///
/// One endpoint is owned by exactly one listener thread.
pub trait ExceptionEndpoint: Send + 'static
{
    /// The port exceptions arrive on.
    fn port(&self) -> PortName;

    /// Identity of the calling thread.
    fn current_thread(&self) -> ThreadId;

    /// Block until the next exception message arrives.
    ///
    /// ## Errors
    ///
    /// The raw receive status. Only [`MachError::is_interrupted`] and
    /// [`MachError::is_message_discarded`] statuses keep the serve loop going.
    fn receive(&mut self) -> Result<ExceptionMessage, MachError>;

    /// Suspend `thread` and abort any interruptible kernel call it is blocked in.
    fn suspend_thread(&mut self, thread: ThreadId) -> Result<(), MachError>;

    /// Tell the kernel the exception was handled.
    fn reply(&mut self, token: &ReplyToken) -> Result<(), MachError>;
}

/// Controller-side view of the kernel
pub trait ExceptionKernel
{
    type Endpoint: ExceptionEndpoint;

    /// The task this process runs as.
    fn current_task(&self) -> TaskId;

    /// Identity of the calling thread.
    fn current_thread(&self) -> ThreadId;

    /// Allocate a receive right and give it a send right.
    ///
    /// ## Errors
    ///
    /// The kernel status of the failing allocation, unmodified.
    fn open_endpoint(&self) -> Result<Self::Endpoint, MachError>;

    /// Route the exception types in `mask` raised on `thread` to `port`.
    fn watch_thread(&self, port: PortName, thread: ThreadId, mask: ExceptionMask) -> Result<(), MachError>;

    /// Every thread of `task`.
    fn task_threads(&self, task: TaskId) -> Result<Vec<ThreadId>, MachError>;
}

/// Listener configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions
{
    /// Name given to the listener thread
    pub thread_name: String,
    /// Exception types routed to the endpoint
    pub mask: ExceptionMask,
}

impl Default for MonitorOptions
{
    fn default() -> Self
    {
        Self {
            thread_name: MONITOR_THREAD_NAME.to_string(),
            mask: ExceptionMask::MONITORED,
        }
    }
}

/// A running listener thread
#[derive(Debug)]
pub struct MonitorHandle
{
    thread: ThreadId,
    port: PortName,
    listener: JoinHandle<()>,
}

impl MonitorHandle
{
    /// Identity the listener reported for itself.
    pub fn thread(&self) -> ThreadId
    {
        self.thread
    }

    /// The endpoint the listener receives on.
    pub fn port(&self) -> PortName
    {
        self.port
    }

    /// `false` once the serve loop has ended.
    pub fn is_running(&self) -> bool
    {
        !self.listener.is_finished()
    }
}

/// Start a listener thread serving `endpoint`.
///
/// Returns only once the listener has recorded its own identity and is about
/// to receive, so no exception raised after this call can be missed.
///
/// ## Errors
///
/// - [`SelfdeError::ThreadSpawn`] if the thread cannot be created
/// - [`SelfdeError::MonitorNotReady`] if it exits before signalling readiness
pub fn spawn_monitor<E>(endpoint: E, options: &MonitorOptions, mailbox: MailboxSender<ExceptionRecord>)
    -> SelfdeResult<MonitorHandle>
where
    E: ExceptionEndpoint,
{
    let port = endpoint.port();
    let (ready_tx, ready_rx) = mpsc::sync_channel(1);

    let listener = thread::Builder::new()
        .name(options.thread_name.clone())
        .spawn(move || {
            let mut endpoint = endpoint;
            if ready_tx.send(endpoint.current_thread()).is_err() {
                return;
            }
            serve(&mut endpoint, &mailbox);
        })
        .map_err(SelfdeError::ThreadSpawn)?;

    let thread = ready_rx.recv().map_err(|_| SelfdeError::MonitorNotReady)?;
    debug!(thread = %thread, port = port.raw(), "Exception monitor listening");

    Ok(MonitorHandle { thread, port, listener })
}

/// Receive, suspend, deliver and reply until the endpoint fails or the
/// controller goes away.
pub fn serve<E>(endpoint: &mut E, mailbox: &MailboxSender<ExceptionRecord>)
where
    E: ExceptionEndpoint,
{
    loop {
        let ExceptionMessage { record, reply } = match endpoint.receive() {
            Ok(message) => message,
            Err(err) if err.is_endpoint_closed() => {
                debug!("Exception port closed, exiting monitor loop");
                break;
            }
            Err(err) if err.is_interrupted() => {
                trace!("Exception receive interrupted");
                continue;
            }
            Err(err) if err.is_message_discarded() => {
                warn!("Dropped exception message: {err}");
                continue;
            }
            Err(err) => {
                error!("Failed to receive exception message, exiting monitor loop: {err}");
                break;
            }
        };

        let thread = record.thread;
        if let Err(err) = endpoint.suspend_thread(thread) {
            error!(thread = %thread, "Failed to suspend faulting thread: {err}");
        }
        debug!(thread = %thread, class = %record.class, "Exception caught");

        let controller_gone = mailbox.deliver(record).is_err();

        if let Err(err) = endpoint.reply(&reply) {
            error!("Failed to send exception reply: {err}");
        }

        if controller_gone {
            debug!("Exception mailbox receiver dropped, exiting monitor loop");
            break;
        }
    }
}
