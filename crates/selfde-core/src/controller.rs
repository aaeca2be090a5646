//! # Controller State
//!
//! The handle set a self-debugging session works through: the task and
//! thread identities captured at [`ControllerState::init`], the exception
//! endpoint, the listener thread and the controller's end of the mailbox.
//!
//! ## Lifecycle
//!
//! ```text
//! init ──► start ──► wait_for_exception ──► (inspect / modify registers, resume) ──► wait_for_exception ...
//! ```
//!
//! Monitoring, once started, runs for the rest of the controller's life.
//! Dropping the controller drops the mailbox receiver, and the listener
//! exits after its next exception.
//!
//! ## Example
//!
//! ```rust,no_run
//! # #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
//! # fn main() -> selfde_core::error::SelfdeResult<()>
//! # {
//! use selfde_core::controller::ControllerState;
//! use selfde_core::platform::macos::MachKernel;
//!
//! let mut controller = ControllerState::init(MachKernel::new());
//! controller.start()?;
//! let record = controller.wait_for_exception()?;
//! println!("{record}");
//! # Ok(())
//! # }
//! # #[cfg(not(all(target_os = "macos", target_arch = "x86_64")))]
//! # fn main() {}
//! ```

use tracing::{debug, info};

use crate::error::{SelfdeError, SelfdeResult};
use crate::exception::{ExceptionMask, ExceptionRecord};
use crate::monitor::{self, mailbox, ExceptionEndpoint, ExceptionKernel, MailboxReceiver, MonitorHandle, MonitorOptions};
use crate::types::{PortName, TaskId, ThreadId};

#[derive(Debug)]
struct ActiveMonitor
{
    handle: MonitorHandle,
    mailbox: MailboxReceiver<ExceptionRecord>,
    mask: ExceptionMask,
}

/// Shared handles of one self-debugging session
///
/// Generic over the kernel so the whole start/wait protocol can run against
/// an in-memory kernel in tests.
#[derive(Debug)]
pub struct ControllerState<K: ExceptionKernel>
{
    kernel: K,
    task: TaskId,
    controller_thread: ThreadId,
    target: ThreadId,
    monitor: Option<ActiveMonitor>,
}

impl<K: ExceptionKernel> ControllerState<K>
{
    /// Capture the current task and thread.
    ///
    /// The calling thread is the default monitoring target; see
    /// [`ControllerState::with_target`].
    pub fn init(kernel: K) -> Self
    {
        let task = kernel.current_task();
        let controller_thread = kernel.current_thread();
        debug!(task = task.raw(), thread = %controller_thread, "Controller initialized");

        Self {
            kernel,
            task,
            controller_thread,
            target: controller_thread,
            monitor: None,
        }
    }

    /// Monitor `thread` instead of the controller thread.
    #[must_use]
    pub fn with_target(mut self, thread: ThreadId) -> Self
    {
        self.target = thread;
        self
    }

    /// Start monitoring with [`MonitorOptions::default`].
    ///
    /// ## Errors
    ///
    /// See [`ControllerState::start_with`].
    pub fn start(&mut self) -> SelfdeResult<()>
    {
        self.start_with(&MonitorOptions::default())
    }

    /// Open the exception endpoint, route the target thread's exceptions to
    /// it and start the listener.
    ///
    /// Returns once the listener is receiving.
    ///
    /// ## Errors
    ///
    /// - [`SelfdeError::MonitorAlreadyStarted`] on a second call
    /// - [`SelfdeError::Mach`] carrying the kernel status of a failed
    ///   allocation or registration, unmodified
    /// - [`SelfdeError::ThreadSpawn`] / [`SelfdeError::MonitorNotReady`] from the listener
    pub fn start_with(&mut self, options: &MonitorOptions) -> SelfdeResult<()>
    {
        if self.monitor.is_some() {
            return Err(SelfdeError::MonitorAlreadyStarted);
        }

        let endpoint = self.kernel.open_endpoint()?;
        self.kernel.watch_thread(endpoint.port(), self.target, options.mask)?;

        let (sender, receiver) = mailbox::channel();
        let handle = monitor::spawn_monitor(endpoint, options, sender)?;
        info!(
            target_thread = %self.target,
            monitor_thread = %handle.thread(),
            "Exception monitoring started"
        );

        self.monitor = Some(ActiveMonitor {
            handle,
            mailbox: receiver,
            mask: options.mask,
        });
        Ok(())
    }

    /// Route exceptions of one more thread to the running endpoint.
    ///
    /// ## Errors
    ///
    /// [`SelfdeError::MonitorNotStarted`], or the kernel status.
    pub fn watch_thread(&self, thread: ThreadId) -> SelfdeResult<()>
    {
        let monitor = self.active()?;
        self.kernel.watch_thread(monitor.handle.port(), thread, monitor.mask)?;
        debug!(thread = %thread, "Watching additional thread");
        Ok(())
    }

    /// Block until the listener delivers the next exception.
    ///
    /// The faulting thread is already suspended when this returns.
    ///
    /// ## Errors
    ///
    /// [`SelfdeError::MonitorNotStarted`] or [`SelfdeError::MailboxClosed`].
    pub fn wait_for_exception(&self) -> SelfdeResult<ExceptionRecord>
    {
        self.active()?.mailbox.wait()
    }

    /// Take a pending exception without blocking.
    ///
    /// ## Errors
    ///
    /// As [`ControllerState::wait_for_exception`].
    pub fn try_take_exception(&self) -> SelfdeResult<Option<ExceptionRecord>>
    {
        self.active()?.mailbox.try_take()
    }

    /// Threads of the task other than the controller and listener threads.
    ///
    /// ## Errors
    ///
    /// The kernel status of the thread enumeration.
    pub fn threads(&self) -> SelfdeResult<Vec<ThreadId>>
    {
        let monitor_thread = self.monitor_thread();
        let threads = self
            .kernel
            .task_threads(self.task)?
            .into_iter()
            .filter(|thread| *thread != self.controller_thread && Some(*thread) != monitor_thread)
            .collect();
        Ok(threads)
    }

    pub fn task(&self) -> TaskId
    {
        self.task
    }

    pub fn controller_thread(&self) -> ThreadId
    {
        self.controller_thread
    }

    /// The thread whose exceptions `start` routes to the endpoint.
    pub fn target_thread(&self) -> ThreadId
    {
        self.target
    }

    /// The listener thread, once started.
    pub fn monitor_thread(&self) -> Option<ThreadId>
    {
        self.monitor.as_ref().map(|monitor| monitor.handle.thread())
    }

    /// The exception endpoint, once started.
    pub fn exception_port(&self) -> Option<PortName>
    {
        self.monitor.as_ref().map(|monitor| monitor.handle.port())
    }

    pub fn is_monitoring(&self) -> bool
    {
        self.monitor
            .as_ref()
            .is_some_and(|monitor| monitor.handle.is_running())
    }

    pub fn kernel(&self) -> &K
    {
        &self.kernel
    }

    fn active(&self) -> SelfdeResult<&ActiveMonitor>
    {
        self.monitor.as_ref().ok_or(SelfdeError::MonitorNotStarted)
    }
}
