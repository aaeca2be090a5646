//! # Mach Thread Control
//!
//! Suspend/resume, abort and register state transfer for threads of the
//! calling task.
//!
//! Register state moves between the kernel and a [`RegisterContext`] as
//! `natural_t` words, copied into the context's byte images in little-endian
//! order; the context never aliases a kernel structure.
//!
//! ## References
//!
//! - [thread_get_state(3) man page](https://developer.apple.com/documentation/kernel/1418576-thread_get_state/)
//! - [thread_set_state(3) man page](https://developer.apple.com/documentation/kernel/1418827-thread_set_state/)
//! - [thread_info](https://developer.apple.com/documentation/kernel/1418630-thread_info)

use libc::{c_int, mach_msg_type_number_t, natural_t, thread_act_t};
use tracing::{trace, warn};

use crate::error::MachError;
use crate::feature::VectorLayout;
use crate::platform::macos::{constants, ffi};
use crate::registers::RegisterContext;
use crate::types::ThreadId;

/// Scheduler state of a thread (`TH_STATE_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState
{
    Running,
    Stopped,
    Waiting,
    Uninterruptible,
    Halted,
    Unknown(i32),
}

impl RunState
{
    fn from_raw(raw: c_int) -> Self
    {
        match raw {
            constants::TH_STATE_RUNNING => RunState::Running,
            constants::TH_STATE_STOPPED => RunState::Stopped,
            constants::TH_STATE_WAITING => RunState::Waiting,
            constants::TH_STATE_UNINTERRUPTIBLE => RunState::Uninterruptible,
            constants::TH_STATE_HALTED => RunState::Halted,
            other => RunState::Unknown(other),
        }
    }
}

/// A thread of the calling task, addressed by its thread port
///
/// ```rust,no_run
/// use selfde_core::feature;
/// use selfde_core::platform::macos::MachThread;
/// use selfde_core::types::ThreadId;
///
/// # fn inspect(id: ThreadId) -> Result<(), selfde_core::error::MachError>
/// # {
/// let thread = MachThread::new(id);
/// thread.suspend()?;
/// let context = thread.capture_context(feature::vector_layout())?;
/// println!("rip = {:#x}", context.instruction_pointer());
/// thread.resume()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MachThread
{
    port: thread_act_t,
}

impl MachThread
{
    pub fn new(thread: ThreadId) -> Self
    {
        Self { port: thread.raw() }
    }

    /// The calling thread.
    pub fn current() -> Self
    {
        Self {
            port: unsafe { ffi::mach_thread_self() },
        }
    }

    pub fn id(&self) -> ThreadId
    {
        ThreadId(self.port)
    }

    pub fn suspend(&self) -> Result<(), MachError>
    {
        MachError::check(unsafe { ffi::thread_suspend(self.port) })
    }

    pub fn resume(&self) -> Result<(), MachError>
    {
        MachError::check(unsafe { ffi::thread_resume(self.port) })
    }

    /// Abort whatever kernel call the thread is blocked in.
    pub fn abort(&self) -> Result<(), MachError>
    {
        MachError::check(unsafe { ffi::thread_abort(self.port) })
    }

    /// Abort a blocking kernel call only where it can be restarted.
    pub fn abort_safely(&self) -> Result<(), MachError>
    {
        MachError::check(unsafe { ffi::thread_abort_safely(self.port) })
    }

    /// Current scheduler state and suspend count.
    pub fn run_state(&self) -> Result<(RunState, u32), MachError>
    {
        let mut info = ffi::ThreadBasicInfo::default();
        let mut count = constants::THREAD_BASIC_INFO_COUNT;
        MachError::check(unsafe {
            ffi::thread_info(
                self.port,
                constants::THREAD_BASIC_INFO,
                &mut info as *mut ffi::ThreadBasicInfo as *mut ffi::IntegerT,
                &mut count,
            )
        })?;
        Ok((
            RunState::from_raw(info.run_state),
            u32::try_from(info.suspend_count).unwrap_or(0),
        ))
    }

    /// Read every register of the thread.
    ///
    /// The thread should be suspended; otherwise the sets are captured at
    /// different moments.
    ///
    /// ## Errors
    ///
    /// The status of the first failing `thread_get_state`. Requesting
    /// [`VectorLayout::Extended`] on a host without AVX state fails with
    /// `KERN_INVALID_ARGUMENT`. A state shorter than the full image fails with
    /// `KERN_INVALID_VALUE`.
    pub fn capture_context(&self, layout: VectorLayout) -> Result<RegisterContext, MachError>
    {
        let mut context = RegisterContext::new(layout);
        get_state(
            self.port,
            constants::X86_THREAD_STATE64,
            constants::X86_THREAD_STATE64_COUNT,
            context.gpr_bytes_mut(),
        )?;
        let (flavor, count) = vector_flavor(layout);
        get_state(self.port, flavor, count, context.vector_bytes_mut())?;
        get_state(
            self.port,
            constants::X86_EXCEPTION_STATE64,
            constants::X86_EXCEPTION_STATE64_COUNT,
            context.exception_bytes_mut(),
        )?;
        trace!(thread = %self.id(), layout = layout.name(), "Captured register context");
        Ok(context)
    }

    /// Write general purpose and floating point state back to the thread.
    ///
    /// The exception state is read-only and is not written.
    pub fn apply_context(&self, context: &RegisterContext) -> Result<(), MachError>
    {
        set_state(self.port, constants::X86_THREAD_STATE64, context.gpr_bytes())?;
        let (flavor, _) = vector_flavor(context.layout());
        set_state(self.port, flavor, context.vector_bytes())?;
        trace!(thread = %self.id(), "Applied register context");
        Ok(())
    }

    pub fn instruction_pointer(&self) -> Result<u64, MachError>
    {
        Ok(self.general_state()?.instruction_pointer())
    }

    pub fn set_instruction_pointer(&self, address: u64) -> Result<(), MachError>
    {
        let mut context = self.general_state()?;
        context.set_instruction_pointer(address);
        set_state(self.port, constants::X86_THREAD_STATE64, context.gpr_bytes())
    }

    pub fn stack_pointer(&self) -> Result<u64, MachError>
    {
        Ok(self.general_state()?.stack_pointer())
    }

    /// Set or clear the trap flag so the thread stops after one instruction.
    pub fn set_single_step(&self, enabled: bool) -> Result<(), MachError>
    {
        let mut context = self.general_state()?;
        let flags = if enabled {
            context.flags() | constants::RFLAGS_TRAP_FLAG
        } else {
            context.flags() & !constants::RFLAGS_TRAP_FLAG
        };
        context.set_flags(flags);
        set_state(self.port, constants::X86_THREAD_STATE64, context.gpr_bytes())
    }

    // Only the general purpose image of the returned context is filled in.
    fn general_state(&self) -> Result<RegisterContext, MachError>
    {
        let mut context = RegisterContext::new(VectorLayout::Legacy);
        get_state(
            self.port,
            constants::X86_THREAD_STATE64,
            constants::X86_THREAD_STATE64_COUNT,
            context.gpr_bytes_mut(),
        )?;
        Ok(context)
    }
}

/// Execute `int3` on the calling thread.
///
/// Raises `EXC_BREAKPOINT`. If the thread's exceptions are routed to a
/// monitor, the thread stops here until the controller resumes it; the
/// instruction pointer is already past the trap when it continues.
pub fn raise_breakpoint()
{
    unsafe {
        std::arch::asm!("int3", options(nomem, nostack));
    }
}

fn vector_flavor(layout: VectorLayout) -> (c_int, mach_msg_type_number_t)
{
    match layout {
        VectorLayout::Legacy => (constants::X86_FLOAT_STATE64, constants::X86_FLOAT_STATE64_COUNT),
        VectorLayout::Extended => (constants::X86_AVX_STATE64, constants::X86_AVX_STATE64_COUNT),
    }
}

fn get_state(port: thread_act_t, flavor: c_int, count: mach_msg_type_number_t, dest: &mut [u8])
    -> Result<(), MachError>
{
    let mut words: Vec<natural_t> = vec![0; count as usize];
    let mut returned = count;
    MachError::check(unsafe { ffi::thread_get_state(port, flavor, words.as_mut_ptr(), &mut returned) })?;
    if returned != count {
        warn!(flavor, expected = count, returned, "Thread state is shorter than requested");
    }
    copy_state_words(&words, returned, dest)
}

// Fails with KERN_INVALID_VALUE, leaving dest untouched, unless the kernel
// filled every word of the image.
fn copy_state_words(words: &[natural_t], returned: mach_msg_type_number_t, dest: &mut [u8])
    -> Result<(), MachError>
{
    if returned as usize != words.len() || dest.len() != words.len() * 4 {
        return Err(MachError::InvalidValue);
    }
    for (chunk, word) in dest.chunks_exact_mut(4).zip(words) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    Ok(())
}

fn set_state(port: thread_act_t, flavor: c_int, source: &[u8]) -> Result<(), MachError>
{
    let words: Vec<natural_t> = source
        .chunks_exact(4)
        .map(|chunk| natural_t::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    let count = words.len() as mach_msg_type_number_t;
    MachError::check(unsafe { ffi::thread_set_state(port, flavor, words.as_ptr(), count) })
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn full_state_is_copied_little_endian()
    {
        let mut dest = [0u8; 8];
        copy_state_words(&[0x0403_0201, 0x0807_0605], 2, &mut dest).unwrap();
        assert_eq!(dest, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn short_state_is_rejected()
    {
        let mut dest = [0xaau8; 8];
        assert_eq!(copy_state_words(&[1, 2], 1, &mut dest), Err(MachError::InvalidValue));
        assert_eq!(dest, [0xaa; 8]);
    }
}
