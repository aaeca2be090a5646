//! Integration tests for the Mach backend
//!
//! These tests require:
//! - Running on macOS on x86-64 (`#[cfg(all(target_os = "macos", target_arch = "x86_64"))]`)
//!
//! No special permissions are needed: every thread involved belongs to the
//! test process itself.

#![cfg(all(target_os = "macos", target_arch = "x86_64"))]

use std::sync::mpsc;
use std::thread;

use selfde_core::controller::ControllerState;
use selfde_core::exception::SIGTRAP;
use selfde_core::feature;
use selfde_core::platform::macos::{raise_breakpoint, MachKernel, MachThread, RunState};
use selfde_core::registers::{RegisterId, RegisterMarshaler};
use selfde_core::types::ThreadId;

/// Spawn a thread that reports its identity and raises `int3` once told to.
fn spawn_trapping_worker() -> (ThreadId, mpsc::Sender<()>, thread::JoinHandle<u32>)
{
    let (id_tx, id_rx) = mpsc::channel();
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let worker = thread::spawn(move || {
        id_tx.send(MachThread::current().id()).unwrap();
        go_rx.recv().unwrap();
        raise_breakpoint();
        7
    });
    (id_rx.recv().unwrap(), go_tx, worker)
}

#[test]
fn test_current_thread_is_running()
{
    let (state, suspend_count) = MachThread::current().run_state().unwrap();
    assert_eq!(state, RunState::Running);
    assert_eq!(suspend_count, 0);
}

#[test]
fn test_suspend_and_resume_worker()
{
    let (park_tx, park_rx) = mpsc::channel::<()>();
    let (id_tx, id_rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        id_tx.send(MachThread::current().id()).unwrap();
        park_rx.recv().unwrap();
    });
    let thread = MachThread::new(id_rx.recv().unwrap());

    thread.suspend().unwrap();
    let (_, suspend_count) = thread.run_state().unwrap();
    assert_eq!(suspend_count, 1);

    let context = thread.capture_context(feature::vector_layout()).unwrap();
    assert_ne!(context.stack_pointer(), 0);
    assert_ne!(context.instruction_pointer(), 0);
    thread.apply_context(&context).unwrap();

    thread.resume().unwrap();
    park_tx.send(()).unwrap();
    worker.join().unwrap();
}

#[test]
fn test_breakpoint_reaches_controller()
{
    let (target, go, worker) = spawn_trapping_worker();

    let mut controller = ControllerState::init(MachKernel::new()).with_target(target);
    controller.start().unwrap();
    assert!(controller.is_monitoring());
    assert!(!controller.threads().unwrap().contains(&controller.controller_thread()));

    go.send(()).unwrap();
    let record = controller.wait_for_exception().unwrap();
    assert_eq!(record.thread, target);
    assert!(record.is_breakpoint());
    assert_eq!(record.signal_number(), SIGTRAP);

    // The listener left the worker suspended
    let thread = MachThread::new(record.thread);
    let (_, suspend_count) = thread.run_state().unwrap();
    assert!(suspend_count >= 1);

    let layout = feature::vector_layout();
    let mut context = thread.capture_context(layout).unwrap();
    // T_INT3
    assert_eq!(context.trap_number(), 3);

    // Round trip the whole context through the canonical buffer and back
    let marshaler = RegisterMarshaler::new(layout);
    let buffer = marshaler.encode(&context).unwrap();
    marshaler.decode_from(&mut context, &buffer).unwrap();
    let rip = marshaler.get_register(RegisterId::gpr(16), &context).unwrap();
    assert_eq!(rip.as_slice(), &context.instruction_pointer().to_le_bytes());
    thread.apply_context(&context).unwrap();

    thread.resume().unwrap();
    assert_eq!(worker.join().unwrap(), 7);
}
