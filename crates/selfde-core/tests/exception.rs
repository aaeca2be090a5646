//! Tests for exception records

use selfde_core::exception::{ExceptionClass, ExceptionMask, ExceptionRecord, EXC_SOFT_SIGNAL, SIGTRAP};
use selfde_core::types::ThreadId;

fn record(class: ExceptionClass, codes: Vec<i64>) -> ExceptionRecord
{
    ExceptionRecord::new(ThreadId(0x1a03), class, codes)
}

#[test]
fn test_signal_numbers()
{
    assert_eq!(record(ExceptionClass::Breakpoint, vec![1, 0]).signal_number(), SIGTRAP);
    assert_eq!(record(ExceptionClass::BadAccess, vec![1, 0x10]).signal_number(), 0x91);
    assert_eq!(record(ExceptionClass::BadInstruction, vec![1]).signal_number(), 0x92);
    assert_eq!(record(ExceptionClass::Arithmetic, vec![1]).signal_number(), 0x93);
    assert_eq!(record(ExceptionClass::Emulation, vec![]).signal_number(), 0x94);
    assert_eq!(record(ExceptionClass::Crash, vec![]).signal_number(), 0);
    assert_eq!(record(ExceptionClass::Unknown(42), vec![]).signal_number(), 0);
}

#[test]
fn test_software_exception_carries_signal()
{
    // SIGSEGV delivered as a soft signal
    assert_eq!(record(ExceptionClass::Software, vec![EXC_SOFT_SIGNAL, 11]).signal_number(), 11);
    assert_eq!(record(ExceptionClass::Software, vec![0x10001, 11]).signal_number(), 0x95);
    assert_eq!(record(ExceptionClass::Software, vec![EXC_SOFT_SIGNAL]).signal_number(), 0x95);
}

#[test]
fn test_predicates_and_fault_address()
{
    let access = record(ExceptionClass::BadAccess, vec![1, 0xdead_0000]);
    assert!(access.is_bad_access());
    assert!(!access.is_breakpoint());
    assert_eq!(access.fault_address(), Some(0xdead_0000));

    let trap = record(ExceptionClass::Breakpoint, vec![1, 0]);
    assert!(trap.is_breakpoint());
    assert_eq!(trap.fault_address(), None);

    assert!(record(ExceptionClass::BadInstruction, vec![]).is_bad_instruction());
    assert_eq!(record(ExceptionClass::BadAccess, vec![1]).fault_address(), None);
}

#[test]
fn test_record_display()
{
    let text = record(ExceptionClass::Breakpoint, vec![1, 0]).to_string();
    assert_eq!(text, "breakpoint on thread 0x1a03 (codes 0x1 0x0)");
}

#[test]
fn test_default_mask_is_monitored_set()
{
    let mask = ExceptionMask::default();
    assert_eq!(mask, ExceptionMask::MONITORED);
    assert!(mask.contains(ExceptionMask::BREAKPOINT | ExceptionMask::BAD_ACCESS | ExceptionMask::RPC_ALERT));
    assert!(!mask.contains(ExceptionMask::CRASH));
}
