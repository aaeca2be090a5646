//! Tests for error handling

use selfde_core::error::{MachError, RegisterError, SelfdeError, SelfdeResult};
use selfde_core::feature::VectorLayout;

#[test]
fn test_mach_error_protection_failure()
{
    let error = MachError::ProtectionFailure;
    let message = format!("{}", error);
    assert!(message.contains("Permission denied"));
    assert_eq!(error.code(), 2);
}

#[test]
fn test_mach_error_invalid_argument()
{
    let error = MachError::InvalidArgument;
    let message = format!("{}", error);
    assert!(message.contains("Invalid") || message.contains("invalid"));
}

#[test]
fn test_mach_error_unknown_keeps_code()
{
    let error = MachError::from(0x1234);
    assert_eq!(error, MachError::Unknown(0x1234));
    assert_eq!(error.code(), 0x1234);
    let message = format!("{}", error);
    assert!(message.contains("0x1234"));
}

#[test]
fn test_mach_error_receive_classification()
{
    assert!(MachError::ReceivePortDied.is_endpoint_closed());
    assert!(MachError::ReceiveInvalidName.is_endpoint_closed());
    assert!(!MachError::ReceiveInterrupted.is_endpoint_closed());
    assert!(MachError::ReceiveInterrupted.is_interrupted());
    assert!(!MachError::Failure.is_interrupted());
    assert_eq!(MachError::from(0x1000_4005), MachError::ReceiveInterrupted);
}

#[test]
fn test_mach_error_to_selfde_error()
{
    let mach_err = MachError::ProtectionFailure;
    let selfde_err: SelfdeError = mach_err.into();

    match selfde_err {
        SelfdeError::Mach(inner) => assert_eq!(inner.code(), 2),
        _ => panic!("Expected Mach variant"),
    }
}

#[test]
fn test_register_error_to_selfde_error()
{
    let error: SelfdeError = RegisterError::UnknownRegisterSet(7).into();
    let message = format!("{}", error);
    assert!(message.contains("Register error"));
    assert!(message.contains('7'));
}

#[test]
fn test_register_error_display()
{
    let error = RegisterError::SizeMismatch {
        name: "rip",
        expected: 8,
        actual: 4,
    };
    let message = format!("{}", error);
    assert!(message.contains("rip"));
    assert!(message.contains('8'));
    assert!(message.contains('4'));

    let error = RegisterError::LayoutMismatch {
        expected: VectorLayout::Legacy,
        actual: VectorLayout::Extended,
    };
    let message = format!("{}", error);
    assert!(message.contains("Legacy"));
    assert!(message.contains("Extended"));
}

#[test]
fn test_monitor_error_display()
{
    let message = format!("{}", SelfdeError::MonitorNotStarted);
    assert!(message.contains("not been started"));
    let message = format!("{}", SelfdeError::MailboxClosed);
    assert!(message.contains("mailbox closed"));
    let message = format!("{}", SelfdeError::Unsupported("no Mach"));
    assert!(message.contains("no Mach"));
}

#[test]
fn test_result_type()
{
    // Test that Result type is properly aliased
    let _result: SelfdeResult<()> = Ok(());
    let _error_result: SelfdeResult<()> = Err(SelfdeError::MonitorAlreadyStarted);
}
