//! # selfde-core
//!
//! Self-debugging primitives for x86-64 macOS: a thread of this process
//! traps exceptions raised on another of its threads, stops it, and reads or
//! rewrites its registers through a size-exact canonical byte form.
//!
//! This crate provides:
//! - A register catalog with eh_frame, DWARF, generic-role and wire numbering ([`registers::catalog`])
//! - Per-register and whole-context marshaling ([`registers::marshal`])
//! - Detection of the legacy or AVX vector layout ([`feature`])
//! - An exception listener thread with a single-slot mailbox ([`monitor`])
//! - The controller handle set tying them together ([`controller`])
//!
//! ## Platform Support
//!
//! - **macOS x86-64**: Mach exception ports and thread state ([`platform::macos`])
//! - Everywhere else: the catalog, marshaler and monitor protocol only
//!
//! ## Why unsafe code is needed
//!
//! The Mach backend calls kernel APIs through FFI. Those calls are wrapped
//! in safe functions; everything outside `platform` is safe Rust.

#![allow(unsafe_code)] // Required for the Mach FFI backend

pub mod controller;
pub mod error;
pub mod exception;
pub mod feature;
pub mod monitor;
pub mod platform;
pub mod prelude;
pub mod registers;
pub mod types;

pub use controller::ControllerState;
// Re-export commonly used types
pub use error::{MachError, RegisterError, SelfdeError, SelfdeResult};
pub use exception::{ExceptionClass, ExceptionMask, ExceptionRecord};
pub use feature::VectorLayout;
#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
pub use platform::macos::{MachKernel, MachThread};
pub use registers::{RegisterCatalog, RegisterContext, RegisterId, RegisterMarshaler};
pub use types::{PortName, TaskId, ThreadId};
