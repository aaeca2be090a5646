//! # Platform-Specific Implementations
//!
//! Kernel backends for the exception monitor.
//!
//! - **macOS x86-64**: Mach exception ports and thread state
//!   - See: [Apple Mach Kernel Programming](https://developer.apple.com/library/archive/documentation/Darwin/Conceptual/KernelProgramming/Mach/Mach.html)
//!
//! The register catalog, marshaler and monitor protocol are platform
//! independent and build everywhere; only this module is gated.

#[cfg(all(target_os = "macos", target_arch = "x86_64"))]
pub mod macos;
