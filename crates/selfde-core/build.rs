//! Build script for selfde-core
//!
//! This script checks system requirements before compilation:
//! - Minimum Rust version (C string literals need 1.77.0)
//! - macOS version when building on a Mac
//! - Whether the Mach backend will be compiled for this target
//!
//! ## Requirements
//!
//! - **Rust**: 1.77.0 or newer
//! - **macOS**: 10.9+ (Mavericks) on x86-64 for exception monitoring
//! - **Other targets**: catalog and marshaler only

use std::env;

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 77, 0);

        if rustc_version < min_rust_version {
            panic!(
                "selfde-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    // Target, not host: cross builds are judged by what they produce.
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();
    if target_os != "macos" || target_arch != "x86_64" {
        println!(
            "cargo:warning=selfde-core: target {target_arch}-{target_os} has no Mach backend; \
             building the register catalog and marshaler only"
        );
    }

    #[cfg(target_os = "macos")]
    check_macos_requirements();
}

#[cfg(target_os = "macos")]
fn check_macos_requirements()
{
    // thread_set_exception_ports with EXCEPTION_DEFAULT and x86_AVX_STATE64
    // are both available from 10.9 on
    let min_macos_version = (10, 9, 0);

    if let Some(version) = get_macos_version() {
        if version < min_macos_version {
            panic!(
                "selfde-core requires macOS {}.{}.{} or newer, found {}.{}.{}",
                min_macos_version.0, min_macos_version.1, min_macos_version.2, version.0, version.1, version.2
            );
        }
    } else {
        // If we can't detect macOS version, warn but don't fail
        // (might be cross-compiling)
        println!("cargo:warning=could not detect macOS version");
    }
}

#[cfg(target_os = "macos")]
fn get_macos_version() -> Option<(u32, u32, u32)>
{
    use std::process::Command;

    let output = Command::new("sw_vers").arg("-productVersion").output().ok()?;

    let version_str = String::from_utf8(output.stdout).ok()?;
    let version_str = version_str.trim();

    // e.g. "10.15.7" or "13.6"
    let mut parts = version_str.split('.');
    let major = parts.next()?.parse::<u32>().ok()?;
    let minor = parts.next()?.parse::<u32>().ok()?;
    let patch = parts.next().and_then(|s| s.parse::<u32>().ok()).unwrap_or(0);

    Some((major, minor, patch))
}
