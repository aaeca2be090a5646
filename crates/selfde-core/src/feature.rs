//! # Vector Layout Detection
//!
//! Decides, once per process, whether the AVX register state (`ymm0`–`ymm15`)
//! can be used, and therefore which register catalog and which native
//! floating-point structure (`x86_float_state64_t` vs `x86_avx_state64_t`)
//! are in effect.
//!
//! Two inputs are required:
//!
//! - the CPU must report AVX, with the OS having enabled the extended state
//! - the kernel must be `xnu-2020` or newer; older kernels do not marshal
//!   `x86_AVX_STATE64` correctly even on AVX hardware
//!
//! Anything uncertain resolves to [`VectorLayout::Legacy`]. Detection never
//! fails.
//!
//! ## References
//!
//! - [thread_get_state(3)](https://developer.apple.com/documentation/kernel/1418576-thread_get_state/)
//! - [sysctlbyname(3)](https://developer.apple.com/documentation/kernel/1387446-sysctlbyname)

use once_cell::sync::Lazy;
use tracing::debug;

/// First xnu build whose `x86_AVX_STATE64` handling is trusted.
pub const MIN_AVX_KERNEL_MAJOR: u32 = 2020;

/// Which floating-point/vector representation a register context uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorLayout
{
    /// `x86_float_state64_t`: 16 × 128-bit `xmm` registers
    Legacy,
    /// `x86_avx_state64_t`: 16 × 256-bit `ymm` registers, `xmm` as their low halves
    Extended,
}

impl VectorLayout
{
    /// Width in bytes of one vector register in the canonical buffer.
    pub fn vector_width(self) -> usize
    {
        match self {
            VectorLayout::Legacy => 16,
            VectorLayout::Extended => 32,
        }
    }

    /// Short lowercase name used in logs and on the command line.
    pub fn name(self) -> &'static str
    {
        match self {
            VectorLayout::Legacy => "legacy",
            VectorLayout::Extended => "extended",
        }
    }
}

/// The inputs a detection was based on, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostFeatures
{
    /// CPU reports AVX and the OS has enabled it
    pub cpu_has_avx: bool,
    /// Raw `kern.version` string, when it could be read
    pub kernel_version: Option<String>,
    /// Layout chosen from the two inputs above
    pub layout: VectorLayout,
}

static HOST: Lazy<HostFeatures> = Lazy::new(|| {
    let cpu_has_avx = cpu_has_avx();
    let kernel_version = kernel_version();
    let layout = resolve(cpu_has_avx, kernel_version.as_deref());
    debug!(cpu_has_avx, ?kernel_version, layout = layout.name(), "Resolved vector register layout");
    HostFeatures {
        cpu_has_avx,
        kernel_version,
        layout,
    }
});

/// The process-wide vector layout.
///
/// Computed on first call and cached for the lifetime of the process.
pub fn vector_layout() -> VectorLayout
{
    HOST.layout
}

/// The cached detection result together with its inputs.
pub fn host_features() -> &'static HostFeatures
{
    &HOST
}

/// Pure layout decision.
///
/// Returns [`VectorLayout::Extended`] only when the CPU supports AVX and
/// `kernel_version` names an xnu build at or above [`MIN_AVX_KERNEL_MAJOR`].
///
/// ```rust
/// use selfde_core::feature::{resolve, VectorLayout};
///
/// assert_eq!(resolve(false, Some("root:xnu-7195.141.2~1/RELEASE_X86_64")), VectorLayout::Legacy);
/// assert_eq!(resolve(true, Some("root:xnu-1699.32.7~1/RELEASE_X86_64")), VectorLayout::Legacy);
/// assert_eq!(resolve(true, None), VectorLayout::Legacy);
/// assert_eq!(resolve(true, Some("root:xnu-7195.141.2~1/RELEASE_X86_64")), VectorLayout::Extended);
/// ```
pub fn resolve(cpu_has_avx: bool, kernel_version: Option<&str>) -> VectorLayout
{
    if !cpu_has_avx {
        return VectorLayout::Legacy;
    }
    match kernel_version.and_then(parse_xnu_major) {
        Some(major) if major >= MIN_AVX_KERNEL_MAJOR => VectorLayout::Extended,
        _ => VectorLayout::Legacy,
    }
}

/// Extract the xnu build major from a `kern.version` string.
///
/// `"Darwin Kernel Version 18.7.0: ... root:xnu-4903.271.2~2/RELEASE_X86_64"`
/// yields `Some(4903)`.
pub fn parse_xnu_major(version: &str) -> Option<u32>
{
    let start = version.find("xnu-")? + "xnu-".len();
    let digits: &str = &version[start..];
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse().ok()
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
fn cpu_has_avx() -> bool
{
    // Also checks OSXSAVE/XCR0, so a kernel that never enabled AVX reads as false.
    std::arch::is_x86_feature_detected!("avx")
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
fn cpu_has_avx() -> bool
{
    false
}

#[cfg(target_os = "macos")]
fn kernel_version() -> Option<String>
{
    let name = c"kern.version";
    let mut buffer = [0u8; 512];
    let mut length: libc::size_t = buffer.len();
    let result = unsafe {
        libc::sysctlbyname(
            name.as_ptr(),
            buffer.as_mut_ptr().cast(),
            &mut length,
            std::ptr::null_mut(),
            0,
        )
    };
    if result != 0 {
        debug!("sysctlbyname(kern.version) failed: {}", std::io::Error::last_os_error());
        return None;
    }
    let bytes = &buffer[..length.min(buffer.len())];
    let bytes = bytes.split(|b| *b == 0).next().unwrap_or(bytes);
    String::from_utf8(bytes.to_vec()).ok()
}

#[cfg(not(target_os = "macos"))]
fn kernel_version() -> Option<String>
{
    None
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_build_major()
    {
        let version = "Darwin Kernel Version 18.7.0: Tue Aug 20 16:57:14 PDT 2019; \
                       root:xnu-4903.271.2~2/RELEASE_X86_64";
        assert_eq!(parse_xnu_major(version), Some(4903));
        assert_eq!(parse_xnu_major("xnu-2020"), Some(2020));
        assert_eq!(parse_xnu_major("Linux 6.1.0"), None);
        assert_eq!(parse_xnu_major("root:xnu-/RELEASE"), None);
    }

    #[test]
    fn floor_is_inclusive()
    {
        assert_eq!(resolve(true, Some("xnu-2020.0.0")), VectorLayout::Extended);
        assert_eq!(resolve(true, Some("xnu-2019.99")), VectorLayout::Legacy);
    }

    #[test]
    fn cached_layout_is_stable()
    {
        assert_eq!(vector_layout(), vector_layout());
        assert_eq!(host_features().layout, vector_layout());
    }
}
