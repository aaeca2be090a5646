//! Tests for vector layout detection

use selfde_core::feature::{self, parse_xnu_major, resolve, VectorLayout, MIN_AVX_KERNEL_MAJOR};

const MOJAVE: &str = "Darwin Kernel Version 18.7.0: Tue Aug 20 16:57:14 PDT 2019; root:xnu-4903.271.2~2/RELEASE_X86_64";
const LION: &str = "Darwin Kernel Version 11.4.2: Thu Aug 23 16:25:48 PDT 2012; root:xnu-1699.32.7~1/RELEASE_X86_64";

#[test]
fn test_parse_xnu_major()
{
    assert_eq!(parse_xnu_major(MOJAVE), Some(4903));
    assert_eq!(parse_xnu_major(LION), Some(1699));
    assert_eq!(parse_xnu_major(""), None);
    assert_eq!(parse_xnu_major("Darwin Kernel Version 18.7.0"), None);
}

#[test]
fn test_resolve_requires_avx()
{
    assert_eq!(resolve(false, Some(MOJAVE)), VectorLayout::Legacy);
    assert_eq!(resolve(true, Some(MOJAVE)), VectorLayout::Extended);
}

#[test]
fn test_resolve_requires_recent_kernel()
{
    assert_eq!(resolve(true, Some(LION)), VectorLayout::Legacy);
    assert_eq!(resolve(true, None), VectorLayout::Legacy);
    assert_eq!(resolve(true, Some("not a kernel version")), VectorLayout::Legacy);

    let floor = format!("root:xnu-{}.1.1~1/RELEASE_X86_64", MIN_AVX_KERNEL_MAJOR);
    assert_eq!(resolve(true, Some(&floor)), VectorLayout::Extended);
}

#[test]
fn test_layout_properties()
{
    assert_eq!(VectorLayout::Legacy.vector_width(), 16);
    assert_eq!(VectorLayout::Extended.vector_width(), 32);
    assert_ne!(VectorLayout::Legacy.name(), VectorLayout::Extended.name());
}

#[test]
fn test_host_layout_is_cached()
{
    let first = feature::vector_layout();
    let handles: Vec<_> = (0..4).map(|_| std::thread::spawn(feature::vector_layout)).collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), first);
    }

    let host = feature::host_features();
    assert_eq!(host.layout, first);
    assert_eq!(resolve(host.cpu_has_avx, host.kernel_version.as_deref()), first);
}

#[cfg(not(target_os = "macos"))]
#[test]
fn test_non_mach_host_is_legacy()
{
    assert_eq!(feature::vector_layout(), VectorLayout::Legacy);
    assert!(feature::host_features().kernel_version.is_none());
}
