//! Heterogeneous parallel primitives.
//!
//! A small library of multi-core / accelerator building blocks consumed by
//! larger numeric and array systems:
//!
//! - [`fill::fill`]: generic-width parallel memory fill
//! - [`hash::hash_u64`]: deterministic integer mixing hash
//! - [`atomic::fetch_add`]: linearizable atomic accumulation
//! - [`cpu_quicksort::par_quicksort`]: task-parallel randomized quicksort
//! - [`gpu_sort::GpuSorter`]: device-wide GPU sort (Metal, macOS)
//!
//! All primitives operate on caller-owned storage and hold no process-wide
//! mutable state. The sort backends share one interface, [`SortBackend`],
//! selected at the call site by [`Device`]: the CPU variant partitions
//! host-resident data across a fork/join task tree, the GPU variant
//! delegates to a device-wide sorting network.
//!
//! ```
//! use upar::{sort_keys, Device};
//!
//! let mut keys = vec![5u32, 3, 8, 3, 1, 9, 3];
//! sort_keys(Device::Cpu, &mut keys).unwrap();
//! assert_eq!(keys, vec![1, 3, 3, 3, 5, 8, 9]);
//! ```

pub mod atomic;
pub mod cpu_quicksort;
pub mod error;
pub mod fill;
pub mod gpu_sort;
pub mod hash;

pub use error::Error;
pub use gpu_sort::{GpuCounter, GpuSorter};

/// All supported compute device types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Device {
    /// The host CPU, with a rayon work-stealing pool.
    Cpu,
    /// The system GPU, driven through Metal.
    Gpu,
}

/// Backend-polymorphic unstable key sort.
///
/// Both variants sort in place, ascending, with no stability guarantee,
/// and return only once the sort has fully completed.
pub trait SortBackend {
    /// Sort `keys` in place in ascending order.
    fn sort(&self, keys: &mut [u32]) -> Result<(), Error>;
}

/// CPU sort backend: the task-parallel randomized quicksort.
pub struct CpuSorter;

impl SortBackend for CpuSorter {
    fn sort(&self, keys: &mut [u32]) -> Result<(), Error> {
        cpu_quicksort::par_quicksort(keys);
        Ok(())
    }
}

impl SortBackend for GpuSorter {
    fn sort(&self, keys: &mut [u32]) -> Result<(), Error> {
        GpuSorter::sort(self, keys)
    }
}

/// Construct the sort backend for `device`.
///
/// The GPU backend fails here, not at sort time, when the platform has no
/// usable Metal device.
pub fn backend_for(device: Device) -> Result<Box<dyn SortBackend>, Error> {
    log::debug!("selecting sort backend for {:?}", device);
    match device {
        Device::Cpu => Ok(Box::new(CpuSorter)),
        Device::Gpu => Ok(Box::new(GpuSorter::new()?)),
    }
}

/// Sort `keys` in place on `device`.
///
/// Convenience wrapper around [`backend_for`] for one-shot sorts.
pub fn sort_keys(device: Device, keys: &mut [u32]) -> Result<(), Error> {
    backend_for(device)?.sort(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_keys_cpu() {
        let mut keys = vec![5u32, 3, 8, 3, 1, 9, 3];
        sort_keys(Device::Cpu, &mut keys).unwrap();
        assert_eq!(keys, vec![1, 3, 3, 3, 5, 8, 9]);
    }

    #[test]
    fn test_cpu_backend_via_trait_object() {
        let backend = backend_for(Device::Cpu).unwrap();
        let mut keys: Vec<u32> = (0..10_000).rev().collect();
        backend.sort(&mut keys).unwrap();
        assert!(cpu_quicksort::is_sorted(&keys));
    }

    #[test]
    fn test_gpu_backend_unavailable_is_reported() {
        // On machines without a Metal device (or off macOS entirely) the
        // backend must fail at construction with a typed error, never
        // panic or silently fall back.
        match backend_for(Device::Gpu) {
            Ok(backend) => {
                let mut keys = vec![3u32, 1, 2];
                backend.sort(&mut keys).unwrap();
                assert_eq!(keys, vec![1, 2, 3]);
            }
            Err(Error::NoDevice) | Err(Error::UnsupportedPlatform) => {}
            Err(e) => panic!("unexpected GPU backend error: {e}"),
        }
    }
}
