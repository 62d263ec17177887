//! GPU Sorting and Device Atomics using Metal
//!
//! The accelerator backend. Unlike the CPU path, this module does no
//! partitioning of its own: it delegates to a device-wide bitonic sorting
//! network that already saturates massively-parallel hardware, and the host
//! side is reduced to dispatch glue. A task tree tuned for core-count-scale
//! parallelism has nothing to add on a GPU.
//!
//! ## Glue responsibilities
//!
//! 1. **Padding**: keys are staged into a power-of-two device buffer padded
//!    with `u32::MAX` sentinels, so any input length sorts and the sentinels
//!    sink to the tail.
//! 2. **Pass sequencing**: every compare-exchange pass of the network is
//!    encoded into one serially-ordered compute encoder and submitted as a
//!    single command buffer.
//! 3. **Synchronous contract**: the call blocks until the device has fully
//!    completed, then copies the leading `n` keys back into the caller's
//!    slice.
//!
//! The module also hosts [`GpuCounter`], the device-memory side of the
//! atomic accumulation primitive: a fetch-and-add executed with the GPU's
//! native atomic-add instruction on a device-resident word.
//!
//! This module only compiles the Metal implementation on macOS. On other
//! platforms, a stub is provided that returns
//! [`Error::UnsupportedPlatform`](crate::error::Error::UnsupportedPlatform).

#[cfg(target_os = "macos")]
mod metal_impl {
    use metal::*;
    use std::mem;

    use crate::error::Error;

    /// Shader source for the device-wide primitives.
    ///
    /// `bitonic_step` is one compare-exchange pass of the bitonic network;
    /// the host drives the stage/substage schedule. `counter_fetch_add`
    /// performs the device-native atomic add and records each thread's
    /// pre-add value.
    const SHADER_SOURCE: &str = r#"
#include <metal_stdlib>
using namespace metal;

/// One compare-exchange pass of a bitonic sorting network over the whole
/// device buffer. Each thread owns one disjoint index pair.
kernel void bitonic_step(
    device uint *data [[buffer(0)]],
    constant uint &block_size [[buffer(1)]],
    constant uint &sub_block_size [[buffer(2)]],
    uint gid [[thread_position_in_grid]])
{
    uint half_sub = sub_block_size / 2;
    uint sub_block_index = gid / half_sub;
    uint index_in_sub_block = gid % half_sub;

    uint left_index = sub_block_index * sub_block_size + index_in_sub_block;
    uint right_index = left_index + half_sub;

    uint block_index = left_index / block_size;
    bool ascending = (block_index % 2) == 0;

    uint left_val = data[left_index];
    uint right_val = data[right_index];

    if ((left_val > right_val) == ascending) {
        data[left_index] = right_val;
        data[right_index] = left_val;
    }
}

/// Each thread atomically adds `delta` to the shared counter and records
/// the value it observed immediately before its own add.
kernel void counter_fetch_add(
    device atomic_uint *counter [[buffer(0)]],
    device uint *previous [[buffer(1)]],
    constant uint &delta [[buffer(2)]],
    uint gid [[thread_position_in_grid]])
{
    previous[gid] = atomic_fetch_add_explicit(counter, delta, memory_order_relaxed);
}
"#;

    fn compile_library(device: &Device) -> Result<Library, Error> {
        let options = CompileOptions::new();
        device
            .new_library_with_source(SHADER_SOURCE, &options)
            .map_err(|e| Error::ShaderCompile(e.to_string()))
    }

    fn build_pipeline(
        device: &Device,
        library: &Library,
        name: &'static str,
    ) -> Result<ComputePipelineState, Error> {
        let function = library
            .get_function(name, None)
            .map_err(|e| Error::KernelFunction(name, e.to_string()))?;
        device
            .new_compute_pipeline_state_with_function(&function)
            .map_err(|e| Error::Pipeline(name, e.to_string()))
    }

    /// GPU sorter backed by a device-wide bitonic network.
    ///
    /// The host adapter stages the keys, sequences the network passes, and
    /// copies the result back; all element movement happens on the device.
    pub struct GpuSorter {
        device: Device,
        command_queue: CommandQueue,
        step_pipeline: ComputePipelineState,
    }

    impl GpuSorter {
        /// Create a new GPU sorter.
        ///
        /// Returns an error if no Metal device is available or the shader
        /// fails to build.
        pub fn new() -> Result<Self, Error> {
            let device = Device::system_default().ok_or(Error::NoDevice)?;
            log::info!("using GPU device: {}", device.name());

            let command_queue = device.new_command_queue();
            let library = compile_library(&device)?;
            let step_pipeline = build_pipeline(&device, &library, "bitonic_step")?;

            Ok(Self {
                device,
                command_queue,
                step_pipeline,
            })
        }

        /// Sort the given keys in place, ascending, on the GPU.
        ///
        /// Accepts any length; the device buffer is padded to the next
        /// power of two with `u32::MAX` sentinels. The call returns only
        /// once the device-side sort has fully completed. Not stable.
        pub fn sort(&self, keys: &mut [u32]) -> Result<(), Error> {
            let n = keys.len();
            if n <= 1 {
                return Ok(());
            }

            let padded = n.next_power_of_two();
            let mut staged = keys.to_vec();
            staged.resize(padded, u32::MAX);

            let buffer_size = (padded * mem::size_of::<u32>()) as u64;
            let buffer = self.device.new_buffer_with_data(
                staged.as_ptr() as *const _,
                buffer_size,
                MTLResourceOptions::StorageModeShared,
            );

            let num_threads = (padded / 2) as u64;
            let threadgroup_size = self
                .step_pipeline
                .max_total_threads_per_threadgroup()
                .min(num_threads);
            let grid = MTLSize::new(num_threads, 1, 1);
            let threadgroup = MTLSize::new(threadgroup_size, 1, 1);

            let command_buffer = self.command_queue.new_command_buffer();
            let encoder = command_buffer.new_compute_command_encoder();
            encoder.set_compute_pipeline_state(&self.step_pipeline);
            encoder.set_buffer(0, Some(&buffer), 0);

            // Dispatches on a serial compute encoder execute in encoding
            // order, so the whole pass schedule fits in one submission.
            let mut block_size = 2u32;
            loop {
                let mut sub_block_size = block_size;
                while sub_block_size >= 2 {
                    encoder.set_bytes(
                        1,
                        mem::size_of::<u32>() as u64,
                        &block_size as *const u32 as *const _,
                    );
                    encoder.set_bytes(
                        2,
                        mem::size_of::<u32>() as u64,
                        &sub_block_size as *const u32 as *const _,
                    );
                    encoder.dispatch_threads(grid, threadgroup);
                    sub_block_size /= 2;
                }
                if (block_size as usize) == padded {
                    break;
                }
                block_size *= 2;
            }

            encoder.end_encoding();
            command_buffer.commit();
            command_buffer.wait_until_completed();

            let result_ptr = buffer.contents() as *const u32;
            unsafe {
                std::ptr::copy_nonoverlapping(result_ptr, keys.as_mut_ptr(), n);
            }

            Ok(())
        }

        /// Get information about the GPU device.
        pub fn device_info(&self) -> String {
            format!(
                "Device: {}, Max threads per threadgroup: {}",
                self.device.name(),
                self.step_pipeline.max_total_threads_per_threadgroup(),
            )
        }
    }

    /// Device-memory atomic counter.
    ///
    /// Owns a single `u32` word in device memory and exposes fetch-and-add
    /// over it, executed with the GPU's native atomic-add instruction.
    pub struct GpuCounter {
        device: Device,
        command_queue: CommandQueue,
        fetch_add_pipeline: ComputePipelineState,
        counter: Buffer,
    }

    impl GpuCounter {
        /// Create a counter initialized to `initial`.
        pub fn new(initial: u32) -> Result<Self, Error> {
            let device = Device::system_default().ok_or(Error::NoDevice)?;
            let command_queue = device.new_command_queue();
            let library = compile_library(&device)?;
            let fetch_add_pipeline = build_pipeline(&device, &library, "counter_fetch_add")?;

            let counter = device.new_buffer_with_data(
                &initial as *const u32 as *const _,
                mem::size_of::<u32>() as u64,
                MTLResourceOptions::StorageModeShared,
            );

            Ok(Self {
                device,
                command_queue,
                fetch_add_pipeline,
                counter,
            })
        }

        /// Launch `threads` device threads that each atomically add `delta`
        /// to the counter, and return each thread's pre-add value.
        ///
        /// Linearizable: the returned values are exactly the partial prefix
        /// sums starting at the counter's prior value, with no duplicate or
        /// skipped value, regardless of device scheduling.
        pub fn fetch_add_per_thread(
            &mut self,
            threads: usize,
            delta: u32,
        ) -> Result<Vec<u32>, Error> {
            if threads == 0 {
                return Ok(Vec::new());
            }

            let previous = self.device.new_buffer(
                (threads * mem::size_of::<u32>()) as u64,
                MTLResourceOptions::StorageModeShared,
            );

            let command_buffer = self.command_queue.new_command_buffer();
            let encoder = command_buffer.new_compute_command_encoder();
            encoder.set_compute_pipeline_state(&self.fetch_add_pipeline);
            encoder.set_buffer(0, Some(&self.counter), 0);
            encoder.set_buffer(1, Some(&previous), 0);
            encoder.set_bytes(
                2,
                mem::size_of::<u32>() as u64,
                &delta as *const u32 as *const _,
            );

            let num_threads = threads as u64;
            let threadgroup_size = self
                .fetch_add_pipeline
                .max_total_threads_per_threadgroup()
                .min(num_threads);
            encoder.dispatch_threads(
                MTLSize::new(num_threads, 1, 1),
                MTLSize::new(threadgroup_size, 1, 1),
            );
            encoder.end_encoding();
            command_buffer.commit();
            command_buffer.wait_until_completed();

            let result_ptr = previous.contents() as *const u32;
            let mut out = vec![0u32; threads];
            unsafe {
                std::ptr::copy_nonoverlapping(result_ptr, out.as_mut_ptr(), threads);
            }
            Ok(out)
        }

        /// Read the counter's current value.
        pub fn value(&self) -> u32 {
            unsafe { *(self.counter.contents() as *const u32) }
        }
    }
}

// Re-export the macOS implementation
#[cfg(target_os = "macos")]
pub use metal_impl::{GpuCounter, GpuSorter};

// Stub implementation for non-macOS platforms
#[cfg(not(target_os = "macos"))]
pub struct GpuSorter;

#[cfg(not(target_os = "macos"))]
impl GpuSorter {
    /// Create a new GPU sorter.
    ///
    /// On non-macOS platforms, this always returns an error.
    pub fn new() -> Result<Self, crate::error::Error> {
        Err(crate::error::Error::UnsupportedPlatform)
    }

    /// Sort the given keys in place on the GPU.
    ///
    /// On non-macOS platforms, this always returns an error.
    pub fn sort(&self, _keys: &mut [u32]) -> Result<(), crate::error::Error> {
        Err(crate::error::Error::UnsupportedPlatform)
    }

    /// Get information about the GPU device.
    pub fn device_info(&self) -> String {
        "N/A (Metal not available on this platform)".to_string()
    }
}

// Stub device counter for non-macOS platforms
#[cfg(not(target_os = "macos"))]
pub struct GpuCounter;

#[cfg(not(target_os = "macos"))]
impl GpuCounter {
    /// Create a counter initialized to `initial`.
    ///
    /// On non-macOS platforms, this always returns an error.
    pub fn new(_initial: u32) -> Result<Self, crate::error::Error> {
        Err(crate::error::Error::UnsupportedPlatform)
    }

    /// Launch device threads that each atomically add `delta`.
    ///
    /// On non-macOS platforms, this always returns an error.
    pub fn fetch_add_per_thread(
        &mut self,
        _threads: usize,
        _delta: u32,
    ) -> Result<Vec<u32>, crate::error::Error> {
        Err(crate::error::Error::UnsupportedPlatform)
    }

    /// Read the counter's current value.
    pub fn value(&self) -> u32 {
        0
    }
}
