//! Atomic Accumulation Primitive
//!
//! Lock-free fetch-and-add over a caller-owned counter. Callers of the
//! parallel primitives use this for their own coordination (counting-style
//! algorithms, progress tracking); the sort itself takes no locks and does
//! not use it internally.
//!
//! The device-memory counterpart lives in the GPU module as
//! [`GpuCounter`](crate::gpu_sort::GpuCounter), which runs the accelerator's
//! native atomic-add instruction on a device-resident word.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Atomically add `delta` to `counter` and return the value immediately
/// before the add.
///
/// Linearizable: across N concurrent calls with deltas `d_1..d_N`, the
/// returned values are exactly the partial prefix sums of the deltas in
/// some interleaving order, with no duplicate or skipped value, and the
/// counter ends at the initial value plus the sum of all deltas.
///
/// The counter's storage and lifetime belong entirely to the caller.
#[inline]
pub fn fetch_add(counter: &AtomicUsize, delta: usize) -> usize {
    counter.fetch_add(delta, Ordering::Relaxed)
}
