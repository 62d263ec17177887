//! Parallel Memory Fill
//!
//! Fills a caller-owned buffer with a single value, splitting the work
//! across the rayon pool for large buffers. Element writes target disjoint
//! indices, so there is no ordering guarantee among them and no
//! synchronization is needed.
//!
//! One generic function covers every element width; monomorphization takes
//! the place of per-width entry points.

use rayon::prelude::*;

/// Below this length a plain sequential fill wins; chunk scheduling
/// overhead dominates the memory writes.
const PARALLEL_CUTOFF: usize = 8192;

/// Chunk size handed to each worker.
const CHUNK: usize = 4096;

/// Set every element of `buffer` to `value`.
///
/// An empty buffer is a no-op. After return, every slot equals `value`.
pub fn fill<T: Copy + Send + Sync>(buffer: &mut [T], value: T) {
    if buffer.len() < PARALLEL_CUTOFF {
        buffer.fill(value);
        return;
    }

    buffer
        .par_chunks_mut(CHUNK)
        .for_each(|chunk| chunk.fill(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_empty() {
        let mut data: Vec<u32> = vec![];
        fill(&mut data, 7);
        assert!(data.is_empty());
    }

    #[test]
    fn test_fill_single() {
        let mut data = vec![0u32];
        fill(&mut data, 9);
        assert_eq!(data, vec![9]);
    }

    #[test]
    fn test_fill_all_ones_words() {
        let mut data = vec![0u32; 6];
        fill(&mut data, 0xFFFF_FFFF);
        assert_eq!(data, vec![0xFFFF_FFFF; 6]);
    }

    #[test]
    fn test_fill_large_parallel_path() {
        let mut data = vec![0u64; 100_000];
        fill(&mut data, 0xDEAD_BEEF);
        assert!(data.iter().all(|&x| x == 0xDEAD_BEEF));
    }

    #[test]
    fn test_fill_wide_element() {
        // 16-byte elements have no specialized fast path; the generic
        // chunked fill must cover them too.
        let mut data = vec![(0u64, 0u64); 10_000];
        fill(&mut data, (1, 2));
        assert!(data.iter().all(|&x| x == (1, 2)));
    }

    #[test]
    fn test_fill_overwrites_prior_contents() {
        let mut data: Vec<u32> = (0..20_000).collect();
        fill(&mut data, 5);
        assert!(data.iter().all(|&x| x == 5));
    }
}
