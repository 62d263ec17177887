//! Parallel CPU Quicksort
//!
//! Task-parallel, randomized-pivot, in-place quicksort over a host-resident
//! slice. This is the CPU backend behind [`sort_keys`](crate::sort_keys).
//!
//! ## Pivot selection
//!
//! The pivot offset for a sub-range of length `len` is
//! `hash_u64(len) % len`. A length-derived hash needs no external random
//! source, keeps runs reproducible, and still defeats inputs crafted to
//! degrade a fixed-position pivot to quadratic behavior.
//!
//! ## Duplicate keys
//!
//! A plain Lomuto partition sends every pivot-equal element to one side, so
//! duplicate-heavy inputs degenerate toward quadratic comparison counts.
//! Here an element equal to the pivot goes left only when its scan offset
//! is odd, which splits duplicate runs roughly evenly between the two
//! recursive halves.
//!
//! ## Fork/join
//!
//! The two halves of each partition are disjoint sub-slices recursed
//! through `rayon::join`. The top-level call returns only after the whole
//! task tree has completed; no task outlives it. Without an ambient rayon
//! pool the joins execute inline and the final order is identical.

use std::cmp::Ordering;

use crate::hash::hash_u64;

/// Sub-ranges shorter than this are sorted sequentially; below it,
/// task-spawn and recursion overhead dominates any parallel speedup.
const SEQUENTIAL_CUTOFF: usize = 100;

/// Sort a slice in place in ascending order.
///
/// Not stable: equal elements may be reordered.
///
/// # Example
///
/// ```
/// let mut data = vec![5, 3, 8, 3, 1, 9, 3];
/// upar::cpu_quicksort::par_quicksort(&mut data);
/// assert_eq!(data, vec![1, 3, 3, 3, 5, 8, 9]);
/// ```
pub fn par_quicksort<T: Ord + Send>(data: &mut [T]) {
    par_quicksort_by(data, |a, b| a < b);
}

/// Sort a slice in place with a caller-supplied "less" predicate.
///
/// `less` must be a strict weak ordering (irreflexive, asymmetric,
/// transitive). A predicate that violates this may leave the slice in an
/// arbitrary order or panic, but cannot cause memory unsafety.
///
/// Not stable: elements that compare equal may be reordered.
pub fn par_quicksort_by<T, F>(data: &mut [T], less: F)
where
    T: Send,
    F: Fn(&T, &T) -> bool + Sync,
{
    quicksort(data, &less);
}

fn quicksort<T, F>(data: &mut [T], less: &F)
where
    T: Send,
    F: Fn(&T, &T) -> bool + Sync,
{
    let len = data.len();
    if len < SEQUENTIAL_CUTOFF {
        data.sort_unstable_by(|a, b| {
            if less(a, b) {
                Ordering::Less
            } else if less(b, a) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });
        return;
    }

    let pivot = (hash_u64(len as u64) % len as u64) as usize;
    data.swap(pivot, len - 1);

    let boundary = partition(data, less);

    let (left, rest) = data.split_at_mut(boundary);
    // rest[0] is the pivot, already in its final position.
    let right = &mut rest[1..];
    rayon::join(|| quicksort(left, less), || quicksort(right, less));
}

/// Partition `data` around the pivot at its last position.
///
/// Single left-to-right scan. Element `j` moves to the left side when it is
/// less than the pivot, or equal to it on an odd scan offset. Returns the
/// pivot's final index; `[0, boundary)` holds the left side and
/// `[boundary + 1, len)` the right.
fn partition<T, F>(data: &mut [T], less: &F) -> usize
where
    F: Fn(&T, &T) -> bool,
{
    let last = data.len() - 1;
    let mut i = 0;

    for j in 0..last {
        // When equal to the pivot, alternate sides by scan parity.
        let goes_left =
            less(&data[j], &data[last]) || (!less(&data[last], &data[j]) && (j & 1) == 1);
        if goes_left {
            data.swap(i, j);
            i += 1;
        }
    }

    data.swap(i, last);
    i
}

/// Check if a slice is sorted in ascending order.
pub fn is_sorted<T: Ord>(data: &[T]) -> bool {
    data.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sorted_copy(data: &[u32]) -> Vec<u32> {
        let mut expected = data.to_vec();
        expected.sort_unstable();
        expected
    }

    #[test]
    fn test_par_quicksort_empty() {
        let mut data: Vec<u32> = vec![];
        par_quicksort(&mut data);
        assert!(data.is_empty());
    }

    #[test]
    fn test_par_quicksort_single() {
        let mut data = vec![42u32];
        par_quicksort(&mut data);
        assert_eq!(data, vec![42]);
    }

    #[test]
    fn test_par_quicksort_small() {
        let mut data = vec![5, 3, 8, 3, 1, 9, 3];
        par_quicksort(&mut data);
        assert_eq!(data, vec![1, 3, 3, 3, 5, 8, 9]);
    }

    #[test]
    fn test_par_quicksort_already_sorted() {
        let mut data: Vec<u32> = (0..1000).collect();
        let expected = data.clone();
        par_quicksort(&mut data);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_par_quicksort_reverse_sorted() {
        let mut data: Vec<u32> = (0..10_000).rev().collect();
        let expected = sorted_copy(&data);
        par_quicksort(&mut data);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_par_quicksort_random() {
        let mut rng = rand::thread_rng();
        let mut data: Vec<u32> = (0..100_000).map(|_| rng.gen()).collect();
        let expected = sorted_copy(&data);
        par_quicksort(&mut data);
        assert!(is_sorted(&data));
        assert_eq!(data, expected);
    }

    #[test]
    fn test_par_quicksort_all_equal() {
        let mut data = vec![7u32; 50_000];
        let expected = data.clone();
        par_quicksort(&mut data);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_par_quicksort_by_descending() {
        let mut rng = rand::thread_rng();
        let mut data: Vec<u32> = (0..10_000).map(|_| rng.gen()).collect();
        let mut expected = data.clone();
        expected.sort_unstable_by(|a, b| b.cmp(a));
        par_quicksort_by(&mut data, |a, b| a > b);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_par_quicksort_nontrivial_type() {
        let mut rng = rand::thread_rng();
        let mut data: Vec<(u32, u64)> = (0..20_000).map(|i| (rng.gen(), i)).collect();
        let mut expected = data.clone();
        expected.sort_unstable();
        par_quicksort(&mut data);
        assert_eq!(data, expected);
    }

    #[test]
    fn test_par_quicksort_duplicate_heavy_not_quadratic() {
        // 10,000 elements, 90% sharing one key. The parity tie-break keeps
        // the recursion balanced; comparison counts must stay at
        // O(n log n) scale. A one-sided partition of the duplicate run
        // would cost tens of millions of comparisons here.
        let mut rng = rand::thread_rng();
        let mut data: Vec<u32> = Vec::with_capacity(10_000);
        data.extend(std::iter::repeat(500).take(9_000));
        data.extend((0..1_000).map(|_| rng.gen_range(0..1_000)));

        let expected = sorted_copy(&data);
        let comparisons = AtomicUsize::new(0);
        par_quicksort_by(&mut data, |a, b| {
            crate::atomic::fetch_add(&comparisons, 1);
            a < b
        });

        assert_eq!(data, expected);
        assert!(
            comparisons.load(Ordering::Relaxed) < 3_000_000,
            "comparison count {} suggests quadratic partitioning",
            comparisons.load(Ordering::Relaxed)
        );
    }

    #[test]
    fn test_is_sorted() {
        assert!(is_sorted(&[1, 2, 3, 4, 5]));
        assert!(is_sorted(&[1, 1, 1, 1]));
        assert!(is_sorted::<u32>(&[]));
        assert!(!is_sorted(&[5, 4, 3, 2, 1]));
        assert!(!is_sorted(&[1, 3, 2]));
    }
}
