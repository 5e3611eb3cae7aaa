//! Utilities.

use alloc::vec::Vec;

/// Move elements from `x = source[i]` to `destination[permutation(x)]`.
pub(crate) fn scatter<T>(
    source: impl IntoIterator<Item = T>,
    mut permutation: impl FnMut(&T) -> usize,
    destination: &mut [Option<T>],
) {
    for element in source {
        let index = permutation(&element);
        destination[index] = Some(element);
    }
}

/// Split elements into groups by bucket index.
///
/// `buckets[i]` is the bucket of `elements[i]`, and `sizes[b]` the number of elements in bucket
/// `b`. Each group keeps the input order.
pub(crate) fn group_by_bucket<T>(elements: Vec<T>, buckets: &[usize], sizes: &[usize]) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = sizes.iter().map(|&size| Vec::with_capacity(size)).collect();
    for (element, &bucket) in elements.into_iter().zip(buckets) {
        groups[bucket].push(element);
    }
    groups
}

/// Find two positions holding the same residue.
///
/// Returns the pair with the smallest residue, earlier position first.
pub(crate) fn find_equal_pair(residues: &[u64]) -> Option<(usize, usize)> {
    let mut order: Vec<(u64, usize)> = residues.iter().copied().zip(0..).collect();
    // Radix sort is stable, so equal residues stay in input order
    radsort::sort_by_key(&mut order, |&(residue, _)| residue);
    order
        .windows(2)
        .find(|window| window[0].0 == window[1].0)
        .map(|window| (window[0].1, window[1].1))
}
