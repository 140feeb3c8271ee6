//! Stable radix sort over unsigned integer keys
//!
//! The uniform grid orders its shape slots by flattened cell key before
//! bucketing so that shapes sharing a cell end up adjacent in memory. A
//! comparison sort would do, but the keys are small unsigned integers, so a
//! byte-wise counting sort keeps the rebuild linear in the shape count.

/// One entry to be ordered: `(key, payload)`.
pub type KeyedIndex = (u32, u32);

/// Sorts `(key, payload)` pairs ascending by key, stable in payload order.
///
/// Least-significant-digit radix sort with 8-bit digits; passes over digits
/// that are constant across all keys are skipped.
pub fn radix_sort_pairs(items: &mut Vec<KeyedIndex>) {
    if items.len() < 2 {
        return;
    }

    let mut scratch: Vec<KeyedIndex> = vec![(0, 0); items.len()];

    for pass in 0..4 {
        let shift = pass * 8;

        let mut counts = [0usize; 256];
        for &(key, _) in items.iter() {
            counts[((key >> shift) & 0xFF) as usize] += 1;
        }

        // All keys share this digit, nothing to reorder.
        if counts.iter().any(|&c| c == items.len()) {
            continue;
        }

        let mut offsets = [0usize; 256];
        let mut running = 0usize;
        for digit in 0..256 {
            offsets[digit] = running;
            running += counts[digit];
        }

        for &entry in items.iter() {
            let digit = ((entry.0 >> shift) & 0xFF) as usize;
            scratch[offsets[digit]] = entry;
            offsets[digit] += 1;
        }

        std::mem::swap(items, &mut scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorts_by_key() {
        let mut items = vec![(5, 0), (1, 1), (300, 2), (2, 3), (70000, 4), (0, 5)];
        radix_sort_pairs(&mut items);
        let keys: Vec<u32> = items.iter().map(|&(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 2, 5, 300, 70000]);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let mut items = vec![(7, 0), (3, 1), (7, 2), (3, 3), (7, 4)];
        radix_sort_pairs(&mut items);
        assert_eq!(items, vec![(3, 1), (3, 3), (7, 0), (7, 2), (7, 4)]);
    }

    #[test]
    fn test_empty_and_single() {
        let mut empty: Vec<KeyedIndex> = Vec::new();
        radix_sort_pairs(&mut empty);
        assert!(empty.is_empty());

        let mut single = vec![(42, 9)];
        radix_sort_pairs(&mut single);
        assert_eq!(single, vec![(42, 9)]);
    }

    #[test]
    fn test_matches_comparison_sort() {
        let mut items: Vec<KeyedIndex> = (0..512)
            .map(|i| ((i * 2_654_435_761u32) % 10_007, i))
            .collect();
        let mut expected = items.clone();
        expected.sort_by_key(|&(k, _)| k);
        radix_sort_pairs(&mut items);
        assert_eq!(items, expected);
    }
}
