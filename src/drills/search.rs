use std::cmp::Ordering;

// =============================================================================
// Classic binary search
// =============================================================================

/// Index of `target` in the sorted slice `items`, if present.
pub fn binary_search<T: Ord>(items: &[T], target: &T) -> Option<usize> {
    let (mut low, mut high) = (0, items.len());
    while low < high {
        let mid = low + (high - low) / 2;
        match items[mid].cmp(target) {
            Ordering::Equal => return Some(mid),
            Ordering::Less => low = mid + 1,
            Ordering::Greater => high = mid,
        }
    }
    None
}

/// First index whose element is not less than `target` (`items.len()` if none).
pub fn lower_bound<T: Ord>(items: &[T], target: &T) -> usize {
    let (mut low, mut high) = (0, items.len());
    while low < high {
        let mid = low + (high - low) / 2;
        if items[mid] < *target {
            low = mid + 1;
        } else {
            high = mid;
        }
    }
    low
}

// =============================================================================
// Binary search on the answer
// =============================================================================

fn bouquets_by_day(bloom: &[u32], day: u32, k: usize) -> usize {
    let mut run = 0;
    let mut bouquets = 0;
    for &bloom_day in bloom {
        if bloom_day <= day {
            run += 1;
        } else {
            bouquets += run / k;
            run = 0;
        }
    }
    bouquets + run / k
}

/// Earliest day on which `m` bouquets of `k` adjacent bloomed flowers can be
/// picked, or `None` if there are not enough flowers.
pub fn min_days_for_bouquets(bloom: &[u32], m: usize, k: usize) -> Option<u32> {
    if m == 0 || k == 0 {
        return Some(0);
    }
    let needed = m.checked_mul(k)?;
    if needed > bloom.len() {
        return None;
    }

    let (mut low, mut high) = (*bloom.iter().min()?, *bloom.iter().max()?);
    while low < high {
        let mid = low + (high - low) / 2;
        if bouquets_by_day(bloom, mid, k) >= m {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    Some(low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_binary_search_finds_seven() {
        let items: Vec<i32> = (1..=10).collect();
        assert_eq!(binary_search(&items, &7), Some(6));
        assert_eq!(binary_search(&items, &1), Some(0));
        assert_eq!(binary_search(&items, &10), Some(9));
        assert_eq!(binary_search(&items, &11), None);
    }

    #[test]
    fn test_binary_search_empty() {
        let items: [i32; 0] = [];
        assert_eq!(binary_search(&items, &3), None);
        assert_eq!(lower_bound(&items, &3), 0);
    }

    #[test]
    fn test_lower_bound_with_duplicates() {
        let items = [1, 2, 2, 2, 5];
        assert_eq!(lower_bound(&items, &2), 1);
        assert_eq!(lower_bound(&items, &3), 4);
        assert_eq!(lower_bound(&items, &9), 5);
    }

    #[test]
    fn test_bouquets() {
        assert_eq!(min_days_for_bouquets(&[1, 10, 3, 10, 2], 3, 1), Some(3));
        assert_eq!(min_days_for_bouquets(&[1, 10, 3, 10, 2], 3, 2), None);
        assert_eq!(min_days_for_bouquets(&[7, 7, 7, 7, 12, 7, 7], 2, 3), Some(12));
    }

    proptest! {
        #[test]
        fn test_matches_std_binary_search(mut items in prop::collection::vec(-50i32..50, 0..40), target in -60i32..60) {
            items.sort();
            items.dedup();
            prop_assert_eq!(binary_search(&items, &target), items.binary_search(&target).ok());
            prop_assert_eq!(lower_bound(&items, &target), items.partition_point(|x| *x < target));
        }

        #[test]
        fn test_bouquet_day_is_minimal(bloom in prop::collection::vec(1u32..30, 1..20), m in 1usize..4, k in 1usize..4) {
            if let Some(day) = min_days_for_bouquets(&bloom, m, k) {
                prop_assert!(bouquets_by_day(&bloom, day, k) >= m);
                prop_assert!(day == 0 || bouquets_by_day(&bloom, day - 1, k) < m);
            } else {
                prop_assert!(m * k > bloom.len());
            }
        }
    }
}
