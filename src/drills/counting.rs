use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;

// =============================================================================
// Frequency counting
// =============================================================================

pub fn char_frequencies(text: &str) -> BTreeMap<char, usize> {
    let mut counts = BTreeMap::new();
    for ch in text.chars().filter(|c| !c.is_whitespace()) {
        *counts.entry(ch).or_insert(0) += 1;
    }
    counts
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
}

/// Case-insensitive word counts.
pub fn word_frequencies(text: &str) -> HashMap<String, usize> {
    words(text).counts()
}

/// The `n` most common words, ties broken alphabetically.
pub fn top_words(text: &str, n: usize) -> Vec<(String, usize)> {
    word_frequencies(text)
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(n)
        .collect()
}

// =============================================================================
// Prefix sums and sliding windows
// =============================================================================

/// Number of contiguous subarrays summing to `k`.
///
/// Prefix sums are kept in `i128`, so inputs near `i64::MAX` neither wrap
/// nor overflow.
pub fn count_subarrays_with_sum(values: &[i64], k: i64) -> usize {
    let mut seen: HashMap<i128, usize> = HashMap::from([(0, 1)]);
    let mut prefix: i128 = 0;
    let mut count = 0;

    for &value in values {
        prefix += i128::from(value);
        count += seen.get(&(prefix - i128::from(k))).copied().unwrap_or(0);
        *seen.entry(prefix).or_insert(0) += 1;
    }
    count
}

/// Length (in chars) of the longest substring without a repeated character.
pub fn longest_unique_substring(text: &str) -> usize {
    let mut last_seen: HashMap<char, usize> = HashMap::new();
    let mut start = 0;
    let mut best = 0;

    for (i, ch) in text.chars().enumerate() {
        if let Some(&prev) = last_seen.get(&ch) {
            if prev >= start {
                start = prev + 1;
            }
        }
        last_seen.insert(ch, i);
        best = best.max(i + 1 - start);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_char_frequencies_skip_whitespace() {
        let counts = char_frequencies("hello world");
        assert_eq!(counts[&'l'], 3);
        assert_eq!(counts[&'o'], 2);
        assert!(!counts.contains_key(&' '));
    }

    #[test]
    fn test_word_frequencies_ignore_case_and_punctuation() {
        let counts = word_frequencies("The cat; the hat. THE end, don't stop");
        assert_eq!(counts["the"], 3);
        assert_eq!(counts["don't"], 1);
        assert_eq!(counts.len(), 6);
    }

    #[test]
    fn test_top_words_breaks_ties_alphabetically() {
        let top = top_words("b a c b a d", 3);
        assert_eq!(
            top,
            vec![("a".to_string(), 2), ("b".to_string(), 2), ("c".to_string(), 1)]
        );
        assert!(top_words("", 3).is_empty());
    }

    #[test]
    fn test_count_subarrays_with_sum() {
        assert_eq!(count_subarrays_with_sum(&[1, 1, 1], 2), 2);
        assert_eq!(count_subarrays_with_sum(&[3, 1, 2, 4], 6), 2);
        assert_eq!(count_subarrays_with_sum(&[1, -1, 0], 0), 3);
        assert_eq!(count_subarrays_with_sum(&[], 0), 0);
    }

    #[test]
    fn test_count_subarrays_with_sum_near_i64_limits() {
        assert_eq!(count_subarrays_with_sum(&[i64::MAX, 1], 0), 0);
        assert_eq!(count_subarrays_with_sum(&[i64::MAX, 1, -1], i64::MAX), 2);
        assert_eq!(count_subarrays_with_sum(&[i64::MIN, -1, 1], i64::MIN), 2);
        assert_eq!(count_subarrays_with_sum(&[i64::MAX, i64::MIN], -1), 1);
    }

    #[test]
    fn test_longest_unique_substring() {
        assert_eq!(longest_unique_substring("abcabcbb"), 3);
        assert_eq!(longest_unique_substring("bbbbb"), 1);
        assert_eq!(longest_unique_substring("pwwkew"), 3);
        assert_eq!(longest_unique_substring("abba"), 2);
        assert_eq!(longest_unique_substring(""), 0);
    }

    proptest! {
        #[test]
        fn test_subarray_count_matches_brute_force(values in prop::collection::vec(-5i64..5, 0..30), k in -10i64..10) {
            let mut brute = 0;
            for i in 0..values.len() {
                let mut sum = 0;
                for value in &values[i..] {
                    sum += value;
                    if sum == k {
                        brute += 1;
                    }
                }
            }
            prop_assert_eq!(count_subarrays_with_sum(&values, k), brute);
        }
    }
}
