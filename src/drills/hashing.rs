use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Indices of two distinct entries adding up to `target`.
pub fn two_sum(values: &[i64], target: i64) -> Option<(usize, usize)> {
    let mut seen: HashMap<i64, usize> = HashMap::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        // A complement outside i64 cannot be in the slice.
        if let Some(&j) = target.checked_sub(value).and_then(|need| seen.get(&need)) {
            return Some((j, i));
        }
        seen.entry(value).or_insert(i);
    }
    None
}

pub fn contains_duplicate<T: Hash + Eq>(items: &[T]) -> bool {
    let mut seen = HashSet::with_capacity(items.len());
    !items.iter().all(|item| seen.insert(item))
}

/// Groups words that are anagrams of each other, in order of first
/// appearance.
pub fn group_anagrams(words: &[&str]) -> Vec<Vec<String>> {
    let mut index: HashMap<Vec<char>, usize> = HashMap::new();
    let mut groups: Vec<Vec<String>> = Vec::new();

    for word in words {
        let mut key: Vec<char> = word.chars().collect();
        key.sort_unstable();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push((*word).to_string());
    }
    groups
}

const BASE: u64 = 257;
const MODULUS: u64 = 1_000_000_007;

/// Polynomial rolling hash of `bytes` modulo a large prime.
pub fn polynomial_hash(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0, |hash, &b| (hash * BASE + u64::from(b)) % MODULUS)
}

/// Byte offsets of every occurrence of `needle` in `haystack` (Rabin-Karp).
pub fn find_all(haystack: &str, needle: &str) -> Vec<usize> {
    let (text, pattern) = (haystack.as_bytes(), needle.as_bytes());
    let n = pattern.len();
    if n == 0 || n > text.len() {
        return Vec::new();
    }

    // BASE^(n-1), used to drop the leading byte from the window.
    let high = (1..n).fold(1, |acc, _| acc * BASE % MODULUS);
    let target = polynomial_hash(pattern);
    let mut window = polynomial_hash(&text[..n]);
    let mut matches = Vec::new();

    for start in 0..=text.len() - n {
        if window == target && &text[start..start + n] == pattern {
            matches.push(start);
        }
        if start + n < text.len() {
            let leading = u64::from(text[start]) * high % MODULUS;
            window = (window + MODULUS - leading) % MODULUS;
            window = (window * BASE + u64::from(text[start + n])) % MODULUS;
        }
    }
    matches
}
