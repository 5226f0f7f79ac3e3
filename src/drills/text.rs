fn normalized(text: &str) -> Vec<char> {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Palindrome check ignoring case, spaces and punctuation.
pub fn is_palindrome(text: &str) -> bool {
    let chars = normalized(text);
    chars.iter().eq(chars.iter().rev())
}

/// Same check, done by peeling one character off each end per call.
pub fn is_palindrome_recursive(text: &str) -> bool {
    fn check(chars: &[char]) -> bool {
        match chars {
            [] | [_] => true,
            [first, middle @ .., last] => first == last && check(middle),
        }
    }
    check(&normalized(text))
}

/// Longest palindromic substring, found by expanding around each centre.
/// Returns the leftmost one on ties.
pub fn longest_palindromic_substring(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let expand = |mut left: usize, mut right: usize| -> (usize, usize) {
        // Returns the half-open range of the widest palindrome around the centre.
        loop {
            if chars[left] != chars[right] {
                return (left + 1, right);
            }
            if left == 0 || right + 1 == chars.len() {
                return (left, right + 1);
            }
            left -= 1;
            right += 1;
        }
    };

    let mut best = (0, 0);
    for centre in 0..chars.len() {
        let odd = expand(centre, centre);
        if odd.1 - odd.0 > best.1 - best.0 {
            best = odd;
        }
        if centre + 1 < chars.len() {
            let even = expand(centre, centre + 1);
            if even.1 - even.0 > best.1 - best.0 {
                best = even;
            }
        }
    }
    chars[best.0..best.1].iter().collect()
}
