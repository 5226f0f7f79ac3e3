use std::collections::HashMap;

// Largest inputs whose results still fit in a u64; also caps recursion depth.
const MAX_FACTORIAL: u32 = 20;
const MAX_FIBONACCI: u32 = 93;

/// `n!`, or `None` once it no longer fits in a `u64` (n > 20).
pub fn factorial(n: u32) -> Option<u64> {
    if n > MAX_FACTORIAL {
        return None;
    }
    match n {
        0 | 1 => Some(1),
        _ => factorial(n - 1)?.checked_mul(u64::from(n)),
    }
}

/// `n`-th Fibonacci number with memoised recursion; `None` past `u64`.
pub fn fibonacci(n: u32) -> Option<u64> {
    fn fib(n: u32, memo: &mut HashMap<u32, u64>) -> Option<u64> {
        if n < 2 {
            return Some(u64::from(n));
        }
        if let Some(&cached) = memo.get(&n) {
            return Some(cached);
        }
        let value = fib(n - 1, memo)?.checked_add(fib(n - 2, memo)?)?;
        memo.insert(n, value);
        Some(value)
    }
    if n > MAX_FIBONACCI {
        return None;
    }
    fib(n, &mut HashMap::new())
}

/// `base^exp` by repeated squaring; `None` on overflow.
pub fn power(base: i64, exp: u32) -> Option<i64> {
    if exp == 0 {
        return Some(1);
    }
    let half = power(base, exp / 2)?;
    let square = half.checked_mul(half)?;
    if exp % 2 == 0 {
        Some(square)
    } else {
        square.checked_mul(base)
    }
}

/// Every ordering of `items`, in lexicographic order of positions.
pub fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.is_empty() {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let chosen = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, chosen.clone());
            result.push(tail);
        }
    }
    result
}

/// Every subset of `items` (the power set), each keeping the input order.
pub fn subsets<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    match items.split_first() {
        None => vec![Vec::new()],
        Some((first, rest)) => {
            let without = subsets(rest);
            let with = without.iter().map(|subset| {
                let mut subset_with = Vec::with_capacity(subset.len() + 1);
                subset_with.push(first.clone());
                subset_with.extend_from_slice(subset);
                subset_with
            });
            with.chain(without.iter().cloned()).collect()
        }
    }
}

/// Moves that solve Towers of Hanoi for `disks` disks from peg 0 to peg 2.
pub fn hanoi(disks: u32) -> Vec<(u8, u8)> {
    fn solve(n: u32, from: u8, to: u8, via: u8, moves: &mut Vec<(u8, u8)>) {
        if n == 0 {
            return;
        }
        solve(n - 1, from, via, to, moves);
        moves.push((from, to));
        solve(n - 1, via, to, from, moves);
    }
    let mut moves = Vec::new();
    solve(disks, 0, 2, 1, &mut moves);
    moves
}
