//! Algorithm drills on command-line input
//!
//! Run with: cargo run --bin drills -- search 7 "1 2 3 4 5 6 7 8 9 10"

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use itertools::Itertools;

use handoff_lab::drills::{counting, hashing, input, recursion, search, text};
use handoff_lab::logging;

#[derive(Parser, Debug)]
#[command(name = "drills")]
#[command(about = "Small algorithm exercises")]
struct Args {
    #[command(subcommand)]
    drill: Drill,
}

#[derive(Subcommand, Debug)]
enum Drill {
    /// Binary search for TARGET in a list of numbers (sorted for you)
    Search { target: String, numbers: String },
    /// Count subarrays summing to K
    SubarraySum { k: String, numbers: String },
    /// Find two entries adding up to TARGET
    TwoSum { target: String, numbers: String },
    /// Check whether TEXT reads the same both ways
    Palindrome { text: String },
    /// Most frequent words in TEXT
    Words {
        text: String,
        #[arg(short, long, default_value_t = 5)]
        top: usize,
    },
    /// Length of the longest substring without repeats
    Unique { text: String },
    /// N! and the N-th Fibonacci number
    Factorial { n: String },
    /// Earliest day to pick M bouquets of K adjacent flowers
    Bouquets { m: usize, k: usize, bloom: String },
}

fn run(drill: Drill) -> Result<()> {
    match drill {
        Drill::Search { target, numbers } => {
            let target = input::parse_number(&target, 0)?;
            let mut numbers = input::parse_numbers(&numbers)?;
            numbers.sort_unstable();
            match search::binary_search(&numbers, &target) {
                Some(index) => println!("{target} found at index {index} of {numbers:?}"),
                None => println!(
                    "{target} not found; it would go at index {}",
                    search::lower_bound(&numbers, &target)
                ),
            }
        }
        Drill::SubarraySum { k, numbers } => {
            let k = input::parse_number(&k, 0)?;
            let numbers = input::parse_numbers(&numbers)?;
            let count = counting::count_subarrays_with_sum(&numbers, k);
            println!("{count} subarray(s) sum to {k}");
        }
        Drill::TwoSum { target, numbers } => {
            let target = input::parse_number(&target, 0)?;
            let numbers = input::parse_numbers(&numbers)?;
            match hashing::two_sum(&numbers, target) {
                Some((i, j)) => println!(
                    "numbers[{i}] + numbers[{j}] = {} + {} = {target}",
                    numbers[i], numbers[j]
                ),
                None => println!("no pair adds up to {target}"),
            }
        }
        Drill::Palindrome { text: phrase } => {
            let verdict = if text::is_palindrome(&phrase) {
                "is a palindrome".green()
            } else {
                "is not a palindrome".red()
            };
            println!("{phrase:?} {verdict}");
            println!(
                "longest palindromic substring: {:?}",
                text::longest_palindromic_substring(&phrase)
            );
        }
        Drill::Words { text, top } => {
            let words = counting::top_words(&text, top);
            if words.is_empty() {
                bail!("no words found in input");
            }
            println!(
                "{}",
                words
                    .iter()
                    .map(|(word, count)| format!("{word}: {count}"))
                    .join(", ")
            );
        }
        Drill::Unique { text } => {
            println!(
                "longest run without repeats: {}",
                counting::longest_unique_substring(&text)
            );
        }
        Drill::Factorial { n } => {
            let n = input::parse_number(&n, 0)?;
            let n = u32::try_from(n).map_err(|_| anyhow::anyhow!("n must be between 0 and {}", u32::MAX))?;
            match recursion::factorial(n) {
                Some(value) => println!("{n}! = {value}"),
                None => println!("{n}! does not fit in 64 bits"),
            }
            match recursion::fibonacci(n) {
                Some(value) => println!("fib({n}) = {value}"),
                None => println!("fib({n}) does not fit in 64 bits"),
            }
        }
        Drill::Bouquets { m, k, bloom } => {
            let bloom = input::parse_numbers(&bloom)?
                .into_iter()
                .map(u32::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| anyhow::anyhow!("bloom days must be non-negative"))?;
            match search::min_days_for_bouquets(&bloom, m, k) {
                Some(day) => println!("{m} bouquet(s) of {k} ready on day {day}"),
                None => println!("not enough flowers for {m} bouquet(s) of {k}"),
            }
        }
    }
    Ok(())
}

fn main() {
    logging::init(false);
    let args = Args::parse();

    if let Err(err) = run(args.drill) {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(2);
    }
}
