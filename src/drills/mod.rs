//! Small self-checking algorithm exercises.

pub mod counting;
pub mod hashing;
pub mod input;
pub mod recursion;
pub mod search;
pub mod text;
