pub mod runner;
pub mod verdict;

pub use runner::{RunPolicy, Runner};
