// contribution-runner: clone, commit and push synthetic contributions.

pub mod commits;
pub mod config;
pub mod error;
pub mod git;
pub mod push;
pub mod runner;

#[cfg(test)]
pub(crate) mod test_support;
