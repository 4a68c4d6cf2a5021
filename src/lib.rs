pub mod ai;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod output;
pub mod processing;
pub mod template;
pub mod ticket;
pub mod tools;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;
