//! Shared helpers used across herald crates.

pub mod error;

pub use error::FromMessage;
