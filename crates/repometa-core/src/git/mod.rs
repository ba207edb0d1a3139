//! Git operations module

pub mod repository;

pub use repository::{GitRepository, MergeBase};
