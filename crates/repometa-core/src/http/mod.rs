//! HTTP client for the hosting API

pub mod client;

pub use client::{GitHubApiClient, RepositoryDetails};
