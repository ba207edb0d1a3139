//! # repometa core
//!
//! Extracts repository, event, ref, commit, pull request and actor metadata
//! from a GitHub Actions job and renders it as JSON, YAML and flat step
//! outputs.
//!
//! Data flows one way:
//! - [`env`] reads the injected environment and event payload
//! - [`resolve`] classifies the event, splits the ref and derives cache keys
//! - [`changes`] lists changed files through local history or the hosting API
//! - [`aggregate`] combines everything into one [`Metadata`] record
//! - [`output`] renders JSON, derives YAML from it and writes artifacts
//!
//! [`pipeline::run_action`] runs all of it as one all-or-nothing invocation.
//!
//! ## Example
//!
//! ```no_run
//! use repometa_core::{run_action, ActionConfig, EnvironmentContext};
//!
//! # async fn example() -> Result<(), repometa_core::Failure> {
//! let report = run_action(EnvironmentContext::from_process(), &ActionConfig::default()).await?;
//! println!("{}", report.rendered.json);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod aggregate;
pub mod changes;
pub mod config;
pub mod env;
pub mod error;
pub mod git;
pub mod http;
pub mod output;
pub mod pipeline;
pub mod resolve;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use config::{ActionConfig, ArtifactFormat, ChangeDetection};
pub use env::EnvironmentContext;
pub use error::{Error, ErrorKind, Failure, Result, Stage};
pub use pipeline::{run_action, ActionReport};
pub use traits::ChangeDetector;
pub use types::Metadata;

#[cfg(test)]
mod tests {
    #[test]
    fn test_library_version() {
        let _ = env!("CARGO_PKG_VERSION");
    }
}
