//! Environment Reader: runner variables and event payload

pub mod context;
pub mod payload;
pub mod reader;

pub use context::EnvironmentContext;
pub use payload::EventPayload;
pub use reader::{EnvironmentReader, RawEnvironment};
