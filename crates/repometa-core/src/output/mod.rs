//! Rendering and persistence of the metadata record

pub mod flatten;
pub mod serializer;
pub mod summary;
pub mod writer;

pub use flatten::FlatOutputs;
pub use serializer::RenderedMetadata;
pub use summary::render_summary;
pub use writer::{ArtifactWriter, WrittenArtifacts};
