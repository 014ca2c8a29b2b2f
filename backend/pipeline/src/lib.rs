//! `texspeak-pipeline`: markup in, accessible SVG out.
//!
//! [`PipelineOrchestrator`] sequences the speech engine, the MathML
//! structure converter, the graphical renderer and the enricher, for single
//! requests or ordered batches.

pub mod artifact;
pub mod orchestrator;

pub use artifact::AccessibleArtifact;
pub use orchestrator::{ItemResult, PipelineOrchestrator, DEFAULT_MAX_CONCURRENCY};
