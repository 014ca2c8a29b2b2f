//! `texspeak-core`: shared types for the markup → accessible SVG pipeline.
//!
//! Every conversion stage depends on this crate; it owns no behavior beyond
//! the data model, the shared package feature set, and the error taxonomy.

pub mod error;
pub mod features;
pub mod types;

pub use error::{
    DescribeError, EngineInitError, EnrichmentError, ParseError, PipelineError, RenderError, Stage,
};
pub use features::{FeatureSet, Package};
pub use types::{
    ConversionRequest, Description, Domain, EngineConfig, SerializedStructure, Verbosity,
    MATHML_NAMESPACE,
};
