use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Speech engine initialization failure. Recoverable: the engine state stays
/// uninitialized and a later call retries.
///
/// `Clone` because every caller awaiting one in-flight initialization
/// receives the same error.
#[derive(Debug, Clone, Error)]
pub enum EngineInitError {
    #[error("rule resources not found for locale '{locale}' at {}", path.display())]
    ResourceNotFound { locale: String, path: PathBuf },

    #[error("failed to read rule resources at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("invalid rule resources at {}: {source}", path.display())]
    InvalidRules {
        path: PathBuf,
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("rule resources for locale '{locale}' do not define domain '{domain}'")]
    UnsupportedDomain { locale: String, domain: String },

    #[error("domain '{domain}' does not define style '{style}'")]
    UnsupportedStyle { domain: String, style: String },

    #[error("domain '{domain}' is missing required template '{key}'")]
    MissingTemplate { domain: String, key: String },

    #[error("rule file declares locale '{found}' but '{expected}' was requested")]
    LocaleMismatch { expected: String, found: String },

    #[error("rule resource loading timed out after {0:?}")]
    Timeout(Duration),
}

/// Malformed input markup. Not retryable without corrected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty input")]
    EmptyInput,

    #[error("unbalanced group: '{{' at offset {offset} is never closed")]
    UnbalancedGroup { offset: usize },

    #[error("unexpected '}}' at offset {offset}")]
    UnexpectedClose { offset: usize },

    #[error("unknown macro \\{name} at offset {offset}")]
    UnknownMacro { name: String, offset: usize },

    #[error("unknown environment '{name}' at offset {offset}")]
    UnknownEnvironment { name: String, offset: usize },

    #[error("\\{name} requires package '{package}', which is disabled")]
    DisabledPackage { name: String, package: String },

    #[error("missing argument for \\{name} at offset {offset}")]
    MissingArgument { name: String, offset: usize },

    #[error("double {kind} at offset {offset}")]
    DoubleScript { kind: &'static str, offset: usize },

    #[error("\\left at offset {offset} has no matching \\right")]
    MissingRight { offset: usize },

    #[error("\\begin{{{name}}} at offset {offset} has no matching \\end")]
    MissingEnd { name: String, offset: usize },

    #[error("misplaced '{token}' at offset {offset}")]
    Misplaced { token: String, offset: usize },

    #[error("invalid delimiter '{token}' at offset {offset}")]
    InvalidDelimiter { token: String, offset: usize },

    #[error("nesting too deep at offset {offset}")]
    TooDeep { offset: usize },
}

/// A structure the description grammar cannot read. For structures produced
/// by the in-workspace converter this signals a parser/describer mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescribeError {
    #[error("structure is not well-formed XML: {0}")]
    Malformed(String),

    #[error("expected <math> root, found <{0}>")]
    WrongRoot(String),

    #[error("<math> root is missing the MathML namespace")]
    MissingNamespace,

    #[error("unsupported element <{0}>")]
    UnknownElement(String),

    #[error("<{element}> expects {expected} children, found {found}")]
    Arity {
        element: String,
        expected: usize,
        found: usize,
    },

    #[error("structure produced no speech")]
    Empty,
}

/// Graphic generation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("markup rejected by renderer: {0}")]
    Markup(#[from] ParseError),

    #[error("feature set differs from the structure converter's")]
    FeatureMismatch,
}

/// Malformed or missing graphic root at annotation time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    #[error("graphic has no <svg> root element")]
    MissingRoot,

    #[error("refusing to annotate with an empty description")]
    EmptyDescription,

    #[error("graphic is not well-formed: {0}")]
    Malformed(String),
}

/// Pipeline stage names, used in per-item outcomes and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    EngineInit,
    Parse,
    Describe,
    Render,
    Enrich,
    Cancelled,
    Aborted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EngineInit => "engine_init",
            Self::Parse => "parse",
            Self::Describe => "describe",
            Self::Render => "render",
            Self::Enrich => "enrich",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted",
        }
    }
}

/// Per-item pipeline failure, tagged with the stage that produced it.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("speech engine initialization failed: {0}")]
    EngineInit(#[from] EngineInitError),

    #[error("parse failed: {0}")]
    Parse(#[from] ParseError),

    #[error("description failed: {0}")]
    Describe(#[from] DescribeError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("cancelled before processing started")]
    Cancelled,

    /// The conversion task panicked; only this item is lost.
    #[error("conversion aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::EngineInit(_) => Stage::EngineInit,
            Self::Parse(_) => Stage::Parse,
            Self::Describe(_) => Stage::Describe,
            Self::Render(_) => Stage::Render,
            Self::Enrichment(_) => Stage::Enrich,
            Self::Cancelled => Stage::Cancelled,
            Self::Aborted(_) => Stage::Aborted,
        }
    }

    /// Only engine initialization failures may succeed on a later attempt
    /// with the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EngineInit(_) | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_follows_variant() {
        let err: PipelineError = ParseError::EmptyInput.into();
        assert_eq!(err.stage(), Stage::Parse);
        assert!(!err.is_retryable());

        let err: PipelineError = EngineInitError::Timeout(Duration::from_secs(1)).into();
        assert_eq!(err.stage(), Stage::EngineInit);
        assert!(err.is_retryable());
    }

    #[test]
    fn render_error_wraps_parse_error() {
        let err: RenderError = ParseError::UnbalancedGroup { offset: 5 }.into();
        assert!(err.to_string().contains("offset 5"));
    }
}
