use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Namespace carried by every serialized structure root.
pub const MATHML_NAMESPACE: &str = "http://www.w3.org/1998/Math/MathML";

/// One unit of work for the pipeline: a markup string and its display mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub source: String,
    #[serde(default = "default_display_mode")]
    pub display_mode: bool,
}

fn default_display_mode() -> bool {
    true
}

impl ConversionRequest {
    pub fn display(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            display_mode: true,
        }
    }

    pub fn inline(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            display_mode: false,
        }
    }
}

/// Rule family used by the speech generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    #[default]
    Clearspeak,
    Mathspeak,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clearspeak => "clearspeak",
            Self::Mathspeak => "mathspeak",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much structural framing the speech output carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Brief,
    #[default]
    Default,
    Verbose,
}

/// Speech engine configuration. Applied once per engine state, then read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub locale: String,
    pub domain: Domain,
    pub style: String,
    pub verbosity: Verbosity,
    /// Directory holding `<locale>.json` rule files.
    pub resource_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            domain: Domain::Clearspeak,
            style: "default".to_string(),
            verbosity: Verbosity::Default,
            resource_path: PathBuf::from("resources/mathmaps"),
        }
    }
}

impl EngineConfig {
    pub fn with_resource_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.resource_path = path.into();
        self
    }

    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// MathML text of a structural tree, wrapped in a `<math>` root carrying the
/// namespace and display attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedStructure {
    xml: String,
    display: bool,
}

impl SerializedStructure {
    /// Wraps already-serialized inner MathML. The root is always emitted here,
    /// so no caller can produce a structure without the namespace attribute.
    pub fn wrap(inner: &str, display: bool) -> Self {
        let mode = if display { "block" } else { "inline" };
        Self {
            xml: format!(r#"<math xmlns="{MATHML_NAMESPACE}" display="{mode}">{inner}</math>"#),
            display,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }

    pub fn display(&self) -> bool {
        self.display
    }

    pub fn into_string(self) -> String {
        self.xml
    }
}

impl fmt::Display for SerializedStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.xml)
    }
}

/// Natural-language rendering of a structural tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Description(String);

impl Description {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_sets_namespace_and_display() {
        let block = SerializedStructure::wrap("<mi>x</mi>", true);
        assert_eq!(
            block.as_str(),
            r#"<math xmlns="http://www.w3.org/1998/Math/MathML" display="block"><mi>x</mi></math>"#
        );
        let inline = SerializedStructure::wrap("<mi>x</mi>", false);
        assert!(inline.as_str().contains(r#"display="inline""#));
        assert!(!inline.display());
    }

    #[test]
    fn request_defaults_to_display_mode() {
        let req: ConversionRequest = serde_json::from_str(r#"{"source":"x"}"#).unwrap();
        assert!(req.display_mode);
    }

    #[test]
    fn domain_round_trips_lowercase() {
        let d: Domain = serde_json::from_str("\"mathspeak\"").unwrap();
        assert_eq!(d, Domain::Mathspeak);
        assert_eq!(d.to_string(), "mathspeak");
    }
}
