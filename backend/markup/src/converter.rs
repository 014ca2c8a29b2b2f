use std::sync::Arc;

use texspeak_core::{FeatureSet, ParseError, SerializedStructure};
use tracing::debug;

use crate::mathml::MathmlWriter;
use crate::parser;
use crate::tree::MathNode;

/// Markup → structural tree → serialized MathML.
///
/// Holds the shared feature set by `Arc` so the graphical renderer can be
/// built from the very same instance.
#[derive(Debug, Clone)]
pub struct MathStructureConverter {
    features: Arc<FeatureSet>,
}

impl MathStructureConverter {
    pub fn new(features: Arc<FeatureSet>) -> Self {
        Self { features }
    }

    pub fn features(&self) -> &Arc<FeatureSet> {
        &self.features
    }

    pub fn parse_tree(&self, source: &str) -> Result<MathNode, ParseError> {
        parser::parse(source, &self.features)
    }

    pub fn parse(&self, source: &str, display_mode: bool) -> Result<SerializedStructure, ParseError> {
        let tree = self.parse_tree(source)?;
        Ok(self.serialize(&tree, display_mode))
    }

    pub fn serialize(&self, tree: &MathNode, display_mode: bool) -> SerializedStructure {
        let inner = MathmlWriter::to_mathml(tree, display_mode);
        debug!(len = inner.len(), display_mode, "Serialized structure");
        SerializedStructure::wrap(&inner, display_mode)
    }
}

impl Default for MathStructureConverter {
    fn default() -> Self {
        Self::new(Arc::new(FeatureSet::default()))
    }
}
