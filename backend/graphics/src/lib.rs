//! `texspeak-graphics`: SVG rendering and accessibility enrichment.
//!
//! [`GraphicalRenderer`] lays out the same structural tree the MathML
//! converter produces and emits an SVG with a local glyph cache;
//! [`AccessibilityEnricher`] attaches a spoken description to it.

pub mod enrich;
pub mod graphic;
pub mod layout;
pub mod metrics;
pub mod renderer;

pub use enrich::{enrich, AccessibilityEnricher, DEFAULT_TITLE_PREFIX};
pub use graphic::{Element, Graphic, Node, SVG_NAMESPACE};
pub use metrics::{GlyphCache, GlyphKey, GlyphMetrics};
pub use renderer::GraphicalRenderer;
