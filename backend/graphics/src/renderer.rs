//! Markup → SVG graphic.

use std::collections::BTreeMap;
use std::sync::Arc;

use texspeak_core::{FeatureSet, RenderError};
use texspeak_markup::{MathNode, Variant};
use tracing::debug;

use crate::graphic::{Element, Graphic, SVG_NAMESPACE};
use crate::layout::{Item, LayoutBox, Layouter, Style};
use crate::metrics::{GlyphCache, GlyphKey, UNITS_PER_EM};

/// Units per ex; output dimensions are given in ex like MathJax does.
const EX: f64 = 442.0;

#[derive(Debug, Clone)]
pub struct GraphicalRenderer {
    features: Arc<FeatureSet>,
    cache: Arc<GlyphCache>,
}

impl GraphicalRenderer {
    pub fn new(features: Arc<FeatureSet>) -> Self {
        Self {
            features,
            cache: GlyphCache::global(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<GlyphCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn features(&self) -> &Arc<FeatureSet> {
        &self.features
    }

    pub fn render(&self, source: &str, display_mode: bool) -> Result<Graphic, RenderError> {
        let tree = texspeak_markup::parse(source, &self.features)?;
        Ok(self.render_tree(&tree, display_mode))
    }

    pub fn render_tree(&self, tree: &MathNode, display_mode: bool) -> Graphic {
        let layout = Layouter::new(&self.cache).layout(tree, Style::root(display_mode));
        let svg = SvgWriter::default().write(&layout);
        debug!(
            width = layout.width,
            height = layout.height + layout.depth,
            display_mode,
            "Rendered graphic"
        );

        let mut container = Element::new("mjx-container")
            .attr("class", "MathJax")
            .attr("jax", "SVG");
        if display_mode {
            container.set_attribute("display", "true");
        }
        Graphic::new(container.child(svg))
    }
}

#[derive(Default)]
struct SvgWriter {
    defs: BTreeMap<String, Element>,
}

impl SvgWriter {
    fn write(mut self, layout: &LayoutBox) -> Element {
        let mut content = Element::new("g")
            .attr("stroke", "currentColor")
            .attr("fill", "currentColor")
            .attr("stroke-width", "0");
        for item in &layout.items {
            content.children.push(self.item(item).into());
        }

        let total = layout.height + layout.depth;
        let mut svg = Element::new("svg")
            .attr("xmlns", SVG_NAMESPACE)
            .attr("width", format!("{}ex", num(layout.width / EX)))
            .attr("height", format!("{}ex", num(total / EX)))
            .attr("style", format!("vertical-align: {}ex;", num(-layout.depth / EX)))
            .attr(
                "viewBox",
                format!(
                    "0 {} {} {}",
                    num(-layout.height),
                    num(layout.width),
                    num(total)
                ),
            )
            .attr("focusable", "false");
        if !self.defs.is_empty() {
            let mut defs = Element::new("defs");
            defs.children
                .extend(std::mem::take(&mut self.defs).into_values().map(Into::into));
            svg.children.push(defs.into());
        }
        svg.child(content)
    }

    fn item(&mut self, item: &Item) -> Element {
        match item {
            Item::Glyph {
                key,
                x,
                y,
                scale,
                stretch,
            } => {
                let id = self.define(*key);
                let mut used = Element::new("use").attr("href", format!("#{id}"));
                if *scale == 1.0 && *stretch == 1.0 {
                    used.set_attribute("x", num(*x));
                    used.set_attribute("y", num(*y));
                } else {
                    used.set_attribute(
                        "transform",
                        format!(
                            "translate({},{}) scale({},{})",
                            num(*x),
                            num(*y),
                            num(*scale),
                            num(scale * stretch)
                        ),
                    );
                }
                used
            }
            Item::Rule {
                x,
                y,
                width,
                height,
            } => Element::new("rect")
                .attr("x", num(*x))
                .attr("y", num(*y))
                .attr("width", num(*width))
                .attr("height", num(*height)),
            Item::Line {
                x1,
                y1,
                x2,
                y2,
                thickness,
            } => Element::new("line")
                .attr("x1", num(*x1))
                .attr("y1", num(*y1))
                .attr("x2", num(*x2))
                .attr("y2", num(*y2))
                .attr("stroke-width", num(*thickness)),
            Item::Group { color, items } => {
                let mut group = Element::new("g")
                    .attr("fill", color.as_str())
                    .attr("stroke", color.as_str());
                for inner in items {
                    group.children.push(self.item(inner).into());
                }
                group
            }
        }
    }

    /// Adds the glyph to `<defs>` on first use and returns its id.
    fn define(&mut self, key: GlyphKey) -> String {
        let id = key.id();
        self.defs
            .entry(id.clone())
            .or_insert_with(|| glyph_def(&id, key));
        id
    }
}

fn glyph_def(id: &str, key: GlyphKey) -> Element {
    let mut text = Element::new("text")
        .attr("id", id)
        .attr("font-size", num(UNITS_PER_EM));
    let (family, style, weight) = font(key.variant);
    text.set_attribute("font-family", family);
    if let Some(style) = style {
        text.set_attribute("font-style", style);
    }
    if let Some(weight) = weight {
        text.set_attribute("font-weight", weight);
    }
    text.text(key.ch.to_string())
}

fn font(variant: Variant) -> (&'static str, Option<&'static str>, Option<&'static str>) {
    const SERIF: &str = "STIX Two Math, Latin Modern Math, serif";
    match variant {
        Variant::Normal => (SERIF, None, None),
        Variant::Italic => (SERIF, Some("italic"), None),
        Variant::Bold => (SERIF, None, Some("bold")),
        Variant::BoldItalic => (SERIF, Some("italic"), Some("bold")),
        Variant::DoubleStruck => ("STIX Two Math, serif", None, None),
        Variant::Script => ("STIX Two Math, cursive", Some("italic"), None),
        Variant::Fraktur => ("STIX Two Math, fantasy", None, None),
        Variant::SansSerif => ("sans-serif", None, None),
        Variant::Monospace => ("monospace", None, None),
    }
}

/// Formats a coordinate with at most one decimal.
fn num(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.1}");
    match text.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => text,
    }
}
