//! MathML serializer for the structural tree.
//!
//! Produces the inner markup only; [`SerializedStructure::wrap`] adds the
//! `<math>` root so the namespace and display attributes cannot be forgotten.
//!
//! [`SerializedStructure::wrap`]: texspeak_core::SerializedStructure::wrap

use std::fmt::Write;

use crate::tree::{MathNode, OpKind, TableKind};

/// Invisible function application operator placed after function names.
pub const FUNCTION_APPLICATION: &str = "\u{2061}";

pub struct MathmlWriter {
    display: bool,
    out: String,
}

impl MathmlWriter {
    pub fn new(display: bool) -> Self {
        Self {
            display,
            out: String::new(),
        }
    }

    /// Serializes `node` into MathML presentation markup.
    pub fn to_mathml(node: &MathNode, display: bool) -> String {
        let mut writer = Self::new(display);
        writer.write_node(node);
        writer.out
    }

    fn write_node(&mut self, node: &MathNode) {
        match node {
            MathNode::Row(children) => {
                self.out.push_str("<mrow>");
                self.write_children(children);
                self.out.push_str("</mrow>");
            }
            MathNode::Identifier { name, variant } => match variant {
                Some(v) => self.leaf_with("mi", &format!(r#" mathvariant="{}""#, v.as_str()), name),
                None => self.leaf("mi", name),
            },
            MathNode::Number(n) => self.leaf("mn", n),
            MathNode::Operator { symbol, kind } => match kind {
                OpKind::Large if self.display => self.leaf_with("mo", r#" largeop="true""#, symbol),
                _ => self.leaf("mo", symbol),
            },
            MathNode::Function(name) => self.leaf("mi", name),
            MathNode::Text(text) => self.leaf("mtext", text),
            MathNode::Space(width) => {
                let _ = write!(self.out, r#"<mspace width="{}em"/>"#, format_em(*width));
            }
            MathNode::Fraction { num, den, bar } => {
                self.out
                    .push_str(if *bar { "<mfrac>" } else { r#"<mfrac linethickness="0">"# });
                self.write_node(num);
                self.write_node(den);
                self.out.push_str("</mfrac>");
            }
            MathNode::Sqrt(body) => self.wrap("msqrt", "", &[&**body]),
            MathNode::Root { base, index } => self.wrap("mroot", "", &[&**base, &**index]),
            MathNode::Scripts {
                base,
                sub,
                sup,
                limits,
            } => {
                let stacked = *limits && self.display;
                match (sub, sup) {
                    (Some(sub), Some(sup)) => {
                        let tag = if stacked { "munderover" } else { "msubsup" };
                        self.wrap(tag, "", &[&**base, &**sub, &**sup]);
                    }
                    (Some(sub), None) => {
                        let tag = if stacked { "munder" } else { "msub" };
                        self.wrap(tag, "", &[&**base, &**sub]);
                    }
                    (None, Some(sup)) => {
                        let tag = if stacked { "mover" } else { "msup" };
                        self.wrap(tag, "", &[&**base, &**sup]);
                    }
                    (None, None) => self.write_node(base),
                }
            }
            MathNode::Fenced { open, close, body } => {
                self.out.push_str("<mrow>");
                if !open.is_empty() {
                    self.leaf_with("mo", r#" fence="true" form="prefix""#, open);
                }
                self.write_node(body);
                if !close.is_empty() {
                    self.leaf_with("mo", r#" fence="true" form="postfix""#, close);
                }
                self.out.push_str("</mrow>");
            }
            MathNode::Colored { color, body } => {
                let attrs = format!(r#" mathcolor="{}""#, escape(color));
                self.wrap("mstyle", &attrs, &[&**body]);
            }
            MathNode::Cancel { kind, body } => {
                let attrs = format!(r#" notation="{}""#, kind.notation());
                self.wrap("menclose", &attrs, &[&**body]);
            }
            MathNode::Table { kind, rows } => {
                self.out.push_str(match kind {
                    TableKind::Matrix => "<mtable>",
                    TableKind::Cases => r#"<mtable columnalign="left left">"#,
                });
                for row in rows {
                    self.out.push_str("<mtr>");
                    for cell in row {
                        self.out.push_str("<mtd>");
                        self.write_node(cell);
                        self.out.push_str("</mtd>");
                    }
                    self.out.push_str("</mtr>");
                }
                self.out.push_str("</mtable>");
            }
        }
    }

    fn write_children(&mut self, children: &[MathNode]) {
        for (i, child) in children.iter().enumerate() {
            self.write_node(child);
            if child.is_function() && i + 1 < children.len() {
                self.leaf("mo", FUNCTION_APPLICATION);
            }
        }
    }

    fn wrap(&mut self, tag: &str, attrs: &str, children: &[&MathNode]) {
        let _ = write!(self.out, "<{tag}{attrs}>");
        for child in children {
            self.write_node(child);
        }
        let _ = write!(self.out, "</{tag}>");
    }

    fn leaf(&mut self, tag: &str, text: &str) {
        self.leaf_with(tag, "", text);
    }

    fn leaf_with(&mut self, tag: &str, attrs: &str, text: &str) {
        let _ = write!(self.out, "<{tag}{attrs}>{}</{tag}>", escape(text));
    }
}

fn format_em(thousandths: i32) -> String {
    let em = format!("{:.3}", f64::from(thousandths) / 1000.0);
    em.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Escapes text for use in XML content or attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
