//! Structural tree for parsed math markup.
//!
//! Mirrors the MathML presentation vocabulary closely enough that the
//! serializer is a direct walk, while keeping TeX-level facts (limits
//! placement, fence pairs, table kind) that both the serializer and the
//! graphical layout need.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Normal,
    Italic,
    Bold,
    BoldItalic,
    DoubleStruck,
    Script,
    Fraktur,
    SansSerif,
    Monospace,
}

impl Variant {
    /// The MathML `mathvariant` attribute value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Italic => "italic",
            Self::Bold => "bold",
            Self::BoldItalic => "bold-italic",
            Self::DoubleStruck => "double-struck",
            Self::Script => "script",
            Self::Fraktur => "fraktur",
            Self::SansSerif => "sans-serif",
            Self::Monospace => "monospace",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Binary,
    Relation,
    Open,
    Close,
    Punct,
    Large,
    Ordinary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelKind {
    /// `\cancel`: a single up-diagonal stroke.
    Up,
    /// `\bcancel`: a single down-diagonal stroke.
    Down,
    /// `\xcancel`: both strokes.
    Cross,
}

impl CancelKind {
    pub fn notation(&self) -> &'static str {
        match self {
            Self::Up => "updiagonalstrike",
            Self::Down => "downdiagonalstrike",
            Self::Cross => "updiagonalstrike downdiagonalstrike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Matrix,
    Cases,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MathNode {
    Row(Vec<MathNode>),
    Identifier {
        name: String,
        variant: Option<Variant>,
    },
    Number(String),
    Operator {
        symbol: String,
        kind: OpKind,
    },
    /// Named function such as `sin` or `lim`; followed by function application.
    Function(String),
    Text(String),
    /// Horizontal space in thousandths of an em.
    Space(i32),
    Fraction {
        num: Box<MathNode>,
        den: Box<MathNode>,
        /// False for `\binom`-style stacks without a bar.
        bar: bool,
    },
    Sqrt(Box<MathNode>),
    Root {
        base: Box<MathNode>,
        index: Box<MathNode>,
    },
    Scripts {
        base: Box<MathNode>,
        sub: Option<Box<MathNode>>,
        sup: Option<Box<MathNode>>,
        /// Limits go above/below the base in display mode.
        limits: bool,
    },
    Fenced {
        open: String,
        close: String,
        body: Box<MathNode>,
    },
    Colored {
        color: String,
        body: Box<MathNode>,
    },
    Cancel {
        kind: CancelKind,
        body: Box<MathNode>,
    },
    Table {
        kind: TableKind,
        rows: Vec<Vec<MathNode>>,
    },
}

impl MathNode {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Identifier {
            name: name.into(),
            variant: None,
        }
    }

    pub fn op(symbol: impl Into<String>, kind: OpKind) -> Self {
        Self::Operator {
            symbol: symbol.into(),
            kind,
        }
    }

    /// Collapses single-element rows so `{x}` and `x` produce the same tree.
    pub fn row(mut nodes: Vec<MathNode>) -> Self {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Self::Row(nodes)
        }
    }

    pub fn is_empty_row(&self) -> bool {
        matches!(self, Self::Row(children) if children.is_empty())
    }

    /// Whether this node is a function name, possibly carrying scripts
    /// (`\sin^2`), so that a function-application operator must follow it.
    pub fn is_function(&self) -> bool {
        match self {
            Self::Function(_) => true,
            Self::Scripts { base, .. } => base.is_function(),
            _ => false,
        }
    }

    /// Visible leaf symbols in document order: identifiers, numbers,
    /// operators, function names and text. Used to check that two views of
    /// the same source agree on content.
    pub fn leaf_symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<String>) {
        match self {
            Self::Row(children) => children.iter().for_each(|c| c.collect_leaves(out)),
            Self::Identifier { name, .. } => out.push(name.clone()),
            Self::Number(n) => out.push(n.clone()),
            Self::Operator { symbol, .. } => out.push(symbol.clone()),
            Self::Function(name) | Self::Text(name) => out.push(name.clone()),
            Self::Space(_) => {}
            Self::Fraction { num, den, .. } => {
                num.collect_leaves(out);
                den.collect_leaves(out);
            }
            Self::Sqrt(body) => body.collect_leaves(out),
            Self::Root { base, index } => {
                index.collect_leaves(out);
                base.collect_leaves(out);
            }
            Self::Scripts { base, sub, sup, .. } => {
                base.collect_leaves(out);
                if let Some(sub) = sub {
                    sub.collect_leaves(out);
                }
                if let Some(sup) = sup {
                    sup.collect_leaves(out);
                }
            }
            Self::Fenced { open, close, body } => {
                if !open.is_empty() {
                    out.push(open.clone());
                }
                body.collect_leaves(out);
                if !close.is_empty() {
                    out.push(close.clone());
                }
            }
            Self::Colored { body, .. } | Self::Cancel { body, .. } => body.collect_leaves(out),
            Self::Table { rows, .. } => rows
                .iter()
                .flatten()
                .for_each(|cell| cell.collect_leaves(out)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_row_collapses() {
        assert_eq!(MathNode::row(vec![MathNode::ident("x")]), MathNode::ident("x"));
        assert!(MathNode::row(vec![]).is_empty_row());
    }

    #[test]
    fn scripted_function_is_function() {
        let node = MathNode::Scripts {
            base: Box::new(MathNode::Function("sin".into())),
            sub: None,
            sup: Some(Box::new(MathNode::Number("2".into()))),
            limits: false,
        };
        assert!(node.is_function());
        assert_eq!(node.leaf_symbols(), vec!["sin", "2"]);
    }
}
