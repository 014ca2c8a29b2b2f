//! Box layout of the structural tree.
//!
//! Coordinates are in 1000 units per em, y grows downward and each box's
//! baseline is at y = 0. `height` extends above the baseline, `depth` below.

use texspeak_markup::{CancelKind, MathNode, OpKind, TableKind, Variant};

use crate::metrics::{GlyphCache, GlyphKey};

/// Height of the math axis above the baseline; fractions and fences center on it.
const AXIS: f64 = 250.0;
const RULE: f64 = 60.0;
const SCRIPT_RATIO: f64 = 0.707;
const MIN_SCALE: f64 = 0.5;
const DISPLAY_OP_RATIO: f64 = 1.4;

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Glyph {
        key: GlyphKey,
        x: f64,
        y: f64,
        scale: f64,
        /// Extra vertical stretch for fences and radicals.
        stretch: f64,
    },
    Rule {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        thickness: f64,
    },
    Group {
        color: String,
        items: Vec<Item>,
    },
}

impl Item {
    fn shift(&mut self, dx: f64, dy: f64) {
        match self {
            Item::Glyph { x, y, .. } | Item::Rule { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Item::Line { x1, y1, x2, y2, .. } => {
                *x1 += dx;
                *x2 += dx;
                *y1 += dy;
                *y2 += dy;
            }
            Item::Group { items, .. } => {
                for item in items {
                    item.shift(dx, dy);
                }
            }
        }
    }

    /// Every glyph key in this item, in drawing order.
    pub fn glyphs<'a>(&'a self, out: &mut Vec<&'a GlyphKey>) {
        match self {
            Item::Glyph { key, .. } => out.push(key),
            Item::Group { items, .. } => {
                for item in items {
                    item.glyphs(out);
                }
            }
            Item::Rule { .. } | Item::Line { .. } => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutBox {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
    pub items: Vec<Item>,
}

impl LayoutBox {
    fn place(&mut self, child: LayoutBox, dx: f64, dy: f64) {
        for mut item in child.items {
            item.shift(dx, dy);
            self.items.push(item);
        }
    }

    /// Appends `child` on the baseline at the current right edge.
    fn append(&mut self, child: LayoutBox) {
        let x = self.width;
        self.width += child.width;
        self.height = self.height.max(child.height);
        self.depth = self.depth.max(child.depth);
        self.place(child, x, 0.0);
    }

    fn kern(&mut self, amount: f64) {
        self.width += amount;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub scale: f64,
    pub display: bool,
}

impl Style {
    pub fn root(display: bool) -> Self {
        Self {
            scale: 1.0,
            display,
        }
    }

    fn script(self) -> Self {
        Self {
            scale: (self.scale * SCRIPT_RATIO).max(MIN_SCALE),
            display: false,
        }
    }

    fn text(self) -> Self {
        Self {
            display: false,
            ..self
        }
    }

    fn u(self, units: f64) -> f64 {
        units * self.scale
    }
}

pub struct Layouter<'c> {
    cache: &'c GlyphCache,
}

impl<'c> Layouter<'c> {
    pub fn new(cache: &'c GlyphCache) -> Self {
        Self { cache }
    }

    pub fn layout(&self, node: &MathNode, style: Style) -> LayoutBox {
        match node {
            MathNode::Row(children) => self.row(children, style),
            MathNode::Identifier { name, variant } => {
                let variant = variant.unwrap_or_else(|| {
                    if name.chars().count() == 1 {
                        Variant::Italic
                    } else {
                        Variant::Normal
                    }
                });
                self.glyphs(name, variant, style)
            }
            MathNode::Number(text) | MathNode::Function(text) | MathNode::Text(text) => {
                self.glyphs(text, Variant::Normal, style)
            }
            MathNode::Operator { symbol, kind } => self.operator(symbol, *kind, style),
            MathNode::Space(width) => LayoutBox {
                width: style.u(f64::from(*width)),
                ..Default::default()
            },
            MathNode::Fraction { num, den, bar } => self.fraction(num, den, *bar, style),
            MathNode::Sqrt(body) => self.radical(self.layout(body, style), style),
            MathNode::Root { base, index } => self.root(base, index, style),
            MathNode::Scripts {
                base,
                sub,
                sup,
                limits,
            } => self.scripts(base, sub.as_deref(), sup.as_deref(), *limits, style),
            MathNode::Fenced { open, close, body } => self.fenced(open, close, body, style),
            MathNode::Colored { color, body } => {
                let inner = self.layout(body, style);
                LayoutBox {
                    width: inner.width,
                    height: inner.height,
                    depth: inner.depth,
                    items: vec![Item::Group {
                        color: color.clone(),
                        items: inner.items,
                    }],
                }
            }
            MathNode::Cancel { kind, body } => self.cancel(*kind, body, style),
            MathNode::Table { kind, rows } => self.table(*kind, rows, style),
        }
    }

    fn row(&self, children: &[MathNode], style: Style) -> LayoutBox {
        let mut out = LayoutBox::default();
        for (i, child) in children.iter().enumerate() {
            let (before, after) = match child {
                MathNode::Operator { kind, .. } if style.scale >= 1.0 => match kind {
                    OpKind::Binary if i > 0 => (222.0, 222.0),
                    OpKind::Relation => (278.0, 278.0),
                    OpKind::Punct => (0.0, 167.0),
                    OpKind::Large => (0.0, 167.0),
                    _ => (0.0, 0.0),
                },
                _ => (0.0, 0.0),
            };
            out.kern(style.u(before));
            out.append(self.layout(child, style));
            out.kern(style.u(after));
        }
        out
    }

    fn glyphs(&self, text: &str, variant: Variant, style: Style) -> LayoutBox {
        let mut out = LayoutBox::default();
        for ch in text.chars() {
            let key = GlyphKey::new(ch, variant);
            let m = self.cache.metrics(key);
            if !ch.is_whitespace() {
                out.items.push(Item::Glyph {
                    key,
                    x: out.width,
                    y: 0.0,
                    scale: style.scale,
                    stretch: 1.0,
                });
            }
            out.width += style.u(m.advance);
            out.height = out.height.max(style.u(m.height));
            out.depth = out.depth.max(style.u(m.depth));
        }
        out
    }

    fn operator(&self, symbol: &str, kind: OpKind, style: Style) -> LayoutBox {
        if kind != OpKind::Large || !style.display {
            return self.glyphs(symbol, Variant::Normal, style);
        }
        // Display-size big operator, centered on the axis.
        let big = Style {
            scale: style.scale * DISPLAY_OP_RATIO,
            ..style
        };
        let mut glyph = self.glyphs(symbol, Variant::Normal, big);
        let shift = -style.u(AXIS) + (glyph.height - glyph.depth) / 2.0;
        for item in &mut glyph.items {
            item.shift(0.0, shift);
        }
        let height = glyph.height - shift;
        let depth = glyph.depth + shift;
        glyph.height = height;
        glyph.depth = depth;
        glyph
    }

    fn fraction(&self, num: &MathNode, den: &MathNode, bar: bool, style: Style) -> LayoutBox {
        let inner = if style.display { style.text() } else { style.script() };
        let num = self.layout(num, inner);
        let den = self.layout(den, inner);
        let axis = style.u(AXIS);
        let t = if bar { style.u(RULE) } else { 0.0 };
        let gap = style.u(if style.display { 200.0 } else { 120.0 });
        let pad = style.u(120.0);

        let width = num.width.max(den.width) + 2.0 * pad;
        let num_y = -(axis + t / 2.0 + gap + num.depth);
        let den_y = -axis + t / 2.0 + gap + den.height;

        let mut out = LayoutBox {
            width,
            height: num.height - num_y,
            depth: den_y + den.depth,
            items: Vec::new(),
        };
        if bar {
            out.items.push(Item::Rule {
                x: 0.0,
                y: -(axis + t / 2.0),
                width,
                height: t,
            });
        }
        let num_x = (width - num.width) / 2.0;
        let den_x = (width - den.width) / 2.0;
        out.place(num, num_x, num_y);
        out.place(den, den_x, den_y);
        out
    }

    fn radical(&self, body: LayoutBox, style: Style) -> LayoutBox {
        let surd = GlyphKey::new('√', Variant::Normal);
        let m = self.cache.metrics(surd);
        let t = style.u(RULE);
        let gap = style.u(100.0);
        let total = body.height + gap + t + body.depth;
        let natural = style.u(m.height + m.depth);
        let stretch = (total / natural).max(1.0);
        let surd_w = style.u(m.advance);

        let mut out = LayoutBox {
            width: surd_w + body.width + style.u(60.0),
            height: body.height + gap + t,
            depth: body.depth,
            items: vec![Item::Glyph {
                key: surd,
                x: 0.0,
                y: body.depth - style.u(m.depth) * stretch,
                scale: style.scale,
                stretch,
            }],
        };
        out.items.push(Item::Rule {
            x: surd_w,
            y: -(body.height + gap + t),
            width: body.width + style.u(60.0),
            height: t,
        });
        out.place(body, surd_w, 0.0);
        out
    }

    fn root(&self, base: &MathNode, index: &MathNode, style: Style) -> LayoutBox {
        let radical = self.radical(self.layout(base, style), style);
        let index = self.layout(index, style.script().script());
        let surd_w = style.u(self.cache.metrics(GlyphKey::new('√', Variant::Normal)).advance);
        let offset = (index.width - 0.5 * surd_w).max(0.0);
        let index_y = -(radical.height * 0.6) - index.depth;

        let mut out = LayoutBox {
            width: offset + radical.width,
            height: radical.height.max(index.height - index_y),
            depth: radical.depth,
            items: Vec::new(),
        };
        out.place(index, 0.0, index_y);
        out.place(radical, offset, 0.0);
        out
    }

    fn scripts(
        &self,
        base: &MathNode,
        sub: Option<&MathNode>,
        sup: Option<&MathNode>,
        limits: bool,
        style: Style,
    ) -> LayoutBox {
        let base = self.layout(base, style);
        let script_style = style.script();
        let sub = sub.map(|n| self.layout(n, script_style));
        let sup = sup.map(|n| self.layout(n, script_style));

        if limits && style.display {
            return self.limits(base, sub, sup, style);
        }

        let mut out = LayoutBox {
            width: base.width,
            height: base.height,
            depth: base.depth,
            items: Vec::new(),
        };
        let x = base.width;
        out.place(base, 0.0, 0.0);

        let sup_y = sup
            .as_ref()
            .map(|s| -(out.height - style.u(250.0)).max(style.u(413.0)).max(s.depth + style.u(110.0)));
        let mut sub_y = sub
            .as_ref()
            .map(|s| (out.depth + style.u(50.0)).max(style.u(150.0)).max(s.height - style.u(350.0)));
        if let (Some(up), Some(down), Some(sup_box), Some(sub_box)) =
            (sup_y, sub_y, sup.as_ref(), sub.as_ref())
        {
            let clearance = (down - sub_box.height) - (up + sup_box.depth);
            let min_gap = style.u(4.0 * RULE);
            if clearance < min_gap {
                sub_y = Some(down + (min_gap - clearance));
            }
        }
        let space = style.u(50.0);
        let mut width = 0.0f64;
        if let (Some(sup), Some(y)) = (sup, sup_y) {
            width = width.max(sup.width);
            out.height = out.height.max(sup.height - y);
            out.place(sup, x, y);
        }
        if let (Some(sub), Some(y)) = (sub, sub_y) {
            width = width.max(sub.width);
            out.depth = out.depth.max(sub.depth + y);
            out.place(sub, x, y);
        }
        out.width = x + width + space;
        out
    }

    fn limits(
        &self,
        base: LayoutBox,
        under: Option<LayoutBox>,
        over: Option<LayoutBox>,
        style: Style,
    ) -> LayoutBox {
        let gap = style.u(150.0);
        let width = [
            Some(base.width),
            under.as_ref().map(|b| b.width),
            over.as_ref().map(|b| b.width),
        ]
        .into_iter()
        .flatten()
        .fold(0.0f64, f64::max);

        let mut out = LayoutBox {
            width,
            height: base.height,
            depth: base.depth,
            items: Vec::new(),
        };
        let (base_h, base_d) = (base.height, base.depth);
        let base_x = (width - base.width) / 2.0;
        out.place(base, base_x, 0.0);
        if let Some(over) = over {
            let y = -(base_h + gap + over.depth);
            out.height = over.height - y;
            let x = (width - over.width) / 2.0;
            out.place(over, x, y);
        }
        if let Some(under) = under {
            let y = base_d + gap + under.height;
            out.depth = y + under.depth;
            let x = (width - under.width) / 2.0;
            out.place(under, x, y);
        }
        out
    }

    fn fenced(&self, open: &str, close: &str, body: &MathNode, style: Style) -> LayoutBox {
        let body = self.layout(body, style);
        let axis = style.u(AXIS);
        let half = (body.height - axis).max(body.depth + axis);

        let mut out = LayoutBox::default();
        if !open.is_empty() {
            out.append(self.delimiter(open, half, style));
        }
        out.append(body);
        if !close.is_empty() {
            out.append(self.delimiter(close, half, style));
        }
        out
    }

    /// A delimiter stretched to cover `half` above and below the axis.
    fn delimiter(&self, symbol: &str, half: f64, style: Style) -> LayoutBox {
        let mut out = LayoutBox::default();
        let axis = style.u(AXIS);
        for ch in symbol.chars() {
            let key = GlyphKey::new(ch, Variant::Normal);
            let m = self.cache.metrics(key);
            let h = style.u(m.height);
            let d = style.u(m.depth);
            let stretch = (2.0 * half / (h + d)).max(1.0);
            let y = -axis + (h - d) * stretch / 2.0;
            out.items.push(Item::Glyph {
                key,
                x: out.width,
                y,
                scale: style.scale,
                stretch,
            });
            out.width += style.u(m.advance);
            out.height = out.height.max(h * stretch - y);
            out.depth = out.depth.max(d * stretch + y);
        }
        out
    }

    fn cancel(&self, kind: CancelKind, body: &MathNode, style: Style) -> LayoutBox {
        let mut out = self.layout(body, style);
        let thickness = style.u(40.0);
        let (w, h, d) = (out.width, out.height, out.depth);
        if matches!(kind, CancelKind::Up | CancelKind::Cross) {
            out.items.push(Item::Line {
                x1: 0.0,
                y1: d,
                x2: w,
                y2: -h,
                thickness,
            });
        }
        if matches!(kind, CancelKind::Down | CancelKind::Cross) {
            out.items.push(Item::Line {
                x1: 0.0,
                y1: -h,
                x2: w,
                y2: d,
                thickness,
            });
        }
        out
    }

    fn table(&self, kind: TableKind, rows: &[Vec<MathNode>], style: Style) -> LayoutBox {
        let cell_style = style.text();
        let cells: Vec<Vec<LayoutBox>> = rows
            .iter()
            .map(|row| row.iter().map(|c| self.layout(c, cell_style)).collect())
            .collect();
        let cols = cells.iter().map(Vec::len).max().unwrap_or(0);
        let mut col_widths = vec![0.0f64; cols];
        for row in &cells {
            for (j, cell) in row.iter().enumerate() {
                col_widths[j] = col_widths[j].max(cell.width);
            }
        }
        let row_metrics: Vec<(f64, f64)> = cells
            .iter()
            .map(|row| {
                row.iter().fold((style.u(750.0), style.u(250.0)), |(h, d), c| {
                    (h.max(c.height), d.max(c.depth))
                })
            })
            .collect();

        let col_gap = style.u(1000.0);
        let row_gap = style.u(200.0);
        let total_height: f64 = row_metrics.iter().map(|(h, d)| h + d).sum::<f64>()
            + row_gap * rows.len().saturating_sub(1) as f64;
        let width: f64 =
            col_widths.iter().sum::<f64>() + col_gap * cols.saturating_sub(1) as f64;
        let top = -style.u(AXIS) - total_height / 2.0;

        let mut out = LayoutBox {
            width,
            height: -top,
            depth: top + total_height,
            items: Vec::new(),
        };
        let mut y = top;
        for (row, (h, d)) in cells.into_iter().zip(row_metrics) {
            let baseline = y + h;
            let mut x = 0.0;
            for (j, cell) in row.into_iter().enumerate() {
                let dx = match kind {
                    TableKind::Matrix => (col_widths[j] - cell.width) / 2.0,
                    TableKind::Cases => 0.0,
                };
                out.place(cell, x + dx, baseline);
                x += col_widths[j] + col_gap;
            }
            y = baseline + d + row_gap;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texspeak_core::FeatureSet;

    fn layout(src: &str, display: bool) -> LayoutBox {
        let cache = GlyphCache::new(256);
        let tree = texspeak_markup::parse(src, &FeatureSet::default()).unwrap();
        Layouter::new(&cache).layout(&tree, Style::root(display))
    }

    fn glyph_chars(b: &LayoutBox) -> String {
        let mut keys = Vec::new();
        for item in &b.items {
            item.glyphs(&mut keys);
        }
        keys.into_iter().map(|k| k.ch).collect()
    }

    #[test]
    fn row_places_glyphs_left_to_right() {
        let b = layout("x+y", true);
        assert_eq!(glyph_chars(&b), "x+y");
        let xs: Vec<f64> = b
            .items
            .iter()
            .filter_map(|i| match i {
                Item::Glyph { x, .. } => Some(*x),
                _ => None,
            })
            .collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!(b.width > 0.0 && b.height > 0.0);
    }

    #[test]
    fn fraction_stacks_around_a_rule() {
        let b = layout(r"\frac{a}{b}", true);
        assert!(b.items.iter().any(|i| matches!(i, Item::Rule { .. })));
        let ys: Vec<(char, f64)> = b
            .items
            .iter()
            .filter_map(|i| match i {
                Item::Glyph { key, y, .. } => Some((key.ch, *y)),
                _ => None,
            })
            .collect();
        assert!(ys[0].1 < 0.0, "numerator sits above the baseline");
        assert!(ys[1].1 > 0.0, "denominator sits below the baseline");
    }

    #[test]
    fn superscript_is_raised_and_smaller() {
        let b = layout("x^2", true);
        let two = b.items.iter().find_map(|i| match i {
            Item::Glyph { key, y, scale, .. } if key.ch == '2' => Some((*y, *scale)),
            _ => None,
        });
        let (y, scale) = two.unwrap();
        assert!(y < 0.0);
        assert!(scale < 1.0);
    }

    #[test]
    fn display_limits_go_above_and_below() {
        let display = layout(r"\sum_{i=1}^{n} i", true);
        let inline = layout(r"\sum_{i=1}^{n} i", false);
        assert!(display.height > inline.height);
        assert!(display.depth > inline.depth);
    }

    #[test]
    fn fences_stretch_around_tall_content() {
        let b = layout(r"\left( \frac{a}{b} \right)", true);
        let stretches: Vec<f64> = b
            .items
            .iter()
            .filter_map(|i| match i {
                Item::Glyph { key, stretch, .. } if key.ch == '(' || key.ch == ')' => {
                    Some(*stretch)
                }
                _ => None,
            })
            .collect();
        assert_eq!(stretches.len(), 2);
        assert!(stretches.iter().all(|s| *s > 1.0));
    }

    #[test]
    fn colored_content_is_grouped() {
        let b = layout(r"\color{red}{x}", true);
        assert!(matches!(&b.items[0], Item::Group { color, .. } if color == "red"));
    }

    #[test]
    fn matrix_cells_all_render() {
        let b = layout(r"\begin{pmatrix} a & b \\ c & d \end{pmatrix}", true);
        assert_eq!(glyph_chars(&b), "(abcd)");
    }
}
