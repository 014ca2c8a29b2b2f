//! Glyph metrics in 1000 units per em.
//!
//! Values approximate a Computer Modern style math font. They are cached
//! per (character, variant) in a process-wide `moka` cache shared by every
//! renderer.

use std::sync::Arc;

use moka::sync::Cache;
use once_cell::sync::Lazy;
use texspeak_markup::Variant;

pub const UNITS_PER_EM: f64 = 1000.0;

const GLYPH_CACHE_CAPACITY: u64 = 4096;

static GLOBAL: Lazy<Arc<GlyphCache>> = Lazy::new(|| Arc::new(GlyphCache::new(GLYPH_CACHE_CAPACITY)));

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    pub advance: f64,
    pub height: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphKey {
    pub ch: char,
    pub variant: Variant,
}

impl GlyphKey {
    pub fn new(ch: char, variant: Variant) -> Self {
        Self { ch, variant }
    }

    /// Stable id used for the glyph's `<defs>` entry.
    pub fn id(&self) -> String {
        format!("TS-{}-{:X}", variant_code(self.variant), u32::from(self.ch))
    }
}

pub struct GlyphCache {
    cache: Cache<GlyphKey, GlyphMetrics>,
}

impl GlyphCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn global() -> Arc<GlyphCache> {
        Arc::clone(&GLOBAL)
    }

    pub fn metrics(&self, key: GlyphKey) -> GlyphMetrics {
        self.cache.get_with(key, || measure(key))
    }

    pub fn contains(&self, key: &GlyphKey) -> bool {
        self.cache.contains_key(key)
    }
}

impl std::fmt::Debug for GlyphCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

pub fn variant_code(variant: Variant) -> &'static str {
    match variant {
        Variant::Normal => "N",
        Variant::Italic => "I",
        Variant::Bold => "B",
        Variant::BoldItalic => "BI",
        Variant::DoubleStruck => "DS",
        Variant::Script => "S",
        Variant::Fraktur => "F",
        Variant::SansSerif => "SS",
        Variant::Monospace => "M",
    }
}

fn measure(key: GlyphKey) -> GlyphMetrics {
    let GlyphKey { ch, variant } = key;
    let (mut advance, height, depth) = match ch {
        '0'..='9' => (500.0, 666.0, 22.0),
        'a'..='z' => (lower_advance(ch), lower_height(ch), lower_depth(ch)),
        'A'..='Z' => (upper_advance(ch), 683.0, 0.0),
        'α'..='ω' => (
            580.0,
            if "βδζθλξ".contains(ch) { 694.0 } else { 442.0 },
            if "βγζημξρςφχψ".contains(ch) { 194.0 } else { 11.0 },
        ),
        'Α'..='Ω' => (750.0, 683.0, 0.0),
        '∑' | '∏' | '∐' | '⋃' | '⋂' => (1056.0, 750.0, 250.0),
        '∫' | '∬' | '∭' | '∮' => (556.0, 805.0, 306.0),
        '√' => (833.0, 800.0, 200.0),
        '(' | ')' | '[' | ']' | '{' | '}' | '⟨' | '⟩' | '⌊' | '⌋' | '⌈' | '⌉' => {
            (389.0, 750.0, 250.0)
        }
        '|' | '‖' => (278.0, 750.0, 250.0),
        ',' | ';' => (278.0, 106.0, 194.0),
        '.' | ':' | '!' => (278.0, 431.0, 0.0),
        '′' => (275.0, 560.0, 0.0),
        ' ' => (250.0, 0.0, 0.0),
        '∞' => (1000.0, 442.0, 11.0),
        c if is_operator_symbol(c) => (778.0, 583.0, 83.0),
        _ => (600.0, 694.0, 0.0),
    };
    match variant {
        Variant::Bold | Variant::BoldItalic => advance *= 1.1,
        Variant::Monospace => advance = 525.0,
        _ => {}
    }
    GlyphMetrics {
        advance,
        height,
        depth,
    }
}

fn lower_advance(ch: char) -> f64 {
    match ch {
        'i' | 'j' | 'l' => 345.0,
        'f' | 't' | 'r' => 430.0,
        'm' => 878.0,
        'w' => 716.0,
        _ => 529.0,
    }
}

fn lower_height(ch: char) -> f64 {
    if "bdfhklt".contains(ch) {
        694.0
    } else {
        442.0
    }
}

fn lower_depth(ch: char) -> f64 {
    if "gjpqy".contains(ch) {
        205.0
    } else {
        11.0
    }
}

fn upper_advance(ch: char) -> f64 {
    match ch {
        'I' => 440.0,
        'J' => 633.0,
        'M' => 970.0,
        'W' => 1048.0,
        _ => 750.0,
    }
}

fn is_operator_symbol(c: char) -> bool {
    matches!(c, '+' | '−' | '-' | '=' | '<' | '>' | '*' | '/' | '±' | '∓' | '×' | '÷' | '·')
        || ('\u{2190}'..='\u{22FF}').contains(&c)
}
