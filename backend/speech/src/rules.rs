//! Speech rule resources.
//!
//! A locale's rules live in one JSON file, `<resource_path>/<locale>.json`.
//! The lexicon (symbol names, numbers) is shared by every domain; each domain
//! contributes sentence templates with `{placeholder}` slots, plus optional
//! named style and per-verbosity overrides.

use std::collections::HashMap;

use serde::Deserialize;
use texspeak_core::{Domain, EngineInitError, Verbosity};

/// The style every domain has: its base templates, unmodified.
pub const DEFAULT_STYLE: &str = "default";

/// Templates every domain must provide, after fallbacks are applied.
pub const REQUIRED_TEMPLATES: &[&str] = &[
    "fraction",
    "binomial",
    "sqrt",
    "root",
    "power",
    "subscript",
    "overscript",
    "underscript",
    "large_op",
    "limits_both",
    "limits_lower",
    "limits_upper",
    "matrix",
    "determinant",
    "row",
    "cases",
    "case",
    "crossed_out",
];

/// Optional templates and the template used in their absence.
const FALLBACKS: &[(&str, &str)] = &[
    ("simple_fraction", "fraction"),
    ("short_fraction", "fraction"),
    ("limit_lower", "limits_lower"),
    ("ordinal_power", "power"),
    ("squared", "power"),
    ("cubed", "power"),
    ("cube_root", "root"),
];

#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    pub locale: String,
    #[serde(default = "default_capital")]
    pub capital: String,
    #[serde(default = "default_negative")]
    pub negative: String,
    #[serde(default)]
    pub letters: HashMap<String, String>,
    #[serde(default)]
    pub operators: HashMap<String, String>,
    #[serde(default)]
    pub functions: HashMap<String, String>,
    #[serde(default)]
    pub variants: HashMap<String, String>,
    #[serde(default)]
    pub cardinals: Vec<String>,
    #[serde(default)]
    pub ordinals: Vec<String>,
    /// Denominator → (singular, plural), e.g. `"3": ["third", "thirds"]`.
    #[serde(default)]
    pub denominators: HashMap<String, (String, String)>,
    pub domains: HashMap<String, DomainRules>,
}

fn default_capital() -> String {
    "upper".to_string()
}

fn default_negative() -> String {
    "negative".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainRules {
    pub templates: HashMap<String, String>,
    #[serde(default)]
    pub brief: HashMap<String, String>,
    #[serde(default)]
    pub verbose: HashMap<String, String>,
    /// Named style variants, each a set of template overrides.
    #[serde(default)]
    pub styles: HashMap<String, HashMap<String, String>>,
}

impl DomainRules {
    /// Overrides for `style`; `None` if the domain does not define it.
    pub fn style(&self, style: &str) -> Option<Option<&HashMap<String, String>>> {
        if style == DEFAULT_STYLE {
            return Some(None);
        }
        self.styles.get(style).map(Some)
    }
}

impl RuleSet {
    pub fn domain(&self, domain: Domain) -> Option<&DomainRules> {
        self.domains.get(domain.as_str())
    }

    pub fn cardinal(&self, n: usize) -> Option<&str> {
        self.cardinals.get(n).map(String::as_str)
    }

    pub fn ordinal(&self, n: usize) -> Option<&str> {
        self.ordinals.get(n).map(String::as_str)
    }
}

/// Resolved template table for one domain and verbosity.
#[derive(Debug, Clone)]
pub struct Templates {
    table: HashMap<String, String>,
}

impl Templates {
    /// Layers the style overrides, then the verbosity overrides, over the
    /// domain's base templates and applies fallbacks. Fails on an undefined
    /// style or if a required template is still missing.
    pub fn resolve(
        rules: &DomainRules,
        domain: Domain,
        style: &str,
        verbosity: Verbosity,
    ) -> Result<Self, EngineInitError> {
        let styled = rules
            .style(style)
            .ok_or_else(|| EngineInitError::UnsupportedStyle {
                domain: domain.to_string(),
                style: style.to_string(),
            })?;
        let mut table = rules.templates.clone();
        let overrides = match verbosity {
            Verbosity::Brief => Some(&rules.brief),
            Verbosity::Default => None,
            Verbosity::Verbose => Some(&rules.verbose),
        };
        for (key, value) in styled.into_iter().flatten().chain(overrides.into_iter().flatten()) {
            table.insert(key.clone(), value.clone());
        }
        for (key, fallback) in FALLBACKS {
            if !table.contains_key(*key) {
                if let Some(value) = table.get(*fallback).cloned() {
                    table.insert((*key).to_string(), value);
                }
            }
        }
        for key in REQUIRED_TEMPLATES {
            if !table.contains_key(*key) {
                return Err(EngineInitError::MissingTemplate {
                    domain: domain.to_string(),
                    key: (*key).to_string(),
                });
            }
        }
        Ok(Self { table })
    }

    pub fn has(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Fills `{name}` slots of the template `key`.
    pub fn fill(&self, key: &str, slots: &[(&str, &str)]) -> String {
        let template = self
            .table
            .get(key)
            .map(String::as_str)
            .unwrap_or("{body}");
        fill(template, slots)
    }
}

/// Replaces each `{name}` in `template` with its slot value. Unknown slots
/// are left as-is.
pub fn fill(template: &str, slots: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match slots.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
