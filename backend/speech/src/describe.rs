//! MathML → natural-language description.
//!
//! The input may come from outside the workspace, so the walker checks the
//! element vocabulary and arity instead of trusting the serializer.

use roxmltree::{Document, Node};
use texspeak_core::{DescribeError, MATHML_NAMESPACE};

use crate::rules::{RuleSet, Templates};

type Result<T> = std::result::Result<T, DescribeError>;

const FUNCTION_APPLICATION: &str = "\u{2061}";
const LARGE_OPERATORS: &[&str] = &["∑", "∏", "∐", "⋃", "⋂", "∫", "∬", "∭", "∮"];
const LIMIT_FUNCTIONS: &[&str] = &["lim", "max", "min", "sup", "inf", "det", "gcd"];
const CLOSING: &[&str] = &[")", "]", "}", "⟩", "⌋", "⌉", "|", "‖", "!", "′"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableContext {
    Matrix,
    Determinant,
    Cases,
}

pub(crate) struct Describer<'e> {
    rules: &'e RuleSet,
    templates: &'e Templates,
}

impl<'e> Describer<'e> {
    pub(crate) fn new(rules: &'e RuleSet, templates: &'e Templates) -> Self {
        Self { rules, templates }
    }

    pub(crate) fn describe(&self, mathml: &str) -> Result<String> {
        let doc = Document::parse(mathml).map_err(|e| DescribeError::Malformed(e.to_string()))?;
        let root = doc.root_element();
        let tag = root.tag_name();
        if tag.name() != "math" {
            return Err(DescribeError::WrongRoot(tag.name().to_string()));
        }
        if tag.namespace() != Some(MATHML_NAMESPACE) {
            return Err(DescribeError::MissingNamespace);
        }

        let speech = normalize(&self.row(&elements(root))?);
        if speech.is_empty() {
            return Err(DescribeError::Empty);
        }
        Ok(speech)
    }

    fn speak(&self, node: Node) -> Result<String> {
        let name = node.tag_name().name();
        let children = elements(node);
        match name {
            "mrow" | "mstyle" | "mpadded" | "mtd" => self.row(&children),
            "mi" => Ok(self.identifier(node)),
            "mn" => Ok(token_text(node)),
            "mo" => Ok(self.operator(&token_text(node))),
            "mtext" => Ok(token_text(node).trim().to_string()),
            "mspace" | "mphantom" => Ok(String::new()),
            "mfrac" => self.fraction(node, &children),
            "msqrt" => {
                let body = self.row(&children)?;
                Ok(self.templates.fill("sqrt", &[("body", body.as_str())]))
            }
            "mroot" => self.root(&children),
            "msub" | "msup" | "msubsup" | "munder" | "mover" | "munderover" => {
                self.scripts(name, &children)
            }
            "menclose" => {
                let body = self.row(&children)?;
                let notation = node.attribute("notation").unwrap_or("");
                if notation.contains("strike") {
                    Ok(self.templates.fill("crossed_out", &[("body", body.as_str())]))
                } else {
                    Ok(body)
                }
            }
            "mtable" => self.table(&children, TableContext::Matrix),
            "semantics" => match children.first() {
                Some(first) => self.speak(*first),
                None => Ok(String::new()),
            },
            other => Err(DescribeError::UnknownElement(other.to_string())),
        }
    }

    fn row(&self, children: &[Node]) -> Result<String> {
        if let Some(speech) = self.fenced(children)? {
            return Ok(speech);
        }

        let mut words: Vec<String> = Vec::with_capacity(children.len());
        let mut prev: Option<Node> = None;
        for child in children {
            if is_mo(*child) {
                let text = token_text(*child);
                if text == FUNCTION_APPLICATION {
                    continue;
                }
                if (text == "−" || text == "-") && is_prefix_position(prev) {
                    words.push(self.rules.negative.clone());
                    prev = Some(*child);
                    continue;
                }
                if is_large_operator(*child) {
                    let op = self.operator(&text);
                    words.push(self.templates.fill("large_op", &[("op", op.as_str())]));
                    prev = Some(*child);
                    continue;
                }
            }
            words.push(self.speak(*child)?);
            prev = Some(*child);
        }
        Ok(words.join(" "))
    }

    /// Rows whose outer operators give the content a specific reading:
    /// binomials, matrices, determinants, cases, absolute values.
    fn fenced(&self, children: &[Node]) -> Result<Option<String>> {
        let (Some(first), Some(last)) = (children.first(), children.last()) else {
            return Ok(None);
        };
        if children.len() < 2 || !is_mo(*first) {
            return Ok(None);
        }
        let open = token_text(*first);

        if children.len() == 2 && open == "{" && is_element(children[1], "mtable") {
            return self.table(&elements(children[1]), TableContext::Cases).map(Some);
        }
        if !is_mo(*last) {
            return Ok(None);
        }
        let close = token_text(*last);
        if children.len() == 3 {
            let middle = children[1];
            if is_element(middle, "mfrac") && middle.attribute("linethickness") == Some("0") {
                return self.fraction(middle, &elements(middle)).map(Some);
            }
            if is_element(middle, "mtable") {
                let context = if open == "|" && close == "|" {
                    TableContext::Determinant
                } else {
                    TableContext::Matrix
                };
                return self.table(&elements(middle), context).map(Some);
            }
        }
        if open == "|" && close == "|" && children.len() >= 3 && self.templates.has("absolute_value") {
            let body = self.row(&children[1..children.len() - 1])?;
            return Ok(Some(
                self.templates.fill("absolute_value", &[("body", body.as_str())]),
            ));
        }
        Ok(None)
    }

    fn identifier(&self, node: Node) -> String {
        let text = token_text(node);
        let spoken = if let Some(name) = self.rules.functions.get(&text) {
            name.clone()
        } else if let Some(name) = self.rules.letters.get(&text) {
            name.clone()
        } else {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_uppercase() => format!("{} {}", self.rules.capital, c),
                _ => text.clone(),
            }
        };
        let prefix = node
            .attribute("mathvariant")
            .and_then(|v| self.rules.variants.get(v))
            .filter(|p| !p.is_empty());
        match prefix {
            Some(prefix) => format!("{prefix} {spoken}"),
            None => spoken,
        }
    }

    fn operator(&self, text: &str) -> String {
        self.rules
            .operators
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }

    fn fraction(&self, node: Node, children: &[Node]) -> Result<String> {
        expect_arity("mfrac", children, 2)?;
        let num = self.speak(children[0])?;
        let den = self.speak(children[1])?;
        if node.attribute("linethickness") == Some("0") {
            return Ok(self.templates.fill("binomial", &[("num", num.as_str()), ("den", den.as_str())]));
        }
        if let (Some(n), Some(d)) = (small_integer(children[0]), small_integer(children[1])) {
            let word = self.rules.cardinal(n);
            let denominator = self.rules.denominators.get(&d.to_string());
            if let (Some(word), Some((singular, plural))) = (word, denominator) {
                let den_word = if n == 1 { singular } else { plural };
                return Ok(self
                    .templates
                    .fill("simple_fraction", &[("num", word), ("den", den_word.as_str())]));
            }
        }
        let key = if is_token(children[0]) && is_token(children[1]) {
            "short_fraction"
        } else {
            "fraction"
        };
        Ok(self.templates.fill(key, &[("num", num.as_str()), ("den", den.as_str())]))
    }

    fn root(&self, children: &[Node]) -> Result<String> {
        expect_arity("mroot", children, 2)?;
        let body = self.speak(children[0])?;
        match small_integer(children[1]) {
            Some(2) => return Ok(self.templates.fill("sqrt", &[("body", body.as_str())])),
            Some(3) => return Ok(self.templates.fill("cube_root", &[("body", body.as_str())])),
            _ => {}
        }
        let index = self.speak(children[1])?;
        let ordinal = small_integer(children[1])
            .and_then(|n| self.rules.ordinal(n))
            .map(str::to_string)
            .unwrap_or_else(|| index.clone());
        Ok(self.templates.fill(
            "root",
            &[("body", body.as_str()), ("index", index.as_str()), ("ordinal", ordinal.as_str())],
        ))
    }

    fn scripts(&self, name: &str, children: &[Node]) -> Result<String> {
        let expected = match name {
            "msubsup" | "munderover" => 3,
            _ => 2,
        };
        expect_arity(name, children, expected)?;
        let base = children[0];

        if is_large_operator(base) || is_limit_function(base) {
            let op = self.speak(base)?;
            return match name {
                "msub" | "munder" => {
                    let lower = self.speak(children[1])?;
                    let key = if is_limit_function(base) { "limit_lower" } else { "limits_lower" };
                    Ok(self.templates.fill(key, &[("op", op.as_str()), ("lower", lower.as_str())]))
                }
                "msup" | "mover" => {
                    let upper = self.speak(children[1])?;
                    Ok(self.templates.fill("limits_upper", &[("op", op.as_str()), ("upper", upper.as_str())]))
                }
                _ => {
                    let lower = self.speak(children[1])?;
                    let upper = self.speak(children[2])?;
                    Ok(self.templates.fill(
                        "limits_both",
                        &[("op", op.as_str()), ("lower", lower.as_str()), ("upper", upper.as_str())],
                    ))
                }
            };
        }

        let base_speech = self.speak(base)?;
        match name {
            "msup" => self.power(base_speech, children[1]),
            "msub" => self.subscript(base_speech, children[1]),
            "msubsup" => {
                let with_sub = self.subscript(base_speech, children[1])?;
                self.power(with_sub, children[2])
            }
            "munder" => self.script("underscript", base_speech, children[1]),
            "mover" => self.script("overscript", base_speech, children[1]),
            _ => {
                let under = self.script("underscript", base_speech, children[1])?;
                self.script("overscript", under, children[2])
            }
        }
    }

    fn subscript(&self, base: String, sub: Node) -> Result<String> {
        let sub = self.speak(sub)?;
        Ok(self.templates.fill("subscript", &[("base", base.as_str()), ("sub", sub.as_str())]))
    }

    fn script(&self, key: &str, base: String, script: Node) -> Result<String> {
        let script = self.speak(script)?;
        Ok(self.templates.fill(key, &[("base", base.as_str()), ("script", script.as_str())]))
    }

    fn power(&self, base: String, exponent: Node) -> Result<String> {
        if is_mo(exponent) {
            let text = token_text(exponent);
            if !text.is_empty() && text.chars().all(|c| c == '′') {
                return Ok(format!("{base} {}", self.operator(&text)));
            }
        }
        let exp = self.speak(exponent)?;
        let n = small_integer(exponent);
        let ordinal = n
            .and_then(|n| self.rules.ordinal(n))
            .map(str::to_string)
            .unwrap_or_else(|| exp.clone());
        let key = match n {
            Some(2) => "squared",
            Some(3) => "cubed",
            Some(n) if self.rules.ordinal(n).is_some() => "ordinal_power",
            _ => "power",
        };
        Ok(self.templates.fill(
            key,
            &[("base", base.as_str()), ("exp", exp.as_str()), ("ordinal", ordinal.as_str())],
        ))
    }

    fn table(&self, rows: &[Node], context: TableContext) -> Result<String> {
        let mut spoken_rows = Vec::with_capacity(rows.len());
        let mut cols = 0usize;
        let row_key = if context == TableContext::Cases { "case" } else { "row" };

        for (i, row) in rows.iter().enumerate() {
            if !is_element(*row, "mtr") {
                return Err(DescribeError::UnknownElement(
                    row.tag_name().name().to_string(),
                ));
            }
            let cells = elements(*row);
            cols = cols.max(cells.len());
            let mut spoken_cells = Vec::with_capacity(cells.len());
            for cell in &cells {
                if !is_element(*cell, "mtd") {
                    return Err(DescribeError::UnknownElement(
                        cell.tag_name().name().to_string(),
                    ));
                }
                spoken_cells.push(normalize(&self.speak(*cell)?));
            }
            let n = (i + 1).to_string();
            let cells = spoken_cells.join(", ");
            spoken_rows.push(self.templates.fill(row_key, &[("n", n.as_str()), ("cells", cells.as_str())]));
        }

        let rows_n = rows.len().to_string();
        let cols_n = cols.to_string();
        let header = match context {
            TableContext::Matrix => self
                .templates
                .fill("matrix", &[("rows", rows_n.as_str()), ("cols", cols_n.as_str())]),
            TableContext::Determinant => self
                .templates
                .fill("determinant", &[("rows", rows_n.as_str()), ("cols", cols_n.as_str())]),
            TableContext::Cases => self.templates.fill("cases", &[("count", rows_n.as_str())]),
        };
        let mut parts = vec![header];
        parts.extend(spoken_rows);
        Ok(parts.join("; "))
    }
}

fn elements<'a, 'i>(node: Node<'a, 'i>) -> Vec<Node<'a, 'i>> {
    node.children().filter(|n| n.is_element()).collect()
}

fn token_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_element(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn is_mo(node: Node) -> bool {
    is_element(node, "mo")
}

fn is_token(node: Node) -> bool {
    matches!(node.tag_name().name(), "mi" | "mn")
}

fn is_large_operator(node: Node) -> bool {
    is_mo(node)
        && (node.attribute("largeop") == Some("true")
            || LARGE_OPERATORS.contains(&token_text(node).as_str()))
}

fn is_limit_function(node: Node) -> bool {
    is_element(node, "mi") && LIMIT_FUNCTIONS.contains(&token_text(node).as_str())
}

/// A minus is a sign, not a subtraction, at the start of a row or after
/// another operator that is not a closing fence or postfix.
fn is_prefix_position(prev: Option<Node>) -> bool {
    match prev {
        None => true,
        Some(prev) if is_mo(prev) => {
            prev.attribute("form") != Some("postfix")
                && !CLOSING.contains(&token_text(prev).as_str())
        }
        Some(_) => false,
    }
}

fn small_integer(node: Node) -> Option<usize> {
    if !is_element(node, "mn") {
        return None;
    }
    token_text(node).parse().ok()
}

fn expect_arity(element: &str, children: &[Node], expected: usize) -> Result<()> {
    if children.len() != expected {
        return Err(DescribeError::Arity {
            element: element.to_string(),
            expected,
            found: children.len(),
        });
    }
    Ok(())
}

fn normalize(speech: &str) -> String {
    speech.split_whitespace().collect::<Vec<_>>().join(" ")
}
