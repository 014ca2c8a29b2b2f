//! Recursive-descent parser from TeX math tokens to a [`MathNode`] tree.

use texspeak_core::{FeatureSet, ParseError};

use crate::lexer::{tokenize, Token, TokenKind};
use crate::macros::{char_operator, delimiter, lookup, lookup_env, MacroDef};
use crate::tree::{MathNode, OpKind, Variant};

type Result<T> = std::result::Result<T, ParseError>;

/// Deepest allowed nesting of rows and atoms. Every later stage walks the
/// tree recursively, so this also bounds the serializer, describer and layout.
pub const MAX_DEPTH: usize = 128;

/// What ends the row currently being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Until {
    Eof,
    Brace,
    Bracket,
    Right,
    Cell,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stop {
    Eof,
    Brace,
    Bracket,
    Right(&'static str),
    CellSep,
    RowSep,
    End(String),
}

/// A parsed atom and whether scripts attached to it become limits.
struct Atom {
    node: MathNode,
    limits: bool,
}

impl Atom {
    fn plain(node: MathNode) -> Self {
        Self {
            node,
            limits: false,
        }
    }
}

/// Parses `source` with the macros of the enabled packages only.
pub fn parse(source: &str, features: &FeatureSet) -> Result<MathNode> {
    if source.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let mut parser = Parser {
        src: source,
        tokens: tokenize(source)?,
        pos: 0,
        depth: 0,
        features,
    };
    let (nodes, _) = parser.parse_row(Until::Eof)?;
    Ok(MathNode::row(nodes))
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    features: &'a FeatureSet,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.src.len(), |t| t.offset)
    }

    fn nested<T>(&mut self, offset: usize, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep { offset });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn parse_row(&mut self, until: Until) -> Result<(Vec<MathNode>, Stop)> {
        self.nested(self.offset(), |p| p.parse_row_items(until))
    }

    fn parse_row_items(&mut self, until: Until) -> Result<(Vec<MathNode>, Stop)> {
        let mut nodes = Vec::new();
        loop {
            let Some(tok) = self.peek().cloned() else {
                return Ok((nodes, Stop::Eof));
            };
            let offset = tok.offset;
            match &tok.kind {
                TokenKind::Close => {
                    if until == Until::Brace {
                        self.pos += 1;
                        return Ok((nodes, Stop::Brace));
                    }
                    return Err(ParseError::UnexpectedClose { offset });
                }
                TokenKind::Char(']') if until == Until::Bracket => {
                    self.pos += 1;
                    return Ok((nodes, Stop::Bracket));
                }
                TokenKind::Amp => {
                    if until != Until::Cell {
                        return Err(misplaced("&", offset));
                    }
                    self.pos += 1;
                    return Ok((nodes, Stop::CellSep));
                }
                TokenKind::Command(name) if name == "\\" => {
                    if until != Until::Cell {
                        return Err(misplaced("\\\\", offset));
                    }
                    self.pos += 1;
                    return Ok((nodes, Stop::RowSep));
                }
                TokenKind::Command(name) if name == "right" => {
                    if until != Until::Right {
                        return Err(misplaced("\\right", offset));
                    }
                    self.pos += 1;
                    let close = self.parse_delimiter("right", offset)?;
                    return Ok((nodes, Stop::Right(close)));
                }
                TokenKind::Command(name) if name == "end" => {
                    if until != Until::Cell {
                        return Err(misplaced("\\end", offset));
                    }
                    self.pos += 1;
                    let env = self.read_raw_arg("end", offset)?;
                    return Ok((nodes, Stop::End(env.trim().to_string())));
                }
                _ => {}
            }
            if let Some(node) = self.parse_scripted()? {
                nodes.push(node);
            }
        }
    }

    fn parse_scripted(&mut self) -> Result<Option<MathNode>> {
        let starts_with_script = matches!(
            self.peek().map(|t| &t.kind),
            Some(TokenKind::Sup | TokenKind::Sub | TokenKind::Prime)
        );
        let atom = if starts_with_script {
            Atom::plain(MathNode::Row(Vec::new()))
        } else {
            match self.parse_atom()? {
                Some(atom) => atom,
                None => return Ok(None),
            }
        };
        self.attach_scripts(atom).map(Some)
    }

    fn attach_scripts(&mut self, atom: Atom) -> Result<MathNode> {
        let Atom { node: base, mut limits } = atom;
        let mut sub: Option<MathNode> = None;
        let mut sup: Option<MathNode> = None;
        let mut sup_is_prime = false;

        while let Some(tok) = self.peek().cloned() {
            let offset = tok.offset;
            match tok.kind {
                TokenKind::Command(ref name) if name == "limits" || name == "nolimits" => {
                    self.pos += 1;
                    limits = name == "limits";
                }
                TokenKind::Sup => {
                    self.pos += 1;
                    let arg = self.parse_argument("^", offset)?;
                    sup = match sup.take() {
                        None => Some(arg),
                        Some(prime) if sup_is_prime => Some(MathNode::Row(vec![prime, arg])),
                        Some(_) => {
                            return Err(ParseError::DoubleScript {
                                kind: "superscript",
                                offset,
                            })
                        }
                    };
                    sup_is_prime = false;
                }
                TokenKind::Sub => {
                    self.pos += 1;
                    if sub.is_some() {
                        return Err(ParseError::DoubleScript {
                            kind: "subscript",
                            offset,
                        });
                    }
                    sub = Some(self.parse_argument("_", offset)?);
                }
                TokenKind::Prime => {
                    if sup.is_some() {
                        return Err(ParseError::DoubleScript {
                            kind: "superscript",
                            offset,
                        });
                    }
                    let mut primes = String::new();
                    while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Prime)) {
                        self.pos += 1;
                        primes.push('′');
                    }
                    sup = Some(MathNode::op(primes, OpKind::Ordinary));
                    sup_is_prime = true;
                }
                _ => break,
            }
        }

        if sub.is_none() && sup.is_none() {
            return Ok(base);
        }
        Ok(MathNode::Scripts {
            base: Box::new(base),
            sub: sub.map(Box::new),
            sup: sup.map(Box::new),
            limits,
        })
    }

    fn parse_atom(&mut self) -> Result<Option<Atom>> {
        self.nested(self.offset(), Self::parse_atom_token)
    }

    fn parse_atom_token(&mut self) -> Result<Option<Atom>> {
        let Some(tok) = self.next() else {
            return Ok(None);
        };
        let offset = tok.offset;
        let node = match tok.kind {
            TokenKind::Char(c) => {
                if let Some((symbol, kind)) = char_operator(c) {
                    MathNode::op(symbol, kind)
                } else if c == '~' {
                    MathNode::Space(250)
                } else if c.is_alphabetic() {
                    MathNode::ident(c.to_string())
                } else {
                    MathNode::Identifier {
                        name: c.to_string(),
                        variant: Some(Variant::Normal),
                    }
                }
            }
            TokenKind::Number(n) => MathNode::Number(n),
            TokenKind::Open => self.parse_group(offset)?,
            TokenKind::Command(name) => return self.parse_command(&name, offset).map(Some),
            TokenKind::Close => return Err(ParseError::UnexpectedClose { offset }),
            TokenKind::Amp => return Err(misplaced("&", offset)),
            TokenKind::Sup => return Err(misplaced("^", offset)),
            TokenKind::Sub => return Err(misplaced("_", offset)),
            TokenKind::Prime => return Err(misplaced("'", offset)),
        };
        Ok(Some(Atom::plain(node)))
    }

    fn parse_group(&mut self, open_offset: usize) -> Result<MathNode> {
        match self.parse_row(Until::Brace)? {
            (nodes, Stop::Brace) => Ok(MathNode::row(nodes)),
            _ => Err(ParseError::UnbalancedGroup {
                offset: open_offset,
            }),
        }
    }

    /// One macro argument: a braced group or a single token. A multi-digit
    /// number contributes only its first digit, as in TeX (`x^23` is `x^{2}3`).
    fn parse_argument(&mut self, name: &str, offset: usize) -> Result<MathNode> {
        let missing = || ParseError::MissingArgument {
            name: name.to_string(),
            offset,
        };
        let Some(tok) = self.next() else {
            return Err(missing());
        };
        match tok.kind {
            TokenKind::Open => self.parse_group(tok.offset),
            TokenKind::Number(digits) => {
                let mut chars = digits.chars();
                let first = chars.next().map(String::from).unwrap_or_default();
                let rest = chars.as_str();
                if !rest.is_empty() {
                    let mut tail = tokenize(rest)?;
                    for t in &mut tail {
                        t.offset += tok.offset + first.len();
                    }
                    self.tokens.splice(self.pos..self.pos, tail);
                }
                Ok(MathNode::Number(first))
            }
            TokenKind::Command(_) | TokenKind::Char(_) => {
                self.pos -= 1;
                match self.parse_atom()? {
                    Some(atom) => Ok(atom.node),
                    None => Err(missing()),
                }
            }
            TokenKind::Close | TokenKind::Amp | TokenKind::Sup | TokenKind::Sub | TokenKind::Prime => {
                Err(missing())
            }
        }
    }

    fn parse_command(&mut self, name: &str, offset: usize) -> Result<Atom> {
        if name == "\\" {
            return Err(misplaced("\\\\", offset));
        }
        let Some((package, def)) = lookup(name) else {
            return Err(ParseError::UnknownMacro {
                name: name.to_string(),
                offset,
            });
        };
        if !self.features.is_enabled(package) {
            return Err(ParseError::DisabledPackage {
                name: name.to_string(),
                package: package.to_string(),
            });
        }

        let node = match def {
            MacroDef::Symbol(symbol, variant) => MathNode::Identifier {
                name: symbol.to_string(),
                variant,
            },
            MacroDef::Operator(symbol, kind) => MathNode::op(symbol, kind),
            MacroDef::LargeOp(symbol, limits) => {
                return Ok(Atom {
                    node: MathNode::op(symbol, OpKind::Large),
                    limits,
                })
            }
            MacroDef::Function(fname, limits) => {
                return Ok(Atom {
                    node: MathNode::Function(fname.to_string()),
                    limits,
                })
            }
            MacroDef::Frac => {
                let num = self.parse_argument(name, offset)?;
                let den = self.parse_argument(name, offset)?;
                MathNode::Fraction {
                    num: Box::new(num),
                    den: Box::new(den),
                    bar: true,
                }
            }
            MacroDef::Binom => {
                let num = self.parse_argument(name, offset)?;
                let den = self.parse_argument(name, offset)?;
                MathNode::Fenced {
                    open: "(".to_string(),
                    close: ")".to_string(),
                    body: Box::new(MathNode::Fraction {
                        num: Box::new(num),
                        den: Box::new(den),
                        bar: false,
                    }),
                }
            }
            MacroDef::Sqrt => {
                if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Char('['))) {
                    let bracket = self.next().map(|t| t.offset).unwrap_or(offset);
                    let index = match self.parse_row(Until::Bracket)? {
                        (nodes, Stop::Bracket) => MathNode::row(nodes),
                        _ => return Err(misplaced("[", bracket)),
                    };
                    let base = self.parse_argument(name, offset)?;
                    MathNode::Root {
                        base: Box::new(base),
                        index: Box::new(index),
                    }
                } else {
                    MathNode::Sqrt(Box::new(self.parse_argument(name, offset)?))
                }
            }
            MacroDef::Font(variant) => apply_variant(self.parse_argument(name, offset)?, variant),
            MacroDef::Text => MathNode::Text(self.read_raw_arg(name, offset)?),
            MacroDef::OperatorName => {
                MathNode::Function(self.read_raw_arg(name, offset)?.trim().to_string())
            }
            MacroDef::Space(width) => MathNode::Space(width),
            MacroDef::Color => {
                let color = self.read_raw_arg(name, offset)?.trim().to_string();
                let body = self.parse_argument(name, offset)?;
                MathNode::Colored {
                    color,
                    body: Box::new(body),
                }
            }
            MacroDef::Cancel(kind) => MathNode::Cancel {
                kind,
                body: Box::new(self.parse_argument(name, offset)?),
            },
            MacroDef::Left => self.parse_left(offset)?,
            MacroDef::Begin => self.parse_environment(offset)?,
            MacroDef::Inference => self.parse_argument(name, offset)?,
            MacroDef::Limits(_) | MacroDef::Right | MacroDef::End => {
                return Err(misplaced(&format!("\\{name}"), offset))
            }
        };
        Ok(Atom::plain(node))
    }

    fn parse_delimiter(&mut self, name: &str, offset: usize) -> Result<&'static str> {
        let Some(tok) = self.next() else {
            return Err(ParseError::MissingArgument {
                name: name.to_string(),
                offset,
            });
        };
        let text = match &tok.kind {
            TokenKind::Char(c) => c.to_string(),
            TokenKind::Command(cmd) => cmd.clone(),
            _ => String::from("?"),
        };
        delimiter(&text).ok_or(ParseError::InvalidDelimiter {
            token: text,
            offset: tok.offset,
        })
    }

    fn parse_left(&mut self, offset: usize) -> Result<MathNode> {
        let open = self.parse_delimiter("left", offset)?;
        match self.parse_row(Until::Right)? {
            (nodes, Stop::Right(close)) => Ok(MathNode::Fenced {
                open: open.to_string(),
                close: close.to_string(),
                body: Box::new(MathNode::row(nodes)),
            }),
            _ => Err(ParseError::MissingRight { offset }),
        }
    }

    fn parse_environment(&mut self, offset: usize) -> Result<MathNode> {
        let name = self.read_raw_arg("begin", offset)?.trim().to_string();
        let Some((package, env)) = lookup_env(&name) else {
            return Err(ParseError::UnknownEnvironment { name, offset });
        };
        if !self.features.is_enabled(package) {
            return Err(ParseError::DisabledPackage {
                name: format!("begin{{{name}}}"),
                package: package.to_string(),
            });
        }

        let mut rows: Vec<Vec<MathNode>> = Vec::new();
        let mut row: Vec<MathNode> = Vec::new();
        loop {
            let (nodes, stop) = self.parse_row(Until::Cell)?;
            row.push(MathNode::row(nodes));
            match stop {
                Stop::CellSep => {}
                Stop::RowSep => rows.push(std::mem::take(&mut row)),
                Stop::End(end) if end == name => {
                    let trailing_empty = row.len() == 1 && row[0].is_empty_row();
                    if !(trailing_empty && !rows.is_empty()) {
                        rows.push(row);
                    }
                    break;
                }
                Stop::End(end) => return Err(misplaced(&format!("\\end{{{end}}}"), offset)),
                _ => return Err(ParseError::MissingEnd { name, offset }),
            }
        }

        let table = MathNode::Table {
            kind: env.kind,
            rows,
        };
        if env.open.is_empty() && env.close.is_empty() {
            return Ok(table);
        }
        Ok(MathNode::Fenced {
            open: env.open.to_string(),
            close: env.close.to_string(),
            body: Box::new(table),
        })
    }

    /// Reads a braced argument verbatim (`\text{...}`, `\begin{...}`).
    fn read_raw_arg(&mut self, name: &str, offset: usize) -> Result<String> {
        let open = match self.next() {
            Some(Token {
                kind: TokenKind::Open,
                offset,
            }) => offset,
            _ => {
                return Err(ParseError::MissingArgument {
                    name: name.to_string(),
                    offset,
                })
            }
        };
        let mut depth = 1usize;
        while let Some(tok) = self.next() {
            match tok.kind {
                TokenKind::Open => depth += 1,
                TokenKind::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.src[open + 1..tok.offset].to_string());
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::UnbalancedGroup { offset: open })
    }
}

fn misplaced(token: &str, offset: usize) -> ParseError {
    ParseError::Misplaced {
        token: token.to_string(),
        offset,
    }
}

/// Applies a font command to every identifier below `node`.
fn apply_variant(node: MathNode, variant: Variant) -> MathNode {
    let boxed = |n: Box<MathNode>| Box::new(apply_variant(*n, variant));
    match node {
        MathNode::Identifier { name, .. } => MathNode::Identifier {
            name,
            variant: Some(variant),
        },
        MathNode::Row(children) => MathNode::Row(
            children
                .into_iter()
                .map(|c| apply_variant(c, variant))
                .collect(),
        ),
        MathNode::Scripts {
            base,
            sub,
            sup,
            limits,
        } => MathNode::Scripts {
            base: boxed(base),
            sub: sub.map(boxed),
            sup: sup.map(boxed),
            limits,
        },
        MathNode::Fraction { num, den, bar } => MathNode::Fraction {
            num: boxed(num),
            den: boxed(den),
            bar,
        },
        MathNode::Sqrt(body) => MathNode::Sqrt(boxed(body)),
        MathNode::Fenced { open, close, body } => MathNode::Fenced {
            open,
            close,
            body: boxed(body),
        },
        MathNode::Colored { color, body } => MathNode::Colored {
            color,
            body: boxed(body),
        },
        MathNode::Cancel { kind, body } => MathNode::Cancel {
            kind,
            body: boxed(body),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TableKind;
    use texspeak_core::Package;

    fn p(src: &str) -> Result<MathNode> {
        parse(src, &FeatureSet::default())
    }

    #[test]
    fn parses_pythagoras() {
        let tree = p("x^2 + y^2 = z^2").unwrap();
        let MathNode::Row(children) = &tree else {
            panic!("expected row, got {tree:?}");
        };
        assert_eq!(children.len(), 5);
        assert!(matches!(&children[0], MathNode::Scripts { sup: Some(_), sub: None, .. }));
        assert_eq!(children[1], MathNode::op("+", OpKind::Binary));
        assert_eq!(children[3], MathNode::op("=", OpKind::Relation));
    }

    #[test]
    fn single_digit_script_argument() {
        let tree = p("x^23").unwrap();
        assert_eq!(tree.leaf_symbols(), vec!["x", "2", "3"]);
    }

    #[test]
    fn unbalanced_fraction_is_rejected() {
        assert_eq!(
            p(r"\frac{1}{2"),
            Err(ParseError::UnbalancedGroup { offset: 8 })
        );
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let braces = format!("{}x{}", "{".repeat(5000), "}".repeat(5000));
        assert!(matches!(p(&braces), Err(ParseError::TooDeep { .. })));

        let sqrts = format!("{}x", r"\sqrt".repeat(500));
        assert!(matches!(p(&sqrts), Err(ParseError::TooDeep { .. })));

        let scripts = format!("{}x{}", "x^{".repeat(500), "}".repeat(500));
        assert!(matches!(p(&scripts), Err(ParseError::TooDeep { .. })));
    }

    #[test]
    fn moderate_nesting_is_accepted() {
        let mut src = "x".to_string();
        for _ in 0..30 {
            src = format!(r"\frac{{{src}}}{{2}}");
        }
        assert!(p(&src).is_ok());
    }

    #[test]
    fn stray_close_is_rejected() {
        assert_eq!(p("x}"), Err(ParseError::UnexpectedClose { offset: 1 }));
    }

    #[test]
    fn unknown_macro_is_rejected() {
        assert!(matches!(
            p(r"\foo x"),
            Err(ParseError::UnknownMacro { ref name, offset: 0 }) if name == "foo"
        ));
    }

    #[test]
    fn denied_package_is_rejected() {
        let err = p(r"\AxiomC{A}").unwrap_err();
        assert_eq!(
            err,
            ParseError::DisabledPackage {
                name: "AxiomC".into(),
                package: "bussproofs".into()
            }
        );
        let all = FeatureSet::all_except(&[]);
        assert!(parse(r"\AxiomC{A}", &all).is_ok());
    }

    #[test]
    fn ams_macros_follow_feature_set() {
        let no_ams = FeatureSet::all_except(&[Package::Ams, Package::Bussproofs]);
        assert!(parse(r"\mathbb{R}", &no_ams).is_err());
        assert!(p(r"\mathbb{R}").is_ok());
    }

    #[test]
    fn double_superscript_is_rejected() {
        assert!(matches!(
            p("x^2^3"),
            Err(ParseError::DoubleScript { kind: "superscript", .. })
        ));
    }

    #[test]
    fn prime_then_superscript_combines() {
        let tree = p("f'^2").unwrap();
        assert_eq!(tree.leaf_symbols(), vec!["f", "′", "2"]);
    }

    #[test]
    fn left_right_fences() {
        let tree = p(r"\left( a + b \right)^2").unwrap();
        let MathNode::Scripts { base, .. } = tree else {
            panic!("expected scripts");
        };
        assert!(matches!(*base, MathNode::Fenced { ref open, ref close, .. } if open == "(" && close == ")"));
        assert_eq!(
            p(r"\left( a"),
            Err(ParseError::MissingRight { offset: 0 })
        );
    }

    #[test]
    fn big_operators_take_limits() {
        let tree = p(r"\sum_{n=1}^{\infty} n").unwrap();
        let MathNode::Row(children) = tree else {
            panic!("expected row");
        };
        assert!(matches!(children[0], MathNode::Scripts { limits: true, .. }));
        let tree = p(r"\int_0^1 x").unwrap();
        let MathNode::Row(children) = tree else {
            panic!("expected row");
        };
        assert!(matches!(children[0], MathNode::Scripts { limits: false, .. }));
    }

    #[test]
    fn sqrt_with_index() {
        let tree = p(r"\sqrt[3]{x}").unwrap();
        assert!(matches!(tree, MathNode::Root { .. }));
    }

    #[test]
    fn matrix_environment() {
        let tree = p(r"\begin{pmatrix} a & b \\ c & d \\ \end{pmatrix}").unwrap();
        let MathNode::Fenced { body, .. } = tree else {
            panic!("expected fenced table");
        };
        let MathNode::Table { rows, kind } = *body else {
            panic!("expected table");
        };
        assert_eq!(kind, TableKind::Matrix);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].len(), 2);
    }

    #[test]
    fn environment_errors() {
        assert!(matches!(
            p(r"\begin{tabular}x\end{tabular}"),
            Err(ParseError::UnknownEnvironment { .. })
        ));
        assert!(matches!(
            p(r"\begin{matrix} a & b"),
            Err(ParseError::MissingEnd { .. })
        ));
        assert!(matches!(p("a & b"), Err(ParseError::Misplaced { .. })));
    }

    #[test]
    fn font_and_text() {
        let tree = p(r"\mathbf{v} \text{ if } x").unwrap();
        let MathNode::Row(children) = tree else {
            panic!("expected row");
        };
        assert_eq!(
            children[0],
            MathNode::Identifier {
                name: "v".into(),
                variant: Some(Variant::Bold)
            }
        );
        assert_eq!(children[1], MathNode::Text(" if ".into()));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(p("   "), Err(ParseError::EmptyInput));
    }
}
