//! Macro and environment tables, grouped by the package that provides them.

use texspeak_core::Package;

use crate::tree::{CancelKind, OpKind, TableKind, Variant};

#[derive(Debug, Clone, PartialEq)]
pub enum MacroDef {
    /// A letter-like symbol (`\alpha`, `\infty`).
    Symbol(&'static str, Option<Variant>),
    Operator(&'static str, OpKind),
    /// Big operator; `true` when limits sit above/below in display mode.
    LargeOp(&'static str, bool),
    /// Named function; `true` when it takes limits (`\lim`, `\max`).
    Function(&'static str, bool),
    Frac,
    Binom,
    Sqrt,
    Font(Variant),
    Text,
    OperatorName,
    Space(i32),
    Color,
    Cancel(CancelKind),
    Limits(bool),
    Left,
    Right,
    Begin,
    End,
    /// Proof-tree inference macros; take one argument.
    Inference,
}

/// How an environment's rows are fenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvDef {
    pub kind: TableKind,
    pub open: &'static str,
    pub close: &'static str,
}

pub fn lookup(name: &str) -> Option<(Package, MacroDef)> {
    use MacroDef::*;
    use OpKind::*;
    use Package::{Ams, Base, Boldsymbol, Bussproofs};

    let def = match name {
        // Greek, lowercase
        "alpha" => (Base, Symbol("α", None)),
        "beta" => (Base, Symbol("β", None)),
        "gamma" => (Base, Symbol("γ", None)),
        "delta" => (Base, Symbol("δ", None)),
        "epsilon" => (Base, Symbol("ϵ", None)),
        "varepsilon" => (Base, Symbol("ε", None)),
        "zeta" => (Base, Symbol("ζ", None)),
        "eta" => (Base, Symbol("η", None)),
        "theta" => (Base, Symbol("θ", None)),
        "vartheta" => (Base, Symbol("ϑ", None)),
        "iota" => (Base, Symbol("ι", None)),
        "kappa" => (Base, Symbol("κ", None)),
        "lambda" => (Base, Symbol("λ", None)),
        "mu" => (Base, Symbol("μ", None)),
        "nu" => (Base, Symbol("ν", None)),
        "xi" => (Base, Symbol("ξ", None)),
        "pi" => (Base, Symbol("π", None)),
        "rho" => (Base, Symbol("ρ", None)),
        "sigma" => (Base, Symbol("σ", None)),
        "tau" => (Base, Symbol("τ", None)),
        "upsilon" => (Base, Symbol("υ", None)),
        "phi" => (Base, Symbol("ϕ", None)),
        "varphi" => (Base, Symbol("φ", None)),
        "chi" => (Base, Symbol("χ", None)),
        "psi" => (Base, Symbol("ψ", None)),
        "omega" => (Base, Symbol("ω", None)),
        // Greek, uppercase (upright)
        "Gamma" => (Base, Symbol("Γ", Some(Variant::Normal))),
        "Delta" => (Base, Symbol("Δ", Some(Variant::Normal))),
        "Theta" => (Base, Symbol("Θ", Some(Variant::Normal))),
        "Lambda" => (Base, Symbol("Λ", Some(Variant::Normal))),
        "Xi" => (Base, Symbol("Ξ", Some(Variant::Normal))),
        "Pi" => (Base, Symbol("Π", Some(Variant::Normal))),
        "Sigma" => (Base, Symbol("Σ", Some(Variant::Normal))),
        "Phi" => (Base, Symbol("Φ", Some(Variant::Normal))),
        "Psi" => (Base, Symbol("Ψ", Some(Variant::Normal))),
        "Omega" => (Base, Symbol("Ω", Some(Variant::Normal))),
        // Letter-like
        "infty" => (Base, Symbol("∞", Some(Variant::Normal))),
        "partial" => (Base, Symbol("∂", Some(Variant::Normal))),
        "nabla" => (Base, Symbol("∇", Some(Variant::Normal))),
        "hbar" => (Base, Symbol("ℏ", None)),
        "ell" => (Base, Symbol("ℓ", None)),
        "emptyset" => (Base, Symbol("∅", Some(Variant::Normal))),
        "prime" => (Base, Operator("′", Ordinary)),
        // Binary operators
        "pm" => (Base, Operator("±", Binary)),
        "mp" => (Base, Operator("∓", Binary)),
        "times" => (Base, Operator("×", Binary)),
        "cdot" => (Base, Operator("⋅", Binary)),
        "div" => (Base, Operator("÷", Binary)),
        "ast" => (Base, Operator("∗", Binary)),
        "circ" => (Base, Operator("∘", Binary)),
        "cup" => (Base, Operator("∪", Binary)),
        "cap" => (Base, Operator("∩", Binary)),
        "setminus" => (Base, Operator("∖", Binary)),
        "oplus" => (Base, Operator("⊕", Binary)),
        "otimes" => (Base, Operator("⊗", Binary)),
        "wedge" | "land" => (Base, Operator("∧", Binary)),
        "vee" | "lor" => (Base, Operator("∨", Binary)),
        // Relations
        "le" | "leq" => (Base, Operator("≤", Relation)),
        "ge" | "geq" => (Base, Operator("≥", Relation)),
        "leqslant" => (Ams, Operator("⩽", Relation)),
        "geqslant" => (Ams, Operator("⩾", Relation)),
        "ne" | "neq" => (Base, Operator("≠", Relation)),
        "approx" => (Base, Operator("≈", Relation)),
        "equiv" => (Base, Operator("≡", Relation)),
        "sim" => (Base, Operator("∼", Relation)),
        "simeq" => (Base, Operator("≃", Relation)),
        "propto" => (Base, Operator("∝", Relation)),
        "in" => (Base, Operator("∈", Relation)),
        "notin" => (Base, Operator("∉", Relation)),
        "subset" => (Base, Operator("⊂", Relation)),
        "subseteq" => (Base, Operator("⊆", Relation)),
        "supset" => (Base, Operator("⊃", Relation)),
        "to" | "rightarrow" => (Base, Operator("→", Relation)),
        "leftarrow" | "gets" => (Base, Operator("←", Relation)),
        "Rightarrow" | "implies" => (Base, Operator("⇒", Relation)),
        "Leftrightarrow" | "iff" => (Base, Operator("⇔", Relation)),
        "mapsto" => (Base, Operator("↦", Relation)),
        "mid" => (Base, Operator("∣", Relation)),
        // Punctuation and fences
        "ldots" | "dots" => (Base, Operator("…", Ordinary)),
        "cdots" => (Base, Operator("⋯", Ordinary)),
        "{" | "lbrace" => (Base, Operator("{", Open)),
        "}" | "rbrace" => (Base, Operator("}", Close)),
        "langle" => (Base, Operator("⟨", Open)),
        "rangle" => (Base, Operator("⟩", Close)),
        "|" => (Base, Operator("‖", Ordinary)),
        "forall" => (Base, Operator("∀", Ordinary)),
        "exists" => (Base, Operator("∃", Ordinary)),
        "neg" | "lnot" => (Base, Operator("¬", Ordinary)),
        // Big operators
        "sum" => (Base, LargeOp("∑", true)),
        "prod" => (Base, LargeOp("∏", true)),
        "coprod" => (Base, LargeOp("∐", true)),
        "bigcup" => (Base, LargeOp("⋃", true)),
        "bigcap" => (Base, LargeOp("⋂", true)),
        "int" => (Base, LargeOp("∫", false)),
        "oint" => (Base, LargeOp("∮", false)),
        "iint" => (Ams, LargeOp("∬", false)),
        "iiint" => (Ams, LargeOp("∭", false)),
        // Functions
        "sin" => (Base, Function("sin", false)),
        "cos" => (Base, Function("cos", false)),
        "tan" => (Base, Function("tan", false)),
        "cot" => (Base, Function("cot", false)),
        "sec" => (Base, Function("sec", false)),
        "csc" => (Base, Function("csc", false)),
        "arcsin" => (Base, Function("arcsin", false)),
        "arccos" => (Base, Function("arccos", false)),
        "arctan" => (Base, Function("arctan", false)),
        "sinh" => (Base, Function("sinh", false)),
        "cosh" => (Base, Function("cosh", false)),
        "tanh" => (Base, Function("tanh", false)),
        "log" => (Base, Function("log", false)),
        "ln" => (Base, Function("ln", false)),
        "exp" => (Base, Function("exp", false)),
        "det" => (Base, Function("det", true)),
        "gcd" => (Base, Function("gcd", true)),
        "lim" => (Base, Function("lim", true)),
        "max" => (Base, Function("max", true)),
        "min" => (Base, Function("min", true)),
        "sup" => (Base, Function("sup", true)),
        "inf" => (Base, Function("inf", true)),
        // Structure
        "frac" => (Base, Frac),
        "dfrac" | "tfrac" => (Ams, Frac),
        "binom" => (Ams, Binom),
        "sqrt" => (Base, Sqrt),
        "left" => (Base, Left),
        "right" => (Base, Right),
        "begin" => (Base, Begin),
        "end" => (Base, End),
        "limits" => (Base, Limits(true)),
        "nolimits" => (Base, Limits(false)),
        // Fonts and text
        "mathrm" => (Base, Font(Variant::Normal)),
        "mathit" => (Base, Font(Variant::Italic)),
        "mathbf" => (Base, Font(Variant::Bold)),
        "mathsf" => (Base, Font(Variant::SansSerif)),
        "mathtt" => (Base, Font(Variant::Monospace)),
        "mathcal" => (Base, Font(Variant::Script)),
        "mathbb" => (Ams, Font(Variant::DoubleStruck)),
        "mathfrak" => (Ams, Font(Variant::Fraktur)),
        "boldsymbol" => (Boldsymbol, Font(Variant::BoldItalic)),
        "text" | "textrm" | "mbox" => (Base, Text),
        "operatorname" => (Ams, OperatorName),
        // Spacing
        "," => (Base, Space(167)),
        ":" | ">" => (Base, Space(222)),
        ";" => (Base, Space(278)),
        "!" => (Base, Space(-167)),
        " " => (Base, Space(250)),
        "quad" => (Base, Space(1000)),
        "qquad" => (Base, Space(2000)),
        // Extensions
        "color" | "textcolor" => (Package::Color, Color),
        "cancel" => (Package::Cancel, Cancel(CancelKind::Up)),
        "bcancel" => (Package::Cancel, Cancel(CancelKind::Down)),
        "xcancel" => (Package::Cancel, Cancel(CancelKind::Cross)),
        "AxiomC" | "UnaryInfC" | "BinaryInfC" | "TrinaryInfC" | "LeftLabel" | "RightLabel" => {
            (Bussproofs, Inference)
        }
        _ => return None,
    };
    Some(def)
}

pub fn lookup_env(name: &str) -> Option<(Package, EnvDef)> {
    let matrix = |open, close| EnvDef {
        kind: TableKind::Matrix,
        open,
        close,
    };
    let def = match name {
        "matrix" => (Package::Ams, matrix("", "")),
        "pmatrix" => (Package::Ams, matrix("(", ")")),
        "bmatrix" => (Package::Ams, matrix("[", "]")),
        "Bmatrix" => (Package::Ams, matrix("{", "}")),
        "vmatrix" => (Package::Ams, matrix("|", "|")),
        "Vmatrix" => (Package::Ams, matrix("‖", "‖")),
        "cases" => (
            Package::Ams,
            EnvDef {
                kind: TableKind::Cases,
                open: "{",
                close: "",
            },
        ),
        "prooftree" => (Package::Bussproofs, matrix("", "")),
        _ => return None,
    };
    Some(def)
}

/// Classifies a bare source character that is not a letter or digit.
pub fn char_operator(c: char) -> Option<(&'static str, OpKind)> {
    let op = match c {
        '+' => ("+", OpKind::Binary),
        '-' => ("−", OpKind::Binary),
        '*' => ("∗", OpKind::Binary),
        '=' => ("=", OpKind::Relation),
        '<' => ("<", OpKind::Relation),
        '>' => (">", OpKind::Relation),
        ':' => (":", OpKind::Relation),
        ',' => (",", OpKind::Punct),
        ';' => (";", OpKind::Punct),
        '.' => (".", OpKind::Punct),
        '!' => ("!", OpKind::Ordinary),
        '?' => ("?", OpKind::Ordinary),
        '/' => ("/", OpKind::Ordinary),
        '|' => ("|", OpKind::Ordinary),
        '(' => ("(", OpKind::Open),
        '[' => ("[", OpKind::Open),
        ')' => (")", OpKind::Close),
        ']' => ("]", OpKind::Close),
        _ => return None,
    };
    Some(op)
}

/// Resolves the token after `\left`/`\right` to a delimiter. `.` is the
/// empty delimiter.
pub fn delimiter(token: &str) -> Option<&'static str> {
    let d = match token {
        "." => "",
        "(" => "(",
        ")" => ")",
        "[" | "lbrack" => "[",
        "]" | "rbrack" => "]",
        "{" | "lbrace" => "{",
        "}" | "rbrace" => "}",
        "|" | "vert" | "lvert" | "rvert" => "|",
        "‖" | "Vert" | "lVert" | "rVert" => "‖",
        "langle" => "⟨",
        "rangle" => "⟩",
        "lfloor" => "⌊",
        "rfloor" => "⌋",
        "lceil" => "⌈",
        "rceil" => "⌉",
        "/" => "/",
        _ => return None,
    };
    Some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_macros_belong_to_bussproofs() {
        let (pkg, def) = lookup("AxiomC").unwrap();
        assert_eq!(pkg, Package::Bussproofs);
        assert_eq!(def, MacroDef::Inference);
    }

    #[test]
    fn matrix_environments_are_fenced() {
        let (_, env) = lookup_env("pmatrix").unwrap();
        assert_eq!((env.open, env.close), ("(", ")"));
        assert!(lookup_env("tabular").is_none());
    }

    #[test]
    fn minus_maps_to_unicode_minus() {
        assert_eq!(char_operator('-'), Some(("−", OpKind::Binary)));
        assert_eq!(delimiter("."), Some(""));
    }
}
