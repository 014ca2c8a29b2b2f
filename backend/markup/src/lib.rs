//! TeX math markup to structural tree and MathML.
//!
//! The structure converter and the graphical renderer both parse through
//! this crate, with the same [`FeatureSet`](texspeak_core::FeatureSet).

pub mod converter;
pub mod lexer;
pub mod macros;
pub mod mathml;
pub mod parser;
pub mod tree;

pub use converter::MathStructureConverter;
pub use mathml::{MathmlWriter, FUNCTION_APPLICATION};
pub use parser::parse;
pub use tree::{CancelKind, MathNode, OpKind, TableKind, Variant};
