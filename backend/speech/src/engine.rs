//! Compiled speech engine for one configuration.

use texspeak_core::{
    DescribeError, Description, EngineConfig, EngineInitError, SerializedStructure,
};
use tracing::debug;

use crate::describe::Describer;
use crate::rules::{RuleSet, Templates};

/// Rules resolved for one locale, domain, style and verbosity. Immutable once
/// built and shared behind an `Arc` by [`crate::SpeechEngineState`].
#[derive(Debug)]
pub struct SpeechEngine {
    config: EngineConfig,
    rules: RuleSet,
    templates: Templates,
}

impl SpeechEngine {
    pub fn compile(config: EngineConfig, rules: RuleSet) -> Result<Self, EngineInitError> {
        let domain = rules
            .domain(config.domain)
            .ok_or_else(|| EngineInitError::UnsupportedDomain {
                locale: config.locale.clone(),
                domain: config.domain.to_string(),
            })?;
        let templates =
            Templates::resolve(domain, config.domain, &config.style, config.verbosity)?;
        Ok(Self {
            config,
            rules,
            templates,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn describe(&self, structure: &SerializedStructure) -> Result<Description, DescribeError> {
        self.describe_markup(structure.as_str())
    }

    /// Describes raw MathML. The document must be rooted at a `math` element
    /// in the MathML namespace.
    pub fn describe_markup(&self, mathml: &str) -> Result<Description, DescribeError> {
        let speech = Describer::new(&self.rules, &self.templates).describe(mathml)?;
        debug!(
            domain = %self.config.domain,
            chars = speech.len(),
            "Generated description"
        );
        Ok(Description::new(speech))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texspeak_core::{Domain, Verbosity};
    use texspeak_markup::MathStructureConverter;

    const RESOURCES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../resources/mathmaps");

    fn engine(config: EngineConfig) -> SpeechEngine {
        let raw = std::fs::read_to_string(format!("{RESOURCES}/en.json")).unwrap();
        let rules: RuleSet = serde_json::from_str(&raw).unwrap();
        SpeechEngine::compile(config, rules).unwrap()
    }

    fn clearspeak() -> SpeechEngine {
        engine(EngineConfig::default())
    }

    fn speak(engine: &SpeechEngine, tex: &str) -> String {
        let converter = MathStructureConverter::default();
        let structure = converter.parse(tex, true).unwrap();
        engine.describe(&structure).unwrap().into_string()
    }

    #[test]
    fn pythagorean_identity() {
        assert_eq!(
            speak(&clearspeak(), "x^2 + y^2 = z^2"),
            "x squared plus y squared equals z squared"
        );
    }

    #[test]
    fn capital_letters_and_powers() {
        assert_eq!(speak(&clearspeak(), "E = mc^2"), "upper E equals m c squared");
        assert_eq!(speak(&clearspeak(), "x^5"), "x to the fifth power");
        assert_eq!(speak(&clearspeak(), "x^{n+1}"), "x to the power of n plus 1");
    }

    #[test]
    fn quadratic_formula() {
        let speech = speak(&clearspeak(), r"x = \frac{-b \pm \sqrt{b^2 - 4ac}}{2a}");
        assert_eq!(
            speech,
            "x equals the fraction with numerator negative b plus or minus the square root of \
             b squared minus 4 a c and denominator 2 a"
        );
    }

    #[test]
    fn simple_and_short_fractions() {
        assert_eq!(speak(&clearspeak(), r"\frac{1}{2}"), "one half");
        assert_eq!(speak(&clearspeak(), r"\frac{3}{4}"), "three fourths");
        assert_eq!(speak(&clearspeak(), r"\frac{a}{b}"), "a over b");
    }

    #[test]
    fn integral_with_limits() {
        let speech = speak(&clearspeak(), r"\int_0^\infty e^{-x^2} dx");
        assert_eq!(
            speech,
            "the integral from 0 to infinity of e to the power of negative x squared d x"
        );
    }

    #[test]
    fn sum_and_limit() {
        assert_eq!(
            speak(&clearspeak(), r"\sum_{i=1}^{n} i"),
            "the sum from i equals 1 to n of i"
        );
        assert_eq!(
            speak(&clearspeak(), r"\lim_{x \to 0} f(x)"),
            "the limit as x right arrow 0 of f open paren x close paren"
        );
    }

    #[test]
    fn functions_use_spoken_names() {
        assert_eq!(
            speak(&clearspeak(), r"\sin x"),
            "sine x"
        );
    }

    #[test]
    fn matrices_and_binomials() {
        let speech = speak(&clearspeak(), r"\begin{pmatrix} a & b \\ c & d \end{pmatrix}");
        assert_eq!(speech, "the 2 by 2 matrix; row 1: a, b; row 2: c, d");
        assert_eq!(speak(&clearspeak(), r"\binom{n}{k}"), "n choose k");
    }

    #[test]
    fn mathspeak_domain() {
        let engine = engine(EngineConfig::default().with_domain(Domain::Mathspeak));
        assert_eq!(
            speak(&engine, r"\frac{a+b}{c}"),
            "StartFraction a plus b Over c EndFraction"
        );
        assert_eq!(speak(&engine, r"\sqrt{x}"), "StartRoot x EndRoot");
    }

    #[test]
    fn style_changes_fraction_wording() {
        let engine = engine(EngineConfig::default().with_style("over"));
        assert_eq!(speak(&engine, r"\frac{a+b}{c}"), "a plus b over c");
        assert_eq!(speak(&engine, r"\frac{1}{2}"), "one half");
    }

    #[test]
    fn undefined_style_fails_to_compile() {
        let raw = std::fs::read_to_string(format!("{RESOURCES}/en.json")).unwrap();
        let rules: RuleSet = serde_json::from_str(&raw).unwrap();
        let err = SpeechEngine::compile(EngineConfig::default().with_style("fancy"), rules).unwrap_err();
        assert!(matches!(err, EngineInitError::UnsupportedStyle { .. }));
    }

    #[test]
    fn verbose_overrides_templates() {
        let engine = engine(EngineConfig::default().with_verbosity(Verbosity::Verbose));
        assert_eq!(
            speak(&engine, r"\sqrt{x}"),
            "the square root of x end root"
        );
    }

    #[test]
    fn rejects_foreign_documents() {
        let engine = clearspeak();
        assert!(matches!(
            engine.describe_markup("<svg/>"),
            Err(DescribeError::WrongRoot(_))
        ));
        assert!(matches!(
            engine.describe_markup("<math><mi>x</mi></math>"),
            Err(DescribeError::MissingNamespace)
        ));
        assert!(matches!(
            engine.describe_markup("<math"),
            Err(DescribeError::Malformed(_))
        ));
    }

    #[test]
    fn validates_structure() {
        let engine = clearspeak();
        let ns = texspeak_core::MATHML_NAMESPACE;
        let arity = format!(r#"<math xmlns="{ns}"><mfrac><mn>1</mn></mfrac></math>"#);
        assert!(matches!(
            engine.describe_markup(&arity),
            Err(DescribeError::Arity { expected: 2, found: 1, .. })
        ));
        let unknown = format!(r#"<math xmlns="{ns}"><blink>x</blink></math>"#);
        assert!(matches!(
            engine.describe_markup(&unknown),
            Err(DescribeError::UnknownElement(name)) if name == "blink"
        ));
        let empty = format!(r#"<math xmlns="{ns}"><mrow/></math>"#);
        assert!(matches!(engine.describe_markup(&empty), Err(DescribeError::Empty)));
    }
}
