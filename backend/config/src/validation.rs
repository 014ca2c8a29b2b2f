//! Config validation: checks with field paths and user-facing messages.

use std::path::Path;

use texspeak_core::Package;
use thiserror::Error;

use crate::schema::{parse_domain, parse_verbosity, TexspeakConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &TexspeakConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_engine(config, &mut report);
    validate_features(config, &mut report);
    validate_batch(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_engine(config: &TexspeakConfig, report: &mut ValidationReport) {
    let Some(engine) = &config.engine else { return };
    if let Some(locale) = &engine.locale {
        if locale.trim().is_empty() {
            report.error("engine.locale", "Locale cannot be empty");
        }
    }
    if let Some(domain) = &engine.domain {
        if parse_domain(domain).is_none() {
            report.error(
                "engine.domain",
                format!("Unknown domain '{domain}'. Use 'clearspeak' or 'mathspeak'"),
            );
        }
    }
    if let Some(verbosity) = &engine.verbosity {
        if parse_verbosity(verbosity).is_none() {
            report.error(
                "engine.verbosity",
                format!("Unknown verbosity '{verbosity}'. Use 'brief', 'default', or 'verbose'"),
            );
        }
    }
    if let Some(style) = &engine.style {
        if style != "default" {
            report.warn(
                "engine.style",
                format!("Style '{style}' must be defined by the rule file or engine initialization fails"),
            );
        }
    }
    if engine.load_timeout_secs == Some(0) {
        report.error("engine.loadTimeoutSecs", "loadTimeoutSecs must be >= 1");
    }
    if let (Some(dir), Some(locale)) = (&engine.resource_path, &engine.locale) {
        let file = Path::new(dir).join(format!("{locale}.json"));
        if !file.exists() {
            report.warn(
                "engine.resourcePath",
                format!("No rule file at {}; engine initialization will fail", file.display()),
            );
        }
    }
}

fn validate_features(config: &TexspeakConfig, report: &mut ValidationReport) {
    let Some(deny) = config.features.as_ref().and_then(|f| f.deny.as_ref()) else {
        return;
    };
    for (i, name) in deny.iter().enumerate() {
        match name.parse::<Package>() {
            Ok(Package::Base) => {
                report.warn(format!("features.deny[{i}]"), "The base package is always enabled")
            }
            Ok(_) => {}
            Err(e) => report.error(format!("features.deny[{i}]"), e),
        }
    }
    if !deny.iter().any(|p| p == "bussproofs") {
        report.warn(
            "features.deny",
            "bussproofs is enabled; proof trees have no MathML structure and will fail to convert",
        );
    }
}

fn validate_batch(config: &TexspeakConfig, report: &mut ValidationReport) {
    let Some(batch) = &config.batch else { return };
    if batch.max_concurrency == Some(0) {
        report.error("batch.maxConcurrency", "maxConcurrency must be >= 1");
    }
}

fn validate_logging(config: &TexspeakConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.error(
                "logging.level",
                format!("Unknown log level '{level}'. Use one of {}", LOG_LEVELS.join(", ")),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{BatchSection, EngineSection, FeaturesSection};

    #[test]
    fn defaulted_config_has_no_errors() {
        let report = validate(&apply_all_defaults(TexspeakConfig::default()));
        assert!(report.is_valid(), "errors: {:?}", report.errors);
    }

    #[test]
    fn unknown_domain_and_zero_concurrency_are_errors() {
        let cfg = TexspeakConfig {
            engine: Some(EngineSection {
                domain: Some("nemeth".into()),
                ..Default::default()
            }),
            batch: Some(BatchSection {
                max_concurrency: Some(0),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        let paths: Vec<_> = report.errors.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["engine.domain", "batch.maxConcurrency"]);
    }

    #[test]
    fn enabling_bussproofs_warns() {
        let cfg = TexspeakConfig {
            features: Some(FeaturesSection {
                deny: Some(vec!["base".into()]),
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn missing_rule_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TexspeakConfig {
            engine: Some(EngineSection {
                locale: Some("de".into()),
                resource_path: Some(dir.path().display().to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.warnings.iter().any(|w| w.path == "engine.resourcePath"));
    }
}
