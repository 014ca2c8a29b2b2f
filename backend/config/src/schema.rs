//! texspeak configuration schema.
//!
//! Every field is optional in the file; [`crate::apply_all_defaults`] fills
//! the gaps. Enumerated values stay strings here so validation can report
//! unknown ones with their path instead of failing deserialization.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use texspeak_core::{Domain, EngineConfig, FeatureSet, Package, Verbosity};

use crate::defaults::{
    DEFAULT_LOAD_TIMEOUT_SECS, DEFAULT_MAX_CONCURRENCY, DEFAULT_TITLE_PREFIX,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TexspeakConfig {
    /// Speech engine settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineSection>,

    /// Package feature set shared by both conversion paths
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeaturesSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderer: Option<RendererSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchSection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// `clearspeak` | `mathspeak`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// `brief` | `default` | `verbose`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    /// Directory holding `<locale>.json` rule files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeaturesSection {
    /// Packages to disable; `base` cannot be disabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererSection {
    /// Prepended to the description in the graphic's `<title>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

pub fn parse_domain(s: &str) -> Option<Domain> {
    match s {
        "clearspeak" => Some(Domain::Clearspeak),
        "mathspeak" => Some(Domain::Mathspeak),
        _ => None,
    }
}

pub fn parse_verbosity(s: &str) -> Option<Verbosity> {
    match s {
        "brief" => Some(Verbosity::Brief),
        "default" => Some(Verbosity::Default),
        "verbose" => Some(Verbosity::Verbose),
        _ => None,
    }
}

impl TexspeakConfig {
    /// The speech engine configuration this file describes.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        let mut config = EngineConfig::default();
        let Some(engine) = &self.engine else {
            return Ok(config);
        };
        if let Some(locale) = &engine.locale {
            config.locale = locale.clone();
        }
        if let Some(domain) = &engine.domain {
            config.domain =
                parse_domain(domain).ok_or_else(|| anyhow!("unknown speech domain '{domain}'"))?;
        }
        if let Some(style) = &engine.style {
            config.style = style.clone();
        }
        if let Some(verbosity) = &engine.verbosity {
            config.verbosity = parse_verbosity(verbosity)
                .ok_or_else(|| anyhow!("unknown verbosity '{verbosity}'"))?;
        }
        if let Some(path) = &engine.resource_path {
            config.resource_path = PathBuf::from(path);
        }
        Ok(config)
    }

    pub fn feature_set(&self) -> Result<FeatureSet> {
        let deny = self
            .features
            .as_ref()
            .and_then(|f| f.deny.as_ref());
        let Some(deny) = deny else {
            return Ok(FeatureSet::default());
        };
        let mut packages = Vec::with_capacity(deny.len());
        for name in deny {
            match name.parse::<Package>() {
                Ok(p) => packages.push(p),
                Err(e) => bail!(e),
            }
        }
        Ok(FeatureSet::all_except(&packages))
    }

    pub fn load_timeout(&self) -> Duration {
        let secs = self
            .engine
            .as_ref()
            .and_then(|e| e.load_timeout_secs)
            .unwrap_or(DEFAULT_LOAD_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn max_concurrency(&self) -> usize {
        self.batch
            .as_ref()
            .and_then(|b| b.max_concurrency)
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
    }

    pub fn title_prefix(&self) -> &str {
        self.renderer
            .as_ref()
            .and_then(|r| r.title_prefix.as_deref())
            .unwrap_or(DEFAULT_TITLE_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
engine:
  locale: en
  domain: mathspeak
  verbosity: brief
  resourcePath: /opt/texspeak/mathmaps
  loadTimeoutSecs: 5
features:
  deny: [bussproofs, color]
batch:
  maxConcurrency: 8
"#;
        let config: TexspeakConfig = serde_yaml::from_str(yaml).unwrap();
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.domain, Domain::Mathspeak);
        assert_eq!(engine.verbosity, Verbosity::Brief);
        assert_eq!(engine.resource_path, PathBuf::from("/opt/texspeak/mathmaps"));
        assert_eq!(config.load_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_concurrency(), 8);

        let features = config.feature_set().unwrap();
        assert!(!features.is_enabled(Package::Color));
        assert!(features.is_enabled(Package::Ams));
    }

    #[test]
    fn empty_file_means_defaults() {
        let config: TexspeakConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.engine_config().unwrap(), EngineConfig::default());
        assert_eq!(config.feature_set().unwrap(), FeatureSet::default());
        assert_eq!(config.title_prefix(), DEFAULT_TITLE_PREFIX);
    }

    #[test]
    fn unknown_package_is_an_error() {
        let config = TexspeakConfig {
            features: Some(FeaturesSection {
                deny: Some(vec!["physics".into()]),
            }),
            ..Default::default()
        };
        assert!(config.feature_set().is_err());
    }
}
