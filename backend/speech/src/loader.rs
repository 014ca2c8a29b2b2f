//! Rule resource loading.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use texspeak_core::{EngineConfig, EngineInitError};
use tracing::{debug, info};

use crate::rules::RuleSet;

/// Source of rule resources for one engine configuration.
#[async_trait]
pub trait RuleLoader: Send + Sync {
    async fn load(&self, config: &EngineConfig) -> Result<RuleSet, EngineInitError>;
}

/// Reads `<resource_path>/<locale>.json` from the filesystem.
#[derive(Debug, Default, Clone)]
pub struct FsRuleLoader;

impl FsRuleLoader {
    pub fn rule_file(config: &EngineConfig) -> PathBuf {
        config
            .resource_path
            .join(format!("{}.json", config.locale))
    }
}

#[async_trait]
impl RuleLoader for FsRuleLoader {
    async fn load(&self, config: &EngineConfig) -> Result<RuleSet, EngineInitError> {
        let path = Self::rule_file(config);
        debug!(path = %path.display(), "Reading speech rules");

        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                EngineInitError::ResourceNotFound {
                    locale: config.locale.clone(),
                    path: path.clone(),
                }
            } else {
                EngineInitError::Io {
                    path: path.clone(),
                    source: Arc::new(e),
                }
            }
        })?;

        let rules: RuleSet =
            serde_json::from_str(&raw).map_err(|e| EngineInitError::InvalidRules {
                path: path.clone(),
                source: Arc::new(e),
            })?;

        if rules.locale != config.locale {
            return Err(EngineInitError::LocaleMismatch {
                expected: config.locale.clone(),
                found: rules.locale,
            });
        }
        if rules.domain(config.domain).is_none() {
            return Err(EngineInitError::UnsupportedDomain {
                locale: config.locale.clone(),
                domain: config.domain.to_string(),
            });
        }
        if rules
            .domain(config.domain)
            .and_then(|d| d.style(&config.style))
            .is_none()
        {
            return Err(EngineInitError::UnsupportedStyle {
                domain: config.domain.to_string(),
                style: config.style.clone(),
            });
        }

        info!(
            path = %path.display(),
            domains = rules.domains.len(),
            "Loaded speech rules"
        );
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texspeak_core::Domain;

    #[tokio::test]
    async fn missing_directory_is_resource_not_found() {
        let config = EngineConfig::default().with_resource_path("/nonexistent/texspeak/rules");
        let err = FsRuleLoader.load(&config).await.unwrap_err();
        assert!(matches!(err, EngineInitError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn malformed_json_is_invalid_rules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), "{ not json").unwrap();
        let config = EngineConfig::default().with_resource_path(dir.path());
        let err = FsRuleLoader.load(&config).await.unwrap_err();
        assert!(matches!(err, EngineInitError::InvalidRules { .. }));
    }

    #[tokio::test]
    async fn unknown_domain_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("en.json"),
            r#"{"locale":"en","domains":{"clearspeak":{"templates":{}}}}"#,
        )
        .unwrap();
        let config = EngineConfig::default()
            .with_resource_path(dir.path())
            .with_domain(Domain::Mathspeak);
        let err = FsRuleLoader.load(&config).await.unwrap_err();
        assert!(matches!(err, EngineInitError::UnsupportedDomain { .. }));
    }

    #[tokio::test]
    async fn unknown_style_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("en.json"),
            r#"{"locale":"en","domains":{"clearspeak":{"templates":{},"styles":{"over":{}}}}}"#,
        )
        .unwrap();
        let config = EngineConfig::default().with_resource_path(dir.path());
        assert!(FsRuleLoader.load(&config.clone().with_style("over")).await.is_ok());

        let config = config.with_style("fancy");
        let err = FsRuleLoader.load(&config).await.unwrap_err();
        assert!(matches!(err, EngineInitError::UnsupportedStyle { .. }));
    }
}
