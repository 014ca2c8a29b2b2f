//! `texspeak-config`: runtime configuration for texspeak.
//!
//! Provides:
//! - Typed config schema (engine, features, renderer, batch, logging)
//! - YAML loading from `TEXSPEAK_CONFIG_DIR` or `~/.texspeak/`
//! - `${ENV_VAR}` substitution and `TEXSPEAK_RESOURCES` override
//! - Default value application
//! - Validation with per-field errors and warnings

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{
    apply_env_overrides, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError,
    RESOURCES_ENV,
};
pub use io::{config_dir, config_file_path, load_config_value, CONFIG_DIR_ENV};
pub use schema::TexspeakConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Load, substitute env vars, apply overrides and defaults, then validate.
///
/// This is the main entry point for loading a config at runtime. Warnings
/// are logged; any validation error fails the load.
pub async fn load_and_prepare(path: &Path) -> Result<TexspeakConfig> {
    let env: HashMap<String, String> = std::env::vars().collect();
    load_and_prepare_with(path, &env).await
}

/// [`load_and_prepare`] against an explicit environment.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<TexspeakConfig> {
    let value = load_config_value(path).await?;
    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: TexspeakConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;
    let config = apply_env_overrides(config, env);
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        let summary: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid config at {}: {}", path.display(), summary.join("; "));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use texspeak_core::Domain;

    fn write(dir: &Path, yaml: &str) -> std::path::PathBuf {
        let path = config_file_path(dir);
        std::fs::write(&path, yaml).unwrap();
        path
    }

    #[tokio::test]
    async fn full_pipeline_with_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "engine:\n  domain: ${SPEECH_DOMAIN}\nbatch:\n  maxConcurrency: 2\n",
        );
        let env = HashMap::from([
            ("SPEECH_DOMAIN".to_string(), "mathspeak".to_string()),
            (RESOURCES_ENV.to_string(), "/srv/rules".to_string()),
        ]);
        let config = load_and_prepare_with(&path, &env).await.unwrap();
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.domain, Domain::Mathspeak);
        assert_eq!(engine.resource_path, std::path::PathBuf::from("/srv/rules"));
        assert_eq!(config.max_concurrency(), 2);
    }

    #[tokio::test]
    async fn validation_errors_fail_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "logging:\n  level: loud\n");
        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[tokio::test]
    async fn empty_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "");
        let config = load_and_prepare_with(&path, &HashMap::new()).await.unwrap();
        assert_eq!(config, apply_all_defaults(TexspeakConfig::default()));
    }
}
