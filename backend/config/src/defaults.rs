//! Config defaults: fills every unset field of a parsed config.

use crate::schema::{
    BatchSection, EngineSection, FeaturesSection, LoggingSection, RendererSection, TexspeakConfig,
};

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_DOMAIN: &str = "clearspeak";
pub const DEFAULT_STYLE: &str = "default";
pub const DEFAULT_VERBOSITY: &str = "default";
pub const DEFAULT_RESOURCE_PATH: &str = "resources/mathmaps";

/// Resource loading timeout (seconds).
pub const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 30;

/// Packages disabled unless the config lists its own deny list.
pub const DEFAULT_DENY: &[&str] = &["bussproofs"];

pub const DEFAULT_TITLE_PREFIX: &str = "Mathematical equation: ";

/// Batch items converted at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: TexspeakConfig) -> TexspeakConfig {
    let config = apply_engine_defaults(config);
    let config = apply_feature_defaults(config);
    let config = apply_renderer_defaults(config);
    let config = apply_batch_defaults(config);
    apply_logging_defaults(config)
}

fn apply_engine_defaults(mut config: TexspeakConfig) -> TexspeakConfig {
    let engine = config.engine.get_or_insert_with(EngineSection::default);
    engine.locale.get_or_insert_with(|| DEFAULT_LOCALE.to_string());
    engine.domain.get_or_insert_with(|| DEFAULT_DOMAIN.to_string());
    engine.style.get_or_insert_with(|| DEFAULT_STYLE.to_string());
    engine
        .verbosity
        .get_or_insert_with(|| DEFAULT_VERBOSITY.to_string());
    engine
        .resource_path
        .get_or_insert_with(|| DEFAULT_RESOURCE_PATH.to_string());
    engine.load_timeout_secs.get_or_insert(DEFAULT_LOAD_TIMEOUT_SECS);
    config
}

fn apply_feature_defaults(mut config: TexspeakConfig) -> TexspeakConfig {
    let features = config.features.get_or_insert_with(FeaturesSection::default);
    if features.deny.is_none() {
        features.deny = Some(DEFAULT_DENY.iter().map(|p| p.to_string()).collect());
    }
    config
}

fn apply_renderer_defaults(mut config: TexspeakConfig) -> TexspeakConfig {
    let renderer = config.renderer.get_or_insert_with(RendererSection::default);
    renderer
        .title_prefix
        .get_or_insert_with(|| DEFAULT_TITLE_PREFIX.to_string());
    config
}

fn apply_batch_defaults(mut config: TexspeakConfig) -> TexspeakConfig {
    let batch = config.batch.get_or_insert_with(BatchSection::default);
    batch.max_concurrency.get_or_insert(DEFAULT_MAX_CONCURRENCY);
    config
}

fn apply_logging_defaults(mut config: TexspeakConfig) -> TexspeakConfig {
    let logging = config.logging.get_or_insert_with(LoggingSection::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.to_string());
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use texspeak_core::{EngineConfig, FeatureSet};

    #[test]
    fn defaults_match_engine_defaults() {
        let cfg = apply_all_defaults(TexspeakConfig::default());
        assert_eq!(cfg.engine_config().unwrap(), EngineConfig::default());
        assert_eq!(cfg.feature_set().unwrap(), FeatureSet::default());
        assert_eq!(cfg.max_concurrency(), DEFAULT_MAX_CONCURRENCY);
        assert_eq!(
            cfg.logging.unwrap().level.as_deref(),
            Some(DEFAULT_LOG_LEVEL)
        );
    }

    #[test]
    fn does_not_override_user_values() {
        let cfg = TexspeakConfig {
            batch: Some(BatchSection {
                max_concurrency: Some(1),
            }),
            features: Some(FeaturesSection {
                deny: Some(Vec::new()),
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.max_concurrency(), 1);
        assert_eq!(cfg.features.unwrap().deny, Some(Vec::new()));
    }
}
