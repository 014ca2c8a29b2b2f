//! Shared setup for every command: config, logging, engine state.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use texspeak_config::defaults::{DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL};
use texspeak_config::TexspeakConfig;
use texspeak_core::{EngineConfig, FeatureSet};
use texspeak_graphics::AccessibilityEnricher;
use texspeak_markup::MathStructureConverter;
use texspeak_pipeline::PipelineOrchestrator;
use texspeak_speech::SpeechEngineState;
use tracing::debug;

pub struct Runtime {
    pub config: TexspeakConfig,
    pub engine_config: EngineConfig,
    pub features: Arc<FeatureSet>,
    pub engine: Arc<SpeechEngineState>,
}

impl Runtime {
    /// Loads the config from `path`, or from the default config directory.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match path {
            Some(p) => p.to_path_buf(),
            None => texspeak_config::config_file_path(&texspeak_config::config_dir()),
        };
        let config = texspeak_config::load_and_prepare(&path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?;
        Self::from_config(config)
    }

    pub fn from_config(config: TexspeakConfig) -> Result<Self> {
        let engine_config = config.engine_config()?;
        let features = Arc::new(config.feature_set()?);
        let engine = Arc::new(SpeechEngineState::from_fs().with_timeout(config.load_timeout()));
        debug!(
            locale = %engine_config.locale,
            domain = %engine_config.domain,
            resources = %engine_config.resource_path.display(),
            "Runtime configured"
        );
        Ok(Self {
            config,
            engine_config,
            features,
            engine,
        })
    }

    pub fn init_logging(&self) -> Result<()> {
        let logging = self.config.logging.clone().unwrap_or_default();
        let dir = logging.dir.unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());
        let level = logging.level.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        texspeak_logging::init_logger(dir, &level)
    }

    pub fn pipeline(&self) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            Arc::clone(&self.engine),
            self.engine_config.clone(),
            Arc::clone(&self.features),
        )
        .with_max_concurrency(self.config.max_concurrency())
        .with_enricher(AccessibilityEnricher::new(self.config.title_prefix()))
    }

    pub fn converter(&self) -> MathStructureConverter {
        MathStructureConverter::new(Arc::clone(&self.features))
    }
}
