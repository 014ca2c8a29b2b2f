//! Conversion orchestration.
//!
//! One request runs: engine readiness → parse → describe, render → enrich.
//! Batches share one engine readiness check and keep per-item outcomes in
//! request order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use texspeak_core::{
    ConversionRequest, EngineConfig, FeatureSet, PipelineError, RenderError,
};
use texspeak_graphics::{AccessibilityEnricher, GraphicalRenderer};
use texspeak_logging::{ConversionEvent, ConversionEventLogger};
use texspeak_markup::MathStructureConverter;
use texspeak_speech::{SpeechEngine, SpeechEngineState};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::artifact::AccessibleArtifact;

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

pub type ItemResult = Result<AccessibleArtifact, PipelineError>;

#[derive(Clone)]
struct Inner {
    engine: Arc<SpeechEngineState>,
    engine_config: EngineConfig,
    converter: MathStructureConverter,
    renderer: GraphicalRenderer,
    enricher: AccessibilityEnricher,
}

impl Inner {
    fn convert_with(&self, engine: &SpeechEngine, request: &ConversionRequest) -> ItemResult {
        let structure = self
            .converter
            .parse(&request.source, request.display_mode)?;
        let description = engine.describe(&structure)?;
        let graphic = self
            .renderer
            .render(&request.source, request.display_mode)?;
        let graphic = self.enricher.enrich(graphic, &description)?;
        Ok(AccessibleArtifact::new(graphic, description))
    }
}

/// Cheap to clone; clones share the engine state and converters.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    inner: Arc<Inner>,
    max_concurrency: usize,
}

impl PipelineOrchestrator {
    /// Builds both conversion paths from the one feature set.
    pub fn new(
        engine: Arc<SpeechEngineState>,
        engine_config: EngineConfig,
        features: Arc<FeatureSet>,
    ) -> Self {
        let converter = MathStructureConverter::new(Arc::clone(&features));
        let renderer = GraphicalRenderer::new(features);
        Self::build(engine, engine_config, converter, renderer)
    }

    /// Assembles a pipeline from prebuilt converters. Both must have been
    /// built with the same feature set.
    pub fn from_components(
        engine: Arc<SpeechEngineState>,
        engine_config: EngineConfig,
        converter: MathStructureConverter,
        renderer: GraphicalRenderer,
    ) -> Result<Self, PipelineError> {
        let same = Arc::ptr_eq(converter.features(), renderer.features())
            || converter.features() == renderer.features();
        if !same {
            return Err(RenderError::FeatureMismatch.into());
        }
        Ok(Self::build(engine, engine_config, converter, renderer))
    }

    fn build(
        engine: Arc<SpeechEngineState>,
        engine_config: EngineConfig,
        converter: MathStructureConverter,
        renderer: GraphicalRenderer,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                engine_config,
                converter,
                renderer,
                enricher: AccessibilityEnricher::default(),
            }),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_enricher(mut self, enricher: AccessibilityEnricher) -> Self {
        Arc::make_mut(&mut self.inner).enricher = enricher;
        self
    }

    pub fn engine_state(&self) -> &Arc<SpeechEngineState> {
        &self.inner.engine
    }

    pub async fn convert(&self, request: &ConversionRequest) -> ItemResult {
        let engine = self
            .inner
            .engine
            .ensure_ready(&self.inner.engine_config)
            .await?;
        self.inner.convert_with(&engine, request)
    }

    pub async fn convert_batch(&self, requests: Vec<ConversionRequest>) -> Vec<ItemResult> {
        self.convert_batch_with_cancel(requests, CancellationToken::new())
            .await
    }

    /// Converts every request, returning outcomes in request order.
    ///
    /// An engine initialization failure fails every item with that error.
    /// Cancelling `cancel` fails items that have not started yet with
    /// [`PipelineError::Cancelled`]; items already running complete.
    pub async fn convert_batch_with_cancel(
        &self,
        requests: Vec<ConversionRequest>,
        cancel: CancellationToken,
    ) -> Vec<ItemResult> {
        let run_id = Uuid::new_v4().to_string();
        let total = requests.len();
        if total == 0 {
            return Vec::new();
        }
        info!(%run_id, total, max_concurrency = self.max_concurrency, "Starting batch conversion");

        let engine = match self
            .inner
            .engine
            .ensure_ready(&self.inner.engine_config)
            .await
        {
            Ok(engine) => engine,
            Err(e) => {
                warn!(%run_id, error = %e, "Engine unavailable, failing batch");
                let results: Vec<ItemResult> = (0..total)
                    .map(|_| Err(PipelineError::EngineInit(e.clone())))
                    .collect();
                log_outcomes(&run_id, &requests, &results);
                return results;
            }
        };

        let results: Vec<ItemResult> = stream::iter(requests.iter().cloned().enumerate())
            .map(|(index, request)| {
                let inner = Arc::clone(&self.inner);
                let engine = Arc::clone(&engine);
                let cancel = cancel.clone();
                async move {
                    if cancel.is_cancelled() {
                        debug!(index, "Skipping cancelled item");
                        return Err(PipelineError::Cancelled);
                    }
                    run_item(inner, engine, request).await
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        log_outcomes(&run_id, &requests, &results);
        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(%run_id, total, failed, "Batch conversion finished");
        results
    }
}

/// Runs one item on the blocking pool; parsing and layout are CPU-bound.
async fn run_item(
    inner: Arc<Inner>,
    engine: Arc<SpeechEngine>,
    request: ConversionRequest,
) -> ItemResult {
    let handle = tokio::task::spawn_blocking(move || inner.convert_with(&engine, &request));
    item_outcome(handle.await)
}

/// A panicking item fails alone; its siblings keep their results.
fn item_outcome(joined: Result<ItemResult, JoinError>) -> ItemResult {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            let payload = e.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            error!(%message, "Conversion task panicked");
            Err(PipelineError::Aborted(message))
        }
        Err(_) => Err(PipelineError::Cancelled),
    }
}

fn log_outcomes(run_id: &str, requests: &[ConversionRequest], results: &[ItemResult]) {
    for (index, (request, result)) in requests.iter().zip(results).enumerate() {
        let event = match result {
            Ok(artifact) => ConversionEvent::Converted {
                index,
                display_mode: request.display_mode,
                description_chars: artifact.description().as_str().chars().count(),
            },
            Err(e) => ConversionEvent::Failed {
                index,
                stage: e.stage(),
                error: e.to_string(),
            },
        };
        ConversionEventLogger::log_event(run_id, event);
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("engine_config", &self.inner.engine_config)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texspeak_core::{EngineInitError, Package, ParseError, Stage};

    const RESOURCES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../resources/mathmaps");

    fn pipeline() -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            Arc::new(SpeechEngineState::from_fs()),
            EngineConfig::default().with_resource_path(RESOURCES),
            Arc::new(FeatureSet::default()),
        )
    }

    fn child_names(artifact: &AccessibleArtifact) -> Vec<String> {
        artifact
            .graphic()
            .root()
            .elements()
            .map(|e| e.name.clone())
            .collect()
    }

    #[tokio::test]
    async fn pythagorean_identity_is_fully_annotated() {
        let artifact = pipeline()
            .convert(&ConversionRequest::display("x^2 + y^2 = z^2"))
            .await
            .unwrap();
        let description = artifact.description().as_str();
        assert!(description.contains("squared"), "{description}");

        let svg = artifact.graphic().root();
        assert_eq!(svg.name, "svg");
        assert_eq!(svg.attribute("aria-label"), Some(description));
        assert_eq!(svg.attribute("role"), Some("img"));
        assert_eq!(&child_names(&artifact)[..2], ["desc", "title"]);
        let children: Vec<_> = svg.elements().collect();
        assert_eq!(children[0].text_content(), description);
        assert!(!children[1].text_content().is_empty());
    }

    #[tokio::test]
    async fn unbalanced_group_is_rejected_but_batch_continues() {
        let p = pipeline();
        let err = p
            .convert(&ConversionRequest::display(r"\frac{1}{2"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ParseError::UnbalancedGroup { .. })));
        assert_eq!(err.stage(), Stage::Parse);

        let results = p
            .convert_batch(vec![
                ConversionRequest::display(r"\frac{1}{2"),
                ConversionRequest::display("E = mc^2"),
            ])
            .await;
        assert_eq!(results.len(), 2);
        assert!(matches!(results[0], Err(PipelineError::Parse(_))));
        let second = results[1].as_ref().unwrap();
        assert!(second.description().as_str().contains("upper E"));
    }

    #[tokio::test]
    async fn deeply_nested_item_fails_alone() {
        let mut deep = "x".to_string();
        for _ in 0..400 {
            deep = format!(r"\frac{{{deep}}}{{2}}");
        }
        let results = pipeline()
            .convert_batch(vec![
                ConversionRequest::display(deep),
                ConversionRequest::display("x^2"),
            ])
            .await;
        assert!(matches!(
            results[0],
            Err(PipelineError::Parse(ParseError::TooDeep { .. }))
        ));
        assert_eq!(results[1].as_ref().unwrap().description().as_str(), "x squared");
    }

    #[tokio::test]
    async fn panicking_item_becomes_an_item_error() {
        let joined = tokio::task::spawn_blocking(|| -> ItemResult { panic!("layout bug") }).await;
        let err = item_outcome(joined).unwrap_err();
        assert!(matches!(&err, PipelineError::Aborted(m) if m == "layout bug"));
        assert_eq!(err.stage(), Stage::Aborted);
    }

    #[tokio::test]
    async fn repeated_conversions_are_identical() {
        let p = pipeline();
        let request = ConversionRequest::display(r"\int_0^\infty e^{-x^2} dx = \frac{\sqrt{\pi}}{2}");
        let first = p.convert(&request).await.unwrap();
        let second = p.convert(&request).await.unwrap();
        assert_eq!(first.description(), second.description());
        assert_eq!(first.svg(), second.svg());
    }

    #[tokio::test]
    async fn batch_keeps_request_order() {
        let sources = ["a", r"\frac{1}{", "b^2", r"\unknown", r"\sqrt{c}"];
        let requests = sources.iter().map(|s| ConversionRequest::inline(*s)).collect();
        let results = pipeline().with_max_concurrency(2).convert_batch(requests).await;

        assert_eq!(results.len(), sources.len());
        assert!(results[0].as_ref().unwrap().description().as_str() == "a");
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().description().as_str().contains("squared"));
        assert!(matches!(
            results[3],
            Err(PipelineError::Parse(ParseError::UnknownMacro { .. }))
        ));
        assert!(results[4].as_ref().unwrap().description().as_str().contains("square root"));
    }

    #[tokio::test]
    async fn engine_failure_fails_every_item_and_stays_retryable() {
        let state = Arc::new(SpeechEngineState::from_fs());
        let broken = PipelineOrchestrator::new(
            Arc::clone(&state),
            EngineConfig::default().with_resource_path("/nonexistent/texspeak"),
            Arc::new(FeatureSet::default()),
        );
        let results = broken
            .convert_batch(vec![ConversionRequest::display("x"), ConversionRequest::display("y")])
            .await;
        assert!(results.iter().all(|r| matches!(
            r,
            Err(PipelineError::EngineInit(EngineInitError::ResourceNotFound { .. }))
        )));
        assert!(results.iter().all(|r| r.as_ref().unwrap_err().is_retryable()));
        assert!(!state.is_ready());

        let fixed = PipelineOrchestrator::new(
            Arc::clone(&state),
            EngineConfig::default().with_resource_path(RESOURCES),
            Arc::new(FeatureSet::default()),
        );
        fixed.convert(&ConversionRequest::display("x")).await.unwrap();
        assert!(state.is_ready());
    }

    #[tokio::test]
    async fn cancelled_batch_skips_unstarted_items() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let results = pipeline()
            .convert_batch_with_cancel(
                vec![ConversionRequest::display("x"), ConversionRequest::display("y")],
                cancel,
            )
            .await;
        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| matches!(r, Err(PipelineError::Cancelled))));
    }

    #[tokio::test]
    async fn empty_batch_returns_nothing() {
        assert!(pipeline().convert_batch(Vec::new()).await.is_empty());
    }

    #[test]
    fn mismatched_feature_sets_are_rejected() {
        let converter = MathStructureConverter::new(Arc::new(FeatureSet::default()));
        let renderer =
            GraphicalRenderer::new(Arc::new(FeatureSet::all_except(&[Package::Cancel])));
        let err = PipelineOrchestrator::from_components(
            Arc::new(SpeechEngineState::from_fs()),
            EngineConfig::default(),
            converter,
            renderer,
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Render(RenderError::FeatureMismatch)));
    }

    #[tokio::test]
    async fn description_and_graphic_show_the_same_symbols() {
        let features = Arc::new(FeatureSet::default());
        let converter = MathStructureConverter::new(Arc::clone(&features));
        let p = pipeline();
        let source = r"\sum_{k=1}^{n} \alpha_k x^k";

        let artifact = p.convert(&ConversionRequest::display(source)).await.unwrap();
        let mut glyph_defs = Vec::new();
        artifact.graphic().root().find_all("text", &mut glyph_defs);
        let drawn: String = glyph_defs.iter().map(|d| d.text_content()).collect();

        let tree = converter.parse_tree(source).unwrap();
        for symbol in tree.leaf_symbols() {
            for ch in symbol.chars().filter(|c| !c.is_whitespace()) {
                assert!(drawn.contains(ch), "{ch} missing from graphic");
            }
        }
        assert!(artifact.description().as_str().contains("alpha"));
    }

    #[tokio::test]
    async fn disabled_package_is_rejected_on_both_paths() {
        let features = Arc::new(FeatureSet::all_except(&[Package::Cancel]));
        let p = PipelineOrchestrator::new(
            Arc::new(SpeechEngineState::from_fs()),
            EngineConfig::default().with_resource_path(RESOURCES),
            Arc::clone(&features),
        );
        let err = p
            .convert(&ConversionRequest::display(r"\cancel{x}"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Parse(ParseError::DisabledPackage { .. })));

        let render_err = GraphicalRenderer::new(features)
            .render(r"\cancel{x}", true)
            .unwrap_err();
        assert!(matches!(
            render_err,
            RenderError::Markup(ParseError::DisabledPackage { .. })
        ));
    }
}
