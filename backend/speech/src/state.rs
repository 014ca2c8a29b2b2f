//! Process-wide speech engine lifecycle.
//!
//! The engine is loaded lazily on first use. Concurrent callers share one
//! in-flight load; a failed load leaves the state uninitialized so the next
//! call starts a fresh attempt.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use texspeak_core::{EngineConfig, EngineInitError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::SpeechEngine;
use crate::loader::{FsRuleLoader, RuleLoader};

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

type InitFuture = Shared<BoxFuture<'static, Result<Arc<SpeechEngine>, EngineInitError>>>;

enum Slot {
    Idle,
    Loading { attempt: u64, future: InitFuture },
    Ready(Arc<SpeechEngine>),
}

pub struct SpeechEngineState {
    loader: Arc<dyn RuleLoader>,
    load_timeout: Duration,
    slot: Mutex<Slot>,
    attempts: AtomicU64,
    ready_tx: watch::Sender<bool>,
}

impl SpeechEngineState {
    pub fn new(loader: Arc<dyn RuleLoader>) -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            loader,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            slot: Mutex::new(Slot::Idle),
            attempts: AtomicU64::new(0),
            ready_tx,
        }
    }

    pub fn from_fs() -> Self {
        Self::new(Arc::new(FsRuleLoader))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.lock(), Slot::Ready(_))
    }

    /// The engine, if a load has already completed.
    pub fn engine(&self) -> Option<Arc<SpeechEngine>> {
        match &*self.lock() {
            Slot::Ready(engine) => Some(Arc::clone(engine)),
            _ => None,
        }
    }

    /// Resolves once some load has succeeded. Does not start one.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready_tx.subscribe();
        // Sender lives as long as `self`, so this only returns Err on drop.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Returns the loaded engine, loading it first if necessary.
    ///
    /// At most one load runs at a time; every caller arriving while it runs
    /// awaits the same outcome. Once loaded, the engine is reused for the
    /// life of the state. A later call with a different configuration gets
    /// the existing engine and a warning.
    pub async fn ensure_ready(
        &self,
        config: &EngineConfig,
    ) -> Result<Arc<SpeechEngine>, EngineInitError> {
        let (attempt, future) = {
            let mut slot = self.lock();
            match &*slot {
                Slot::Ready(engine) => {
                    if engine.config() != config {
                        warn!(
                            loaded_locale = %engine.config().locale,
                            loaded_domain = %engine.config().domain,
                            requested_domain = %config.domain,
                            "Speech engine already loaded with a different configuration"
                        );
                    }
                    return Ok(Arc::clone(engine));
                }
                Slot::Loading { attempt, future } => {
                    debug!(attempt, "Joining in-flight speech engine load");
                    (*attempt, future.clone())
                }
                Slot::Idle => {
                    let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let future = self.start_load(config.clone());
                    info!(attempt, locale = %config.locale, domain = %config.domain, "Loading speech engine");
                    *slot = Slot::Loading {
                        attempt,
                        future: future.clone(),
                    };
                    (attempt, future)
                }
            }
        };

        let result = future.await;

        let mut slot = self.lock();
        let current = matches!(&*slot, Slot::Loading { attempt: a, .. } if *a == attempt);
        if current {
            match &result {
                Ok(engine) => {
                    *slot = Slot::Ready(Arc::clone(engine));
                    self.ready_tx.send_replace(true);
                    info!(attempt, "Speech engine ready");
                }
                Err(e) => {
                    *slot = Slot::Idle;
                    warn!(attempt, error = %e, "Speech engine load failed");
                }
            }
        }
        drop(slot);
        result
    }

    fn start_load(&self, config: EngineConfig) -> InitFuture {
        let loader = Arc::clone(&self.loader);
        let timeout = self.load_timeout;
        async move {
            let rules = tokio::time::timeout(timeout, loader.load(&config))
                .await
                .map_err(|_| EngineInitError::Timeout(timeout))??;
            SpeechEngine::compile(config, rules).map(Arc::new)
        }
        .boxed()
        .shared()
    }
}

impl std::fmt::Debug for SpeechEngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechEngineState")
            .field("ready", &self.is_ready())
            .field("load_timeout", &self.load_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use crate::rules::RuleSet;

    const RESOURCES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../resources/mathmaps");

    /// Counts loads and fails the first `failures` of them.
    struct CountingLoader {
        calls: AtomicUsize,
        failures: usize,
        delay: Duration,
    }

    impl CountingLoader {
        fn new(failures: usize, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failures,
                delay,
            })
        }
    }

    #[async_trait]
    impl RuleLoader for CountingLoader {
        async fn load(&self, config: &EngineConfig) -> Result<RuleSet, EngineInitError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if call < self.failures {
                return Err(EngineInitError::ResourceNotFound {
                    locale: config.locale.clone(),
                    path: config.resource_path.clone(),
                });
            }
            FsRuleLoader.load(config).await
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::default().with_resource_path(RESOURCES)
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let loader = CountingLoader::new(0, Duration::from_millis(50));
        let state = Arc::new(SpeechEngineState::new(loader.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let state = Arc::clone(&state);
                tokio::spawn(async move { state.ensure_ready(&config()).await })
            })
            .collect();
        let engines: Vec<_> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert!(engines.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(state.is_ready());
    }

    #[tokio::test]
    async fn failure_allows_retry() {
        let loader = CountingLoader::new(1, Duration::ZERO);
        let state = SpeechEngineState::new(loader.clone());

        let err = state.ensure_ready(&config()).await.unwrap_err();
        assert!(matches!(err, EngineInitError::ResourceNotFound { .. }));
        assert!(!state.is_ready());
        assert!(state.engine().is_none());

        state.ensure_ready(&config()).await.unwrap();
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
        assert!(state.engine().is_some());
    }

    #[tokio::test]
    async fn ready_engine_is_reused() {
        let loader = CountingLoader::new(0, Duration::ZERO);
        let state = SpeechEngineState::new(loader.clone());
        let first = state.ensure_ready(&config()).await.unwrap();
        let second = state.ensure_ready(&config()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_load_times_out() {
        let loader = CountingLoader::new(0, Duration::from_secs(5));
        let state = SpeechEngineState::new(loader).with_timeout(Duration::from_millis(20));
        let err = state.ensure_ready(&config()).await.unwrap_err();
        assert!(matches!(err, EngineInitError::Timeout(_)));
        assert!(!state.is_ready());
    }

    #[tokio::test]
    async fn wait_ready_resolves_after_load() {
        let state = Arc::new(SpeechEngineState::new(CountingLoader::new(
            0,
            Duration::from_millis(10),
        )));
        let waiter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move { state.wait_ready().await })
        };
        state.ensure_ready(&config()).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
