//! The generation orchestrator state machine.
//!
//! Stage sequence: `Detecting → Extracting → Transforming → Rendering →
//! Validating → Complete`, with `Failed` terminal. Extraction failures are
//! caller input errors and never retried. Transform, render, and validate
//! failures draw on one shared retry budget; two consecutive render-shaped
//! failures trigger a one-time fallback to transformation, which consumes
//! from the same budget. Every transition emits one progress event; the
//! cache entry is stored before the terminal `complete` event is
//! published, so a racing identical request observes a `cache_hit`.

use camino::Utf8PathBuf;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use prismgen_cache::{
    BuildOutcome, BuildSlot, CacheEntry, CacheStore, Fingerprint, InflightRegistry,
};
use prismgen_config::Config;
use prismgen_content::{ContentModel, TransformPrompt, parse_model_json};
use prismgen_events::{ArtifactRef, Event, EventPublisher, EventStream};
use prismgen_extraction::ExtractionGateway;
use prismgen_llm::{LlmBackend, LlmInvocation, Message};
use prismgen_render::{Artifact, RendererRegistry};
use prismgen_utils::error::{EngineError, LlmError};
use prismgen_utils::types::{Provider, Stage};
use prismgen_validation::{ArtifactValidator, Expectations};

use crate::cancel::{self, CancelHandle, CancelToken};
use crate::request::GenerationRequest;
use crate::retry::{RetryBudget, RetryReason, backoff_delay};
use crate::session::GenerationSession;

/// Default per-call LLM timeout when the config leaves it unset.
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Consecutive render-shaped failures that trigger the one-time
/// re-transformation fallback.
const RENDER_FALLBACK_THRESHOLD: u32 = 2;

/// Fixed per-stage progress weights.
const fn stage_percent(stage: Stage) -> u8 {
    match stage {
        Stage::Detecting => 5,
        Stage::Extracting => 10,
        Stage::Transforming => 40,
        Stage::Rendering => 80,
        Stage::Validating => 95,
        Stage::Complete | Stage::Failed => 100,
    }
}

/// Constructs an LLM backend for a request's provider and per-request key.
///
/// A seam: production uses [`ProviderBackendFactory`]; tests inject stubs.
pub trait BackendFactory: Send + Sync {
    /// Build a backend for this provider with the caller's API key.
    ///
    /// # Errors
    /// Returns [`LlmError`] when the backend cannot be constructed.
    fn create(
        &self,
        provider: Provider,
        api_key: &str,
        config: &Config,
    ) -> Result<Box<dyn LlmBackend>, LlmError>;
}

/// Production factory delegating to the provider backends.
#[derive(Debug, Default)]
pub struct ProviderBackendFactory;

impl BackendFactory for ProviderBackendFactory {
    fn create(
        &self,
        provider: Provider,
        api_key: &str,
        config: &Config,
    ) -> Result<Box<dyn LlmBackend>, LlmError> {
        prismgen_llm::for_provider(provider, api_key, config)
    }
}

/// Orchestrates generation requests end to end.
///
/// Cheap to clone; all shared state is behind `Arc`. Sessions are isolated
/// from each other; the cache store (and its in-flight registry) is the
/// only shared resource.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    config: Arc<Config>,
    extraction: Arc<ExtractionGateway>,
    renderers: Arc<RendererRegistry>,
    cache: Option<Arc<CacheStore>>,
    inflight: InflightRegistry,
    backends: Arc<dyn BackendFactory>,
    output_dir: Utf8PathBuf,
}

impl GenerationOrchestrator {
    /// Build an orchestrator from configuration.
    ///
    /// A cache store that fails to open degrades to the no-cache path with
    /// a warning rather than failing construction.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let cache_dir = config
            .cache
            .dir
            .clone()
            .unwrap_or_else(prismgen_utils::paths::cache_dir);
        let ttl = std::time::Duration::from_secs(config.cache.ttl_secs);

        let cache = if config.cache.enabled {
            match CacheStore::open(cache_dir, ttl) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    warn!(error = %e, "Cache store unavailable; running without cache");
                    None
                }
            }
        } else {
            None
        };

        let output_dir = config
            .engine
            .output_dir
            .clone()
            .unwrap_or_else(prismgen_utils::paths::output_dir);

        Self {
            config: Arc::new(config),
            extraction: Arc::new(ExtractionGateway::builtin()),
            renderers: Arc::new(RendererRegistry::builtin()),
            cache,
            inflight: InflightRegistry::new(),
            backends: Arc::new(ProviderBackendFactory),
            output_dir,
        }
    }

    /// Replace the extraction gateway (to register external parsers).
    #[must_use]
    pub fn with_extraction(mut self, extraction: ExtractionGateway) -> Self {
        self.extraction = Arc::new(extraction);
        self
    }

    /// Replace the renderer registry (to register external renderers).
    #[must_use]
    pub fn with_renderers(mut self, renderers: RendererRegistry) -> Self {
        self.renderers = Arc::new(renderers);
        self
    }

    /// Replace the backend factory (test seam).
    #[must_use]
    pub fn with_backend_factory(mut self, backends: Arc<dyn BackendFactory>) -> Self {
        self.backends = backends;
        self
    }

    /// Cache store, when one is available.
    #[must_use]
    pub fn cache(&self) -> Option<&Arc<CacheStore>> {
        self.cache.as_ref()
    }

    /// Submit a request. Returns the live event stream and a handle that
    /// cancels the session.
    ///
    /// The stream's final element is one of `complete`, `cache_hit`, or
    /// `error`; `progress` elements precede it with non-decreasing
    /// percent. Dropping the stream counts as a client disconnect and
    /// stops further stage execution.
    #[must_use]
    pub fn generate(&self, request: GenerationRequest, api_key: String) -> (EventStream, CancelHandle) {
        let (publisher, stream) = prismgen_events::channel(32);
        let (handle, token) = cancel::pair();

        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator
                .run_session(request, api_key, publisher, token)
                .await;
        });

        (stream, handle)
    }

    async fn run_session(
        &self,
        request: GenerationRequest,
        api_key: String,
        mut publisher: EventPublisher,
        token: CancelToken,
    ) {
        let fingerprint = match Fingerprint::compute(&request.canonical()) {
            Ok(fp) => fp,
            Err(e) => {
                publisher
                    .publish(Event::Error {
                        message: e.to_string(),
                        code: prismgen_utils::error::ErrorCode::Internal,
                    })
                    .await;
                return;
            }
        };

        let mut session = GenerationSession::new(format!("gen_{}", &fingerprint.as_str()[..12]));
        info!(session = session.id(), fingerprint = %fingerprint, "Accepted generation request");

        // Fast path: a completed identical build.
        if request.cache.reuse
            && let Some(entry) = self.cache_lookup(&fingerprint)
        {
            info!(session = session.id(), "Cache hit");
            publisher
                .publish(Event::CacheHit {
                    artifact: entry_to_ref(&entry),
                })
                .await;
            return;
        }

        // At most one concurrent build per fingerprint.
        let guard = match self.inflight.begin(&fingerprint) {
            BuildSlot::Owner(guard) => guard,
            BuildSlot::Follower(mut rx) => {
                debug!(session = session.id(), "Awaiting in-flight identical build");
                let outcome = tokio::select! {
                    received = rx.recv() => received.ok(),
                    () = token.cancelled() => None,
                };
                let event = match outcome {
                    Some(BuildOutcome::Completed(entry)) => Event::CacheHit {
                        artifact: entry_to_ref(&entry),
                    },
                    Some(BuildOutcome::Failed(message)) => Event::Error {
                        message: format!("identical in-flight build did not complete: {message}"),
                        code: prismgen_utils::error::ErrorCode::BuildInProgress,
                    },
                    None => Event::Error {
                        message: "cancelled".to_string(),
                        code: prismgen_utils::error::ErrorCode::Cancelled,
                    },
                };
                publisher.publish(event).await;
                return;
            }
        };

        let timeout = self.config.engine.session_timeout();
        let result = tokio::select! {
            () = token.cancelled() => Err(EngineError::Cancelled),
            timed = tokio::time::timeout(
                timeout,
                self.pipeline(&request, &api_key, &fingerprint, &mut session, &mut publisher),
            ) => match timed {
                Ok(result) => result,
                Err(_) => Err(EngineError::SessionTimeout { duration: timeout }),
            },
        };

        match result {
            Ok(entry) => {
                guard.complete(BuildOutcome::Completed(entry.clone()));
                session.enter(Stage::Complete);
                publisher
                    .publish(progress(Stage::Complete, Some("Generation complete".into())))
                    .await;
                publisher
                    .publish(Event::Complete {
                        artifact: entry_to_ref(&entry),
                    })
                    .await;
                info!(session = session.id(), usage = ?session.usage(), "Session complete");
            }
            Err(e) => {
                guard.complete(BuildOutcome::Failed(e.to_string()));
                session.enter(Stage::Failed);
                warn!(session = session.id(), error = %e, "Session failed");
                publisher
                    .publish(Event::Error {
                        message: e.to_string(),
                        code: e.code(),
                    })
                    .await;
            }
        }
    }

    /// The staged pipeline body. Runs under the session timeout and the
    /// cancellation select; returns the stored cache entry on success.
    async fn pipeline(
        &self,
        request: &GenerationRequest,
        api_key: &str,
        fingerprint: &Fingerprint,
        session: &mut GenerationSession,
        publisher: &mut EventPublisher,
    ) -> Result<CacheEntry, EngineError> {
        // Detecting: classification is total, but an empty request is an
        // input error.
        session.enter(Stage::Detecting);
        emit(
            publisher,
            Stage::Detecting,
            Some(format!("Classifying {} sources", request.sources.len())),
        )
        .await?;

        if request.sources.is_empty() {
            return Err(EngineError::Extraction(
                prismgen_utils::error::ExtractionError::UnsupportedSource(
                    "request has no sources".to_string(),
                ),
            ));
        }

        // Extracting: failures are input errors, never retried.
        session.enter(Stage::Extracting);
        emit(publisher, Stage::Extracting, Some("Extracting sources".into())).await?;
        let text = self.extraction.collect(&request.sources).await?;

        let backend = self
            .backends
            .create(request.provider, api_key, &self.config)?;

        // Transforming, with retries against the shared budget.
        let mut budget = RetryBudget::new(self.config.engine.max_retries);
        session.enter(Stage::Transforming);
        emit(publisher, Stage::Transforming, Some("Structuring content".into())).await?;
        let mut model = self
            .transform_with_retries(&*backend, request, &text, session, &mut budget)
            .await?;

        // Rendering and validating share the remaining budget, with a
        // one-time fallback to transformation after repeated failures.
        let renderer = self.renderers.for_kind(request.output_kind)?;
        let output_path = self.output_dir.join(format!(
            "{}.{}",
            fingerprint,
            request.output_kind.extension()
        ));

        let expectations = Expectations {
            max_slides: request.preferences.max_slides.max(1),
            ..Expectations::default()
        };

        let mut consecutive_render_failures: u32 = 0;
        let mut fell_back = false;

        let artifact: Artifact = loop {
            session.enter(Stage::Rendering);
            emit(publisher, Stage::Rendering, Some("Rendering artifact".into())).await?;
            session.record_render_attempt();

            let (reason, failure): (RetryReason, EngineError) =
                match renderer.render(&model, &output_path).await {
                    Err(e) => {
                        if matches!(e, prismgen_utils::error::RenderError::NoRenderer { .. }) {
                            // Permanent: retrying cannot conjure a renderer.
                            return Err(EngineError::Render(e));
                        }
                        (RetryReason::RenderFailed, EngineError::Render(e))
                    }
                    Ok(artifact) => {
                        session.enter(Stage::Validating);
                        emit(publisher, Stage::Validating, Some("Validating artifact".into()))
                            .await?;
                        session.record_validate_attempt();

                        match ArtifactValidator::validate(
                            &artifact,
                            request.output_kind,
                            &expectations,
                        ) {
                            Ok(()) => break artifact,
                            Err(issues) => (
                                RetryReason::ValidationFailed,
                                EngineError::Validation { issues },
                            ),
                        }
                    }
                };

            debug_assert!(reason.is_render_shaped());
            consecutive_render_failures += 1;
            session.record_non_fatal(failure.to_string());
            warn!(session = session.id(), error = %failure, "Render-stage failure");

            let Some(retry_number) = budget.try_consume() else {
                return Err(EngineError::RetryExhausted {
                    attempts: budget.used(),
                    last_error: failure.to_string(),
                });
            };
            tokio::time::sleep(backoff_delay(retry_number)).await;

            if consecutive_render_failures >= RENDER_FALLBACK_THRESHOLD && !fell_back {
                // The content model itself is suspect: fall back one level
                // for a fresh transformation. The fallback consumed a unit
                // of the shared budget above, so total attempts stay
                // bounded.
                fell_back = true;
                consecutive_render_failures = 0;
                info!(session = session.id(), "Falling back to re-transformation");

                session.enter(Stage::Transforming);
                emit(
                    publisher,
                    Stage::Transforming,
                    Some("Re-transforming after repeated render failures".into()),
                )
                .await?;
                session.record_transform_attempt();
                model = self.transform_once(&*backend, request, &text, session).await?;
            }
        };

        // Store before the terminal event: a client racing a second
        // identical request after `complete` must observe a cache hit.
        let entry = CacheEntry {
            fingerprint: fingerprint.to_string(),
            artifact_path: artifact.path.clone(),
            content_hash: artifact.content_hash.clone(),
            size_bytes: artifact.size_bytes,
            title: artifact.metadata.title.clone(),
            pages: artifact.metadata.pages,
            slides: artifact.metadata.slides,
            usage: session.usage(),
            created_at: Utc::now(),
        };

        if let Some(cache) = &self.cache {
            let overwrite = !request.cache.reuse;
            if let Err(e) = cache.store(fingerprint, &entry, overwrite) {
                // Degrade to the no-cache path; the build itself succeeded.
                warn!(session = session.id(), error = %e, "Cache store failed; continuing uncached");
            }
        }

        Ok(entry)
    }

    /// Transformation with in-place retries against the shared budget.
    async fn transform_with_retries(
        &self,
        backend: &dyn LlmBackend,
        request: &GenerationRequest,
        text: &str,
        session: &mut GenerationSession,
        budget: &mut RetryBudget,
    ) -> Result<ContentModel, EngineError> {
        loop {
            session.record_transform_attempt();
            let failure = match self.transform_once(backend, request, text, session).await {
                Ok(model) => return Ok(model),
                Err(e) => e,
            };

            let retryable = match &failure {
                EngineError::Llm(e) => e.is_retryable(),
                EngineError::MalformedModelOutput(_) => true,
                _ => false,
            };
            if !retryable {
                return Err(failure);
            }

            let Some(retry_number) = budget.try_consume() else {
                return Err(EngineError::RetryExhausted {
                    attempts: budget.used(),
                    last_error: failure.to_string(),
                });
            };

            session.record_non_fatal(failure.to_string());
            warn!(
                session = session.id(),
                retry = retry_number,
                error = %failure,
                "Transformation failed, retrying"
            );
            tokio::time::sleep(backoff_delay(retry_number)).await;
        }
    }

    /// One transformation attempt: prompt, invoke, parse, sanity-check.
    async fn transform_once(
        &self,
        backend: &dyn LlmBackend,
        request: &GenerationRequest,
        text: &str,
        session: &mut GenerationSession,
    ) -> Result<ContentModel, EngineError> {
        let prompt = TransformPrompt::new(request.output_kind)
            .with_audience(request.preferences.audience)
            .with_max_slides(request.preferences.max_slides)
            .with_max_summary_points(request.preferences.max_summary_points);

        let llm_timeout = std::time::Duration::from_secs(
            self.config.llm.timeout_secs.unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
        );

        let invocation = LlmInvocation::new(
            session.id(),
            "transform",
            request.model.clone(),
            llm_timeout,
            vec![
                Message::system(prompt.system()),
                Message::user(prompt.user(text)),
            ],
        )
        .with_metadata(
            "max_tokens",
            serde_json::json!(request.preferences.max_tokens),
        )
        .with_metadata(
            "temperature",
            serde_json::json!(request.preferences.temperature),
        );

        let result = backend.invoke(invocation).await?;
        if let Some(usage) = result.usage {
            session.record_usage(usage);
        }

        let model: ContentModel = parse_model_json(&result.raw_response)
            .map_err(|e| EngineError::MalformedModelOutput(e.to_string()))?;

        if model.is_empty() {
            return Err(EngineError::MalformedModelOutput(
                "content model has no renderable content".to_string(),
            ));
        }

        Ok(model)
    }

    fn cache_lookup(&self, fingerprint: &Fingerprint) -> Option<CacheEntry> {
        let cache = self.cache.as_ref()?;
        match cache.lookup(fingerprint) {
            Ok(entry) => entry,
            Err(e) => {
                // Degrade to the no-cache path.
                warn!(error = %e, "Cache lookup failed; treating as miss");
                None
            }
        }
    }
}

fn progress(stage: Stage, message: Option<String>) -> Event {
    Event::Progress {
        stage,
        percent: stage_percent(stage),
        message,
    }
}

/// Publish a progress event, treating a disconnected consumer as
/// cancellation.
async fn emit(
    publisher: &mut EventPublisher,
    stage: Stage,
    message: Option<String>,
) -> Result<(), EngineError> {
    if publisher.publish(progress(stage, message)).await {
        Ok(())
    } else {
        Err(EngineError::Cancelled)
    }
}

fn entry_to_ref(entry: &CacheEntry) -> ArtifactRef {
    ArtifactRef {
        path: entry.artifact_path.clone(),
        content_hash: entry.content_hash.clone(),
        title: entry.title.clone(),
        pages: entry.pages,
        slides: entry.slides,
    }
}
