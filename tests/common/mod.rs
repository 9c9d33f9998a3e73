//! Shared test support: scripted LLM backends and orchestrator harnesses.
#![allow(dead_code)] // Each integration test binary uses a different subset.

use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use prismgen::{BackendFactory, Config, GenerationOrchestrator, Provider};
use prismgen_llm::{LlmBackend, LlmError, LlmInvocation, LlmResult};

/// A syntactically valid document content model.
pub const VALID_DOCUMENT: &str =
    r#"{"kind":"document","title":"T","sections":[{"heading":"H","body":"Body text"}]}"#;

/// Backend that replays a scripted sequence of outcomes and can block on a
/// gate to let tests control build timing.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicU32,
    gate: Option<Arc<tokio::sync::Notify>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicU32::new(0),
            gate: None,
        })
    }

    /// Each invocation waits on the gate before responding.
    pub fn gated(script: Vec<Result<String, LlmError>>, gate: Arc<tokio::sync::Notify>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            calls: AtomicU32::new(0),
            gate: Some(gate),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmBackend for ScriptedBackend {
    async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(LlmResult::new(text, "stub", "stub-model").with_usage(10, 20)),
            Some(Err(e)) => Err(e),
            None => Ok(LlmResult::new(VALID_DOCUMENT, "stub", "stub-model")),
        }
    }
}

struct SharedBackend(Arc<ScriptedBackend>);

#[async_trait]
impl LlmBackend for SharedBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        self.0.invoke(inv).await
    }
}

pub struct StubFactory(pub Arc<ScriptedBackend>);

impl BackendFactory for StubFactory {
    fn create(
        &self,
        _provider: Provider,
        _api_key: &str,
        _config: &Config,
    ) -> Result<Box<dyn LlmBackend>, LlmError> {
        Ok(Box::new(SharedBackend(Arc::clone(&self.0))))
    }
}

/// Orchestrator wired to temp dirs and a scripted backend.
pub struct Harness {
    pub orchestrator: GenerationOrchestrator,
    pub backend: Arc<ScriptedBackend>,
    _dirs: (TempDir, TempDir),
}

pub fn harness(backend: Arc<ScriptedBackend>) -> Harness {
    let cache_dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.cache.dir = Some(Utf8PathBuf::from_path_buf(cache_dir.path().to_path_buf()).unwrap());
    config.engine.output_dir =
        Some(Utf8PathBuf::from_path_buf(out_dir.path().to_path_buf()).unwrap());

    let orchestrator = GenerationOrchestrator::new(config)
        .with_backend_factory(Arc::new(StubFactory(Arc::clone(&backend))));

    Harness {
        orchestrator,
        backend,
        _dirs: (cache_dir, out_dir),
    }
}
