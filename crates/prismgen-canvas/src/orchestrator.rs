//! The canvas session orchestrator.
//!
//! Unlike the generation pipeline, transitions here are content-driven:
//! each turn the model either poses the next question or signals
//! completion. Sessions live in an in-memory registry; each operation
//! locks the registry only long enough to read or commit state, never
//! across a model call, so independent sessions proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use camino::Utf8PathBuf;
use prismgen_config::Config;
use prismgen_content::strip_markdown_fences;
use prismgen_engine::{BackendFactory, ProviderBackendFactory};
use prismgen_llm::{LlmInvocation, Message};
use prismgen_render::{Artifact, ArtifactRenderer, MarkdownRenderer};
use prismgen_utils::error::{CanvasError, ErrorCode};
use prismgen_utils::types::Provider;

use crate::prompts;
use crate::question::{self, CanvasQuestion, ModelTurn, parse_model_turn};
use crate::session::{CanvasSession, CanvasState, MAX_QUESTIONS};
use crate::templates::CanvasTemplate;

/// Default per-call timeout when the config leaves it unset.
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Max output tokens for question-generation calls.
const QUESTION_MAX_TOKENS: u32 = 2000;

/// Max output tokens for report generation.
const REPORT_MAX_TOKENS: u32 = 4000;

/// Sampling temperature for canvas calls.
const CANVAS_TEMPERATURE: f32 = 0.7;

/// Completion message when the hard cap fires without a model summary.
const HARD_CAP_MESSAGE: &str =
    "We've covered a lot of ground! Ready to generate your implementation spec.";

/// Completion message when the model suggests completion without a summary.
const DEFAULT_COMPLETE_MESSAGE: &str =
    "I think we've explored the key areas of your idea. Ready to generate your implementation spec?";

/// Parameters for starting a canvas session.
#[derive(Debug, Clone)]
pub struct CanvasStartRequest {
    pub template: CanvasTemplate,
    pub idea: String,
    pub provider: Provider,
    pub model: String,
}

/// One element of a canvas operation's event stream.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanvasEvent {
    /// Non-terminal status note.
    Progress { message: String },
    /// Terminal: a question is exposed and awaiting an answer.
    Ready {
        session_id: String,
        question: CanvasQuestion,
    },
    /// Terminal: the exploration is complete; a report can be generated.
    SuggestComplete {
        session_id: String,
        message: String,
    },
    /// Terminal: the operation failed. For answer flows the submitted
    /// answer is retained and the session is resumable via `retry`.
    Error { message: String, code: ErrorCode },
}

impl CanvasEvent {
    /// Whether this event terminates the stream.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Consumer half of a canvas operation's event stream.
pub struct CanvasEventStream {
    receiver: mpsc::Receiver<CanvasEvent>,
}

impl CanvasEventStream {
    /// Receive the next event; `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<CanvasEvent> {
        self.receiver.recv().await
    }

    /// Drain all remaining events until the stream closes.
    pub async fn collect(mut self) -> Vec<CanvasEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }
        events
    }
}

/// A generated canvas report.
#[derive(Debug, Clone)]
pub struct CanvasReport {
    pub title: String,
    pub markdown: String,
    pub artifact: Artifact,
}

/// Manages canvas sessions and drives their model calls.
#[derive(Clone)]
pub struct CanvasOrchestrator {
    config: Arc<Config>,
    backends: Arc<dyn BackendFactory>,
    sessions: Arc<Mutex<HashMap<String, CanvasSession>>>,
    output_dir: Utf8PathBuf,
}

impl CanvasOrchestrator {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let output_dir = config
            .engine
            .output_dir
            .clone()
            .unwrap_or_else(prismgen_utils::paths::output_dir);

        Self {
            config: Arc::new(config),
            backends: Arc::new(ProviderBackendFactory),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            output_dir,
        }
    }

    /// Replace the backend factory (test seam).
    #[must_use]
    pub fn with_backend_factory(mut self, backends: Arc<dyn BackendFactory>) -> Self {
        self.backends = backends;
        self
    }

    /// Snapshot of a session, for inspection.
    pub async fn session(&self, session_id: &str) -> Option<CanvasSession> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        self.sessions.lock().await.remove(session_id).is_some()
    }

    /// Start a session. The stream culminates in `ready` with the first
    /// question, `suggest_complete` for an idea the model considers fully
    /// specified up front, or `error`.
    #[must_use]
    pub fn start(&self, request: CanvasStartRequest, api_key: String) -> CanvasEventStream {
        let (sender, receiver) = mpsc::channel(8);
        let orchestrator = self.clone();

        tokio::spawn(async move {
            let session_id = question::session_id();
            let session = CanvasSession::new(
                session_id.clone(),
                request.template,
                request.idea.clone(),
                request.provider,
                request.model.clone(),
            );
            orchestrator
                .sessions
                .lock()
                .await
                .insert(session_id.clone(), session);
            info!(session = %session_id, template = %request.template, "Canvas session started");

            let _ = sender
                .send(CanvasEvent::Progress {
                    message: "Starting canvas session...".to_string(),
                })
                .await;
            let _ = sender
                .send(CanvasEvent::Progress {
                    message: "Generating first question...".to_string(),
                })
                .await;

            let turn = orchestrator
                .question_call(
                    &session_id,
                    request.provider,
                    &api_key,
                    &request.model,
                    "first_question",
                    prompts::question_system_prompt(request.template),
                    prompts::first_question_prompt(&request.idea, request.template),
                )
                .await;

            let event = orchestrator.commit_turn(&session_id, turn).await;
            let _ = sender.send(event).await;
        });

        CanvasEventStream { receiver }
    }

    /// Submit an answer to the session's current question. The stream
    /// culminates in `ready` with the next question, `suggest_complete`,
    /// or `error`.
    ///
    /// The answer is appended to history before the model call; on model
    /// failure the history item is retained and the session is resumable
    /// via [`retry`](Self::retry).
    #[must_use]
    pub fn answer(
        &self,
        session_id: String,
        question_id: String,
        value: String,
        api_key: String,
    ) -> CanvasEventStream {
        let (sender, receiver) = mpsc::channel(8);
        let orchestrator = self.clone();

        tokio::spawn(async move {
            // Commit the answer under the registry lock, before any model
            // call. Invalid-state failures must not mutate the session.
            let prepared = {
                let mut sessions = orchestrator.sessions.lock().await;
                let Some(session) = sessions.get_mut(&session_id) else {
                    let err = CanvasError::SessionNotFound(session_id.clone());
                    let _ = sender
                        .send(CanvasEvent::Error {
                            message: err.to_string(),
                            code: err.code(),
                        })
                        .await;
                    return;
                };
                match session.accept_answer(&question_id, value) {
                    Ok(()) => (
                        session.provider,
                        session.model.clone(),
                        session.template,
                        session.idea.clone(),
                        session.history().to_vec(),
                        session.question_count(),
                    ),
                    Err(err) => {
                        let _ = sender
                            .send(CanvasEvent::Error {
                                message: err.to_string(),
                                code: err.code(),
                            })
                            .await;
                        return;
                    }
                }
            };
            let (provider, model, template, idea, history, question_count) = prepared;

            let _ = sender
                .send(CanvasEvent::Progress {
                    message: "Processing answer...".to_string(),
                })
                .await;
            let _ = sender
                .send(CanvasEvent::Progress {
                    message: "Generating next question...".to_string(),
                })
                .await;

            let turn = orchestrator
                .question_call(
                    &session_id,
                    provider,
                    &api_key,
                    &model,
                    "next_question",
                    prompts::question_system_prompt(template),
                    prompts::next_question_prompt(&idea, &history, question_count),
                )
                .await;

            let event = orchestrator.commit_turn(&session_id, turn).await;
            let _ = sender.send(event).await;
        });

        CanvasEventStream { receiver }
    }

    /// Re-issue the failed model call of an `Error`-state session, using
    /// the history as already committed (no new append).
    #[must_use]
    pub fn retry(&self, session_id: String, api_key: String) -> CanvasEventStream {
        let (sender, receiver) = mpsc::channel(8);
        let orchestrator = self.clone();

        tokio::spawn(async move {
            let prepared = {
                let mut sessions = orchestrator.sessions.lock().await;
                let Some(session) = sessions.get_mut(&session_id) else {
                    let err = CanvasError::SessionNotFound(session_id.clone());
                    let _ = sender
                        .send(CanvasEvent::Error {
                            message: err.to_string(),
                            code: err.code(),
                        })
                        .await;
                    return;
                };
                if session.state != CanvasState::Error {
                    let err = CanvasError::InvalidState {
                        operation: "retry".to_string(),
                        reason: "session is not in an error state".to_string(),
                    };
                    let _ = sender
                        .send(CanvasEvent::Error {
                            message: err.to_string(),
                            code: err.code(),
                        })
                        .await;
                    return;
                }
                // Mark the call in flight so go_back stays unavailable
                // until the retried turn commits.
                session.state = CanvasState::Answering;
                (
                    session.provider,
                    session.model.clone(),
                    session.template,
                    session.idea.clone(),
                    session.history().to_vec(),
                    session.question_count(),
                )
            };
            let (provider, model, template, idea, history, question_count) = prepared;

            let _ = sender
                .send(CanvasEvent::Progress {
                    message: "Retrying...".to_string(),
                })
                .await;

            let turn = if history.is_empty() {
                orchestrator
                    .question_call(
                        &session_id,
                        provider,
                        &api_key,
                        &model,
                        "first_question",
                        prompts::question_system_prompt(template),
                        prompts::first_question_prompt(&idea, template),
                    )
                    .await
            } else {
                orchestrator
                    .question_call(
                        &session_id,
                        provider,
                        &api_key,
                        &model,
                        "next_question",
                        prompts::question_system_prompt(template),
                        prompts::next_question_prompt(&idea, &history, question_count),
                    )
                    .await
            };

            let event = orchestrator.commit_turn(&session_id, turn).await;
            let _ = sender.send(event).await;
        });

        CanvasEventStream { receiver }
    }

    /// Pop the most recent answer and re-expose its question. Pure local
    /// operation: no model call is issued.
    ///
    /// # Errors
    /// Returns [`CanvasError`] when the session is unknown, history is
    /// empty, or a model call is in flight.
    pub async fn go_back(&self, session_id: &str) -> Result<CanvasQuestion, CanvasError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| CanvasError::SessionNotFound(session_id.to_string()))?;
        let question = session.go_back()?.clone();
        debug!(session = %session_id, question = %question.id, "Went back one step");
        Ok(question)
    }

    /// Generate the rendered report for a completed session.
    ///
    /// One-shot transform+render outside the conversational state machine;
    /// only valid from `SuggestComplete`.
    ///
    /// # Errors
    /// Returns [`CanvasError`] for unknown sessions, wrong state, model
    /// failures, or render failures.
    pub async fn report(
        &self,
        session_id: &str,
        api_key: &str,
    ) -> Result<CanvasReport, CanvasError> {
        let (provider, model, template, idea, history, question_count) = {
            let sessions = self.sessions.lock().await;
            let session = sessions
                .get(session_id)
                .ok_or_else(|| CanvasError::SessionNotFound(session_id.to_string()))?;
            if session.state != CanvasState::SuggestComplete {
                return Err(CanvasError::InvalidState {
                    operation: "report".to_string(),
                    reason: format!(
                        "report requires a completed exploration, state is {:?}",
                        session.state
                    ),
                });
            }
            (
                session.provider,
                session.model.clone(),
                session.template,
                session.idea.clone(),
                session.history().to_vec(),
                session.question_count(),
            )
        };

        let backend = self.backends.create(provider, api_key, &self.config)?;
        let invocation = LlmInvocation::new(
            session_id,
            "generate_report",
            model,
            self.llm_timeout(),
            vec![
                Message::system(prompts::report_system_prompt(template)),
                Message::user(prompts::report_user_prompt(&idea, template, &history)),
            ],
        )
        .with_metadata("max_tokens", serde_json::json!(REPORT_MAX_TOKENS))
        .with_metadata("temperature", serde_json::json!(CANVAS_TEMPERATURE));

        let result = backend.invoke(invocation).await?;
        let body = strip_markdown_fences(&result.raw_response).to_string();

        let (doc_type, _, _) = template.report_shape();
        let truncated: String = idea.chars().take(50).collect();
        let ellipsis = if idea.chars().count() > 50 { "..." } else { "" };
        let title = format!("{doc_type}: {truncated}{ellipsis}");

        let mut markdown = body;
        let log = prompts::decision_log(&history);
        if !log.is_empty() {
            markdown.push_str("\n\n");
            markdown.push_str(&log);
        }
        markdown.push_str(&format!(
            "\n\n---\n*Generated by PrismGen on {} | Based on {} exploration questions*\n",
            chrono::Utc::now().format("%Y-%m-%d %H:%M"),
            question_count,
        ));

        let output_path = self.output_dir.join(format!("{session_id}_report.md"));
        let model = prismgen_content::ContentModel::Document {
            title: title.clone(),
            sections: vec![prismgen_content::DocumentSection {
                heading: doc_type.to_string(),
                body: markdown.clone(),
            }],
        };
        let artifact = MarkdownRenderer.render(&model, &output_path).await?;

        info!(session = %session_id, path = %artifact.path, "Canvas report generated");
        Ok(CanvasReport {
            title,
            markdown,
            artifact,
        })
    }

    /// Issue one question-generation model call.
    async fn question_call(
        &self,
        session_id: &str,
        provider: Provider,
        api_key: &str,
        model: &str,
        purpose: &str,
        system: String,
        user: String,
    ) -> Result<ModelTurn, CanvasError> {
        let backend = self.backends.create(provider, api_key, &self.config)?;
        let invocation = LlmInvocation::new(
            session_id,
            purpose,
            model,
            self.llm_timeout(),
            vec![Message::system(system), Message::user(user)],
        )
        .with_metadata("max_tokens", serde_json::json!(QUESTION_MAX_TOKENS))
        .with_metadata("temperature", serde_json::json!(CANVAS_TEMPERATURE));

        let result = backend.invoke(invocation).await?;
        parse_model_turn(&result.raw_response)
    }

    /// Commit a model turn to the session and produce the terminal event.
    async fn commit_turn(
        &self,
        session_id: &str,
        turn: Result<ModelTurn, CanvasError>,
    ) -> CanvasEvent {
        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(session_id) else {
            let err = CanvasError::SessionNotFound(session_id.to_string());
            return CanvasEvent::Error {
                message: err.to_string(),
                code: err.code(),
            };
        };

        match turn {
            Ok(ModelTurn::Complete { summary }) => {
                let message = summary
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMPLETE_MESSAGE.to_string());
                session.complete(summary);
                CanvasEvent::SuggestComplete {
                    session_id: session_id.to_string(),
                    message,
                }
            }
            Ok(ModelTurn::Question(question)) => {
                // The model decides completion; the hard cap is the
                // absolute fallback so sessions always terminate.
                if session.question_count() >= MAX_QUESTIONS {
                    warn!(session = %session_id, cap = MAX_QUESTIONS, "Question cap reached, forcing completion");
                    session.complete(None);
                    return CanvasEvent::SuggestComplete {
                        session_id: session_id.to_string(),
                        message: HARD_CAP_MESSAGE.to_string(),
                    };
                }
                session.pose_question(question.clone());
                CanvasEvent::Ready {
                    session_id: session_id.to_string(),
                    question,
                }
            }
            Err(err) => {
                warn!(session = %session_id, error = %err, "Canvas model call failed");
                session.fail(err.to_string());
                CanvasEvent::Error {
                    message: err.to_string(),
                    code: err.code(),
                }
            }
        }
    }

    fn llm_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(
            self.config
                .llm
                .timeout_secs
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question::QuestionKind;
    use async_trait::async_trait;
    use prismgen_llm::{LlmBackend, LlmError, LlmResult};
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    const FIRST_QUESTION: &str = r#"{
        "question": "Who is the primary user?",
        "type": "single_choice",
        "options": [
            {"id": "opt_1", "label": "Individuals", "recommended": true},
            {"id": "opt_2", "label": "Teams"}
        ]
    }"#;

    const SECOND_QUESTION: &str = r#"{
        "question": "What platform first?",
        "type": "single_choice",
        "options": [
            {"id": "opt_1", "label": "Web", "recommended": true},
            {"id": "opt_2", "label": "Mobile"}
        ]
    }"#;

    const COMPLETE_TURN: &str =
        r#"{"suggest_complete": true, "summary": "Scope and stack are settled."}"#;

    struct ScriptedBackend {
        script: StdMutex<VecDeque<Result<String, LlmError>>>,
        calls: AtomicU32,
        hang_when_exhausted: bool,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
                hang_when_exhausted: false,
            })
        }

        fn hanging_after(script: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                script: StdMutex::new(script.into_iter().collect()),
                calls: AtomicU32::new(0),
                hang_when_exhausted: true,
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmBackend for ScriptedBackend {
        async fn invoke(&self, _inv: LlmInvocation) -> Result<LlmResult, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Ok(text)) => Ok(LlmResult::new(text, "stub", "stub-model")),
                Some(Err(e)) => Err(e),
                None if self.hang_when_exhausted => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
                None => Ok(LlmResult::new(SECOND_QUESTION, "stub", "stub-model")),
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

    struct StubFactory(Arc<ScriptedBackend>);

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

    struct TestHarness {
        orchestrator: CanvasOrchestrator,
        backend: Arc<ScriptedBackend>,
        _out_dir: TempDir,
    }

    fn harness(backend: Arc<ScriptedBackend>) -> TestHarness {
        let out_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.engine.output_dir =
            Some(Utf8PathBuf::from_path_buf(out_dir.path().to_path_buf()).unwrap());

        let orchestrator = CanvasOrchestrator::new(config)
            .with_backend_factory(Arc::new(StubFactory(Arc::clone(&backend))));

        TestHarness {
            orchestrator,
            backend,
            _out_dir: out_dir,
        }
    }

    fn start_request() -> CanvasStartRequest {
        CanvasStartRequest {
            template: CanvasTemplate::Custom,
            idea: "build a task app".to_string(),
            provider: Provider::Anthropic,
            model: "stub-model".to_string(),
        }
    }

    /// Start a session and return its id and first question.
    async fn started(h: &TestHarness) -> (String, CanvasQuestion) {
        let events = h
            .orchestrator
            .start(start_request(), "key".into())
            .collect()
            .await;
        let Some(CanvasEvent::Ready {
            session_id,
            question,
        }) = events.last()
        else {
            panic!("expected ready, got {events:?}");
        };
        (session_id.clone(), question.clone())
    }

    #[tokio::test]
    async fn test_start_yields_ready_with_first_question() {
        let h = harness(ScriptedBackend::new(vec![Ok(FIRST_QUESTION.into())]));
        let events = h
            .orchestrator
            .start(start_request(), "key".into())
            .collect()
            .await;

        // Progress events first, exactly one terminal, and it is last.
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        let Some(CanvasEvent::Ready {
            session_id,
            question,
        }) = events.last()
        else {
            panic!("expected ready, got {events:?}");
        };
        assert!(session_id.starts_with("sess_"));
        assert_eq!(question.prompt, "Who is the primary user?");
        assert!(matches!(question.kind, QuestionKind::SingleChoice { .. }));

        let session = h.orchestrator.session(session_id).await.unwrap();
        assert_eq!(session.state, CanvasState::Ready);
        assert_eq!(session.question_count(), 1);
    }

    #[tokio::test]
    async fn test_answer_transitions_through_answering_to_ready() {
        let h = harness(ScriptedBackend::hanging_after(vec![Ok(
            FIRST_QUESTION.into()
        )]));
        let (session_id, question) = started(&h).await;

        // The next-question call hangs, so the session is observably in
        // `Answering` after the answer is committed.
        let mut stream = h.orchestrator.answer(
            session_id.clone(),
            question.id.clone(),
            "Individuals".into(),
            "key".into(),
        );
        assert!(matches!(
            stream.next().await,
            Some(CanvasEvent::Progress { .. })
        ));
        tokio::task::yield_now().await;

        let session = h.orchestrator.session(&session_id).await.unwrap();
        assert_eq!(session.state, CanvasState::Answering);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].answer, "Individuals");
    }

    #[tokio::test]
    async fn test_answer_flow_reaches_next_question() {
        let h = harness(ScriptedBackend::new(vec![
            Ok(FIRST_QUESTION.into()),
            Ok(SECOND_QUESTION.into()),
        ]));
        let (session_id, question) = started(&h).await;

        let events = h
            .orchestrator
            .answer(session_id.clone(), question.id, "Individuals".into(), "key".into())
            .collect()
            .await;

        let Some(CanvasEvent::Ready { question: next, .. }) = events.last() else {
            panic!("expected ready, got {events:?}");
        };
        assert_eq!(next.prompt, "What platform first?");

        let session = h.orchestrator.session(&session_id).await.unwrap();
        assert_eq!(session.state, CanvasState::Ready);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.question_count(), 2);
    }

    #[tokio::test]
    async fn test_answer_without_session_errors() {
        let h = harness(ScriptedBackend::new(vec![]));
        let events = h
            .orchestrator
            .answer("sess_missing".into(), "q_1".into(), "x".into(), "key".into())
            .collect()
            .await;
        assert!(matches!(
            events.last(),
            Some(CanvasEvent::Error {
                code: ErrorCode::InvalidState,
                ..
            })
        ));
        assert_eq!(h.backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_answer_wrong_question_id_leaves_state_unchanged() {
        let h = harness(ScriptedBackend::new(vec![Ok(FIRST_QUESTION.into())]));
        let (session_id, _question) = started(&h).await;

        let events = h
            .orchestrator
            .answer(session_id.clone(), "q_wrong".into(), "x".into(), "key".into())
            .collect()
            .await;
        assert!(matches!(events.last(), Some(CanvasEvent::Error { .. })));

        let session = h.orchestrator.session(&session_id).await.unwrap();
        assert_eq!(session.state, CanvasState::Ready);
        assert!(session.history().is_empty());
        assert_eq!(h.backend.calls(), 1, "no extra model call");
    }

    #[tokio::test]
    async fn test_model_failure_keeps_answer_and_is_retryable() {
        let h = harness(ScriptedBackend::new(vec![
            Ok(FIRST_QUESTION.into()),
            Err(LlmError::ProviderOutage("503".into())),
            Ok(SECOND_QUESTION.into()),
        ]));
        let (session_id, question) = started(&h).await;

        let events = h
            .orchestrator
            .answer(session_id.clone(), question.id, "Individuals".into(), "key".into())
            .collect()
            .await;
        assert!(matches!(
            events.last(),
            Some(CanvasEvent::Error {
                code: ErrorCode::ProviderUnavailable,
                ..
            })
        ));

        // The submitted answer was not rolled back.
        let session = h.orchestrator.session(&session_id).await.unwrap();
        assert_eq!(session.state, CanvasState::Error);
        assert_eq!(session.history().len(), 1);

        // Retry resumes from the committed history without a new append.
        let events = h
            .orchestrator
            .retry(session_id.clone(), "key".into())
            .collect()
            .await;
        assert!(matches!(events.last(), Some(CanvasEvent::Ready { .. })));
        let session = h.orchestrator.session(&session_id).await.unwrap();
        assert_eq!(session.state, CanvasState::Ready);
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_go_back_restores_previous_question_without_model_call() {
        let h = harness(ScriptedBackend::new(vec![
            Ok(FIRST_QUESTION.into()),
            Ok(SECOND_QUESTION.into()),
        ]));
        let (session_id, question) = started(&h).await;
        let first_prompt = question.prompt.clone();

        h.orchestrator
            .answer(session_id.clone(), question.id, "Individuals".into(), "key".into())
            .collect()
            .await;
        let calls_before = h.backend.calls();

        let restored = h.orchestrator.go_back(&session_id).await.unwrap();
        assert_eq!(restored.prompt, first_prompt);
        assert_eq!(h.backend.calls(), calls_before, "go_back is model-free");

        let session = h.orchestrator.session(&session_id).await.unwrap();
        assert_eq!(session.state, CanvasState::Ready);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_suggest_complete_then_report() {
        let h = harness(ScriptedBackend::new(vec![
            Ok(FIRST_QUESTION.into()),
            Ok(COMPLETE_TURN.into()),
            Ok("# Plan\n\nBuild the thing.".into()),
        ]));
        let (session_id, question) = started(&h).await;

        let events = h
            .orchestrator
            .answer(session_id.clone(), question.id, "Individuals".into(), "key".into())
            .collect()
            .await;
        let Some(CanvasEvent::SuggestComplete { message, .. }) = events.last() else {
            panic!("expected suggest_complete, got {events:?}");
        };
        assert_eq!(message, "Scope and stack are settled.");

        let report = h.orchestrator.report(&session_id, "key").await.unwrap();
        assert!(report.title.starts_with("Comprehensive Plan:"));
        assert!(report.markdown.contains("Build the thing."));
        assert!(report.markdown.contains("## Decision Log"));
        assert!(report.markdown.contains("Generated by PrismGen"));
        assert!(report.artifact.path.as_std_path().exists());
    }

    #[tokio::test]
    async fn test_report_requires_completed_session() {
        let h = harness(ScriptedBackend::new(vec![Ok(FIRST_QUESTION.into())]));
        let (session_id, _question) = started(&h).await;

        let err = h.orchestrator.report(&session_id, "key").await.unwrap_err();
        assert!(matches!(err, CanvasError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn test_hard_cap_forces_completion() {
        // The model keeps asking questions forever; the cap must stop it.
        let h = harness(ScriptedBackend::new(vec![Ok(FIRST_QUESTION.into())]));
        let (session_id, mut question) = started(&h).await;

        for i in 0..MAX_QUESTIONS {
            let events = h
                .orchestrator
                .answer(
                    session_id.clone(),
                    question.id.clone(),
                    format!("answer {i}"),
                    "key".into(),
                )
                .collect()
                .await;
            match events.last() {
                Some(CanvasEvent::Ready { question: next, .. }) => question = next.clone(),
                Some(CanvasEvent::SuggestComplete { message, .. }) => {
                    assert_eq!(message, HARD_CAP_MESSAGE);
                    let session = h.orchestrator.session(&session_id).await.unwrap();
                    assert_eq!(session.state, CanvasState::SuggestComplete);
                    assert_eq!(session.question_count(), MAX_QUESTIONS);
                    return;
                }
                other => panic!("unexpected terminal event: {other:?}"),
            }
        }
        panic!("hard cap never fired");
    }

    #[tokio::test]
    async fn test_delete_session() {
        let h = harness(ScriptedBackend::new(vec![Ok(FIRST_QUESTION.into())]));
        let (session_id, _q) = started(&h).await;
        assert!(h.orchestrator.delete_session(&session_id).await);
        assert!(!h.orchestrator.delete_session(&session_id).await);
        assert!(h.orchestrator.session(&session_id).await.is_none());
    }
}
