//! End-to-end event stream contracts for generation sessions.

mod common;

use common::{ScriptedBackend, VALID_DOCUMENT, harness};
use prismgen::{
    CachePolicy, Event, GenerationPreferences, GenerationRequest, OutputKind, Provider, SourceItem,
    Stage,
};
use prismgen_llm::LlmError;

fn request(content: &str) -> GenerationRequest {
    GenerationRequest {
        sources: vec![SourceItem::Text {
            content: content.into(),
        }],
        output_kind: OutputKind::Markdown,
        provider: Provider::Anthropic,
        model: "stub-model".into(),
        image_model: None,
        cache: CachePolicy::default(),
        preferences: GenerationPreferences::default(),
    }
}

#[tokio::test(start_paused = true)]
async fn stream_walks_every_stage_in_order() {
    let h = harness(ScriptedBackend::new(vec![Ok(VALID_DOCUMENT.into())]));
    let (stream, _c) = h.orchestrator.generate(request("material"), "key".into());
    let events = stream.collect().await;

    let stages: Vec<Stage> = events
        .iter()
        .filter_map(|e| match e {
            Event::Progress { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            Stage::Detecting,
            Stage::Extracting,
            Stage::Transforming,
            Stage::Rendering,
            Stage::Validating,
            Stage::Complete,
        ]
    );
    assert!(matches!(events.last(), Some(Event::Complete { .. })));
}

#[tokio::test(start_paused = true)]
async fn progress_is_monotonic_across_retries() {
    let h = harness(ScriptedBackend::new(vec![
        Err(LlmError::Timeout {
            duration: std::time::Duration::from_secs(30),
        }),
        Err(LlmError::Timeout {
            duration: std::time::Duration::from_secs(30),
        }),
        Ok(VALID_DOCUMENT.into()),
    ]));

    let (stream, _c) = h.orchestrator.generate(request("material"), "key".into());
    let events = stream.collect().await;

    let mut last = 0u8;
    for event in &events {
        if let Event::Progress { percent, .. } = event {
            assert!(*percent >= last, "progress decreased: {events:?}");
            last = *percent;
        }
    }
    assert!(matches!(events.last(), Some(Event::Complete { .. })));
    assert_eq!(h.backend.calls(), 3, "timeouts on attempts 1 and 2, success on 3");
}

#[tokio::test(start_paused = true)]
async fn terminal_event_is_unique_and_last() {
    let scripts: Vec<Vec<Result<String, LlmError>>> = vec![
        vec![Ok(VALID_DOCUMENT.to_string())],
        vec![Err(LlmError::ProviderAuth("401".into()))],
        (0..4).map(|_| Ok("not json at all".to_string())).collect(),
    ];

    for script in scripts {
        let h = harness(ScriptedBackend::new(script));
        let (stream, _c) = h.orchestrator.generate(request("material"), "key".into());
        let events = stream.collect().await;

        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
        assert!(events.last().unwrap().is_terminal());
    }
}

#[tokio::test(start_paused = true)]
async fn complete_artifact_is_downloadable() {
    let h = harness(ScriptedBackend::new(vec![Ok(VALID_DOCUMENT.into())]));
    let (stream, _c) = h.orchestrator.generate(request("material"), "key".into());
    let events = stream.collect().await;

    let Some(Event::Complete { artifact }) = events.last() else {
        panic!("expected complete, got {events:?}");
    };
    let written = std::fs::read_to_string(artifact.path.as_std_path()).unwrap();
    assert!(written.contains("Body text"));
    assert_eq!(artifact.title, "T");
}
