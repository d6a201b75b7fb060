//! End-to-end routing scenarios: classify, dispatch, drain.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use parking_lot::Mutex;

use pocket_core::{
    ChunkStream, DeviceController, DeviceDescriptor, DeviceState, DrainStatus, ErrorKind,
    ExecutionRequest, GenerateRequest, GenerateResponse, Handler, Intent, LanguageModel,
    Result as CoreResult, SpeechSink, StreamChunk, TokenDelta, UiEvent, UiSink,
};
use pocket_handlers::{ChatHandler, HandlerRegistry, HomeAutomationHandler};
use pocket_llm::PromptBuilder;
use pocket_pipeline::{
    IntentClassifier, KeywordTable, Orchestrator, Session, SessionPhase,
};

#[derive(Default)]
struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
}

impl UiSink for RecordingUi {
    fn render(&self, event: UiEvent) {
        self.events.lock().push(event);
    }
}

impl RecordingUi {
    fn notices(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                UiEvent::Notice { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn failures(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, UiEvent::Failure { .. }))
            .count()
    }
}

#[derive(Default)]
struct RecordingSpeech {
    sentences: Mutex<Vec<String>>,
}

#[async_trait]
impl SpeechSink for RecordingSpeech {
    async fn speak(&self, text: &str) -> CoreResult<()> {
        self.sentences.lock().push(text.to_string());
        Ok(())
    }
}

struct FakeController {
    devices: Vec<DeviceDescriptor>,
}

#[async_trait]
impl DeviceController for FakeController {
    async fn discover(&self) -> CoreResult<Vec<DeviceDescriptor>> {
        Ok(self.devices.clone())
    }

    async fn set_state(&self, _device_id: &str, _state: DeviceState) -> CoreResult<()> {
        Ok(())
    }
}

/// Chat model scripted to answer about the weather.
struct SunnyLlm;

#[async_trait]
impl LanguageModel for SunnyLlm {
    async fn generate(&self, _request: GenerateRequest) -> CoreResult<GenerateResponse> {
        Ok(GenerateResponse::text("It's sunny today."))
    }

    fn generate_stream<'a>(
        &'a self,
        _request: GenerateRequest,
    ) -> Pin<Box<dyn Stream<Item = CoreResult<TokenDelta>> + Send + 'a>> {
        Box::pin(futures::stream::iter(vec![
            Ok(TokenDelta::text("It's ")),
            Ok(TokenDelta::text("sunny ")),
            Ok(TokenDelta::text("today.")),
            Ok(TokenDelta::final_delta()),
        ]))
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn model_name(&self) -> &str {
        "sunny"
    }
}

/// Handler emitting a terminal chunk sequence, for wiring out intents not
/// under test.
struct StaticHandler {
    chunks: Vec<StreamChunk>,
}

impl Handler for StaticHandler {
    fn name(&self) -> &'static str {
        "static"
    }

    fn run(&self, _request: ExecutionRequest) -> ChunkStream {
        Box::pin(futures::stream::iter(self.chunks.clone()))
    }
}

fn done_handler() -> Arc<dyn Handler> {
    Arc::new(StaticHandler {
        chunks: vec![StreamChunk::Done],
    })
}

fn keyword_table() -> KeywordTable {
    KeywordTable::new(
        vec!["turn".into(), "light".into(), "dim".into()],
        vec!["calendar".into(), "schedule".into()],
        vec!["news".into()],
        vec!["search".into()],
    )
}

fn registry_with(chat: Arc<dyn Handler>, home: Arc<dyn Handler>) -> Arc<HandlerRegistry> {
    let mut registry = HandlerRegistry::new();
    registry.register(Intent::Chat, chat);
    registry.register(Intent::Home, home);
    registry.register(Intent::Planner, done_handler());
    registry.register(Intent::Briefing, done_handler());
    registry.register(Intent::Web, done_handler());
    registry.validate().unwrap();
    Arc::new(registry)
}

struct Fixture {
    orchestrator: Orchestrator,
    ui: Arc<RecordingUi>,
    speech: Arc<RecordingSpeech>,
}

fn fixture(chat: Arc<dyn Handler>, home: Arc<dyn Handler>) -> Fixture {
    let ui = Arc::new(RecordingUi::default());
    let speech = Arc::new(RecordingSpeech::default());

    let orchestrator = Orchestrator::new(
        // No model configured: non-keyword input falls back to chat, the
        // same shape as a model forced offline.
        IntentClassifier::new(keyword_table(), None),
        registry_with(chat, home),
        ui.clone(),
        speech.clone(),
        20,
    );

    Fixture {
        orchestrator,
        ui,
        speech,
    }
}

fn home_handler() -> Arc<dyn Handler> {
    Arc::new(HomeAutomationHandler::new(Arc::new(FakeController {
        devices: vec![DeviceDescriptor {
            id: "living-room-light".to_string(),
            name: "Living Room Light".to_string(),
            room: "living room".to_string(),
        }],
    })))
}

fn chat_handler() -> Arc<dyn Handler> {
    Arc::new(ChatHandler::new(
        Arc::new(SunnyLlm),
        PromptBuilder::new("You are Pocket", 20),
    ))
}

#[tokio::test]
async fn turn_on_the_light_routes_home_and_stays_silent() {
    let f = fixture(chat_handler(), home_handler());
    let session = Arc::new(Session::new("s1", true));

    let status = f
        .orchestrator
        .submit(&session, "turn on the living room light")
        .await
        .unwrap();

    assert_eq!(status, DrainStatus::Completed);
    // UI saw the structured notice.
    assert_eq!(f.ui.notices(), vec!["device_on"]);
    // No sentence was emitted, so the speech sink stayed silent.
    assert!(f.speech.sentences.lock().is_empty());
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn weather_question_falls_back_to_chat_and_speaks_one_sentence() {
    let f = fixture(chat_handler(), home_handler());
    let session = Arc::new(Session::new("s1", true));

    let status = f
        .orchestrator
        .submit(&session, "what's the weather")
        .await
        .unwrap();

    assert_eq!(status, DrainStatus::Completed);
    // Exactly one speech call carrying the complete sentence.
    assert_eq!(*f.speech.sentences.lock(), vec!["It's sunny today."]);
    // And the transcript landed in history.
    let window = session.history_window(2);
    assert_eq!(window[1].content, "It's sunny today.");
}

#[tokio::test]
async fn backend_timeout_fails_once_then_session_recovers() {
    let failing_chat: Arc<dyn Handler> = Arc::new(StaticHandler {
        chunks: vec![
            StreamChunk::text("Let me check"),
            StreamChunk::error(ErrorKind::HandlerBackend, "backend timeout"),
        ],
    });
    let f = fixture(failing_chat, home_handler());
    let session = Arc::new(Session::new("s1", true));

    let status = f.orchestrator.submit(&session, "hello there").await.unwrap();

    assert_eq!(status, DrainStatus::Failed(ErrorKind::HandlerBackend));
    assert_eq!(f.ui.failures(), 1);
    // The partial text never reached speech.
    assert!(f.speech.sentences.lock().is_empty());

    // Same session immediately accepts the next submission.
    assert_eq!(session.phase(), SessionPhase::Idle);
    let f2 = fixture(chat_handler(), home_handler());
    let status = f2.orchestrator.submit(&session, "hello again").await.unwrap();
    assert_eq!(status, DrainStatus::Completed);
}

#[tokio::test]
async fn cancel_mid_stream_returns_cancelled_and_discards_speech() {
    // A chat handler that emits a partial sentence then stalls until
    // cancelled.
    struct StallingHandler;

    impl Handler for StallingHandler {
        fn name(&self) -> &'static str {
            "stalling"
        }

        fn run(&self, request: ExecutionRequest) -> ChunkStream {
            let mut cancel = request.cancel;
            Box::pin(async_stream::stream! {
                yield StreamChunk::text("Partial sentence without an end");
                cancel.cancelled().await;
                yield StreamChunk::cancelled();
            })
        }
    }

    let f = fixture(Arc::new(StallingHandler), home_handler());
    let session = Arc::new(Session::new("s1", true));

    let submit = {
        let session = session.clone();
        let orchestrator = f.orchestrator;
        tokio::spawn(async move { orchestrator.submit(&session, "ramble forever").await })
    };

    // Wait for the invocation to reach streaming, then cancel.
    for _ in 0..100 {
        if session.phase() == SessionPhase::Streaming {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    session.cancel();

    let status = submit.await.unwrap().unwrap();
    assert_eq!(status, DrainStatus::Cancelled);
    assert!(f.speech.sentences.lock().is_empty());
    assert_eq!(session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn busy_session_rejects_concurrent_submit() {
    struct SlowHandler;

    impl Handler for SlowHandler {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn run(&self, _request: ExecutionRequest) -> ChunkStream {
            Box::pin(async_stream::stream! {
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                yield StreamChunk::Done;
            })
        }
    }

    let f = fixture(Arc::new(SlowHandler), home_handler());
    let orchestrator = Arc::new(f.orchestrator);
    let session = Arc::new(Session::new("s1", false));

    let first = {
        let orchestrator = orchestrator.clone();
        let session = session.clone();
        tokio::spawn(async move { orchestrator.submit(&session, "slow request").await })
    };

    // Wait until the first request is in flight.
    for _ in 0..100 {
        if session.phase() != SessionPhase::Idle {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let second = orchestrator.submit(&session, "eager request").await;
    assert!(matches!(
        second,
        Err(pocket_pipeline::PipelineError::SessionBusy)
    ));

    // The in-flight request is unaffected.
    let status = first.await.unwrap().unwrap();
    assert_eq!(status, DrainStatus::Completed);
}
