//! Pocket assistant console application
//!
//! Wires the pipeline together: settings, backends, handlers, registry,
//! orchestrator, and a line-based REPL. Submissions run concurrently
//! with input so `/cancel` works mid-response.

mod speech;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use pocket_config::{load_settings, Settings};
use pocket_core::{DeviceDescriptor, Intent, LanguageModel};
use pocket_handlers::{
    BriefingHandler, ChatHandler, HandlerRegistry, HomeAutomationHandler, HttpBriefingSource,
    HttpSearchBackend, PlannerHandler, StaticDeviceController, WebAgentHandler,
};
use pocket_llm::{LlmConfig, OllamaClient, OllamaIntentModel, PromptBuilder};
use pocket_pipeline::{
    IntentClassifier, KeywordTable, Orchestrator, SessionManager, SessionPhase,
};
use pocket_storage::SqlitePlannerStore;

use speech::TracingSpeechSink;
use ui::ConsoleUi;

fn llm_config(settings: &Settings) -> LlmConfig {
    LlmConfig {
        model: settings.llm.model.clone(),
        endpoint: settings.llm.endpoint.clone(),
        max_tokens: settings.llm.max_tokens,
        temperature: settings.llm.temperature,
        timeout: Duration::from_secs(settings.llm.timeout_secs),
        keep_alive: settings.llm.keep_alive.clone(),
        ..LlmConfig::default()
    }
}

fn build_registry(
    settings: &Settings,
    chat_llm: Arc<OllamaClient>,
) -> anyhow::Result<HandlerRegistry> {
    let http_timeout = Duration::from_secs(settings.llm.timeout_secs);

    let devices: Vec<DeviceDescriptor> =
        settings.home.devices.iter().map(Into::into).collect();
    let controller = Arc::new(StaticDeviceController::new(devices));

    let planner = SqlitePlannerStore::open(&settings.planner.db_path)
        .context("opening planner store")?;

    let briefing = HttpBriefingSource::new(&settings.briefing.endpoint, http_timeout)
        .context("creating briefing source")?;
    let search = HttpSearchBackend::new(&settings.search.endpoint, http_timeout)
        .context("creating search backend")?;

    let mut registry = HandlerRegistry::new();
    registry.register(
        Intent::Chat,
        Arc::new(ChatHandler::new(
            chat_llm,
            PromptBuilder::new(&settings.llm.system_prompt, settings.session.max_history),
        )),
    );
    registry.register(
        Intent::Home,
        Arc::new(HomeAutomationHandler::new(controller)),
    );
    registry.register(
        Intent::Planner,
        Arc::new(PlannerHandler::new(
            Arc::new(planner),
            settings.planner.upcoming_days,
        )),
    );
    registry.register(
        Intent::Briefing,
        Arc::new(BriefingHandler::new(
            Arc::new(briefing),
            settings.briefing.category.clone(),
            settings.briefing.story_count,
        )),
    );
    registry.register(
        Intent::Web,
        Arc::new(WebAgentHandler::new(
            Arc::new(search),
            settings.search.max_hits,
        )),
    );

    registry.validate().context("validating handler registry")?;
    Ok(registry)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = std::env::args().nth(1);
    let settings = load_settings(config_path.as_deref()).context("loading settings")?;

    let chat_llm = Arc::new(OllamaClient::new(llm_config(&settings))?);
    if !chat_llm.is_available().await {
        tracing::warn!(
            endpoint = %settings.llm.endpoint,
            "Chat model endpoint unreachable; responses will fail until it is up"
        );
    }

    let router_model = match OllamaIntentModel::new(llm_config(&settings), &settings.router.model)
    {
        Ok(model) => Some(Arc::new(model) as Arc<dyn pocket_core::IntentModel>),
        Err(err) => {
            tracing::warn!(error = %err, "Router model unavailable, keyword-or-chat only");
            None
        }
    };

    let classifier = IntentClassifier::new(
        KeywordTable::new(
            settings.router.home_keywords.clone(),
            settings.router.planner_keywords.clone(),
            settings.router.briefing_keywords.clone(),
            settings.router.web_keywords.clone(),
        ),
        router_model,
    );

    let registry = Arc::new(build_registry(&settings, chat_llm)?);

    let orchestrator = Arc::new(Orchestrator::new(
        classifier,
        registry,
        Arc::new(ConsoleUi::new()),
        Arc::new(TracingSpeechSink::new()),
        settings.session.max_history,
    ));

    let sessions = SessionManager::new(
        settings.session.max_sessions,
        Duration::from_secs(settings.session.timeout_secs),
        settings.speech.enabled,
    );
    let session = sessions.create().context("creating session")?;

    println!("Pocket ready. /cancel interrupts, /speech toggles, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        match line.as_str() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/cancel" => {
                orchestrator.cancel(&session);
                continue;
            }
            "/speech" => {
                let enabled = !session.speech_enabled();
                session.set_speech_enabled(enabled);
                println!("speech {}", if enabled { "on" } else { "off" });
                continue;
            }
            _ => {}
        }

        if session.phase() != SessionPhase::Idle {
            println!("(still answering; /cancel to interrupt)");
            continue;
        }

        let orchestrator = Arc::clone(&orchestrator);
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            match orchestrator.submit(&session, &line).await {
                Ok(status) => {
                    println!();
                    tracing::debug!(?status, "Submission finished");
                }
                Err(err) => println!("{}", err),
            }
        });
    }

    Ok(())
}
