//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Chat LLM configuration
    #[serde(default)]
    pub llm: LlmSettings,

    /// Intent router configuration
    #[serde(default)]
    pub router: RouterSettings,

    /// Speech synthesis configuration
    #[serde(default)]
    pub speech: SpeechSettings,

    /// Planner store configuration
    #[serde(default)]
    pub planner: PlannerSettings,

    /// News briefing configuration
    #[serde(default)]
    pub briefing: BriefingSettings,

    /// Web search configuration
    #[serde(default)]
    pub search: SearchSettings,

    /// Smart-home configuration
    #[serde(default)]
    pub home: HomeSettings,

    /// Session management configuration
    #[serde(default)]
    pub session: SessionSettings,
}

/// Chat LLM settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// Ollama endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Chat model name
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Keep the model loaded between calls ("5m", "1h", "-1", "0")
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,

    /// Maximum retry attempts for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// System prompt for the chat responder
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_chat_model() -> String {
    "qwen3:1.7b".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    512
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_keep_alive() -> String {
    "5m".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_system_prompt() -> String {
    "You are Pocket, a helpful personal desktop assistant. \
     Answer concisely; your responses may be spoken aloud."
        .to_string()
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_chat_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            keep_alive: default_keep_alive(),
            max_retries: default_max_retries(),
            system_prompt: default_system_prompt(),
        }
    }
}

/// Intent router settings.
///
/// The keyword tables gate the router: an utterance containing one of
/// these words is routed without consulting the model, so explicit
/// commands never depend on model availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Router model name (fine-tuned classifier served by Ollama)
    #[serde(default = "default_router_model")]
    pub model: String,

    /// Keywords routing to the home-automation handler
    #[serde(default = "default_home_keywords")]
    pub home_keywords: Vec<String>,

    /// Keywords routing to the planner handler
    #[serde(default = "default_planner_keywords")]
    pub planner_keywords: Vec<String>,

    /// Keywords routing to the briefing handler
    #[serde(default = "default_briefing_keywords")]
    pub briefing_keywords: Vec<String>,

    /// Keywords routing to the web agent
    #[serde(default = "default_web_keywords")]
    pub web_keywords: Vec<String>,
}

fn default_router_model() -> String {
    "pocket-router".to_string()
}

fn default_home_keywords() -> Vec<String> {
    ["turn", "light", "lights", "dim", "switch", "plug", "lamp"]
        .map(String::from)
        .to_vec()
}

fn default_planner_keywords() -> Vec<String> {
    [
        "calendar",
        "schedule",
        "appointment",
        "meeting",
        "event",
        "task",
        "remind",
        "reminder",
    ]
    .map(String::from)
    .to_vec()
}

fn default_briefing_keywords() -> Vec<String> {
    ["news", "headlines", "briefing"].map(String::from).to_vec()
}

fn default_web_keywords() -> Vec<String> {
    ["search", "google", "browse", "look"]
        .map(String::from)
        .to_vec()
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            model: default_router_model(),
            home_keywords: default_home_keywords(),
            planner_keywords: default_planner_keywords(),
            briefing_keywords: default_briefing_keywords(),
            web_keywords: default_web_keywords(),
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// Whether new sessions start with speech enabled
    #[serde(default = "default_speech_enabled")]
    pub enabled: bool,
}

fn default_speech_enabled() -> bool {
    true
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            enabled: default_speech_enabled(),
        }
    }
}

/// Planner store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// SQLite database path
    #[serde(default = "default_planner_db")]
    pub db_path: String,

    /// Days ahead covered by "upcoming" queries
    #[serde(default = "default_upcoming_days")]
    pub upcoming_days: i64,
}

fn default_planner_db() -> String {
    "data/planner.db".to_string()
}

fn default_upcoming_days() -> i64 {
    7
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            db_path: default_planner_db(),
            upcoming_days: default_upcoming_days(),
        }
    }
}

/// News briefing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefingSettings {
    /// Feed endpoint returning JSON stories
    #[serde(default = "default_briefing_endpoint")]
    pub endpoint: String,

    /// Default category
    #[serde(default = "default_briefing_category")]
    pub category: String,

    /// Stories per briefing
    #[serde(default = "default_story_count")]
    pub story_count: usize,
}

fn default_briefing_endpoint() -> String {
    "http://localhost:8090/briefing".to_string()
}

fn default_briefing_category() -> String {
    "top".to_string()
}

fn default_story_count() -> usize {
    5
}

impl Default for BriefingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_briefing_endpoint(),
            category: default_briefing_category(),
            story_count: default_story_count(),
        }
    }
}

/// Web search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Search endpoint returning JSON hits
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Maximum hits per query
    #[serde(default = "default_max_hits")]
    pub max_hits: usize,
}

fn default_search_endpoint() -> String {
    "http://localhost:8090/search".to_string()
}

fn default_max_hits() -> usize {
    5
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            max_hits: default_max_hits(),
        }
    }
}

/// One configured smart-home device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    pub name: String,
    pub room: String,
}

impl From<&DeviceEntry> for pocket_core::DeviceDescriptor {
    fn from(entry: &DeviceEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            room: entry.room.to_lowercase(),
        }
    }
}

/// Smart-home settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeSettings {
    /// Known devices (id, name, room)
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceEntry>,
}

fn default_devices() -> Vec<DeviceEntry> {
    vec![DeviceEntry {
        id: "living-room-light".to_string(),
        name: "Living Room Light".to_string(),
        room: "living room".to_string(),
    }]
}

impl Default for HomeSettings {
    fn default() -> Self {
        Self {
            devices: default_devices(),
        }
    }
}

/// Session management settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Turns of history passed to context-aware handlers
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Maximum concurrent sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle seconds before a session expires
    #[serde(default = "default_session_timeout")]
    pub timeout_secs: u64,
}

fn default_max_history() -> usize {
    20
}

fn default_max_sessions() -> usize {
    32
}

fn default_session_timeout() -> u64 {
    3600
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            max_sessions: default_max_sessions(),
            timeout_secs: default_session_timeout(),
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", self.llm.temperature),
            });
        }

        if self.llm.endpoint.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "llm.endpoint".to_string(),
                message: "Endpoint must not be empty".to_string(),
            });
        }

        if self.session.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_history".to_string(),
                message: "History window must be at least 1 turn".to_string(),
            });
        }

        if self.session.max_sessions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_sessions".to_string(),
                message: "At least one session must be allowed".to_string(),
            });
        }

        if self.planner.db_path.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "planner.db_path".to_string(),
                message: "Database path must not be empty".to_string(),
            });
        }

        for entry in &self.home.devices {
            if entry.id.is_empty() || entry.room.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "home.devices".to_string(),
                    message: format!("Device '{}' needs a non-empty id and room", entry.name),
                });
            }
        }

        Ok(())
    }
}

/// Load settings from an optional TOML file plus POCKET_-prefixed
/// environment variables, layered over built-in defaults.
pub fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        if !Path::new(path).exists() {
            return Err(ConfigError::FileNotFound(path.to_string()));
        }
        builder = builder.add_source(File::with_name(path));
    } else if Path::new("pocket.toml").exists() {
        builder = builder.add_source(File::with_name("pocket.toml"));
    }

    let config = builder
        .add_source(Environment::with_prefix("POCKET").separator("__"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;
    settings.validate()?;

    tracing::debug!(
        chat_model = %settings.llm.model,
        router_model = %settings.router.model,
        "Settings loaded"
    );

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let settings = Settings::new();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.session.max_history, 20);
        assert_eq!(settings.llm.model, "qwen3:1.7b");
        assert!(settings.speech.enabled);
    }

    #[test]
    fn test_default_keywords_partitioned() {
        let router = RouterSettings::default();
        assert!(router.home_keywords.contains(&"light".to_string()));
        assert!(router.planner_keywords.contains(&"calendar".to_string()));
        assert!(router.briefing_keywords.contains(&"news".to_string()));
        assert!(router.web_keywords.contains(&"search".to_string()));
        // No keyword routes to two intents.
        for kw in &router.home_keywords {
            assert!(!router.planner_keywords.contains(kw));
            assert!(!router.briefing_keywords.contains(kw));
            assert!(!router.web_keywords.contains(kw));
        }
    }

    #[test]
    fn test_invalid_temperature_rejected() {
        let mut settings = Settings::new();
        settings.llm.temperature = 3.5;

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field, .. } if field == "llm.temperature"));
    }

    #[test]
    fn test_zero_history_rejected() {
        let mut settings = Settings::new();
        settings.session.max_history = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[llm]\nmodel = \"qwen3:4b\"\n\n[speech]\nenabled = false"
        )
        .unwrap();

        let settings = load_settings(file.path().to_str()).unwrap();
        assert_eq!(settings.llm.model, "qwen3:4b");
        assert!(!settings.speech.enabled);
        // Untouched sections keep defaults.
        assert_eq!(settings.session.max_sessions, 32);
    }

    #[test]
    fn test_missing_file_errors() {
        let err = load_settings(Some("/nonexistent/pocket.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
