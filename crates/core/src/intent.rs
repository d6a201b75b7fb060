//! Intent classification types

use serde::{Deserialize, Serialize};

/// Closed set of request categories the assistant can route.
///
/// The registry is keyed on this enum; adding a variant without registering
/// a handler is caught by startup validation, not at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Conversational LLM responder
    Chat,
    /// Smart-home device control
    Home,
    /// Calendar/planner store
    Planner,
    /// News briefing
    Briefing,
    /// Web search agent
    Web,
}

impl Intent {
    /// All variants, in registry-validation order
    pub const ALL: [Intent; 5] = [
        Intent::Chat,
        Intent::Home,
        Intent::Planner,
        Intent::Briefing,
        Intent::Web,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Chat => "chat",
            Intent::Home => "home",
            Intent::Planner => "planner",
            Intent::Briefing => "briefing",
            Intent::Web => "web",
        }
    }

    /// Parse a model-produced label. Unknown labels return `None` so the
    /// caller can fall back rather than guess.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "chat" => Some(Intent::Chat),
            "home" => Some(Intent::Home),
            "planner" => Some(Intent::Planner),
            "briefing" => Some(Intent::Briefing),
            "web" => Some(Intent::Web),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What triggered the classification decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// A configured keyword matched the utterance
    Keyword(String),
    /// The intent model produced this label
    Model(String),
    /// Model unavailable or inconclusive; defaulted to chat
    Fallback,
}

/// Classification result for one utterance.
///
/// Produced once per utterance and consumed immediately by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedIntent {
    /// The routed intent
    pub intent: Intent,
    /// Confidence in [0, 1]; 1.0 for keyword hits, 0.0 for the fallback
    pub confidence: f32,
    /// The matched trigger
    pub trigger: Trigger,
}

impl ClassifiedIntent {
    /// A keyword-pass hit (always confidence 1.0)
    pub fn keyword(intent: Intent, keyword: impl Into<String>) -> Self {
        Self {
            intent,
            confidence: 1.0,
            trigger: Trigger::Keyword(keyword.into()),
        }
    }

    /// A model-pass result
    pub fn model(intent: Intent, confidence: f32, label: impl Into<String>) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            trigger: Trigger::Model(label.into()),
        }
    }

    /// The chat fallback when the model is unavailable or inconclusive
    pub fn fallback() -> Self {
        Self {
            intent: Intent::Chat,
            confidence: 0.0,
            trigger: Trigger::Fallback,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(Intent::from_label(intent.as_str()), Some(intent));
        }
        assert_eq!(Intent::from_label("weather"), None);
        assert_eq!(Intent::from_label(" HOME "), Some(Intent::Home));
    }

    #[test]
    fn test_classified_constructors() {
        let hit = ClassifiedIntent::keyword(Intent::Home, "light");
        assert_eq!(hit.confidence, 1.0);
        assert_eq!(hit.trigger, Trigger::Keyword("light".to_string()));

        let fb = ClassifiedIntent::fallback();
        assert_eq!(fb.intent, Intent::Chat);
        assert_eq!(fb.confidence, 0.0);
        assert_eq!(fb.trigger, Trigger::Fallback);
    }

    #[test]
    fn test_model_confidence_clamped() {
        let c = ClassifiedIntent::model(Intent::Web, 1.7, "web");
        assert_eq!(c.confidence, 1.0);
    }
}
