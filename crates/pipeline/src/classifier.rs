//! Intent classifier
//!
//! Two-pass classification: a keyword gate so explicit commands never
//! depend on model availability, then the fine-tuned router model for
//! everything else. The keyword pass wins outright when it matches; the
//! model is only consulted when no keyword is present. Classification is
//! infallible: every failure degrades to the chat fallback.

use std::collections::HashSet;
use std::sync::Arc;

use unicode_segmentation::UnicodeSegmentation;

use pocket_core::{ClassifiedIntent, Intent, IntentModel, Turn};

/// Keyword tables per non-chat intent, scanned in fixed priority order.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    entries: Vec<(Intent, Vec<String>)>,
}

impl KeywordTable {
    /// Build a table with the canonical priority order: home, planner,
    /// briefing, web. Keywords are lowercased at build time.
    pub fn new(
        home: Vec<String>,
        planner: Vec<String>,
        briefing: Vec<String>,
        web: Vec<String>,
    ) -> Self {
        let lower = |kws: Vec<String>| -> Vec<String> {
            kws.into_iter().map(|k| k.to_lowercase()).collect()
        };
        Self {
            entries: vec![
                (Intent::Home, lower(home)),
                (Intent::Planner, lower(planner)),
                (Intent::Briefing, lower(briefing)),
                (Intent::Web, lower(web)),
            ],
        }
    }

    /// Find the first configured keyword present in the token set,
    /// walking intents in priority order.
    fn first_match(&self, tokens: &HashSet<String>) -> Option<(Intent, &str)> {
        for (intent, keywords) in &self.entries {
            if let Some(keyword) = keywords.iter().find(|k| tokens.contains(*k)) {
                return Some((*intent, keyword));
            }
        }
        None
    }
}

/// Utterance classifier
pub struct IntentClassifier {
    keywords: KeywordTable,
    model: Option<Arc<dyn IntentModel>>,
}

impl IntentClassifier {
    /// Create a classifier; `model` is optional so the pipeline runs
    /// (degraded to keyword-or-chat) when no router model is configured.
    pub fn new(keywords: KeywordTable, model: Option<Arc<dyn IntentModel>>) -> Self {
        Self { keywords, model }
    }

    /// Classify an utterance. Never fails; the worst case is the chat
    /// fallback with confidence 0.0.
    pub async fn classify(&self, text: &str, history: &[Turn]) -> ClassifiedIntent {
        // Keyword pass: case-insensitive, word-boundary aware.
        let tokens: HashSet<String> = text
            .unicode_words()
            .map(|w| w.to_lowercase())
            .collect();

        if let Some((intent, keyword)) = self.keywords.first_match(&tokens) {
            tracing::debug!(intent = %intent, keyword, "Keyword pass matched");
            return ClassifiedIntent::keyword(intent, keyword);
        }

        // Model pass.
        let Some(model) = &self.model else {
            return ClassifiedIntent::fallback();
        };

        match model.score(text, history).await {
            Ok(prediction) => match Intent::from_label(&prediction.label) {
                Some(intent) => {
                    tracing::debug!(
                        intent = %intent,
                        score = prediction.score,
                        "Model pass classified"
                    );
                    ClassifiedIntent::model(intent, prediction.score, prediction.label)
                }
                None => {
                    tracing::warn!(label = %prediction.label, "Model produced unknown label");
                    ClassifiedIntent::fallback()
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "Intent model unavailable, falling back to chat");
                ClassifiedIntent::fallback()
            }
        }
    }
}
