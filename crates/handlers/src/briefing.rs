//! Briefing handler
//!
//! Streams the day's top stories as speakable sentences, one per story.

use std::sync::Arc;

use pocket_core::{BriefingSource, ChunkStream, ExecutionRequest, Handler, StreamChunk};

use crate::backend_error_chunk;

/// Categories the fetcher understands; anything mentioned in the
/// utterance overrides the configured default.
const KNOWN_CATEGORIES: [&str; 5] = ["world", "technology", "business", "science", "sports"];

fn pick_category(text: &str, default: &str) -> String {
    let lower = text.to_lowercase();
    KNOWN_CATEGORIES
        .iter()
        .find(|c| lower.contains(*c))
        .map(|c| c.to_string())
        .unwrap_or_else(|| default.to_string())
}

/// News briefing handler
pub struct BriefingHandler {
    source: Arc<dyn BriefingSource>,
    default_category: String,
    story_count: usize,
}

impl BriefingHandler {
    pub fn new(
        source: Arc<dyn BriefingSource>,
        default_category: impl Into<String>,
        story_count: usize,
    ) -> Self {
        Self {
            source,
            default_category: default_category.into(),
            story_count,
        }
    }
}

impl Handler for BriefingHandler {
    fn name(&self) -> &'static str {
        "briefing"
    }

    fn run(&self, request: ExecutionRequest) -> ChunkStream {
        let source = Arc::clone(&self.source);
        let category = pick_category(&request.utterance.text, &self.default_category);
        let story_count = self.story_count;
        let cancel = request.cancel;

        Box::pin(async_stream::stream! {
            if cancel.is_cancelled() {
                yield StreamChunk::cancelled();
                return;
            }

            let stories = match source.top_stories(&category).await {
                Ok(stories) => stories,
                Err(err) => {
                    yield backend_error_chunk("briefing", err);
                    return;
                }
            };

            if stories.is_empty() {
                yield StreamChunk::text(format!("No {} stories right now.", category));
                yield StreamChunk::Done;
                return;
            }

            for story in stories.into_iter().take(story_count) {
                if cancel.is_cancelled() {
                    yield StreamChunk::cancelled();
                    return;
                }

                // One sentence per story keeps speech chunking natural.
                let summary = story.summary.trim_end_matches('.');
                yield StreamChunk::text(format!(
                    "{}: {} ({}). ",
                    story.title, summary, story.source
                ));
            }

            yield StreamChunk::Done;
        })
    }
}
