//! Web agent handler
//!
//! Runs the query through the search backend, reports the hits as a
//! structured tool event, and speaks a short lead with the top result.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use pocket_core::{ChunkStream, ExecutionRequest, Handler, SearchBackend, StreamChunk};

use crate::backend_error_chunk;

static QUERY_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:search(?:\s+the\s+web)?(?:\s+for)?|google|look\s+up|browse(?:\s+for)?|find)\s+")
        .unwrap()
});

/// Strip the command verb so only the query itself is sent to the backend
fn extract_query(text: &str) -> String {
    let stripped = QUERY_PREFIX.replace(text, "");
    let query = stripped.trim();
    if query.is_empty() {
        text.trim().to_string()
    } else {
        query.to_string()
    }
}

/// Web search handler
pub struct WebAgentHandler {
    search: Arc<dyn SearchBackend>,
    max_hits: usize,
}

impl WebAgentHandler {
    pub fn new(search: Arc<dyn SearchBackend>, max_hits: usize) -> Self {
        Self { search, max_hits }
    }
}

impl Handler for WebAgentHandler {
    fn name(&self) -> &'static str {
        "web"
    }

    fn run(&self, request: ExecutionRequest) -> ChunkStream {
        let search = Arc::clone(&self.search);
        let query = extract_query(&request.utterance.text);
        let max_hits = self.max_hits;
        let cancel = request.cancel;

        Box::pin(async_stream::stream! {
            if cancel.is_cancelled() {
                yield StreamChunk::cancelled();
                return;
            }

            let hits = match search.search(&query).await {
                Ok(hits) => hits,
                Err(err) => {
                    yield backend_error_chunk("web", err);
                    return;
                }
            };

            if cancel.is_cancelled() {
                yield StreamChunk::cancelled();
                return;
            }

            if hits.is_empty() {
                yield StreamChunk::text(format!("I found nothing for \"{}\".", query));
                yield StreamChunk::Done;
                return;
            }

            let hits: Vec<_> = hits.into_iter().take(max_hits).collect();

            yield StreamChunk::tool_event(
                "search_results",
                serde_json::json!({
                    "query": query,
                    "results": hits
                        .iter()
                        .map(|h| serde_json::json!({
                            "title": h.title,
                            "url": h.url,
                            "snippet": h.snippet,
                        }))
                        .collect::<Vec<_>>(),
                }),
            );

            yield StreamChunk::text(format!(
                "Top result for \"{}\": {}. ",
                query, hits[0].title
            ));
            yield StreamChunk::Done;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::StreamExt;
    use pocket_core::{
        CancelToken, ClassifiedIntent, Error, ErrorKind, Intent, Result as CoreResult, SearchHit,
        Utterance,
    };

    struct FakeSearch {
        hits: Vec<SearchHit>,
        fail: bool,
    }

    #[async_trait]
    impl SearchBackend for FakeSearch {
        async fn search(&self, _query: &str) -> CoreResult<Vec<SearchHit>> {
            if self.fail {
                return Err(Error::Fetch("dns failure".to_string()));
            }
            Ok(self.hits.clone())
        }
    }

    fn request(text: &str) -> ExecutionRequest {
        ExecutionRequest::new(
            Utterance::new(text, "s1"),
            ClassifiedIntent::keyword(Intent::Web, "search"),
            Vec::new(),
            CancelToken::never(),
        )
    }

    fn hit(title: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            snippet: "snippet".to_string(),
        }
    }

    #[test]
    fn test_extract_query() {
        assert_eq!(extract_query("search for rust streams"), "rust streams");
        assert_eq!(extract_query("look up chrono crate"), "chrono crate");
        assert_eq!(extract_query("google weather in oslo"), "weather in oslo");
        // No verb: the whole text is the query.
        assert_eq!(extract_query("rust streams"), "rust streams");
    }

    #[tokio::test]
    async fn test_results_event_then_lead_text() {
        let handler = WebAgentHandler::new(
            Arc::new(FakeSearch {
                hits: vec![hit("Rust Book"), hit("Tokio Docs")],
                fail: false,
            }),
            5,
        );

        let chunks: Vec<_> = handler
            .run(request("search for async rust"))
            .collect()
            .await;

        match &chunks[0] {
            StreamChunk::ToolEvent { name, payload } => {
                assert_eq!(name, "search_results");
                assert_eq!(payload["query"], "async rust");
                assert_eq!(payload["results"].as_array().unwrap().len(), 2);
            }
            other => panic!("unexpected chunk: {:?}", other),
        }
        assert!(matches!(&chunks[1], StreamChunk::TextDelta { text } if text.contains("Rust Book")));
        assert!(matches!(chunks[2], StreamChunk::Done));
    }

    #[tokio::test]
    async fn test_max_hits_truncates() {
        let handler = WebAgentHandler::new(
            Arc::new(FakeSearch {
                hits: (0..10).map(|i| hit(&format!("r{}", i))).collect(),
                fail: false,
            }),
            3,
        );

        let chunks: Vec<_> = handler.run(request("search things")).collect().await;
        match &chunks[0] {
            StreamChunk::ToolEvent { payload, .. } => {
                assert_eq!(payload["results"].as_array().unwrap().len(), 3);
            }
            other => panic!("unexpected chunk: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_failure_becomes_backend_error() {
        let handler = WebAgentHandler::new(
            Arc::new(FakeSearch {
                hits: Vec::new(),
                fail: true,
            }),
            5,
        );

        let chunks: Vec<_> = handler.run(request("search anything")).collect().await;
        match chunks.last().unwrap() {
            StreamChunk::Error { kind, .. } => assert_eq!(*kind, ErrorKind::HandlerBackend),
            other => panic!("unexpected chunk: {:?}", other),
        }
    }
}
