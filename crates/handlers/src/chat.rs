//! Chat handler
//!
//! Streams the conversational model's output, mapping reasoning tokens to
//! `ThinkingDelta` and answer tokens to `TextDelta`.

use std::sync::Arc;

use futures::StreamExt;

use pocket_core::{ChunkStream, ExecutionRequest, Handler, LanguageModel, StreamChunk};
use pocket_llm::PromptBuilder;

use crate::backend_error_chunk;

/// Conversational LLM handler
pub struct ChatHandler {
    llm: Arc<dyn LanguageModel>,
    prompt: PromptBuilder,
}

impl ChatHandler {
    /// Create a chat handler over the given model
    pub fn new(llm: Arc<dyn LanguageModel>, prompt: PromptBuilder) -> Self {
        Self { llm, prompt }
    }
}

impl Handler for ChatHandler {
    fn name(&self) -> &'static str {
        "chat"
    }

    fn run(&self, request: ExecutionRequest) -> ChunkStream {
        let llm = Arc::clone(&self.llm);
        let generate = self
            .prompt
            .build(&request.history, &request.utterance.text);
        let cancel = request.cancel;

        Box::pin(async_stream::stream! {
            if cancel.is_cancelled() {
                yield StreamChunk::cancelled();
                return;
            }

            let mut tokens = llm.generate_stream(generate);

            loop {
                // The signal is observed between deltas; dropping the
                // token stream abandons the underlying request.
                if cancel.is_cancelled() {
                    yield StreamChunk::cancelled();
                    return;
                }

                match tokens.next().await {
                    Some(Ok(delta)) => {
                        if delta.is_final {
                            yield StreamChunk::Done;
                            return;
                        }
                        if delta.text.is_empty() {
                            continue;
                        }
                        if delta.reasoning {
                            yield StreamChunk::thinking(delta.text);
                        } else {
                            yield StreamChunk::text(delta.text);
                        }
                    }
                    Some(Err(err)) => {
                        yield backend_error_chunk("chat", err);
                        return;
                    }
                    None => {
                        // Defensive: a well-behaved model stream ends with
                        // a final delta, but close out regardless.
                        yield StreamChunk::Done;
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::Stream;
    use pocket_core::{
        CancelToken, ClassifiedIntent, Error, ErrorKind, GenerateRequest, GenerateResponse,
        Intent, Result as CoreResult, TokenDelta, Utterance,
    };
    use std::pin::Pin;

    struct ScriptedLlm {
        deltas: Vec<CoreResult<TokenDelta>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedLlm {
        async fn generate(&self, _request: GenerateRequest) -> CoreResult<GenerateResponse> {
            Ok(GenerateResponse::text("unused"))
        }

        fn generate_stream<'a>(
            &'a self,
            _request: GenerateRequest,
        ) -> Pin<Box<dyn Stream<Item = CoreResult<TokenDelta>> + Send + 'a>> {
            let deltas: Vec<_> = self
                .deltas
                .iter()
                .map(|d| match d {
                    Ok(delta) => Ok(delta.clone()),
                    Err(e) => Err(Error::Llm(e.to_string())),
                })
                .collect();
            Box::pin(futures::stream::iter(deltas))
        }

        async fn is_available(&self) -> bool {
            true
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn request() -> ExecutionRequest {
        ExecutionRequest::new(
            Utterance::new("hello", "s1"),
            ClassifiedIntent::model(Intent::Chat, 0.9, "chat"),
            Vec::new(),
            CancelToken::never(),
        )
    }

    fn handler(deltas: Vec<CoreResult<TokenDelta>>) -> ChatHandler {
        ChatHandler::new(
            Arc::new(ScriptedLlm { deltas }),
            PromptBuilder::new("sys", 10),
        )
    }

    #[tokio::test]
    async fn test_maps_reasoning_and_answer_tokens() {
        let handler = handler(vec![
            Ok(TokenDelta::reasoning("thinking...")),
            Ok(TokenDelta::text("It's ")),
            Ok(TokenDelta::text("sunny.")),
            Ok(TokenDelta::final_delta()),
        ]);

        let chunks: Vec<_> = handler.run(request()).collect().await;

        assert!(matches!(&chunks[0], StreamChunk::ThinkingDelta { text } if text == "thinking..."));
        assert!(matches!(&chunks[1], StreamChunk::TextDelta { text } if text == "It's "));
        assert!(matches!(chunks.last().unwrap(), StreamChunk::Done));
        assert_eq!(chunks.iter().filter(|c| c.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_backend_error_becomes_error_chunk() {
        let handler = handler(vec![
            Ok(TokenDelta::text("partial")),
            Err(Error::Llm("connection reset".to_string())),
        ]);

        let chunks: Vec<_> = handler.run(request()).collect().await;

        match chunks.last().unwrap() {
            StreamChunk::Error { kind, message } => {
                assert_eq!(*kind, ErrorKind::HandlerBackend);
                assert!(message.contains("connection reset"));
            }
            other => panic!("unexpected chunk: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pre_cancelled_request_emits_no_text() {
        let (tx, cancel) = CancelToken::channel();
        tx.send(true).unwrap();

        let handler = handler(vec![
            Ok(TokenDelta::text("should not appear")),
            Ok(TokenDelta::final_delta()),
        ]);

        let mut req = request();
        req.cancel = cancel;

        let chunks: Vec<_> = handler.run(req).collect().await;
        assert_eq!(chunks.len(), 1);
        match &chunks[0] {
            StreamChunk::Error { kind, .. } => assert_eq!(*kind, ErrorKind::Cancelled),
            other => panic!("unexpected chunk: {:?}", other),
        }
    }
}
