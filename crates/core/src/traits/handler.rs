//! Handler contract

use std::pin::Pin;

use futures::Stream;

use crate::{ExecutionRequest, StreamChunk};

/// Lazy, finite chunk sequence produced by one handler invocation.
///
/// Terminated by exactly one `Done` or `Error` chunk; never restartable.
pub type ChunkStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// Uniform streaming-execution contract for every intent category.
///
/// Implementations own their backend call and translate its failures into
/// the shared [`crate::ErrorKind`] taxonomy; raw backend errors never
/// cross this boundary. Chunks are emitted as they become available, not
/// buffered and flushed, since speech synthesis consumes incrementally.
///
/// Cancellation is cooperative: implementations observe
/// `request.cancel` before each backend call and stop producing within one
/// suspension point. A terminal `Error` chunk tagged `Cancelled` is
/// permitted after the signal fires; further text deltas are not.
pub trait Handler: Send + Sync {
    /// Handler name for logging
    fn name(&self) -> &'static str;

    /// Execute the request, producing the invocation's chunk stream.
    ///
    /// The request is moved in; it is dropped when the stream finishes
    /// or is abandoned.
    fn run(&self, request: ExecutionRequest) -> ChunkStream;
}

impl std::fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn Handler").field("name", &self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CancelToken, ClassifiedIntent, Utterance};
    use futures::StreamExt;

    struct EchoHandler;

    impl Handler for EchoHandler {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn run(&self, request: ExecutionRequest) -> ChunkStream {
            let text = request.utterance.text;
            Box::pin(futures::stream::iter(vec![
                StreamChunk::text(text),
                StreamChunk::Done,
            ]))
        }
    }

    #[tokio::test]
    async fn test_handler_stream_terminates() {
        let handler = EchoHandler;
        let request = ExecutionRequest::new(
            Utterance::new("hello", "s1"),
            ClassifiedIntent::fallback(),
            Vec::new(),
            CancelToken::never(),
        );

        let chunks: Vec<_> = handler.run(request).collect().await;
        assert_eq!(chunks.len(), 2);
        assert!(chunks.last().unwrap().is_terminal());
        assert_eq!(chunks.iter().filter(|c| c.is_terminal()).count(), 1);
    }
}
