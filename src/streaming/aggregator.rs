//! # Response Aggregator
//!
//! Non-streaming mode: runs the transcoder to completion and concatenates
//! its deltas into one response.

use super::core::{AggregatedResponse, TranslatedChunk, FINISH_REASON_STOP};
use super::transcoder::StreamTranscoder;
use crate::error::GatewayError;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tracing::debug;

pub struct ResponseAggregator;

impl ResponseAggregator {
    /// Aggregate a raw backend body through `transcoder`.
    pub async fn aggregate<S, E>(
        transcoder: StreamTranscoder,
        body: S,
    ) -> Result<AggregatedResponse, GatewayError>
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        Self::collect(transcoder.transcode(body)).await
    }

    /// Concatenate chunk deltas in arrival order, stopping at the finished chunk.
    pub async fn collect<S>(mut chunks: S) -> Result<AggregatedResponse, GatewayError>
    where
        S: Stream<Item = Result<TranslatedChunk, GatewayError>> + Unpin,
    {
        let mut full_text = String::new();
        let mut parts = 0usize;

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            full_text.push_str(&chunk.delta_text);
            parts += 1;

            if chunk.finished {
                debug!("Aggregated {} chunks into {} bytes for {}", parts, full_text.len(), chunk.id);
                return Ok(AggregatedResponse {
                    id: chunk.id,
                    created_at: chunk.created_at,
                    model: chunk.model,
                    full_text,
                    finish_reason: FINISH_REASON_STOP.to_string(),
                });
            }
        }

        Err(GatewayError::Upstream(
            "backend stream ended before completion".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use tokio_util::sync::CancellationToken;

    fn transcoder(model: &str, cancel: CancellationToken) -> StreamTranscoder {
        StreamTranscoder::new(model, cancel)
    }

    fn body(parts: Vec<&'static str>) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
        stream::iter(parts.into_iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))))
    }

    #[tokio::test]
    async fn test_aggregates_hello() {
        let response = ResponseAggregator::aggregate(
            transcoder("claude-4-agent", CancellationToken::new()),
            body(vec![
                "data: {\"text\":\"He\",\"done\":false}\n\n",
                "data: {\"text\":\"llo\",\"done\":true}\n\n",
            ]),
        )
        .await
        .unwrap();

        assert_eq!(response.full_text, "Hello");
        assert_eq!(response.finish_reason, "stop");
        assert_eq!(response.model, "claude-4-agent");
        assert!(response.id.starts_with("chatcmpl-"));
    }

    #[tokio::test]
    async fn test_aggregates_across_split_reads_and_garbage() {
        let response = ResponseAggregator::aggregate(
            transcoder("m", CancellationToken::new()),
            body(vec![
                "data: {\"text\":\"Hel",
                "lo, \"}\ndata: {oops}\n",
                "data: {\"text\":\"world\"}\ndata: [DONE]\n",
                "data: {\"text\":\"ignored\"}\n",
            ]),
        )
        .await
        .unwrap();

        assert_eq!(response.full_text, "Hello, world");
    }

    #[tokio::test]
    async fn test_empty_backend_yields_empty_text() {
        let response = ResponseAggregator::aggregate(transcoder("m", CancellationToken::new()), body(vec![]))
            .await
            .unwrap();
        assert_eq!(response.full_text, "");
        assert_eq!(response.finish_reason, "stop");
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let parts: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"data: {\"text\":\"He\"}\n")),
            Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof")),
        ];
        let result =
            ResponseAggregator::aggregate(transcoder("m", CancellationToken::new()), stream::iter(parts))
                .await;
        assert!(matches!(result, Err(GatewayError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_cancelled_aggregation_fails() {
        let token = CancellationToken::new();
        token.cancel();
        let result = ResponseAggregator::aggregate(
            transcoder("m", token),
            body(vec!["data: {\"text\":\"He\"}\n"]),
        )
        .await;
        assert!(result.is_err());
    }
}
