//! Line-delimited JSON decoding for streaming HTTP bodies.
//!
//! The wire format is one JSON object per line, with blank lines sent as
//! keep-alives. Each line wraps the event in a `data` envelope:
//!
//! ```json
//! {"data":{"id":"1","text":"...","author_id":"2"}}
//! ```

use bytes::Bytes;
use futures::{Stream, StreamExt, stream};
use serde::Deserialize;

use crate::error::{AuditError, AuditResult};
use crate::types::RawEvent;

/// Envelope around each event on the wire.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    data: RawEvent,
}

struct Decoder<S> {
    input: S,
    buffer: Vec<u8>,
    done: bool,
}

impl<S> Decoder<S> {
    /// Removes and returns the next complete line from the buffer, without the
    /// terminator.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let newline = self.buffer.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();

        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Some(line)
    }
}

/// Decodes a raw byte stream into post events.
///
/// Blank keep-alive lines are skipped. A line that is not a valid event
/// envelope yields [`AuditError::MalformedEvent`] and decoding continues with
/// the next line. A transport error yields [`AuditError::StreamClosed`] and
/// ends the stream.
pub fn decode_event_stream<S>(input: S) -> impl Stream<Item = AuditResult<RawEvent>> + Send
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static,
{
    let decoder = Decoder {
        input,
        buffer: Vec::new(),
        done: false,
    };

    stream::unfold(decoder, |mut decoder| async move {
        loop {
            if let Some(line) = decoder.take_line() {
                if line.is_empty() {
                    // Keep-alive.
                    continue;
                }

                return Some((parse_event(&line), decoder));
            }

            if decoder.done {
                return None;
            }

            match decoder.input.next().await {
                Some(Ok(chunk)) => decoder.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    decoder.done = true;
                    return Some((Err(AuditError::StreamClosed(err.to_string())), decoder));
                }
                None => {
                    decoder.done = true;

                    // Flush a trailing unterminated line, if any.
                    if !decoder.buffer.is_empty() {
                        let line = std::mem::take(&mut decoder.buffer);
                        return Some((parse_event(&line), decoder));
                    }

                    return None;
                }
            }
        }
    })
}

fn parse_event(line: &[u8]) -> AuditResult<RawEvent> {
    serde_json::from_slice::<EventEnvelope>(line)
        .map(|envelope| envelope.data)
        .map_err(AuditError::MalformedEvent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_stream(
        chunks: Vec<&'static str>,
    ) -> impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + Unpin + 'static {
        stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn decodes_one_event_per_line() {
        let input = byte_stream(vec![
            "{\"data\":{\"id\":\"1\",\"text\":\"hello\",\"author_id\":\"10\"}}\r\n",
            "{\"data\":{\"id\":\"2\",\"text\":\"world\",\"author_id\":\"20\"}}\r\n",
        ]);

        let events: Vec<_> = decode_event_stream(input).collect().await;
        assert_eq!(events.len(), 2);

        let first = events[0].as_ref().unwrap();
        assert_eq!(first.id, "1");
        assert_eq!(first.author_id, "10");

        let second = events[1].as_ref().unwrap();
        assert_eq!(second.text, "world");
    }

    #[tokio::test]
    async fn skips_keep_alive_lines() {
        let input = byte_stream(vec![
            "\r\n",
            "\r\n",
            "{\"data\":{\"id\":\"1\",\"text\":\"hi\",\"author_id\":\"10\"}}\r\n",
            "\r\n",
        ]);

        let events: Vec<_> = decode_event_stream(input).collect().await;
        assert_eq!(events.len(), 1);
        assert!(events[0].is_ok());
    }

    #[tokio::test]
    async fn reassembles_lines_split_across_chunks() {
        let input = byte_stream(vec![
            "{\"data\":{\"id\":\"1\",\"te",
            "xt\":\"split\",\"author_id\":\"10\"}}\r\n",
        ]);

        let events: Vec<_> = decode_event_stream(input).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text, "split");
    }

    #[tokio::test]
    async fn malformed_lines_yield_errors_without_ending_the_stream() {
        let input = byte_stream(vec![
            "not json\r\n",
            "{\"data\":{\"id\":\"1\",\"text\":\"ok\",\"author_id\":\"10\"}}\r\n",
        ]);

        let events: Vec<_> = decode_event_stream(input).collect().await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(AuditError::MalformedEvent(_))));
        assert!(events[1].is_ok());
    }

    #[tokio::test]
    async fn flushes_trailing_unterminated_line() {
        let input = byte_stream(vec![
            "{\"data\":{\"id\":\"1\",\"text\":\"tail\",\"author_id\":\"10\"}}",
        ]);

        let events: Vec<_> = decode_event_stream(input).collect().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().text, "tail");
    }
}
