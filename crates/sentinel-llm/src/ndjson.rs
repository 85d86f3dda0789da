//! Newline-delimited JSON -> [`BackendStream`] adapter.

use bytes::{Bytes, BytesMut};
use futures::Stream;
use futures_util::StreamExt;
use reqwest::Response;

use crate::error::{BackendError, Result};
use crate::provider::BackendStream;

/// Split a byte stream into trimmed, non-empty lines.
///
/// Lines may span chunk boundaries; a final line without a trailing newline is
/// still emitted. Transport errors are passed through and end the stream.
pub fn ndjson_lines<S, E>(bytes: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<BackendError> + Send + 'static,
{
    async_stream::stream! {
        let mut buffer = BytesMut::new();
        futures::pin_mut!(bytes);

        while let Some(chunk) = bytes.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e.into());
                    return;
                }
            };
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                let line = buffer.split_to(pos + 1);
                if let Some(text) = decode_line(&line) {
                    yield Ok(text);
                }
            }
        }

        if let Some(text) = decode_line(&buffer) {
            yield Ok(text);
        }
    }
}

fn decode_line(line: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(line);
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Convert an NDJSON HTTP [`Response`] into a [`BackendStream`].
///
/// `handler` receives each line and can either:
/// - return `Ok(Some(text))` to emit a payload
/// - return `Ok(None)` to skip the line
/// - return `Err(_)` to emit a stream error
pub fn backend_stream_from_ndjson<H>(response: Response, mut handler: H) -> BackendStream
where
    H: FnMut(&str) -> Result<Option<String>> + Send + 'static,
{
    let stream = ndjson_lines(response.bytes_stream())
        .map(move |line| line.and_then(|line| handler(&line)))
        .filter_map(|result| async move {
            match result {
                Ok(Some(text)) => Some(Ok(text)),
                Ok(None) => None,
                Err(err) => Some(Err(err)),
            }
        });

    Box::pin(stream)
}
