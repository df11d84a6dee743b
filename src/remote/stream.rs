//! Reader for the realtime stream of a deep-search run.
//!
//! The stream is server-sent events; each `data:` payload is a JSON frame
//! `{"type": .., "message": ..}` and frames whose type contains `MESSAGE_`
//! carry the next slice of the answer. The answer is complete when the
//! server closes the stream.

use super::types::DeepSearchRun;
use crate::error::RemoteError;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;

/// Accumulates raw stream bytes and hands out complete event blocks.
///
/// Bytes are only decoded once a whole block has arrived, so a character or
/// a `\r\n` pair split across chunks survives intact.
#[derive(Debug, Default)]
pub struct SseBuffer {
    buffer: Vec<u8>,
}

impl SseBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Next block terminated by a blank line, with line endings normalized
    /// to `\n`.
    pub fn next_event_block(&mut self) -> Option<String> {
        let end = block_end(&self.buffer)?;
        let block: Vec<u8> = self.buffer.drain(..end).collect();
        Some(decode(&block))
    }

    /// Whatever is left once the stream has closed.
    pub fn finish(&mut self) -> Option<String> {
        let rest = decode(&std::mem::take(&mut self.buffer));
        (!rest.trim().is_empty()).then_some(rest)
    }
}

/// Offset just past the first blank line. Lines end in `\r\n`, `\n` or
/// `\r`; a trailing `\r` waits for the next byte.
fn block_end(buffer: &[u8]) -> Option<usize> {
    let mut at_line_start = false;
    let mut i = 0;
    while i < buffer.len() {
        let line_end = match buffer[i] {
            b'\r' => match buffer.get(i + 1) {
                None => return None,
                Some(b'\n') => i + 2,
                Some(_) => i + 1,
            },
            b'\n' => i + 1,
            _ => {
                at_line_start = false;
                i += 1;
                continue;
            }
        };
        if at_line_start {
            return Some(line_end);
        }
        at_line_start = true;
        i = line_end;
    }
    None
}

fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .replace("\r\n", "\n")
        .replace('\r', "\n")
}

pub fn parse_data_lines(event_block: &str) -> Vec<&str> {
    event_block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect()
}

#[derive(Debug, Deserialize)]
struct StreamFrame {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    message: Option<String>,
}

/// Answer text carried by one `data:` payload, if any.
pub fn message_delta(data: &str) -> Option<String> {
    let frame: StreamFrame = serde_json::from_str(data).ok()?;
    if frame.kind.contains("MESSAGE_") {
        frame.message
    } else {
        None
    }
}

pub struct TriggerStream {
    http: Client,
    base_url: String,
}

impl TriggerStream {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the run's stream to the end, calling `on_delta` for every slice,
    /// and return the assembled answer.
    pub async fn collect(
        &self,
        run: &DeepSearchRun,
        mut on_delta: impl FnMut(&str) + Send,
    ) -> Result<String, RemoteError> {
        const ENDPOINT: &str = "realtime stream";

        let response = self
            .http
            .get(format!(
                "{}/realtime/v1/streams/{}/messages",
                self.base_url, run.id
            ))
            .bearer_auth(&run.token)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| RemoteError::transport(ENDPOINT, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::transport(ENDPOINT, format!("HTTP {status}")));
        }

        let mut byte_stream = response.bytes_stream();
        let mut sse_buffer = SseBuffer::new();
        let mut answer = String::new();
        let mut consume = |block: &str, answer: &mut String| {
            for data in parse_data_lines(block) {
                if let Some(delta) = message_delta(data) {
                    on_delta(&delta);
                    answer.push_str(&delta);
                }
            }
        };

        while let Some(chunk) = byte_stream.next().await {
            let chunk = chunk.map_err(|e| RemoteError::transport(ENDPOINT, e))?;
            sse_buffer.push_chunk(&chunk);
            while let Some(block) = sse_buffer.next_event_block() {
                consume(&block, &mut answer);
            }
        }
        if let Some(block) = sse_buffer.finish() {
            consume(&block, &mut answer);
        }

        Ok(answer)
    }
}
