//! Server-Sent Events passthrough
//!
//! Upstream bytes reach the client exactly as received, chunk by chunk. A
//! framer reads the same bytes on the side to count frames and spot the
//! `[DONE]` sentinel for logging; it never changes what is sent.

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, trace, warn, Instrument, Span};

use crate::llm::{ByteStream, LlmError};

/// Payload OpenAI-compatible upstreams send as their last `data:` line
pub const DONE_SENTINEL: &str = "[DONE]";

/// Chunks buffered between the upstream reader and the client
const RELAY_BUFFER: usize = 32;

/// Body handed to the client. An `Err` item aborts the connection.
pub type RelayBody = ReceiverStream<Result<Bytes, LlmError>>;

/// What the side-channel framer keeps of one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseFrame {
    pub event: Option<String>,
    /// `data` values with the optional leading space removed, joined with `\n`
    pub data: Option<String>,
}

impl SseFrame {
    /// Parse the lines of one frame. Returns `None` when it carries neither
    /// an event name nor data.
    pub fn parse(text: &str) -> Option<SseFrame> {
        let mut event = None;
        let mut data_lines: Vec<&str> = Vec::new();

        for line in text.lines() {
            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "data" => data_lines.push(value),
                "event" => event = Some(value.to_string()),
                _ => {}
            }
        }

        let data = (!data_lines.is_empty()).then(|| data_lines.join("\n"));
        if event.is_none() && data.is_none() {
            return None;
        }
        Some(SseFrame { event, data })
    }

    pub fn is_done(&self) -> bool {
        self.data.as_deref().map(str::trim) == Some(DONE_SENTINEL)
    }
}

/// Incremental splitter turning arbitrary byte chunks into complete frames
#[derive(Debug, Default)]
pub struct SseFramer {
    buffer: Vec<u8>,
}

impl SseFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every frame it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((end, separator_len)) = find_boundary(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + separator_len).collect();
            if let Some(frame) = decode_frame(&raw[..end]) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush a trailing frame the upstream did not terminate with a blank line
    pub fn finish(&mut self) -> Option<SseFrame> {
        let rest = std::mem::take(&mut self.buffer);
        decode_frame(&rest)
    }
}

/// Earliest blank-line boundary as (frame end, separator length)
fn find_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = find(buffer, b"\n\n").map(|i| (i, 2));
    let crlf = find(buffer, b"\r\n\r\n").map(|i| (i, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn decode_frame(raw: &[u8]) -> Option<SseFrame> {
    SseFrame::parse(&String::from_utf8_lossy(raw))
}

/// Relay an upstream body whose first chunk has already arrived.
///
/// A spawned task copies chunks into a bounded channel. It stops as soon as
/// the client side is dropped, which drops the upstream response with it.
pub fn relay_body(first: Bytes, upstream: ByteStream) -> RelayBody {
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);
    tokio::spawn(forward(first, upstream, tx).instrument(Span::current()));
    ReceiverStream::new(rx)
}

async fn forward(
    first: Bytes,
    mut upstream: ByteStream,
    tx: mpsc::Sender<Result<Bytes, LlmError>>,
) {
    let mut framer = SseFramer::new();
    let mut frames = 0usize;
    let mut bytes_sent = 0usize;
    let mut pending = Some(Ok(first));

    loop {
        let item = match pending.take() {
            Some(item) => item,
            None => tokio::select! {
                next = upstream.next() => match next {
                    Some(item) => item,
                    None => break,
                },
                _ = tx.closed() => {
                    debug!(bytes_sent, "client went away, dropping upstream");
                    return;
                }
            },
        };

        let chunk = match item {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, frames, bytes_sent, "upstream stream failed mid-transfer");
                let _ = tx.send(Err(e)).await;
                return;
            }
        };

        for frame in framer.push(&chunk) {
            frames += 1;
            trace!(frames, event = frame.event.as_deref(), "upstream frame");
            if frame.is_done() {
                debug!(frames, "upstream signalled completion");
            }
        }

        if chunk.is_empty() {
            continue;
        }
        bytes_sent += chunk.len();
        if tx.send(Ok(chunk)).await.is_err() {
            debug!(bytes_sent, "client went away, dropping upstream");
            return;
        }
    }

    if framer.finish().is_some() {
        frames += 1;
    }
    debug!(frames, bytes_sent, "upstream stream closed");
}
