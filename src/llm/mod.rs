//! Upstream LLM relay
//!
//! A single HTTP contract: POST an OpenAI-style chat body with `stream: true`
//! and read back a `text/event-stream` body.

pub mod client;
pub mod error;
pub mod provider;

pub use client::HttpRelayClient;
pub use error::LlmError;
pub use provider::{ByteStream, LlmProvider};
