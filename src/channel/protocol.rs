// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Wire protocol for the typed message channel.
//!
//! Every message is one JSON object per line: `{"type": ..., "content": ...}`.
//! The `type` field is the demultiplexing key; anything else is payload.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Type assigned to inbound messages that carry no `type` field.
pub const DEFAULT_MESSAGE_TYPE: &str = "default";

fn default_type() -> String {
    DEFAULT_MESSAGE_TYPE.to_string()
}

// ============================================================================
// Message kinds
// ============================================================================

/// Well-known message types exchanged with the client.
///
/// The channel accepts any string as a type; these are the ones the
/// orchestration layer sends or waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Session start request (and untyped inbound messages).
    Default,
    /// Status line for the user.
    Log,
    /// Unified diff of a proposed edit.
    Diff,
    /// Yes/no(/feedback) prompt and its reply.
    Confirmation,
    /// Free-text prompt and its reply.
    Question,
    /// Error report.
    Error,
    /// Routine finished normally.
    Completed,
    /// Client asks to abort the running routine.
    Stop,
    /// Per-call token accounting.
    TokenUsage,
    /// Aggregate usage report.
    Usage,
}

impl MessageKind {
    /// Wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Default => DEFAULT_MESSAGE_TYPE,
            MessageKind::Log => "log",
            MessageKind::Diff => "diff",
            MessageKind::Confirmation => "confirmation",
            MessageKind::Question => "question",
            MessageKind::Error => "error",
            MessageKind::Completed => "completed",
            MessageKind::Stop => "stop",
            MessageKind::TokenUsage => "token_usage",
            MessageKind::Usage => "usage",
        }
    }
}

impl AsRef<str> for MessageKind {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Message envelope
// ============================================================================

/// A single message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedMessage {
    /// Demultiplexing key.
    #[serde(rename = "type", default = "default_type")]
    pub kind: String,

    /// Message payload.
    #[serde(default)]
    pub content: Value,

    /// Any other top-level fields (e.g. `config` on the start message).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TypedMessage {
    /// Create a message with the given type and content.
    pub fn new(kind: impl AsRef<str>, content: impl Into<Value>) -> Self {
        Self {
            kind: kind.as_ref().to_string(),
            content: content.into(),
            extra: Map::new(),
        }
    }

    /// Attach an extra top-level field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Whether this message has the given type.
    pub fn is(&self, kind: impl AsRef<str>) -> bool {
        self.kind == kind.as_ref()
    }

    /// Content as text. Strings are returned verbatim, null as empty,
    /// anything else as its JSON rendering.
    pub fn content_str(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Look up an extra top-level field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Encode a message as a single NDJSON line.
pub fn encode(message: &TypedMessage) -> Result<String, serde_json::Error> {
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    Ok(json)
}

/// Decode a message from a single NDJSON line.
pub fn decode(line: &str) -> Result<TypedMessage, serde_json::Error> {
    serde_json::from_str(line.trim())
}
