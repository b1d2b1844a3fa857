//! Canonical request/response data model for inbound conversational events.
//!
//! Every front-end payload (voice-assistant turn, CLI simulation, messaging
//! event/command/action) normalizes into one [`CanonicalRequest`] per inbound
//! call. Response envelopes mirror the wire shapes the originating platforms
//! expect:
//! - `VoiceEnvelope`  — conversation turn reply with synthesized speech text
//! - `MessagingAck`   — immediate lightweight acknowledgment for messaging
//!   payloads; the real handler result travels out-of-band

use serde::{Deserialize, Serialize};

// ── Constants ────────────────────────────────────────────────────────────────

/// Sentinel routing key for a top-level/default invocation.
pub const MAIN_ROUTING_KEY: &str = "__main__";

/// Platform intent name that rewrites to [`MAIN_ROUTING_KEY`].
pub const VOICE_MAIN_INTENT: &str = "assistant.intent.action.MAIN";

/// Argument entry present on every canonical request.
pub const TRIGGER_QUERY_ARG: &str = "trigger_query";

// ── Source protocols ─────────────────────────────────────────────────────────

/// Which front-end a payload arrived from. Drives response formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceProtocol {
    VoiceAssistant,
    Cli,
    MessagingEvent,
    MessagingCommand,
    MessagingAction,
}

impl SourceProtocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::VoiceAssistant => "voice_assistant",
            Self::Cli => "cli",
            Self::MessagingEvent => "messaging_event",
            Self::MessagingCommand => "messaging_command",
            Self::MessagingAction => "messaging_action",
        }
    }

    /// Messaging payloads get an immediate ack and deferred delivery.
    #[must_use]
    pub fn is_messaging(self) -> bool {
        matches!(
            self,
            Self::MessagingEvent | Self::MessagingCommand | Self::MessagingAction
        )
    }
}

impl std::fmt::Display for SourceProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Canonical request ────────────────────────────────────────────────────────

/// One normalized argument: the parsed value plus the raw text it came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    pub value: String,
    pub raw_text: String,
}

impl Argument {
    #[must_use]
    pub fn new(value: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Identical value and raw text, for sources with no upstream
    /// serialization step (CLI keywords, messaging fields).
    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            value: text.clone(),
            raw_text: text,
        }
    }
}

/// Originating user/device identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Option<String>,
}

/// Session/channel identity of the inbound payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Option<String>,
    pub kind: Option<String>,
}

/// Protocol-agnostic representation of one inbound turn/event.
///
/// Built once by the normalizer, owned by the dispatch call that created it,
/// never persisted. `routing_key` is non-empty and `arguments` always
/// contains a [`TRIGGER_QUERY_ARG`] entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRequest {
    pub routing_key: String,
    pub arguments: std::collections::BTreeMap<String, Argument>,
    pub actor: Actor,
    pub conversation: Conversation,
    pub source: SourceProtocol,
}

// ── Handler replies ──────────────────────────────────────────────────────────

/// What a handler produces: plain text, or a structured message in the
/// platform's message-update shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HandlerReply {
    Text(String),
    Message(serde_json::Value),
}

impl HandlerReply {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Best-effort textual rendering, used by the voice envelope.
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Message(value) => value
                .get("text")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

/// Payload for the platform message-update API, delivered by the embedding
/// service after a messaging handler completes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageUpdate {
    pub token: Option<String>,
    pub channel: String,
    pub ts: Option<String>,
    pub message: HandlerReply,
}

// ── Response envelopes ───────────────────────────────────────────────────────

/// Voice-assistant conversation envelope (also used by the CLI simulation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceEnvelope {
    pub expect_user_response: bool,
    pub final_response: FinalResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    pub speech_response: SpeechResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechResponse {
    pub text_to_speech: String,
}

impl VoiceEnvelope {
    /// Terminal turn: speak `text`, expect no further user response.
    #[must_use]
    pub fn speech(text: impl Into<String>) -> Self {
        Self {
            expect_user_response: false,
            final_response: FinalResponse {
                speech_response: SpeechResponse {
                    text_to_speech: text.into(),
                },
            },
        }
    }
}

/// Immediate acknowledgment for a messaging payload. The originating
/// platform enforces a short response-time budget, so these never wait on
/// handler execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessagingAck {
    /// Bare receipt for events.
    Receipt { ok: bool },
    /// Empty in-channel receipt for slash commands.
    CommandReceipt { response_type: String, text: String },
    /// Transient placeholder shown until the handler's real result replaces
    /// the message.
    Placeholder(String),
    /// Soft rejection (duplicate, malformed command); not an HTTP failure.
    SoftError { error: String },
    /// URL-verification handshake echo.
    Challenge { challenge: String },
}

impl MessagingAck {
    #[must_use]
    pub fn receipt() -> Self {
        Self::Receipt { ok: true }
    }

    #[must_use]
    pub fn command_receipt() -> Self {
        Self::CommandReceipt {
            response_type: "in_channel".into(),
            text: String::new(),
        }
    }

    #[must_use]
    pub fn placeholder() -> Self {
        Self::Placeholder("Working...".into())
    }

    #[must_use]
    pub fn soft_error(message: impl Into<String>) -> Self {
        Self::SoftError {
            error: message.into(),
        }
    }

    #[must_use]
    pub fn challenge(value: impl Into<String>) -> Self {
        Self::Challenge {
            challenge: value.into(),
        }
    }
}

/// Any reply the dispatcher can hand back to the external caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Voice(VoiceEnvelope),
    Messaging(MessagingAck),
}
