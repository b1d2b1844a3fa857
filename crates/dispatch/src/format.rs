//! Response envelope construction. Never fails: every outcome, error
//! included, formats into a well-formed envelope for its protocol.

use parley_protocol::{
    HandlerReply, MessagingAck, ResponseEnvelope, SourceProtocol, VoiceEnvelope,
};

/// Fixed user-facing phrase for a failed turn.
pub(crate) fn error_text(message: impl std::fmt::Display) -> String {
    format!("There was an error with your request, {message}")
}

/// Wrap a successful handler reply for the voice/CLI conversation envelope.
#[must_use]
pub fn voice_reply(text: &str) -> VoiceEnvelope {
    VoiceEnvelope::speech(text)
}

/// Recover an error into the voice/CLI conversation envelope.
#[must_use]
pub fn voice_error(message: impl std::fmt::Display) -> VoiceEnvelope {
    VoiceEnvelope::speech(error_text(message))
}

/// Protocol-appropriate immediate acknowledgment, independent of whatever
/// the resolved handler later produces.
#[must_use]
pub fn immediate_ack(source: SourceProtocol) -> MessagingAck {
    match source {
        SourceProtocol::MessagingCommand => MessagingAck::command_receipt(),
        SourceProtocol::MessagingAction => MessagingAck::placeholder(),
        // Events, and anything unexpected, get the bare receipt.
        _ => MessagingAck::receipt(),
    }
}

/// Generic formatter contract: wrap a handler outcome for any protocol.
#[must_use]
pub fn format(source: SourceProtocol, outcome: &anyhow::Result<HandlerReply>) -> ResponseEnvelope {
    if source.is_messaging() {
        return ResponseEnvelope::Messaging(immediate_ack(source));
    }
    ResponseEnvelope::Voice(match outcome {
        Ok(reply) => voice_reply(&reply.as_text()),
        Err(e) => voice_error(e),
    })
}
