//! Voice-assistant conversation turn normalization.
//!
//! Inbound shape: `{user, conversation, inputs[], raw_inputs[]}` where each
//! input carries `intent` and `arguments: [{name, text_value, raw_text}]`.

use std::collections::BTreeMap;

use serde_json::Value;

use parley_protocol::{Argument, CanonicalRequest, SourceProtocol};

use crate::{
    canonical_routing_key, ensure_trigger_query, parse_actor, parse_conversation,
    value::{array_field, string_field, unescape_quotes},
};

/// A payload carrying assistant inputs is a live turn; without any it is
/// the CLI simulation probing the same entry point with keyword arguments.
#[must_use]
pub fn has_assistant_inputs(payload: &Value) -> bool {
    !array_field(payload, "inputs").is_empty()
}

/// Normalize one voice-assistant turn. Never fails; missing fields default.
#[must_use]
pub fn normalize_voice(payload: &Value) -> CanonicalRequest {
    let inputs = array_field(payload, "inputs");
    let input = inputs.first().cloned().unwrap_or(Value::Null);

    let mut arguments = parse_arguments(array_field(&input, "arguments"));
    ensure_trigger_query(&mut arguments);

    CanonicalRequest {
        routing_key: canonical_routing_key(
            input.get("intent").and_then(Value::as_str),
        ),
        arguments,
        actor: parse_actor(payload.get("user")),
        conversation: parse_conversation(payload.get("conversation")),
        source: SourceProtocol::VoiceAssistant,
    }
}

/// Each raw entry supplies a `name` plus `text_value`/`raw_text`, both of
/// which carry the platform's escaped-apostrophe sequence.
fn parse_arguments(raw: &[Value]) -> BTreeMap<String, Argument> {
    let mut arguments = BTreeMap::new();
    for entry in raw {
        let Some(name) = string_field(entry, "name") else {
            continue;
        };
        let value = entry
            .get("text_value")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let raw_text = entry
            .get("raw_text")
            .and_then(Value::as_str)
            .unwrap_or_default();
        arguments.insert(
            name,
            Argument::new(unescape_quotes(value), unescape_quotes(raw_text)),
        );
    }
    arguments
}
