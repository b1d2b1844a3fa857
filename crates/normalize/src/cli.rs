//! Command-line simulation of a conversation turn.
//!
//! The CLI passes the intent as a positional name and every keyword as a
//! plain string; there is no upstream serialization step, so values need no
//! un-escaping and raw text equals the value.

use serde_json::Value;

use parley_protocol::{Argument, CanonicalRequest, SourceProtocol};

use crate::{canonical_routing_key, ensure_trigger_query, parse_actor, parse_conversation};

/// Normalize a CLI invocation. `intent` is the positional routing name,
/// `kwargs` the keyword map. Never fails.
#[must_use]
pub fn normalize_cli(intent: Option<&str>, kwargs: &Value) -> CanonicalRequest {
    let mut arguments = std::collections::BTreeMap::new();
    if let Some(map) = kwargs.as_object() {
        for (key, value) in map {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            arguments.insert(key.clone(), Argument::literal(text));
        }
    }
    ensure_trigger_query(&mut arguments);

    CanonicalRequest {
        routing_key: canonical_routing_key(intent),
        arguments,
        actor: parse_actor(kwargs.get("user")),
        conversation: parse_conversation(kwargs.get("conversation")),
        source: SourceProtocol::Cli,
    }
}
