//! Normalize platform-specific payloads into canonical requests.
//!
//! One normalizer per front-end:
//! - [`voice::normalize_voice`]         — voice-assistant conversation turn
//! - [`cli::normalize_cli`]             — command-line simulation of a turn
//! - [`messaging::normalize_messaging`] — messaging event/command/action
//!
//! All three are pure functions of their input and never fail: upstream
//! platforms are not guaranteed to send complete data, so malformed or
//! partially-missing fields degrade to documented defaults instead.

pub mod cli;
pub mod messaging;
pub mod value;
pub mod voice;

pub use {
    cli::normalize_cli,
    messaging::normalize_messaging,
    voice::{has_assistant_inputs, normalize_voice},
};

use std::collections::BTreeMap;

use parley_protocol::{
    Actor, Argument, Conversation, MAIN_ROUTING_KEY, TRIGGER_QUERY_ARG, VOICE_MAIN_INTENT,
};

/// Rewrite a raw intent/routing name to its canonical form.
///
/// Empty or missing names and the platform's main-entry sentinel both map to
/// the `"__main__"` key, so the routing key is never empty downstream.
fn canonical_routing_key(raw: Option<&str>) -> String {
    match raw {
        None | Some("") | Some(VOICE_MAIN_INTENT) => MAIN_ROUTING_KEY.to_string(),
        Some(name) => name.to_string(),
    }
}

/// Every canonical request carries a `trigger_query` argument, defaulting to
/// empty strings when the source supplied none.
fn ensure_trigger_query(arguments: &mut BTreeMap<String, Argument>) {
    arguments
        .entry(TRIGGER_QUERY_ARG.to_string())
        .or_default();
}

fn parse_actor(user: Option<&serde_json::Value>) -> Actor {
    Actor {
        id: user
            .and_then(|u| u.get("user_id"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
    }
}

fn parse_conversation(conversation: Option<&serde_json::Value>) -> Conversation {
    Conversation {
        id: conversation
            .and_then(|c| c.get("conversation_id"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        kind: conversation
            .and_then(|c| c.get("type"))
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_sentinel_rewrites() {
        assert_eq!(canonical_routing_key(Some(VOICE_MAIN_INTENT)), "__main__");
        assert_eq!(canonical_routing_key(None), "__main__");
        assert_eq!(canonical_routing_key(Some("")), "__main__");
        assert_eq!(canonical_routing_key(Some("orderPizza")), "orderPizza");
    }

    #[test]
    fn actor_tolerates_non_objects() {
        assert_eq!(parse_actor(Some(&serde_json::json!("someone"))).id, None);
        assert_eq!(parse_actor(None).id, None);
        assert_eq!(
            parse_actor(Some(&serde_json::json!({ "user_id": "U1" }))).id,
            Some("U1".to_string())
        );
    }
}
