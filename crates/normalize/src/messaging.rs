//! Messaging platform payload normalization.
//!
//! Inbound shape: `{event?, command?, action?, team_id?, channel, token?}`.
//! The external dispatcher guarantees exactly one of `event` / `command` /
//! `action` is set; whichever concrete field is present determines the
//! source protocol and the routing key:
//! - event   → `event.type`
//! - command → command name minus its leading slash
//! - action  → name of the first selected action

use std::collections::BTreeMap;

use serde_json::Value;

use parley_protocol::{Actor, Argument, CanonicalRequest, Conversation, SourceProtocol};

use crate::{
    canonical_routing_key, ensure_trigger_query,
    value::{array_field, present_field, string_field},
};

/// Normalize a messaging payload. `None` when none of the three concrete
/// fields is present; the dispatcher surfaces that as a malformed request.
#[must_use]
pub fn normalize_messaging(payload: &Value) -> Option<CanonicalRequest> {
    if let Some(event) = present_field(payload, "event") {
        return Some(normalize_event(payload, event));
    }
    if let Some(command) = present_field(payload, "command") {
        return Some(normalize_command(payload, command));
    }
    if let Some(action) = present_field(payload, "action") {
        return Some(normalize_action(payload, action));
    }
    None
}

fn normalize_event(payload: &Value, event: &Value) -> CanonicalRequest {
    let mut arguments = string_fields(event);
    ensure_trigger_query(&mut arguments);

    CanonicalRequest {
        routing_key: canonical_routing_key(event.get("type").and_then(Value::as_str)),
        arguments,
        actor: Actor {
            id: string_field(event, "user"),
        },
        conversation: channel_conversation(payload, string_field(event, "channel")),
        source: SourceProtocol::MessagingEvent,
    }
}

fn normalize_command(payload: &Value, command: &Value) -> CanonicalRequest {
    // A command arrives either as the bare "/name" string with its fields as
    // payload siblings, or as an object carrying its own fields.
    let (raw_name, command) = match command {
        Value::String(name) => (Some(name.as_str()), payload),
        _ => (command.get("command").and_then(Value::as_str), command),
    };

    let mut arguments = string_fields(command);
    // The platform sends channel_id/user_id for commands where events carry
    // channel/user; fold the aliases onto the canonical names.
    let channel = string_field(command, "channel_id").or_else(|| string_field(command, "channel"));
    let user = string_field(command, "user_id").or_else(|| string_field(command, "user"));
    if let Some(channel) = &channel {
        arguments.insert("channel".into(), Argument::literal(channel.clone()));
    }
    if let Some(user) = &user {
        arguments.insert("user".into(), Argument::literal(user.clone()));
    }
    ensure_trigger_query(&mut arguments);

    let name = string_field(command, "name")
        .or_else(|| raw_name.map(|c| c.trim_start_matches('/').to_string()))
        .filter(|n| !n.is_empty());

    CanonicalRequest {
        routing_key: canonical_routing_key(name.as_deref()),
        arguments,
        actor: Actor { id: user },
        conversation: channel_conversation(payload, channel),
        source: SourceProtocol::MessagingCommand,
    }
}

fn normalize_action(payload: &Value, action: &Value) -> CanonicalRequest {
    let selected = array_field(action, "actions")
        .first()
        .cloned()
        .unwrap_or(Value::Null);

    let mut arguments = string_fields(&selected);
    if let Some(callback_id) = string_field(action, "callback_id") {
        arguments.insert("callback_id".into(), Argument::literal(callback_id));
    }
    ensure_trigger_query(&mut arguments);

    let actor = Actor {
        id: action
            .get("user")
            .and_then(|u| string_field(u, "id").or_else(|| string_field(u, "name"))),
    };

    CanonicalRequest {
        routing_key: canonical_routing_key(selected.get("name").and_then(Value::as_str)),
        arguments,
        actor,
        conversation: channel_conversation(payload, action_channel(action)),
        source: SourceProtocol::MessagingAction,
    }
}

/// Interactive payloads carry the channel as either a plain ID or an
/// `{id, name}` object.
fn action_channel(action: &Value) -> Option<String> {
    match action.get("channel") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(channel) => string_field(channel, "id"),
        None => None,
    }
}

fn channel_conversation(payload: &Value, fallback: Option<String>) -> Conversation {
    Conversation {
        id: string_field(payload, "channel").or(fallback),
        kind: Some("channel".into()),
    }
}

/// Flatten the top-level string fields of an object into the argument bag.
fn string_fields(object: &Value) -> BTreeMap<String, Argument> {
    object
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(key, value)| {
                    value
                        .as_str()
                        .map(|text| (key.clone(), Argument::literal(text)))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use parley_protocol::TRIGGER_QUERY_ARG;

    #[test]
    fn event_payload_routes_by_type() {
        let payload = json!({
            "team_id": "T1",
            "channel": "C1",
            "event": {
                "type": "message",
                "subtype": "",
                "text": "hi there",
                "channel": "C1",
                "user": "U1"
            }
        });

        let request = normalize_messaging(&payload).unwrap();
        assert_eq!(request.routing_key, "message");
        assert_eq!(request.source, SourceProtocol::MessagingEvent);
        assert_eq!(request.actor.id.as_deref(), Some("U1"));
        assert_eq!(request.conversation.id.as_deref(), Some("C1"));
        assert_eq!(request.arguments["text"].value, "hi there");
        assert!(request.arguments.contains_key(TRIGGER_QUERY_ARG));
    }

    #[test]
    fn command_payload_strips_leading_slash() {
        let payload = json!({
            "channel": "C1",
            "command": {
                "command": "/hello",
                "text": "world",
                "channel_id": "C1",
                "user_id": "U1",
                "token": "tok"
            }
        });

        let request = normalize_messaging(&payload).unwrap();
        assert_eq!(request.routing_key, "hello");
        assert_eq!(request.source, SourceProtocol::MessagingCommand);
        assert_eq!(request.arguments["text"].value, "world");
        assert_eq!(request.arguments["channel"].value, "C1");
        assert_eq!(request.arguments["user"].value, "U1");
        assert_eq!(request.actor.id.as_deref(), Some("U1"));
    }

    #[test]
    fn bare_string_command_reads_sibling_fields() {
        let payload = json!({
            "command": "/hello",
            "text": "world",
            "channel": "C1",
            "user": "U1"
        });

        let request = normalize_messaging(&payload).unwrap();
        assert_eq!(request.routing_key, "hello");
        assert_eq!(request.source, SourceProtocol::MessagingCommand);
        assert_eq!(request.arguments["text"].value, "world");
        assert_eq!(request.actor.id.as_deref(), Some("U1"));
        assert_eq!(request.conversation.id.as_deref(), Some("C1"));
    }

    #[test]
    fn action_payload_routes_by_first_selected_action() {
        let payload = json!({
            "action": {
                "actions": [{ "name": "approve", "value": "yes" }],
                "callback_id": "cb-9",
                "channel": { "id": "C2", "name": "general" },
                "user": { "id": "U2", "name": "sam" }
            }
        });

        let request = normalize_messaging(&payload).unwrap();
        assert_eq!(request.routing_key, "approve");
        assert_eq!(request.source, SourceProtocol::MessagingAction);
        assert_eq!(request.arguments["value"].value, "yes");
        assert_eq!(request.arguments["callback_id"].value, "cb-9");
        assert_eq!(request.conversation.id.as_deref(), Some("C2"));
        assert_eq!(request.actor.id.as_deref(), Some("U2"));
    }

    #[test]
    fn empty_payload_is_unrecognized() {
        assert!(normalize_messaging(&json!({ "channel": "C1" })).is_none());
        assert!(normalize_messaging(&json!({ "event": null })).is_none());
    }

    #[test]
    fn event_with_no_type_falls_back_to_main() {
        let payload = json!({ "channel": "C1", "event": { "text": "hi" } });
        let request = normalize_messaging(&payload).unwrap();
        assert_eq!(request.routing_key, "__main__");
    }
}
