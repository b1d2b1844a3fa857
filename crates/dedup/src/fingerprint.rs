use {
    serde_json::Value,
    sha2::{Digest, Sha256},
};

/// Identity fields considered when fingerprinting an event. The fixed field
/// order makes the digest independent of key ordering in the source payload.
const IDENTITY_FIELDS: [&str; 6] = ["type", "subtype", "channel", "user", "text", "ts"];

/// Deterministic digest of an event's identity fields.
///
/// Two payloads describing the same logical event (same type, subtype,
/// channel, user, text, and platform timestamp) always produce the same
/// fingerprint; absent and null fields are skipped.
#[must_use]
pub fn fingerprint(event: &Value) -> String {
    let mut hasher = Sha256::new();
    for key in IDENTITY_FIELDS {
        let Some(value) = event.get(key) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let rendered = match value.as_str() {
            Some(text) => text.to_string(),
            None => value.to_string(),
        };
        hasher.update(key.as_bytes());
        hasher.update(b"=");
        hasher.update(rendered.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn deterministic_across_field_order() {
        let a: Value = serde_json::from_str(
            r#"{"type":"message","channel":"C1","user":"U1","text":"hi","ts":"111.22"}"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{"ts":"111.22","text":"hi","user":"U1","channel":"C1","type":"message"}"#,
        )
        .unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn differing_identity_fields_differ() {
        let a = json!({ "type": "message", "channel": "C1", "text": "hi" });
        let b = json!({ "type": "message", "channel": "C2", "text": "hi" });
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn non_identity_fields_are_ignored() {
        let a = json!({ "type": "message", "text": "hi", "event_id": "E1" });
        let b = json!({ "type": "message", "text": "hi", "event_id": "E2" });
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn numeric_timestamps_participate() {
        let a = json!({ "type": "message", "ts": 111 });
        let b = json!({ "type": "message", "ts": 112 });
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }
}
