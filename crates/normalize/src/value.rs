//! Tolerant field extraction over untyped JSON payloads.

use serde_json::Value;

/// Non-empty string field, or `None`.
#[must_use]
pub fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Array field; anything that is not an array reads as empty.
#[must_use]
pub fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Object-or-present field: `Some` when the key exists and is not null.
#[must_use]
pub fn present_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

/// Un-escape the upstream serialization of a single quote. The voice
/// platform ships apostrophes as the literal sequence `" ' "`, so
/// `o ' Brien` reads back as `o'Brien`.
#[must_use]
pub fn unescape_quotes(text: &str) -> String {
    text.replace(" ' ", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_apostrophe_sequence() {
        assert_eq!(unescape_quotes("o ' Brien"), "o'Brien");
        assert_eq!(unescape_quotes("it ' s a ' s"), "it's a's");
        assert_eq!(unescape_quotes("untouched"), "untouched");
    }

    #[test]
    fn non_arrays_read_as_empty() {
        let payload = serde_json::json!({ "inputs": "oops" });
        assert!(array_field(&payload, "inputs").is_empty());
        assert!(array_field(&payload, "missing").is_empty());
    }
}
