//! JSON encode/decode for documents.

use crate::document::{
    format_timestamp, parse_timestamp, Document, FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT,
};
use crate::error::{CodecError, CodecResult};
use crate::id::EntityId;
use serde_json::{Map, Value};
use time::OffsetDateTime;

/// Encodes a document to its stored JSON form.
///
/// This is a pure transform: reserved fields are written first, followed by
/// the attribute map in its insertion order.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn encode(doc: &Document) -> CodecResult<Vec<u8>> {
    let mut object = Map::with_capacity(doc.attrs().len() + 3);
    object.insert(FIELD_ID.into(), Value::String(doc.id().to_string()));
    object.insert(
        FIELD_CREATED_AT.into(),
        Value::String(format_timestamp(doc.created_at())),
    );
    object.insert(
        FIELD_UPDATED_AT.into(),
        Value::String(format_timestamp(doc.updated_at())),
    );
    for (name, value) in doc.attrs() {
        object.insert(name.clone(), value.clone());
    }

    Ok(serde_json::to_vec(&Value::Object(object))?)
}

/// Decodes a document from its stored JSON form.
///
/// Unknown extra fields are passed through into the attribute map; they are
/// not rejected and survive the next [`encode`].
///
/// # Errors
///
/// Returns an error if:
/// - The bytes are not a well-formed JSON object
/// - A reserved field (`id`, `created_at`, `updated_at`) is missing
/// - A reserved field is present but malformed
pub fn decode(bytes: &[u8]) -> CodecResult<Document> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(mut object) = value else {
        return Err(CodecError::invalid_field(
            FIELD_ID,
            "stored blob is not a JSON object",
        ));
    };

    let id = take_id(&mut object)?;
    let created_at = take_timestamp(&mut object, FIELD_CREATED_AT)?;
    let updated_at = take_timestamp(&mut object, FIELD_UPDATED_AT)?;

    // Whatever remains is the attribute set, extras included
    Ok(Document::from_parts(id, created_at, updated_at, object))
}

fn take_id(object: &mut Map<String, Value>) -> CodecResult<EntityId> {
    let value = object
        .remove(FIELD_ID)
        .ok_or_else(|| CodecError::missing_field(FIELD_ID))?;
    let text = value
        .as_str()
        .ok_or_else(|| CodecError::invalid_field(FIELD_ID, "expected a string"))?;
    EntityId::parse(text)
        .ok_or_else(|| CodecError::invalid_field(FIELD_ID, format!("'{text}' is not a UUID")))
}

fn take_timestamp(object: &mut Map<String, Value>, field: &str) -> CodecResult<OffsetDateTime> {
    let value = object
        .remove(field)
        .ok_or_else(|| CodecError::missing_field(field))?;
    let text = value
        .as_str()
        .ok_or_else(|| CodecError::invalid_field(field, "expected a string"))?;
    parse_timestamp(text).ok_or_else(|| {
        CodecError::invalid_field(field, format!("'{text}' is not an RFC 3339 timestamp"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn encode_decode_roundtrip() {
        let mut doc = Document::new();
        doc.set_attr("name", json!("Alice"));
        doc.set_attr("age", json!(30));
        doc.set_attr("tags", json!(["a", "b"]));
        doc.set_attr("nested", json!({"x": 1.5, "y": null}));

        let bytes = encode(&doc).unwrap();
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded, doc);
    }

    #[test]
    fn decode_requires_id() {
        let bytes = br#"{"created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-01T00:00:00Z"}"#;
        let err = decode(bytes).unwrap_err();
        assert!(matches!(err, CodecError::MissingField { field } if field == "id"));
    }

    #[test]
    fn decode_requires_timestamps() {
        let id = EntityId::new();
        let bytes = format!(r#"{{"id":"{id}"}}"#);
        let err = decode(bytes.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::MissingField { field } if field == "created_at"));
    }

    #[test]
    fn decode_rejects_malformed_id() {
        let bytes =
            br#"{"id":"nope","created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-01T00:00:00Z"}"#;
        let err = decode(bytes).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { field, .. } if field == "id"));
    }

    #[test]
    fn decode_rejects_malformed_timestamp() {
        let id = EntityId::new();
        let bytes = format!(
            r#"{{"id":"{id}","created_at":"yesterday","updated_at":"2026-01-01T00:00:00Z"}}"#
        );
        let err = decode(bytes.as_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::InvalidField { field, .. } if field == "created_at"));
    }

    #[test]
    fn decode_rejects_non_object() {
        assert!(decode(b"[1,2,3]").is_err());
        assert!(decode(b"not json at all").is_err());
    }

    #[test]
    fn extra_fields_pass_through() {
        let id = EntityId::new();
        let bytes = format!(
            r#"{{"id":"{id}","created_at":"2026-01-01T00:00:00Z","updated_at":"2026-01-01T00:00:00Z","legacy_flag":true}}"#
        );

        let doc = decode(bytes.as_bytes()).unwrap();
        assert_eq!(doc.attr("legacy_flag"), Some(&json!(true)));

        // And they survive the next encode
        let reencoded = encode(&doc).unwrap();
        let again = decode(&reencoded).unwrap();
        assert_eq!(again.attr("legacy_flag"), Some(&json!(true)));
    }

    fn attr_value() -> impl Strategy<Value = serde_json::Value> {
        prop_oneof![
            Just(serde_json::Value::Null),
            any::<bool>().prop_map(serde_json::Value::from),
            any::<i64>().prop_map(serde_json::Value::from),
            "[a-zA-Z0-9 ]{0,24}".prop_map(serde_json::Value::from),
        ]
    }

    proptest! {
        #[test]
        fn roundtrip_preserves_arbitrary_attrs(
            attrs in proptest::collection::btree_map("[a-z_]{1,12}", attr_value(), 0..8)
        ) {
            let mut doc = Document::new();
            for (name, value) in attrs {
                doc.set_attr(name, value);
            }

            let bytes = encode(&doc).unwrap();
            let decoded = decode(&bytes).unwrap();
            prop_assert_eq!(decoded, doc);
        }
    }
}
