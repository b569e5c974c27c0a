//! Opaque pagination cursors: base64 of a small JSON value.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::error::RequestValidationError;

/// Encode any JSON value as a cursor.
pub fn encode(value: &serde_json::Value) -> String {
    STANDARD.encode(value.to_string())
}

pub fn decode(cursor: &str) -> Result<serde_json::Value, RequestValidationError> {
    let malformed = || RequestValidationError::MalformedCursor(cursor.to_string());
    let bytes = STANDARD.decode(cursor).map_err(|_| malformed())?;
    serde_json::from_slice(&bytes).map_err(|_| malformed())
}

/// The cursor of the row at `offset`.
pub fn encode_offset(offset: u64) -> String {
    encode(&serde_json::Value::from(offset))
}

pub fn decode_offset(cursor: &str) -> Result<u64, RequestValidationError> {
    decode(cursor)?
        .as_u64()
        .ok_or_else(|| RequestValidationError::MalformedCursor(cursor.to_string()))
}

/// Decode a keyset cursor, which must hold exactly the sort key columns.
pub fn decode_sort_key(
    cursor: &str,
    columns: &[&str],
) -> Result<serde_json::Map<String, serde_json::Value>, RequestValidationError> {
    let serde_json::Value::Object(values) = decode(cursor)? else {
        return Err(RequestValidationError::MalformedCursor(cursor.to_string()));
    };
    if let Some(extra) = values.keys().find(|key| !columns.contains(&key.as_str())) {
        return Err(RequestValidationError::CursorKeyNotInSortKey(extra.clone()));
    }
    if let Some(missing) = columns.iter().find(|column| !values.contains_key(**column)) {
        return Err(RequestValidationError::CursorMissingKey((*missing).to_string()));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sort_key_cursors_round_trip() {
        let cursor = encode(&json!({"id": 5}));
        assert_eq!(cursor, "eyJpZCI6NX0=");
        assert_eq!(
            decode_sort_key(&cursor, &["id"]).unwrap(),
            json!({"id": 5}).as_object().unwrap().clone()
        );
    }

    #[test]
    fn offset_cursors_round_trip() {
        assert_eq!(decode_offset(&encode_offset(4)).unwrap(), 4);
    }

    #[test]
    fn cursors_must_match_the_sort_key() {
        let cursor = encode(&json!({"id": 5, "created_at": "2020-01-01"}));
        assert_eq!(
            decode_sort_key(&cursor, &["id"]),
            Err(RequestValidationError::CursorKeyNotInSortKey(
                "created_at".to_string()
            ))
        );
        assert_eq!(
            decode_sort_key(&encode(&json!({"id": 5})), &["created_at", "id"]),
            Err(RequestValidationError::CursorMissingKey(
                "created_at".to_string()
            ))
        );
        assert_eq!(
            decode_offset("not a cursor"),
            Err(RequestValidationError::MalformedCursor(
                "not a cursor".to_string()
            ))
        );
    }
}
