//! Conversion between typed protocol values and store documents.
//!
//! The store speaks [`Document`] (a JSON object). Everything above it
//! speaks typed structs. These two functions are the only place where
//! one becomes the other, so every encoding failure surfaces as a
//! [`ProtocolError`].

use duelroom_store::Document;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::ProtocolError;

/// Serializes `value` into a store document.
///
/// # Errors
/// - [`ProtocolError::Encode`] if serialization fails
/// - [`ProtocolError::NotAnObject`] if the value isn't a struct/map
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, ProtocolError> {
    match serde_json::to_value(value).map_err(ProtocolError::Encode)? {
        Value::Object(map) => Ok(map),
        _ => Err(ProtocolError::NotAnObject),
    }
}

/// Deserializes a store document into `T`.
///
/// # Errors
/// [`ProtocolError::Decode`] if the document doesn't match `T`.
pub fn from_document<T: DeserializeOwned>(
    document: Document,
) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::Object(document)).map_err(ProtocolError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_to_document_struct_produces_object() {
        let doc = to_document(&Sample { name: "a".into(), count: 2 }).unwrap();
        assert_eq!(doc["name"], "a");
        assert_eq!(doc["count"], 2);
    }

    #[test]
    fn test_to_document_scalar_returns_not_an_object() {
        let result = to_document(&42u32);
        assert!(matches!(result, Err(ProtocolError::NotAnObject)));
    }

    #[test]
    fn test_from_document_wrong_shape_returns_decode_error() {
        let mut doc = Document::new();
        doc.insert("name".into(), 5.into());
        let result: Result<Sample, _> = from_document(doc);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
