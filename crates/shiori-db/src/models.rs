use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::{DbError, Result};

/// A stored document. `data` is the JSON body without the `id` key.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub collection: String,
    pub id: String,
    pub data: Map<String, Value>,
    pub version: i64,
    pub created_at: String,
}

impl DocumentRow {
    /// Deserialize the body, with the document key filled in as `id`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

/// Serialize a record into a document body. The `id` key is dropped since
/// the document key carries it.
pub fn encode_body<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    let mut data = match serde_json::to_value(value)? {
        Value::Object(map) => map,
        _ => {
            return Err(DbError::Decode(<serde_json::Error as serde::ser::Error>::custom(
                "document body must be a JSON object",
            )));
        }
    };
    data.remove("id");
    Ok(data)
}
