use crate::core::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_ID_FIELD: &str = "transactionId";
pub const DEFAULT_ENVELOPE: &str = "transaction";

/// Identity of a record, unique within one run's input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Integer(i64),
    Text(String),
}

impl RecordId {
    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Integer(n) => Value::from(*n),
            RecordId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Integer(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Integer(n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, data: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Builds a record from one raw input value.
    ///
    /// With an `envelope` the payload is the object stored under that key, and
    /// the identity is looked up inside it. Nothing else in the payload is
    /// inspected.
    ///
    /// A numeric identity must be a JSON integer that fits in an `i64`; larger
    /// values and floats such as `7.0` are rejected.
    pub fn from_value(value: Value, id_field: &str, envelope: Option<&str>) -> Result<Self> {
        let mut object = match value {
            Value::Object(obj) => obj,
            _ => {
                return Err(PipelineError::Schema(
                    "Record is not a JSON object".to_string(),
                ));
            }
        };

        let data = match envelope {
            Some(key) => match object.remove(key) {
                Some(Value::Object(inner)) => inner,
                Some(_) => {
                    return Err(PipelineError::Schema(format!(
                        "Envelope '{}' is not a JSON object",
                        key
                    )));
                }
                None => {
                    return Err(PipelineError::Schema(format!(
                        "Envelope '{}' is missing",
                        key
                    )));
                }
            },
            None => object,
        };

        let id = match data.get(id_field) {
            Some(Value::String(s)) => RecordId::Text(s.clone()),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(n) => RecordId::Integer(n),
                None => {
                    return Err(PipelineError::Schema(format!(
                        "Identity field '{}' is not an integer within i64 range: {}",
                        id_field, n
                    )));
                }
            },
            Some(_) => {
                return Err(PipelineError::Schema(format!(
                    "Identity field '{}' must be a string or an integer",
                    id_field
                )));
            }
            None => {
                return Err(PipelineError::Schema(format!(
                    "Required field '{}' is missing",
                    id_field
                )));
            }
        };

        Ok(Self { id, data })
    }

    /// The payload with the identity copied under `id_key`.
    pub fn document(&self, id_key: &str) -> Map<String, Value> {
        let mut doc = self.data.clone();
        doc.insert(id_key.to_string(), self.id.to_value());
        doc
    }
}
