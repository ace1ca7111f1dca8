use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::{EngineError, EngineResult};
use crate::schema::EntityDef;
use crate::storage::Record;

/// A record type the engine can serve.
///
/// The type (de)serializes to the stored row: `id`, timestamps, its
/// declared fields and any included relations under their relation names.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Schema of this entity. Called once per service.
    fn definition() -> EntityDef;
}

/// Turns a stored row into `E`
pub fn decode<E: Entity>(record: Record) -> EngineResult<E> {
    serde_json::from_value(record.into_value()).map_err(|e| EngineError::Decode(e.to_string()))
}

/// Serializes any input struct into the untyped shape the pipeline merges
pub fn to_input<T: Serialize>(input: &T) -> EngineResult<Map<String, Value>> {
    match serde_json::to_value(input) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(EngineError::InvalidQuery(format!(
            "input must be an object, got {}",
            other
        ))),
        Err(e) => Err(EngineError::InvalidQuery(e.to_string())),
    }
}
