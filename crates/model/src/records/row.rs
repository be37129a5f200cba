use crate::core::value::{FieldValue, Value};
use serde::{Deserialize, Serialize};

/// A single result row: ordered named values tagged with the entity
/// (source or table) they were read for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str, field_values: Vec<FieldValue>) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .and_then(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    /// Sets `field`, replacing an existing value in place or appending.
    pub fn set(&mut self, field: &str, value: Value) {
        match self
            .field_values
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(field))
        {
            Some(existing) => existing.value = Some(value),
            None => self.field_values.push(FieldValue::new(field, value)),
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.field_values.iter().map(|f| f.name.as_str())
    }
}
