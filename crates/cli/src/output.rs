use crate::error::CliError;
use composer::{projection::Projection, unzip::unzip_group_concat};
use model::{core::value::Value, records::row::RowData};
use serde_json::{Map, Value as JsonValue, json};

fn value_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Int(v) => json!(v),
        Value::Uint(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::String(v) => json!(v),
        Value::Boolean(v) => json!(v),
        Value::Json(v) => v.clone(),
        Value::Bytes(v) => json!(String::from_utf8_lossy(v)),
        Value::Date(v) => json!(v.to_string()),
        Value::Timestamp(v) => json!(v.to_rfc3339()),
        Value::StringArray(v) => json!(v),
        Value::Null => JsonValue::Null,
    }
}

pub fn row_to_json(row: &RowData) -> JsonValue {
    let map: Map<String, JsonValue> = row
        .field_values
        .iter()
        .map(|f| {
            let value = f.value.as_ref().map(value_to_json).unwrap_or(JsonValue::Null);
            (f.name.clone(), value)
        })
        .collect();
    JsonValue::Object(map)
}

/// Rows as a JSON array. With an unzip map every row also carries the
/// expanded rows under `unzipped`.
pub fn rows_to_json(rows: &[RowData], unzip: &[(String, String)], separator: &str) -> JsonValue {
    let map: Vec<(&str, &str)> = unzip
        .iter()
        .map(|(attr, prop)| (attr.as_str(), prop.as_str()))
        .collect();

    let rows = rows
        .iter()
        .map(|row| {
            let mut json = row_to_json(row);
            if !map.is_empty()
                && let JsonValue::Object(obj) = &mut json
            {
                let children = unzip_group_concat(row, &map, separator)
                    .iter()
                    .map(row_to_json)
                    .collect();
                obj.insert("unzipped".to_string(), JsonValue::Array(children));
            }
            json
        })
        .collect();
    JsonValue::Array(rows)
}

pub fn projection_to_json(projection: &Projection) -> JsonValue {
    let map: Map<String, JsonValue> = projection
        .columns()
        .iter()
        .map(|c| (c.field.clone(), json!(c.column)))
        .collect();
    JsonValue::Object(map)
}

pub fn print_json(value: &JsonValue) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
