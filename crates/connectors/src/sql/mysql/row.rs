use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};
use mysql_async::{Row as MySqlRow, Value as MySqlValue, consts::ColumnType};
use tracing::warn;

/// Converts a driver row into a `RowData`, keeping the column order of the
/// result set. The entity name is left for the caller to fill in.
pub fn to_row_data(row: &MySqlRow, entity: &str) -> RowData {
    let field_values = row
        .columns_ref()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let name = column.name_str().into_owned();
            let value = row
                .as_ref(idx)
                .map(|raw| convert_value(raw, column.column_type(), &name));
            FieldValue { name, value }
        })
        .collect();

    RowData::new(entity, field_values)
}

fn convert_value(raw: &MySqlValue, column_type: ColumnType, name: &str) -> Value {
    match raw {
        MySqlValue::NULL => Value::Null,
        MySqlValue::Int(i) => Value::Int(*i),
        MySqlValue::UInt(u) => Value::Uint(*u),
        MySqlValue::Float(f) => Value::Float(*f as f64),
        MySqlValue::Double(d) => Value::Float(*d),
        MySqlValue::Bytes(bytes) => convert_bytes(bytes, column_type, name),
        MySqlValue::Date(year, month, day, hour, minute, second, micros) => {
            let date = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32);
            match (column_type, date) {
                (ColumnType::MYSQL_TYPE_DATE, Some(date)) => Value::Date(date),
                (_, Some(date)) => NaiveTime::from_hms_micro_opt(
                    *hour as u32,
                    *minute as u32,
                    *second as u32,
                    *micros,
                )
                .map(|time| NaiveDateTime::new(date, time).and_utc())
                .map(Value::Timestamp)
                .unwrap_or(Value::Null),
                // zero dates like 0000-00-00
                (_, None) => Value::Null,
            }
        }
        MySqlValue::Time(negative, days, hours, minutes, seconds, _) => {
            let hours = *days * 24 + *hours as u32;
            let sign = if *negative { "-" } else { "" };
            Value::String(format!("{sign}{hours:02}:{minutes:02}:{seconds:02}"))
        }
    }
}

fn convert_bytes(bytes: &[u8], column_type: ColumnType, name: &str) -> Value {
    if column_type == ColumnType::MYSQL_TYPE_JSON {
        match serde_json::from_slice(bytes) {
            Ok(json) => return Value::Json(json),
            Err(err) => warn!("Column `{}` holds invalid JSON: {}", name, err),
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => Value::String(s.to_string()),
        Err(_) => Value::Bytes(bytes.to_vec()),
    }
}
