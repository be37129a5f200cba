use model::{
    core::value::{FieldValue, Value},
    records::row::RowData,
};

/// Expands list-aggregated columns of one row into one row per position.
///
/// `map` pairs a row attribute with the output property it feeds. Tokens of
/// attributes sharing a property are appended in map order. Every output row
/// holds every property; shorter token lists are padded with `Null`. String
/// values are split on `separator`, list and JSON array values expand per item.
pub fn unzip_group_concat(row: &RowData, map: &[(&str, &str)], separator: &str) -> Vec<RowData> {
    let mut accumulators: Vec<(&str, Vec<Value>)> = Vec::new();

    for &(attribute, property) in map {
        let pos = match accumulators.iter().position(|(p, _)| *p == property) {
            Some(pos) => pos,
            None => {
                accumulators.push((property, Vec::new()));
                accumulators.len() - 1
            }
        };

        let value = row.get_value(attribute);
        accumulators[pos].1.extend(tokens(value, separator));
    }

    let longest = accumulators
        .iter()
        .map(|(_, values)| values.len())
        .max()
        .unwrap_or(0);

    (0..longest)
        .map(|i| {
            let field_values = accumulators
                .iter()
                .map(|(property, values)| {
                    FieldValue::new(property, values.get(i).cloned().unwrap_or(Value::Null))
                })
                .collect();
            RowData::new(&row.entity, field_values)
        })
        .collect()
}

fn tokens(value: Value, separator: &str) -> Vec<Value> {
    match value {
        Value::Null | Value::Json(serde_json::Value::Null) => Vec::new(),
        Value::String(s) | Value::Json(serde_json::Value::String(s)) => split(s, separator),
        Value::StringArray(items) => items.into_iter().map(Value::String).collect(),
        Value::Json(serde_json::Value::Array(items)) => items.into_iter().map(from_json).collect(),
        other => vec![other],
    }
}

fn split(s: String, separator: &str) -> Vec<Value> {
    if s.is_empty() {
        Vec::new()
    } else if separator.is_empty() {
        vec![Value::String(s)]
    } else {
        s.split(separator)
            .map(|token| Value::String(token.to_string()))
            .collect()
    }
}

fn from_json(item: serde_json::Value) -> Value {
    match item {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::Int(v)
            } else if let Some(v) = n.as_u64() {
                Value::Uint(v)
            } else {
                n.as_f64().map_or(Value::Null, Value::Float)
            }
        }
        other => Value::Json(other),
    }
}

#[cfg(test)]
mod tests {
    use super::unzip_group_concat;
    use serde_json::json;
    use model::{
        core::value::{FieldValue, Value},
        records::row::RowData,
    };

    fn row(fields: &[(&str, Value)]) -> RowData {
        RowData::new(
            "users",
            fields
                .iter()
                .map(|(name, value)| FieldValue::new(name, value.clone()))
                .collect(),
        )
    }

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    const MAP: &[(&str, &str)] = &[("user_ids", "id"), ("user_emails", "email")];

    #[test]
    fn test_equal_lengths() {
        let input = row(&[("user_ids", s("1,2")), ("user_emails", s("a@x,b@x"))]);
        let rows = unzip_group_concat(&input, MAP, ",");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_value("id"), s("1"));
        assert_eq!(rows[0].get_value("email"), s("a@x"));
        assert_eq!(rows[1].get_value("id"), s("2"));
        assert_eq!(rows[1].get_value("email"), s("b@x"));
        assert_eq!(rows[1].entity, "users");
    }

    #[test]
    fn test_shorter_lists_pad_with_null() {
        let input = row(&[("user_ids", s("1,2,3")), ("user_emails", s("a@x"))]);
        let rows = unzip_group_concat(&input, MAP, ",");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get_value("email"), s("a@x"));
        assert_eq!(rows[1].get_value("email"), Value::Null);
        assert!(rows[2].get("email").is_some());
        assert_eq!(rows[2].get_value("email"), Value::Null);
    }

    #[test]
    fn test_empty_and_absent_attributes() {
        let input = row(&[("user_ids", s("")), ("other", s("x"))]);
        assert!(unzip_group_concat(&input, MAP, ",").is_empty());

        let input = row(&[("user_ids", s("7")), ("user_emails", Value::Null)]);
        let rows = unzip_group_concat(&input, MAP, ",");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].field_names().collect::<Vec<_>>(), vec!["id", "email"]);
    }

    #[test]
    fn test_shared_property_appends_in_map_order() {
        let input = row(&[
            ("buyer_ids", s("1,2")),
            ("seller_ids", Value::StringArray(vec!["9".to_string()])),
        ]);
        let map = [("buyer_ids", "id"), ("seller_ids", "id")];
        let rows = unzip_group_concat(&input, &map, ",");

        let ids: Vec<Value> = rows.iter().map(|r| r.get_value("id")).collect();
        assert_eq!(ids, vec![s("1"), s("2"), s("9")]);
    }

    #[test]
    fn test_scalar_and_custom_separator() {
        let input = row(&[("user_ids", Value::Int(5)), ("user_emails", s("a@x|b@x"))]);
        let rows = unzip_group_concat(&input, MAP, "|");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_value("id"), Value::Int(5));
        assert_eq!(rows[1].get_value("id"), Value::Null);
        assert_eq!(rows[1].get_value("email"), s("b@x"));
    }

    #[test]
    fn test_json_arrays_expand_per_element() {
        let input = row(&[
            ("user_ids", Value::Json(json!([1, 2, 3]))),
            ("user_emails", Value::Json(json!(null))),
        ]);
        let rows = unzip_group_concat(&input, MAP, ",");

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get_value("id"), Value::Int(1));
        assert_eq!(rows[2].get_value("id"), Value::Int(3));
        assert!(rows.iter().all(|r| r.get_value("email") == Value::Null));
    }

    #[test]
    fn test_json_null_alone_yields_no_rows() {
        let input = row(&[("user_ids", Value::Json(json!(null)))]);
        assert!(unzip_group_concat(&input, MAP, ",").is_empty());
    }

    #[test]
    fn test_json_string_splits_and_mixed_array() {
        let input = row(&[
            ("user_ids", Value::Json(json!("4,5"))),
            ("user_emails", Value::Json(json!(["a@x", null]))),
        ]);
        let rows = unzip_group_concat(&input, MAP, ",");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_value("id"), s("4"));
        assert_eq!(rows[1].get_value("id"), s("5"));
        assert_eq!(rows[0].get_value("email"), s("a@x"));
        assert_eq!(rows[1].get_value("email"), Value::Null);
    }

    #[test]
    fn test_zero_is_a_real_token() {
        let input = row(&[("user_ids", s("0")), ("user_emails", Value::Int(0))]);
        let rows = unzip_group_concat(&input, MAP, ",");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_value("id"), s("0"));
        assert_eq!(rows[0].get_value("email"), Value::Int(0));
    }
}
