use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::grid::{CellValue, FieldError, Row};

/// A row backed by a JSON object, for tables without a fixed schema.
///
/// Writes keep the JSON type a field already has: a numeric field only
/// accepts numbers, a boolean field only `true`/`false`. Text written to a
/// new or null field stays text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonRow(pub Map<String, Value>);

impl From<Map<String, Value>> for JsonRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl Row for JsonRow {
    fn get(&self, key: &str) -> Option<CellValue> {
        self.0.get(key).map(json_to_cell)
    }

    fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError> {
        let next = match self.0.get(key) {
            Some(Value::Number(_)) => match number_from(&value) {
                Some(n) => Value::Number(n),
                None => return Err(FieldError::invalid(key, value.to_string(), "expected a number")),
            },
            Some(Value::Bool(_)) => match bool_from(&value) {
                Some(b) => Value::Bool(b),
                None => return Err(FieldError::invalid(key, value.to_string(), "expected true or false")),
            },
            Some(Value::String(_)) => Value::String(value.to_string()),
            Some(Value::Array(_) | Value::Object(_)) => {
                serde_json::from_str(&value.to_string())
                    .map_err(|e| FieldError::invalid(key, value.to_string(), e.to_string()))?
            }
            Some(Value::Null) | None => cell_to_json(value),
        };
        self.0.insert(key.to_string(), next);
        Ok(())
    }

    /// A blank value of the JSON type each key first has among `existing`,
    /// so inserted rows match the file's shape.
    fn template(existing: &[Arc<Self>]) -> Self {
        let mut map = Map::new();
        for row in existing {
            for (key, value) in &row.0 {
                if map.contains_key(key) {
                    continue;
                }
                if let Some(blank) = blank_like(value) {
                    map.insert(key.clone(), blank);
                }
            }
        }
        Self(map)
    }
}

fn blank_like(value: &Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(Value::Bool(false)),
        Value::Number(_) => Some(Value::Number(0.into())),
        Value::String(_) => Some(Value::String(String::new())),
        Value::Array(_) => Some(Value::Array(Vec::new())),
        Value::Object(_) => Some(Value::Object(Map::new())),
    }
}

fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map_or(CellValue::Null, CellValue::Float),
        },
        Value::String(s) => CellValue::Text(s.clone()),
        nested => CellValue::Text(nested.to_string()),
    }
}

fn cell_to_json(value: CellValue) -> Value {
    match value {
        CellValue::Null => Value::Null,
        CellValue::Bool(b) => Value::Bool(b),
        CellValue::Int(i) => Value::Number(i.into()),
        CellValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        CellValue::Text(s) => Value::String(s),
    }
}

fn number_from(value: &CellValue) -> Option<Number> {
    if let Some(i) = value.as_i64() {
        return Some(i.into());
    }
    value.as_f64().and_then(Number::from_f64)
}

fn bool_from(value: &CellValue) -> Option<bool> {
    match value {
        CellValue::Bool(b) => Some(*b),
        other => match other.to_string().trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> JsonRow {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn get_maps_json_types() {
        let r = row(json!({"id": 1, "price": 19.5, "sold": false, "make": "Kia", "tags": ["a"]}));
        assert_eq!(r.get("id"), Some(CellValue::Int(1)));
        assert_eq!(r.get("price"), Some(CellValue::Float(19.5)));
        assert_eq!(r.get("sold"), Some(CellValue::Bool(false)));
        assert_eq!(r.get("make"), Some(CellValue::text("Kia")));
        assert_eq!(r.get("tags"), Some(CellValue::text("[\"a\"]")));
        assert_eq!(r.get("vin"), None);
        assert_eq!(r.id(), Some(1));
    }

    #[test]
    fn set_keeps_existing_field_type() {
        let mut r = row(json!({"year": 2020, "sold": false, "make": "Kia"}));
        r.set("year", "2021".into()).unwrap();
        r.set("sold", "TRUE".into()).unwrap();
        r.set("make", CellValue::Int(5)).unwrap();
        assert_eq!(r.0, json!({"year": 2021, "sold": true, "make": "5"}).as_object().cloned().unwrap());
        assert!(r.set("year", "soon".into()).is_err());
        assert!(r.set("sold", "maybe".into()).is_err());
        assert_eq!(r.get("year"), Some(CellValue::Int(2021)));
    }

    #[test]
    fn text_written_to_new_fields_stays_text() {
        let mut r = JsonRow::default();
        r.set("year", "2019".into()).unwrap();
        r.set("zip", "02139".into()).unwrap();
        r.set_id(3).unwrap();
        assert_eq!(serde_json::to_value(&r).unwrap(), json!({"year": "2019", "zip": "02139", "id": 3}));
    }

    #[test]
    fn template_copies_field_types_from_existing_rows() {
        let rows = vec![
            Arc::new(row(json!({"id": 1, "model": "Mustang", "zip": "02134", "note": null}))),
            Arc::new(row(json!({"id": 2, "note": "ok", "sold": true}))),
        ];
        let mut r = JsonRow::template(&rows);
        assert_eq!(
            r.0,
            json!({"id": 0, "model": "", "zip": "", "note": "", "sold": false})
                .as_object()
                .cloned()
                .unwrap()
        );
        r.set("model", "500".into()).unwrap();
        r.set("zip", "02139".into()).unwrap();
        r.set_id(3).unwrap();
        assert_eq!(r.0["model"], json!("500"));
        assert_eq!(r.0["zip"], json!("02139"));
        assert_eq!(r.0["id"], json!(3));
    }

    #[test]
    fn nested_fields_accept_json_text() {
        let mut r = row(json!({"tags": []}));
        r.set("tags", "[\"certified\"]".into()).unwrap();
        assert_eq!(r.0["tags"], json!(["certified"]));
        assert!(r.set("tags", "not json".into()).is_err());
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert_eq!(cell_to_json(CellValue::Float(f64::NAN)), Value::Null);
    }
}
