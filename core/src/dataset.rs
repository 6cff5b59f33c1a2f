use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a categorized dataset, fields kept in source order.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub category: String,
    pub data: Vec<Record>,
}

impl Dataset {
    pub fn new(category: impl Into<String>, data: Vec<Record>) -> Self {
        Self { category: category.into(), data }
    }
}

/// Flatten every field value of a record into the text the index tokenizes.
pub fn search_text(record: &Record) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(record.len());
    for value in record.values() {
        if let Some(text) = value_text(value) {
            parts.push(text);
        }
    }
    parts.join(" ")
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let joined = items.iter().filter_map(value_text).collect::<Vec<_>>().join(" ");
            if joined.is_empty() { None } else { Some(joined) }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

/// Accepts an array of objects or a single object; other shapes hold no records.
pub fn records_from_json(value: Value) -> Vec<Record> {
    match value {
        Value::Array(arr) => arr
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(obj) => Some(obj),
                _ => None,
            })
            .collect(),
        Value::Object(obj) => vec![obj],
        _ => Vec::new(),
    }
}

/// Parse CSV with a header row into string-valued records.
pub fn records_from_csv(text: &str) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (key, cell) in headers.iter().zip(row.iter()) {
            record.insert(key.to_string(), Value::String(cell.to_string()));
        }
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_text_flattens_values() {
        let record = json!({
            "name": "Primary Blue",
            "hex": "#1E90FF",
            "tags": ["brand", "cool"],
            "contrast": 4.5,
            "dark": false,
            "notes": null,
            "meta": {"role": "accent"}
        });
        let Value::Object(record) = record else { unreachable!() };
        assert_eq!(
            search_text(&record),
            r##"Primary Blue #1E90FF brand cool 4.5 false {"role":"accent"}"##
        );
    }

    #[test]
    fn json_keeps_only_objects() {
        let records = records_from_json(json!([{"a": 1}, 2, "x", {"b": 2}]));
        assert_eq!(records.len(), 2);
        assert!(records_from_json(json!("scalar")).is_empty());
        assert_eq!(records_from_json(json!({"a": 1})).len(), 1);
    }

    #[test]
    fn csv_uses_header_row() {
        let records = records_from_csv("name,hex\nPrimary Blue,#1E90FF\n\"Red, Warm\",#FF0000\nShort\n").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["hex"], "#1E90FF");
        assert_eq!(records[1]["name"], "Red, Warm");
        assert!(records[2].get("hex").is_none());
    }
}
