//! Shared fixtures: GA4-style schemas and real Avro container files.

#![allow(dead_code)]

use apache_avro::types::Value;
use apache_avro::{Schema, Writer};
use std::path::{Path, PathBuf};

pub const EVENTS_SCHEMA: &str = r#"{
    "type": "record",
    "name": "Root",
    "fields": [
        {"name": "event_date", "type": ["null", "string"]},
        {"name": "event_timestamp", "type": ["null", "long"]},
        {"name": "event_name", "type": ["null", "string"]},
        {"name": "event_params", "type": {"type": "array", "items": {
            "type": "record",
            "name": "event_params",
            "fields": [
                {"name": "key", "type": ["null", "string"]},
                {"name": "value", "type": ["null", {
                    "type": "record",
                    "name": "value",
                    "fields": [
                        {"name": "string_value", "type": ["null", "string"]},
                        {"name": "int_value", "type": ["null", "long"]}
                    ]
                }]}
            ]
        }}},
        {"name": "user_pseudo_id", "type": ["null", "string"]}
    ]
}"#;

pub fn some(value: Value) -> Value {
    Value::Union(1, Box::new(value))
}

pub fn none() -> Value {
    Value::Union(0, Box::new(Value::Null))
}

pub fn string(s: &str) -> Value {
    some(Value::String(s.to_string()))
}

/// One `event_params` element.
pub fn param(key: &str, string_value: Option<&str>, int_value: Option<i64>) -> Value {
    Value::Record(vec![
        ("key".to_string(), string(key)),
        (
            "value".to_string(),
            some(Value::Record(vec![
                (
                    "string_value".to_string(),
                    string_value.map(string).unwrap_or_else(none),
                ),
                (
                    "int_value".to_string(),
                    int_value.map(|v| some(Value::Long(v))).unwrap_or_else(none),
                ),
            ])),
        ),
    ])
}

pub fn event(date: &str, timestamp_micros: i64, name: &str, params: Vec<Value>) -> Value {
    Value::Record(vec![
        ("event_date".to_string(), string(date)),
        (
            "event_timestamp".to_string(),
            some(Value::Long(timestamp_micros)),
        ),
        ("event_name".to_string(), string(name)),
        ("event_params".to_string(), Value::Array(params)),
        ("user_pseudo_id".to_string(), string("1234.5678")),
    ])
}

/// Write a container file with `apache_avro::Writer`.
pub fn write_avro(path: &Path, schema: &str, records: Vec<Value>) {
    let schema = Schema::parse_str(schema).unwrap();
    let mut writer = Writer::new(&schema, Vec::new());
    for record in records {
        writer.append(record).unwrap();
    }
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, writer.into_inner().unwrap()).unwrap();
}

/// `<avro_home>/<yyyymm>/events_<date>.avro`
pub fn daily_file(avro_home: &Path, date: &str) -> PathBuf {
    avro_home
        .join(&date[..6])
        .join(format!("events_{}.avro", date))
}

/// All files below `dir`, relative to it, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(root, &path, out);
            } else {
                out.push(
                    path.strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/"),
                );
            }
        }
    }
    let mut files = Vec::new();
    walk(dir, dir, &mut files);
    files.sort();
    files
}
