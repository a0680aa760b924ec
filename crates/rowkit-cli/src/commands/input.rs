//! Reading input records and host items.

use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde_json::Value;

use rowkit_core::Record;

/// Read the raw text of `path`, or stdin when it is `-`.
pub fn read_source(path: &str) -> Result<String> {
    if path == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read {}", path))
    }
}

/// Parse a JSON array, or JSON lines when the text is not one array.
pub fn parse_many<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON array");
    }

    trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", index + 1))
        })
        .collect()
}

/// Input records for a row command.
///
/// Without `--input` the command runs once with an empty record.
pub fn input_records(source: Option<&str>) -> Result<Vec<Record>> {
    let Some(source) = source else {
        return Ok(vec![Record::new()]);
    };

    let values: Vec<Value> = parse_many(&read_source(source)?)?;
    values
        .into_iter()
        .enumerate()
        .map(|(index, value)| match value {
            Value::Object(record) => Ok(record),
            other => bail!("Input item {} is not a JSON object: {}", index + 1, other),
        })
        .collect()
}

/// Parse `name=value`; the value is JSON when it parses, a string otherwise.
pub fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_array_and_lines() {
        let array: Vec<Value> = parse_many(r#"[{"a": 1}, {"a": 2}]"#).unwrap();
        let lines: Vec<Value> = parse_many("{\"a\": 1}\n\n{\"a\": 2}\n").unwrap();
        assert_eq!(array, lines);
        assert_eq!(array.len(), 2);
    }

    #[test]
    fn reports_bad_line() {
        let err = parse_many::<Value>("{\"a\": 1}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn default_input_is_one_empty_record() {
        assert_eq!(input_records(None).unwrap(), vec![Record::new()]);
    }

    #[test]
    fn assignment_values() {
        assert_eq!(parse_assignment("Age=36").unwrap(), ("Age".to_string(), json!(36)));
        assert_eq!(
            parse_assignment("Name=Ada Lovelace").unwrap(),
            ("Name".to_string(), json!("Ada Lovelace"))
        );
        assert_eq!(parse_assignment("Note=").unwrap().1, json!(""));
        assert!(parse_assignment("=1").is_err());
        assert!(parse_assignment("Name").is_err());
    }
}
