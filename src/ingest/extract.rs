//! Field extraction from a single raw record
//!
//! CSV rows are split honoring quoted fields (a comma inside a quoted
//! field doesn't start a new column) and `\`-prefixed escapes: a
//! backslash consumes the next byte literally, including a quote that
//! would otherwise close the field. JSON lines are parsed with
//! `serde_json` rather than scanning for delimiter characters by hand,
//! which is the only way to get object fields right in the presence of
//! nested braces, commas, or escaped quotes inside string values.

use crate::error::{Error, Result};

/// Split one CSV record into fields, respecting quoted fields and
/// `\`-escapes. Only the two bytes that are structurally significant to
/// CSV splitting (`"` and `,`) get escaped here; a backslash before
/// anything else (notably whitespace) is left untouched in the field
/// value for the tokenizer's own escape handling to interpret later —
/// otherwise an escaped space meant to keep one token together would be
/// silently consumed a layer too early.
pub fn split_csv_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.trim_end_matches(['\n', '\r']).chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('"') | Some(',')) => {
                current.push(chars.next().unwrap());
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Fetch `columns[col_idx]` from a CSV record, or an error naming the
/// header if `col_idx` is out of range.
pub fn csv_field<'a>(fields: &'a [String], col_idx: usize, header: &[String]) -> Result<&'a str> {
    fields
        .get(col_idx)
        .map(|s| s.as_str())
        .ok_or_else(|| Error::ColumnNotFound(format!("column index {col_idx}"), header.to_vec()))
}

/// Resolve a column name to its index in the header row.
pub fn find_column(header: &[String], name: &str) -> Result<usize> {
    header
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| Error::ColumnNotFound(name.to_string(), header.to_vec()))
}

/// Extract one field from a single NDJSON line by key. `offset` is only
/// used to locate a parse failure in the error message.
pub fn json_field(line: &str, key: &str, offset: u64) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| Error::MalformedJson(offset, e.to_string()))?;
    match value.get(key) {
        Some(serde_json::Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(Error::ColumnNotFound(
            key.to_string(),
            value
                .as_object()
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default(),
        )),
    }
}

/// Parse a full NDJSON line into an ordered field list, used when
/// reconstructing a row for the result set.
pub fn json_record(line: &str) -> Result<Vec<(String, serde_json::Value)>> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    let obj = value
        .as_object()
        .ok_or_else(|| Error::MalformedJson(0, "expected a JSON object per line".into()))?;
    Ok(obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_csv_record() {
        assert_eq!(split_csv_record("a,b,c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn honors_quoted_commas() {
        assert_eq!(
            split_csv_record(r#"a,"b, still b",c"#),
            vec!["a", "b, still b", "c"]
        );
    }

    #[test]
    fn backslash_escapes_a_closing_quote() {
        // HELLO \"WORLD\" inside a quoted field: the escaped quotes stay
        // part of the value instead of ending the quoted field early.
        assert_eq!(
            split_csv_record(r#"1,"HELLO \"WORLD\"""#),
            vec!["1", "HELLO \"WORLD\""]
        );
    }

    #[test]
    fn backslash_escapes_a_comma_outside_quotes() {
        assert_eq!(split_csv_record(r"a\,b,c"), vec!["a,b", "c"]);
    }

    #[test]
    fn strips_trailing_newline() {
        assert_eq!(split_csv_record("a,b\n"), vec!["a", "b"]);
    }

    #[test]
    fn json_field_reads_a_string_value() {
        let line = r#"{"title": "hello world", "id": 1}"#;
        assert_eq!(json_field(line, "title", 0).unwrap(), "hello world");
    }

    #[test]
    fn json_field_missing_key_errors() {
        let line = r#"{"title": "hello"}"#;
        assert!(json_field(line, "missing", 0).is_err());
    }

    #[test]
    fn json_record_round_trips_all_fields() {
        let line = r#"{"a": 1, "b": "two"}"#;
        let fields = json_record(line).unwrap();
        assert_eq!(fields.len(), 2);
    }
}
