//! Google Visualization query response types.
//!
//! A published sheet queried through `/gviz/tq` answers with JavaScript:
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"version":"0.6","status":"ok","table":{...}});
//! ```
//!
//! The callback wrapper is stripped and the JSON inside is parsed here.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::credential::CredentialRecord;
use crate::api::SourceError;

/// Callback name that precedes the JSON body
const CALLBACK_MARKER: &str = "setResponse(";

/// Column positions: the form timestamp sits in column 0 and is ignored.
const USERNAME_HASH_COLUMN: usize = 1;
const PASSWORD_HASH_COLUMN: usize = 2;
const ROLE_COLUMN: usize = 3;

#[derive(Debug, Deserialize)]
pub struct GvizResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub errors: Vec<GvizMessage>,
    #[serde(default)]
    pub table: Option<GvizTable>,
}

#[derive(Debug, Deserialize)]
pub struct GvizMessage {
    pub reason: Option<String>,
    pub message: Option<String>,
    pub detailed_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GvizTable {
    #[serde(default)]
    pub rows: Vec<GvizRow>,
}

#[derive(Debug, Deserialize)]
pub struct GvizRow {
    #[serde(default)]
    pub c: Vec<Option<GvizCell>>,
}

#[derive(Debug, Deserialize)]
pub struct GvizCell {
    #[serde(default)]
    pub v: Value,
    #[serde(default)]
    pub f: Option<String>,
}

impl GvizCell {
    /// Cell content as trimmed text, `None` when blank.
    fn text(&self) -> Option<String> {
        let raw = match &self.v {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => self.f.clone()?,
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

impl GvizRow {
    fn cell_text(&self, index: usize) -> Option<String> {
        self.c.get(index).and_then(|cell| cell.as_ref()).and_then(GvizCell::text)
    }
}

impl GvizMessage {
    fn describe(&self) -> String {
        self.detailed_message
            .clone()
            .or_else(|| self.message.clone())
            .or_else(|| self.reason.clone())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

/// Locate the JSON body inside the callback wrapper.
fn strip_envelope(text: &str) -> Option<&str> {
    if let Some(idx) = text.find(CALLBACK_MARKER) {
        let start = idx + CALLBACK_MARKER.len();
        if let Some(end) = text.rfind(')') {
            if end > start {
                return Some(text[start..end].trim());
            }
        }
    }

    // Bare JSON, or a wrapper we don't recognise: take the outermost object
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

impl GvizResponse {
    /// Parse a raw response body, wrapper included.
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        let body = strip_envelope(text).ok_or_else(|| {
            SourceError::InvalidResponse("No JSON body found in sheet response".to_string())
        })?;

        serde_json::from_str(body)
            .map_err(|e| SourceError::InvalidResponse(format!("Failed to parse sheet JSON: {}", e)))
    }

    /// Convert the table rows into credential records, in sheet order.
    pub fn into_records(self) -> Result<Vec<CredentialRecord>, SourceError> {
        if self.status.as_deref() == Some("error") {
            let messages: Vec<String> = self.errors.iter().map(GvizMessage::describe).collect();
            return Err(SourceError::Query(if messages.is_empty() {
                "unknown error".to_string()
            } else {
                messages.join("; ")
            }));
        }

        let table = self.table.ok_or_else(|| {
            SourceError::InvalidResponse("Sheet response has no table".to_string())
        })?;

        let mut records = Vec::with_capacity(table.rows.len());
        for (index, row) in table.rows.iter().enumerate() {
            let username_hash = row.cell_text(USERNAME_HASH_COLUMN);
            let password_hash = row.cell_text(PASSWORD_HASH_COLUMN);

            match (username_hash, password_hash) {
                (Some(user), Some(pass)) => {
                    let role = row.cell_text(ROLE_COLUMN).unwrap_or_default();
                    records.push(CredentialRecord::new(user, pass, role));
                }
                _ => {
                    debug!(row = index, "Skipping sheet row without both hashes");
                }
            }
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"/*O_o*/
google.visualization.Query.setResponse({"version":"0.6","reqId":"0","status":"ok","sig":"1234","table":{"cols":[{"id":"A","label":"Timestamp","type":"datetime","pattern":"M/d/yyyy H:mm:ss"},{"id":"B","label":"User","type":"string"},{"id":"C","label":"Pass","type":"string"},{"id":"D","label":"Role","type":"string"}],"rows":[{"c":[{"v":"Date(2024,0,5,10,3,12)","f":"1/5/2024 10:03:12"},{"v":"AAAA"},{"v":"bbbb"},{"v":"admin"}]},{"c":[null,{"v":"cccc"},{"v":"dddd"},null]},{"c":[{"v":"Date(2024,0,6,9,0,0)"},{"v":"eeee"},null,{"v":"user"}]},{"c":[{"v":"Date(2024,0,7,9,0,0)"},{"v":"ffff"}]}],"parsedNumHeaders":1}});"#;

    #[test]
    fn test_strip_envelope() {
        assert_eq!(
            strip_envelope("/*O_o*/\ngoogle.visualization.Query.setResponse({\"a\":1});"),
            Some("{\"a\":1}")
        );
        assert_eq!(strip_envelope("{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(strip_envelope("callback({\"a\":1})"), Some("{\"a\":1}"));
        assert_eq!(strip_envelope("<html>not a sheet</html>"), None);
    }

    #[test]
    fn test_strip_envelope_unterminated_callback() {
        // Callback never closed: fall back to the outermost object
        assert_eq!(
            strip_envelope("google.visualization.Query.setResponse({\"a\":1}"),
            Some("{\"a\":1}")
        );
        assert_eq!(strip_envelope("setResponse("), None);
    }

    #[test]
    fn test_parse_sample_rows() {
        let records = GvizResponse::parse(SAMPLE)
            .expect("Failed to parse sample response")
            .into_records()
            .expect("Sample should contain a table");

        // Rows 3 and 4 lack a password hash and are skipped
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], CredentialRecord::new("aaaa", "bbbb", "admin"));
        assert_eq!(records[1].username_hash, "cccc");
        assert_eq!(records[1].role, "user"); // Blank role defaults
    }

    #[test]
    fn test_numeric_cells_are_text() {
        let json = r#"{"status":"ok","table":{"rows":[{"c":[null,{"v":1234},{"v":5678.5},{"v":"x"}]}]}}"#;
        let records = GvizResponse::parse(json).unwrap().into_records().unwrap();
        assert_eq!(records[0].username_hash, "1234");
        assert_eq!(records[0].password_hash, "5678.5");
    }

    #[test]
    fn test_error_status() {
        let text = r#"google.visualization.Query.setResponse({"version":"0.6","status":"error","errors":[{"reason":"invalid_query","message":"INVALID_QUERY","detailed_message":"Invalid query: NO_COLUMN: Z"}]});"#;
        let err = GvizResponse::parse(text).unwrap().into_records().unwrap_err();
        match err {
            SourceError::Query(msg) => assert!(msg.contains("NO_COLUMN")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_table() {
        let err = GvizResponse::parse(r#"{"status":"ok"}"#)
            .unwrap()
            .into_records()
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidResponse(_)));
    }

    #[test]
    fn test_unparsable_body() {
        assert!(matches!(
            GvizResponse::parse("setResponse({not json});"),
            Err(SourceError::InvalidResponse(_))
        ));
        assert!(matches!(
            GvizResponse::parse(""),
            Err(SourceError::InvalidResponse(_))
        ));
    }
}
