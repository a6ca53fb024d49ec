//! CSV column contract for email imports.
//!
//! Uploaded files are expected to carry `sender, subject, body, sent_date`
//! columns. Common aliases are accepted; matching is case-insensitive and
//! ignores surrounding whitespace.

use serde::{Deserialize, Serialize};

use crate::error::UploadError;

const SENDER_ALIASES: &[&str] = &["sender", "from", "email", "sender_mail", "from_email"];
const SUBJECT_ALIASES: &[&str] = &["subject", "email_subject", "title"];
const BODY_ALIASES: &[&str] = &["body", "email_body", "content", "message", "text"];
const DATE_ALIASES: &[&str] = &["sent_date", "date", "timestamp", "sent_time", "created_at"];

/// Logical email field a CSV column can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Sender,
    Subject,
    Body,
    SentDate,
}

impl Field {
    /// Canonical column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Sender => "sender",
            Field::Subject => "subject",
            Field::Body => "body",
            Field::SentDate => "sent_date",
        }
    }

    /// Resolve a raw header to a field, if it is a known alias.
    pub fn from_header(header: &str) -> Option<Field> {
        let normalized = header.trim().to_lowercase();
        let name = normalized.as_str();
        if SENDER_ALIASES.contains(&name) {
            Some(Field::Sender)
        } else if SUBJECT_ALIASES.contains(&name) {
            Some(Field::Subject)
        } else if BODY_ALIASES.contains(&name) {
            Some(Field::Body)
        } else if DATE_ALIASES.contains(&name) {
            Some(Field::SentDate)
        } else {
            None
        }
    }
}

/// Mapping from logical fields to the header names found in a file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_date: Option<String>,
}

impl ColumnMapping {
    /// Build a mapping from a header row. Later duplicates win.
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let mut mapping = Self::default();
        for header in headers {
            let raw = header.as_ref();
            let slot = match Field::from_header(raw) {
                Some(Field::Sender) => &mut mapping.sender,
                Some(Field::Subject) => &mut mapping.subject,
                Some(Field::Body) => &mut mapping.body,
                Some(Field::SentDate) => &mut mapping.sent_date,
                None => continue,
            };
            *slot = Some(raw.to_string());
        }
        mapping
    }

    /// Parse the header line of a CSV file and build a mapping.
    ///
    /// Handles double-quoted header cells; a header row never needs more.
    pub fn from_header_line(line: &str) -> Self {
        let headers = split_header_line(line.trim_start_matches('\u{feff}'));
        Self::from_headers(headers.as_slice())
    }

    /// Required fields that have no column.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.sender.is_none() {
            missing.push(Field::Sender.as_str());
        }
        if self.subject.is_none() {
            missing.push(Field::Subject.as_str());
        }
        if self.body.is_none() {
            missing.push(Field::Body.as_str());
        }
        missing
    }

    /// Fail with MISSING_COLUMNS unless sender, subject and body are mapped.
    pub fn require(self) -> Result<Self, UploadError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(self)
        } else {
            Err(UploadError::missing_columns(&missing))
        }
    }

    /// Header name mapped to a field.
    pub fn column(&self, field: Field) -> Option<&str> {
        match field {
            Field::Sender => self.sender.as_deref(),
            Field::Subject => self.subject.as_deref(),
            Field::Body => self.body.as_deref(),
            Field::SentDate => self.sent_date.as_deref(),
        }
    }
}

fn split_header_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.trim_end_matches(['\r', '\n']).chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_canonical_headers() {
        let mapping = ColumnMapping::from_headers(&["sender", "subject", "body", "sent_date"]);
        assert_eq!(mapping.sender.as_deref(), Some("sender"));
        assert_eq!(mapping.sent_date.as_deref(), Some("sent_date"));
        assert!(mapping.missing().is_empty());
    }

    #[test]
    fn test_aliases_keep_original_spelling() {
        let mapping = ColumnMapping::from_headers(&[" From ", "Title", "Message", "Timestamp"]);
        assert_eq!(mapping.column(Field::Sender), Some(" From "));
        assert_eq!(mapping.column(Field::Subject), Some("Title"));
        assert_eq!(mapping.column(Field::Body), Some("Message"));
        assert_eq!(mapping.column(Field::SentDate), Some("Timestamp"));
    }

    #[test]
    fn test_date_is_optional() {
        let mapping = ColumnMapping::from_headers(&["email", "subject", "content"]);
        assert!(mapping.require().is_ok());
    }

    #[test]
    fn test_require_reports_missing() {
        let err = ColumnMapping::from_headers(&["sender", "notes"])
            .require()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingColumns);
        let data = err.data.unwrap();
        assert_eq!(data["missing"], serde_json::json!(["subject", "body"]));
    }

    #[test]
    fn test_header_line_with_quotes_and_bom() {
        let mapping =
            ColumnMapping::from_header_line("\u{feff}\"sender\",\"subject, line\",body,\"sent_date\"\r\n");
        assert_eq!(mapping.sender.as_deref(), Some("sender"));
        assert_eq!(mapping.subject, None);
        assert_eq!(mapping.body.as_deref(), Some("body"));
        assert_eq!(mapping.sent_date.as_deref(), Some("sent_date"));
    }
}
