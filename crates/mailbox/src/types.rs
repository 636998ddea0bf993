use crate::date::EventDate;
use serde::{Deserialize, Serialize};

/// Message headers in first-seen order.
///
/// Names are lower-cased on insert. A repeated header keeps its original
/// position but takes the value of the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a header, replacing the value of an existing header with the same name
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = name.trim().to_lowercase();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Append a folded continuation line to the most recent header
    pub(crate) fn append_to_last(&mut self, continuation: &str) {
        if let Some((_, value)) = self.entries.last_mut() {
            if !value.is_empty() {
                value.push(' ');
            }
            value.push_str(continuation);
        }
    }

    /// Look up a header by case-insensitive name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One message block split out of a mailbox archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Remainder of the `From ` delimiter line (envelope sender and date)
    pub envelope: Option<String>,

    pub headers: Headers,

    /// Body text, trimmed
    pub body: String,

    /// Archive file the message was read from
    pub source: String,

    /// Zero-based position among the parsed messages of `source`
    pub position: usize,
}

impl RawMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Message-ID with surrounding angle brackets removed
    pub fn message_id(&self) -> Option<&str> {
        self.header("message-id")
            .map(|id| id.trim().trim_start_matches('<').trim_end_matches('>').trim())
            .filter(|id| !id.is_empty())
    }
}

/// Kind of normalized event. Only email is produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Email,
}

/// Canonical view of a message used by threading, analytics and citation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    /// Stable id: message-id plus source file, or source file plus position
    pub external_id: String,

    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Message-ID header value, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    /// Date header exactly as given (may be unparsable)
    pub date: String,

    /// Canonical party name
    pub actor: String,

    /// Subject as written, trimmed
    pub subject: String,

    /// Whitespace-collapsed excerpt of the body
    pub snippet: String,

    /// Full body text
    #[serde(skip_serializing, default)]
    pub body: String,

    /// Archive file the message came from
    pub source_path: String,
}

impl NormalizedEvent {
    /// Best-effort parse of `date`
    pub fn parsed_date(&self) -> EventDate {
        EventDate::parse(&self.date)
    }

    /// Subject normalized for threading
    pub fn thread_key(&self) -> String {
        crate::normalizer::normalize_subject(&self.subject)
    }

    /// Lower-cased `subject + body` used for keyword matching
    pub fn searchable_text(&self) -> String {
        let mut text = String::with_capacity(self.subject.len() + self.body.len() + 1);
        text.push_str(&self.subject);
        text.push(' ');
        text.push_str(&self.body);
        text.to_lowercase()
    }
}
