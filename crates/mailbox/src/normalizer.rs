use crate::types::{EventKind, NormalizedEvent, RawMessage};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Actor used when a message has no usable `From` header
pub const UNKNOWN_ACTOR: &str = "unknown";

const DEFAULT_SNIPPET_CHARS: usize = 200;

const REPLY_MARKERS: &[&str] = &["re:", "fwd:", "fw:"];

fn angle_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<([^<>\s]+@[^<>\s]+)>").expect("valid angle address regex"))
}

fn bare_address_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[^\s<>"',;()]+@[^\s<>"',;()]+"#).expect("valid bare address regex")
    })
}

/// Normalize a subject into its thread key.
///
/// Lower-cases, collapses whitespace and strips any run of leading `re:`,
/// `fwd:` or `fw:` markers. Idempotent.
pub fn normalize_subject(subject: &str) -> String {
    let mut normalized = collapse_whitespace(subject).to_lowercase();
    loop {
        let Some(marker) = REPLY_MARKERS.iter().find(|m| normalized.starts_with(*m)) else {
            break;
        };
        normalized = normalized[marker.len()..].trim_start().to_string();
    }
    normalized.trim().to_string()
}

/// Collapse every whitespace run to a single space and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max_chars` characters, respecting char boundaries
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}

/// Extract the bare e-mail address from a `From` header value
pub fn extract_address(from: &str) -> Option<String> {
    let from = from.trim();
    if from.is_empty() {
        return None;
    }
    if let Some(caps) = angle_address_re().captures(from) {
        return Some(caps[1].to_lowercase());
    }
    if let Some(m) = bare_address_re().find(from) {
        return Some(m.as_str().to_lowercase());
    }
    Some(from.to_string())
}

/// Maps e-mail addresses to canonical party names.
///
/// Keys are exact addresses (`jane@firm.com`) or whole domains (`@firm.com`);
/// exact entries win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorDirectory {
    entries: BTreeMap<String, String>,
}

impl ActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut directory = Self::new();
        for (key, name) in entries {
            directory.insert(key.as_ref(), name);
        }
        directory
    }

    pub fn insert(&mut self, key: &str, name: impl Into<String>) {
        self.entries.insert(key.trim().to_lowercase(), name.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a `From` header value to an actor name.
    ///
    /// Lookup ignores case; an unmatched value is returned as extracted.
    pub fn resolve(&self, from: Option<&str>) -> String {
        let Some(address) = from.and_then(extract_address) else {
            return UNKNOWN_ACTOR.to_string();
        };
        let key = address.to_lowercase();
        if let Some(name) = self.entries.get(&key) {
            return name.clone();
        }
        if let Some((_, domain)) = key.rsplit_once('@') {
            if let Some(name) = self.entries.get(&format!("@{domain}")) {
                return name.clone();
            }
        }
        address
    }
}

/// Turns [`RawMessage`]s into [`NormalizedEvent`]s
#[derive(Debug, Clone)]
pub struct MessageNormalizer {
    directory: ActorDirectory,
    snippet_chars: usize,
}

impl Default for MessageNormalizer {
    fn default() -> Self {
        Self::new(ActorDirectory::default())
    }
}

impl MessageNormalizer {
    pub fn new(directory: ActorDirectory) -> Self {
        Self {
            directory,
            snippet_chars: DEFAULT_SNIPPET_CHARS,
        }
    }

    pub fn with_snippet_chars(mut self, snippet_chars: usize) -> Self {
        self.snippet_chars = snippet_chars;
        self
    }

    pub fn directory(&self) -> &ActorDirectory {
        &self.directory
    }

    pub fn normalize(&self, message: &RawMessage) -> NormalizedEvent {
        let message_id = message.message_id().map(str::to_string);
        let external_id = match &message_id {
            Some(id) => format!("{id}::{}", message.source),
            None => format!("{}::#{}", message.source, message.position),
        };

        let collapsed = collapse_whitespace(&message.body);
        let (snippet, _) = truncate_chars(&collapsed, self.snippet_chars);

        NormalizedEvent {
            external_id,
            kind: EventKind::Email,
            message_id,
            date: message.header("date").unwrap_or_default().trim().to_string(),
            actor: self.directory.resolve(message.header("from")),
            subject: message.header("subject").unwrap_or_default().trim().to_string(),
            snippet: snippet.to_string(),
            body: message.body.clone(),
            source_path: message.source.clone(),
        }
    }

    pub fn normalize_all(&self, messages: &[RawMessage]) -> Vec<NormalizedEvent> {
        messages.iter().map(|m| self.normalize(m)).collect()
    }
}
