use crate::error::{CitationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

const BUILTIN_BUCKETS: &str = include_str!("../../../claims/default.json");

pub const CLAIM_BUCKETS_SCHEMA_VERSION: u32 = 1;

/// A claim category and the phrases that count as evidence for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimBucket {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Phrases matched against e-mail subject and body
    pub keywords: Vec<String>,

    /// Phrases matched against exhibit titles and paths (defaults to `keywords`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub document_keywords: Vec<String>,
}

impl ClaimBucket {
    pub fn new<I, S>(id: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            label: None,
            keywords: keywords.into_iter().map(Into::into).collect(),
            document_keywords: Vec::new(),
        }
        .normalized()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_document_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.document_keywords = keywords.into_iter().map(Into::into).collect();
        self.normalized()
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.id)
    }

    /// Keywords applied to document titles and paths
    pub fn document_terms(&self) -> &[String] {
        if self.document_keywords.is_empty() {
            &self.keywords
        } else {
            &self.document_keywords
        }
    }

    /// Whether lower-cased text contains any e-mail keyword
    pub fn matches_text(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Whether a document's title or path contains any document keyword
    pub fn matches_document(&self, title: &str, path: &str) -> bool {
        let title = title.to_lowercase();
        let path = path.to_lowercase();
        self.document_terms()
            .iter()
            .any(|k| title.contains(k.as_str()) || path.contains(k.as_str()))
    }

    fn normalized(mut self) -> Self {
        self.id = self.id.trim().to_string();
        self.keywords = normalize_terms(&self.keywords);
        self.document_keywords = normalize_terms(&self.document_keywords);
        self
    }
}

fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Deserialize)]
struct RawClaimBuckets {
    #[serde(default)]
    schema_version: Option<u32>,
    #[serde(default)]
    buckets: Vec<ClaimBucket>,
}

/// Ordered, validated set of claim buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimBuckets {
    buckets: Vec<ClaimBucket>,
}

impl ClaimBuckets {
    pub fn new(buckets: Vec<ClaimBucket>) -> Result<Self> {
        let buckets: Vec<_> = buckets.into_iter().map(ClaimBucket::normalized).collect();
        validate(&buckets)?;
        Ok(Self { buckets })
    }

    /// Buckets bundled with the crate
    pub fn builtin() -> Self {
        Self::from_bytes(BUILTIN_BUCKETS.as_bytes()).expect("bundled claim buckets must parse")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes).map_err(|e| match e {
            CitationError::InvalidBuckets(reason) => {
                CitationError::InvalidBuckets(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    /// Parse a JSON or TOML bucket document
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        if let Some(version) = raw.schema_version {
            if version != CLAIM_BUCKETS_SCHEMA_VERSION {
                return Err(CitationError::InvalidBuckets(format!(
                    "schema_version {version} is not supported (expected {CLAIM_BUCKETS_SCHEMA_VERSION})"
                )));
            }
        }
        Self::new(raw.buckets)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClaimBucket> {
        self.buckets.iter()
    }

    pub fn get(&self, id: &str) -> Option<&ClaimBucket> {
        self.buckets.iter().find(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn parse_raw(bytes: &[u8]) -> Result<RawClaimBuckets> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| CitationError::InvalidBuckets(format!("not UTF-8: {e}")))?;
    if text.trim_start().starts_with('{') {
        return serde_json::from_str(text)
            .map_err(|e| CitationError::InvalidBuckets(format!("invalid JSON: {e}")));
    }
    toml::from_str(text).map_err(|e| CitationError::InvalidBuckets(format!("invalid TOML: {e}")))
}

fn validate(buckets: &[ClaimBucket]) -> Result<()> {
    let mut seen = HashSet::new();
    for bucket in buckets {
        if bucket.id.is_empty() {
            return Err(CitationError::InvalidBuckets(
                "bucket id must not be empty".to_string(),
            ));
        }
        if !seen.insert(bucket.id.as_str()) {
            return Err(CitationError::InvalidBuckets(format!(
                "duplicate bucket id '{}'",
                bucket.id
            )));
        }
        if bucket.keywords.is_empty() {
            return Err(CitationError::InvalidBuckets(format!(
                "bucket '{}' has no keywords",
                bucket.id
            )));
        }
    }
    Ok(())
}
