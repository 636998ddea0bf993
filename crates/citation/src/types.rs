use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of evidence a citation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Email,
    Document,
    Graph,
}

impl SourceType {
    pub const ALL: [SourceType; 3] = [SourceType::Email, SourceType::Document, SourceType::Graph];

    pub const fn as_str(self) -> &'static str {
        match self {
            SourceType::Email => "email",
            SourceType::Document => "document",
            SourceType::Graph => "graph",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a citation can be traced back to.
///
/// Graph facts without a backing file are traced to their node id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRef {
    File(String),
    Node(String),
}

/// A traceable reference from a claim to one piece of evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: String,

    #[serde(rename = "type")]
    pub source_type: SourceType,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    pub detail: String,

    #[serde(flatten)]
    pub source: SourceRef,
}

impl Citation {
    /// Backing file, if the citation has one
    pub fn file(&self) -> Option<&str> {
        match &self.source {
            SourceRef::File(path) => Some(path.as_str()),
            SourceRef::Node(_) => None,
        }
    }
}

/// Citations of one source type for one claim
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationSet {
    /// Matches found before the per-bucket cap was applied
    pub total: usize,

    /// At most the per-bucket cap, in corpus order
    pub items: Vec<Citation>,
}

impl CitationSet {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<&Citation> {
        self.items.first()
    }
}

/// All citations gathered for one claim bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimCitations {
    pub claim: String,
    pub label: String,
    pub emails: CitationSet,
    pub documents: CitationSet,
    pub graph: CitationSet,
}

impl ClaimCitations {
    pub fn set(&self, source_type: SourceType) -> &CitationSet {
        match source_type {
            SourceType::Email => &self.emails,
            SourceType::Document => &self.documents,
            SourceType::Graph => &self.graph,
        }
    }

    /// Every citation, emails first, then documents, then graph facts
    pub fn all(&self) -> impl Iterator<Item = &Citation> {
        self.emails
            .items
            .iter()
            .chain(self.documents.items.iter())
            .chain(self.graph.items.iter())
    }
}

/// How the graph collaborator behaved during one citation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphStatus {
    /// No graph source was supplied
    Disabled,
    /// Connected and every query answered
    Available,
    /// Connection failed; graph citations are empty
    Unavailable,
    /// Connected, but at least one query failed or timed out
    Degraded,
}

/// Output of a citation run, in bucket order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationReport {
    pub claims: Vec<ClaimCitations>,
    pub graph_status: GraphStatus,
}

impl CitationReport {
    pub fn claim(&self, claim: &str) -> Option<&ClaimCitations> {
        self.claims.iter().find(|c| c.claim == claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn citation_serializes_source_inline() {
        let citation = Citation {
            id: "c_0_m1".to_string(),
            source_type: SourceType::Email,
            title: "Hearing".to_string(),
            date: None,
            detail: "text".to_string(),
            source: SourceRef::File("/mail/a.mbox".to_string()),
        };
        let value = serde_json::to_value(&citation).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "c_0_m1",
                "type": "email",
                "title": "Hearing",
                "detail": "text",
                "file": "/mail/a.mbox"
            })
        );
        assert_eq!(citation.file(), Some("/mail/a.mbox"));
    }

    #[test]
    fn node_sourced_citation_has_no_file() {
        let citation = Citation {
            id: "g".to_string(),
            source_type: SourceType::Graph,
            title: "Fact".to_string(),
            date: Some("2024-01-01".to_string()),
            detail: String::new(),
            source: SourceRef::Node("n1".to_string()),
        };
        assert_eq!(citation.file(), None);
        assert_eq!(serde_json::to_value(&citation).unwrap()["node"], "n1");
    }
}
