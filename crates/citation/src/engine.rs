use crate::buckets::{ClaimBucket, ClaimBuckets};
use crate::error::DependencyError;
use crate::graph::{FactQuery, GraphFact, GraphFactSource};
use crate::registry::ExhibitRegistry;
use crate::types::{
    Citation, CitationReport, CitationSet, ClaimCitations, GraphStatus, SourceRef, SourceType,
};
use evidence_mailbox::{collapse_whitespace, truncate_chars, NormalizedEvent};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_PER_BUCKET_CAP: usize = 10;
pub const DEFAULT_DETAIL_CHARS: usize = 160;
pub const DEFAULT_GRAPH_TIMEOUT_MS: u64 = 3_000;

const ELLIPSIS: &str = "…";
const NO_SUBJECT: &str = "(no subject)";

/// Tunables for a citation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationSettings {
    /// Maximum citations kept per bucket and source type
    pub per_bucket_cap: usize,

    /// Character budget for citation details
    pub detail_chars: usize,

    /// Time allowed for each call to the graph collaborator
    pub graph_timeout_ms: u64,

    /// Facts requested per bucket (defaults to `per_bucket_cap`)
    pub graph_fact_limit: Option<usize>,

    /// Hops of neighborhood used to enrich graph citations (0 disables)
    pub neighborhood_hops: usize,

    /// Neighbors fetched per graph citation
    pub neighborhood_limit: usize,
}

impl Default for CitationSettings {
    fn default() -> Self {
        Self {
            per_bucket_cap: DEFAULT_PER_BUCKET_CAP,
            detail_chars: DEFAULT_DETAIL_CHARS,
            graph_timeout_ms: DEFAULT_GRAPH_TIMEOUT_MS,
            graph_fact_limit: None,
            neighborhood_hops: 0,
            neighborhood_limit: 5,
        }
    }
}

impl CitationSettings {
    fn graph_timeout(&self) -> Duration {
        Duration::from_millis(self.graph_timeout_ms)
    }

    fn fact_limit(&self) -> usize {
        self.graph_fact_limit.unwrap_or(self.per_bucket_cap)
    }
}

/// Matches claim buckets against e-mails, exhibits and graph facts.
///
/// Matching is keyword containment; results keep corpus order and are
/// capped per bucket. There is no relevance scoring.
#[derive(Debug, Clone, Default)]
pub struct CitationEngine {
    settings: CitationSettings,
}

impl CitationEngine {
    pub fn new(settings: CitationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CitationSettings {
        &self.settings
    }

    /// Cite every bucket against all sources.
    ///
    /// Graph failures are logged here and leave that bucket's graph
    /// citations empty; they never fail the run.
    pub async fn cite(
        &self,
        buckets: &ClaimBuckets,
        events: &[NormalizedEvent],
        registry: &ExhibitRegistry,
        graph: Option<&dyn GraphFactSource>,
    ) -> CitationReport {
        let mut graph_status = GraphStatus::Disabled;
        let connected = match graph {
            Some(source) => match self.bounded(source.connect()).await {
                Ok(()) => {
                    graph_status = GraphStatus::Available;
                    Some(source)
                }
                Err(e) => {
                    log::warn!("{e}; continuing without graph citations");
                    graph_status = GraphStatus::Unavailable;
                    None
                }
            },
            None => None,
        };

        let mut claims = Vec::with_capacity(buckets.len());
        for bucket in buckets.iter() {
            let graph_set = match connected {
                Some(source) => match self.graph_citations(bucket, source).await {
                    Ok(set) => set,
                    Err(e) => {
                        log::warn!("Graph citations for '{}' skipped: {e}", bucket.id);
                        graph_status = GraphStatus::Degraded;
                        CitationSet::default()
                    }
                },
                None => CitationSet::default(),
            };

            claims.push(ClaimCitations {
                claim: bucket.id.clone(),
                label: bucket.label().to_string(),
                emails: self.email_citations(bucket, events),
                documents: self.document_citations(bucket, registry),
                graph: graph_set,
            });
        }

        if let Some(source) = connected {
            if let Err(e) = self.bounded(source.disconnect()).await {
                log::debug!("Graph disconnect failed: {e}");
            }
        }

        CitationReport {
            claims,
            graph_status,
        }
    }

    /// E-mails whose subject or body contains a bucket keyword
    pub fn email_citations(&self, bucket: &ClaimBucket, events: &[NormalizedEvent]) -> CitationSet {
        let mut set = CitationSet::default();
        for event in events {
            if !bucket.matches_text(&event.searchable_text()) {
                continue;
            }
            set.total += 1;
            if set.items.len() >= self.settings.per_bucket_cap {
                continue;
            }
            let key = event.message_id.as_deref().unwrap_or(&event.external_id);
            let subject = event.subject.trim();
            set.items.push(Citation {
                id: format!("{}_{}_{}", bucket.id, set.items.len(), key),
                source_type: SourceType::Email,
                title: if subject.is_empty() {
                    NO_SUBJECT.to_string()
                } else {
                    subject.to_string()
                },
                date: non_empty(&event.date),
                detail: self.detail(&event.body),
                source: SourceRef::File(event.source_path.clone()),
            });
        }
        set
    }

    /// Exhibits whose title or path contains a document keyword.
    ///
    /// Exhibits without a path are never cited.
    pub fn document_citations(&self, bucket: &ClaimBucket, registry: &ExhibitRegistry) -> CitationSet {
        let mut set = CitationSet::default();
        for (position, exhibit) in registry.exhibits.iter().enumerate() {
            let Some(file) = exhibit.file() else {
                continue;
            };
            let title = exhibit.display_title();
            if !bucket.matches_document(&title, file) {
                continue;
            }
            set.total += 1;
            if set.items.len() >= self.settings.per_bucket_cap {
                continue;
            }
            set.items.push(Citation {
                id: format!("{}_doc_{}_{}", bucket.id, set.items.len(), exhibit.key(position)),
                source_type: SourceType::Document,
                title,
                date: exhibit.date.as_deref().and_then(non_empty),
                detail: document_detail(exhibit.no.as_ref().map(|n| n.to_string()), exhibit.kind.as_deref(), file),
                source: SourceRef::File(file.to_string()),
            });
        }
        set
    }

    /// Facts from the graph collaborator supporting a bucket.
    ///
    /// Every call is time-bounded; the error is returned for the caller to
    /// log and recover from.
    pub async fn graph_citations(
        &self,
        bucket: &ClaimBucket,
        source: &dyn GraphFactSource,
    ) -> Result<CitationSet, DependencyError> {
        let query = FactQuery {
            claim: bucket.id.clone(),
            keywords: bucket.keywords.clone(),
            limit: self.settings.fact_limit(),
        };
        let matches = self.bounded(source.execute_query(&query)).await?;

        let mut set = CitationSet {
            total: matches.total.max(matches.facts.len()),
            items: Vec::new(),
        };
        for fact in matches.facts.into_iter().take(self.settings.per_bucket_cap) {
            let related = self.related_count(&fact, source).await;
            set.items.push(self.graph_citation(bucket, set.items.len(), &fact, related));
        }
        Ok(set)
    }

    async fn related_count(&self, fact: &GraphFact, source: &dyn GraphFactSource) -> Option<usize> {
        if self.settings.neighborhood_hops == 0 {
            return None;
        }
        let call = source.get_neighborhood(
            &fact.id,
            self.settings.neighborhood_hops,
            self.settings.neighborhood_limit,
        );
        match self.bounded(call).await {
            Ok(neighborhood) => Some(neighborhood.nodes.len().saturating_sub(1)),
            Err(e) => {
                log::debug!("Neighborhood of '{}' unavailable: {e}", fact.id);
                None
            }
        }
    }

    fn graph_citation(
        &self,
        bucket: &ClaimBucket,
        index: usize,
        fact: &GraphFact,
        related: Option<usize>,
    ) -> Citation {
        let mut detail = self.detail(&fact.text);
        if let Some(count) = related.filter(|c| *c > 0) {
            if !detail.is_empty() {
                detail.push(' ');
            }
            detail.push_str(&format!("({count} related)"));
        }
        let source = match fact.source_file.as_deref().and_then(non_empty) {
            Some(file) => SourceRef::File(file),
            None => SourceRef::Node(fact.id.clone()),
        };
        Citation {
            id: format!("{}_graph_{}_{}", bucket.id, index, fact.id),
            source_type: SourceType::Graph,
            title: if fact.label.trim().is_empty() {
                fact.id.clone()
            } else {
                fact.label.trim().to_string()
            },
            date: fact.date.as_deref().and_then(non_empty),
            detail,
            source,
        }
    }

    /// Whitespace-collapsed text cut to the detail budget
    fn detail(&self, text: &str) -> String {
        let collapsed = collapse_whitespace(text);
        match truncate_chars(&collapsed, self.settings.detail_chars) {
            (head, true) => format!("{}{ELLIPSIS}", head.trim_end()),
            (head, false) => head.to_string(),
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, DependencyError>
    where
        F: Future<Output = Result<T, DependencyError>>,
    {
        let timeout = self.settings.graph_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DependencyError::Timeout(self.settings.graph_timeout_ms)),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn document_detail(no: Option<String>, kind: Option<&str>, file: &str) -> String {
    let mut parts = Vec::new();
    if let Some(no) = no {
        parts.push(format!("Exhibit {no}"));
    }
    if let Some(kind) = kind.map(str::trim).filter(|k| !k.is_empty()) {
        parts.push(kind.to_string());
    }
    parts.push(file.to_string());
    parts.join(" · ")
}
