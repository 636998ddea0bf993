//! # Evidence Citation
//!
//! Links claim buckets to supporting e-mails, exhibits and graph facts, then
//! clusters the links into a corroboration matrix.
//!
//! ## Flow
//!
//! ```text
//! ClaimBuckets + NormalizedEvent[] + ExhibitRegistry (+ GraphFactSource)
//!     │
//!     ├──> Citation Engine
//!     │      ├─ E-mails: keyword in subject or body
//!     │      ├─ Documents: keyword in title or path (path required)
//!     │      ├─ Graph: keyword query, time-bounded, degrades to empty
//!     │      └─ Capped per bucket and source type
//!     │
//!     └──> Evidence Clusterer
//!            ├─ Cell per claim × source type (count, samples)
//!            └─ Suggested exhibits (document first, then e-mail)
//! ```
//!
//! Every citation carries either a backing file or, for graph facts without
//! one, the graph node id.

mod buckets;
mod cluster;
mod engine;
mod error;
mod graph;
mod registry;
mod types;

pub use buckets::{ClaimBucket, ClaimBuckets, CLAIM_BUCKETS_SCHEMA_VERSION};
pub use cluster::{
    CorroborationCell, CorroborationMatrix, EvidenceClusterer, SuggestedEvidence,
    DEFAULT_SAMPLE_CAP,
};
pub use engine::{
    CitationEngine, CitationSettings, DEFAULT_DETAIL_CHARS, DEFAULT_GRAPH_TIMEOUT_MS,
    DEFAULT_PER_BUCKET_CAP,
};
pub use error::{CitationError, DependencyError, Result};
pub use graph::{
    FactMatches, FactQuery, GraphFact, GraphFactSource, GraphRelationship, JsonGraphSnapshot,
    Neighborhood,
};
pub use registry::{Exhibit, ExhibitNumber, ExhibitRegistry};
pub use types::{
    Citation, CitationReport, CitationSet, ClaimCitations, GraphStatus, SourceRef, SourceType,
};
