use crate::config::EvidenceConfig;
use anyhow::{Context, Result};
use evidence_analytics::{BehaviorAnalyzer, EmailStats, Thread, ThreadBuilder};
use evidence_citation::{
    CitationEngine, CitationReport, ClaimBuckets, CorroborationMatrix, EvidenceClusterer,
    ExhibitRegistry, GraphFactSource, JsonGraphSnapshot,
};
use evidence_mailbox::{IngestReport, MailboxIngestor, MessageNormalizer, NormalizedEvent};

/// Normalized events of one ingestion run
pub struct Corpus {
    pub events: Vec<NormalizedEvent>,
    pub report: IngestReport,
}

impl Corpus {
    pub fn threads(&self) -> Vec<Thread> {
        ThreadBuilder::new().build(&self.events)
    }

    pub fn stats(&self, threads: &[Thread]) -> EmailStats {
        BehaviorAnalyzer::new().analyze_threads(&self.events, threads)
    }
}

pub async fn load_corpus(config: &EvidenceConfig) -> Corpus {
    let ingestion = MailboxIngestor::new(config.archive_source())
        .with_concurrency(config.archive.concurrency)
        .ingest()
        .await;
    let events = ingestion.normalize(&MessageNormalizer::new(config.actor_directory()));
    Corpus {
        events,
        report: ingestion.report,
    }
}

/// Buckets from the configured file, or the bundled set
pub fn load_buckets(config: &EvidenceConfig) -> Result<ClaimBuckets> {
    match &config.claims.path {
        Some(path) => ClaimBuckets::from_file(path)
            .with_context(|| format!("Failed to load claim buckets from {}", path.display())),
        None => Ok(ClaimBuckets::builtin()),
    }
}

pub async fn load_registry(config: &EvidenceConfig) -> ExhibitRegistry {
    match &config.registry.path {
        Some(path) => ExhibitRegistry::load(path).await,
        None => ExhibitRegistry::default(),
    }
}

pub async fn cite(config: &EvidenceConfig, corpus: &Corpus) -> Result<CitationReport> {
    let buckets = load_buckets(config)?;
    let registry = load_registry(config).await;
    let snapshot = config.graph.snapshot.as_ref().map(JsonGraphSnapshot::new);
    let graph = snapshot.as_ref().map(|s| s as &dyn GraphFactSource);

    let engine = CitationEngine::new(config.citation_settings());
    Ok(engine.cite(&buckets, &corpus.events, &registry, graph).await)
}

pub async fn corroborate(
    config: &EvidenceConfig,
    corpus: &Corpus,
) -> Result<(CitationReport, CorroborationMatrix)> {
    let report = cite(config, corpus).await?;
    let matrix = EvidenceClusterer::new().cluster(&report);
    Ok((report, matrix))
}
