use crate::error::{MailboxError, Result};
use crate::normalizer::MessageNormalizer;
use crate::parser::{MailboxParser, ParsedArchive};
use crate::scanner::{ArchiveScanner, ArchiveSource};
use crate::types::{NormalizedEvent, RawMessage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DEFAULT_READ_CONCURRENCY: usize = 4;
const MAX_READ_CONCURRENCY: usize = 32;

/// Counters describing one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Archive files that were parsed
    pub files: usize,

    /// Messages parsed across all files
    pub messages: usize,

    /// Blocks skipped for lacking a header/body boundary
    pub skipped_malformed: usize,

    /// Files that could not be read, with the reason
    pub failed_files: Vec<FailedArchive>,

    /// Set when the archive directory itself was missing
    pub missing_source: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedArchive {
    pub path: String,
    pub reason: String,
}

/// Messages from every archive, in file order then message order
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    pub messages: Vec<RawMessage>,
    pub report: IngestReport,
}

impl Ingestion {
    pub fn normalize(&self, normalizer: &MessageNormalizer) -> Vec<NormalizedEvent> {
        normalizer.normalize_all(&self.messages)
    }
}

/// Reads all archives of an [`ArchiveSource`] with bounded parallelism.
///
/// Never fails: a missing directory or an unreadable file contributes no
/// messages and is recorded in the [`IngestReport`].
#[derive(Debug, Clone)]
pub struct MailboxIngestor {
    source: ArchiveSource,
    concurrency: usize,
}

impl MailboxIngestor {
    pub fn new(source: ArchiveSource) -> Self {
        Self {
            source,
            concurrency: DEFAULT_READ_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_READ_CONCURRENCY);
        self
    }

    pub fn source(&self) -> &ArchiveSource {
        &self.source
    }

    pub async fn ingest(&self) -> Ingestion {
        let mut report = IngestReport::default();

        let files = match ArchiveScanner::new(&self.source).scan() {
            Ok(files) => files,
            Err(MailboxError::MissingSource(dir)) => {
                log::warn!("Mailbox directory {} not found; no messages ingested", dir.display());
                report.missing_source = true;
                return Ingestion {
                    messages: Vec::new(),
                    report,
                };
            }
            Err(e) => {
                log::warn!("Failed to scan mailbox directory: {e}");
                return Ingestion {
                    messages: Vec::new(),
                    report,
                };
            }
        };

        let results = self.read_all(files).await;

        let mut messages = Vec::new();
        for (path, result) in results {
            match result {
                Ok(archive) => {
                    log::debug!(
                        "Parsed {} message(s) from {} ({} malformed skipped)",
                        archive.messages.len(),
                        path.display(),
                        archive.skipped_malformed
                    );
                    report.files += 1;
                    report.skipped_malformed += archive.skipped_malformed;
                    messages.extend(archive.messages);
                }
                Err(e) => {
                    log::warn!("Failed to read archive {}: {e}", path.display());
                    report.failed_files.push(FailedArchive {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.messages = messages.len();

        log::info!(
            "Ingested {} message(s) from {} archive(s)",
            report.messages,
            report.files
        );
        Ingestion { messages, report }
    }

    async fn read_all(&self, files: Vec<PathBuf>) -> Vec<(PathBuf, Result<ParsedArchive>)> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (idx, path) in files.iter().cloned().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = read_archive(&path).await;
                (idx, result)
            });
        }

        let mut slots: Vec<Option<Result<ParsedArchive>>> = files.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, result)) => slots[idx] = Some(result),
                Err(e) => log::warn!("Archive read task failed: {e}"),
            }
        }

        files
            .into_iter()
            .zip(slots)
            .map(|(path, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(MailboxError::TaskFailed("task did not complete".to_string()))
                });
                (path, result)
            })
            .collect()
    }
}

/// Read and parse a single archive file
pub async fn read_archive(path: &Path) -> Result<ParsedArchive> {
    let bytes = tokio::fs::read(path).await?;
    let text = String::from_utf8_lossy(&bytes);
    let source = path.display().to_string();
    Ok(MailboxParser::new().parse_archive(&text, &source))
}
