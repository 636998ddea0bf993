//! # Evidence Mailbox
//!
//! Turns raw mailbox archives into normalized message events.
//!
//! ## Pipeline
//!
//! ```text
//! Archive directory
//!     │
//!     ├──> Archive Scanner (by extension, fallback file)
//!     │      └─> Archive files
//!     │
//!     ├──> Mailbox Parser (fan-out per file, bounded)
//!     │      ├─ Split on `From ` lines
//!     │      ├─ Headers until first blank line
//!     │      └─ Skip blocks without a boundary
//!     │
//!     └──> Message Normalizer
//!            ├─ Actor from `From` (directory lookup)
//!            ├─ Subject kept, thread key normalized
//!            └─ Date kept verbatim, parsed on demand
//! ```
//!
//! Known limitation: `>From ` quoted lines are not unescaped.
//!
//! ## Example
//!
//! ```no_run
//! use evidence_mailbox::{ArchiveSource, MailboxIngestor, MessageNormalizer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = ArchiveSource::new("mail").with_fallback_file("mailbox.mbox");
//!     let ingestion = MailboxIngestor::new(source).ingest().await;
//!     let events = ingestion.normalize(&MessageNormalizer::default());
//!     println!("{} events", events.len());
//! }
//! ```

mod date;
mod error;
mod ingest;
mod normalizer;
mod parser;
mod scanner;
mod types;

pub use date::{parse_datetime, EventDate};
pub use error::{MailboxError, Result};
pub use ingest::{read_archive, FailedArchive, IngestReport, Ingestion, MailboxIngestor};
pub use normalizer::{
    collapse_whitespace, extract_address, normalize_subject, truncate_chars, ActorDirectory,
    MessageNormalizer, UNKNOWN_ACTOR,
};
pub use parser::{MailboxParser, ParsedArchive, FROM_DELIMITER};
pub use scanner::{ArchiveScanner, ArchiveSource, DEFAULT_EXTENSIONS};
pub use types::{EventKind, Headers, NormalizedEvent, RawMessage};
