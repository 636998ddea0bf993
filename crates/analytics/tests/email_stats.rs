use evidence_analytics::{BehaviorAnalyzer, EmailStats, ThreadBuilder};
use evidence_mailbox::{ArchiveSource, MailboxIngestor, MailboxParser, MessageNormalizer};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

const THREAD: &str = "From a\n\
From: alice@example.com\n\
Subject: Hearing Date\n\
Date: 2024-01-01T00:00:00Z\n\
\n\
Can we talk about the hearing?\n\
From b\n\
From: bob@example.com\n\
Subject: Re: Hearing Date\n\
Date: 2024-01-03T12:00:00Z\n\
\n\
We should postpone.\n\
From a\n\
From: alice@example.com\n\
Subject: RE: hearing date\n\
Date: 2024-01-04T12:00:00Z\n\
\n\
Agreed.\n";

#[test]
fn stats_from_parsed_archive() {
    let messages = MailboxParser::new().parse(THREAD, "case.mbox");
    let events = MessageNormalizer::default().normalize_all(&messages);

    let threads = ThreadBuilder::new().build(&events);
    assert_eq!(threads.len(), 1);

    let stats = BehaviorAnalyzer::new().analyze_threads(&events, &threads);
    assert_eq!(
        stats.counts_by_actor,
        BTreeMap::from([
            ("alice@example.com".to_string(), 2),
            ("bob@example.com".to_string(), 1),
        ])
    );
    assert_eq!(
        stats.continuances_by_actor,
        BTreeMap::from([("bob@example.com".to_string(), 1)])
    );
    assert_eq!(
        stats.avg_days_by_actor,
        BTreeMap::from([
            ("alice@example.com".to_string(), 1.0),
            ("bob@example.com".to_string(), 2.5),
        ])
    );
}

#[tokio::test]
async fn missing_mailbox_directory_gives_empty_stats() {
    let temp = tempfile::tempdir().unwrap();
    let ingestion = MailboxIngestor::new(ArchiveSource::new(temp.path().join("no-mail")))
        .ingest()
        .await;
    let events = ingestion.normalize(&MessageNormalizer::default());
    let stats = BehaviorAnalyzer::new().analyze(&events);

    assert_eq!(stats, EmailStats::default());
    assert_eq!(
        serde_json::to_string(&stats).unwrap(),
        r#"{"countsByActor":{},"continuancesByActor":{},"avgDaysByActor":{}}"#
    );
}
