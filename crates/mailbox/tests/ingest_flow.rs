use evidence_mailbox::{ActorDirectory, ArchiveSource, MailboxIngestor, MessageNormalizer};
use tempfile::TempDir;

const CASE_ARCHIVE: &str = r#"From counsel@firm.com Mon Jan  1 09:00:00 2024
From: Pat Counsel <counsel@firm.com>
To: client@home.net
Subject: Hearing Date
Date: Mon, 1 Jan 2024 09:00:00 +0000
Message-ID: <h1@firm.com>

The hearing is set for March.

From client@home.net Thu Jan  4 09:00:00 2024
From: client@home.net
Subject: Re: Hearing Date
Date: Thu, 4 Jan 2024 09:00:00 +0000

Can we postpone it?

From nobody Fri Jan  5 09:00:00 2024
Subject: truncated export
"#;

#[tokio::test]
async fn ingest_and_normalize_directory() {
    let temp = TempDir::new().expect("tempdir");
    let mail_dir = temp.path().join("mail");
    tokio::fs::create_dir_all(&mail_dir)
        .await
        .expect("create mail dir");
    tokio::fs::write(mail_dir.join("case.mbox"), CASE_ARCHIVE)
        .await
        .expect("write archive");

    let ingestion = MailboxIngestor::new(ArchiveSource::new(&mail_dir))
        .ingest()
        .await;
    assert_eq!(ingestion.report.files, 1);
    assert_eq!(ingestion.report.messages, 2);
    assert_eq!(ingestion.report.skipped_malformed, 1);

    let directory = ActorDirectory::from_entries([("@firm.com", "Counsel"), ("client@home.net", "Client")]);
    let events = ingestion.normalize(&MessageNormalizer::new(directory));

    assert_eq!(events[0].actor, "Counsel");
    assert_eq!(events[1].actor, "Client");
    assert_eq!(events[0].thread_key(), events[1].thread_key());
    assert!(events[0].external_id.starts_with("h1@firm.com::"));
    assert!(events[1].external_id.ends_with("case.mbox::#1"));
    assert!(events.iter().all(|e| e.source_path.ends_with("case.mbox")));
    assert_eq!(
        events[1].parsed_date().days_since(&events[0].parsed_date()),
        3.0
    );
}

#[tokio::test]
async fn fallback_file_is_used_without_matching_extension() {
    let temp = TempDir::new().expect("tempdir");
    tokio::fs::write(temp.path().join("Inbox"), CASE_ARCHIVE)
        .await
        .expect("write archive");

    let source = ArchiveSource::new(temp.path()).with_fallback_file("Inbox");
    let ingestion = MailboxIngestor::new(source).ingest().await;
    assert_eq!(ingestion.messages.len(), 2);
}
