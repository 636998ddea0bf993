use chrono::SecondsFormat;
use evidence_mailbox::{EventDate, NormalizedEvent};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Events sharing one normalized subject, oldest first.
///
/// Threading is subject-only: unrelated conversations with the same subject
/// merge, and messages without a subject share the empty key.
#[derive(Debug, Clone, PartialEq)]
pub struct Thread {
    pub key: String,
    pub events: Vec<NormalizedEvent>,
}

/// Compact description of a thread for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub key: String,
    pub messages: usize,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,
}

impl Thread {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn summary(&self) -> ThreadSummary {
        let participants: BTreeSet<&str> = self.events.iter().map(|e| e.actor.as_str()).collect();
        let parsed: Vec<_> = self
            .events
            .iter()
            .filter_map(|e| e.parsed_date().as_datetime())
            .collect();
        let format = |dt: &chrono::DateTime<chrono::Utc>| dt.to_rfc3339_opts(SecondsFormat::Secs, true);

        ThreadSummary {
            key: self.key.clone(),
            messages: self.events.len(),
            participants: participants.into_iter().map(str::to_string).collect(),
            first_date: parsed.iter().min().map(format),
            last_date: parsed.iter().max().map(format),
        }
    }
}

/// Partitions events into [`Thread`]s keyed by normalized subject
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadBuilder;

impl ThreadBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build threads in key order.
    ///
    /// Events within a thread are stably sorted by parsed date; unparsable
    /// dates sort first.
    pub fn build(&self, events: &[NormalizedEvent]) -> Vec<Thread> {
        let mut grouped: BTreeMap<String, Vec<NormalizedEvent>> = BTreeMap::new();
        for event in events {
            grouped
                .entry(event.thread_key())
                .or_default()
                .push(event.clone());
        }

        let threads: Vec<Thread> = grouped
            .into_iter()
            .map(|(key, mut events)| {
                events.sort_by_cached_key(|e| e.parsed_date());
                Thread { key, events }
            })
            .collect();

        log::debug!(
            "Threaded {} event(s) into {} thread(s)",
            events.len(),
            threads.len()
        );
        threads
    }
}

/// Parsed dates of a thread's events, in thread order
pub(crate) fn thread_dates(thread: &Thread) -> Vec<EventDate> {
    thread.events.iter().map(|e| e.parsed_date()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_mailbox::EventKind;
    use pretty_assertions::assert_eq;

    fn event(id: &str, actor: &str, subject: &str, date: &str) -> NormalizedEvent {
        NormalizedEvent {
            external_id: id.to_string(),
            kind: EventKind::Email,
            message_id: None,
            date: date.to_string(),
            actor: actor.to_string(),
            subject: subject.to_string(),
            snippet: String::new(),
            body: String::new(),
            source_path: "inbox.mbox".to_string(),
        }
    }

    #[test]
    fn reply_and_forward_markers_thread_together() {
        let events = vec![
            event("1", "a", "Re: Hearing Date", "2024-01-02"),
            event("2", "b", "hearing date", "2024-01-01"),
            event("3", "c", "Fwd: Re: Hearing Date", "2024-01-03"),
            event("4", "d", "Other", "2024-01-01"),
        ];
        let threads = ThreadBuilder::new().build(&events);
        assert_eq!(threads.len(), 2);

        let hearing = threads.iter().find(|t| t.key == "hearing date").unwrap();
        let ids: Vec<_> = hearing.events.iter().map(|e| e.external_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn unparsable_dates_sort_first_and_ties_keep_input_order() {
        let events = vec![
            event("1", "a", "s", "2024-01-01"),
            event("2", "b", "s", "garbage"),
            event("3", "c", "s", "2024-01-01"),
            event("4", "d", "s", ""),
        ];
        let threads = ThreadBuilder::new().build(&events);
        let ids: Vec<_> = threads[0]
            .events
            .iter()
            .map(|e| e.external_id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "4", "1", "3"]);
    }

    #[test]
    fn empty_subjects_share_the_empty_key() {
        let events = vec![
            event("1", "a", "", "2024-01-01"),
            event("2", "b", "Re:", "2024-01-02"),
        ];
        let threads = ThreadBuilder::new().build(&events);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].key, "");
        assert_eq!(threads[0].len(), 2);
    }

    #[test]
    fn summary_reports_participants_and_date_range() {
        let events = vec![
            event("1", "b", "s", "2024-01-03T00:00:00Z"),
            event("2", "a", "s", "2024-01-01T00:00:00Z"),
            event("3", "a", "s", "unknown"),
        ];
        let summary = ThreadBuilder::new().build(&events)[0].summary();
        assert_eq!(
            summary,
            ThreadSummary {
                key: "s".to_string(),
                messages: 3,
                participants: vec!["a".to_string(), "b".to_string()],
                first_date: Some("2024-01-01T00:00:00Z".to_string()),
                last_date: Some("2024-01-03T00:00:00Z".to_string()),
            }
        );
    }
}
