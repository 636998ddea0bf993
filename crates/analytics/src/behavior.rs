use crate::thread::{thread_dates, Thread, ThreadBuilder};
use evidence_mailbox::NormalizedEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Replies this many days or more after the previous message are discarded
pub const LATENCY_CEILING_DAYS: f64 = 60.0;

/// Words that mark a message as discussing a continuance
pub const CONTINUANCE_KEYWORDS: &[&str] = &["continuance", "postpone", "reschedule", "adjourn"];

/// Per-actor statistics over a message corpus
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailStats {
    pub counts_by_actor: BTreeMap<String, usize>,
    pub continuances_by_actor: BTreeMap<String, usize>,
    pub avg_days_by_actor: BTreeMap<String, f64>,
}

impl EmailStats {
    pub fn is_empty(&self) -> bool {
        self.counts_by_actor.is_empty()
            && self.continuances_by_actor.is_empty()
            && self.avg_days_by_actor.is_empty()
    }
}

/// One reply delay, attributed to the responding actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySample {
    pub actor: String,
    pub days: f64,
}

/// Derives response latency, continuance attribution and volume
#[derive(Debug, Clone)]
pub struct BehaviorAnalyzer {
    ceiling_days: f64,
    continuance_keywords: Vec<String>,
}

impl Default for BehaviorAnalyzer {
    fn default() -> Self {
        Self {
            ceiling_days: LATENCY_CEILING_DAYS,
            continuance_keywords: CONTINUANCE_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl BehaviorAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ceiling_days(mut self, ceiling_days: f64) -> Self {
        self.ceiling_days = ceiling_days;
        self
    }

    pub fn with_continuance_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.continuance_keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    /// Thread the events and compute all three statistics
    pub fn analyze(&self, events: &[NormalizedEvent]) -> EmailStats {
        let threads = ThreadBuilder::new().build(events);
        self.analyze_threads(events, &threads)
    }

    /// Compute statistics from events and threads built over them
    pub fn analyze_threads(&self, events: &[NormalizedEvent], threads: &[Thread]) -> EmailStats {
        let samples = self.latency_samples(threads);
        EmailStats {
            counts_by_actor: volume_by_actor(events),
            continuances_by_actor: self.continuances_by_actor(events),
            avg_days_by_actor: average_days_by_actor(&samples),
        }
    }

    /// Reply delays between consecutive messages whose actors differ.
    ///
    /// Only delays in `[0, ceiling)` days are kept.
    pub fn latency_samples(&self, threads: &[Thread]) -> Vec<LatencySample> {
        let mut samples = Vec::new();
        let mut discarded = 0usize;

        for thread in threads {
            let dates = thread_dates(thread);
            for i in 1..thread.events.len() {
                let previous = &thread.events[i - 1];
                let current = &thread.events[i];
                if previous.actor == current.actor {
                    continue;
                }
                let days = dates[i].days_since(&dates[i - 1]);
                if (0.0..self.ceiling_days).contains(&days) {
                    samples.push(LatencySample {
                        actor: current.actor.clone(),
                        days,
                    });
                } else {
                    discarded += 1;
                }
            }
        }

        if discarded > 0 {
            log::debug!(
                "Discarded {discarded} reply gap(s) outside [0, {}) days",
                self.ceiling_days
            );
        }
        samples
    }

    /// Count messages mentioning any continuance keyword, once per message
    pub fn continuances_by_actor(&self, events: &[NormalizedEvent]) -> BTreeMap<String, usize> {
        let mut tally = BTreeMap::new();
        for event in events {
            if self.mentions_continuance(event) {
                *tally.entry(event.actor.clone()).or_insert(0) += 1;
            }
        }
        tally
    }

    pub fn mentions_continuance(&self, event: &NormalizedEvent) -> bool {
        let text = event.searchable_text();
        self.continuance_keywords
            .iter()
            .any(|keyword| text.contains(keyword.as_str()))
    }
}

/// Message count per actor
pub fn volume_by_actor(events: &[NormalizedEvent]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.actor.clone()).or_insert(0) += 1;
    }
    counts
}

/// Mean delay per responding actor, rounded to two decimals
pub fn average_days_by_actor(samples: &[LatencySample]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for sample in samples {
        let entry = sums.entry(sample.actor.as_str()).or_insert((0.0, 0));
        entry.0 += sample.days;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(actor, (sum, count))| (actor.to_string(), round2(sum / count as f64)))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_mailbox::EventKind;
    use pretty_assertions::assert_eq;

    fn event(actor: &str, subject: &str, date: &str, body: &str) -> NormalizedEvent {
        NormalizedEvent {
            external_id: format!("{actor}-{date}"),
            kind: EventKind::Email,
            message_id: None,
            date: date.to_string(),
            actor: actor.to_string(),
            subject: subject.to_string(),
            snippet: String::new(),
            body: body.to_string(),
            source_path: "inbox.mbox".to_string(),
        }
    }

    #[test]
    fn keeps_gaps_under_ceiling_and_drops_the_rest() {
        let events = vec![
            event("A", "Hearing", "2024-01-01T00:00:00Z", ""),
            event("B", "Re: Hearing", "2024-01-04T00:00:00Z", ""),
            event("A", "Re: Hearing", "2024-03-11T00:00:00Z", ""),
        ];
        let analyzer = BehaviorAnalyzer::new();
        let samples = analyzer.latency_samples(&ThreadBuilder::new().build(&events));
        assert_eq!(
            samples,
            vec![LatencySample {
                actor: "B".to_string(),
                days: 3.0
            }]
        );

        let stats = analyzer.analyze(&events);
        assert_eq!(stats.avg_days_by_actor.get("B"), Some(&3.0));
        assert_eq!(stats.avg_days_by_actor.get("A"), None);
    }

    #[test]
    fn latency_window_is_closed_at_zero_and_open_at_ceiling() {
        let samples = |reply_date: &str| {
            let events = vec![
                event("A", "Hearing", "2024-01-01T00:00:00Z", ""),
                event("B", "Re: Hearing", reply_date, ""),
            ];
            BehaviorAnalyzer::new().latency_samples(&ThreadBuilder::new().build(&events))
        };

        let same_instant = samples("2024-01-01T00:00:00Z");
        assert_eq!(same_instant.len(), 1);
        assert_eq!(same_instant[0].days, 0.0);

        // 2024 is a leap year: Jan 1 + 60 days is Mar 1
        assert!(samples("2024-03-01T00:00:00Z").is_empty());

        let just_under = samples("2024-02-29T23:59:00Z");
        assert_eq!(just_under.len(), 1);
        assert!(just_under[0].days < 60.0);
    }

    #[test]
    fn two_unparsable_dates_give_a_zero_day_sample() {
        let events = vec![
            event("A", "s", "garbage", ""),
            event("B", "s", "also garbage", ""),
        ];
        let stats = BehaviorAnalyzer::new().analyze(&events);
        assert_eq!(stats.avg_days_by_actor.get("B"), Some(&0.0));
    }

    #[test]
    fn same_actor_follow_ups_are_not_samples() {
        let events = vec![
            event("A", "s", "2024-01-01T00:00:00Z", ""),
            event("A", "s", "2024-01-02T00:00:00Z", ""),
        ];
        let stats = BehaviorAnalyzer::new().analyze(&events);
        assert!(stats.avg_days_by_actor.is_empty());
        assert_eq!(stats.counts_by_actor.get("A"), Some(&2));
    }

    #[test]
    fn averages_are_rounded_to_two_decimals() {
        let samples = vec![
            LatencySample {
                actor: "B".to_string(),
                days: 1.0,
            },
            LatencySample {
                actor: "B".to_string(),
                days: 0.0,
            },
            LatencySample {
                actor: "B".to_string(),
                days: 0.0,
            },
        ];
        assert_eq!(average_days_by_actor(&samples).get("B"), Some(&0.33));
    }

    #[test]
    fn unparsable_date_reply_is_discarded_as_negative_gap() {
        let events = vec![
            event("A", "s", "2024-01-01T00:00:00Z", ""),
            event("B", "s", "not a date", ""),
        ];
        // sentinel sorts first, so B precedes A and A's gap is decades long
        let stats = BehaviorAnalyzer::new().analyze(&events);
        assert!(stats.avg_days_by_actor.is_empty());
    }

    #[test]
    fn continuance_counts_once_per_message() {
        let events = vec![
            event(
                "Court",
                "Notice",
                "2024-01-01",
                "The hearing will be adjourned; we may postpone or reschedule.",
            ),
            event("Court", "Continuance request", "2024-01-02", ""),
            event("Clerk", "Status", "2024-01-03", "Nothing to report"),
        ];
        let tally = BehaviorAnalyzer::new().continuances_by_actor(&events);
        assert_eq!(tally.get("Court"), Some(&2));
        assert_eq!(tally.get("Clerk"), None);
    }

    #[test]
    fn adjourned_message_counts_exactly_one() {
        let events = vec![event("Judge", "Update", "2024-01-01", "the hearing will be adjourned")];
        let tally = BehaviorAnalyzer::new().continuances_by_actor(&events);
        assert_eq!(tally, BTreeMap::from([("Judge".to_string(), 1)]));
    }

    #[test]
    fn empty_corpus_gives_empty_stats() {
        let stats = BehaviorAnalyzer::new().analyze(&[]);
        assert!(stats.is_empty());
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            serde_json::json!({
                "countsByActor": {},
                "continuancesByActor": {},
                "avgDaysByActor": {}
            })
        );
    }

    #[test]
    fn custom_keywords_replace_defaults() {
        let events = vec![event("A", "Stay of proceedings", "2024-01-01", "")];
        let analyzer = BehaviorAnalyzer::new().with_continuance_keywords(["Stay"]);
        assert_eq!(analyzer.continuances_by_actor(&events).get("A"), Some(&1));
        assert!(!BehaviorAnalyzer::new().mentions_continuance(&events[0]));
    }
}
