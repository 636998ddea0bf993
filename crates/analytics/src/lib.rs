//! # Evidence Analytics
//!
//! Behavioral statistics over normalized message events.
//!
//! ```text
//! NormalizedEvent[]
//!     │
//!     ├──> Thread Builder (normalized subject key, date ascending)
//!     │      └─> Thread[]
//!     │
//!     └──> Behavior Analyzer
//!            ├─ Response latency per responding actor (gaps in [0, 60) days)
//!            ├─ Continuance mentions per actor (once per message)
//!            └─ Message volume per actor
//! ```

mod behavior;
mod thread;

pub use behavior::{
    average_days_by_actor, volume_by_actor, BehaviorAnalyzer, EmailStats, LatencySample,
    CONTINUANCE_KEYWORDS, LATENCY_CEILING_DAYS,
};
pub use thread::{Thread, ThreadBuilder, ThreadSummary};
