//! Retrograph Memory Layer
//!
//! Data model and persistence for history reconstructed from version
//! control when no directly observed activity exists yet.
//!
//! ## Features
//!
//! - **Synthetic events** - Confidence-scored activity records traced back to commits
//! - **Retroactive patterns** - Recurring behaviors with evidence links into the events
//! - **Temporal decay** - Exponential age weighting with a floor
//! - **Additive JSON persistence** - Day-partitioned event files and a single pattern document
//!
//! ## Example
//!
//! ```ignore
//! use retrograph_memory::{EventStore, PatternStore};
//!
//! let events = EventStore::new(root.join("events"));
//! if !events.has_observed_events()? {
//!     events.merge_day("2024-05-02", &synthetic)?;
//! }
//! PatternStore::new(root.join("patterns.json")).merge(&patterns)?;
//! ```

pub mod error;
pub mod event;
pub mod pattern;
pub mod storage;
pub mod temporal;

// Re-exports for convenience
pub use error::MemoryError;
pub use event::{date_key, short_hash, CommitCategory, EventMetadata, EventType, SyntheticEvent};
pub use pattern::{PatternCategory, RetroactivePattern, PROMOTION_THRESHOLD};
pub use storage::{is_synthetic, EventStore, EventStoreStats, PatternStore};
pub use temporal::{months_between, TemporalWeighter};
