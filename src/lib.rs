//! StepQuest - step-tracking progression engine
//!
//! Turns activity snapshots from a health-data source into player progression:
//! XP and levels, achievements, goal-day streaks, daily quests, personal and
//! group challenges, and a pet that grows alongside the player.
//!
//! ## Structure
//!
//! - [`progression`]: the subsystems as plain synchronous state machines
//! - [`coordinator`]: the single write path that runs them in order, commits
//!   atomically, persists, and publishes snapshots and deltas
//! - [`store`]: versioned entity blobs (SQLite or in-memory)
//! - [`clock`]: injected time source

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod progression;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorError, CoordinatorHandle, ProgressionEngine};
pub use progression::{
    ActivitySnapshot, PlayerProfile, ProgressionDelta, ProgressionEvent, ProgressionSnapshot, Rank,
    SubscriptionStatus,
};
pub use store::{EntityKey, MemoryStore, PersistenceStore, SqliteStore, StoreError};
