//! Progression subsystems
//!
//! Pure, synchronous state machines. Each owns one persisted entity and
//! knows nothing about storage, clocks, or the others; the coordinator
//! drives them in a fixed order.

pub mod achievements;
pub mod activity;
pub mod challenges;
pub mod delta;
pub mod levels;
pub mod pets;
pub mod quests;
pub mod rewards;
pub mod state;
pub mod streaks;

pub use activity::{ActivitySnapshot, SubscriptionStatus};
pub use delta::{ProgressionDelta, ProgressionEvent, ProgressionSnapshot, XpSource};
pub use levels::{level_of, rank_of, PlayerProfile, Rank, XpLedger};
pub use state::ProgressionState;
