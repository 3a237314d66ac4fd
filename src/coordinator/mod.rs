//! Progression Coordinator
//!
//! Single-writer entry point for everything that changes progression state.
//! [`ProgressionEngine`] is the synchronous core; [`Coordinator`] runs it as
//! a tokio task behind a command queue and owns persistence and the
//! external gates.

pub mod actor;
pub mod engine;
pub mod gates;

pub use actor::{Coordinator, CoordinatorHandle};
pub use engine::{PendingWrites, ProgressionEngine};
pub use gates::{AutoConfirm, EntitlementSource, RewardGate, StaticEntitlement};

use crate::progression::challenges::ChallengeError;
use crate::progression::pets::PetError;
use crate::progression::quests::QuestError;

/// Errors returned to callers of the coordinator handle
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("progression coordinator is not running")]
    Closed,

    #[error("reward was not confirmed")]
    RewardDeclined,

    #[error("reward gate failed: {0}")]
    RewardGate(String),

    #[error(transparent)]
    Quest(#[from] QuestError),

    #[error(transparent)]
    Challenge(#[from] ChallengeError),

    #[error(transparent)]
    Pet(#[from] PetError),
}
