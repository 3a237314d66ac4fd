//! External collaborators the coordinator waits on

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use crate::progression::activity::SubscriptionStatus;

/// Source of the player's subscription status
#[async_trait]
pub trait EntitlementSource: Send + Sync {
    /// Current status; may flip in either direction between calls
    async fn status(&self) -> Result<SubscriptionStatus>;
}

/// Confirmation that a reward condition was met (e.g. an ad was watched)
#[async_trait]
pub trait RewardGate: Send + Sync {
    /// `placement` names what the reward unlocks, like `"refresh_quest"`
    async fn confirm(&self, placement: &str) -> Result<bool>;
}

/// Entitlement held in memory, switchable at runtime
#[derive(Debug, Default)]
pub struct StaticEntitlement {
    premium: AtomicBool,
}

impl StaticEntitlement {
    pub fn new(premium: bool) -> Self {
        Self {
            premium: AtomicBool::new(premium),
        }
    }

    pub fn set_premium(&self, premium: bool) {
        self.premium.store(premium, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntitlementSource for StaticEntitlement {
    async fn status(&self) -> Result<SubscriptionStatus> {
        Ok(SubscriptionStatus {
            is_premium_active: self.premium.load(Ordering::SeqCst),
        })
    }
}

/// Gate that confirms (or declines) every request
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Default for AutoConfirm {
    fn default() -> Self {
        AutoConfirm(true)
    }
}

#[async_trait]
impl RewardGate for AutoConfirm {
    async fn confirm(&self, _placement: &str) -> Result<bool> {
        Ok(self.0)
    }
}
