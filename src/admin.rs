//! The shared admin capability.
//!
//! There are no accounts: one secret unlocks one process-wide capability, and it is
//! never persisted. Mutating store APIs take a [`Capability`] argument and return
//! [`Outcome::Skipped`] for guests instead of an error.

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Guest,
    Admin,
}

impl Capability {
    pub fn is_admin(self) -> bool {
        matches!(self, Capability::Admin)
    }
}

/// Result of a gated mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    /// The caller lacked the admin capability; nothing was touched.
    Skipped,
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(v) => Some(v),
            Outcome::Skipped => None,
        }
    }
}

/// Answer from whoever confirms destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed {
            Confirmation::Confirmed
        } else {
            Confirmation::Declined
        }
    }
}

pub struct AdminGate {
    secret: String,
    capability: Capability,
}

impl AdminGate {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            capability: Capability::Guest,
        }
    }

    /// Compares `attempt` verbatim against the configured secret.
    pub fn enter(&mut self, attempt: &str) -> bool {
        if attempt == self.secret {
            self.capability = Capability::Admin;
            info!("admin capability unlocked");
            true
        } else {
            self.capability = Capability::Guest;
            warn!("admin secret mismatch");
            false
        }
    }

    pub fn exit(&mut self) {
        if self.capability.is_admin() {
            info!("admin capability released");
        }
        self.capability = Capability::Guest;
    }

    pub fn capability(&self) -> Capability {
        self.capability
    }

    pub fn is_admin(&self) -> bool {
        self.capability.is_admin()
    }

    /// Swaps the secret, e.g. after the workspace config is read. Drops to guest.
    pub fn rekey(&mut self, secret: impl Into<String>) {
        self.secret = secret.into();
        self.capability = Capability::Guest;
    }
}
