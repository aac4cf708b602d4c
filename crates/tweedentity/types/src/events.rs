use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::clock::Timestamp;
use crate::identity::{ExternalId, RequestId, Upgradability};
use crate::tiers::AuthLevel;

/// Notifications emitted by state changes, the analogue of contract events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Authorized {
        address: Address,
        level: AuthLevel,
    },
    Deauthorized {
        address: Address,
    },
    AppSet {
        nickname: String,
        app_id: u64,
    },
    IdentitySet {
        address: Address,
        uid: ExternalId,
    },
    IdentityUnset {
        address: Address,
        uid: ExternalId,
    },
    IdentityNotUpgradable {
        namespace: String,
        address: Address,
        uid: ExternalId,
        reason: Upgradability,
    },
    MinimumTimeChanged {
        seconds: u64,
    },
    StoreBound {
        namespace: String,
        store: Address,
    },
    ManagerSet {
        manager: Address,
    },
    ClaimerSet {
        claimer: Address,
    },
    Paused,
    Unpaused,
    VerificationStarted {
        request_id: RequestId,
        claimant: Address,
        namespace: String,
        post_id: String,
        requested_at: Timestamp,
    },
    OwnershipConfirmed {
        request_id: RequestId,
        claimant: Address,
        uid: Option<ExternalId>,
        success: bool,
    },
    RefundCredited {
        claimant: Address,
        amount: u128,
    },
}

/// Append-only event log owned by a component.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Hand the accumulated events to the caller, leaving the log empty.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.events)
    }
}
