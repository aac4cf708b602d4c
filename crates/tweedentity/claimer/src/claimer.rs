use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tweedentity_auth::AuthorizationLedger;
use tweedentity_crypto::{canonical_message, is_signed_by};
use tweedentity_manager::{SetIdentityOutcome, SharedManager};
use tweedentity_types::app::normalize_nickname;
use tweedentity_types::{
    Address, ClaimerConfig, Event, EventLog, ExternalId, RequestId, SharedClock, Timestamp,
    Upgradability,
};

use crate::error::ClaimError;
use crate::proof::extract_signature;
use crate::provider::{FeeQuote, FetchProvider, FetchQuery, FetchedPost};

/// Arguments of a claim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub namespace: String,
    pub post_id: String,
    pub fee_rate: u128,
    pub fee_budget: u128,
}

/// A request waiting for its callback.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub claimant: Address,
    pub namespace: String,
    pub post_id: String,
    pub requested_at: Timestamp,
    pub prepaid: u128,
}

/// Why a consumed request did not bind an identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    /// The fetched post carried no well-formed proof or no author id.
    MalformedContent,
    /// The signature over the post author's id does not recover to the
    /// claimant.
    SignatureMismatch,
    NamespaceUnbound,
    ManagerPaused,
    ManagerUnset,
    NotUpgradable(Upgradability),
    CommitFailed(String),
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::MalformedContent => f.write_str("malformed content"),
            RejectionReason::SignatureMismatch => f.write_str("signature mismatch"),
            RejectionReason::NamespaceUnbound => f.write_str("namespace unbound"),
            RejectionReason::ManagerPaused => f.write_str("manager paused"),
            RejectionReason::ManagerUnset => f.write_str("manager unset"),
            RejectionReason::NotUpgradable(reason) => write!(f, "{}", reason),
            RejectionReason::CommitFailed(err) => write!(f, "commit failed: {}", err),
        }
    }
}

/// Observable state of a request id.
///
/// Ids the claimer never issued are `Idle` from the caller's point of view
/// and report `None`. The callback-received phase is never observable: a
/// callback is processed to a terminal state within one call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationState {
    RequestIssued,
    Confirmed,
    Rejected(RejectionReason),
}

/// Terminal record of a consumed request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub request_id: RequestId,
    pub claimant: Address,
    pub namespace: String,
    pub uid: Option<ExternalId>,
    pub settled_at: Timestamp,
    pub result: Result<(), RejectionReason>,
}

impl VerificationOutcome {
    /// Whether the identity was bound.
    pub fn is_confirmed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Ownership Claimer: two-phase proof-of-ownership state machine.
///
/// `claim_ownership` records a pending verification and asks the provider to
/// fetch the claimant's post. `on_fetch_result` consumes it exactly once,
/// checks that the embedded signature covers the post author's id and
/// recovers to the claimant, then commits that author id through the
/// manager. Every precondition checked at claim time is checked again at
/// callback time.
pub struct OwnershipClaimer<P: FetchProvider> {
    address: Address,
    auth: AuthorizationLedger,
    manager: Option<SharedManager>,
    provider: P,
    config: ClaimerConfig,
    pending: HashMap<RequestId, PendingVerification>,
    settled: HashMap<RequestId, VerificationOutcome>,
    refunds: HashMap<Address, u128>,
    retained: u128,
    clock: SharedClock,
    events: EventLog,
}

impl<P: FetchProvider> OwnershipClaimer<P> {
    /// A claimer with no manager attached yet.
    pub fn new(address: Address, owner: Address, provider: P, config: &ClaimerConfig, clock: SharedClock) -> Self {
        Self {
            address,
            auth: AuthorizationLedger::new(owner),
            manager: None,
            provider,
            config: config.clone(),
            pending: HashMap::new(),
            settled: HashMap::new(),
            refunds: HashMap::new(),
            retained: 0,
            clock,
            events: EventLog::new(),
        }
    }

    /// Attach the manager identities are committed through. Owner only.
    pub fn set_manager(&mut self, caller: &Address, manager: SharedManager) -> Result<(), ClaimError> {
        self.auth.require_owner(caller)?;
        let manager_address = manager.address();
        info!(claimer = %self.address, manager = %manager_address, "Claimer manager set");
        self.manager = Some(manager);
        Ok(())
    }

    // =========================================================================
    // PHASE 1: REQUEST
    // =========================================================================

    /// Start verifying that `caller` owns the account behind `post_id`.
    ///
    /// Returns as soon as the fetch is issued. The outcome is only known
    /// once the provider calls back.
    pub fn claim_ownership(
        &mut self,
        caller: &Address,
        request: ClaimRequest,
        attached: u128,
    ) -> Result<RequestId, ClaimError> {
        if caller.is_zero() {
            return Err(ClaimError::ZeroAddress);
        }
        let post_id = self.validate_post_id(&request.post_id)?;
        let namespace = normalize_nickname(&request.namespace)?;

        let manager = self.manager.as_ref().ok_or(ClaimError::ManagerUnset)?;
        {
            let manager = manager.read()?;
            if !manager.is_store_bound(&namespace) {
                return Err(ClaimError::NamespaceUnbound(namespace));
            }
            if manager.is_paused() {
                return Err(ClaimError::ManagerPaused);
            }
        }

        let fee = FeeQuote {
            fee_rate: request.fee_rate,
            fee_budget: request.fee_budget,
        };
        let required = fee.total().ok_or(ClaimError::FeeOverflow)?;
        if attached < required {
            return Err(ClaimError::InsufficientFunds { required, attached });
        }

        let request_id = self.provider.request(
            FetchQuery {
                namespace: namespace.clone(),
                post_id: post_id.clone(),
            },
            fee,
        )?;
        if self.pending.contains_key(&request_id) || self.settled.contains_key(&request_id) {
            return Err(ClaimError::DuplicateRequest(request_id));
        }

        let requested_at = self.clock.now();
        info!(
            request = %request_id,
            claimant = %caller,
            namespace = %namespace,
            post = %post_id,
            "Ownership verification started"
        );
        self.events.emit(Event::VerificationStarted {
            request_id: request_id.clone(),
            claimant: *caller,
            namespace: namespace.clone(),
            post_id: post_id.clone(),
            requested_at,
        });
        self.pending.insert(
            request_id.clone(),
            PendingVerification {
                claimant: *caller,
                namespace,
                post_id,
                requested_at,
                prepaid: attached,
            },
        );
        Ok(request_id)
    }

    fn validate_post_id(&self, raw: &str) -> Result<String, ClaimError> {
        let post_id = raw.trim();
        let well_formed = !post_id.is_empty()
            && post_id.len() <= self.config.max_post_id_len
            && post_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if well_formed {
            Ok(post_id.to_string())
        } else {
            Err(ClaimError::InvalidPostId(raw.to_string()))
        }
    }

    // =========================================================================
    // PHASE 2: CALLBACK
    // =========================================================================

    /// Deliver the fetched post for `request_id`.
    ///
    /// Calls from anyone but the provider's callback address, and ids that
    /// are unknown or already consumed, are ignored and return `None`.
    /// Otherwise the request is consumed and its outcome returned; a failed
    /// verification is an outcome, not an error.
    pub fn on_fetch_result(
        &mut self,
        caller: &Address,
        request_id: &RequestId,
        post: &FetchedPost,
    ) -> Option<VerificationOutcome> {
        if *caller != self.provider.callback_address() {
            warn!(caller = %caller, request = %request_id, "Callback from unexpected address ignored");
            return None;
        }
        let Some(pending) = self.pending.remove(request_id) else {
            debug!(request = %request_id, "Callback for unknown request ignored");
            return None;
        };

        let (uid, result) = match self.verify(&pending, post) {
            Ok(uid) => (Some(uid), Ok(())),
            Err((uid, reason)) => (uid, Err(reason)),
        };

        let outcome = VerificationOutcome {
            request_id: request_id.clone(),
            claimant: pending.claimant,
            namespace: pending.namespace.clone(),
            uid: uid.clone(),
            settled_at: self.clock.now(),
            result,
        };

        match &outcome.result {
            Ok(()) => {
                self.retained = self.retained.saturating_add(pending.prepaid);
                info!(request = %request_id, claimant = %pending.claimant, namespace = %pending.namespace, "Ownership confirmed");
            }
            Err(reason) => {
                warn!(request = %request_id, claimant = %pending.claimant, reason = %reason, "Ownership rejected");
                self.settle_rejected_funds(&pending);
            }
        }

        self.events.emit(Event::OwnershipConfirmed {
            request_id: request_id.clone(),
            claimant: pending.claimant,
            uid,
            success: outcome.is_confirmed(),
        });
        self.settled.insert(request_id.clone(), outcome.clone());
        Some(outcome)
    }

    /// Re-check everything against current state and commit.
    ///
    /// The uid is the author id reported by the provider; the post text only
    /// supplies the signature. On rejection the uid is returned alongside the
    /// reason whenever the post got far enough to name one.
    fn verify(
        &self,
        pending: &PendingVerification,
        post: &FetchedPost,
    ) -> Result<ExternalId, (Option<ExternalId>, RejectionReason)> {
        let author_id = post.author_id.trim();
        let uid = ExternalId::parse(author_id).map_err(|_| (None, RejectionReason::MalformedContent))?;
        let signature = extract_signature(&post.description).map_err(|err| {
            debug!(error = %err, "Proof extraction failed");
            (Some(uid.clone()), RejectionReason::MalformedContent)
        })?;

        let message = canonical_message(&pending.namespace, author_id);
        if !is_signed_by(&message, &signature, &pending.claimant) {
            return Err((Some(uid), RejectionReason::SignatureMismatch));
        }

        let reject = |reason| (Some(uid.clone()), reason);
        let manager = self
            .manager
            .as_ref()
            .ok_or_else(|| reject(RejectionReason::ManagerUnset))?;
        let mut manager = manager
            .write()
            .map_err(|err| reject(RejectionReason::CommitFailed(err.to_string())))?;
        if !manager.is_store_bound(&pending.namespace) {
            return Err(reject(RejectionReason::NamespaceUnbound));
        }
        if manager.is_paused() {
            return Err(reject(RejectionReason::ManagerPaused));
        }

        match manager.set_identity(&self.address, &pending.namespace, pending.claimant, uid.as_str()) {
            Ok(SetIdentityOutcome::Committed) => Ok(uid.clone()),
            Ok(SetIdentityOutcome::NotUpgradable(reason)) => {
                Err(reject(RejectionReason::NotUpgradable(reason)))
            }
            Err(err) => Err(reject(RejectionReason::CommitFailed(err.to_string()))),
        }
    }

    fn settle_rejected_funds(&mut self, pending: &PendingVerification) {
        let refund = self.config.refund_policy.refund_for(pending.prepaid);
        self.retained = self
            .retained
            .saturating_add(pending.prepaid.saturating_sub(refund));
        if refund == 0 {
            return;
        }
        let balance = self.refunds.entry(pending.claimant).or_insert(0);
        *balance = balance.saturating_add(refund);
        info!(claimant = %pending.claimant, amount = %refund, "Refund credited");
        self.events.emit(Event::RefundCredited {
            claimant: pending.claimant,
            amount: refund,
        });
    }

    // =========================================================================
    // FUNDS
    // =========================================================================

    /// Refunds credited to `claimant` and not yet withdrawn.
    pub fn refund_balance(&self, claimant: &Address) -> u128 {
        self.refunds.get(claimant).copied().unwrap_or(0)
    }

    /// Pay out the caller's accumulated refunds.
    pub fn withdraw_refund(&mut self, caller: &Address) -> Result<u128, ClaimError> {
        let amount = self
            .refunds
            .remove(caller)
            .ok_or(ClaimError::NoRefund(*caller))?;
        info!(claimant = %caller, amount = %amount, "Refund withdrawn");
        Ok(amount)
    }

    /// Prepaid funds kept for performed round trips.
    pub fn retained_funds(&self) -> u128 {
        self.retained
    }

    // =========================================================================
    // READS
    // =========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.auth.owner()
    }

    /// Address of the attached manager.
    pub fn manager_address(&self) -> Option<Address> {
        self.manager.as_ref().map(|m| m.address())
    }

    pub fn config(&self) -> &ClaimerConfig {
        &self.config
    }

    /// Where `request_id` stands, or `None` if it was never issued.
    pub fn verification_state(&self, request_id: &RequestId) -> Option<VerificationState> {
        if self.pending.contains_key(request_id) {
            return Some(VerificationState::RequestIssued);
        }
        self.settled.get(request_id).map(|outcome| match &outcome.result {
            Ok(()) => VerificationState::Confirmed,
            Err(reason) => VerificationState::Rejected(reason.clone()),
        })
    }

    /// The verification waiting on `request_id`.
    pub fn pending(&self, request_id: &RequestId) -> Option<&PendingVerification> {
        self.pending.get(request_id)
    }

    /// How `request_id` was settled.
    pub fn outcome(&self, request_id: &RequestId) -> Option<&VerificationOutcome> {
        self.settled.get(request_id)
    }

    /// Verifications still waiting for a callback.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::QueuedFetchProvider;
    use tweedentity_types::{ManualClock, RefundPolicy};

    fn owner() -> Address {
        Address::from_low_u64(1)
    }

    fn oracle() -> Address {
        Address::from_low_u64(99)
    }

    fn claimer(config: &ClaimerConfig) -> OwnershipClaimer<QueuedFetchProvider> {
        OwnershipClaimer::new(
            Address::from_low_u64(20),
            owner(),
            QueuedFetchProvider::new(oracle()),
            config,
            ManualClock::new(0).shared(),
        )
    }

    fn request(post_id: &str) -> ClaimRequest {
        ClaimRequest {
            namespace: "twitter".into(),
            post_id: post_id.into(),
            fee_rate: 4,
            fee_budget: 10,
        }
    }

    #[test]
    fn claim_without_manager_fails() {
        let mut c = claimer(&ClaimerConfig::default());
        assert_eq!(
            c.claim_ownership(&Address::from_low_u64(5), request("981263529196924928"), 40),
            Err(ClaimError::ManagerUnset)
        );
        assert_eq!(c.provider().issued(), 0);
    }

    #[test]
    fn post_id_is_validated_first() {
        let mut c = claimer(&ClaimerConfig::default());
        let user = Address::from_low_u64(5);
        assert!(matches!(
            c.claim_ownership(&user, request(""), 40),
            Err(ClaimError::InvalidPostId(_))
        ));
        assert!(matches!(
            c.claim_ownership(&user, request("12 34"), 40),
            Err(ClaimError::InvalidPostId(_))
        ));
        assert!(matches!(
            c.claim_ownership(&user, request(&"1".repeat(65)), 40),
            Err(ClaimError::InvalidPostId(_))
        ));
        assert_eq!(
            c.claim_ownership(&Address::ZERO, request("1"), 40),
            Err(ClaimError::ZeroAddress)
        );
    }

    #[test]
    fn spoofed_and_unknown_callbacks_are_ignored() {
        let mut c = claimer(&ClaimerConfig::default());
        let id = RequestId::new("nope");
        let post = FetchedPost::new("1", "x");
        assert_eq!(c.on_fetch_result(&Address::from_low_u64(5), &id, &post), None);
        assert_eq!(c.on_fetch_result(&oracle(), &id, &post), None);
        assert!(c.events().is_empty());
        assert_eq!(c.verification_state(&id), None);
    }

    #[test]
    fn rejected_funds_follow_policy() {
        let pending = PendingVerification {
            claimant: Address::from_low_u64(5),
            namespace: "twitter".into(),
            post_id: "1".into(),
            requested_at: 0,
            prepaid: 200,
        };

        let mut retain = claimer(&ClaimerConfig::default());
        retain.settle_rejected_funds(&pending);
        assert_eq!(retain.refund_balance(&pending.claimant), 0);
        assert_eq!(retain.retained_funds(), 200);

        let mut partial = claimer(&ClaimerConfig {
            refund_policy: RefundPolicy::Partial { percent: 25 },
            ..Default::default()
        });
        partial.settle_rejected_funds(&pending);
        assert_eq!(partial.refund_balance(&pending.claimant), 50);
        assert_eq!(partial.retained_funds(), 150);
        assert_eq!(partial.withdraw_refund(&pending.claimant), Ok(50));
        assert_eq!(
            partial.withdraw_refund(&pending.claimant),
            Err(ClaimError::NoRefund(pending.claimant))
        );
    }

    #[test]
    fn refund_is_capped_at_prepaid() {
        let pending = PendingVerification {
            claimant: Address::from_low_u64(5),
            namespace: "twitter".into(),
            post_id: "1".into(),
            requested_at: 0,
            prepaid: 680,
        };
        let mut c = claimer(&ClaimerConfig {
            refund_policy: RefundPolicy::Partial { percent: 200 },
            ..Default::default()
        });
        c.settle_rejected_funds(&pending);
        assert_eq!(c.refund_balance(&pending.claimant), 680);
        assert_eq!(c.retained_funds(), 0);
    }

    #[test]
    fn only_owner_sets_manager() {
        use tweedentity_manager::IdentityManager;
        use tweedentity_types::TweedentityConfig;

        let mut c = claimer(&ClaimerConfig::default());
        let manager = SharedManager::new(IdentityManager::new(
            Address::from_low_u64(10),
            owner(),
            &TweedentityConfig::default(),
            ManualClock::new(0).shared(),
        ));
        assert!(matches!(
            c.set_manager(&Address::from_low_u64(5), manager.clone()),
            Err(ClaimError::Auth(_))
        ));
        assert_eq!(c.manager_address(), None);
        c.set_manager(&owner(), manager).unwrap();
        assert_eq!(c.manager_address(), Some(Address::from_low_u64(10)));
    }
}
