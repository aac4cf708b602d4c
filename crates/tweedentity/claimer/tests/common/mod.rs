#![allow(dead_code)]

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tweedentity_claimer::{ClaimRequest, FetchProvider, FetchedPost, OwnershipClaimer};
use tweedentity_manager::{IdentityManager, SharedManager};
use tweedentity_store::IdentityStore;
use tweedentity_types::{Address, ManualClock, TweedentityConfig};

pub const FIXTURE_POST_ID: &str = "981263529196924928";
pub const FIXTURE_UID: &str = "137042753";
pub const FIXTURE_SIGNER: &str = "0x185f86b29bce5b40e54600959c710f1314fa5f45";
pub const FIXTURE_SIG: &str = "0xabb708bb366a13dd7990883a696f1502d64db4a1de45bfb6de1c8f1e37cb8ebc7c9190a5051615bd7623f7e4e3cec33f603ba363d111aa50787e43a82d75db391c";

pub const DAY: u64 = 86_400;

pub fn owner() -> Address {
    Address::from_low_u64(1)
}

pub fn manager_address() -> Address {
    Address::from_low_u64(10)
}

pub fn claimer_address() -> Address {
    Address::from_low_u64(20)
}

pub fn oracle() -> Address {
    Address::from_low_u64(99)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

pub struct Deployment<P: FetchProvider> {
    pub clock: ManualClock,
    pub manager: SharedManager,
    pub claimer: OwnershipClaimer<P>,
}

/// A twitter store behind a manager, with the claimer wired in.
pub fn deploy<P: FetchProvider>(provider: P, config: &TweedentityConfig) -> Deployment<P> {
    init_tracing();
    let clock = ManualClock::new(1_600_000_000);

    let mut store = IdentityStore::new(
        Address::from_low_u64(100),
        owner(),
        &config.store_config(),
        clock.shared(),
    );
    store.set_app(&owner(), "twitter", 1).unwrap();
    store.set_manager(&owner(), manager_address()).unwrap();

    let mut manager = IdentityManager::new(manager_address(), owner(), config, clock.shared());
    manager.bind_store(&owner(), store).unwrap();
    manager.set_claimer(&owner(), claimer_address()).unwrap();
    let manager = SharedManager::new(manager);

    let mut claimer = OwnershipClaimer::new(
        claimer_address(),
        owner(),
        provider,
        &config.claimer,
        clock.shared(),
    );
    claimer.set_manager(&owner(), manager.clone()).unwrap();

    Deployment {
        clock,
        manager,
        claimer,
    }
}

pub fn claim(post_id: &str) -> ClaimRequest {
    ClaimRequest {
        namespace: "twitter".into(),
        post_id: post_id.into(),
        fee_rate: 4_000_000_000,
        fee_budget: 170_000,
    }
}

pub const CLAIM_VALUE: u128 = 4_000_000_000 * 170_000;

/// The fixture post as the provider reports it: authored by the fixture
/// account, its description carrying the fixture signature.
pub fn fixture_post() -> FetchedPost {
    FetchedPost::new(FIXTURE_UID, format!("\"{}\"", FIXTURE_SIG))
}
