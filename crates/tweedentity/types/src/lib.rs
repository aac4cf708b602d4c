//! # tweedentity-types
//!
//! Value types shared by every Tweedentity component.
//!
//! - [`Address`]: 20-byte ledger address
//! - [`ExternalId`]: external-system identifier, lowercase-normalized once at the write boundary
//! - [`AppRegistration`] / [`NamespaceId`]: application namespaces
//! - [`Upgradability`]: the time-lock verdict for a prospective pairing
//! - [`AuthLevel`], [`Tier`], [`AuthorizationTiers`]: configurable authorization tiers
//! - [`Clock`]: injected time source
//! - [`Event`] / [`EventLog`]: notifications emitted by state changes
//! - [`TweedentityConfig`]: TOML-loadable configuration

#![deny(unsafe_code)]

pub mod address;
pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod tiers;

pub use address::Address;
pub use app::{AppId, AppRegistration, NamespaceId};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock, Timestamp};
pub use config::{
    ClaimerConfig, RefundPolicy, RegistryConfig, StoreConfig, TweedentityConfig,
    DEFAULT_MINIMUM_TIME_BEFORE_UPDATE,
};
pub use error::{ConfigError, TypeError};
pub use events::{Event, EventLog};
pub use identity::{ExternalId, PauseStatus, RequestId, Upgradability};
pub use tiers::{AuthLevel, AuthorizationTiers, Tier};
