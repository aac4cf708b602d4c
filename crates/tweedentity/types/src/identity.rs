use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TypeError;

/// Identifier of an account on the external system (e.g. a Twitter user id).
///
/// Always stored in canonical lowercase form; construct through [`ExternalId::parse`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    pub const MAX_LEN: usize = 64;

    /// Normalize and validate: trimmed, lowercased, non-empty, no whitespace,
    /// none of the `/`, `@`, `;` delimiters, at most `MAX_LEN` bytes.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let lowered = raw.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(TypeError::InvalidExternalId("empty".into()));
        }
        if lowered.len() > Self::MAX_LEN {
            return Err(TypeError::InvalidExternalId(format!(
                "longer than {} bytes",
                Self::MAX_LEN
            )));
        }
        if lowered
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '/' || c == '@' || c == ';')
        {
            return Err(TypeError::InvalidExternalId(raw.to_string()));
        }
        Ok(Self(lowered))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalId({})", self.0)
    }
}

impl TryFrom<String> for ExternalId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExternalId> for String {
    fn from(value: ExternalId) -> Self {
        value.0
    }
}

/// Opaque id of an off-chain fetch request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a prospective address↔uid pairing may replace existing bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Upgradability {
    Upgradable,
    /// The namespace has no bound store.
    NotUpgradableInStore,
    /// The uid is bound to another address and still time-locked.
    UidNotUpgradable,
    /// The address is bound to another uid and still time-locked.
    AddressNotUpgradable,
    UidAndAddressNotUpgradable,
}

impl Upgradability {
    pub fn is_upgradable(self) -> bool {
        self == Upgradability::Upgradable
    }

    /// Combine the independent verdicts of the two slots.
    pub fn from_locks(uid_locked: bool, address_locked: bool) -> Self {
        match (uid_locked, address_locked) {
            (false, false) => Upgradability::Upgradable,
            (true, false) => Upgradability::UidNotUpgradable,
            (false, true) => Upgradability::AddressNotUpgradable,
            (true, true) => Upgradability::UidAndAddressNotUpgradable,
        }
    }
}

impl fmt::Display for Upgradability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Upgradability::Upgradable => "upgradable",
            Upgradability::NotUpgradableInStore => "not upgradable in store",
            Upgradability::UidNotUpgradable => "uid not upgradable",
            Upgradability::AddressNotUpgradable => "address not upgradable",
            Upgradability::UidAndAddressNotUpgradable => "uid and address not upgradable",
        };
        f.write_str(s)
    }
}

/// Read-only view of a deployed component's pause flag.
pub trait PauseStatus: Send + Sync {
    /// Address the component is deployed at.
    fn deployed_address(&self) -> Address;

    fn is_paused(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn external_id_is_lowercased_once() {
        let id = ExternalId::parse("  George ").unwrap();
        assert_eq!(id.as_str(), "george");
        assert_eq!(id, ExternalId::parse("GEORGE").unwrap());
    }

    #[test]
    fn external_id_rejects_delimiters_and_empty() {
        assert!(ExternalId::parse("").is_err());
        assert!(ExternalId::parse("   ").is_err());
        assert!(ExternalId::parse("a/b").is_err());
        assert!(ExternalId::parse("a@b").is_err());
        assert!(ExternalId::parse("a b").is_err());
        assert!(ExternalId::parse(&"9".repeat(65)).is_err());
    }

    #[test]
    fn external_id_serde_validates() {
        let id: ExternalId = serde_json::from_str("\"ABC\"").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert!(serde_json::from_str::<ExternalId>("\"\"").is_err());
    }

    #[test]
    fn upgradability_from_locks() {
        assert_eq!(Upgradability::from_locks(false, false), Upgradability::Upgradable);
        assert_eq!(Upgradability::from_locks(true, false), Upgradability::UidNotUpgradable);
        assert_eq!(
            Upgradability::from_locks(false, true),
            Upgradability::AddressNotUpgradable
        );
        assert_eq!(
            Upgradability::from_locks(true, true),
            Upgradability::UidAndAddressNotUpgradable
        );
        assert!(!Upgradability::NotUpgradableInStore.is_upgradable());
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }

    proptest! {
        #[test]
        fn parsing_is_case_insensitive(s in "[a-zA-Z0-9_]{1,32}") {
            let upper = ExternalId::parse(&s.to_uppercase()).unwrap();
            let lower = ExternalId::parse(&s.to_lowercase()).unwrap();
            prop_assert_eq!(upper, lower);
        }
    }
}
