use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::TypeError;

/// Numeric application id (e.g. 1 for twitter).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub u64);

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Namespace identifier: keccak256 of the lowercase app nickname.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamespaceId(pub [u8; 32]);

impl NamespaceId {
    pub fn derive(nickname: &str) -> Self {
        let digest = Keccak256::digest(nickname.to_lowercase().as_bytes());
        Self(digest.into())
    }
}

impl fmt::Display for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for NamespaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespaceId({})", self)
    }
}

/// Binding of an application nickname to its namespace and numeric id.
///
/// Set once on a store; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRegistration {
    pub nickname: String,
    pub namespace_id: NamespaceId,
    pub app_id: AppId,
}

impl AppRegistration {
    /// Validate and build a registration. The nickname is lowercased.
    pub fn new(nickname: &str, app_id: u64) -> Result<Self, TypeError> {
        let nickname = normalize_nickname(nickname)?;
        if app_id == 0 {
            return Err(TypeError::InvalidAppId);
        }
        Ok(Self {
            namespace_id: NamespaceId::derive(&nickname),
            nickname,
            app_id: AppId(app_id),
        })
    }
}

/// Lowercase and validate an app nickname: non-empty, `[a-z0-9_-]`.
pub fn normalize_nickname(nickname: &str) -> Result<String, TypeError> {
    let lowered = nickname.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(TypeError::InvalidNickname("empty".into()));
    }
    if !lowered
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(TypeError::InvalidNickname(nickname.to_string()));
    }
    Ok(lowered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_normalizes_nickname() {
        let app = AppRegistration::new("Twitter", 1).unwrap();
        assert_eq!(app.nickname, "twitter");
        assert_eq!(app.namespace_id, NamespaceId::derive("twitter"));
        assert_eq!(app.app_id, AppId(1));
    }

    #[test]
    fn registration_rejects_empty_nickname_and_zero_id() {
        assert!(matches!(
            AppRegistration::new("", 1),
            Err(TypeError::InvalidNickname(_))
        ));
        assert!(matches!(
            AppRegistration::new("github", 0),
            Err(TypeError::InvalidAppId)
        ));
        assert!(AppRegistration::new("git hub", 2).is_err());
    }

    #[test]
    fn namespace_ids_differ_per_nickname() {
        assert_ne!(NamespaceId::derive("twitter"), NamespaceId::derive("github"));
        assert_eq!(NamespaceId::derive("GitHub"), NamespaceId::derive("github"));
    }
}
