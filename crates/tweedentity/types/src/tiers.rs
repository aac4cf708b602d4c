use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer authorization level. Zero means unauthorized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthLevel(pub u32);

impl AuthLevel {
    pub const NONE: AuthLevel = AuthLevel(0);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for AuthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named privilege tiers. Their numeric levels come from [`AuthorizationTiers`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Administrative removal of identities.
    CustomerService,
    /// Writing verified identities.
    Verifier,
    /// Changing the time-lock parameter.
    Developer,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::CustomerService => f.write_str("customer_service"),
            Tier::Verifier => f.write_str("verifier"),
            Tier::Developer => f.write_str("developer"),
        }
    }
}

/// Minimum level required by each tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizationTiers {
    pub customer_service: AuthLevel,
    pub verifier: AuthLevel,
    pub developer: AuthLevel,
}

impl AuthorizationTiers {
    pub fn level(&self, tier: Tier) -> AuthLevel {
        match tier {
            Tier::CustomerService => self.customer_service,
            Tier::Verifier => self.verifier,
            Tier::Developer => self.developer,
        }
    }

    /// The highest configured level; granted to a store's manager.
    pub fn highest(&self) -> AuthLevel {
        self.customer_service.max(self.verifier).max(self.developer)
    }

    pub fn validate(&self) -> Result<(), String> {
        for tier in [Tier::CustomerService, Tier::Verifier, Tier::Developer] {
            if self.level(tier).is_none() {
                return Err(format!("tier {} must have a level above zero", tier));
            }
        }
        Ok(())
    }
}

impl Default for AuthorizationTiers {
    fn default() -> Self {
        Self {
            customer_service: AuthLevel(30),
            verifier: AuthLevel(40),
            developer: AuthLevel(50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tiers_are_ordered() {
        let tiers = AuthorizationTiers::default();
        assert!(tiers.customer_service < tiers.verifier);
        assert!(tiers.verifier < tiers.developer);
        assert_eq!(tiers.highest(), tiers.developer);
        assert!(tiers.validate().is_ok());
    }

    #[test]
    fn zero_tier_is_invalid() {
        let tiers = AuthorizationTiers {
            verifier: AuthLevel::NONE,
            ..Default::default()
        };
        assert!(tiers.validate().is_err());
    }
}
