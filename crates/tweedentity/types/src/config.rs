//! Configuration for a Tweedentity deployment.
//!
//! Every section has defaults, so an empty TOML document is a valid
//! configuration. Levels and the time lock are configuration, never constants
//! baked into the components.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::tiers::AuthorizationTiers;

/// One day, in seconds.
pub const DEFAULT_MINIMUM_TIME_BEFORE_UPDATE: u64 = 86_400;

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweedentityConfig {
    pub tiers: AuthorizationTiers,
    pub store: StoreConfig,
    pub claimer: ClaimerConfig,
    pub registry: RegistryConfig,
}

impl TweedentityConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: TweedentityConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tiers.validate().map_err(ConfigError::Invalid)?;
        if let RefundPolicy::Partial { percent } = self.claimer.refund_policy {
            if percent > 100 {
                return Err(ConfigError::Invalid(format!(
                    "refund percent {} exceeds 100",
                    percent
                )));
            }
        }
        if self.registry.required_namespaces.iter().any(|ns| ns.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "required namespaces must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The store section with the shared tiers folded in.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            tiers: self.tiers,
            ..self.store.clone()
        }
    }
}

/// Per-store settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Seconds that must elapse before a bound slot may be re-associated.
    pub minimum_time_before_update: u64,
    /// Filled from the top-level `tiers` section by [`TweedentityConfig::store_config`].
    #[serde(skip)]
    pub tiers: AuthorizationTiers,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            minimum_time_before_update: DEFAULT_MINIMUM_TIME_BEFORE_UPDATE,
            tiers: AuthorizationTiers::default(),
        }
    }
}

/// What happens to prepaid round-trip funds when a verification is rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RefundPolicy {
    /// Keep everything: the fetch and callback were performed regardless.
    #[default]
    Retain,
    /// Credit `percent` of the prepaid amount back to the claimant.
    Partial { percent: u8 },
}

impl RefundPolicy {
    /// Amount credited back for a rejected claim. Never exceeds `prepaid`;
    /// percentages above 100 count as 100.
    pub fn refund_for(&self, prepaid: u128) -> u128 {
        match self {
            RefundPolicy::Retain => 0,
            RefundPolicy::Partial { percent } => {
                let percent = u128::from((*percent).min(100));
                prepaid / 100 * percent + prepaid % 100 * percent / 100
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimerConfig {
    pub refund_policy: RefundPolicy,
    /// Longest accepted external post id.
    pub max_post_id_len: usize,
}

impl Default for ClaimerConfig {
    fn default() -> Self {
        Self {
            refund_policy: RefundPolicy::Retain,
            max_post_id_len: 64,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Namespaces that must have a store before the registry reports ready.
    pub required_namespaces: Vec<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            required_namespaces: vec!["twitter".into(), "github".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiers::AuthLevel;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = TweedentityConfig::from_toml_str("").unwrap();
        assert_eq!(config, TweedentityConfig::default());
        assert_eq!(
            config.store.minimum_time_before_update,
            DEFAULT_MINIMUM_TIME_BEFORE_UPDATE
        );
        assert_eq!(config.claimer.refund_policy, RefundPolicy::Retain);
    }

    #[test]
    fn overrides_are_applied() {
        let config = TweedentityConfig::from_toml_str(
            r#"
            [tiers]
            verifier = 10

            [store]
            minimum_time_before_update = 60

            [claimer.refund_policy]
            mode = "partial"
            percent = 25

            [registry]
            required_namespaces = ["twitter"]
            "#,
        )
        .unwrap();

        assert_eq!(config.tiers.verifier, AuthLevel(10));
        assert_eq!(config.tiers.developer, AuthLevel(50));
        assert_eq!(config.store.minimum_time_before_update, 60);
        assert_eq!(
            config.claimer.refund_policy,
            RefundPolicy::Partial { percent: 25 }
        );
        assert_eq!(config.registry.required_namespaces, vec!["twitter"]);

        let store = config.store_config();
        assert_eq!(store.tiers.verifier, AuthLevel(10));
        assert_eq!(store.minimum_time_before_update, 60);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            TweedentityConfig::from_toml_str("[claimer.refund_policy]\nmode = \"partial\"\npercent = 150"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TweedentityConfig::from_toml_str("[tiers]\nverifier = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TweedentityConfig::from_toml_str("[store]\nminimum_time_before_update = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nminimum_time_before_update = 1").unwrap();
        let config = TweedentityConfig::load(file.path()).unwrap();
        assert_eq!(config.store.minimum_time_before_update, 1);
    }

    #[test]
    fn refund_policy_amounts() {
        assert_eq!(RefundPolicy::Retain.refund_for(1_000), 0);
        assert_eq!(RefundPolicy::Partial { percent: 50 }.refund_for(1_001), 500);
        assert_eq!(RefundPolicy::Partial { percent: 100 }.refund_for(u128::MAX), u128::MAX);
    }

    #[test]
    fn refund_never_exceeds_prepaid() {
        assert_eq!(RefundPolicy::Partial { percent: 200 }.refund_for(1_001), 1_001);
        assert_eq!(RefundPolicy::Partial { percent: u8::MAX }.refund_for(u128::MAX), u128::MAX);
    }
}
