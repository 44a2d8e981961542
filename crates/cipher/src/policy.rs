//! Key-strength policy
//!
//! The dispatcher consults a [`CryptoPolicy`] on every successful engine
//! selection at init time. Limits are expressed in key bits per algorithm
//! component (`"AES"` for `"AES/GCM/NoPadding"`).

use std::collections::BTreeMap;
use std::fmt;

use xform_api::ParameterSpec;

/// Key-strength limits consulted by the dispatcher
pub trait CryptoPolicy: Send + Sync + fmt::Debug {
    /// Largest key size in bits allowed for `algorithm`
    fn max_allowed_key_bits(&self, algorithm: &str) -> usize;

    /// Whether a key of `key_bits` with `params` may be used for `algorithm`
    fn is_within_policy(
        &self,
        algorithm: &str,
        key_bits: usize,
        _params: Option<&ParameterSpec>,
    ) -> bool {
        key_bits <= self.max_allowed_key_bits(algorithm)
    }
}

/// Policy without limits
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlimitedPolicy;

impl CryptoPolicy for UnlimitedPolicy {
    fn max_allowed_key_bits(&self, _algorithm: &str) -> usize {
        usize::MAX
    }
}

/// Declarative key-strength limits
///
/// Algorithm names are matched case-insensitively. Algorithms without an
/// entry fall back to `default_max_key_bits`, and to no limit when that is
/// unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PolicyConfig {
    pub default_max_key_bits: Option<usize>,
    pub algorithms: BTreeMap<String, usize>,
}

impl PolicyConfig {
    pub fn with_limit(mut self, algorithm: impl Into<String>, max_key_bits: usize) -> Self {
        self.algorithms.insert(algorithm.into(), max_key_bits);
        self
    }

    pub fn with_default(mut self, max_key_bits: usize) -> Self {
        self.default_max_key_bits = Some(max_key_bits);
        self
    }
}

/// Policy backed by a [`PolicyConfig`]
#[derive(Debug, Clone)]
pub struct ConfiguredPolicy {
    limits: BTreeMap<String, usize>,
    default_max_key_bits: Option<usize>,
}

impl ConfiguredPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        let limits = config
            .algorithms
            .into_iter()
            .map(|(alg, bits)| (alg.to_uppercase(), bits))
            .collect();
        Self {
            limits,
            default_max_key_bits: config.default_max_key_bits,
        }
    }
}

impl From<PolicyConfig> for ConfiguredPolicy {
    fn from(config: PolicyConfig) -> Self {
        Self::new(config)
    }
}

impl CryptoPolicy for ConfiguredPolicy {
    fn max_allowed_key_bits(&self, algorithm: &str) -> usize {
        self.limits
            .get(&algorithm.to_uppercase())
            .copied()
            .or(self.default_max_key_bits)
            .unwrap_or(usize::MAX)
    }
}
