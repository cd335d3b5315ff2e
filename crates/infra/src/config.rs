//! Configuration loading and representation.

use anyhow::{Context, bail};

pub const DEFAULT_STORE_NAMESPACE: &str = "moneydesk";
pub const DEFAULT_MAX_LIST: usize = 50;

const ENV_STORE_NAMESPACE: &str = "MONEYDESK_STORE_NAMESPACE";
const ENV_RNG_SEED: &str = "MONEYDESK_RNG_SEED";
const ENV_MAX_LIST: &str = "MONEYDESK_MAX_LIST";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Key prefix for every persisted stream.
    pub store_namespace: String,
    /// Seed for the credit-score RNG; `None` seeds from entropy.
    pub rng_seed: Option<u64>,
    /// Default limit for loan listings.
    pub max_list: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_namespace: DEFAULT_STORE_NAMESPACE.to_string(),
            rng_seed: None,
            max_list: DEFAULT_MAX_LIST,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        match lookup(ENV_STORE_NAMESPACE) {
            Some(ns) if !ns.trim().is_empty() => config.store_namespace = ns.trim().to_string(),
            Some(_) => tracing::warn!(
                var = ENV_STORE_NAMESPACE,
                fallback = DEFAULT_STORE_NAMESPACE,
                "blank store namespace, using default"
            ),
            None => {}
        }

        if let Some(raw) = lookup(ENV_RNG_SEED) {
            let seed = raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_RNG_SEED} must be an unsigned integer, got '{raw}'"))?;
            config.rng_seed = Some(seed);
        }

        if let Some(raw) = lookup(ENV_MAX_LIST) {
            match raw.trim().parse::<usize>() {
                Ok(0) => bail!("{ENV_MAX_LIST} must be at least 1"),
                Ok(n) => config.max_list = n,
                Err(err) => tracing::warn!(
                    var = ENV_MAX_LIST,
                    value = %raw,
                    error = %err,
                    fallback = DEFAULT_MAX_LIST,
                    "invalid list limit, using default"
                ),
            }
        }

        Ok(config)
    }
}
