//! Engine configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use twinai_core::thresholds::AlertPolicy;

/// Default scheduler period.
const DEFAULT_TICK_INTERVAL_SECS: u64 = 30;

/// Default chance that a cycle runs an inventory-consumption pass.
const DEFAULT_CONSUMPTION_PROBABILITY: f64 = 0.3;

/// Default per-spare chance of consuming stock inside a pass.
const DEFAULT_CONSUMPTION_CHANCE: f64 = 0.1;

/// Default spare seed file, relative to the working directory.
const DEFAULT_SPARES_CSV: &str = "server/data/critical_spares_dataset.csv";

/// Tunables for the simulation pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tick_interval: Duration,
    pub consumption_probability: f64,
    pub consumption_chance: f64,
    pub alert_policy: AlertPolicy,
    /// Fixed seed for reproducible runs. Entropy when `None`.
    pub rng_seed: Option<u64>,
    pub spares_csv: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(DEFAULT_TICK_INTERVAL_SECS),
            consumption_probability: DEFAULT_CONSUMPTION_PROBABILITY,
            consumption_chance: DEFAULT_CONSUMPTION_CHANCE,
            alert_policy: AlertPolicy::default(),
            rng_seed: None,
            spares_csv: PathBuf::from(DEFAULT_SPARES_CSV),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values fall back to the defaults below; a bad
    /// value is logged rather than rejected.
    ///
    /// | Variable                         | Default                                   |
    /// |----------------------------------|-------------------------------------------|
    /// | `TWINAI_TICK_INTERVAL_SECS`      | `30`                                      |
    /// | `TWINAI_CONSUMPTION_PROBABILITY` | `0.3`                                     |
    /// | `TWINAI_CONSUMPTION_CHANCE`      | `0.1`                                     |
    /// | `TWINAI_ALERT_POLICY`            | `every_pass` (or `edge_triggered`)        |
    /// | `TWINAI_RNG_SEED`                | unset                                     |
    /// | `TWINAI_SPARES_CSV`              | `server/data/critical_spares_dataset.csv` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tick_secs = parsed_var::<u64>("TWINAI_TICK_INTERVAL_SECS")
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TICK_INTERVAL_SECS);

        let alert_policy = match std::env::var("TWINAI_ALERT_POLICY") {
            Ok(raw) => AlertPolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "Unknown TWINAI_ALERT_POLICY, using every_pass");
                AlertPolicy::EveryPass
            }),
            Err(_) => defaults.alert_policy,
        };

        Self {
            tick_interval: Duration::from_secs(tick_secs),
            consumption_probability: parsed_var("TWINAI_CONSUMPTION_PROBABILITY")
                .map(clamp_probability)
                .unwrap_or(defaults.consumption_probability),
            consumption_chance: parsed_var("TWINAI_CONSUMPTION_CHANCE")
                .map(clamp_probability)
                .unwrap_or(defaults.consumption_chance),
            alert_policy,
            rng_seed: parsed_var("TWINAI_RNG_SEED"),
            spares_csv: std::env::var("TWINAI_SPARES_CSV")
                .map(PathBuf::from)
                .unwrap_or(defaults.spares_csv),
        }
    }
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparsable setting");
            None
        }
    }
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_interval, Duration::from_secs(30));
        assert_eq!(config.consumption_probability, 0.3);
        assert_eq!(config.consumption_chance, 0.1);
        assert_eq!(config.alert_policy, AlertPolicy::EveryPass);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn probabilities_are_clamped() {
        assert_eq!(clamp_probability(1.7), 1.0);
        assert_eq!(clamp_probability(-0.2), 0.0);
        assert_eq!(clamp_probability(f64::NAN), 0.0);
    }
}
