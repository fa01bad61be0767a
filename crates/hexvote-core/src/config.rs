//! Tunable constants for the engine and the chat gateway.
//!
//! Every field has a default matching the production behavior, so a config
//! file only needs to name what it changes.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::UserId;

// ---------------------------------------------------------------------------
// Engine config
// ---------------------------------------------------------------------------

/// Thresholds for scoring, auto-disable, rule mining and vote weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smoothing prior: every predictor starts at `prior_correct / prior_total`.
    pub prior_correct: u64,
    pub prior_total: u64,

    /// Predictors with fewer scored rounds than this are never silenced.
    pub disable_min_samples: u64,
    /// Silence a predictor whose accuracy falls below this.
    pub disable_below: f64,
    /// Re-enable a silenced predictor once accuracy reaches this.
    pub enable_at: f64,

    /// Rule mining does nothing until the history is at least this long.
    pub rule_min_history: usize,
    /// A rule needs this many observations before it may override.
    pub rule_min_total: u64,
    /// ...and at least this hit ratio.
    pub rule_min_ratio: f64,

    /// Accuracy below this gets the flat distrust weight.
    pub distrust_below: f64,
    pub distrusted_weight: f64,
    /// Accuracy above this gets full weight 1.0.
    pub trust_above: f64,

    /// Added to the confidence denominator so an empty vote does not divide by zero.
    pub epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            prior_correct: 1,
            prior_total: 2,
            disable_min_samples: 20,
            disable_below: 0.60,
            enable_at: 0.65,
            rule_min_history: 6,
            rule_min_total: 3,
            rule_min_ratio: 0.70,
            distrust_below: 0.60,
            distrusted_weight: 0.3,
            trust_above: 0.80,
            epsilon: 1e-6,
        }
    }
}

impl EngineConfig {
    /// Load engine config JSON from disk. Missing fields take their defaults.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("failed to parse engine config JSON: {e}"),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs that would break the counter invariants, the
    /// hysteresis band, or the confidence denominator.
    pub fn validate(&self) -> std::io::Result<()> {
        let ratios = [
            ("disable_below", self.disable_below),
            ("enable_at", self.enable_at),
            ("distrust_below", self.distrust_below),
            ("trust_above", self.trust_above),
            ("rule_min_ratio", self.rule_min_ratio),
        ];
        let problem = if self.prior_total == 0 {
            Some("prior_total must be positive".to_string())
        } else if self.prior_correct > self.prior_total {
            Some("prior_correct must not exceed prior_total".to_string())
        } else if let Some((name, v)) = ratios.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            Some(format!("{name} ({v}) must be within [0, 1]"))
        } else if self.enable_at < self.disable_below {
            Some(format!(
                "enable_at ({}) must be >= disable_below ({})",
                self.enable_at, self.disable_below
            ))
        } else if !(self.distrusted_weight.is_finite() && self.distrusted_weight >= 0.0) {
            Some(format!(
                "distrusted_weight ({}) must be non-negative",
                self.distrusted_weight
            ))
        } else if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            // An empty vote would otherwise divide zero by zero
            Some(format!("epsilon ({}) must be positive", self.epsilon))
        } else {
            None
        };
        match problem {
            Some(msg) => Err(std::io::Error::new(std::io::ErrorKind::InvalidData, msg)),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Gateway config
// ---------------------------------------------------------------------------

/// Who may talk to the bot, and who administers the allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub admin_id: UserId,
    #[serde(default)]
    pub allowed_users: BTreeSet<UserId>,
}

impl GatewayConfig {
    pub fn new(admin_id: UserId) -> Self {
        Self {
            admin_id,
            allowed_users: BTreeSet::new(),
        }
    }
}
