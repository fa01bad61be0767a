//! Per-predictor online accuracy with hysteresis-based auto-disable.

use log::info;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::predictors::Predictor;
use crate::token::Outcome;

/// Running record for one predictor. `correct <= total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictorStat {
    pub correct: u64,
    pub total: u64,
    pub disabled: bool,
}

impl PredictorStat {
    pub fn accuracy(&self) -> f64 {
        self.correct as f64 / self.total as f64
    }
}

/// Externally visible row of the stats table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictorReport {
    pub name: &'static str,
    pub correct: u64,
    pub total: u64,
    pub accuracy: f64,
    pub disabled: bool,
}

/// Accuracy tracker for the whole panel, indexed by panel order.
#[derive(Debug, Clone, PartialEq)]
pub struct Scoreboard {
    stats: [PredictorStat; Predictor::COUNT],
    min_samples: u64,
    disable_below: f64,
    enable_at: f64,
}

impl Scoreboard {
    /// Every predictor starts at the smoothing prior and enabled.
    pub fn new(config: &EngineConfig) -> Self {
        let prior = PredictorStat {
            correct: config.prior_correct,
            total: config.prior_total,
            disabled: false,
        };
        Self {
            stats: [prior; Predictor::COUNT],
            min_samples: config.disable_min_samples,
            disable_below: config.disable_below,
            enable_at: config.enable_at,
        }
    }

    pub fn stat(&self, p: Predictor) -> &PredictorStat {
        &self.stats[p as usize]
    }

    pub fn accuracy(&self, p: Predictor) -> f64 {
        self.stat(p).accuracy()
    }

    pub fn is_disabled(&self, p: Predictor) -> bool {
        self.stat(p).disabled
    }

    /// Predictors currently allowed to vote, in panel order.
    pub fn active(&self) -> impl Iterator<Item = Predictor> + '_ {
        Predictor::ALL.into_iter().filter(|&p| !self.is_disabled(p))
    }

    /// Score one prediction against the observed outcome.
    pub fn record(&mut self, p: Predictor, predicted: Outcome, actual: Outcome) {
        let stat = &mut self.stats[p as usize];
        stat.total += 1;
        if predicted == actual {
            stat.correct += 1;
        }
    }

    /// Silence predictors whose accuracy dropped below the floor, and revive
    /// silenced ones that climbed back to the re-enable mark. Predictors with
    /// too few samples are left alone.
    pub fn apply_auto_disable(&mut self) {
        for p in Predictor::ALL {
            let (min_samples, disable_below, enable_at) =
                (self.min_samples, self.disable_below, self.enable_at);
            let stat = &mut self.stats[p as usize];
            if stat.total < min_samples {
                continue;
            }
            let acc = stat.accuracy();
            if acc < disable_below {
                if !stat.disabled {
                    info!("disabling predictor {p}: accuracy {acc:.3} over {} rounds", stat.total);
                }
                stat.disabled = true;
            } else if acc >= enable_at && stat.disabled {
                info!("re-enabling predictor {p}: accuracy {acc:.3} over {} rounds", stat.total);
                stat.disabled = false;
            }
        }
    }

    /// Stats table in panel order.
    pub fn snapshot(&self) -> Vec<PredictorReport> {
        Predictor::ALL
            .into_iter()
            .map(|p| {
                let s = self.stat(p);
                PredictorReport {
                    name: p.name(),
                    correct: s.correct,
                    total: s.total,
                    accuracy: s.accuracy(),
                    disabled: s.disabled,
                }
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn set(&mut self, p: Predictor, correct: u64, total: u64) {
        let stat = &mut self.stats[p as usize];
        stat.correct = correct;
        stat.total = total;
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
