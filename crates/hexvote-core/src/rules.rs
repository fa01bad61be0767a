//! Streak rules mined from the feedback history.
//!
//! After every feedback event the trailing 3-, 4- and 5-outcome windows are
//! looked up earlier in the history. The first earlier occurrence creates (or
//! reinforces) a rule predicting whatever followed it. A rule that has been
//! seen often enough, with a high enough hit ratio, overrides the ensemble.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::token::Outcome;

/// Supported pattern lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Window {
    Three,
    Four,
    Five,
}

impl Window {
    /// Mining order.
    pub const ASCENDING: [Window; 3] = [Self::Three, Self::Four, Self::Five];
    /// Override lookup order: the most specific pattern wins.
    pub const DESCENDING: [Window; 3] = [Self::Five, Self::Four, Self::Three];

    pub fn size(self) -> usize {
        match self {
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }

    fn from_size(size: usize) -> Option<Self> {
        match size {
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            5 => Some(Self::Five),
            _ => None,
        }
    }
}

/// Rule key: window length plus the outcomes packed oldest-first into bits.
///
/// Carrying the length keeps `[0,1,1]` and `[0,0,1,1]` apart even though they
/// pack to the same integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pattern {
    window: Window,
    bits: u8,
}

impl Pattern {
    /// Build a key from 3 to 5 outcomes.
    pub fn from_outcomes(outcomes: &[Outcome]) -> Option<Self> {
        let window = Window::from_size(outcomes.len())?;
        let bits = outcomes.iter().fold(0u8, |acc, o| (acc << 1) | o.bit());
        Some(Self { window, bits })
    }

    /// Key for the last `window` outcomes of `history`, if it is long enough.
    pub fn trailing(history: &[Outcome], window: Window) -> Option<Self> {
        let size = window.size();
        if history.len() < size {
            return None;
        }
        Self::from_outcomes(&history[history.len() - size..])
    }

    pub fn window(&self) -> Window {
        self.window
    }

    /// Unpack back into outcomes, oldest first.
    pub fn outcomes(&self) -> Vec<Outcome> {
        let size = self.window.size();
        (0..size)
            .rev()
            .map(|shift| Outcome::from_bool((self.bits >> shift) & 1 == 1))
            .collect()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for o in self.outcomes() {
            write!(f, "{}", o.bit())?;
        }
        Ok(())
    }
}

impl Serialize for Pattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Continuation statistics for one pattern. `result` is fixed when the rule
/// is created; only the counters move afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rule {
    #[serde(rename = "match")]
    pub hits: u64,
    pub total: u64,
    pub result: Outcome,
}

impl Rule {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }
}

/// All mined rules plus the thresholds that decide when one may override.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
    rules: BTreeMap<Pattern, Rule>,
    min_history: usize,
    min_total: u64,
    min_ratio: f64,
}

impl RuleBook {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            rules: BTreeMap::new(),
            min_history: config.rule_min_history,
            min_total: config.rule_min_total,
            min_ratio: config.rule_min_ratio,
        }
    }

    /// Re-scan the history after an append.
    ///
    /// For each window size, only the first (oldest) earlier occurrence of
    /// the trailing window is counted. The scan stops one short of the window
    /// whose continuation is the newest outcome.
    pub fn mine(&mut self, history: &[Outcome]) {
        let len = history.len();
        if len < self.min_history {
            return;
        }
        for window in Window::ASCENDING {
            let size = window.size();
            if len < size + 1 {
                continue;
            }
            let tail = &history[len - size..];
            let limit = len - size - 1;
            let Some(i) = (0..limit).find(|&i| &history[i..i + size] == tail) else {
                continue;
            };
            let Some(key) = Pattern::from_outcomes(tail) else {
                continue;
            };
            let next = history[i + size];
            let rule = self.rules.entry(key).or_insert_with(|| {
                debug!("new rule {key} -> {next} (first seen at index {i})");
                Rule {
                    hits: 0,
                    total: 0,
                    result: next,
                }
            });
            rule.total += 1;
            if rule.result == next {
                rule.hits += 1;
            }
        }
    }

    /// The outcome of the longest trailing pattern whose rule is reliable
    /// enough, if any.
    pub fn override_for(&self, history: &[Outcome]) -> Option<Outcome> {
        Window::DESCENDING.into_iter().find_map(|window| {
            let key = Pattern::trailing(history, window)?;
            let rule = self.rules.get(&key)?;
            (rule.total >= self.min_total && rule.ratio() >= self.min_ratio).then_some(rule.result)
        })
    }

    pub fn get(&self, pattern: &Pattern) -> Option<&Rule> {
        self.rules.get(pattern)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pattern, &Rule)> {
        self.rules.iter()
    }
}

impl Default for RuleBook {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
