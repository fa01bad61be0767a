//! The learning engine: history, scoreboard, rule book and pending submissions.
//!
//! One `Engine` is one independent learning state. Nothing is global, so
//! several engines (per test, per room) can run side by side. Mutating calls
//! take `&mut self`; a host that serves several users concurrently wraps the
//! engine in a single lock so feedback events never interleave.
//!
//! Per user the engine is a two-state machine:
//!
//! ```text
//!            submit(token)                  feedback(outcome)
//!   Idle ───────────────────▶ AwaitingFeedback ───────────────▶ Idle
//!                              │      ▲
//!                              └──────┘ submit(token) replaces the pending token
//! ```
//!
//! Feedback while idle is rejected with [`EngineError::NoPendingToken`] and
//! changes nothing.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::ensemble::{self, Classification};
use crate::error::EngineError;
use crate::predictors::Predictor;
use crate::rules::RuleBook;
use crate::scoreboard::{PredictorReport, Scoreboard};
use crate::token::{Outcome, Token};

/// Chat-platform user identity.
pub type UserId = i64;

/// What a user submitted last, and how each active predictor voted on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingClassification {
    pub token: Token,
    pub votes: BTreeMap<Predictor, Outcome>,
}

/// One of the three best-ranked voters and its vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopVoter {
    #[serde(rename = "name")]
    pub predictor: Predictor,
    pub label: Outcome,
}

/// Response to a submitted token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Rule override when one applies, otherwise the ensemble label.
    pub label: Outcome,
    pub ensemble_label: Outcome,
    /// Ensemble confidence in percent (0-100).
    pub confidence: f64,
    pub top3: Vec<TopVoter>,
    pub override_label: Option<Outcome>,
    pub votes: BTreeMap<Predictor, Outcome>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Engine {
    config: EngineConfig,
    history: Vec<Outcome>,
    scoreboard: Scoreboard,
    rules: RuleBook,
    pending: BTreeMap<UserId, PendingClassification>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scoreboard: Scoreboard::new(&config),
            rules: RuleBook::new(&config),
            history: Vec::new(),
            pending: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the ensemble on `token` against the current learning state.
    /// Read-only.
    pub fn classify(&self, token: &Token) -> Classification {
        ensemble::classify(token, &self.history, &self.scoreboard, &self.config)
    }

    /// The rule override for the current history, if any rule qualifies.
    pub fn rule_override(&self) -> Option<Outcome> {
        self.rules.override_for(&self.history)
    }

    /// Classify `raw` for `user` and remember it as the user's pending token.
    ///
    /// Invalid tokens are rejected before anything is touched.
    pub fn submit(&mut self, user: UserId, raw: &str) -> Result<Prediction, EngineError> {
        let token = Token::parse(raw)?;
        let override_label = self.rule_override();
        let result = self.classify(&token);

        let top3 = result
            .top3
            .iter()
            .filter_map(|&p| {
                result.votes.get(&p).map(|&label| TopVoter {
                    predictor: p,
                    label,
                })
            })
            .collect();

        debug!(
            "user {user} submitted {token}: ensemble {} ({:.1}%), override {:?}",
            result.label, result.confidence, override_label
        );

        self.pending.insert(
            user,
            PendingClassification {
                token,
                votes: result.votes.clone(),
            },
        );

        Ok(Prediction {
            label: override_label.unwrap_or(result.label),
            ensemble_label: result.label,
            confidence: result.confidence,
            top3,
            override_label,
            votes: result.votes,
        })
    }

    /// Accept ground truth for `user`'s pending token and learn from it.
    pub fn feedback(&mut self, user: UserId, actual: Outcome) -> Result<Outcome, EngineError> {
        let pending = self
            .pending
            .remove(&user)
            .ok_or(EngineError::NoPendingToken(user))?;

        self.history.push(actual);
        self.rules.mine(&self.history);
        for (&p, &vote) in &pending.votes {
            self.scoreboard.record(p, vote, actual);
        }
        self.scoreboard.apply_auto_disable();

        debug!(
            "user {user} reported {actual} for {}; history length {}, {} rules",
            pending.token,
            self.history.len(),
            self.rules.len()
        );
        Ok(actual)
    }

    /// Per-predictor `{correct, total, accuracy, disabled}` in panel order.
    pub fn stats(&self) -> Vec<PredictorReport> {
        self.scoreboard.snapshot()
    }

    pub fn history(&self) -> &[Outcome] {
        &self.history
    }

    pub fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    pub fn pending(&self, user: UserId) -> Option<&PendingClassification> {
        self.pending.get(&user)
    }

    pub fn pending_token(&self, user: UserId) -> Option<&Token> {
        self.pending(user).map(|p| &p.token)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
