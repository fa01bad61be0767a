//! # hexvote-core
//!
//! **Ten weak voters, one decision, and a memory for streaks.**
//!
//! `hexvote-core` classifies 32-character hex tokens as high or low, then learns
//! from ground-truth feedback. Every token is put to a fixed panel of cheap
//! heuristics; their votes are weighted by rolling accuracy, and a rule layer
//! mined from the feedback history can override the panel.
//!
//! ## Quick Start
//!
//! ```
//! use hexvote_core::{Engine, Outcome};
//!
//! let mut engine = Engine::default();
//!
//! // Classify a token on behalf of user 7
//! let prediction = engine.submit(7, "0123456789abcdef0123456789abcdef").unwrap();
//! assert!(prediction.confidence >= 0.0 && prediction.confidence <= 100.0);
//!
//! // Report what actually happened
//! engine.feedback(7, Outcome::High).unwrap();
//! assert_eq!(engine.history().len(), 1);
//! ```
//!
//! ## Architecture
//!
//! Token → Predictors (votes) → Ensemble (accuracy-weighted) ─┐
//!                                                             ├→ Prediction
//! History → Rule book (mined streak patterns) → Override ─────┘
//!
//! Feedback appends to the history, re-mines rules, scores each predictor
//! that voted, and re-evaluates which predictors are silenced.

pub mod config;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod predictors;
pub mod rules;
pub mod scoreboard;
pub mod token;

pub use config::{EngineConfig, GatewayConfig};
pub use engine::{Engine, PendingClassification, Prediction, TopVoter, UserId};
pub use ensemble::{Classification, classify, effective_weight};
pub use error::EngineError;
pub use gate::AccessList;
pub use gateway::{Gateway, Reply};
pub use predictors::{Ballot, Predictor, shannon_entropy};
pub use rules::{Pattern, Rule, RuleBook, Window};
pub use scoreboard::{PredictorReport, PredictorStat, Scoreboard};
pub use token::{Outcome, TOKEN_LEN, Token};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
