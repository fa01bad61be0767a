//! Accuracy-weighted vote over the active predictors.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::config::EngineConfig;
use crate::predictors::{Ballot, Predictor};
use crate::scoreboard::Scoreboard;
use crate::token::{Outcome, Token};

/// Outcome of one ensemble round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub label: Outcome,
    /// Share of the total weight behind `label`, in percent.
    pub confidence: f64,
    /// Up to three voters with the highest raw accuracy, best first.
    pub top3: Vec<Predictor>,
    /// Every vote cast this round, in panel order.
    pub votes: BTreeMap<Predictor, Outcome>,
    /// Active predictors that could not vote.
    pub abstained: Vec<Predictor>,
}

/// Three-tier damping of a predictor's accuracy into its vote weight:
/// distrusted voters get a flat low weight, strong ones full weight, the rest
/// their accuracy.
pub fn effective_weight(accuracy: f64, config: &EngineConfig) -> f64 {
    if accuracy < config.distrust_below {
        config.distrusted_weight
    } else if accuracy > config.trust_above {
        1.0
    } else {
        accuracy
    }
}

/// Heavier side wins; an exact tie goes to low.
fn pick_label(low: f64, high: f64) -> Outcome {
    Outcome::from_bool(high > low)
}

/// Poll every enabled predictor and combine the votes.
pub fn classify(
    token: &Token,
    history: &[Outcome],
    board: &Scoreboard,
    config: &EngineConfig,
) -> Classification {
    let ballots = board.active().map(|p| (p, p.cast(token, history)));
    tally(ballots, board, config)
}

/// Combine ballots already cast by active predictors. Abstainers are listed
/// but carry no weight and cannot rank.
pub(crate) fn tally(
    ballots: impl IntoIterator<Item = (Predictor, Ballot)>,
    board: &Scoreboard,
    config: &EngineConfig,
) -> Classification {
    let mut votes = BTreeMap::new();
    let mut abstained = Vec::new();
    let mut ranked: Vec<(Predictor, f64)> = Vec::new();
    let (mut low, mut high) = (0.0, 0.0);

    for (p, ballot) in ballots {
        match ballot {
            Ballot::Vote(vote) => {
                let accuracy = board.accuracy(p);
                let weight = effective_weight(accuracy, config);
                match vote {
                    Outcome::Low => low += weight,
                    Outcome::High => high += weight,
                }
                votes.insert(p, vote);
                ranked.push((p, accuracy));
            }
            Ballot::Abstain => {
                debug!("predictor {p} abstained");
                abstained.push(p);
            }
        }
    }

    let label = pick_label(low, high);
    let winning = if label.is_high() { high } else { low };
    let confidence = 100.0 * winning / (low + high + config.epsilon);

    // Stable sort keeps panel order among equal accuracies.
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let top3 = ranked.into_iter().take(3).map(|(p, _)| p).collect();

    Classification {
        label,
        confidence,
        top3,
        votes,
        abstained,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Outcome::{High, Low};

    const ZEROS: &str = "00000000000000000000000000000000";

    fn zeros() -> Token {
        Token::parse(ZEROS).unwrap()
    }

    // -----------------------------------------------------------------------
    // Weighting
    // -----------------------------------------------------------------------

    #[test]
    fn test_effective_weight_tiers() {
        let c = EngineConfig::default();
        assert_eq!(effective_weight(0.10, &c), 0.3);
        assert_eq!(effective_weight(0.599, &c), 0.3);
        assert_eq!(effective_weight(0.60, &c), 0.60);
        assert_eq!(effective_weight(0.75, &c), 0.75);
        assert_eq!(effective_weight(0.80, &c), 0.80);
        assert_eq!(effective_weight(0.81, &c), 1.0);
    }

    #[test]
    fn test_tie_goes_to_low() {
        assert_eq!(pick_label(1.0, 1.0), Low);
        assert_eq!(pick_label(0.0, 0.0), Low);
        assert_eq!(pick_label(0.9, 1.0), High);
        assert_eq!(pick_label(1.1, 1.0), Low);
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[test]
    fn test_all_zero_token_fresh_board() {
        let c = EngineConfig::default();
        let board = Scoreboard::new(&c);
        let r = classify(&zeros(), &[], &board, &c);

        assert_eq!(r.votes.len(), 10);
        assert_eq!(r.votes[&Predictor::Basic], Low);
        assert_eq!(r.votes[&Predictor::Parity], Low);
        assert_eq!(r.votes[&Predictor::Tail], Low);
        assert_eq!(r.votes[&Predictor::Trend], High);
        assert!(r.abstained.is_empty());

        // 6 low vs 4 high, every weight 0.3
        assert_eq!(r.label, Low);
        assert!((r.confidence - 60.0).abs() < 1e-3);

        // All tied at 0.5: panel order decides
        assert_eq!(
            r.top3,
            vec![Predictor::Basic, Predictor::Parity, Predictor::Tail]
        );
    }

    #[test]
    fn test_accurate_predictors_outweigh_majority() {
        let c = EngineConfig::default();
        let mut board = Scoreboard::new(&c);
        // Trend, ngram_multi, last_k_winrate and pair_symmetry vote high on
        // zeros with empty history; make them trusted.
        for p in [
            Predictor::Trend,
            Predictor::NgramMulti,
            Predictor::LastKWinrate,
            Predictor::PairSymmetry,
        ] {
            board.set(p, 90, 100);
        }
        let r = classify(&zeros(), &[], &board, &c);
        // high: 4 × 1.0, low: 6 × 0.3
        assert_eq!(r.label, High);
        let expected = 100.0 * 4.0 / (4.0 + 1.8);
        assert!((r.confidence - expected).abs() < 1e-3);
        assert_eq!(
            r.top3,
            vec![Predictor::Trend, Predictor::NgramMulti, Predictor::LastKWinrate]
        );
    }

    #[test]
    fn test_abstainer_carries_no_weight_and_cannot_rank() {
        let c = EngineConfig::default();
        let mut board = Scoreboard::new(&c);
        // Basic would be the single best voter if it voted
        board.set(Predictor::Basic, 95, 100);
        let garbage = "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz";
        let ballots = [Predictor::Basic, Predictor::Tail, Predictor::Parity, Predictor::Trend]
            .map(|p| (p, p.evaluate(garbage, &[])));
        assert_eq!(ballots[0].1, Ballot::Abstain);
        assert_eq!(ballots[1].1, Ballot::Abstain);

        let r = tally(ballots, &board, &c);
        assert_eq!(r.abstained, vec![Predictor::Basic, Predictor::Tail]);
        assert!(!r.votes.contains_key(&Predictor::Basic));
        assert!(!r.votes.contains_key(&Predictor::Tail));
        assert_eq!(r.top3, vec![Predictor::Parity, Predictor::Trend]);

        // parity low (no digits) vs trend high (short history), both 0.3: tie
        assert_eq!(r.votes[&Predictor::Parity], Low);
        assert_eq!(r.votes[&Predictor::Trend], High);
        assert_eq!(r.label, Low);
        assert!((r.confidence - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_all_abstain_yields_zero_confidence() {
        let c = EngineConfig::default();
        let board = Scoreboard::new(&c);
        let r = tally([(Predictor::Basic, Ballot::Abstain)], &board, &c);
        assert!(r.votes.is_empty() && r.top3.is_empty());
        assert_eq!(r.abstained, vec![Predictor::Basic]);
        assert_eq!((r.label, r.confidence), (Low, 0.0));
    }

    #[test]
    fn test_disabled_predictors_do_not_vote() {
        let c = EngineConfig::default();
        let mut board = Scoreboard::new(&c);
        board.set(Predictor::Basic, 7, 20);
        board.apply_auto_disable();
        let r = classify(&zeros(), &[], &board, &c);
        assert!(!r.votes.contains_key(&Predictor::Basic));
        assert_eq!(r.votes.len(), 9);
        assert!(!r.top3.contains(&Predictor::Basic));
    }

    #[test]
    fn test_everything_disabled_yields_zero_confidence() {
        let c = EngineConfig::default();
        let mut board = Scoreboard::new(&c);
        for p in Predictor::ALL {
            board.set(p, 0, 20);
        }
        board.apply_auto_disable();
        let r = classify(&zeros(), &[], &board, &c);
        assert!(r.votes.is_empty());
        assert!(r.top3.is_empty());
        assert_eq!(r.label, Low);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn test_confidence_in_range_for_varied_tokens() {
        let c = EngineConfig::default();
        let board = Scoreboard::new(&c);
        let history: Vec<Outcome> = (0..12).map(|i| Outcome::from_bool(i % 3 == 0)).collect();
        for seed in 0u32..64 {
            let s: String = (0..32)
                .map(|i| {
                    let v = (seed.wrapping_mul(2654435761).wrapping_add(i * 40503) >> 7) % 16;
                    std::char::from_digit(v, 16).unwrap()
                })
                .collect();
            let t = Token::parse(&s).unwrap();
            let r = classify(&t, &history, &board, &c);
            assert!((0.0..=100.0).contains(&r.confidence));
            assert!(r.confidence >= 50.0 - 1e-3, "winner holds at least half");
        }
    }

    #[test]
    fn test_classification_is_deterministic() {
        let c = EngineConfig::default();
        let board = Scoreboard::new(&c);
        let t = Token::parse("9f86d081884c7d659a2feaa0c55ad015").unwrap();
        let history = [High, Low, Low, High, High, Low, High];
        let a = classify(&t, &history, &board, &c);
        let b = classify(&t, &history, &board, &c);
        assert_eq!(a, b);
    }
}
