//! The fixed panel of weak predictors.
//!
//! Each predictor maps a token (plus, for a few of them, the shared feedback
//! history) to a binary vote. The panel is closed: there is no registration,
//! so the set of names is known at compile time.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::token::{Outcome, Token};

/// Result of asking one predictor for its opinion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ballot {
    Vote(Outcome),
    /// The predictor could not evaluate the input and sits this round out.
    Abstain,
}

impl Ballot {
    pub fn vote(self) -> Option<Outcome> {
        match self {
            Self::Vote(o) => Some(o),
            Self::Abstain => None,
        }
    }
}

impl From<Option<Outcome>> for Ballot {
    fn from(v: Option<Outcome>) -> Self {
        v.map_or(Self::Abstain, Self::Vote)
    }
}

/// A heuristic voter. Declaration order is the canonical panel order, used
/// for reporting and for breaking accuracy ties when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Predictor {
    Basic,
    Parity,
    Tail,
    Trend,
    NgramMulti,
    Entropy,
    LastKWinrate,
    PairSymmetry,
    RepeatedDigitBias,
    OddDigitRatio,
}

impl Predictor {
    pub const COUNT: usize = 10;

    pub const ALL: [Predictor; Self::COUNT] = [
        Self::Basic,
        Self::Parity,
        Self::Tail,
        Self::Trend,
        Self::NgramMulti,
        Self::Entropy,
        Self::LastKWinrate,
        Self::PairSymmetry,
        Self::RepeatedDigitBias,
        Self::OddDigitRatio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Parity => "parity",
            Self::Tail => "tail",
            Self::Trend => "trend",
            Self::NgramMulti => "ngram_multi",
            Self::Entropy => "entropy",
            Self::LastKWinrate => "last_k_winrate",
            Self::PairSymmetry => "pair_symmetry",
            Self::RepeatedDigitBias => "repeated_digit_bias",
            Self::OddDigitRatio => "odd_digit_ratio",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Basic => "first hex digit is odd",
            Self::Parity => "sum of decimal digits is odd",
            Self::Tail => "last hex digit is odd",
            Self::Trend => "at least 2 of the last 3 outcomes were high",
            Self::NgramMulti => "history continuations of the trailing 2/3/4-gram lean high",
            Self::Entropy => "character distribution is not low-entropy and clumped",
            Self::LastKWinrate => "at least half of the last 6 outcomes were high",
            Self::PairSymmetry => "at least 6 characters match their mirror position",
            Self::RepeatedDigitBias => "no decimal digit occurs 4 or more times",
            Self::OddDigitRatio => "at least half of the decimal digits are odd",
        }
    }

    /// Whether the vote depends on the feedback history, not just the token.
    pub fn uses_history(self) -> bool {
        matches!(self, Self::Trend | Self::NgramMulti | Self::LastKWinrate)
    }

    /// Ask this predictor to vote on `token` given the shared history.
    pub fn cast(self, token: &Token, history: &[Outcome]) -> Ballot {
        self.evaluate(token.as_str(), history)
    }

    /// Evaluate against a raw string. Characters a heuristic cannot read make
    /// it abstain rather than fail.
    pub(crate) fn evaluate(self, token: &str, history: &[Outcome]) -> Ballot {
        let vote = match self {
            Self::Basic => first_nibble_odd(token),
            Self::Parity => Some(digit_sum_parity(token)),
            Self::Tail => last_nibble_odd(token),
            Self::Trend => Some(trend(history)),
            Self::NgramMulti => Some(ngram_multi(history)),
            Self::Entropy => Some(entropy_vote(token)),
            Self::LastKWinrate => Some(last_k_winrate(history)),
            Self::PairSymmetry => Some(pair_symmetry(token)),
            Self::RepeatedDigitBias => Some(repeated_digit_bias(token)),
            Self::OddDigitRatio => Some(odd_digit_ratio(token)),
        };
        Ballot::from(vote)
    }
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Predictor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Token-only heuristics
// ---------------------------------------------------------------------------

fn nibble_odd(c: char) -> Option<Outcome> {
    c.to_digit(16).map(|v| Outcome::from_bool(v % 2 == 1))
}

fn first_nibble_odd(token: &str) -> Option<Outcome> {
    nibble_odd(token.chars().next()?)
}

fn last_nibble_odd(token: &str) -> Option<Outcome> {
    nibble_odd(token.chars().next_back()?)
}

fn decimal_digits(token: &str) -> impl Iterator<Item = u32> + '_ {
    token.chars().filter_map(|c| c.to_digit(10))
}

fn digit_sum_parity(token: &str) -> Outcome {
    let sum: u32 = decimal_digits(token).sum();
    Outcome::from_bool(sum % 2 == 1)
}

/// Shannon entropy in bits/symbol of the byte distribution of `data`.
pub fn shannon_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    let n = data.len() as f64;
    let mut h = 0.0;
    for &c in &counts {
        if c > 0 {
            let p = c as f64 / n;
            h -= p * p.log2();
        }
    }
    h
}

fn max_symbol_count(data: &[u8]) -> u64 {
    let mut counts = [0u64; 256];
    for &b in data {
        counts[b as usize] += 1;
    }
    counts.into_iter().max().unwrap_or(0)
}

/// Low when the token is both low-entropy (< 3.4 bits) and has a character
/// occurring at least 5 times.
fn entropy_vote(token: &str) -> Outcome {
    let bytes = token.as_bytes();
    let clumped = shannon_entropy(bytes) < 3.4 && max_symbol_count(bytes) >= 5;
    Outcome::from_bool(!clumped)
}

fn pair_symmetry(token: &str) -> Outcome {
    let bytes = token.as_bytes();
    let n = bytes.len();
    let mirrored = (0..n / 2).filter(|&i| bytes[i] == bytes[n - 1 - i]).count();
    Outcome::from_bool(mirrored >= 6)
}

fn repeated_digit_bias(token: &str) -> Outcome {
    let mut counts = [0u32; 10];
    for d in decimal_digits(token) {
        counts[d as usize] += 1;
    }
    Outcome::from_bool(counts.iter().all(|&c| c < 4))
}

fn odd_digit_ratio(token: &str) -> Outcome {
    let (odd, total) = decimal_digits(token).fold((0u32, 0u32), |(odd, total), d| {
        (odd + d % 2, total + 1)
    });
    // No decimal digits at all counts as "not mostly odd".
    Outcome::from_bool(total > 0 && odd as f64 / total as f64 >= 0.5)
}

// ---------------------------------------------------------------------------
// History-driven heuristics
// ---------------------------------------------------------------------------

fn count_high(outcomes: &[Outcome]) -> usize {
    outcomes.iter().filter(|o| o.is_high()).count()
}

fn trend(history: &[Outcome]) -> Outcome {
    if history.len() < 3 {
        return Outcome::High;
    }
    Outcome::from_bool(count_high(&history[history.len() - 3..]) >= 2)
}

fn last_k_winrate(history: &[Outcome]) -> Outcome {
    const K: usize = 6;
    if history.len() < K {
        return Outcome::High;
    }
    Outcome::from_bool(count_high(&history[history.len() - K..]) * 2 >= K)
}

/// For n in 2..=4, look up every earlier occurrence of the trailing n-gram and
/// average the fraction that were followed by high.
fn ngram_multi(history: &[Outcome]) -> Outcome {
    if history.len() < 5 {
        return Outcome::High;
    }
    let mut score = 0.0;
    let mut lengths = 0u32;
    for n in 2..=4 {
        if history.len() < n + 1 {
            continue;
        }
        let pattern = &history[history.len() - n..];
        let (matches, highs) = history
            .windows(n + 1)
            .filter(|w| &w[..n] == pattern)
            .fold((0u32, 0u32), |(m, h), w| (m + 1, h + u32::from(w[n].is_high())));
        if matches > 0 {
            score += highs as f64 / matches as f64;
            lengths += 1;
        }
    }
    Outcome::from_bool(lengths == 0 || score / lengths as f64 > 0.5)
}
