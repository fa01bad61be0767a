//! Hex tokens and binary outcomes.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::EngineError;

/// Required token length in characters.
pub const TOKEN_LEN: usize = 32;

/// A validated 32-character lowercase hex string.
///
/// Opaque beyond character-level statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Validate `s` as a token. No trimming or case folding happens here.
    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let valid = s.len() == TOKEN_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(EngineError::InvalidTokenFormat(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Token {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Ground-truth result: 0 ("low") or 1 ("high").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Low = 0,
    High = 1,
}

impl Outcome {
    /// Map a bit to an outcome. Anything other than 0 or 1 is rejected.
    pub fn from_bit(bit: u8) -> Option<Self> {
        match bit {
            0 => Some(Self::Low),
            1 => Some(Self::High),
            _ => None,
        }
    }

    /// Outcome of a boolean condition: true → high.
    pub fn from_bool(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }

    pub fn bit(self) -> u8 {
        self as u8
    }

    pub fn is_high(self) -> bool {
        self == Self::High
    }

    /// Capitalized display label used in chat replies.
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::High => write!(f, "high"),
        }
    }
}

impl Serialize for Outcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.bit())
    }
}

impl<'de> Deserialize<'de> for Outcome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bit = u8::deserialize(deserializer)?;
        Outcome::from_bit(bit)
            .ok_or_else(|| serde::de::Error::custom(format!("outcome must be 0 or 1, got {bit}")))
    }
}
