//! Binarization and vote tie-break policies
//!
//! Scores exactly at 0.5 are the only ambiguous case when mapping a
//! probability to a label. Both fusion rules share one [`RoundingMode`] so the
//! majority vote and the weighted search binarize identically.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a score in [0, 1] is rounded to a binary label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round half to even: 0.5 becomes 0
    #[default]
    HalfToEven,
    /// Round half up: 0.5 becomes 1
    HalfUp,
}

impl RoundingMode {
    /// Round a score to a 0/1 label
    #[inline]
    pub fn to_label(self, score: f64) -> u8 {
        let rounded = match self {
            RoundingMode::HalfToEven => score.round_ties_even(),
            RoundingMode::HalfUp => score.round(),
        };
        if rounded >= 1.0 {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundingMode::HalfToEven => write!(f, "half-to-even"),
            RoundingMode::HalfUp => write!(f, "half-up"),
        }
    }
}

impl FromStr for RoundingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "half-to-even" | "half-even" | "even" | "bankers" => Ok(RoundingMode::HalfToEven),
            "half-up" | "up" => Ok(RoundingMode::HalfUp),
            other => Err(format!("unknown rounding mode '{}'", other)),
        }
    }
}

/// Which label wins a majority vote when both labels have the same count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteTieBreak {
    /// Lowest label among the tied modes (0)
    #[default]
    Lowest,
    /// Highest label among the tied modes (1)
    Highest,
}

impl VoteTieBreak {
    /// Resolve a vote given the number of positive votes out of `n_votes`
    #[inline]
    pub fn resolve(self, positives: usize, n_votes: usize) -> u8 {
        let negatives = n_votes - positives;
        match positives.cmp(&negatives) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => 0,
            std::cmp::Ordering::Equal => match self {
                VoteTieBreak::Lowest => 0,
                VoteTieBreak::Highest => 1,
            },
        }
    }
}

impl FromStr for VoteTieBreak {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lowest" | "low" | "zero" => Ok(VoteTieBreak::Lowest),
            "highest" | "high" | "one" => Ok(VoteTieBreak::Highest),
            other => Err(format!("unknown tie-break '{}'", other)),
        }
    }
}
