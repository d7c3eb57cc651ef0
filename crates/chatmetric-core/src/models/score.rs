use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::session::ScoredSession;

/// Inclusive bounds of the grading scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreScale {
    pub min: u8,
    pub max: u8,
}

impl ScoreScale {
    /// The 1–6 insight scale every survey transcript is graded on.
    pub const SURVEY: ScoreScale = ScoreScale { min: 1, max: 6 };

    pub fn contains(&self, score: u8) -> bool {
        (self.min..=self.max).contains(&score)
    }

    pub fn values(&self) -> RangeInclusive<u8> {
        self.min..=self.max
    }

    /// The single line the oracle must answer with, e.g. `Scored X out of 6`.
    pub fn format_line(&self) -> String {
        format!("Scored X out of {}", self.max)
    }
}

impl Default for ScoreScale {
    fn default() -> Self {
        Self::SURVEY
    }
}

/// A grade extracted from oracle output. Always within its scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    score: u8,
}

impl Verdict {
    /// Returns `None` when `score` falls outside `scale`.
    pub fn new(score: u8, scale: ScoreScale) -> Option<Self> {
        scale.contains(score).then_some(Self { score })
    }

    pub fn score(&self) -> u8 {
        self.score
    }
}

/// Why a scoring call produced no grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum NoVerdictReason {
    /// No line matched `Scored D out of D`.
    Unmatched,
    /// A line matched but the digit lies outside the scale.
    OutOfRange { score: u8 },
    /// The oracle did not answer within the configured timeout.
    TimedOut,
}

impl fmt::Display for NoVerdictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoVerdictReason::Unmatched => f.write_str("no verdict line in oracle output"),
            NoVerdictReason::OutOfRange { score } => {
                write!(f, "verdict score {score} outside the grading scale")
            }
            NoVerdictReason::TimedOut => f.write_str("oracle call timed out"),
        }
    }
}

/// Tagged result of scoring one transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreOutcome {
    Scored(Verdict),
    NoVerdict(NoVerdictReason),
    CallError(String),
}

impl ScoreOutcome {
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            ScoreOutcome::Scored(v) => Some(*v),
            _ => None,
        }
    }
}

/// Count of scored sessions per score value.
///
/// Every value on the scale is present, with zero for unused scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreHistogram {
    counts: BTreeMap<u8, usize>,
}

impl ScoreHistogram {
    pub fn from_sessions(sessions: &[ScoredSession], scale: ScoreScale) -> Self {
        let mut counts: BTreeMap<u8, usize> = scale.values().map(|s| (s, 0)).collect();
        for session in sessions {
            if let Some(count) = counts.get_mut(&session.score) {
                *count += 1;
            }
        }
        Self { counts }
    }

    pub fn count(&self, score: u8) -> usize {
        self.counts.get(&score).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        self.counts.iter().map(|(s, c)| (*s, *c))
    }
}
