//! Verdict extraction from free-text oracle output.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::score::{NoVerdictReason, ScoreScale, Verdict};

/// `Scored D out of D` at the start of any line, ASCII digits only.
static VERDICT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^Scored ([0-9]) out of ([0-9])").expect("verdict pattern is valid")
});

/// Extract the grade from oracle output.
///
/// Only the first matching line counts. A score outside `scale` is a
/// malformed response and is rejected rather than clamped.
pub fn parse_verdict(output: &str, scale: ScoreScale) -> Result<Verdict, NoVerdictReason> {
    let caps = VERDICT_LINE
        .captures(output)
        .ok_or(NoVerdictReason::Unmatched)?;

    let score: u8 = caps
        .get(1)
        .and_then(|m| m.as_str().parse().ok())
        .ok_or(NoVerdictReason::Unmatched)?;

    Verdict::new(score, scale).ok_or(NoVerdictReason::OutOfRange { score })
}
