//! Prompt assembly for the scoring oracle.

use crate::models::score::ScoreScale;
use crate::transcript::Transcript;

/// Rubric used when no rubric file is configured.
pub const DEFAULT_RUBRIC: &str = include_str!("default_rubric.md");

/// Build the system prompt: the rubric followed by the answer-format rules
/// derived from `scale`.
pub fn system_prompt(rubric: &str, scale: ScoreScale) -> String {
    let grades = scale
        .values()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{}\n\nIn your responses:\n\
         1. Do not include any explanations.\n\
         2. Use only the format: {}\n\
         3. Only use the following grades: {}\n",
        rubric.trim_end(),
        scale.format_line(),
        grades,
    )
}

/// Build the user prompt carrying one transcript.
pub fn user_prompt(transcript: &Transcript) -> String {
    format!("Transcript:\n{transcript}")
}
