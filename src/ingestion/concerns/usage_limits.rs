//! Usage Limits
//!
//! Pairs a feature's reset timing with how many times it can be used before
//! that reset ("once", "twice", "three times"). A feature with no reset
//! timing has no usage limit.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::rest_timing::{parse_reset_timing, ResetTiming};
use super::vocabulary::word_to_number;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageLimit {
    pub max_uses: u32,
    pub resets_on: ResetTiming,
}

/// "twice between long rests", "three times", "2 times"
static TIMES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(twice|thrice|(?:one|two|three|four|five|\d+)\s+times)\b")
        .expect("Failed to compile usage times regex")
});

/// Extract the usage limit from a feature description.
pub fn parse_usage_limit(text: &str) -> Option<UsageLimit> {
    let resets_on = parse_reset_timing(text)?;

    let max_uses = TIMES_PATTERN
        .captures(text)
        .and_then(|caps| {
            let phrase = caps.get(1)?.as_str();
            let word = phrase.split_whitespace().next()?;
            word_to_number(word)
        })
        .unwrap_or(1);

    Some(UsageLimit {
        max_uses,
        resets_on,
    })
}
