//! Rest Timing Detection
//!
//! Classifies when a limited-use feature recovers. The phrase families are
//! checked in a fixed priority order so that "short or long rest" wins over a
//! separate "long rest" mention later in the same text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// When expended uses come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetTiming {
    ShortRest,
    LongRest,
    Dawn,
    Dusk,
}

impl ResetTiming {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortRest => "short_rest",
            Self::LongRest => "long_rest",
            Self::Dawn => "dawn",
            Self::Dusk => "dusk",
        }
    }
}

impl std::fmt::Display for ResetTiming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static SHORT_OR_LONG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bshort\s+or\s+long\s+rests?\b")
        .expect("Failed to compile short-or-long rest regex")
});

static SHORT_REST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bshort\s+rests?\b").expect("Failed to compile short rest regex")
});

static LONG_REST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\blong\s+rests?\b").expect("Failed to compile long rest regex")
});

static DAWN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdawn\b").expect("Failed to compile dawn regex"));

static DUSK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bdusk\b").expect("Failed to compile dusk regex"));

/// Priority-ordered phrase families.
static PRIORITY: Lazy<[(&'static Lazy<Regex>, ResetTiming); 5]> = Lazy::new(|| {
    [
        (&SHORT_OR_LONG, ResetTiming::ShortRest),
        (&SHORT_REST, ResetTiming::ShortRest),
        (&LONG_REST, ResetTiming::LongRest),
        (&DAWN, ResetTiming::Dawn),
        (&DUSK, ResetTiming::Dusk),
    ]
});

/// Detect the reset timing of a feature description.
pub fn parse_reset_timing(text: &str) -> Option<ResetTiming> {
    if text.trim().is_empty() {
        return None;
    }
    PRIORITY
        .iter()
        .find(|(pattern, _)| pattern.is_match(text))
        .map(|(_, timing)| *timing)
}
