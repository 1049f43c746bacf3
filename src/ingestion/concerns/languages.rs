//! Language Grants
//!
//! Reads the languages a trait grants: named languages ("Common and
//! Dwarvish") and open slots ("one extra language of your choice", "two of
//! your choice"). Only the first sentence is read; the rest of a Languages
//! trait is flavor text about the speakers.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::vocabulary::{slugify, word_to_number, LANGUAGES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageGrant {
    /// Language slug, `None` for a choice slot
    pub slug: Option<String>,
    pub is_choice: bool,
}

impl LanguageGrant {
    pub fn fixed(language: &str) -> Self {
        Self {
            slug: Some(slugify(language)),
            is_choice: false,
        }
    }

    pub fn choice() -> Self {
        Self {
            slug: None,
            is_choice: true,
        }
    }
}

static FIRST_SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(?:\s|$)").expect("Failed to compile sentence end regex"));

static OF_YOUR_CHOICE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(one|two|three|four|any|a|an)\s+of\s+your\s+choice\b")
        .expect("Failed to compile language choice regex")
});

static LANGUAGE_SLOTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(one|two|three|four|any|a|an)\s+(?:(?:extra|other|additional)\s+)?languages?\b")
        .expect("Failed to compile language slot regex")
});

static LANGUAGE_NAMES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    LANGUAGES
        .iter()
        .map(|name| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(name).replace('\'', "['’]"));
            (
                *name,
                Regex::new(&pattern).expect("Failed to compile language name regex"),
            )
        })
        .collect()
});

fn slot_count(word: &str) -> u32 {
    word_to_number(word).unwrap_or(1)
}

/// Named languages first, in vocabulary order, then one entry per choice slot.
pub fn extract_languages_from_text(text: &str) -> Vec<LanguageGrant> {
    let first_sentence = match FIRST_SENTENCE_END.find(text) {
        Some(end) => &text[..end.start()],
        None => text,
    };
    let mut remaining = first_sentence.to_string();
    let mut slots = 0;

    if let Some(found) = OF_YOUR_CHOICE.captures(&remaining).map(|caps| {
        (caps[0].to_string(), slot_count(&caps[1]))
    }) {
        slots += found.1;
        remaining = remaining.replacen(&found.0, "", 1);
    }

    let slot_phrases: Vec<(String, u32)> = LANGUAGE_SLOTS
        .captures_iter(&remaining)
        .map(|caps| (caps[0].to_string(), slot_count(&caps[1])))
        .collect();
    for (phrase, count) in slot_phrases {
        slots += count;
        remaining = remaining.replacen(&phrase, "", 1);
    }

    let mut grants: Vec<LanguageGrant> = LANGUAGE_NAMES
        .iter()
        .filter(|(_, re)| re.is_match(&remaining))
        .map(|(name, _)| LanguageGrant::fixed(name))
        .collect();

    grants.extend((0..slots).map(|_| LanguageGrant::choice()));
    grants
}
