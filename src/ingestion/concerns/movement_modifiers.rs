//! Movement Modifiers
//!
//! Changes to how movement is paid for ("Climbing doesn't cost you extra
//! movement", "standing up uses only 5 feet of your movement") and flat speed
//! bonuses ("Your speed increases by 10 feet").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// Movement cost of an activity: a fixed number of feet, or `"normal"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MovementCost {
    Feet(u32),
    Keyword(String),
}

impl MovementCost {
    pub fn normal() -> Self {
        Self::Keyword("normal".to_string())
    }

    pub fn is_normal(&self) -> bool {
        matches!(self, Self::Keyword(k) if k == "normal")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MovementModifier {
    MovementCost {
        activity: String,
        cost: MovementCost,
        condition: Option<String>,
    },
    SpeedBonus {
        value: i32,
        movement_type: String,
    },
}

impl MovementModifier {
    /// Activity name for movement-cost modifiers.
    pub fn activity(&self) -> Option<&str> {
        match self {
            Self::MovementCost { activity, .. } => Some(activity),
            Self::SpeedBonus { .. } => None,
        }
    }
}

// ============================================================================
// Regex Patterns
// ============================================================================

static NO_EXTRA_MOVEMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?:\b(?P<lead>(?:when|while|if)\s+[^,.]+?),\s*)?
        (?P<activity>(?:[a-z]+\s){0,2}[a-z]+)
        \s+(?:doesn['’]t|does\s+not)\s+cost\s+(?:you\s+)?extra\s+movement
        (?P<trail>[^.\n]*)
        ",
    )
    .expect("Failed to compile extra movement regex")
});

static STANDING_UP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)standing\s+up\s+(?:uses|costs)\s+only\s+(\d+)\s+feet")
        .expect("Failed to compile standing up regex")
});

static RUNNING_JUMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)running\s+(?:long|high)\s+jump[^.]*?after\s+moving\s+only\s+(\d+)\s+feet")
        .expect("Failed to compile running jump regex")
});

static SPEED_INCREASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        (?:your\s+(?P<kind>walking|flying|swimming|climbing|burrowing)?\s*speed\s+increases\s+by
          |increase\s+your\s+(?P<kind2>walking|flying|swimming|climbing|burrowing)?\s*speed\s+by
        )
        \s+(?P<value>\d+)\s+feet
        ",
    )
    .expect("Failed to compile speed increase regex")
});

// ============================================================================
// Extraction
// ============================================================================

/// Extract every movement modifier mentioned in the text, cost modifiers first.
pub fn parse_movement_modifiers(text: &str) -> Vec<MovementModifier> {
    let mut modifiers = Vec::new();

    for caps in NO_EXTRA_MOVEMENT.captures_iter(text) {
        let Some(activity) = caps.name("activity") else {
            continue;
        };
        let lead = caps.name("lead").map(|m| m.as_str().trim());
        let trail = caps
            .name("trail")
            .map(|m| m.as_str().trim())
            .filter(|t| !t.is_empty());
        let condition = match (lead, trail) {
            (Some(lead), Some(trail)) => Some(format!("{} {}", lead, trail)),
            (Some(lead), None) => Some(lead.to_string()),
            (None, Some(trail)) => Some(trail.to_string()),
            (None, None) => None,
        };
        modifiers.push(MovementModifier::MovementCost {
            activity: activity_slug(activity.as_str()),
            cost: MovementCost::normal(),
            condition,
        });
    }

    if let Some(caps) = STANDING_UP.captures(text) {
        if let Ok(feet) = caps[1].parse() {
            modifiers.push(MovementModifier::MovementCost {
                activity: "standing_from_prone".to_string(),
                cost: MovementCost::Feet(feet),
                condition: None,
            });
        }
    }

    if let Some(caps) = RUNNING_JUMP.captures(text) {
        if let Ok(feet) = caps[1].parse() {
            modifiers.push(MovementModifier::MovementCost {
                activity: "running_jump".to_string(),
                cost: MovementCost::Feet(feet),
                condition: None,
            });
        }
    }

    for caps in SPEED_INCREASE.captures_iter(text) {
        let Ok(value) = caps["value"].parse() else {
            continue;
        };
        let kind = caps
            .name("kind")
            .or_else(|| caps.name("kind2"))
            .map(|m| m.as_str().to_lowercase());
        let movement_type = match kind.as_deref() {
            Some("flying") => "fly",
            Some("swimming") => "swim",
            Some("climbing") => "climb",
            Some("burrowing") => "burrow",
            _ => "walk",
        };
        modifiers.push(MovementModifier::SpeedBonus {
            value,
            movement_type: movement_type.to_string(),
        });
    }

    modifiers
}

fn activity_slug(activity: &str) -> String {
    activity
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

// ============================================================================
// Tests
// ============================================================================
