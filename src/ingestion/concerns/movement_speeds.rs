//! Special movement speeds granted by traits ("you have a climbing speed of 20
//! feet", "a flying speed equal to your walking speed").

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementSpeeds {
    pub fly_speed: Option<u32>,
    pub swim_speed: Option<u32>,
    pub climb_speed: Option<u32>,
    pub burrow_speed: Option<u32>,
}

impl MovementSpeeds {
    pub fn is_empty(&self) -> bool {
        self.fly_speed.is_none()
            && self.swim_speed.is_none()
            && self.climb_speed.is_none()
            && self.burrow_speed.is_none()
    }

    /// Keep already-known speeds and fill the rest from `other`.
    pub fn merge(&mut self, other: MovementSpeeds) {
        self.fly_speed = self.fly_speed.or(other.fly_speed);
        self.swim_speed = self.swim_speed.or(other.swim_speed);
        self.climb_speed = self.climb_speed.or(other.climb_speed);
        self.burrow_speed = self.burrow_speed.or(other.burrow_speed);
    }
}

static SPEED_GRANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?ix)
        \b(?P<kind>fly(?:ing)?|swim(?:ming)?|climb(?:ing)?|burrow(?:ing)?)\s+speed\s+
        (?:
            of\s+(?P<feet>\d+)\s+feet
          | equal\s+to\s+your\s+walking\s+speed
        )
        ",
    )
    .expect("Failed to compile movement speed regex")
});

/// Extract special speeds from trait text; "equal to your walking speed"
/// resolves to `walking_speed`.
pub fn parse_movement_speeds(text: &str, walking_speed: u32) -> Option<MovementSpeeds> {
    let mut speeds = MovementSpeeds::default();

    for caps in SPEED_GRANT.captures_iter(text) {
        let value = match caps.name("feet") {
            Some(feet) => match feet.as_str().parse() {
                Ok(v) => v,
                Err(_) => continue,
            },
            None => walking_speed,
        };
        let kind = caps["kind"].to_lowercase();
        let slot = if kind.starts_with("fly") {
            &mut speeds.fly_speed
        } else if kind.starts_with("swim") {
            &mut speeds.swim_speed
        } else if kind.starts_with("climb") {
            &mut speeds.climb_speed
        } else {
            &mut speeds.burrow_speed
        };
        slot.get_or_insert(value);
    }

    if speeds.is_empty() {
        None
    } else {
        Some(speeds)
    }
}
