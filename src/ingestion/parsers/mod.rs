//! Entity Parsers
//!
//! One parser per compendium entity element. Every parser implements
//! [`EntityParser`]: it reads a whole document and returns one record per
//! entity element, in document order, skipping elements it cannot name.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::parsers::{EntityParser, SpellParser};
//!
//! let spells = SpellParser::new().parse(&xml)?;
//! ```

pub mod background;
pub mod class;
pub mod common;
pub mod feat;
pub mod item;
pub mod monster;
pub mod race;
pub mod source;
pub mod spell;

pub use background::{BackgroundParser, BackgroundRecord};
pub use class::{ClassParser, ClassRecord};
pub use common::{EntityParser, RollRecord, TraitRecord};
pub use feat::{parse_prerequisites, FeatParser, FeatRecord, Prerequisite, PrerequisiteType};
pub use item::{ItemParser, ItemRecord};
pub use monster::{MonsterParser, MonsterRecord};
pub use race::{RaceParser, RaceRecord};
pub use source::{SourceParser, SourceRecord};
pub use spell::{SpellParser, SpellRecord};
