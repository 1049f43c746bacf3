//! Shared Pattern Concerns
//!
//! Stateless extraction routines that the entity parsers compose. Each one
//! takes a fragment of rules text and returns a typed value, or `None`/empty
//! when nothing it recognizes is present:
//!
//! - **Source citations**: trailing "Source: Book (year) p. N" blocks
//! - **Charges**, **item spells**, **item saving throws**, **item proficiencies**
//! - **Pack contents**: "Includes:" bullet lists of equipment packs
//! - **Rest timing** and **usage limits**
//! - **Scaling increment** and **projectile scaling** for upcast spells
//! - **Subclass spell tables**: "Cleric Level | Spells" tables
//! - **Unarmored AC**, **movement modifiers**, **natural weapons**, **movement speeds**
//! - **Random tables**, **modifiers** and **dice** notation
//! - **Language grants** named or left to the player's choice
//! - **Resource costs**: ki points, sorcery points, superiority dice and charges
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::concerns::{parse_charges, parse_item_spells};
//!
//! let charges = parse_charges(text);
//! let spells = parse_item_spells(text);
//! ```

pub mod charges;
pub mod dice;
pub mod item_proficiencies;
pub mod item_spells;
pub mod languages;
pub mod modifiers;
pub mod movement_modifiers;
pub mod movement_speeds;
pub mod natural_weapons;
pub mod pack_contents;
pub mod projectile_scaling;
pub mod random_tables;
pub mod resource_costs;
pub mod rest_timing;
pub mod saving_throws;
pub mod scaling_increment;
pub mod source_citations;
pub mod subclass_spell_tables;
pub mod unarmored_ac;
pub mod usage_limits;
pub mod vocabulary;

pub use charges::{parse_charges, Charges, ChargesMax};
pub use dice::canonical_dice;
pub use item_proficiencies::{
    infer_proficiency_type, parse_item_proficiencies, ItemProficiency, ProficiencyType,
};
pub use item_spells::{parse_item_spells, ItemSpell};
pub use languages::{extract_languages_from_text, LanguageGrant};
pub use modifiers::{
    parse_modifier_elements, parse_modifier_text, parse_resistance_modifiers,
    parse_set_score_modifiers, parse_skill_advantages, stealth_disadvantage, strength_speed_penalty, Modifier,
    ModifierCategory, ModifierValue,
};
pub use movement_modifiers::{parse_movement_modifiers, MovementCost, MovementModifier};
pub use movement_speeds::{parse_movement_speeds, MovementSpeeds};
pub use natural_weapons::{parse_natural_weapon, NaturalWeapon};
pub use pack_contents::{parse_pack_contents, PackContentsItem};
pub use projectile_scaling::{
    parse_character_level_beam_scaling, parse_projectile_scaling, ProjectileScaling,
};
pub use random_tables::{parse_random_tables, RandomTable, RandomTableParser, TableEntry};
pub use resource_costs::{
    parse_component_cost, parse_description_cost, parse_resource_cost, ResourceCost, ResourceType,
};
pub use rest_timing::{parse_reset_timing, ResetTiming};
pub use saving_throws::{
    parse_item_saving_throws, parse_spell_saving_throws, SaveEffect, SaveModifier,
    SavingThrowSpec, SpellSavingThrow,
};
pub use scaling_increment::parse_scaling_increment;
pub use source_citations::{
    book_code, extract_citations, parse_citations, strip_citations, CitationExtraction, SourceCitation,
};
pub use subclass_spell_tables::{parse_subclass_spell_table, SubclassSpellLevel};
pub use unarmored_ac::{parse_unarmored_ac, UnarmoredAc};
pub use usage_limits::{parse_usage_limit, UsageLimit};
