//! Class documents end to end: proficiencies, subclass partitioning, optional
//! spellcasting, multiclass minimums and starting equipment.

use compendium_ingest::ingestion::parsers::class::{SpellPreparationMethod, SpellProgression};
use compendium_ingest::ingestion::parsers::{ClassParser, ClassRecord, EntityParser};

const FIGHTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<compendium version="5" auto_indent="NO">
  <class>
    <name>Fighter</name>
    <hd>10</hd>
    <proficiency>Strength, Constitution, Acrobatics, Animal Handling, Athletics</proficiency>
    <numSkills>2</numSkills>
    <armor>Light Armor, Medium Armor, Heavy Armor, Shields</armor>
    <weapons>Simple Weapons, Martial Weapons</weapons>
    <spellAbility>Intelligence</spellAbility>
    <wealth>5d4x10</wealth>
    <autolevel level="1">
      <feature optional="YES">
        <name>Starting Fighter</name>
        <text>As a 1st-level Fighter:</text>
        <text>• You begin play with 10+your Constitution modifier hit points.</text>
        <text>You begin play with the following equipment, in addition to any equipment provided by your background.</text>
        <text>• (a) chain mail or (b) leather armor, longbow, and arrows (20)</text>
        <text>• (a) a martial weapon and a shield or (b) two martial weapons</text>
        <text>• (a) a light crossbow and 20 bolts or (b) two handaxes</text>
        <text>• (a) a dungeoneer's pack or (b) an explorer's pack</text>
        <text>If you forgo this starting equipment, you start with 5d4 x 10 gp to buy your equipment.</text>
      </feature>
      <feature optional="YES">
        <name>Multiclass Fighter</name>
        <text>To multiclass as a Fighter, you must meet the following prerequisites:</text>
        <text>Ability Score Minimum:</text>
        <text>• Strength 13, or</text>
        <text>• Dexterity 13</text>
        <text>Proficiencies Gained:</text>
        <text>• Light armor, medium armor, shields, simple weapons, martial weapons</text>
      </feature>
      <feature>
        <name>Fighting Style</name>
        <text>You adopt a particular style of fighting as your specialty.</text>
        <text>Source: Player's Handbook (2014) p. 72</text>
      </feature>
    </autolevel>
    <autolevel level="3">
      <feature optional="YES">
        <name>Martial Archetype: Eldritch Knight</name>
        <text>The archetypal Eldritch Knight combines martial mastery with a careful study of magic.</text>
      </feature>
      <feature optional="YES">
        <name>Spellcasting (Eldritch Knight)</name>
        <text>You know two cantrips of your choice from the wizard spell list.</text>
      </feature>
      <slots optional="YES">2,2</slots>
      <counter>
        <name>Spells Known</name>
        <value>3</value>
      </counter>
    </autolevel>
    <autolevel level="4">
      <slots optional="YES">2,3</slots>
    </autolevel>
  </class>
</compendium>"#;

const ROGUE: &str = r#"<compendium>
  <class>
    <name>Rogue</name>
    <hd>8</hd>
    <autolevel level="1">
      <feature><name>Sneak Attack</name><text>Once per turn, you can deal an extra 1d6 damage.</text></feature>
      <feature><name>Thieves' Cant</name><text>You learn thieves' cant.</text></feature>
    </autolevel>
    <autolevel level="3">
      <feature optional="YES"><name>Roguish Archetype: Thief</name><text>You hone your skills in the larcenous arts.</text></feature>
      <feature optional="YES"><name>Fast Hands (Thief)</name><text>You can use the bonus action granted by your Cunning Action.</text></feature>
      <feature optional="YES"><name>Roguish Archetype: Arcane Trickster</name><text>You enhance your fine-honed skills with magic.</text></feature>
    </autolevel>
    <autolevel level="17">
      <feature optional="YES"><name>Spell Thief (Arcane Trickster)</name><text>You gain the ability to magically steal the knowledge of how to cast a spell.</text></feature>
    </autolevel>
  </class>
</compendium>"#;

const WIZARD: &str = r#"<compendium>
  <class>
    <name>Wizard</name>
    <hd>6</hd>
    <spellAbility>Intelligence</spellAbility>
    <autolevel level="1">
      <feature><name>Spellcasting</name><text>As a student of arcane magic, you have a spellbook containing spells.</text></feature>
      <slots>3,2</slots>
    </autolevel>
    <autolevel level="2"><slots>3,3</slots></autolevel>
    <autolevel level="3"><slots>3,4,2</slots></autolevel>
  </class>
</compendium>"#;

fn parse_one(xml: &str) -> ClassRecord {
    let mut classes = ClassParser::new().parse(xml).expect("class document should parse");
    assert_eq!(classes.len(), 1);
    classes.remove(0)
}

#[test]
fn test_fighter_optional_spellcasting_belongs_to_subclass() {
    let fighter = parse_one(FIGHTER);

    assert_eq!(fighter.name, "Fighter");
    assert_eq!(fighter.hit_die, 10);
    assert!(fighter.spell_progression.is_none());
    assert!(fighter.spellcasting_ability.is_none());
    assert_eq!(fighter.spell_preparation_method, None);

    let knight = fighter
        .subclasses
        .iter()
        .find(|s| s.name == "Eldritch Knight")
        .expect("Eldritch Knight subclass");
    assert_eq!(knight.spellcasting_ability.as_deref(), Some("Intelligence"));
    let progression = knight.spell_progression.as_ref().expect("subclass slots");
    assert_eq!(
        progression.iter().map(|r| r.level).collect::<Vec<_>>(),
        vec![3, 4]
    );
    assert_eq!(progression[0].spells_known, Some(3));
    assert_eq!(progression[1].spell_slots_1st, 3);
    assert_eq!(knight.features.len(), 2);
    assert_eq!(fighter.archetype.as_deref(), Some("Martial Archetype"));
}

#[test]
fn test_fighter_json_omits_base_casting_keys() {
    let fighter = parse_one(FIGHTER);
    let json = serde_json::to_value(&fighter).unwrap();
    let object = json.as_object().unwrap();
    assert!(!object.contains_key("spell_progression"));
    assert!(!object.contains_key("spellcasting_ability"));

    let knight = &json["subclasses"][0];
    assert_eq!(knight["spellcasting_ability"], "Intelligence");
    assert_eq!(knight["spell_progression"].as_array().unwrap().len(), 2);
}

#[test]
fn test_fighter_base_features_and_sources() {
    let fighter = parse_one(FIGHTER);
    let names: Vec<&str> = fighter.features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Starting Fighter", "Multiclass Fighter", "Fighting Style"]);

    let style = &fighter.features[2];
    assert_eq!(style.description, "You adopt a particular style of fighting as your specialty.");
    assert_eq!(style.sources.len(), 1);
    assert_eq!(style.sources[0].code, "PHB");
    assert!(!style.is_optional);
}

#[test]
fn test_fighter_multiclass_minimums_are_alternatives() {
    let fighter = parse_one(FIGHTER);
    let reqs = &fighter.multiclass_requirements;
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[0].ability, "strength");
    assert_eq!(reqs[1].ability, "dexterity");
    assert!(reqs.iter().all(|r| r.minimum == 13 && r.is_alternative));
}

#[test]
fn test_fighter_starting_equipment() {
    let fighter = parse_one(FIGHTER);
    let equipment = &fighter.equipment;
    assert_eq!(equipment.wealth.as_deref(), Some("5d4x10"));
    assert_eq!(equipment.items.len(), 8);
    assert!(equipment.items.iter().all(|i| i.is_choice));
    assert!(equipment
        .items
        .iter()
        .all(|i| !i.description.contains("hit points")));
    assert_eq!(equipment.items[0].description, "chain mail");
    assert_eq!(equipment.items[7].choice_group.as_deref(), Some("choice_4"));
}

#[test]
fn test_fighter_skill_choices() {
    let fighter = parse_one(FIGHTER);
    assert_eq!(fighter.skill_choices, Some(2));
    let json = serde_json::to_value(&fighter.proficiencies).unwrap();
    let skills: Vec<_> = json
        .as_array()
        .unwrap()
        .iter()
        .filter(|p| p["type"] == "skill")
        .collect();
    assert_eq!(skills.len(), 3);
    assert_eq!(skills[0]["quantity"], 2);
}

#[test]
fn test_spell_thief_is_not_a_thief_feature() {
    let rogue = parse_one(ROGUE);

    let names: Vec<&str> = rogue.subclasses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Arcane Trickster", "Thief"]);

    let thief = &rogue.subclasses[1];
    let thief_features: Vec<&str> = thief.features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(thief_features, vec!["Roguish Archetype: Thief", "Fast Hands (Thief)"]);

    let trickster = &rogue.subclasses[0];
    assert!(trickster
        .features
        .iter()
        .any(|f| f.name == "Spell Thief (Arcane Trickster)"));

    let base: Vec<&str> = rogue.features.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(base, vec!["Sneak Attack", "Thieves' Cant"]);
    assert_eq!(rogue.languages.len(), 1);
    assert_eq!(rogue.languages[0].slug.as_deref(), Some("thieves-cant"));
}

#[test]
fn test_wizard_full_caster() {
    let wizard = parse_one(WIZARD);
    assert_eq!(wizard.spellcasting_ability.as_deref(), Some("Intelligence"));
    assert_eq!(
        wizard.spell_preparation_method,
        Some(SpellPreparationMethod::Spellbook)
    );

    let progression = wizard.spell_progression.expect("base slots");
    assert_eq!(progression.len(), 3);
    assert_eq!(
        progression[2],
        SpellProgression {
            level: 3,
            cantrips_known: 3,
            spell_slots_1st: 4,
            spell_slots_2nd: 2,
            spells_known: Some(10),
            ..Default::default()
        }
    );
    let known: Vec<Option<u32>> = progression.iter().map(|row| row.spells_known).collect();
    assert_eq!(known, vec![Some(6), Some(8), Some(10)]);
    assert!(wizard.subclasses.is_empty());
}
