//! Property-based tests for the XML tree reader
//!
//! Tests invariants:
//! - Never panics on arbitrary input
//! - Leading integers parse back to their value
//! - Loading the same document twice gives the same records
//! - Every entity kind in a compendium gets its own section

use proptest::prelude::*;

use crate::ingestion::loader::{self, detect_kind, EntityKind};
use crate::ingestion::xml::{leading_int, parse_document};

/// A compendium built from entity elements of several kinds, in any order
fn arb_compendium() -> impl Strategy<Value = (String, Vec<&'static str>)> {
    prop::collection::vec(
        prop::sample::select(vec![
            ("spell", "<spell><name>Fire Bolt</name><level>0</level><components>V, S</components><text>A creature takes 1d10 fire damage.</text><roll description=\"Fire Damage\">1d10</roll></spell>"),
            ("feat", "<feat><name>Martial Adept</name><prerequisite>Strength or Dexterity 13\nSmall Race</prerequisite><text>You can expend one superiority die.</text></feat>"),
            ("item", "<item><name>Wand of Magic Missiles</name><type>WD</type><text>This wand has 7 charges.</text></item>"),
            ("race", "<race><name>Tabaxi</name><size>M</size><speed>30</speed><trait><name>Cat's Claws</name><text>Your claws are natural weapons, which you can use to make unarmed strikes. If you hit with them, you deal slashing damage equal to 1d4 + your Strength modifier.</text></trait></race>"),
            ("background", "<background><name>Acolyte</name><proficiency>Insight, Religion</proficiency></background>"),
            ("monster", "<monster><name>Goblin</name><size>S</size><ac>15 (leather armor, shield)</ac><hp>7 (2d6)</hp></monster>"),
            ("npc", "<npc><name>Nobody</name></npc>"),
        ]),
        0..8,
    )
    .prop_map(|entries| {
        let body: String = entries.iter().map(|(_, xml)| *xml).collect();
        let names = entries.iter().map(|(name, _)| *name).collect();
        (format!("<compendium version=\"5\">{}</compendium>", body), names)
    })
}

proptest! {
    #[test]
    fn prop_document_parse_is_deterministic((xml, _) in arb_compendium()) {
        let first = serde_json::to_value(loader::parse_document(&xml).unwrap()).unwrap();
        let second = serde_json::to_value(loader::parse_document(&xml).unwrap()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_every_kind_gets_a_section((xml, names) in arb_compendium()) {
        let doc = loader::parse_document(&xml).unwrap();

        let mut expected: Vec<EntityKind> = Vec::new();
        for kind in names.iter().filter_map(|name| EntityKind::from_element_name(name)) {
            if !expected.contains(&kind) {
                expected.push(kind);
            }
        }
        prop_assert_eq!(doc.kinds(), expected.clone());
        prop_assert_eq!(detect_kind(&xml), expected.first().copied());
        prop_assert_eq!(doc.len(), names.iter().filter(|name| **name != "npc").count());
    }

    #[test]
    fn prop_parse_never_panics(xml in "[ -~\n]{0,300}") {
        let _ = parse_document(&xml);
        let _ = detect_kind(&xml);
    }

    #[test]
    fn prop_parse_never_panics_on_tag_soup(
        tags in prop::collection::vec(prop::sample::select(vec![
            "<compendium>", "</compendium>", "<spell>", "</spell>", "<name>", "</name>",
            "<text/>", "&amp;", "&bogus;", "<![CDATA[x]]>", "<!-- c -->", "Fireball",
        ]), 0..20)
    ) {
        let xml = tags.concat();
        let _ = parse_document(&xml);
        let _ = detect_kind(&xml);
    }

    #[test]
    fn prop_leading_int_roundtrip(value in -1000i32..1000, suffix in "( [a-z() ]{0,20})?") {
        let text = format!("{}{}", value, suffix);
        prop_assert_eq!(leading_int(&text), Some(value));
    }

    #[test]
    fn prop_text_content_preserved(text in "[a-zA-Z0-9 .,]{1,80}") {
        let xml = format!("<compendium><name>{}</name></compendium>", text);
        let root = parse_document(&xml).unwrap();
        prop_assert_eq!(root.child_text_or_empty("name"), text.trim());
    }
}
