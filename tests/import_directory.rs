//! Directory import and configuration files on a real filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rstest::rstest;
use tempfile::TempDir;

use compendium_ingest::config::IngestConfig;
use compendium_ingest::ingestion::loader::discover_files;
use compendium_ingest::ingestion::{
    import_directory, import_directory_with, import_file, load_file, EntityKind, ImportOptions,
    ParsedDocument,
};
use compendium_ingest::IngestError;

const SPELLS: &str = r#"<compendium><spell><name>Light</name><level>0</level></spell><spell><name>Shield</name><level>1</level></spell></compendium>"#;
const FEATS: &str = r#"<compendium><feat><name>Alert</name><text>Always alert.</text></feat></compendium>"#;
const SOURCE: &str = r#"<source><name>Player's Handbook (2014)</name></source>"#;

fn write(dir: &Path, relative: &str, contents: &str) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn compendium_dir() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "spells/core.xml", SPELLS);
    write(dir.path(), "feats.xml", FEATS);
    write(dir.path(), "sources/phb.XML", SOURCE);
    write(dir.path(), "broken.xml", "<compendium><spell>");
    write(dir.path(), "notes.txt", "not a compendium");
    dir
}

#[rstest]
#[case(true)]
#[case(false)]
fn test_import_directory(#[case] parallel: bool) {
    let dir = compendium_dir();
    let options = ImportOptions {
        parallel,
        ..ImportOptions::default()
    };

    let report = import_directory(dir.path(), &options);
    assert_eq!(report.files.len(), 4);
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.total_records(), 4);

    // Outcomes come back in path order regardless of the thread pool
    let names: Vec<String> = report
        .files
        .iter()
        .map(|f| f.path.strip_prefix(dir.path()).unwrap().display().to_string())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    let broken = report.files.iter().find(|f| !f.is_success()).unwrap();
    assert!(broken.path.ends_with("broken.xml"));
    assert!(broken.error.as_deref().unwrap().starts_with("Failed to parse XML"));
    assert!(broken.kinds.is_empty());

    let spells = report
        .files
        .iter()
        .find(|f| f.kinds == vec![EntityKind::Spell])
        .unwrap();
    assert_eq!(spells.record_count, Some(2));
}

#[rstest]
#[case(true)]
#[case(false)]
fn test_documents_stream_to_the_sink(#[case] parallel: bool) {
    let dir = compendium_dir();
    let options = ImportOptions {
        parallel,
        ..ImportOptions::default()
    };

    let seen: Mutex<Vec<(PathBuf, usize)>> = Mutex::new(Vec::new());
    let report = import_directory_with(dir.path(), &options, |path: &Path, doc: &ParsedDocument| {
        seen.lock().unwrap().push((path.to_path_buf(), doc.len()));
        Ok(())
    });

    let mut seen = seen.into_inner().unwrap();
    seen.sort();
    let counts: Vec<usize> = seen.iter().map(|(_, n)| *n).collect();
    assert_eq!(seen.len(), report.succeeded());
    assert_eq!(counts.iter().sum::<usize>(), report.total_records());
    assert!(seen.iter().all(|(p, _)| !p.ends_with("broken.xml")));
}

#[test]
fn test_failing_sink_fails_only_that_file() {
    let dir = compendium_dir();
    let report = import_directory_with(dir.path(), &ImportOptions::default(), |path: &Path, _: &ParsedDocument| {
        if path.ends_with("feats.xml") {
            Err(IngestError::Config("output rejected".to_string()))
        } else {
            Ok(())
        }
    });
    assert_eq!(report.failed(), 2);
    let feats = report.files.iter().find(|f| f.path.ends_with("feats.xml")).unwrap();
    assert_eq!(feats.error.as_deref(), Some("Configuration error: output rejected"));
}

#[test]
fn test_mixed_file_reports_every_kind() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "mixed.xml",
        r#"<compendium><spell><name>Light</name></spell><feat><name>Alert</name></feat></compendium>"#,
    );
    write(dir.path(), "empty.xml", "<compendium/>");

    let report = import_directory(dir.path(), &ImportOptions::default());
    assert_eq!(report.failed(), 0);
    let empty = &report.files[0];
    assert!(empty.path.ends_with("empty.xml"));
    assert_eq!(empty.record_count, Some(0));
    assert!(empty.kinds.is_empty());
    let mixed = &report.files[1];
    assert_eq!(mixed.kinds, vec![EntityKind::Spell, EntityKind::Feat]);
    assert_eq!(mixed.record_count, Some(2));
}

#[test]
fn test_discover_respects_extension() {
    let dir = compendium_dir();
    let options = ImportOptions {
        file_extension: "txt".to_string(),
        ..ImportOptions::default()
    };
    let files = discover_files(dir.path(), &options);
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("notes.txt"));
}

#[test]
fn test_import_single_file() {
    let dir = compendium_dir();
    let outcome = import_file(&dir.path().join("sources/phb.XML"));
    assert!(outcome.is_success());
    assert_eq!(outcome.kinds, vec![EntityKind::Source]);
    assert_eq!(outcome.record_count, Some(1));

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["kinds"][0], "source");
    assert!(json.get("document").is_none());
}

#[test]
fn test_missing_file_outcome() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.xml");

    assert!(matches!(
        load_file(&missing),
        Err(IngestError::FileNotFound { .. })
    ));

    let outcome = import_file(&missing);
    assert!(!outcome.is_success());
    assert!(outcome.error.unwrap().starts_with("XML file not found"));
}

#[test]
fn test_empty_directory() {
    let dir = TempDir::new().unwrap();
    let report = import_directory(dir.path(), &ImportOptions::default());
    assert!(report.files.is_empty());
    assert_eq!(report.total_records(), 0);
}

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/config.toml");

    let mut config = IngestConfig::default();
    config.output_dir = Some(dir.path().join("records"));
    config.logging.level = "debug".to_string();
    config.logging.json_file = false;
    config.import.parallel = false;
    config.save_to(&path).unwrap();

    let loaded = IngestConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.output_dir(), dir.path().join("records"));
    assert!(!ImportOptions::from(loaded.import).parallel);
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[import]\nparallel = \"sometimes\"\n").unwrap();

    let err = IngestConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, IngestError::Config(_)));
    assert!(!err.is_document_error());
}
