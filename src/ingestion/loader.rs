//! Document Loader
//!
//! Reads compendium files, decides which entity parser a document belongs to
//! from its root and first entity element, and fans a directory import out
//! over the rayon thread pool. Files are independent: a file that fails to
//! read or parse is reported in its [`FileOutcome`] and the batch continues.
//!
//! # Example
//!
//! ```ignore
//! use crate::ingestion::loader::{import_directory, ImportOptions};
//!
//! let report = import_directory(Path::new("compendium/"), &ImportOptions::default());
//! println!("{} records from {} files", report.total_records(), report.files.len());
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use super::parsers::{
    BackgroundParser, BackgroundRecord, ClassParser, ClassRecord, EntityParser, FeatParser,
    FeatRecord, ItemParser, ItemRecord, MonsterParser, MonsterRecord, RaceParser, RaceRecord,
    SourceParser, SourceRecord, SpellParser, SpellRecord,
};
use super::xml::{self, Element};
use crate::config::ImportConfig;
use crate::error::{IngestError, Result};

// ============================================================================
// Document Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Class,
    Race,
    Spell,
    Item,
    Feat,
    Monster,
    Background,
    Source,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        Self::Class,
        Self::Race,
        Self::Spell,
        Self::Item,
        Self::Feat,
        Self::Monster,
        Self::Background,
        Self::Source,
    ];

    /// Element name of one entity of this kind.
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::Class => ClassParser::ELEMENT,
            Self::Race => RaceParser::ELEMENT,
            Self::Spell => SpellParser::ELEMENT,
            Self::Item => ItemParser::ELEMENT,
            Self::Feat => FeatParser::ELEMENT,
            Self::Monster => MonsterParser::ELEMENT,
            Self::Background => BackgroundParser::ELEMENT,
            Self::Source => SourceParser::ELEMENT,
        }
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.element_name() == name)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.element_name())
    }
}

/// The typed records of one entity kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum EntityRecords {
    Class(Vec<ClassRecord>),
    Race(Vec<RaceRecord>),
    Spell(Vec<SpellRecord>),
    Item(Vec<ItemRecord>),
    Feat(Vec<FeatRecord>),
    Monster(Vec<MonsterRecord>),
    Background(Vec<BackgroundRecord>),
    Source(Vec<SourceRecord>),
}

impl EntityRecords {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Class(_) => EntityKind::Class,
            Self::Race(_) => EntityKind::Race,
            Self::Spell(_) => EntityKind::Spell,
            Self::Item(_) => EntityKind::Item,
            Self::Feat(_) => EntityKind::Feat,
            Self::Monster(_) => EntityKind::Monster,
            Self::Background(_) => EntityKind::Background,
            Self::Source(_) => EntityKind::Source,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Class(r) => r.len(),
            Self::Race(r) => r.len(),
            Self::Spell(r) => r.len(),
            Self::Item(r) => r.len(),
            Self::Feat(r) => r.len(),
            Self::Monster(r) => r.len(),
            Self::Background(r) => r.len(),
            Self::Source(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Every entity kind found in one document, one section per kind in order of
/// first appearance. Serializes as the list of sections.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ParsedDocument {
    pub sections: Vec<EntityRecords>,
}

impl ParsedDocument {
    pub fn kinds(&self) -> Vec<EntityKind> {
        self.sections.iter().map(EntityRecords::kind).collect()
    }

    /// Records across all sections.
    pub fn len(&self) -> usize {
        self.sections.iter().map(EntityRecords::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn section(&self, kind: EntityKind) -> Option<&EntityRecords> {
        self.sections.iter().find(|s| s.kind() == kind)
    }

    pub fn into_section(self, kind: EntityKind) -> Option<EntityRecords> {
        self.sections.into_iter().find(|s| s.kind() == kind)
    }
}

// ============================================================================
// Single Documents
// ============================================================================

/// Read a compendium file as UTF-8.
pub fn load_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Entity kinds of a root in order of first appearance. `None` when the root
/// is neither `<compendium>` nor a bare `<source>`.
fn kinds_of_root(root: &Element) -> Option<Vec<EntityKind>> {
    if root.name == SourceParser::ELEMENT {
        return Some(vec![EntityKind::Source]);
    }
    if root.name != "compendium" {
        return None;
    }

    let mut kinds = Vec::new();
    for child in &root.children {
        match EntityKind::from_element_name(&child.name) {
            Some(kind) if !kinds.contains(&kind) => kinds.push(kind),
            Some(_) => {}
            None => tracing::debug!(element = %child.name, "Skipping unrecognized element"),
        }
    }
    Some(kinds)
}

/// Kind of a document: a bare `<source>`, or the first entity element of a
/// `<compendium>`. Malformed and empty documents have no kind.
pub fn detect_kind(xml: &str) -> Option<EntityKind> {
    let root = xml::parse_document(xml).ok()?;
    kinds_of_root(&root)?.into_iter().next()
}

/// Parse every entity kind present in a document. A `<compendium>` without
/// entity elements is an empty document; any other root is an error.
pub fn parse_document(xml: &str) -> Result<ParsedDocument> {
    let root = xml::parse_document(xml)?;
    let kinds = kinds_of_root(&root).ok_or_else(|| {
        IngestError::UnknownDocument(format!("unexpected root element <{}>", root.name))
    })?;
    if kinds.is_empty() {
        tracing::debug!("Compendium has no entity elements");
    }

    Ok(ParsedDocument {
        sections: kinds.into_iter().map(|kind| parse_root_as(&root, kind)).collect(),
    })
}

/// Parse the elements of one kind below an already-read root.
pub fn parse_root_as(root: &Element, kind: EntityKind) -> EntityRecords {
    match kind {
        EntityKind::Class => EntityRecords::Class(ClassParser::new().parse_root(root)),
        EntityKind::Race => EntityRecords::Race(RaceParser::new().parse_root(root)),
        EntityKind::Spell => EntityRecords::Spell(SpellParser::new().parse_root(root)),
        EntityKind::Item => EntityRecords::Item(ItemParser::new().parse_root(root)),
        EntityKind::Feat => EntityRecords::Feat(FeatParser::new().parse_root(root)),
        EntityKind::Monster => EntityRecords::Monster(MonsterParser::new().parse_root(root)),
        EntityKind::Background => {
            EntityRecords::Background(BackgroundParser::new().parse_root(root))
        }
        EntityKind::Source => EntityRecords::Source(SourceParser::new().parse_root(root)),
    }
}

// ============================================================================
// Directory Import
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub parallel: bool,
    /// Extension without the dot, matched case-insensitively
    pub file_extension: String,
    pub follow_symlinks: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportConfig::default().into()
    }
}

impl From<ImportConfig> for ImportOptions {
    fn from(config: ImportConfig) -> Self {
        Self {
            parallel: config.parallel,
            file_extension: config.file_extension,
            follow_symlinks: config.follow_symlinks,
        }
    }
}

/// Result of importing one file. The records themselves go to the sink.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub kinds: Vec<EntityKind>,
    pub record_count: Option<usize>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub files: Vec<FileOutcome>,
}

impl ImportReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    pub fn total_records(&self) -> usize {
        self.files.iter().filter_map(|f| f.record_count).sum()
    }
}

/// Every file under `dir` with the configured extension, sorted by path.
pub fn discover_files(dir: &Path, options: &ImportOptions) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Walk error under {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&options.file_extension))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Load and parse one file into an outcome, never failing. The parsed
/// document is dropped.
pub fn import_file(path: &Path) -> FileOutcome {
    import_file_with(path, &|_: &Path, _: &ParsedDocument| Ok(()))
}

/// Load and parse one file, handing the document to `sink` before it is
/// dropped. A sink error fails the file.
pub fn import_file_with<F>(path: &Path, sink: &F) -> FileOutcome
where
    F: Fn(&Path, &ParsedDocument) -> Result<()>,
{
    let started = Instant::now();
    let parsed = load_file(path)
        .and_then(|xml| parse_document(&xml))
        .and_then(|document| sink(path, &document).map(|()| document));

    match parsed {
        Ok(document) => {
            let kinds = document.kinds();
            tracing::info!(
                path = %path.display(),
                kinds = ?kinds,
                records = document.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Imported file"
            );
            FileOutcome {
                path: path.to_path_buf(),
                kinds,
                record_count: Some(document.len()),
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to import file");
            FileOutcome {
                path: path.to_path_buf(),
                kinds: Vec::new(),
                record_count: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Import every matching file under `dir`, in path order, keeping only the
/// per-file outcomes.
pub fn import_directory(dir: &Path, options: &ImportOptions) -> ImportReport {
    import_directory_with(dir, options, |_: &Path, _: &ParsedDocument| Ok(()))
}

/// Import every matching file under `dir`, streaming each parsed document to
/// `sink` as soon as it is ready. The sink runs on the worker threads when the
/// import is parallel.
pub fn import_directory_with<F>(dir: &Path, options: &ImportOptions, sink: F) -> ImportReport
where
    F: Fn(&Path, &ParsedDocument) -> Result<()> + Sync,
{
    let started = Instant::now();
    let paths = discover_files(dir, options);

    let files: Vec<FileOutcome> = if options.parallel {
        paths.par_iter().map(|path| import_file_with(path, &sink)).collect()
    } else {
        paths.iter().map(|path| import_file_with(path, &sink)).collect()
    };

    let report = ImportReport { files };
    tracing::info!(
        dir = %dir.display(),
        files = report.files.len(),
        failed = report.failed(),
        records = report.total_records(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Import complete"
    );
    report
}
