//! Compendium Ingestion
//!
//! Turns compendium XML into normalized records:
//!
//! - [`xml`]: owned element tree read with `quick-xml`
//! - [`concerns`]: stateless pattern extractors shared by the parsers
//! - [`parsers`]: one parser per entity element
//! - [`loader`]: file loading, document dispatch and directory import

pub mod concerns;
pub mod loader;
pub mod parsers;
pub mod xml;

pub use loader::{
    detect_kind, import_directory, import_directory_with, import_file, import_file_with, load_file,
    parse_document, EntityKind, EntityRecords, FileOutcome, ImportOptions, ImportReport,
    ParsedDocument,
};
pub use parsers::EntityParser;
