/// compendium-ingest - Rules-text extraction for tabletop compendium XML
///
/// Parses class, race, spell, item, feat, monster, background and source
/// documents into normalized records, recovering prerequisites, spell slot
/// tables, natural weapons, charges, saving throws and the other rules facts
/// the compendium only states in prose.

pub mod config;
pub mod error;
pub mod ingestion;
pub mod logging;

#[cfg(test)]
mod tests;

pub use error::{IngestError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
