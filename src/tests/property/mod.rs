//! Property-based tests for compendium-ingest
//!
//! This module contains property-based tests using the proptest framework.
//! Property tests verify invariants that should hold for all inputs, rather
//! than testing specific cases.
//!
//! ## Running Property Tests
//!
//! Run all property tests:
//! ```sh
//! cargo test property --release
//! ```
//!
//! Run a specific property test module:
//! ```sh
//! cargo test property::concern_props --release
//! ```
//!
//! ## Test Modules
//!
//! - `concern_props`: Tests for the shared pattern concerns
//!   - Never panics on arbitrary rules text
//!   - Stripping citations is idempotent
//!   - Canonical dice notation is a fixed point
//!   - Resolved unarmored AC stays within its valid range
//!   - Extraction is deterministic
//!
//! - `prerequisite_props`: Tests for feat prerequisite grouping
//!   - Group ids start at 1 and never decrease within a line
//!   - A fact is an alternative exactly when its group has 2+ members
//!   - Ability thresholds carry their minimum value
//!   - Lines never share an OR group; no text is lost
//!
//! - `class_props`: Tests for class slot tables and subclass matching
//!   - One base row per distinct non-optional level
//!   - Optional-only casters have no base progression or ability
//!   - A trailing parenthetical always matches its subclass
//!   - A longer subclass name never matches a shorter one
//!   - Base and subclass progressions together cover every slot level
//!
//! - `xml_props`: Tests for the XML tree reader
//!   - Never panics on arbitrary input
//!   - Leading integers parse back to their value
//!   - Every entity kind in a compendium gets its own section
//!
//! ## Property Testing Philosophy
//!
//! Property-based testing helps find edge cases that manual test cases might miss.
//! The proptest framework will:
//!
//! 1. Generate random inputs based on defined strategies
//! 2. Test each property with many different inputs
//! 3. If a failure is found, shrink the input to find the minimal failing case
//! 4. Store failing cases in a regression file for future testing

mod class_props;
mod concern_props;
mod prerequisite_props;
mod xml_props;
