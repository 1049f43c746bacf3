//! In-crate test suites that need access to private modules.

mod property;
