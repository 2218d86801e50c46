//! Diagnostic Sources
//!
//! Adapters that produce normalized device records: smartctl output
//! normalization, record files, and fixed in-memory sets.

pub mod file_source;
pub mod smartctl;

pub use file_source::*;
pub use smartctl::*;
