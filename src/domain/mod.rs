//! Domain layer - Normalized diagnostics and port definitions
//!
//! This module defines the per-device record the assessment engine consumes
//! and the port that diagnostic adapters implement, following hexagonal
//! architecture principles.

pub mod lenient;
pub mod ports;

pub use ports::*;
