//! Health Assessment Module
//!
//! Risk classification, health warning detection and replacement
//! prediction for individual storage devices.

pub mod assessment;
pub mod classifier;
pub mod mode;
pub mod predictor;
pub mod tier;
pub mod timeline;
pub mod warnings;

#[cfg(test)]
mod properties;

pub use assessment::*;
pub use classifier::*;
pub use mode::*;
pub use predictor::*;
pub use tier::*;
pub use timeline::*;
pub use warnings::*;
