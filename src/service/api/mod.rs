//! API Module
//!
//! REST API for ad-hoc assessment and host reports.

pub mod rest;
pub mod server;

pub use rest::*;
pub use server::*;
