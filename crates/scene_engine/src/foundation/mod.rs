//! Foundation module - Core utilities and types
//!
//! - Math types and operations
//! - Arena keys and collections
//! - Logging utilities

pub mod collections;
pub mod logging;
pub mod math;
