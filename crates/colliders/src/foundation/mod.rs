//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the crate:
//! - Vector math and rotations
//! - Logging utilities

pub mod math;
pub mod logging;
