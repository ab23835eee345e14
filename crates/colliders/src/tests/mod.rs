//! Cross-module tests
//!
//! Properties that involve several shape kinds at once, and the full
//! enumerate / filter in parallel / hand off to the owner pipeline.
