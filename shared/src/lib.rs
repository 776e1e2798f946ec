//! Shared types for the texture array pipeline.
//!
//! Used by both `texarray-common` (core) and `texarray-export` (tooling).

pub mod array_format;
pub mod fs;

pub use array_format::{ArrayFormat, TEX2D_ARRAY_FORMAT};
