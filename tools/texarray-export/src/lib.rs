//! texarray-export library
//!
//! Filesystem host for the texture array importer: resolves texture handles to
//! image files, loads and saves `.tex2darray` configurations and writes
//! `.texarr` resources.

pub mod compress;
pub mod disk;
pub mod project;
pub mod watch;

pub use disk::{DiskResolver, TextureImportSettings};
pub use project::{ImportResult, WriteOutcome};
