//! Texture array import core
//!
//! Verifies that a list of 2D textures can be packed as slices of one texture
//! array and assembles the array. Everything host specific (where textures
//! live, how they are decoded) goes through [`AssetResolver`].
//!
//! # Modules
//!
//! - [`verify`] - Per-slice consistency checks against the master slice
//! - [`builder`] - Array assembly with sentinel fallback
//! - [`importer`] - Persisted settings and the import entry point
//! - [`inspector`] - Row status and assignment rules for list editors
//! - [`formats`] - Pixel formats and the `.texarr` resource format

pub mod builder;
pub mod formats;
pub mod importer;
pub mod inspector;
pub mod params;
pub mod resolver;
pub mod slices;
pub mod verify;

pub use builder::{
    BuildOutput, FALLBACK_FORMAT, FALLBACK_HEIGHT, FALLBACK_WIDTH, SENTINEL_COLOR,
    SliceDiagnostic, TargetPlatform, build, fallback_attributes,
};
pub use formats::{ArrayResource, ResourceError, TextureArrayHeader, TextureFormat};
pub use importer::{ImporterSettings, import};
pub use params::{ArrayParameters, FilterMode, MAX_ANISO_LEVEL, WrapMode};
pub use resolver::{
    AssetResolver, MemoryResolver, ReferenceAttributes, ResolveError, TextureHandle,
};
pub use slices::{SliceList, SliceListError};
pub use verify::{ListIssue, ListVerification, VerifyOutcome, describe, verify, verify_all};

pub use texarray_shared::TEX2D_ARRAY_FORMAT;
