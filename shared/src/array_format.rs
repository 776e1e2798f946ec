//! File identity for texture array assets.
//!
//! This module defines the `ArrayFormat` struct which serves as the single source of truth
//! for the file extensions, magic bytes and importer version of texture array assets.
//!
//! # Example
//!
//! ```
//! use texarray_shared::TEX2D_ARRAY_FORMAT;
//!
//! // Configuration files routed to the importer
//! assert_eq!(TEX2D_ARRAY_FORMAT.extension, "tex2darray");
//!
//! // Built resources
//! assert_eq!(TEX2D_ARRAY_FORMAT.resource_ext, "texarr");
//! assert_eq!(TEX2D_ARRAY_FORMAT.magic, b"TXAR");
//! ```

use std::path::Path;

/// Identity of a texture array asset type.
///
/// The host uses `extension` to route files to the importer. Bumping `version`
/// invalidates every previously built resource.
#[derive(Debug, Clone, Copy)]
pub struct ArrayFormat {
    /// Configuration file extension without dot (e.g., "tex2darray")
    pub extension: &'static str,

    /// Built resource extension without dot (e.g., "texarr")
    pub resource_ext: &'static str,

    /// Magic bytes at start of a built resource (4 bytes)
    pub magic: &'static [u8; 4],

    /// Importer version, written into every built resource
    pub version: u16,

    /// Sidecar suffix holding per-texture import settings (e.g., "import.toml")
    pub import_settings_ext: &'static str,
}

impl ArrayFormat {
    pub const fn new(
        extension: &'static str,
        resource_ext: &'static str,
        magic: &'static [u8; 4],
        version: u16,
        import_settings_ext: &'static str,
    ) -> Self {
        Self {
            extension,
            resource_ext,
            magic,
            version,
            import_settings_ext,
        }
    }

    /// Check whether `path` is a configuration file handled by this importer.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension))
    }

    /// File name used for freshly created assets, e.g. `New Texture2DArray.tex2darray`.
    pub fn default_file_name(&self, suffix: Option<u32>) -> String {
        match suffix {
            Some(n) => format!("New Texture2DArray {}.{}", n, self.extension),
            None => format!("New Texture2DArray.{}", self.extension),
        }
    }
}

/// Texture2D array file identity.
///
/// - Config extension: `.tex2darray`
/// - Resource extension: `.texarr`
/// - Magic bytes: `TXAR`
/// - Sidecar import settings: `<image>.import.toml`
pub const TEX2D_ARRAY_FORMAT: ArrayFormat =
    ArrayFormat::new("tex2darray", "texarr", b"TXAR", 1, "import.toml");
