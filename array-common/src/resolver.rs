//! Asset lookup capability injected into verification and building.
//!
//! The core never touches a file system or an editor database directly. A host
//! implements [`AssetResolver`] to answer "is this a persisted asset", "what
//! does it look like" and "give me its pixels".

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::formats::TextureFormat;

/// Opaque reference to a source texture.
///
/// The key is whatever the host uses to identify textures (a project-relative
/// path for the disk resolver). A handle may refer to something that is not a
/// persisted asset; the resolver decides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureHandle(String);

impl TextureHandle {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn key(&self) -> &str {
        &self.0
    }

    /// Human readable name: the file stem of the key.
    pub fn display_name(&self) -> &str {
        let file = self.0.rsplit(['/', '\\']).next().unwrap_or(&self.0);
        match file.rfind('.') {
            Some(0) | None => file,
            Some(dot) => &file[..dot],
        }
    }
}

impl fmt::Display for TextureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TextureHandle {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Attributes every slice must share with the master slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceAttributes {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mipmap_count: u32,
    /// Colour data is gamma encoded (sRGB)
    pub srgb: bool,
}

impl ReferenceAttributes {
    /// Size in bytes of the full pixel data (all mip levels), `None` on overflow
    pub fn data_size(&self) -> Option<usize> {
        self.format
            .chain_size(self.width, self.height, self.mipmap_count)
    }
}

/// Failure to read pixel data from a resolved asset.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("Texture '{0}' is not a persisted texture asset")]
    NotAnAsset(String),

    #[error("Failed to read texture '{name}': {reason}")]
    Read { name: String, reason: String },

    #[error("Texture '{name}' has {actual} bytes of pixel data, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Host capability for resolving texture handles.
pub trait AssetResolver {
    /// Path of the persisted asset backing `handle`, or `None` if it only exists
    /// in memory (or not at all).
    fn resolve_path(&self, handle: &TextureHandle) -> Option<PathBuf>;

    /// Attributes of an importable texture asset, or `None` if the handle is not
    /// traceable to one.
    fn read_attributes(&self, handle: &TextureHandle) -> Option<ReferenceAttributes>;

    /// Full pixel data of the asset: every mip level, level 0 first, encoded in
    /// the format reported by [`read_attributes`](Self::read_attributes).
    fn read_pixels(&self, handle: &TextureHandle) -> Result<Vec<u8>, ResolveError>;

    /// Display name used in diagnostics.
    fn display_name(&self, handle: &TextureHandle) -> String {
        handle.display_name().to_string()
    }

    /// A handle counts as an asset only when it is on disk *and* importable.
    fn is_asset(&self, handle: &TextureHandle) -> bool {
        self.resolve_path(handle).is_some() && self.read_attributes(handle).is_some()
    }
}

impl<R: AssetResolver + ?Sized> AssetResolver for &R {
    fn resolve_path(&self, handle: &TextureHandle) -> Option<PathBuf> {
        (**self).resolve_path(handle)
    }

    fn read_attributes(&self, handle: &TextureHandle) -> Option<ReferenceAttributes> {
        (**self).read_attributes(handle)
    }

    fn read_pixels(&self, handle: &TextureHandle) -> Result<Vec<u8>, ResolveError> {
        (**self).read_pixels(handle)
    }

    fn display_name(&self, handle: &TextureHandle) -> String {
        (**self).display_name(handle)
    }
}

/// An in-memory texture known to [`MemoryResolver`].
#[derive(Debug, Clone)]
struct MemoryTexture {
    attributes: ReferenceAttributes,
    path: Option<PathBuf>,
    pixels: Vec<u8>,
}

/// Resolver backed by a hash map, for tests and embedding.
///
/// Textures registered with [`insert_asset`](Self::insert_asset) behave like
/// persisted assets. Textures registered with
/// [`insert_transient`](Self::insert_transient) have attributes but no path,
/// like a texture created at runtime.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    textures: HashMap<TextureHandle, MemoryTexture>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a persisted texture filled with a single repeated texel.
    pub fn insert_asset(
        &mut self,
        key: &str,
        attributes: ReferenceAttributes,
        texel: &[u8],
    ) -> TextureHandle {
        let pixels = fill_pixels(&attributes, texel);
        self.insert(key, attributes, Some(PathBuf::from(key)), pixels)
    }

    /// Register a texture that exists only in memory.
    pub fn insert_transient(&mut self, key: &str, attributes: ReferenceAttributes) -> TextureHandle {
        let pixels = vec![0; attributes.data_size().unwrap_or(0)];
        self.insert(key, attributes, None, pixels)
    }

    /// Register a texture with explicit pixel data.
    pub fn insert(
        &mut self,
        key: &str,
        attributes: ReferenceAttributes,
        path: Option<PathBuf>,
        pixels: Vec<u8>,
    ) -> TextureHandle {
        let handle = TextureHandle::new(key);
        self.textures.insert(
            handle.clone(),
            MemoryTexture {
                attributes,
                path,
                pixels,
            },
        );
        handle
    }

    /// Forget a texture, as if its asset was deleted.
    pub fn remove(&mut self, handle: &TextureHandle) {
        self.textures.remove(handle);
    }

    pub fn path_of(&self, handle: &TextureHandle) -> Option<&Path> {
        self.textures.get(handle)?.path.as_deref()
    }
}

fn fill_pixels(attributes: &ReferenceAttributes, texel: &[u8]) -> Vec<u8> {
    let size = attributes.data_size().unwrap_or(0);
    if texel.is_empty() {
        return vec![0; size];
    }
    texel.iter().copied().cycle().take(size).collect()
}

impl AssetResolver for MemoryResolver {
    fn resolve_path(&self, handle: &TextureHandle) -> Option<PathBuf> {
        self.textures.get(handle)?.path.clone()
    }

    fn read_attributes(&self, handle: &TextureHandle) -> Option<ReferenceAttributes> {
        let texture = self.textures.get(handle)?;
        // Transient textures are not importable assets
        texture.path.as_ref()?;
        Some(texture.attributes)
    }

    fn read_pixels(&self, handle: &TextureHandle) -> Result<Vec<u8>, ResolveError> {
        self.textures
            .get(handle)
            .map(|texture| texture.pixels.clone())
            .ok_or_else(|| ResolveError::NotAnAsset(handle.display_name().to_string()))
    }
}
