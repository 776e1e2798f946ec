//! Filesystem asset resolver.
//!
//! Texture handles are paths relative to a project root. A handle is a
//! persisted asset when the file exists; it is importable when the file decodes
//! as an image. Per-texture import settings come from an optional sidecar
//! `<image>.import.toml`.

use anyhow::{Context, Result};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use texarray_common::formats::{full_mip_count, mip_dimensions};
use texarray_common::{
    AssetResolver, ReferenceAttributes, ResolveError, TextureFormat, TextureHandle,
};
use texarray_shared::TEX2D_ARRAY_FORMAT;
use texarray_shared::fs::{MAX_CONFIG_BYTES, MAX_SOURCE_IMAGE_BYTES, read_file_with_limit};

use crate::compress::compress_bc7;

/// Import settings of one source texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureImportSettings {
    /// Colour data is gamma encoded
    pub srgb: bool,

    /// Generate a full mip chain
    pub mipmaps: bool,

    /// Pixel format override. Derived from the image colour type when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TextureFormat>,
}

impl Default for TextureImportSettings {
    fn default() -> Self {
        Self {
            srgb: true,
            mipmaps: true,
            format: None,
        }
    }
}

/// Sidecar settings path for a source image: `grass.png` -> `grass.png.import.toml`
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    let mut name = image_path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(TEX2D_ARRAY_FORMAT.import_settings_ext);
    image_path.with_file_name(name)
}

/// Default texture format for a decoded colour type
pub fn format_for_color_type(color: ColorType) -> TextureFormat {
    match color {
        ColorType::L8 => TextureFormat::R8,
        ColorType::Rgb8 => TextureFormat::Rgb24,
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
            TextureFormat::Rgba64
        }
        ColorType::Rgb32F | ColorType::Rgba32F => TextureFormat::Rgba64,
        _ => TextureFormat::Rgba32,
    }
}

/// Resolves texture handles against a directory on disk
#[derive(Debug, Clone)]
pub struct DiskResolver {
    root: PathBuf,
}

impl DiskResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Handle for a path given relative to the working directory (or absolute).
    ///
    /// The key is relative to the root, with `..` components for files outside
    /// of it. Paths on another prefix than the root stay absolute.
    pub fn handle_for(&self, path: &Path) -> TextureHandle {
        let path = absolute_path(path);
        let root = absolute_path(&self.root);
        let key = relative_path(&path, &root).unwrap_or(path);
        TextureHandle::new(key.to_string_lossy().replace('\\', "/"))
    }

    /// Import settings of a source image, defaults when there is no sidecar
    pub fn import_settings(&self, image_path: &Path) -> TextureImportSettings {
        let sidecar = sidecar_path(image_path);
        if !sidecar.is_file() {
            return TextureImportSettings::default();
        }

        match load_import_settings(&sidecar) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Ignoring import settings {}: {:#}", sidecar.display(), e);
                TextureImportSettings::default()
            }
        }
    }

    /// Decode the image header and combine it with the import settings
    fn probe(&self, path: &Path) -> Result<ReferenceAttributes> {
        let decoder = ImageReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?
            .with_guessed_format()
            .with_context(|| format!("Failed to read {}", path.display()))?
            .into_decoder()
            .with_context(|| format!("Not a supported image: {}", path.display()))?;

        let (width, height) = decoder.dimensions();
        let settings = self.import_settings(path);

        Ok(ReferenceAttributes {
            width,
            height,
            format: settings
                .format
                .unwrap_or_else(|| format_for_color_type(decoder.color_type())),
            mipmap_count: if settings.mipmaps {
                full_mip_count(width, height)
            } else {
                1
            },
            srgb: settings.srgb,
        })
    }

    fn load_pixels(&self, path: &Path, attributes: &ReferenceAttributes) -> Result<Vec<u8>> {
        let bytes = read_file_with_limit(path, MAX_SOURCE_IMAGE_BYTES)?;
        let image = image::load_from_memory(&bytes)
            .with_context(|| format!("Failed to decode texture: {}", path.display()))?;

        if (image.width(), image.height()) != (attributes.width, attributes.height) {
            anyhow::bail!(
                "{} changed size while importing ({}x{}, expected {}x{})",
                path.display(),
                image.width(),
                image.height(),
                attributes.width,
                attributes.height
            );
        }

        let has_alpha = image.color().has_alpha();
        let mut data = Vec::with_capacity(attributes.data_size().unwrap_or(0));

        for level in 0..attributes.mipmap_count {
            let (w, h) = mip_dimensions(attributes.width, attributes.height, level);
            let level_image = if level == 0 {
                Cow::Borrowed(&image)
            } else {
                Cow::Owned(image.resize_exact(w, h, FilterType::Triangle))
            };
            encode_level(&level_image, attributes.format, has_alpha, &mut data);
        }

        Ok(data)
    }
}

/// Canonical path when the file exists, otherwise made absolute against the working directory
fn absolute_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// `path` relative to `base`; both absolute. `None` when they share no prefix.
fn relative_path(path: &Path, base: &Path) -> Option<PathBuf> {
    let common = path
        .components()
        .zip(base.components())
        .take_while(|(a, b)| a == b)
        .count();
    if common == 0 {
        return None;
    }

    let ups = base.components().count() - common;
    let mut relative: PathBuf = std::iter::repeat_n("..", ups).collect();
    relative.extend(path.components().skip(common));
    Some(relative)
}

fn load_import_settings(path: &Path) -> Result<TextureImportSettings> {
    let bytes = read_file_with_limit(path, MAX_CONFIG_BYTES)?;
    let text = String::from_utf8(bytes).context("Import settings are not UTF-8")?;
    toml::from_str(&text).context("Invalid import settings")
}

/// Append one mip level, converted to `format`
fn encode_level(image: &DynamicImage, format: TextureFormat, has_alpha: bool, out: &mut Vec<u8>) {
    match format {
        TextureFormat::R8 => out.extend_from_slice(image.to_luma8().as_raw()),
        TextureFormat::Rgb24 => out.extend_from_slice(image.to_rgb8().as_raw()),
        TextureFormat::Rgba32 => out.extend_from_slice(image.to_rgba8().as_raw()),
        TextureFormat::Rgba64 => out.extend(
            image
                .to_rgba16()
                .as_raw()
                .iter()
                .flat_map(|channel| channel.to_le_bytes()),
        ),
        TextureFormat::Bc7 => out.extend(compress_bc7(
            image.to_rgba8().as_raw(),
            image.width(),
            image.height(),
            has_alpha,
        )),
    }
}

impl AssetResolver for DiskResolver {
    fn resolve_path(&self, handle: &TextureHandle) -> Option<PathBuf> {
        let path = self.root.join(handle.key());
        path.is_file().then_some(path)
    }

    fn read_attributes(&self, handle: &TextureHandle) -> Option<ReferenceAttributes> {
        let path = self.resolve_path(handle)?;
        match self.probe(&path) {
            Ok(attributes) => Some(attributes),
            Err(e) => {
                debug!("{} is not an importable texture: {:#}", handle, e);
                None
            }
        }
    }

    fn read_pixels(&self, handle: &TextureHandle) -> Result<Vec<u8>, ResolveError> {
        let name = self.display_name(handle);
        let (Some(path), Some(attributes)) =
            (self.resolve_path(handle), self.read_attributes(handle))
        else {
            return Err(ResolveError::NotAnAsset(name));
        };

        let Some(expected) = attributes.data_size() else {
            return Err(ResolveError::Read {
                name,
                reason: format!("{}x{} is too large", attributes.width, attributes.height),
            });
        };

        let pixels = self
            .load_pixels(&path, &attributes)
            .map_err(|e| ResolveError::Read {
                name: name.clone(),
                reason: format!("{:#}", e),
            })?;

        if pixels.len() != expected {
            return Err(ResolveError::SizeMismatch {
                name,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_rgba(path: &Path, width: u32, height: u32, color: [u8; 4]) {
        RgbaImage::from_pixel(width, height, Rgba(color))
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("textures/grass.png")),
            PathBuf::from("textures/grass.png.import.toml")
        );
    }

    #[test]
    fn test_attributes_from_png() {
        let dir = tempdir().unwrap();
        write_rgba(&dir.path().join("a.png"), 16, 8, [1, 2, 3, 4]);
        RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]))
            .save(dir.path().join("b.png"))
            .unwrap();

        let resolver = DiskResolver::new(dir.path());
        let a = resolver.read_attributes(&"a.png".into()).unwrap();
        assert_eq!((a.width, a.height), (16, 8));
        assert_eq!(a.format, TextureFormat::Rgba32);
        assert_eq!(a.mipmap_count, 5);
        assert!(a.srgb);

        let b = resolver.read_attributes(&"b.png".into()).unwrap();
        assert_eq!(b.format, TextureFormat::Rgb24);
    }

    #[test]
    fn test_sidecar_overrides_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("normal.png");
        write_rgba(&path, 8, 8, [128, 128, 255, 255]);
        std::fs::write(
            sidecar_path(&path),
            "srgb = false\nmipmaps = false\nformat = \"rgba64\"\n",
        )
        .unwrap();

        let resolver = DiskResolver::new(dir.path());
        let attributes = resolver.read_attributes(&"normal.png".into()).unwrap();
        assert!(!attributes.srgb);
        assert_eq!(attributes.mipmap_count, 1);
        assert_eq!(attributes.format, TextureFormat::Rgba64);

        let pixels = resolver.read_pixels(&"normal.png".into()).unwrap();
        assert_eq!(pixels.len(), 8 * 8 * 8);
    }

    #[test]
    fn test_broken_sidecar_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.png");
        write_rgba(&path, 4, 4, [0, 0, 0, 255]);
        std::fs::write(sidecar_path(&path), "srgb = \"maybe\"").unwrap();

        let resolver = DiskResolver::new(dir.path());
        assert_eq!(
            resolver.import_settings(&path),
            TextureImportSettings::default()
        );
    }

    #[test]
    fn test_missing_file_is_not_on_disk() {
        let dir = tempdir().unwrap();
        let resolver = DiskResolver::new(dir.path());
        let handle = TextureHandle::new("missing.png");
        assert_eq!(resolver.resolve_path(&handle), None);
        assert!(!resolver.is_asset(&handle));
        assert!(matches!(
            resolver.read_pixels(&handle),
            Err(ResolveError::NotAnAsset(_))
        ));
    }

    #[test]
    fn test_non_image_is_on_disk_but_not_importable() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.png"), b"not really a png").unwrap();

        let resolver = DiskResolver::new(dir.path());
        let handle = TextureHandle::new("notes.png");
        assert!(resolver.resolve_path(&handle).is_some());
        assert_eq!(resolver.read_attributes(&handle), None);
    }

    #[test]
    fn test_read_pixels_includes_mip_chain() {
        let dir = tempdir().unwrap();
        write_rgba(&dir.path().join("a.png"), 4, 4, [10, 20, 30, 255]);

        let resolver = DiskResolver::new(dir.path());
        let pixels = resolver.read_pixels(&"a.png".into()).unwrap();
        // 4x4 + 2x2 + 1x1
        assert_eq!(pixels.len(), (16 + 4 + 1) * 4);
        assert!(pixels[..64].chunks_exact(4).all(|t| t == [10, 20, 30, 255]));
        // Downsampled levels of a uniform image stay (within rounding) uniform
        let expected = [10u8, 20, 30, 255];
        for texel in pixels[64..].chunks_exact(4) {
            for (actual, expected) in texel.iter().zip(expected) {
                assert!(actual.abs_diff(expected) <= 1, "{:?}", texel);
            }
        }
    }

    #[test]
    fn test_handle_for_is_root_relative() {
        let dir = tempdir().unwrap();
        let textures = dir.path().join("textures");
        std::fs::create_dir(&textures).unwrap();
        write_rgba(&textures.join("a.png"), 1, 1, [0, 0, 0, 255]);

        let resolver = DiskResolver::new(dir.path());
        let handle = resolver.handle_for(&textures.join("a.png"));
        assert_eq!(handle.key(), "textures/a.png");
        assert!(resolver.is_asset(&handle));
    }

    #[test]
    fn test_handle_for_outside_root_walks_up() {
        let dir = tempdir().unwrap();
        let assets = dir.path().join("assets");
        let textures = dir.path().join("textures");
        std::fs::create_dir(&assets).unwrap();
        std::fs::create_dir(&textures).unwrap();
        write_rgba(&textures.join("a.png"), 1, 1, [0, 0, 0, 255]);

        let resolver = DiskResolver::new(&assets);
        let handle = resolver.handle_for(&textures.join("a.png"));
        assert_eq!(handle.key(), "../textures/a.png");
        assert!(resolver.resolve_path(&handle).is_some());
        assert!(resolver.is_asset(&handle));
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/p/textures/a.png"), Path::new("/p/assets")),
            Some(PathBuf::from("../textures/a.png"))
        );
        assert_eq!(
            relative_path(Path::new("/p/assets/a.png"), Path::new("/p/assets")),
            Some(PathBuf::from("a.png"))
        );
        assert_eq!(relative_path(Path::new("a.png"), Path::new("/p")), None);
    }

    #[test]
    fn test_format_for_color_type() {
        assert_eq!(format_for_color_type(ColorType::L8), TextureFormat::R8);
        assert_eq!(format_for_color_type(ColorType::La8), TextureFormat::Rgba32);
        assert_eq!(format_for_color_type(ColorType::Rgba16), TextureFormat::Rgba64);
    }
}
