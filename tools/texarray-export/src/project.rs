//! Loading, saving and building `.tex2darray` files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use xxhash_rust::xxh3::xxh3_64;

use texarray_common::{ArrayResource, BuildOutput, ImporterSettings, TargetPlatform, import};
use texarray_shared::TEX2D_ARRAY_FORMAT;
use texarray_shared::fs::{MAX_CONFIG_BYTES, MAX_RESOURCE_BYTES, read_file_with_limit, unique_path};

use crate::disk::DiskResolver;

/// Header written into freshly created configuration files
const NEW_ASSET_COMMENT: &str = "# This file represents a Texture2DArray asset.\n# Build it with `texarray-export build <file>`.\n";

/// Load importer settings from a `.tex2darray` file
pub fn load_settings(path: &Path) -> Result<ImporterSettings> {
    if !TEX2D_ARRAY_FORMAT.matches(path) {
        anyhow::bail!(
            "Not a texture array asset: {} (expected .{})",
            path.display(),
            TEX2D_ARRAY_FORMAT.extension
        );
    }

    let bytes = read_file_with_limit(path, MAX_CONFIG_BYTES)?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("Asset is not UTF-8: {}", path.display()))?;
    ImporterSettings::from_toml_str(&text)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Save importer settings to a `.tex2darray` file
pub fn save_settings(path: &Path, settings: &ImporterSettings) -> Result<()> {
    let text = settings
        .to_toml_string()
        .context("Failed to serialize importer settings")?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Directory texture handles are resolved against: the asset's own directory
pub fn default_root(asset: &Path) -> PathBuf {
    match asset.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Output path for an asset: `ground.tex2darray` -> `ground.texarr`
pub fn default_output(asset: &Path) -> PathBuf {
    asset.with_extension(TEX2D_ARRAY_FORMAT.resource_ext)
}

/// Settings and build output of one import
#[derive(Debug)]
pub struct ImportResult {
    pub settings: ImporterSettings,
    pub output: BuildOutput,
}

/// Load and import an asset
pub fn import_asset(asset: &Path, resolver: &DiskResolver, target: TargetPlatform) -> Result<ImportResult> {
    let settings = load_settings(asset)?;
    let asset_path = asset.to_string_lossy();
    let output = import(&settings, resolver, target, &asset_path);
    Ok(ImportResult { settings, output })
}

/// Result of writing a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// The file already held identical bytes
    Unchanged,
}

/// Write a resource, skipping the write when the file content is identical
pub fn write_resource(path: &Path, resource: &ArrayResource) -> Result<WriteOutcome> {
    let hash = resource
        .content_hash()
        .with_context(|| format!("Cannot encode {}", path.display()))?;

    if path.is_file() {
        if let Ok(existing) = read_file_with_limit(path, MAX_RESOURCE_BYTES) {
            if xxh3_64(&existing) == hash {
                return Ok(WriteOutcome::Unchanged);
            }
        }
    }

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    resource
        .write_to(&mut file)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(WriteOutcome::Written)
}

/// Read a built resource back
pub fn read_resource(path: &Path) -> Result<ArrayResource> {
    let bytes = read_file_with_limit(path, MAX_RESOURCE_BYTES)?;
    ArrayResource::from_bytes(&bytes).with_context(|| format!("Invalid resource: {}", path.display()))
}

/// Create a new, empty asset in `dir` with a unique file name
pub fn create_asset(dir: &Path) -> Result<PathBuf> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let path = unique_path(dir, |n| TEX2D_ARRAY_FORMAT.default_file_name(n));
    let settings = ImporterSettings::default()
        .to_toml_string()
        .context("Failed to serialize importer settings")?;
    std::fs::write(&path, format!("{}{}", NEW_ASSET_COMMENT, settings))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
