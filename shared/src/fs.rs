//! Filesystem helpers shared across the importer and tools.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Maximum allowed source image size for reading into memory.
pub const MAX_SOURCE_IMAGE_BYTES: u64 = 256 * 1024 * 1024; // 256 MiB
/// Maximum allowed importer configuration size.
pub const MAX_CONFIG_BYTES: u64 = 4 * 1024 * 1024; // 4 MiB
/// Maximum allowed built resource size.
pub const MAX_RESOURCE_BYTES: u64 = 2 * 1024 * 1024 * 1024; // 2 GiB

/// Read a file into memory with a size cap.
pub fn read_file_with_limit(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read file metadata: {}", path.display()))?;
    let len = metadata.len();
    if len > max_bytes {
        anyhow::bail!(
            "File too large: {} ({} bytes, max {} bytes)",
            path.display(),
            len,
            max_bytes
        );
    }
    std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Find a path in `dir` that does not exist yet.
///
/// `name_for(None)` is tried first, then `name_for(Some(1))`, `name_for(Some(2))`, ...
pub fn unique_path(dir: &Path, name_for: impl Fn(Option<u32>) -> String) -> PathBuf {
    let first = dir.join(name_for(None));
    if !first.exists() {
        return first;
    }
    let mut n = 1;
    loop {
        let candidate = dir.join(name_for(Some(n)));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
