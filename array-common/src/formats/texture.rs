//! Texture pixel formats and mip chain arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel format of a slice or of the whole array.
///
/// Every slice of an array must share the master's format; no conversion
/// happens at array build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureFormat {
    /// Single 8-bit channel
    R8,

    /// 8-bit RGB, 3 bytes per pixel
    Rgb24,

    /// 8-bit RGBA, 4 bytes per pixel
    #[default]
    Rgba32,

    /// 16-bit RGBA, 8 bytes per pixel (little-endian channels)
    Rgba64,

    /// BC7 compressed, 16 bytes per 4x4 block
    Bc7,
}

impl TextureFormat {
    /// All formats, in wire-id order.
    pub const ALL: [TextureFormat; 5] = [
        TextureFormat::R8,
        TextureFormat::Rgb24,
        TextureFormat::Rgba32,
        TextureFormat::Rgba64,
        TextureFormat::Bc7,
    ];

    /// Check if this format is block compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, TextureFormat::Bc7)
    }

    /// Bytes per pixel for uncompressed formats
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            TextureFormat::R8 => Some(1),
            TextureFormat::Rgb24 => Some(3),
            TextureFormat::Rgba32 => Some(4),
            TextureFormat::Rgba64 => Some(8),
            TextureFormat::Bc7 => None,
        }
    }

    /// Calculate data size of a single mip level, `None` on overflow
    pub fn level_size(&self, width: u32, height: u32) -> Option<usize> {
        let w = width.max(1) as usize;
        let h = height.max(1) as usize;

        match self.bytes_per_pixel() {
            Some(bpp) => w.checked_mul(h)?.checked_mul(bpp),
            None => {
                // 16 bytes per 4x4 block
                let blocks_x = w.div_ceil(4);
                let blocks_y = h.div_ceil(4);
                blocks_x.checked_mul(blocks_y)?.checked_mul(16)
            }
        }
    }

    /// Calculate data size of a mip chain with `mip_count` levels, level 0 first.
    /// `None` on overflow.
    pub fn chain_size(&self, width: u32, height: u32, mip_count: u32) -> Option<usize> {
        (0..mip_count).try_fold(0usize, |total, level| {
            let (w, h) = mip_dimensions(width, height, level);
            total.checked_add(self.level_size(w, h)?)
        })
    }

    /// Stable numeric id used in the resource header
    pub fn to_id(self) -> u8 {
        match self {
            TextureFormat::R8 => 0,
            TextureFormat::Rgb24 => 1,
            TextureFormat::Rgba32 => 2,
            TextureFormat::Rgba64 => 3,
            TextureFormat::Bc7 => 4,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    /// Name shown in diagnostics
    pub fn display_name(&self) -> &'static str {
        match self {
            TextureFormat::R8 => "R8",
            TextureFormat::Rgb24 => "RGB24",
            TextureFormat::Rgba32 => "RGBA32",
            TextureFormat::Rgba64 => "RGBA64",
            TextureFormat::Bc7 => "BC7",
        }
    }
}

impl fmt::Display for TextureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn full_mip_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

/// Dimensions of mip `level`, clamped to 1.
pub fn mip_dimensions(width: u32, height: u32, level: u32) -> (u32, u32) {
    let w = width.checked_shr(level).unwrap_or(0).max(1);
    let h = height.checked_shr(level).unwrap_or(0).max(1);
    (w, h)
}
