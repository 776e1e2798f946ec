//! Sampling parameters shared by every slice of the array.
//!
//! These never depend on slice content and are applied to the built
//! resource whether or not verification succeeded.

use serde::{Deserialize, Deserializer, Serialize};

/// Highest supported anisotropic filtering level.
pub const MAX_ANISO_LEVEL: u8 = 16;

/// Texture coordinate wrapping mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WrapMode {
    /// Tiles the texture
    #[default]
    Repeat,
    /// Clamps to the last pixel at the edge
    Clamp,
    /// Tiles the texture, mirroring it at every integer boundary
    Mirror,
    /// Mirrors once, then clamps
    MirrorOnce,
}

impl WrapMode {
    pub fn to_id(self) -> u8 {
        match self {
            WrapMode::Repeat => 0,
            WrapMode::Clamp => 1,
            WrapMode::Mirror => 2,
            WrapMode::MirrorOnce => 3,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(WrapMode::Repeat),
            1 => Some(WrapMode::Clamp),
            2 => Some(WrapMode::Mirror),
            3 => Some(WrapMode::MirrorOnce),
            _ => None,
        }
    }
}

/// Filtering mode used when the texture is stretched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterMode {
    /// Texture pixels become blocky up close
    Point,
    /// Texture samples are averaged
    #[default]
    Bilinear,
    /// Texture samples are averaged and also blended between mip levels
    Trilinear,
}

impl FilterMode {
    pub fn to_id(self) -> u8 {
        match self {
            FilterMode::Point => 0,
            FilterMode::Bilinear => 1,
            FilterMode::Trilinear => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(FilterMode::Point),
            1 => Some(FilterMode::Bilinear),
            2 => Some(FilterMode::Trilinear),
            _ => None,
        }
    }
}

/// Sampling parameters of the array resource.
///
/// Each field is independently settable; there is no cross-validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayParameters {
    /// Selects how the texture behaves when tiled.
    #[serde(default)]
    pub wrap_mode: WrapMode,

    /// Selects how the texture is filtered when it gets stretched by 3D transformations.
    #[serde(default)]
    pub filter_mode: FilterMode,

    /// 0 = disabled for all textures, 1 = enabled for all textures in quality settings,
    /// 2..16 = anisotropic filtering level
    #[serde(
        default = "default_aniso_level",
        deserialize_with = "deserialize_aniso_level"
    )]
    aniso_level: u8,

    /// Keep a CPU-readable copy of the pixel data.
    #[serde(default)]
    pub readable: bool,
}

fn default_aniso_level() -> u8 {
    1
}

fn deserialize_aniso_level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let level = i64::deserialize(deserializer)?;
    Ok(level.clamp(0, MAX_ANISO_LEVEL as i64) as u8)
}

impl Default for ArrayParameters {
    fn default() -> Self {
        Self {
            wrap_mode: WrapMode::default(),
            filter_mode: FilterMode::default(),
            aniso_level: default_aniso_level(),
            readable: false,
        }
    }
}

impl ArrayParameters {
    pub fn aniso_level(&self) -> u8 {
        self.aniso_level
    }

    /// Set the anisotropic filtering level, clamped to `0..=16`.
    pub fn set_aniso_level(&mut self, level: u8) {
        self.aniso_level = level.min(MAX_ANISO_LEVEL);
    }

    /// Builder-style variant of [`set_aniso_level`](Self::set_aniso_level).
    pub fn with_aniso_level(mut self, level: u8) -> Self {
        self.set_aniso_level(level);
        self
    }
}
