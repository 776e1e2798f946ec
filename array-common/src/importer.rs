//! Persisted importer configuration and the import entry point.
//!
//! A `.tex2darray` file is a TOML document:
//!
//! ```toml
//! wrap_mode = "repeat"
//! filter_mode = "bilinear"
//! aniso_level = 1
//! readable = false
//! textures = ["textures/grass.png", "textures/dirt.png"]
//! ```
//!
//! An empty file is a valid configuration with default settings.

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::builder::{BuildOutput, TargetPlatform, build};
use crate::params::{ArrayParameters, FilterMode, WrapMode};
use crate::resolver::{AssetResolver, TextureHandle};
use crate::slices::{SliceList, SliceListError};

/// Importer configuration: sampling parameters plus the slice list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImporterSettings {
    #[serde(flatten)]
    pub params: ArrayParameters,

    /// A list of textures that are added to the texture array.
    #[serde(default)]
    textures: SliceList,
}

impl ImporterSettings {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }

    /// The textures used to create the array.
    pub fn textures(&self) -> &SliceList {
        &self.textures
    }

    /// Mutable access for list editing (insert, remove, replace).
    pub fn textures_mut(&mut self) -> &mut SliceList {
        &mut self.textures
    }

    /// Replace the textures used to create the array.
    ///
    /// Passing `None` is rejected; clear the list with an empty slice instead.
    pub fn set_textures(
        &mut self,
        textures: Option<&[Option<TextureHandle>]>,
        resolver: &impl AssetResolver,
    ) -> Result<(), SliceListError> {
        self.textures.set_slices(textures, resolver)
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.params.wrap_mode
    }

    pub fn set_wrap_mode(&mut self, mode: WrapMode) {
        self.params.wrap_mode = mode;
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.params.filter_mode
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.params.filter_mode = mode;
    }

    pub fn aniso_level(&self) -> u8 {
        self.params.aniso_level()
    }

    pub fn set_aniso_level(&mut self, level: u8) {
        self.params.set_aniso_level(level);
    }

    pub fn readable(&self) -> bool {
        self.params.readable
    }

    pub fn set_readable(&mut self, readable: bool) {
        self.params.readable = readable;
    }
}

/// Import a texture array asset.
///
/// The resource is always regenerated from scratch. Diagnostics are logged
/// against `asset_path` once the resource exists and are also returned.
pub fn import(
    settings: &ImporterSettings,
    resolver: &impl AssetResolver,
    target: TargetPlatform,
    asset_path: &str,
) -> BuildOutput {
    let output = build(
        &settings.textures,
        &settings.params,
        target.supports_array_textures(),
        resolver,
    );

    if output.valid {
        info!(
            "Imported '{}' ({} slice(s), {}x{} {})",
            asset_path,
            output.resource.depth(),
            output.resource.width,
            output.resource.height,
            output.resource.format
        );
    } else {
        for message in output.messages(asset_path) {
            error!("{}", message);
        }
    }

    output
}
