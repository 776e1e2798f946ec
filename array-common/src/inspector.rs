//! Presentation helpers for editing a slice list.
//!
//! Front ends (a CLI, an editor panel) drive these instead of the raw list so
//! that every row shows the same status and bad assignments are rejected the
//! same way.

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::resolver::{AssetResolver, TextureHandle};
use crate::slices::{SliceList, SliceListError};
use crate::verify::{VerifyOutcome, describe_outcome, verify};

/// How a row of the slice list is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowStatus {
    /// Shows the slice index
    Label(usize),
    /// Shows an error icon with the message as tooltip
    Error { outcome: VerifyOutcome, message: String },
}

/// Status of the row at `index`.
pub fn row_status(slices: &SliceList, index: usize, resolver: &impl AssetResolver) -> RowStatus {
    let outcome = verify(slices, index, resolver);
    let message = describe_outcome(slices, index, outcome, resolver);
    if message.is_empty() {
        RowStatus::Label(index)
    } else {
        RowStatus::Error { outcome, message }
    }
}

/// Assign `texture` to row `index`.
///
/// Textures that are not persisted assets are rejected: the row is cleared and
/// the diagnostic is logged and returned as `Ok(Some(message))`.
pub fn assign(
    slices: &mut SliceList,
    index: usize,
    texture: Option<TextureHandle>,
    resolver: &impl AssetResolver,
) -> Result<Option<String>, SliceListError> {
    slices.replace_at(index, texture)?;

    let outcome = verify(slices, index, resolver);
    if outcome != VerifyOutcome::NotAnAsset {
        return Ok(None);
    }

    let message = describe_outcome(slices, index, outcome, resolver);
    slices.replace_at(index, None)?;
    error!("{}", message);
    Ok(Some(message))
}

/// Append every dropped texture at the end of the list.
pub fn append_dropped(slices: &mut SliceList, textures: impl IntoIterator<Item = TextureHandle>) {
    for texture in textures {
        slices.push(Some(texture));
    }
}

/// Project-wide anisotropic filtering setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnisotropicFiltering {
    Disable,
    #[default]
    PerTexture,
    ForceEnable,
}

/// Info note shown next to the aniso level when the project setting overrides it.
pub fn aniso_advisory(aniso_level: u8, quality: AnisotropicFiltering) -> Option<&'static str> {
    if aniso_level <= 1 {
        return None;
    }
    match quality {
        AnisotropicFiltering::Disable => {
            Some("Anisotropic filtering is disabled for all textures in Quality Settings.")
        }
        AnisotropicFiltering::ForceEnable => {
            Some("Anisotropic filtering is enabled for all textures in Quality Settings.")
        }
        AnisotropicFiltering::PerTexture => None,
    }
}
