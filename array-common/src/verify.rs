//! Slice consistency verification.
//!
//! Every slice is compared against the master (slice 0), never pairwise, so the
//! master alone defines the shape of the array.

use std::fmt;

use crate::resolver::{AssetResolver, ReferenceAttributes};
use crate::slices::SliceList;

/// Verification outcome for one slice. Checks run in declaration order and the
/// first failing check wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerifyOutcome {
    /// The entry is unset or the index is out of range
    Null,
    /// The entry is not traceable to a persisted, importable asset
    NotAnAsset,
    /// Slice 0 is unset
    MasterNull,
    /// Slice 0 is not a persisted asset
    MasterNotAnAsset,
    WidthMismatch,
    HeightMismatch,
    FormatMismatch,
    MipmapMismatch,
    SrgbTextureMismatch,
    Valid,
}

impl VerifyOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyOutcome::Valid)
    }
}

impl fmt::Display for VerifyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerifyOutcome::Null => "null",
            VerifyOutcome::NotAnAsset => "not an asset",
            VerifyOutcome::MasterNull => "master null",
            VerifyOutcome::MasterNotAnAsset => "master not an asset",
            VerifyOutcome::WidthMismatch => "width mismatch",
            VerifyOutcome::HeightMismatch => "height mismatch",
            VerifyOutcome::FormatMismatch => "format mismatch",
            VerifyOutcome::MipmapMismatch => "mipmap mismatch",
            VerifyOutcome::SrgbTextureMismatch => "sRGB mismatch",
            VerifyOutcome::Valid => "valid",
        };
        f.write_str(name)
    }
}

/// Reason the list as a whole cannot be built, independent of per-slice outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListIssue {
    /// The target platform has no texture array support
    Unsupported,
    /// Slice 0 is unset
    MasterMissing,
    /// The list has no slices
    Empty,
    /// A slice passed verification but its pixel data could not be read
    SourceUnreadable { index: usize, reason: String },
}

impl ListIssue {
    /// List-level message, without the asset path prefix.
    pub fn message(&self) -> String {
        match self {
            ListIssue::Unsupported => "Your system does not support texture arrays.".to_string(),
            ListIssue::MasterMissing => {
                "The first element in the 'Textures' list must not be 'None'.".to_string()
            }
            ListIssue::Empty => "The 'Textures' list is empty.".to_string(),
            ListIssue::SourceUnreadable { index, reason } => {
                format!("The texture for slice {} could not be read. {}", index, reason)
            }
        }
    }

    /// Message as reported by an import, naming the asset being imported.
    pub fn import_message(&self, asset_path: &str) -> String {
        format!("Import failed '{}'. {}", asset_path, self.message())
    }
}

/// Verify the slice at `index` against the master slice.
///
/// An out of range `index` is not an error; it reports [`VerifyOutcome::Null`].
pub fn verify(slices: &SliceList, index: usize, resolver: &impl AssetResolver) -> VerifyOutcome {
    let Some(texture) = slices.get(index) else {
        return VerifyOutcome::Null;
    };

    let Some(attributes) = asset_attributes(texture, resolver) else {
        return VerifyOutcome::NotAnAsset;
    };

    let Some(master) = slices.master() else {
        return VerifyOutcome::MasterNull;
    };

    let Some(reference) = asset_attributes(master, resolver) else {
        return VerifyOutcome::MasterNotAnAsset;
    };

    compare(&attributes, &reference)
}

/// Compare a slice's attributes with the master's.
pub fn compare(attributes: &ReferenceAttributes, master: &ReferenceAttributes) -> VerifyOutcome {
    if attributes.width != master.width {
        return VerifyOutcome::WidthMismatch;
    }
    if attributes.height != master.height {
        return VerifyOutcome::HeightMismatch;
    }
    if attributes.format != master.format {
        return VerifyOutcome::FormatMismatch;
    }
    if attributes.mipmap_count != master.mipmap_count {
        return VerifyOutcome::MipmapMismatch;
    }
    if attributes.srgb != master.srgb {
        return VerifyOutcome::SrgbTextureMismatch;
    }
    VerifyOutcome::Valid
}

fn asset_attributes(
    texture: &crate::resolver::TextureHandle,
    resolver: &impl AssetResolver,
) -> Option<ReferenceAttributes> {
    resolver.resolve_path(texture)?;
    resolver.read_attributes(texture)
}

/// Human readable diagnostic for the slice at `index`.
///
/// Returns an empty string for [`VerifyOutcome::Valid`] and
/// [`VerifyOutcome::MasterNull`]; the latter is reported at list level.
pub fn describe(slices: &SliceList, index: usize, resolver: &impl AssetResolver) -> String {
    let outcome = verify(slices, index, resolver);
    describe_outcome(slices, index, outcome, resolver)
}

/// Like [`describe`], for an outcome that was already computed.
pub fn describe_outcome(
    slices: &SliceList,
    index: usize,
    outcome: VerifyOutcome,
    resolver: &impl AssetResolver,
) -> String {
    let name = |i: usize| {
        slices
            .get(i)
            .map(|t| resolver.display_name(t))
            .unwrap_or_default()
    };
    let attributes = |i: usize| slices.get(i).and_then(|t| resolver.read_attributes(t));

    match outcome {
        VerifyOutcome::Valid | VerifyOutcome::MasterNull => String::new(),

        VerifyOutcome::Null => format!("The texture for slice {} must not be 'None'.", index),

        VerifyOutcome::NotAnAsset | VerifyOutcome::MasterNotAnAsset => {
            let offending = if outcome == VerifyOutcome::MasterNotAnAsset {
                0
            } else {
                index
            };
            format!(
                "Texture '{}' is not saved to disk. Only texture assets that exist on disk can be added to a Texture2DArray asset.",
                name(offending)
            )
        }

        _ => {
            // The remaining outcomes are only produced when both attribute sets exist
            let (Some(texture), Some(master)) = (attributes(index), attributes(0)) else {
                return "Unhandled validation issue.".to_string();
            };
            describe_mismatch(outcome, &name(index), &texture, &name(0), &master)
        }
    }
}

fn describe_mismatch(
    outcome: VerifyOutcome,
    texture_name: &str,
    texture: &ReferenceAttributes,
    master_name: &str,
    master: &ReferenceAttributes,
) -> String {
    match outcome {
        VerifyOutcome::WidthMismatch | VerifyOutcome::HeightMismatch => format!(
            "Texture '{}' is {}x{} in size, but must be using the same size as the texture for slice 0 '{}', which is {}x{}.",
            texture_name, texture.width, texture.height, master_name, master.width, master.height
        ),
        VerifyOutcome::FormatMismatch => format!(
            "Texture '{}' uses '{}' as format, but must be using '{}' instead, because the texture for slice 0 '{}' is using '{}' too.",
            texture_name, texture.format, master.format, master_name, master.format
        ),
        VerifyOutcome::MipmapMismatch => format!(
            "Texture '{}' has '{}' mipmap(s), but must have '{}' instead, because the texture for slice 0 '{}' is having '{}' mipmap(s). Please check if the 'Generate Mip Maps' setting for both textures is the same.",
            texture_name, texture.mipmap_count, master.mipmap_count, master_name, master.mipmap_count
        ),
        VerifyOutcome::SrgbTextureMismatch => format!(
            "Texture '{}' uses different 'sRGB' setting than slice 0 texture '{}'.",
            texture_name, master_name
        ),
        _ => "Unhandled validation issue.".to_string(),
    }
}

/// Verification result of a whole slice list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListVerification {
    /// True iff the list is non-empty, supported, and every slice is valid
    pub valid: bool,
    /// List-level reason, if any
    pub issue: Option<ListIssue>,
    /// Per-slice outcomes, one per index
    pub outcomes: Vec<VerifyOutcome>,
}

impl ListVerification {
    /// Indices whose outcome is not valid
    pub fn invalid_slices(&self) -> impl Iterator<Item = (usize, VerifyOutcome)> + '_ {
        self.outcomes
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, outcome)| !outcome.is_valid())
    }
}

/// Verify every slice of the list.
///
/// Without array support no slice is inspected at all.
pub fn verify_all(
    slices: &SliceList,
    supports_array_textures: bool,
    resolver: &impl AssetResolver,
) -> ListVerification {
    if !supports_array_textures {
        return ListVerification {
            valid: false,
            issue: Some(ListIssue::Unsupported),
            outcomes: Vec::new(),
        };
    }

    let outcomes: Vec<_> = (0..slices.len())
        .map(|index| verify(slices, index, resolver))
        .collect();

    let issue = if slices.is_empty() {
        Some(ListIssue::Empty)
    } else if slices.master().is_none() {
        Some(ListIssue::MasterMissing)
    } else {
        None
    };

    let valid = issue.is_none() && outcomes.iter().all(VerifyOutcome::is_valid);

    ListVerification {
        valid,
        issue,
        outcomes,
    }
}
