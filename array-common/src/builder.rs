//! Texture array assembly.
//!
//! `build` always produces a resource. When verification fails, every slice is
//! filled with the sentinel colour using fixed fallback attributes, and the
//! reasons are returned alongside the resource rather than as an error.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::formats::{ArrayResource, TextureFormat, full_mip_count, mip_dimensions};
use crate::params::ArrayParameters;
use crate::resolver::{AssetResolver, ReferenceAttributes};
use crate::slices::SliceList;
use crate::verify::{ListIssue, VerifyOutcome, describe_outcome, verify_all};

/// Fallback width used when verification fails
pub const FALLBACK_WIDTH: u32 = 64;
/// Fallback height used when verification fails
pub const FALLBACK_HEIGHT: u32 = 64;
/// Fallback pixel format used when verification fails
pub const FALLBACK_FORMAT: TextureFormat = TextureFormat::Rgba32;
/// Magenta, RGBA
pub const SENTINEL_COLOR: [u8; 4] = [255, 0, 255, 255];

/// Attributes of the sentinel-filled array: 64x64 RGBA32, full mip chain, gamma encoded.
pub fn fallback_attributes() -> ReferenceAttributes {
    ReferenceAttributes {
        width: FALLBACK_WIDTH,
        height: FALLBACK_HEIGHT,
        format: FALLBACK_FORMAT,
        mipmap_count: full_mip_count(FALLBACK_WIDTH, FALLBACK_HEIGHT),
        srgb: true,
    }
}

/// Platform the array is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetPlatform {
    /// Desktop GPUs (D3D11+, Vulkan, Metal, GL 3.3+)
    #[default]
    Standalone,
    /// OpenGL ES 3.0 and newer
    Gles3,
    /// OpenGL ES 2.0
    Gles2,
    /// WebGL 1.0
    WebGl1,
}

impl TargetPlatform {
    pub fn supports_array_textures(&self) -> bool {
        matches!(self, TargetPlatform::Standalone | TargetPlatform::Gles3)
    }
}

/// A slice that failed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceDiagnostic {
    pub index: usize,
    pub outcome: VerifyOutcome,
    /// Empty for outcomes that are reported at list level
    pub message: String,
}

/// Everything one build produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub resource: ArrayResource,
    /// True iff the slice list was non-empty and every slice was copied
    pub valid: bool,
    pub issue: Option<ListIssue>,
    pub diagnostics: Vec<SliceDiagnostic>,
    /// Source assets the resource depends on, in slice order, without duplicates
    pub dependencies: Vec<PathBuf>,
}

impl BuildOutput {
    /// All non-empty messages, prefixed with the asset being imported
    pub fn messages(&self, asset_path: &str) -> Vec<String> {
        let list = self.issue.iter().map(|issue| issue.import_message(asset_path));
        let slices = self
            .diagnostics
            .iter()
            .filter(|d| !d.message.is_empty())
            .map(|d| format!("Import failed '{}'. {}", asset_path, d.message));
        list.chain(slices).collect()
    }
}

/// Build the texture array from `slices`.
///
/// Never fails: verification problems are returned as data in [`BuildOutput`].
pub fn build(
    slices: &SliceList,
    params: &ArrayParameters,
    supports_array_textures: bool,
    resolver: &impl AssetResolver,
) -> BuildOutput {
    let verification = verify_all(slices, supports_array_textures, resolver);
    let depth = slices.len().max(1) as u32;

    let mut valid = verification.valid;
    let mut issue = verification.issue.clone();

    let master = if valid {
        slices.master().and_then(|m| resolver.read_attributes(m))
    } else {
        None
    };

    let copied = master.map(|attributes| copy_sources(slices, &attributes, depth, resolver));

    let mut resource = match copied {
        Some(Ok(resource)) => resource,
        Some(Err(unreadable)) => {
            valid = false;
            issue = Some(unreadable);
            sentinel_resource(depth)
        }
        None => {
            valid = false;
            sentinel_resource(depth)
        }
    };

    resource.params = *params;

    let diagnostics = verification
        .invalid_slices()
        .map(|(index, outcome)| SliceDiagnostic {
            index,
            outcome,
            message: describe_outcome(slices, index, outcome, resolver),
        })
        .collect();

    let mut dependencies: Vec<PathBuf> = Vec::new();
    for handle in slices.handles() {
        match resolver.resolve_path(handle) {
            Some(path) if !dependencies.contains(&path) => dependencies.push(path),
            _ => {}
        }
    }

    debug!(
        "Built {}x{}x{} {} array (valid: {}, {} dependencies)",
        resource.width,
        resource.height,
        resource.depth(),
        resource.format,
        valid,
        dependencies.len()
    );

    BuildOutput {
        resource,
        valid,
        issue,
        diagnostics,
        dependencies,
    }
}

/// Copy every slice's full pixel data into a resource shaped like the master.
fn copy_sources(
    slices: &SliceList,
    master: &ReferenceAttributes,
    depth: u32,
    resolver: &impl AssetResolver,
) -> Result<ArrayResource, ListIssue> {
    let mut resource = ArrayResource::new(
        master.width,
        master.height,
        depth,
        master.format,
        master.mipmap_count,
        !master.srgb,
    )
    .map_err(|e| ListIssue::SourceUnreadable {
        index: 0,
        reason: e.to_string(),
    })?;

    for (index, handle) in slices.iter().enumerate() {
        let Some(handle) = handle else {
            return Err(ListIssue::SourceUnreadable {
                index,
                reason: "The slice is not set.".to_string(),
            });
        };

        let pixels = resolver
            .read_pixels(handle)
            .map_err(|e| ListIssue::SourceUnreadable {
                index,
                reason: e.to_string(),
            })?;

        if !resource.copy_slice(index, &pixels) {
            return Err(ListIssue::SourceUnreadable {
                index,
                reason: format!(
                    "Expected {} bytes of pixel data, found {}.",
                    resource.slice_size(),
                    pixels.len()
                ),
            });
        }
    }

    Ok(resource)
}

/// Scratch texture holding one sentinel-coloured slice.
///
/// Lives only for the duration of the fill and is never part of the output.
struct SentinelTexture {
    pixels: Vec<u8>,
}

impl SentinelTexture {
    fn new(attributes: &ReferenceAttributes) -> Self {
        let mut pixels = Vec::new();
        for level in 0..attributes.mipmap_count {
            let (w, h) = mip_dimensions(attributes.width, attributes.height, level);
            pixels.extend(SENTINEL_COLOR.repeat(w as usize * h as usize));
        }
        Self { pixels }
    }
}

fn sentinel_resource(depth: u32) -> ArrayResource {
    let attributes = fallback_attributes();
    let sentinel = SentinelTexture::new(&attributes);
    ArrayResource::filled(
        attributes.width,
        attributes.height,
        depth,
        attributes.format,
        attributes.mipmap_count,
        !attributes.srgb,
        sentinel.pixels,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{FilterMode, WrapMode};
    use crate::resolver::MemoryResolver;

    fn attrs(width: u32, height: u32) -> ReferenceAttributes {
        ReferenceAttributes {
            width,
            height,
            format: TextureFormat::Rgba32,
            mipmap_count: full_mip_count(width, height),
            srgb: true,
        }
    }

    fn is_sentinel(slice: &[u8]) -> bool {
        slice.chunks_exact(4).all(|texel| texel == SENTINEL_COLOR)
    }

    #[test]
    fn test_fallback_attributes() {
        let attributes = fallback_attributes();
        assert_eq!(attributes.width, 64);
        assert_eq!(attributes.height, 64);
        assert_eq!(attributes.format, TextureFormat::Rgba32);
        assert_eq!(attributes.mipmap_count, 7);
        assert!(attributes.srgb);
    }

    #[test]
    fn test_empty_list_builds_single_sentinel_slice() {
        let resolver = MemoryResolver::new();
        let output = build(&SliceList::new(), &ArrayParameters::default(), true, &resolver);

        assert!(!output.valid);
        assert_eq!(output.issue, Some(ListIssue::Empty));
        assert!(output.diagnostics.is_empty());
        assert!(output.dependencies.is_empty());

        let resource = &output.resource;
        assert_eq!(resource.depth(), 1);
        assert_eq!((resource.width, resource.height), (64, 64));
        assert_eq!(resource.format, TextureFormat::Rgba32);
        assert!(resource.mipmaps_enabled());
        assert!(!resource.linear);
        assert!(is_sentinel(resource.slice(0).unwrap()));
        assert_eq!(
            resource.slice_size(),
            fallback_attributes().data_size().unwrap()
        );
        assert!(resource.to_bytes().is_ok());
    }

    #[test]
    fn test_matching_slices_are_copied() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(8, 4), &[1, 2, 3, 4]);
        let b = resolver.insert_asset("b.png", attrs(8, 4), &[5, 6, 7, 8]);
        let slices: SliceList = [a.clone(), b.clone(), a.clone()].into_iter().collect();

        let output = build(&slices, &ArrayParameters::default(), true, &resolver);
        assert!(output.valid);
        assert_eq!(output.issue, None);
        assert!(output.diagnostics.is_empty());

        let resource = &output.resource;
        assert_eq!(resource.depth(), 3);
        assert_eq!((resource.width, resource.height), (8, 4));
        assert_eq!(resource.mip_count, 4);
        assert_eq!(resource.slice(0).unwrap(), resolver.read_pixels(&a).unwrap());
        assert_eq!(resource.slice(1).unwrap(), resolver.read_pixels(&b).unwrap());
        assert_eq!(resource.slice(2).unwrap(), resolver.read_pixels(&a).unwrap());
    }

    #[test]
    fn test_master_colour_space_is_carried() {
        let mut resolver = MemoryResolver::new();
        let linear = ReferenceAttributes {
            srgb: false,
            ..attrs(4, 4)
        };
        let a = resolver.insert_asset("normal.png", linear, &[128, 128, 255, 255]);
        let slices: SliceList = [a].into_iter().collect();

        let output = build(&slices, &ArrayParameters::default(), true, &resolver);
        assert!(output.valid);
        assert!(output.resource.linear);
    }

    #[test]
    fn test_any_mismatch_fills_every_slice_with_sentinel() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(16, 16), &[1]);
        let b = resolver.insert_asset(
            "b.png",
            ReferenceAttributes {
                srgb: false,
                ..attrs(16, 16)
            },
            &[2],
        );
        let slices: SliceList = [a.clone(), a, b].into_iter().collect();

        let output = build(&slices, &ArrayParameters::default(), true, &resolver);
        assert!(!output.valid);
        assert_eq!(output.issue, None);
        assert_eq!(output.resource.depth(), 3);
        assert_eq!((output.resource.width, output.resource.height), (64, 64));
        assert!(output.resource.slices().all(is_sentinel));

        assert_eq!(output.diagnostics.len(), 1);
        let diagnostic = &output.diagnostics[0];
        assert_eq!(diagnostic.index, 2);
        assert_eq!(diagnostic.outcome, VerifyOutcome::SrgbTextureMismatch);
        assert!(diagnostic.message.contains("'sRGB'"));
    }

    #[test]
    fn test_parameters_applied_to_invalid_list() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(256, 256), &[0]);
        let b = resolver.insert_asset("b.png", attrs(128, 128), &[0]);
        let slices: SliceList = [a, b].into_iter().collect();

        let mut params = ArrayParameters::default();
        params.wrap_mode = WrapMode::Mirror;
        params.filter_mode = FilterMode::Trilinear;
        params.set_aniso_level(10);

        let output = build(&slices, &params, true, &resolver);
        assert!(!output.valid);
        assert_eq!(output.resource.params.wrap_mode, WrapMode::Mirror);
        assert_eq!(output.resource.params.filter_mode, FilterMode::Trilinear);
        assert_eq!(output.resource.params.aniso_level(), 10);
        assert!(output.diagnostics[0].message.contains("256x256"));
        assert!(output.diagnostics[0].message.contains("128x128"));
    }

    #[test]
    fn test_unsupported_platform_short_circuits() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(4, 4), &[0]);
        let slices: SliceList = [a.clone(), a].into_iter().collect();

        let output = build(&slices, &ArrayParameters::default(), false, &resolver);
        assert!(!output.valid);
        assert_eq!(output.issue, Some(ListIssue::Unsupported));
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.resource.depth(), 2);
        assert!(output.resource.slices().all(is_sentinel));
        assert_eq!(output.dependencies, vec![PathBuf::from("a.png")]);
    }

    #[test]
    fn test_missing_master() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(4, 4), &[0]);
        let slices: SliceList = [None, Some(a)].into_iter().collect();

        let output = build(&slices, &ArrayParameters::default(), true, &resolver);
        assert!(!output.valid);
        assert_eq!(output.issue, Some(ListIssue::MasterMissing));
        assert_eq!(output.resource.depth(), 2);

        let messages = output.messages("Assets/x.tex2darray");
        assert_eq!(
            messages,
            vec![
                "Import failed 'Assets/x.tex2darray'. The first element in the 'Textures' list must not be 'None'.",
                "Import failed 'Assets/x.tex2darray'. The texture for slice 0 must not be 'None'.",
            ]
        );
    }

    #[test]
    fn test_dependencies_skip_unset_and_transient_entries() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(4, 4), &[0]);
        let b = resolver.insert_asset("b.png", attrs(4, 4), &[0]);
        let t = resolver.insert_transient("runtime", attrs(4, 4));
        let slices: SliceList = [Some(a.clone()), None, Some(t), Some(b), Some(a)]
            .into_iter()
            .collect();

        let output = build(&slices, &ArrayParameters::default(), true, &resolver);
        assert_eq!(
            output.dependencies,
            vec![PathBuf::from("a.png"), PathBuf::from("b.png")]
        );
    }

    #[test]
    fn test_unreadable_source_falls_back_to_sentinel() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(4, 4), &[0]);
        // Attributes claim 4x4 with mips but the pixel payload is short
        let b = resolver.insert("b.png", attrs(4, 4), Some(PathBuf::from("b.png")), vec![0; 3]);
        let slices: SliceList = [a, b].into_iter().collect();

        let output = build(&slices, &ArrayParameters::default(), true, &resolver);
        assert!(!output.valid);
        assert!(matches!(
            output.issue,
            Some(ListIssue::SourceUnreadable { index: 1, .. })
        ));
        assert!(output.resource.slices().all(is_sentinel));
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut resolver = MemoryResolver::new();
        let a = resolver.insert_asset("a.png", attrs(8, 8), &[9, 8, 7, 6]);
        let b = resolver.insert_asset("b.png", attrs(4, 4), &[0]);
        let params = ArrayParameters::default().with_aniso_level(4);

        for slices in [
            [a.clone(), a.clone()].into_iter().collect::<SliceList>(),
            [a.clone(), b.clone()].into_iter().collect::<SliceList>(),
        ] {
            let first = build(&slices, &params, true, &resolver);
            let second = build(&slices, &params, true, &resolver);
            assert_eq!(first, second);
            assert_eq!(
                first.resource.to_bytes().unwrap(),
                second.resource.to_bytes().unwrap()
            );
        }
    }

    #[test]
    fn test_target_platform_support() {
        assert!(TargetPlatform::Standalone.supports_array_textures());
        assert!(TargetPlatform::Gles3.supports_array_textures());
        assert!(!TargetPlatform::Gles2.supports_array_textures());
        assert!(!TargetPlatform::WebGl1.supports_array_textures());
    }
}
