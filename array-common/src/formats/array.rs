//! Texture array resource binary format (.texarr)
//!
//! POD format, little-endian.
//!
//! # Layout
//! ```text
//! 0x00: magic [u8; 4] ("TXAR")
//! 0x04: version u16
//! 0x06: format u8 (TextureFormat id)
//! 0x07: flags u8 (bit 0: linear, bit 1: readable)
//! 0x08: width u32
//! 0x0C: height u32
//! 0x10: depth u32
//! 0x14: mip_count u8
//! 0x15: wrap_mode u8
//! 0x16: filter_mode u8
//! 0x17: aniso_level u8
//! 0x18: reserved u32
//! 0x1C: slice_size u32 (bytes per slice, whole mip chain)
//! 0x20: slice data (depth × slice_size bytes, slice 0 first)
//! ```

use std::io::Write;

use texarray_shared::TEX2D_ARRAY_FORMAT;
use xxhash_rust::xxh3::xxh3_64;

use super::texture::{TextureFormat, mip_dimensions};
use crate::params::{ArrayParameters, FilterMode, WrapMode};

const FLAG_LINEAR: u8 = 1 << 0;
const FLAG_READABLE: u8 = 1 << 1;

/// Errors decoding a texture array resource
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("Resource too short: {0} bytes")]
    Truncated(usize),

    #[error("Bad magic bytes {0:?}")]
    BadMagic([u8; 4]),

    #[error("Unsupported resource version {found} (expected {expected})")]
    Version { found: u16, expected: u16 },

    #[error("Unknown {field} id {id}")]
    UnknownId { field: &'static str, id: u8 },

    #[error("Slice size {found} does not match {expected} bytes for the declared shape")]
    SliceSize { found: usize, expected: usize },

    #[error("Expected {expected} bytes of slice data, found {found}")]
    DataLength { found: usize, expected: usize },

    #[error("A {width}x{height} array with {mip_count} mip level(s) and {depth} slice(s) is too large")]
    TooLarge {
        width: u32,
        height: u32,
        mip_count: u32,
        depth: u32,
    },

    #[error("{field} {value} does not fit in the resource header")]
    HeaderField { field: &'static str, value: usize },
}

/// Texture array resource header (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct TextureArrayHeader {
    pub version: u16,
    pub format: TextureFormat,
    pub linear: bool,
    pub readable: bool,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub mip_count: u8,
    pub wrap_mode: WrapMode,
    pub filter_mode: FilterMode,
    pub aniso_level: u8,
    pub slice_size: u32,
}

impl TextureArrayHeader {
    pub const SIZE: usize = 32;

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut flags = 0;
        if self.linear {
            flags |= FLAG_LINEAR;
        }
        if self.readable {
            flags |= FLAG_READABLE;
        }

        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(TEX2D_ARRAY_FORMAT.magic);
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6] = self.format.to_id();
        bytes[7] = flags;
        bytes[8..12].copy_from_slice(&self.width.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.height.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.depth.to_le_bytes());
        bytes[20] = self.mip_count;
        bytes[21] = self.wrap_mode.to_id();
        bytes[22] = self.filter_mode.to_id();
        bytes[23] = self.aniso_level;
        // 24..28 reserved
        bytes[28..32].copy_from_slice(&self.slice_size.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ResourceError> {
        if bytes.len() < Self::SIZE {
            return Err(ResourceError::Truncated(bytes.len()));
        }

        let magic = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if &magic != TEX2D_ARRAY_FORMAT.magic {
            return Err(ResourceError::BadMagic(magic));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != TEX2D_ARRAY_FORMAT.version {
            return Err(ResourceError::Version {
                found: version,
                expected: TEX2D_ARRAY_FORMAT.version,
            });
        }

        let u32_at = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        Ok(Self {
            version,
            format: TextureFormat::from_id(bytes[6]).ok_or(ResourceError::UnknownId {
                field: "format",
                id: bytes[6],
            })?,
            linear: bytes[7] & FLAG_LINEAR != 0,
            readable: bytes[7] & FLAG_READABLE != 0,
            width: u32_at(8),
            height: u32_at(12),
            depth: u32_at(16),
            mip_count: bytes[20],
            wrap_mode: WrapMode::from_id(bytes[21]).ok_or(ResourceError::UnknownId {
                field: "wrap mode",
                id: bytes[21],
            })?,
            filter_mode: FilterMode::from_id(bytes[22]).ok_or(ResourceError::UnknownId {
                field: "filter mode",
                id: bytes[22],
            })?,
            aniso_level: bytes[23],
            slice_size: u32_at(28),
        })
    }
}

/// The combined texture array.
///
/// Every slice holds the complete mip chain, level 0 first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayResource {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub mip_count: u32,
    /// Colour data is linear (not gamma encoded)
    pub linear: bool,
    pub params: ArrayParameters,
    slice_size: usize,
    slices: Vec<Vec<u8>>,
}

impl ArrayResource {
    /// Create a resource of `depth` zero-filled slices.
    pub fn new(
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        mip_count: u32,
        linear: bool,
    ) -> Result<Self, ResourceError> {
        let too_large = ResourceError::TooLarge {
            width,
            height,
            mip_count,
            depth,
        };
        let slice_size = format
            .chain_size(width, height, mip_count)
            .ok_or_else(|| too_large.clone())?;
        slice_size
            .checked_mul(depth as usize)
            .ok_or(too_large)?;

        Ok(Self {
            width,
            height,
            format,
            mip_count,
            linear,
            params: ArrayParameters::default(),
            slice_size,
            slices: vec![vec![0; slice_size]; depth as usize],
        })
    }

    /// Resource made of `depth` copies of one complete slice.
    pub(crate) fn filled(
        width: u32,
        height: u32,
        depth: u32,
        format: TextureFormat,
        mip_count: u32,
        linear: bool,
        levels: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            format,
            mip_count,
            linear,
            params: ArrayParameters::default(),
            slice_size: levels.len(),
            slices: vec![levels; depth as usize],
        }
    }

    pub fn depth(&self) -> u32 {
        self.slices.len() as u32
    }

    /// Bytes per slice (whole mip chain)
    pub fn slice_size(&self) -> usize {
        self.slice_size
    }

    pub fn mipmaps_enabled(&self) -> bool {
        self.mip_count > 1
    }

    pub fn slice(&self, index: usize) -> Option<&[u8]> {
        self.slices.get(index).map(Vec::as_slice)
    }

    pub fn slices(&self) -> impl Iterator<Item = &[u8]> {
        self.slices.iter().map(Vec::as_slice)
    }

    /// Bytes of one mip level of one slice
    pub fn level(&self, slice: usize, level: u32) -> Option<&[u8]> {
        if level >= self.mip_count {
            return None;
        }
        let offset = self.format.chain_size(self.width, self.height, level)?;
        let (w, h) = mip_dimensions(self.width, self.height, level);
        let size = self.format.level_size(w, h)?;
        self.slice(slice)?.get(offset..offset + size)
    }

    /// Copy a full slice (raw, no conversion) into depth `index`.
    ///
    /// Returns `false` when the index or the data size does not fit.
    pub fn copy_slice(&mut self, index: usize, data: &[u8]) -> bool {
        let expected = self.slice_size;
        match self.slices.get_mut(index) {
            Some(slice) if data.len() == expected => {
                slice.copy_from_slice(data);
                true
            }
            _ => false,
        }
    }

    /// Header describing this resource; fails when a field exceeds its header width.
    pub fn header(&self) -> Result<TextureArrayHeader, ResourceError> {
        let mip_count = u8::try_from(self.mip_count).map_err(|_| ResourceError::HeaderField {
            field: "Mip count",
            value: self.mip_count as usize,
        })?;
        let slice_size = u32::try_from(self.slice_size).map_err(|_| ResourceError::HeaderField {
            field: "Slice size",
            value: self.slice_size,
        })?;

        Ok(TextureArrayHeader {
            version: TEX2D_ARRAY_FORMAT.version,
            format: self.format,
            linear: self.linear,
            readable: self.params.readable,
            width: self.width,
            height: self.height,
            depth: self.depth(),
            mip_count,
            wrap_mode: self.params.wrap_mode,
            filter_mode: self.params.filter_mode,
            aniso_level: self.params.aniso_level(),
            slice_size,
        })
    }

    /// Write a complete .texarr file
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        let header = self
            .header()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        w.write_all(&header.to_bytes())?;
        for slice in &self.slices {
            w.write_all(slice)?;
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ResourceError> {
        let header = self.header()?;
        let mut bytes =
            Vec::with_capacity(TextureArrayHeader::SIZE + self.slice_size * self.slices.len());
        bytes.extend_from_slice(&header.to_bytes());
        for slice in &self.slices {
            bytes.extend_from_slice(slice);
        }
        Ok(bytes)
    }

    /// Parse a complete .texarr file
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ResourceError> {
        let header = TextureArrayHeader::from_bytes(bytes)?;

        let mip_count = header.mip_count as u32;
        let too_large = ResourceError::TooLarge {
            width: header.width,
            height: header.height,
            mip_count,
            depth: header.depth,
        };
        let expected = header
            .format
            .chain_size(header.width, header.height, mip_count)
            .ok_or_else(|| too_large.clone())?;
        let slice_size = header.slice_size as usize;
        if slice_size != expected {
            return Err(ResourceError::SliceSize {
                found: slice_size,
                expected,
            });
        }

        let data = &bytes[TextureArrayHeader::SIZE..];
        let expected_len = slice_size
            .checked_mul(header.depth as usize)
            .ok_or(too_large)?;
        if data.len() != expected_len {
            return Err(ResourceError::DataLength {
                found: data.len(),
                expected: expected_len,
            });
        }

        let mut params = ArrayParameters::default().with_aniso_level(header.aniso_level);
        params.wrap_mode = header.wrap_mode;
        params.filter_mode = header.filter_mode;
        params.readable = header.readable;

        let slices = if slice_size == 0 {
            vec![Vec::new(); header.depth as usize]
        } else {
            data.chunks_exact(slice_size).map(<[u8]>::to_vec).collect()
        };

        Ok(Self {
            width: header.width,
            height: header.height,
            format: header.format,
            mip_count,
            linear: header.linear,
            params,
            slice_size,
            slices,
        })
    }

    /// Hash of the serialized resource, used to detect unchanged outputs
    pub fn content_hash(&self) -> Result<u64, ResourceError> {
        Ok(xxh3_64(&self.to_bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        let resource = ArrayResource::new(4, 4, 1, TextureFormat::Rgba32, 1, false).unwrap();
        assert_eq!(resource.header().unwrap().to_bytes().len(), TextureArrayHeader::SIZE);
    }

    #[test]
    fn test_header_parsing() {
        let mut data = [0u8; 32];
        data[0..4].copy_from_slice(b"TXAR");
        data[4] = 1; // version
        data[6] = 2; // RGBA32
        data[7] = 0b11; // linear + readable
        data[8] = 0x40; // width 64
        data[12] = 0x20; // height 32
        data[16] = 3; // depth
        data[20] = 7; // mips
        data[21] = 2; // mirror
        data[22] = 2; // trilinear
        data[23] = 10; // aniso

        let header = TextureArrayHeader::from_bytes(&data).unwrap();
        assert_eq!(header.width, 64);
        assert_eq!(header.height, 32);
        assert_eq!(header.depth, 3);
        assert_eq!(header.format, TextureFormat::Rgba32);
        assert!(header.linear);
        assert!(header.readable);
        assert_eq!(header.wrap_mode, WrapMode::Mirror);
        assert_eq!(header.filter_mode, FilterMode::Trilinear);
        assert_eq!(header.aniso_level, 10);
    }

    #[test]
    fn test_header_rejects_bad_magic_and_version() {
        let mut data = ArrayResource::new(1, 1, 1, TextureFormat::R8, 1, false)
            .unwrap()
            .header()
            .unwrap()
            .to_bytes();
        data[4] = 9;
        assert_eq!(
            TextureArrayHeader::from_bytes(&data),
            Err(ResourceError::Version {
                found: 9,
                expected: 1
            })
        );

        data[0] = b'X';
        assert!(matches!(
            TextureArrayHeader::from_bytes(&data),
            Err(ResourceError::BadMagic(_))
        ));

        assert_eq!(
            TextureArrayHeader::from_bytes(&data[..8]),
            Err(ResourceError::Truncated(8))
        );
    }

    #[test]
    fn test_resource_file_layout() {
        let mut resource = ArrayResource::new(2, 2, 2, TextureFormat::Rgba32, 2, false).unwrap();
        // 2x2 + 1x1 RGBA32
        assert_eq!(resource.slice_size(), 20);
        assert!(resource.copy_slice(1, &[7; 20]));

        let bytes = resource.to_bytes().unwrap();
        assert_eq!(bytes.len(), 32 + 2 * 20);
        assert!(bytes[32..52].iter().all(|&b| b == 0));
        assert!(bytes[52..72].iter().all(|&b| b == 7));

        let parsed = ArrayResource::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, resource);
    }

    #[test]
    fn test_from_bytes_rejects_short_data() {
        let resource = ArrayResource::new(2, 2, 2, TextureFormat::Rgba32, 1, false).unwrap();
        let bytes = resource.to_bytes().unwrap();
        assert_eq!(
            ArrayResource::from_bytes(&bytes[..bytes.len() - 1]),
            Err(ResourceError::DataLength {
                found: 31,
                expected: 32
            })
        );
    }

    #[test]
    fn test_from_bytes_rejects_oversized_header() {
        let mut data = [0u8; 32];
        data[0..4].copy_from_slice(b"TXAR");
        data[4] = 1; // version
        data[6] = 3; // RGBA64
        data[8..12].copy_from_slice(&u32::MAX.to_le_bytes());
        data[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        data[16] = 1; // depth
        data[20] = 1; // mips

        assert!(matches!(
            ArrayResource::from_bytes(&data),
            Err(ResourceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_new_rejects_oversized_array() {
        assert!(matches!(
            ArrayResource::new(u32::MAX, u32::MAX, 1, TextureFormat::Rgba64, 1, false),
            Err(ResourceError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_header_rejects_fields_wider_than_header() {
        let mut resource = ArrayResource::new(1, 1, 1, TextureFormat::R8, 1, false).unwrap();
        resource.mip_count = 300;
        assert_eq!(
            resource.header(),
            Err(ResourceError::HeaderField {
                field: "Mip count",
                value: 300
            })
        );
        assert!(resource.to_bytes().is_err());
        assert!(resource.content_hash().is_err());

        let mut out = Vec::new();
        let err = resource.write_to(&mut out).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(out.is_empty());
    }

    #[test]
    fn test_copy_slice_checks_size_and_index() {
        let mut resource = ArrayResource::new(2, 2, 1, TextureFormat::R8, 1, false).unwrap();
        assert!(!resource.copy_slice(0, &[1, 2, 3]));
        assert!(!resource.copy_slice(1, &[1, 2, 3, 4]));
        assert!(resource.copy_slice(0, &[1, 2, 3, 4]));
        assert_eq!(resource.slice(0), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_level_offsets() {
        let mut resource = ArrayResource::new(2, 2, 1, TextureFormat::R8, 2, false).unwrap();
        resource.copy_slice(0, &[1, 1, 1, 1, 9]);
        assert_eq!(resource.level(0, 0), Some(&[1u8, 1, 1, 1][..]));
        assert_eq!(resource.level(0, 1), Some(&[9u8][..]));
        assert_eq!(resource.level(0, 2), None);
    }

    #[test]
    fn test_content_hash_tracks_parameters() {
        let a = ArrayResource::new(2, 2, 1, TextureFormat::R8, 1, false).unwrap();
        let mut b = a.clone();
        assert_eq!(a.content_hash().unwrap(), b.content_hash().unwrap());
        b.params.wrap_mode = WrapMode::Clamp;
        assert_ne!(a.content_hash().unwrap(), b.content_hash().unwrap());
    }
}
