//! Binary and pixel formats
//!
//! - [`texture`] - Pixel formats and mip chain sizes
//! - [`array`] - The `.texarr` texture array resource

pub mod array;
pub mod texture;

pub use array::{ArrayResource, ResourceError, TextureArrayHeader};
pub use texture::{TextureFormat, full_mip_count, mip_dimensions};
