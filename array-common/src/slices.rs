//! Ordered list of slice textures.
//!
//! Index 0 is the master slice. Entries may be unset (`None`), which is how an
//! empty row in an editor is represented; such entries fail verification but
//! are allowed in the list itself.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::resolver::{AssetResolver, TextureHandle};

/// Configuration-time rejection of a slice list assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SliceListError {
    #[error(
        "'textures' must not be set to 'null'. If you want to clear the textures array, set it to a zero-sized array instead."
    )]
    NullSequence,

    #[error("The texture at array index '{index}' must not be 'null'.")]
    NullElement { index: usize },

    #[error(
        "The texture '{name}' at array index '{index}' does not exist on disk. Only texture assets can be added."
    )]
    NotOnDisk { index: usize, name: String },

    #[error("Slice index {index} is out of range for a list of {len} slice(s)")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered list of (possibly unset) slice textures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SliceList {
    entries: Vec<Option<TextureHandle>>,
}

impl SliceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`; `None` both for unset entries and out of range indices.
    pub fn get(&self, index: usize) -> Option<&TextureHandle> {
        self.entries.get(index)?.as_ref()
    }

    /// The master slice (index 0), if set.
    pub fn master(&self) -> Option<&TextureHandle> {
        self.get(0)
    }

    pub fn entries(&self) -> &[Option<TextureHandle>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&TextureHandle>> {
        self.entries.iter().map(Option::as_ref)
    }

    /// Set handles only, skipping unset entries.
    pub fn handles(&self) -> impl Iterator<Item = &TextureHandle> {
        self.entries.iter().flatten()
    }

    /// Replace the whole list.
    ///
    /// The assignment is atomic: if the sequence is absent, or any element is
    /// unset or not a persisted asset, nothing changes and the first violation
    /// is returned.
    pub fn set_slices(
        &mut self,
        textures: Option<&[Option<TextureHandle>]>,
        resolver: &impl AssetResolver,
    ) -> Result<(), SliceListError> {
        let textures = textures.ok_or(SliceListError::NullSequence)?;

        for (index, texture) in textures.iter().enumerate() {
            let texture = texture
                .as_ref()
                .ok_or(SliceListError::NullElement { index })?;

            if resolver.resolve_path(texture).is_none() {
                return Err(SliceListError::NotOnDisk {
                    index,
                    name: resolver.display_name(texture),
                });
            }
        }

        self.entries = textures.to_vec();
        Ok(())
    }

    /// Append an entry at the end.
    pub fn push(&mut self, texture: Option<TextureHandle>) {
        self.entries.push(texture);
    }

    /// Insert an entry, shifting later slices up. `index == len` appends.
    pub fn insert_at(
        &mut self,
        index: usize,
        texture: Option<TextureHandle>,
    ) -> Result<(), SliceListError> {
        if index > self.entries.len() {
            return Err(self.out_of_range(index));
        }
        self.entries.insert(index, texture);
        Ok(())
    }

    /// Remove an entry, shifting later slices down.
    pub fn remove_at(&mut self, index: usize) -> Result<Option<TextureHandle>, SliceListError> {
        if index >= self.entries.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.entries.remove(index))
    }

    /// Replace an entry in place, returning the previous one.
    pub fn replace_at(
        &mut self,
        index: usize,
        texture: Option<TextureHandle>,
    ) -> Result<Option<TextureHandle>, SliceListError> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(SliceListError::OutOfRange { index, len })?;
        Ok(std::mem::replace(slot, texture))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn out_of_range(&self, index: usize) -> SliceListError {
        SliceListError::OutOfRange {
            index,
            len: self.entries.len(),
        }
    }
}

impl FromIterator<Option<TextureHandle>> for SliceList {
    fn from_iter<I: IntoIterator<Item = Option<TextureHandle>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl FromIterator<TextureHandle> for SliceList {
    fn from_iter<I: IntoIterator<Item = TextureHandle>>(iter: I) -> Self {
        iter.into_iter().map(Some).collect()
    }
}

// Persisted as a plain string array, "" marks an unset entry.
impl Serialize for SliceList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            self.entries
                .iter()
                .map(|entry| entry.as_ref().map(TextureHandle::key).unwrap_or("")),
        )
    }
}

impl<'de> Deserialize<'de> for SliceList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<String>::deserialize(deserializer)?;
        Ok(keys
            .into_iter()
            .map(|key| (!key.is_empty()).then(|| TextureHandle::new(key)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::TextureFormat;
    use crate::resolver::{MemoryResolver, ReferenceAttributes};

    fn resolver() -> (MemoryResolver, TextureHandle, TextureHandle) {
        let attributes = ReferenceAttributes {
            width: 4,
            height: 4,
            format: TextureFormat::Rgba32,
            mipmap_count: 1,
            srgb: true,
        };
        let mut resolver = MemoryResolver::new();
        let disk = resolver.insert_asset("textures/disk.png", attributes, &[255]);
        let memory = resolver.insert_transient("memory", attributes);
        (resolver, disk, memory)
    }

    #[test]
    fn test_set_slices_rejects_null_sequence() {
        let (resolver, _, _) = resolver();
        let mut list = SliceList::new();
        assert_eq!(
            list.set_slices(None, &resolver),
            Err(SliceListError::NullSequence)
        );
    }

    #[test]
    fn test_set_slices_rejects_null_element() {
        let (resolver, _, _) = resolver();
        let mut list = SliceList::new();
        let err = list.set_slices(Some(&[None]), &resolver).unwrap_err();
        assert_eq!(err, SliceListError::NullElement { index: 0 });
        assert!(err.to_string().contains("index '0'"));
    }

    #[test]
    fn test_set_slices_rejects_memory_texture() {
        let (resolver, disk, memory) = resolver();
        let mut list = SliceList::new();
        let err = list
            .set_slices(Some(&[Some(disk), Some(memory)]), &resolver)
            .unwrap_err();
        assert_eq!(
            err,
            SliceListError::NotOnDisk {
                index: 1,
                name: "memory".to_string()
            }
        );
        assert!(err.to_string().contains("does not exist on disk"));
    }

    #[test]
    fn test_set_slices_is_atomic() {
        let (resolver, disk, memory) = resolver();
        let mut list: SliceList = [disk.clone()].into_iter().collect();

        let result = list.set_slices(Some(&[Some(disk.clone()), Some(disk.clone()), None]), &resolver);
        assert!(result.is_err());
        assert_eq!(list.len(), 1);

        let result = list.set_slices(Some(&[Some(memory)]), &resolver);
        assert!(result.is_err());
        assert_eq!(list.get(0), Some(&disk));
    }

    #[test]
    fn test_set_slices_roundtrip() {
        let (resolver, disk, _) = resolver();
        let mut list = SliceList::new();
        list.set_slices(Some(&[Some(disk.clone()), Some(disk.clone())]), &resolver)
            .unwrap();
        assert_eq!(list.entries(), &[Some(disk.clone()), Some(disk)]);

        list.set_slices(Some(&[]), &resolver).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_insert_remove_replace() {
        let a = TextureHandle::new("a.png");
        let b = TextureHandle::new("b.png");
        let mut list = SliceList::new();

        list.insert_at(0, Some(a.clone())).unwrap();
        list.insert_at(0, Some(b.clone())).unwrap();
        list.insert_at(2, None).unwrap();
        assert_eq!(list.entries(), &[Some(b.clone()), Some(a.clone()), None]);
        assert!(list.insert_at(5, None).is_err());

        assert_eq!(list.replace_at(2, Some(b.clone())).unwrap(), None);
        assert_eq!(list.remove_at(0).unwrap(), Some(b.clone()));
        assert_eq!(list.master(), Some(&a));
        assert_eq!(
            list.remove_at(2),
            Err(SliceListError::OutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            list.replace_at(7, None),
            Err(SliceListError::OutOfRange { index: 7, len: 2 })
        );
    }

    #[test]
    fn test_get_out_of_range_is_none() {
        let list: SliceList = [TextureHandle::new("a.png")].into_iter().collect();
        assert!(list.get(0).is_some());
        assert!(list.get(1).is_none());
        assert!(list.get(usize::MAX).is_none());
    }

    #[test]
    fn test_handles_skip_unset_entries() {
        let list: SliceList = [Some(TextureHandle::new("a.png")), None, Some(TextureHandle::new("b.png"))]
            .into_iter()
            .collect();
        let keys: Vec<_> = list.handles().map(TextureHandle::key).collect();
        assert_eq!(keys, ["a.png", "b.png"]);
    }
}
