use std::ptr::NonNull;

use crate::ecs::component::{Id, Mask};

/// The component values held by a single entity.
///
/// A sparse map from component id to value pointer, kept as a [`Mask`] of which ids are present
/// plus a dense array of pointers ordered by id. Entry `k` of the array belongs to the id with
/// rank `k` among the set bits, so the array length always equals the mask's popcount.
///
/// The pointers are not owned: the values live in the table's arena and are constructed and
/// destroyed by the table.
#[derive(Debug, Default, Clone)]
pub struct Slots {
    mask: Mask,
    ptrs: Vec<NonNull<u8>>,
}

impl Slots {
    /// Create an empty set of slots.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set of slots with room for `capacity` values.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mask: Mask::new(),
            ptrs: Vec::with_capacity(capacity),
        }
    }

    /// Get the mask of held component ids.
    #[inline]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Get the number of held components.
    #[inline]
    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    /// Check if no component is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }

    /// Is a value held for `id`?
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.mask.contains(id)
    }

    /// Get the value pointer for `id`, if held.
    #[inline]
    pub fn get(&self, id: Id) -> Option<NonNull<u8>> {
        self.contains(id).then(|| self.ptrs[self.mask.rank(id)])
    }

    /// Insert a pointer for `id`, shifting the pointers of every higher id.
    ///
    /// Returns false, leaving the slots untouched, if `id` is already held or out of range.
    pub fn insert(&mut self, id: Id, ptr: NonNull<u8>) -> bool {
        if self.contains(id) || !Mask::fits(id) {
            return false;
        }
        self.ptrs.insert(self.mask.rank(id), ptr);
        self.mask.insert(id);
        true
    }

    /// Replace the pointer held for `id`, returning the previous one.
    pub fn replace(&mut self, id: Id, ptr: NonNull<u8>) -> Option<NonNull<u8>> {
        if !self.contains(id) {
            return None;
        }
        let rank = self.mask.rank(id);
        Some(std::mem::replace(&mut self.ptrs[rank], ptr))
    }

    /// Remove the pointer held for `id`.
    pub fn remove(&mut self, id: Id) -> Option<NonNull<u8>> {
        if !self.contains(id) {
            return None;
        }
        let ptr = self.ptrs.remove(self.mask.rank(id));
        self.mask.remove(id);
        Some(ptr)
    }

    /// Iterate `(id, pointer)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, NonNull<u8>)> + '_ {
        self.mask.ids().zip(self.ptrs.iter().copied())
    }

    /// Release excess pointer capacity.
    #[inline]
    pub fn shrink_to_fit(&mut self) {
        self.ptrs.shrink_to_fit();
    }

    /// Get the pointer capacity.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.ptrs.capacity()
    }
}
