use fixedbitset::FixedBitSet;

use crate::Result;
use crate::all_tuples;
use crate::ecs::component::{Component, Id, MAX_COMPONENTS, Registry};

/// A fixed-width set of component ids.
///
/// Every entity record carries one of these describing which components it holds, and queries
/// are expressed as a mask the record must be a superset of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    bits: FixedBitSet,
}

impl Default for Mask {
    fn default() -> Self {
        Self::new()
    }
}

impl Mask {
    /// Create an empty mask wide enough for every possible component id.
    #[inline]
    pub fn new() -> Self {
        Self {
            bits: FixedBitSet::with_capacity(MAX_COMPONENTS),
        }
    }

    /// Can `id` be held by a mask? Only ids below [`MAX_COMPONENTS`] can.
    #[inline]
    pub fn fits(id: Id) -> bool {
        id.index() < MAX_COMPONENTS
    }

    /// Set the bit for `id`.
    ///
    /// Returns false, leaving the mask untouched, if `id` is out of range.
    #[inline]
    pub fn insert(&mut self, id: Id) -> bool {
        if !Self::fits(id) {
            return false;
        }
        self.bits.insert(id.index());
        true
    }

    /// Clear the bit for `id`. Out of range ids are never set, so they are ignored.
    #[inline]
    pub fn remove(&mut self, id: Id) {
        if Self::fits(id) {
            self.bits.set(id.index(), false);
        }
    }

    /// Is the bit for `id` set?
    #[inline]
    pub fn contains(&self, id: Id) -> bool {
        self.bits.contains(id.index())
    }

    /// The number of set bits strictly below `id`.
    ///
    /// This is the position a value for `id` occupies in a densely packed array ordered by id.
    #[inline]
    pub fn rank(&self, id: Id) -> usize {
        self.bits.count_ones(..id.index().min(MAX_COMPONENTS))
    }

    /// The number of set bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.bits.count_ones(..)
    }

    /// Is no bit set?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.is_clear()
    }

    /// Is every bit set in `other` also set here?
    #[inline]
    pub fn is_superset(&self, other: &Mask) -> bool {
        self.bits.is_superset(&other.bits)
    }

    /// Merge every bit of `other` into this mask.
    #[inline]
    pub fn union_with(&mut self, other: &Mask) {
        self.bits.union_with(&other.bits);
    }

    /// Iterate the set ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.bits.ones().map(|index| Id::new(index as u16))
    }
}

impl FromIterator<Id> for Mask {
    fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
        let mut mask = Mask::new();
        for id in iter {
            mask.insert(id);
        }
        mask
    }
}

/// Build a [`Mask`] from a component type or a tuple of component types.
///
/// Component types that are not yet registered are assigned an id on the way.
pub trait IntoMask {
    fn into_mask(registry: &Registry) -> Result<Mask>;
}

impl IntoMask for () {
    fn into_mask(_registry: &Registry) -> Result<Mask> {
        Ok(Mask::new())
    }
}

impl<C: Component> IntoMask for C {
    fn into_mask(registry: &Registry) -> Result<Mask> {
        let mut mask = Mask::new();
        mask.insert(registry.id::<C>()?);
        Ok(mask)
    }
}

macro_rules! tuple_mask {
    ($($name: ident),*) => {
        impl<$($name: IntoMask),*> IntoMask for ($($name,)*) {
            fn into_mask(registry: &Registry) -> Result<Mask> {
                let mut mask = Mask::new();
                $(
                    mask.union_with(&$name::into_mask(registry)?);
                )*
                Ok(mask)
            }
        }
    }
}

all_tuples!(tuple_mask);
