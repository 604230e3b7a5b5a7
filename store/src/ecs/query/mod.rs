//! Mask-based queries over a storage table.
//!
//! A [`View`] pairs a table with a component [`Mask`] and yields a [`Handle`] for every live entity
//! holding at least those components, in ascending entity id order.
//!
//! # Usage
//!
//! ```rust,ignore
//! use rusty_macros::Component;
//!
//! #[derive(Component, Clone)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Component, Clone)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let view = storage.entities_with::<(Position, Velocity)>()?;
//! for handle in &view {
//!     let pos = storage.get::<Position>(handle)?;
//! }
//!
//! // The same query, by registered name.
//! let view = storage.entities_with_names(&["Position", "Velocity"])?;
//! ```
//!
//! Views are lazy and restartable: every call to [`View::iter`] walks the table from the start.
//! An empty mask matches every live entity.

use std::{iter::Enumerate, slice};

use crate::ecs::component::Mask;
use crate::ecs::entity::Handle;
use crate::ecs::storage::{Record, Storage};

/// A query over the live entities of a [`Storage`] holding every component in a mask.
#[derive(Debug, Clone)]
pub struct View<'a> {
    storage: &'a Storage,
    mask: Mask,
}

impl<'a> View<'a> {
    #[inline]
    pub(crate) fn new(storage: &'a Storage, mask: Mask) -> Self {
        Self { storage, mask }
    }

    /// Get the mask entities must be a superset of.
    #[inline]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Iterate the handles of every matching entity.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            records: self.storage.records().iter().enumerate(),
            mask: &self.mask,
            version: self.storage.version(),
        }
    }
}

impl<'v> IntoIterator for &'v View<'_> {
    type Item = Handle;
    type IntoIter = Iter<'v>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the matching entities of a [`View`].
#[derive(Debug, Clone)]
pub struct Iter<'v> {
    records: Enumerate<slice::Iter<'v, Record>>,
    mask: &'v Mask,
    version: u64,
}

impl Iterator for Iter<'_> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let (mask, version) = (self.mask, self.version);
        self.records.find_map(|(index, record)| {
            (!record.is_removed() && record.mask().is_superset(mask))
                .then(|| Handle::new(index, record.id(), version))
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.records.size_hint().1)
    }
}
