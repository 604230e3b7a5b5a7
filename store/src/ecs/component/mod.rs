//! Component management for the store.
//!
//! This module provides the infrastructure for registering component types and describing them
//! without compile-time type knowledge. Components are the data records attached to entities.
//!
//! ## Architecture
//!
//! - [`Component`]: The trait that all component types must implement
//! - [`Id`]: A small integer identifier for each registered component type
//! - [`Registry`]: Thread-safe registration and lookup of component types and names
//! - [`Info`]: The type-erased lifecycle table of a component (layout, copy, move, drop)
//! - [`Mask`]: A fixed-width bitset of component ids
//! - [`Lookup`]: Anything that resolves to an [`Id`] (an id itself, or a registered name)
//!
//! ## Usage
//!
//! ```ignore
//! use rusty_store::ecs::component::{Component, Registry};
//!
//! #[derive(Component, Clone)]
//! struct Position { x: f32, y: f32 }
//!
//! let registry = Registry::new();
//! let pos_id = registry.register::<Position>("Position")?;
//! assert_eq!(registry.id_of("Position")?, pos_id);
//! ```

mod info;
mod mask;
mod registry;

pub use info::Info;
pub use mask::{IntoMask, Mask};
pub use registry::Registry;

use crate::Result;

/// The upper bound on distinct component types in a single registry.
pub const MAX_COMPONENTS: usize = 256;

/// A component identifier, unique per registry and always below [`MAX_COMPONENTS`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u16);

impl Id {
    /// Construct a new component Id from a raw value.
    #[inline]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Get the index of this component if it were to live in indexable storage (e.g. Vec, bitset)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for Id {
    #[inline]
    fn from(value: u16) -> Self {
        Self::new(value)
    }
}

/// A trait representing a component in the store.
///
/// Components must be `Clone` so a table can be snapshot-copied, and `Send + Sync` so the
/// registry and arena can be shared across threads.
pub trait Component: 'static + Sized + Send + Sync + Clone {}

/// A key that resolves to a registered component id.
///
/// This is what lets every dynamic store operation accept either a [`Id`] or a component name.
pub trait Lookup {
    /// Resolve this key against the registry.
    fn resolve(&self, registry: &Registry) -> Result<Id>;
}

impl Lookup for Id {
    #[inline]
    fn resolve(&self, registry: &Registry) -> Result<Id> {
        registry.info(*self).map(|info| info.id())
    }
}

impl Lookup for str {
    #[inline]
    fn resolve(&self, registry: &Registry) -> Result<Id> {
        registry.id_of(self)
    }
}

impl Lookup for String {
    #[inline]
    fn resolve(&self, registry: &Registry) -> Result<Id> {
        registry.id_of(self)
    }
}

impl<L: Lookup + ?Sized> Lookup for &L {
    #[inline]
    fn resolve(&self, registry: &Registry) -> Result<Id> {
        (**self).resolve(registry)
    }
}
