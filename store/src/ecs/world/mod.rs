//! The World ties entity id issuance to a storage table.
//!
//! A `World` hands out fresh entity ids from its own [`Allocator`](entity::Allocator) and
//! records them in a [`Storage`] table, so callers never have to pick ids themselves.
//!
//! # Architecture
//!
//! The World coordinates:
//! - **Entity Allocator**: Issues strictly increasing entity ids, starting at 1
//! - **Storage**: The entity table holding component values
//! - **Component Registry**: Shared with the storage, resolves component types and names
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use rusty_store::ecs::{component::Registry, world::World};
//!
//! let registry = Arc::new(Registry::new());
//! registry.register::<Position>("Position")?;
//!
//! let mut world = World::new(registry);
//! let entity = world.create()?;
//! world.storage_mut().add(entity, Position { x: 0.0, y: 0.0 })?;
//!
//! for handle in &world.entities_with::<Position>()? {
//!     let pos = world.storage().get::<Position>(handle)?;
//! }
//!
//! world.destroy(entity)?;
//! world.collect_garbage();
//! ```

use std::sync::Arc;

use crate::ecs::{
    component::{IntoMask, Lookup, Registry},
    entity::{self, Handle},
    query::View,
    storage::{Config, Storage},
};
use crate::{Error, Result};

/// The World owns an entity allocator and the storage table its entities live in.
#[derive(Debug)]
pub struct World {
    /// The world's entity allocator.
    entity_allocator: entity::Allocator,

    /// The storage for entities and components in the world.
    storage: Storage,
}

impl World {
    /// Create an empty world with the default storage [`Config`].
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, Config::default())
    }

    /// Create an empty world.
    pub fn with_config(registry: Arc<Registry>, config: Config) -> Self {
        Self {
            entity_allocator: entity::Allocator::new(),
            storage: Storage::with_config(registry, config),
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        self.storage.registry()
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    #[inline]
    pub fn storage_mut(&mut self) -> &mut Storage {
        &mut self.storage
    }

    /// Create a new entity with no components.
    ///
    /// Ids added straight to the storage are skipped, so creation keeps working after them.
    pub fn create(&mut self) -> Result<Handle> {
        if let Some(last) = self.storage.records().last() {
            self.entity_allocator.skip_past(last.id());
        }
        let id = self.entity_allocator.alloc();
        self.storage.add_entity(id)
    }

    /// Get a handle to a live entity.
    ///
    /// # Errors
    /// [`Error::EntityNotFound`] if no live entity has this id.
    pub fn get(&self, id: entity::Id) -> Result<Handle> {
        self.storage
            .find_entity(id)
            .ok_or(Error::EntityNotFound(id))
    }

    /// Destroy an entity. Its components are released by the next [`World::collect_garbage`].
    pub fn destroy(&mut self, handle: Handle) -> Result<()> {
        self.storage.remove_entity(handle)
    }

    /// Sweep destroyed entities and compact component storage.
    pub fn collect_garbage(&mut self) {
        self.storage.collect_garbage();
    }

    /// Get a view of the entities holding every component in `Q`.
    pub fn entities_with<Q: IntoMask>(&self) -> Result<View<'_>> {
        self.storage.entities_with::<Q>()
    }

    /// Get a view of the entities holding every named component.
    pub fn entities_with_names<K: Lookup>(&self, keys: &[K]) -> Result<View<'_>> {
        self.storage.entities_with_names(keys)
    }
}
