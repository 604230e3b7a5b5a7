//! The entity table and the memory it stores component values in.
//!
//! This module provides [`Storage`], the authoritative record of which entities exist and which
//! component values they hold, along with the layers it is built on.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Storage (this module)                                          │
//! │  - Ordered entity records (id, slots, tombstone)                │
//! │  - Attach / detach / lookup, typed or by name                   │
//! │  - Compaction and snapshot copies                               │
//! └────────┬───────────────────────────────────────┬────────────────┘
//!          │                                       │
//! ┌────────▼────────┐                     ┌────────▼─────────┐
//! │  Slots          │                     │  Arena           │
//! │  - Mask of ids  │──── pointers ──────▶│  - Bump buffers  │
//! │  - Ranked ptrs  │                     │  - Stable addrs  │
//! └─────────────────┘                     └────────▲─────────┘
//!                                                  │
//!                                         ┌────────┴─────────┐
//!                                         │  Slot            │
//!                                         │  - construct     │
//!                                         │  - destroy       │
//!                                         └──────────────────┘
//! ```
//!
//! # Entity Lifecycle
//!
//! Entities are added with strictly increasing ids, so records are always sorted and can be
//! binary searched. Removing an entity only tombstones its record: the record, its component
//! values and its arena memory all stay put until [`Storage::collect_garbage`] runs.
//!
//! ```text
//! Live ──remove_entity──▶ Tombstoned ──collect_garbage──▶ (gone)
//! ```
//!
//! # Compaction
//!
//! [`Storage::collect_garbage`] builds a fresh arena, relocates every surviving value into it
//! (grouped by component id, so values of one type end up adjacent), destroys the values of
//! tombstoned records and releases the old arena. The table version is bumped, which makes any
//! cached [`Handle`] fall back to a lookup by id.
//!
//! # Snapshots
//!
//! `Storage` implements [`Clone`]: the copy holds clones of every live value in its own arena and
//! carries the next version, so handles issued by the source keep working against the copy.

mod arena;
mod config;
mod slot;
mod slots;

use std::{cmp, mem, ptr::NonNull, sync::Arc};

pub use arena::Arena;
pub use config::Config;
use log::debug;
pub use slot::Slot;
pub use slots::Slots;

use crate::ecs::component::{self, Component, Info, IntoMask, Lookup, Mask, Registry};
use crate::ecs::entity::{self, Handle};
use crate::ecs::query::View;
use crate::{Error, Result};

/// One entity's row in the table.
#[derive(Debug)]
pub(crate) struct Record {
    id: entity::Id,
    slots: Slots,
    removed: bool,
}

impl Record {
    #[inline]
    fn new(id: entity::Id, slots: Slots) -> Self {
        Self {
            id,
            slots,
            removed: false,
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> entity::Id {
        self.id
    }

    #[inline]
    pub(crate) fn mask(&self) -> &Mask {
        self.slots.mask()
    }

    #[inline]
    pub(crate) fn is_removed(&self) -> bool {
        self.removed
    }
}

/// The entity table.
///
/// Owns one [`Arena`] holding every component value, and the ordered entity records pointing
/// into it. Component types are resolved through a shared [`Registry`].
#[derive(Debug)]
pub struct Storage {
    registry: Arc<Registry>,
    config: Config,
    arena: Arena,
    records: Vec<Record>,
    version: u64,
}

// SAFETY: The raw pointers in each record point into the arena this storage owns, and every
// component value is `Send + Sync`. Moving the whole table to another thread moves all of it.
unsafe impl Send for Storage {}

impl Storage {
    /// Create an empty table with the default [`Config`].
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_config(registry, Config::default())
    }

    /// Create an empty table.
    pub fn with_config(registry: Arc<Registry>, config: Config) -> Self {
        Self {
            arena: Arena::with_reserve(config.reserve),
            registry,
            config,
            records: Vec::new(),
            version: 0,
        }
    }

    /// Get the table version. It changes whenever records may have moved.
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get the number of records, including tombstoned ones.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table holds no records at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get the number of live (not tombstoned) entities.
    pub fn live_count(&self) -> usize {
        self.records.iter().filter(|record| !record.removed).count()
    }

    /// Get the arena holding this table's component values.
    #[inline]
    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Get the component registry.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Get the table configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub(crate) fn records(&self) -> &[Record] {
        &self.records
    }

    /// Append a record for entity `id`.
    ///
    /// # Errors
    /// [`Error::OutOfOrderId`] unless `id` is greater than every id recorded so far, tombstoned
    /// ones included.
    pub fn add_entity(&mut self, id: entity::Id) -> Result<Handle> {
        if let Some(last) = self.records.last()
            && id <= last.id
        {
            return Err(Error::OutOfOrderId { id, last: last.id });
        }
        self.records.push(Record::new(id, Slots::new()));
        Ok(Handle::new(self.records.len() - 1, id, self.version))
    }

    /// Tombstone an entity. Its component values are destroyed at the next compaction.
    pub fn remove_entity(&mut self, handle: Handle) -> Result<()> {
        let index = self.locate(handle)?;
        let record = &mut self.records[index];
        if record.removed {
            return Err(Error::AlreadyRemoved(record.id));
        }
        record.removed = true;
        Ok(())
    }

    /// Find the live entity with `id`.
    pub fn find_entity(&self, id: entity::Id) -> Option<Handle> {
        let index = self.search(id)?;
        (!self.records[index].removed).then(|| Handle::new(index, id, self.version))
    }

    /// Is `handle` resolvable to a live entity?
    pub fn is_valid(&self, handle: Handle) -> bool {
        self.live(handle).is_ok()
    }

    /// Get an up to date handle for the same entity.
    pub fn refresh(&self, handle: Handle) -> Result<Handle> {
        let index = self.locate(handle)?;
        Ok(Handle::new(index, handle.id(), self.version))
    }

    /// Get the mask of components held by an entity.
    pub fn mask(&self, handle: Handle) -> Result<&Mask> {
        let index = self.live(handle)?;
        Ok(self.records[index].mask())
    }

    /// Attach a component value to an entity, registering its type if needed.
    ///
    /// # Errors
    /// [`Error::EntityRemoved`] for a tombstoned entity, [`Error::DuplicateComponent`] if the
    /// entity already holds a `C`.
    pub fn add<C: Component>(&mut self, handle: Handle, value: C) -> Result<&mut C> {
        let index = self.live(handle)?;
        let id = self.registry.id::<C>()?;
        let ptr = self.attach(index, id, |slot| unsafe { slot.write(value) })?;

        // SAFETY: ptr was just initialized with a C and lives in our arena.
        Ok(unsafe { ptr.cast::<C>().as_mut() })
    }

    /// Attach a copy of the value at `src` to an entity.
    ///
    /// # Safety
    /// `src` must point to a live value of the component type `key` resolves to.
    pub unsafe fn add_from_copy(
        &mut self,
        handle: Handle,
        key: impl Lookup,
        src: NonNull<u8>,
    ) -> Result<NonNull<u8>> {
        let index = self.live(handle)?;
        let id = key.resolve(&self.registry)?;
        self.attach(index, id, |slot| unsafe { slot.copy_from(src) })
    }

    /// Attach the value at `src` to an entity by moving it.
    ///
    /// On success the value belongs to the table and the caller must treat `src` as
    /// uninitialized (never drop it). On error `src` is untouched.
    ///
    /// # Safety
    /// `src` must point to a live value of the component type `key` resolves to.
    pub unsafe fn add_from_move(
        &mut self,
        handle: Handle,
        key: impl Lookup,
        src: NonNull<u8>,
    ) -> Result<NonNull<u8>> {
        let index = self.live(handle)?;
        let id = key.resolve(&self.registry)?;
        self.attach(index, id, |slot| unsafe { slot.move_from(src) })
    }

    /// Detach and destroy an entity's `C`, registering its type if needed.
    ///
    /// # Errors
    /// [`Error::MissingComponent`] if the entity holds no `C`.
    pub fn remove<C: Component>(&mut self, handle: Handle) -> Result<()> {
        let index = self.live(handle)?;
        let id = self.registry.id::<C>()?;
        self.detach(index, id)
    }

    /// Detach and destroy a component by id or name.
    pub fn remove_component(&mut self, handle: Handle, key: impl Lookup) -> Result<()> {
        let index = self.live(handle)?;
        let id = key.resolve(&self.registry)?;
        self.detach(index, id)
    }

    /// Get an entity's `C`, if it holds one.
    pub fn get<C: Component>(&self, handle: Handle) -> Result<Option<&C>> {
        let index = self.live(handle)?;
        let Some(id) = self.registry.get::<C>() else {
            return Ok(None);
        };

        // SAFETY: The slot for C's id always holds a live C.
        Ok(self.records[index]
            .slots
            .get(id)
            .map(|ptr| unsafe { ptr.cast::<C>().as_ref() }))
    }

    /// Get an entity's `C` mutably, if it holds one.
    pub fn get_mut<C: Component>(&mut self, handle: Handle) -> Result<Option<&mut C>> {
        let index = self.live(handle)?;
        let Some(id) = self.registry.get::<C>() else {
            return Ok(None);
        };

        // SAFETY: The slot for C's id always holds a live C, and `&mut self` makes it exclusive.
        Ok(self.records[index]
            .slots
            .get(id)
            .map(|ptr| unsafe { ptr.cast::<C>().as_mut() }))
    }

    /// Get a pointer to an entity's component by id or name, if it holds one.
    ///
    /// The pointer is valid until the component is removed or the table is compacted.
    ///
    /// # Errors
    /// [`Error::NotFound`] if `key` names no registered component.
    pub fn get_component(&self, handle: Handle, key: impl Lookup) -> Result<Option<NonNull<u8>>> {
        let index = self.live(handle)?;
        let id = key.resolve(&self.registry)?;
        Ok(self.records[index].slots.get(id))
    }

    /// Create a view over the live entities whose components are a superset of `mask`.
    pub fn view(&self, mask: Mask) -> View<'_> {
        View::new(self, mask)
    }

    /// Create a view over the live entities holding every component in `Q`.
    pub fn entities_with<Q: IntoMask>(&self) -> Result<View<'_>> {
        Ok(self.view(Q::into_mask(&self.registry)?))
    }

    /// Create a view over the live entities holding every named component.
    pub fn entities_with_names<K: Lookup>(&self, keys: &[K]) -> Result<View<'_>> {
        let mask = keys
            .iter()
            .map(|key| key.resolve(&self.registry))
            .collect::<Result<Mask>>()?;
        Ok(self.view(mask))
    }

    /// Drop tombstoned records and relocate every surviving value into a fresh arena.
    ///
    /// Raw pointers obtained before the call are invalidated. Handles stay usable.
    pub fn collect_garbage(&mut self) {
        let infos = self.registry.infos();
        let arena = Arena::with_reserve(cmp::max(self.arena.allocated(), self.config.reserve));

        let (mut live, removed): (Vec<Record>, Vec<Record>) = mem::take(&mut self.records)
            .into_iter()
            .partition(|record| !record.removed);

        let mut present = Mask::new();
        for record in &mut live {
            record.slots.shrink_to_fit();
            present.union_with(record.mask());
        }

        for id in present.ids() {
            let info = &infos[id.index()];
            for record in &mut live {
                let Some(src) = record.slots.get(id) else {
                    continue;
                };
                let slot = Slot::alloc(&arena, info);
                // SAFETY: src holds a live value of this type, and the record forgets it below.
                unsafe { slot.move_from(src) };
                record.slots.replace(id, slot.as_ptr());
            }
        }

        let old_arena = mem::replace(&mut self.arena, arena);
        self.records = live;
        self.version += 1;

        for record in &removed {
            destroy_values(&infos, &record.slots);
        }
        debug!(
            "compacted storage to version {}: {} live, {} swept, {} -> {} bytes",
            self.version,
            self.records.len(),
            removed.len(),
            old_arena.allocated(),
            self.arena.allocated()
        );
        drop(old_arena);
    }

    /// Resolve a handle to a record index, tombstoned or not.
    fn locate(&self, handle: Handle) -> Result<usize> {
        if handle.version() == self.version
            && let Some(record) = self.records.get(handle.index())
            && record.id == handle.id()
        {
            return Ok(handle.index());
        }
        self.search(handle.id())
            .ok_or(Error::InvalidHandle(handle.id()))
    }

    /// Resolve a handle to the index of a live record.
    fn live(&self, handle: Handle) -> Result<usize> {
        let index = self.locate(handle)?;
        if self.records[index].removed {
            return Err(Error::EntityRemoved(handle.id()));
        }
        Ok(index)
    }

    /// Binary search for the record of entity `id`.
    fn search(&self, id: entity::Id) -> Option<usize> {
        self.records
            .binary_search_by_key(&id, |record| record.id)
            .ok()
    }

    /// Allocate and construct a component value for the record at `index`.
    fn attach(
        &mut self,
        index: usize,
        id: component::Id,
        construct: impl FnOnce(Slot<'_>),
    ) -> Result<NonNull<u8>> {
        let record = &self.records[index];
        if record.slots.contains(id) {
            return Err(Error::DuplicateComponent {
                entity: record.id,
                component: id,
            });
        }
        let info = self.registry.info(id)?;
        let slot = Slot::alloc(&self.arena, &info);
        construct(slot);

        let inserted = self.records[index].slots.insert(id, slot.as_ptr());
        debug_assert!(inserted, "component slot was filled during construction");
        Ok(slot.as_ptr())
    }

    /// Destroy and detach the component `id` of the record at `index`.
    fn detach(&mut self, index: usize, id: component::Id) -> Result<()> {
        let record = &self.records[index];
        if !record.slots.contains(id) {
            return Err(Error::MissingComponent {
                entity: record.id,
                component: id,
            });
        }
        let info = self.registry.info(id)?;
        if let Some(ptr) = self.records[index].slots.remove(id) {
            // SAFETY: The slot held a live value of this type and is now forgotten.
            unsafe { Slot::new(ptr, &info).destroy() };
        }
        Ok(())
    }
}

impl Clone for Storage {
    /// Copy every live entity and a clone of each of its values into a new table.
    ///
    /// The copy is built one value at a time, so a panicking `Clone` impl leaves behind a
    /// partial copy that is dropped cleanly and an untouched source.
    fn clone(&self) -> Self {
        let infos = self.registry.infos();
        let mut copy = Storage {
            registry: self.registry.clone(),
            config: self.config,
            arena: Arena::with_reserve(cmp::max(self.arena.allocated(), self.config.reserve)),
            records: Vec::with_capacity(self.live_count()),
            version: self.version + 1,
        };

        let mut present = Mask::new();
        for record in self.records.iter().filter(|record| !record.removed) {
            present.union_with(record.mask());
            copy.records
                .push(Record::new(record.id, Slots::with_capacity(record.slots.len())));
        }

        for id in present.ids() {
            let info = &infos[id.index()];
            let sources = self.records.iter().filter(|record| !record.removed);
            for (source, target) in sources.zip(copy.records.iter_mut()) {
                let Some(src) = source.slots.get(id) else {
                    continue;
                };
                let slot = Slot::alloc(&copy.arena, info);
                // SAFETY: src holds a live value of this type and slot is fresh memory.
                unsafe { slot.copy_from(src) };
                target.slots.insert(id, slot.as_ptr());
            }
        }

        debug!(
            "copied storage version {} -> {}: {} entities",
            self.version,
            copy.version,
            copy.records.len()
        );
        copy
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        let infos = self.registry.infos();
        for record in &self.records {
            destroy_values(&infos, &record.slots);
        }
    }
}

/// Destroy every value referenced by `slots`.
fn destroy_values(infos: &[Info], slots: &Slots) {
    for (id, ptr) in slots.iter() {
        // SAFETY: Every pointer in a record's slots refers to a live value of that id's type.
        unsafe { Slot::new(ptr, &infos[id.index()]).destroy() };
    }
}
