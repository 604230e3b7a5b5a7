//! Registration of component types.
//!
//! The [`Registry`] hands out a small [`Id`] for every component type it sees and keeps the
//! type-erased [`Info`] needed to manipulate values of that type. A type may additionally be bound
//! to a unique name, which is what the dynamic (by-name) store operations resolve against.
//!
//! # Thread Safety
//!
//! Reads of the type and name maps are lock-free via `DashMap`. Writes take the entry vector's
//! write lock first and the map shard second, so two racing registrations of the same type
//! agree on one id.

use std::any::TypeId;

use dashmap::{DashMap, mapref::entry::Entry};
use log::debug;
use parking_lot::RwLock;

use crate::ecs::component::{Component, Id, Info, MAX_COMPONENTS};
use crate::{Error, Result};

/// One registered component type.
#[derive(Debug)]
struct Registration {
    info: Info,
    name: Option<String>,
}

/// A thread-safe registry of component types.
///
/// Ids are assigned densely from 0 in registration order and stay stable for the lifetime of the
/// registry. Share one registry between stores with an `Arc`.
#[derive(Debug)]
pub struct Registry {
    /// Rust TypeId to component id.
    type_map: DashMap<TypeId, Id>,

    /// Registered name to component id.
    name_map: DashMap<String, Id>,

    /// Registered types, indexed by component id.
    entries: RwLock<Vec<Registration>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a new, empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            type_map: DashMap::new(),
            name_map: DashMap::new(),
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Get the id for component type `C`, registering it without a name if needed.
    pub fn id<C: Component>(&self) -> Result<Id> {
        if let Some(id) = self.get::<C>() {
            return Ok(id);
        }
        let mut entries = self.entries.write();
        self.assign::<C>(&mut entries)
    }

    /// Get the id for component type `C`, if registered.
    #[inline]
    pub fn get<C: 'static>(&self) -> Option<Id> {
        self.type_map
            .get(&TypeId::of::<C>())
            .map(|entry| *entry.value())
    }

    /// Register component type `C` under `name`.
    ///
    /// If `C` already has an id (e.g. from [`Registry::id`]) that id is reused and the name is
    /// bound to it. Fails if the name is taken or `C` already carries a name.
    pub fn register<C: Component>(&self, name: impl Into<String>) -> Result<Id> {
        let name = name.into();
        let mut entries = self.entries.write();

        if self.name_map.contains_key(&name) {
            return Err(Error::DuplicateRegistration { name });
        }
        if let Some(id) = self.get::<C>()
            && entries[id.index()].name.is_some()
        {
            return Err(Error::DuplicateRegistration { name });
        }

        let id = self.assign::<C>(&mut entries)?;
        debug!("bound component {} to name `{}`", std::any::type_name::<C>(), name);
        entries[id.index()].name = Some(name.clone());
        self.name_map.insert(name, id);
        Ok(id)
    }

    /// Resolve a registered name to its component id.
    pub fn id_of(&self, name: &str) -> Result<Id> {
        self.name_map
            .get(name)
            .map(|entry| *entry.value())
            .ok_or_else(|| Error::NotFound {
                key: format!("`{name}`"),
            })
    }

    /// Get the name bound to a component id.
    pub fn name(&self, id: Id) -> Result<String> {
        self.entries
            .read()
            .get(id.index())
            .and_then(|entry| entry.name.clone())
            .ok_or_else(|| Error::NotFound {
                key: format!("{id:?}"),
            })
    }

    /// Get the lifecycle table for a component id.
    pub fn info(&self, id: Id) -> Result<Info> {
        self.entries
            .read()
            .get(id.index())
            .map(|entry| entry.info)
            .ok_or_else(|| Error::NotFound {
                key: format!("{id:?}"),
            })
    }

    /// Get the lifecycle table for component type `C`, if registered.
    #[inline]
    pub fn info_of<C: 'static>(&self) -> Option<Info> {
        let id = self.get::<C>()?;
        self.info(id).ok()
    }

    /// Snapshot every lifecycle table, indexed by component id.
    pub(crate) fn infos(&self) -> Vec<Info> {
        self.entries.read().iter().map(|entry| entry.info).collect()
    }

    /// Get the number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the registry is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Assign an id to `C` if it doesn't have one yet. Caller holds the entries write lock.
    fn assign<C: Component>(&self, entries: &mut Vec<Registration>) -> Result<Id> {
        match self.type_map.entry(TypeId::of::<C>()) {
            Entry::Occupied(occupied) => Ok(*occupied.get()),
            Entry::Vacant(vacant) => {
                if entries.len() >= MAX_COMPONENTS {
                    return Err(Error::CapacityExceeded {
                        limit: MAX_COMPONENTS,
                    });
                }
                let id = Id::new(entries.len() as u16);
                entries.push(Registration {
                    info: Info::new::<C>(id),
                    name: None,
                });
                vacant.insert(id);
                debug!("registered component {} as {id:?}", std::any::type_name::<C>());
                Ok(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rusty_macros::Component;

    use super::*;

    #[derive(Component, Clone)]
    struct Position {
        #[allow(dead_code)]
        x: f32,
        #[allow(dead_code)]
        y: f32,
    }

    #[derive(Component, Clone)]
    struct Velocity {
        #[allow(dead_code)]
        dx: f32,
    }

    #[test]
    fn id_is_idempotent() {
        // Given
        let registry = Registry::new();

        // When
        let first = registry.id::<Position>().unwrap();
        let second = registry.id::<Position>().unwrap();
        let other = registry.id::<Velocity>().unwrap();

        // Then
        assert_eq!(first, second);
        assert_eq!(first, Id::new(0));
        assert_eq!(other, Id::new(1));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn get_does_not_register() {
        // Given
        let registry = Registry::new();

        // Then
        assert_eq!(registry.get::<Position>(), None);
        assert!(registry.info_of::<Position>().is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn register_binds_name() {
        // Given
        let registry = Registry::new();

        // When
        let id = registry.register::<Position>("Position").unwrap();

        // Then
        assert_eq!(registry.id_of("Position"), Ok(id));
        assert_eq!(registry.name(id), Ok("Position".to_string()));
        assert_eq!(registry.id::<Position>(), Ok(id));
        assert_eq!(registry.info(id).unwrap().layout().size(), 8);
    }

    #[test]
    fn register_reuses_unnamed_id() {
        // Given
        let registry = Registry::new();
        let id = registry.id::<Velocity>().unwrap();
        assert!(registry.name(id).is_err());

        // When
        let named = registry.register::<Velocity>("Velocity").unwrap();

        // Then
        assert_eq!(id, named);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registrations_fail_without_side_effects() {
        // Given
        let registry = Registry::new();
        registry.register::<Position>("Position").unwrap();

        // When - the name is taken by another type
        let taken = registry.register::<Velocity>("Position");

        // Then
        assert_eq!(
            taken,
            Err(Error::DuplicateRegistration {
                name: "Position".into()
            })
        );
        assert_eq!(registry.get::<Velocity>(), None);

        // When - the type already carries a name
        let renamed = registry.register::<Position>("Pos");

        // Then
        assert!(matches!(renamed, Err(Error::DuplicateRegistration { .. })));
        assert!(registry.id_of("Pos").is_err());
    }

    #[test]
    fn unknown_lookups() {
        // Given
        let registry = Registry::new();

        // Then
        assert!(matches!(
            registry.id_of("Missing"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            registry.name(Id::new(3)),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            registry.info(Id::new(3)),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn capacity_is_bounded() {
        // Given
        #[derive(Clone)]
        struct Numbered<const A: usize, const B: usize>;
        impl<const A: usize, const B: usize> Component for Numbered<A, B> {}

        macro_rules! fill_row {
            ($registry:expr, $a:literal) => {
                fill_row!(@ $registry, $a; 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15);
            };
            (@ $registry:expr, $a:literal; $($b:literal)*) => {
                $( $registry.id::<Numbered<$a, $b>>().unwrap(); )*
            };
        }

        let registry = Registry::new();

        // When
        fill_row!(registry, 0);
        fill_row!(registry, 1);
        fill_row!(registry, 2);
        fill_row!(registry, 3);
        fill_row!(registry, 4);
        fill_row!(registry, 5);
        fill_row!(registry, 6);
        fill_row!(registry, 7);
        fill_row!(registry, 8);
        fill_row!(registry, 9);
        fill_row!(registry, 10);
        fill_row!(registry, 11);
        fill_row!(registry, 12);
        fill_row!(registry, 13);
        fill_row!(registry, 14);
        fill_row!(registry, 15);

        // Then
        assert_eq!(registry.len(), MAX_COMPONENTS);
        assert_eq!(
            registry.id::<Numbered<16, 0>>(),
            Err(Error::CapacityExceeded {
                limit: MAX_COMPONENTS
            })
        );
        assert!(registry.register::<Numbered<16, 1>>("late").is_err());
        assert!(registry.id_of("late").is_err());
        assert_eq!(registry.id::<Numbered<3, 3>>(), Ok(Id::new(51)));
    }

    #[test]
    fn concurrent_registration_agrees() {
        // Given
        let registry = Arc::new(Registry::new());

        // When
        let ids: Vec<Id> = crossbeam::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = registry.clone();
                    scope.spawn(move |_| {
                        registry.id::<Velocity>().unwrap();
                        registry.id::<Position>().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
        .unwrap();

        // Then
        assert!(ids.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(registry.len(), 2);
    }
}
