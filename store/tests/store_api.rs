use std::collections::BTreeSet;
use std::sync::Arc;

use rusty_macros::Component;
use rusty_store::Error;
use rusty_store::ecs::component::Registry;
use rusty_store::ecs::entity::Id;
use rusty_store::ecs::storage::{Config, Storage};
use rusty_store::ecs::world::World;

#[derive(Component, Clone, Copy, Debug, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Component, Clone, Copy, Debug, PartialEq)]
struct Flag {}

#[derive(Component, Clone, Debug, PartialEq)]
struct Tag(String);

fn registry() -> Arc<Registry> {
    let registry = Arc::new(Registry::new());
    registry.register::<Position>("Position").unwrap();
    registry.register::<Flag>("Flag").unwrap();
    registry.register::<Tag>("Tag").unwrap();
    registry
}

#[test]
fn query_then_compact() {
    // Given
    let mut storage = Storage::new(registry());
    let e1 = storage.add_entity(Id::new(1)).unwrap();
    let e2 = storage.add_entity(Id::new(2)).unwrap();
    let e3 = storage.add_entity(Id::new(3)).unwrap();
    storage.add(e1, Position { x: 1.0, y: 2.0 }).unwrap();
    storage.add(e3, Position { x: 1.0, y: 2.0 }).unwrap();
    storage.add(e2, Flag {}).unwrap();
    storage.add(e3, Flag {}).unwrap();

    // When
    let matched: Vec<_> = storage
        .entities_with::<(Position, Flag)>()
        .unwrap()
        .iter()
        .collect();

    // Then
    assert_eq!(matched, vec![e3]);

    // When
    let before_e1 = storage.get_component(e1, "Position").unwrap().unwrap();
    let before_e3 = storage.get_component(e3, "Position").unwrap().unwrap();
    storage.remove_entity(e2).unwrap();
    storage.collect_garbage();

    // Then
    assert!(storage.find_entity(Id::new(2)).is_none());
    let e1 = storage.find_entity(Id::new(1)).unwrap();
    let e3 = storage.find_entity(Id::new(3)).unwrap();
    assert_eq!(
        storage.get::<Position>(e1),
        Ok(Some(&Position { x: 1.0, y: 2.0 }))
    );
    assert_eq!(
        storage.get::<Position>(e3),
        Ok(Some(&Position { x: 1.0, y: 2.0 }))
    );
    assert_eq!(storage.get::<Flag>(e3), Ok(Some(&Flag {})));
    assert_ne!(storage.get_component(e1, "Position").unwrap().unwrap(), before_e1);
    assert_ne!(storage.get_component(e3, "Position").unwrap().unwrap(), before_e3);
}

#[test]
fn compaction_preserves_live_ids() {
    // Given
    let mut storage = Storage::with_config(registry(), Config::default().with_reserve(256));
    let handles: Vec<_> = (1..=20)
        .map(|id| {
            let handle = storage.add_entity(Id::new(id)).unwrap();
            storage.add(handle, Tag(format!("entity {id}"))).unwrap();
            handle
        })
        .collect();
    for handle in handles.iter().filter(|handle| handle.id().get() % 3 == 0) {
        storage.remove_entity(*handle).unwrap();
    }
    let live_before: BTreeSet<_> = (1..=20)
        .map(Id::new)
        .filter(|id| storage.find_entity(*id).is_some())
        .collect();

    // When
    storage.collect_garbage();
    storage.collect_garbage();

    // Then
    let live_after: BTreeSet<_> = (1..=20)
        .map(Id::new)
        .filter(|id| storage.find_entity(*id).is_some())
        .collect();
    assert_eq!(live_before, live_after);
    assert_eq!(storage.len(), live_after.len());
    for handle in &handles {
        match storage.get::<Tag>(*handle) {
            Ok(Some(tag)) => assert_eq!(tag, &Tag(format!("entity {}", handle.id().get()))),
            Ok(None) => panic!("live entity lost its tag"),
            Err(err) => assert_eq!(err, Error::InvalidHandle(handle.id())),
        }
    }
}

#[test]
fn detach_and_reattach_round_trip() {
    // Given
    let mut storage = Storage::new(registry());
    let e1 = storage.add_entity(Id::new(1)).unwrap();
    let value = Tag("round trip".into());
    storage.add(e1, value.clone()).unwrap();

    // When
    storage.remove_component(e1, "Tag").unwrap();
    let mask_after_remove = storage.mask(e1).unwrap().clone();
    let missing = storage.remove_component(e1, "Tag");
    storage.add(e1, value.clone()).unwrap();

    // Then
    assert!(mask_after_remove.is_empty());
    assert!(matches!(missing, Err(Error::MissingComponent { .. })));
    assert_eq!(storage.mask(e1).unwrap().len(), 1);
    assert_eq!(storage.get::<Tag>(e1), Ok(Some(&value)));
}

#[test]
fn copies_are_independent() {
    // Given
    let mut source = Storage::new(registry());
    let e1 = source.add_entity(Id::new(1)).unwrap();
    source.add(e1, Tag("source".into())).unwrap();
    let source_version = source.version();

    // When
    let mut copy = source.clone();
    *copy.get_mut::<Tag>(e1).unwrap().unwrap() = Tag("copy".into());
    source.add(e1, Flag {}).unwrap();

    // Then
    assert_eq!(source.version(), source_version);
    assert_eq!(copy.version(), source_version + 1);
    assert_eq!(source.get::<Tag>(e1), Ok(Some(&Tag("source".into()))));
    assert_eq!(copy.get::<Tag>(e1), Ok(Some(&Tag("copy".into()))));
    assert_eq!(copy.get::<Flag>(e1), Ok(None));
}

#[test]
fn world_by_name() {
    // Given
    let mut world = World::new(registry());
    let e1 = world.create().unwrap();
    let e2 = world.create().unwrap();
    world.storage_mut().add(e1, Tag("one".into())).unwrap();
    world.storage_mut().add(e2, Tag("two".into())).unwrap();
    world.storage_mut().add(e2, Flag {}).unwrap();

    // When
    let flagged: Vec<_> = world
        .entities_with_names(&["Tag", "Flag"])
        .unwrap()
        .iter()
        .collect();
    world.destroy(e2).unwrap();
    world.collect_garbage();

    // Then
    assert_eq!(flagged, vec![e2]);
    assert_eq!(world.get(e2.id()), Err(Error::EntityNotFound(e2.id())));
    let e1 = world.get(e1.id()).unwrap();
    let tag = world.storage().get_component(e1, "Tag").unwrap().unwrap();
    assert_eq!(unsafe { tag.cast::<Tag>().as_ref() }, &Tag("one".into()));
}
