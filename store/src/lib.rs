//! An in-process entity/component store.
//!
//! Components are attached to monotonically identified entities either statically (by Rust type)
//! or dynamically (by registered name and a type-erased pointer). Component values live in a
//! growable bump [`Arena`](ecs::storage::Arena) owned by the entity table; removed entities are
//! tombstoned and swept by [`collect_garbage`](ecs::storage::Storage::collect_garbage), which
//! relocates every surviving value into a fresh arena.
//!
//! ```ignore
//! use std::sync::Arc;
//! use rusty_store::ecs::{component::Registry, world::World};
//!
//! #[derive(rusty_macros::Component, Clone)]
//! struct Position { x: f32, y: f32 }
//!
//! let registry = Arc::new(Registry::new());
//! registry.register::<Position>("Position")?;
//!
//! let mut world = World::new(registry);
//! let entity = world.create()?;
//! world.storage_mut().add(entity, Position { x: 1.0, y: 2.0 })?;
//! ```

// Lets `#[derive(Component)]` expand to `::rusty_store::...` inside this crate too.
extern crate self as rusty_store;

pub mod ecs;
mod error;

pub use error::{Error, Result};
