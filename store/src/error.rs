//! Error types for the store.
//!
//! Every failure is synchronous and leaves the store exactly as it was before the call: all checks
//! run before any mutation.

use thiserror::Error;

use crate::ecs::{component, entity};

/// Errors produced by the registry, the arena and the entity table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A component name is already bound, or the type already carries a name.
    #[error("component `{name}` is already registered")]
    DuplicateRegistration { name: String },

    /// The component id space is exhausted.
    #[error("too many component types registered (limit is {limit})")]
    CapacityExceeded { limit: usize },

    /// No component is registered under the given name or id.
    #[error("component {key} is not registered")]
    NotFound { key: String },

    /// Entities must be added in strictly increasing id order.
    #[error("entity {id:?} must be greater than the last entity {last:?}")]
    OutOfOrderId { id: entity::Id, last: entity::Id },

    /// The entity was already removed.
    #[error("entity {0:?} has already been removed")]
    AlreadyRemoved(entity::Id),

    /// A component operation targeted a removed entity.
    #[error("entity {0:?} has been removed")]
    EntityRemoved(entity::Id),

    /// The entity already holds this component.
    #[error("entity {entity:?} already has component {component:?}")]
    DuplicateComponent {
        entity: entity::Id,
        component: component::Id,
    },

    /// The entity does not hold this component.
    #[error("entity {entity:?} does not have component {component:?}")]
    MissingComponent {
        entity: entity::Id,
        component: component::Id,
    },

    /// A stale handle could not be re-resolved against the current table.
    #[error("handle for entity {0:?} is no longer valid")]
    InvalidHandle(entity::Id),

    /// No live entity exists with the given id.
    #[error("entity {0:?} not found")]
    EntityNotFound(entity::Id),

    /// An arena request described an impossible layout.
    #[error("invalid allocation layout (align {align}, size {size}, count {count})")]
    InvalidLayout {
        align: usize,
        size: usize,
        count: usize,
    },
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
