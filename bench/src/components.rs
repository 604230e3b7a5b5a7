//! Common component types used across benchmarks.
//!
//! A mix of small plain-data components, a heap-owning component and a marker, so arena
//! allocation, value copies and destructor runs all show up in the numbers.

use rusty_macros::Component;

/// 3D position component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 3D velocity component (12 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Health component for damageable entities.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

/// RGBA color (16 bytes).
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Display name. Owns heap memory, so it has a real destructor.
#[derive(Component, Clone, Debug, Default, PartialEq)]
pub struct Name(pub String);

/// Marker for entities that are skipped by movement.
#[derive(Component, Clone, Copy, Debug, Default, PartialEq)]
pub struct Frozen;

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn document_component_sizes() {
        assert_eq!(size_of::<Position>(), 12);
        assert_eq!(size_of::<Velocity>(), 12);
        assert_eq!(size_of::<Health>(), 8);
        assert_eq!(size_of::<Color>(), 16);
        assert_eq!(size_of::<Name>(), size_of::<String>());
        assert_eq!(size_of::<Frozen>(), 0);
    }
}
