//! Benchmark utilities for Rusty Store.
//!
//! This crate provides the benchmarking fixtures for the entity table:
//!
//! - **Microbenchmarks**: Individual store operations (arena allocation, attach, query, clone)
//! - **Churn scenario**: Entities being created, detached and destroyed between compactions
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p rusty_bench
//!
//! # Run specific benchmark group
//! cargo bench -p rusty_bench -- query
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.

pub mod churn;
pub mod components;

use std::sync::Arc;

use rusty_store::ecs::component::Registry;

/// Build a registry with every benchmark component bound to its type name.
pub fn registry() -> rusty_store::Result<Arc<Registry>> {
    use components::*;

    let registry = Arc::new(Registry::new());
    registry.register::<Position>("Position")?;
    registry.register::<Velocity>("Velocity")?;
    registry.register::<Health>("Health")?;
    registry.register::<Color>("Color")?;
    registry.register::<Name>("Name")?;
    registry.register::<Frozen>("Frozen")?;
    Ok(registry)
}
