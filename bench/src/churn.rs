//! Entity churn benchmark scenario.
//!
//! Simulates a population that keeps turning over:
//! - Every frame a fraction of the live entities is destroyed and replaced
//! - Some survivors lose or regain components (detach/attach)
//! - Survivors are moved along their velocity
//! - Every `collect_every` frames the table is compacted
//!
//! This scenario tests:
//! - Tombstone-heavy iteration between compactions
//! - Arena growth and relocation throughput in `collect_garbage`
//! - Handle refresh after the table version changes

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rusty_store::Result;
use rusty_store::ecs::entity::Handle;
use rusty_store::ecs::storage::Config;
use rusty_store::ecs::world::World;

use crate::components::{Color, Frozen, Health, Name, Position, Velocity};

/// Configuration for the churn benchmark.
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Number of entities kept alive.
    pub entity_count: usize,
    /// Fraction of live entities destroyed and respawned per frame.
    pub churn_rate: f32,
    /// Frames between compactions.
    pub collect_every: usize,
    /// Initial arena reserve in bytes.
    pub reserve: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for ChurnConfig {
    fn default() -> Self {
        Self {
            entity_count: 10_000,
            churn_rate: 0.05,
            collect_every: 4,
            reserve: Config::DEFAULT_RESERVE,
            seed: 12345,
        }
    }
}

/// A world whose population turns over every frame.
pub struct ChurnScenario {
    config: ChurnConfig,
    world: World,
    live: Vec<Handle>,
    rng: ChaCha8Rng,
    frame: usize,
}

impl ChurnScenario {
    /// Create the scenario with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ChurnConfig::default())
    }

    pub fn with_config(config: ChurnConfig) -> Result<Self> {
        let world = World::with_config(
            crate::registry()?,
            Config::default().with_reserve(config.reserve),
        );
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            world,
            live: Vec::with_capacity(config.entity_count),
            frame: 0,
            config,
        })
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Number of live entities.
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Spawn the initial population.
    pub fn setup(&mut self) -> Result<()> {
        for _ in 0..self.config.entity_count {
            let handle = self.spawn()?;
            self.live.push(handle);
        }
        Ok(())
    }

    /// Run one frame: churn, toggle, move and maybe compact.
    pub fn update(&mut self) -> Result<()> {
        self.churn()?;
        self.toggle_frozen()?;
        self.movement()?;

        self.frame += 1;
        if self.frame % self.config.collect_every.max(1) == 0 {
            self.world.collect_garbage();
            let storage = self.world.storage();
            for handle in &mut self.live {
                *handle = storage.refresh(*handle)?;
            }
        }
        Ok(())
    }

    fn spawn(&mut self) -> Result<Handle> {
        let rng = &mut self.rng;
        let position = Position {
            x: rng.gen_range(-100.0..100.0),
            y: rng.gen_range(-100.0..100.0),
            z: rng.gen_range(-100.0..100.0),
        };
        let velocity = Velocity {
            x: rng.gen_range(-10.0..10.0),
            y: rng.gen_range(-10.0..10.0),
            z: rng.gen_range(-10.0..10.0),
        };
        let with_health = rng.gen_bool(0.5);
        let with_color = rng.gen_bool(0.25);

        let handle = self.world.create()?;
        let storage = self.world.storage_mut();
        storage.add(handle, position)?;
        storage.add(handle, velocity)?;
        storage.add(handle, Name(format!("entity {}", handle.id().get())))?;
        if with_health {
            storage.add(
                handle,
                Health {
                    current: 100.0,
                    max: 100.0,
                },
            )?;
        }
        if with_color {
            storage.add(
                handle,
                Color {
                    r: 1.0,
                    g: 0.5,
                    b: 0.25,
                    a: 1.0,
                },
            )?;
        }
        Ok(handle)
    }

    /// Destroy a random slice of the population and spawn replacements.
    fn churn(&mut self) -> Result<()> {
        let count = (self.live.len() as f32 * self.config.churn_rate) as usize;
        for _ in 0..count {
            if self.live.is_empty() {
                break;
            }
            let index = self.rng.gen_range(0..self.live.len());
            let handle = self.live.swap_remove(index);
            self.world.destroy(handle)?;
        }
        for _ in 0..count {
            let handle = self.spawn()?;
            self.live.push(handle);
        }
        Ok(())
    }

    /// Flip the `Frozen` marker on a few entities.
    fn toggle_frozen(&mut self) -> Result<()> {
        let count = (self.live.len() / 100).max(1).min(self.live.len());
        for _ in 0..count {
            let handle = self.live[self.rng.gen_range(0..self.live.len())];
            let storage = self.world.storage_mut();
            if storage.get::<Frozen>(handle)?.is_some() {
                storage.remove::<Frozen>(handle)?;
            } else {
                storage.add(handle, Frozen)?;
            }
        }
        Ok(())
    }

    /// Integrate positions for every entity that isn't frozen.
    pub fn movement(&mut self) -> Result<()> {
        let moving: Vec<Handle> = self
            .world
            .entities_with::<(Position, Velocity)>()?
            .iter()
            .collect();
        let storage = self.world.storage_mut();
        for handle in moving {
            if storage.get::<Frozen>(handle)?.is_some() {
                continue;
            }
            let Some(velocity) = storage.get::<Velocity>(handle)?.copied() else {
                continue;
            };
            if let Some(position) = storage.get_mut::<Position>(handle)? {
                position.x += velocity.x;
                position.y += velocity.y;
                position.z += velocity.z;
            }
        }
        Ok(())
    }
}
