//! # twinkle-tree
//!
//! A Christmas tree made of about twelve thousand faceted particles, with a
//! hollow star on top, rendered in real time with bloom and a vignette.
//! Every click flips the whole thing between the finished tree and a
//! drifting cloud; particles glide between the two shapes instead of
//! snapping.
//!
//! ## Quick Start
//!
//! ```ignore
//! fn main() -> Result<(), twinkle_tree::AppError> {
//!     twinkle_tree::run()
//! }
//! ```
//!
//! ## How a frame works
//!
//! Generation happens once: every particle gets an assembled and a scattered
//! position, a scale, a rotation and a color ([`tree`], [`star`],
//! [`sparkles`]). Those tables never change. Each frame then
//!
//! 1. reads the current [`Formation`] from the pointer handler ([`input`]),
//! 2. moves every particle's current position a fixed fraction toward the
//!    target of that formation ([`interpolate`]),
//! 3. adds sway, spin and color effects and writes one model matrix plus
//!    tint per particle into an [`InstanceBatch`] ([`instances`]),
//! 4. uploads dirty batches and draws them instanced ([`gpu`]).
//!
//! Scene-level parameters such as the camera, lights and post-processing
//! live in one table, [`SceneConfig`].
//!
//! ## Logging
//!
//! The crate logs through the `log` facade. The binary installs
//! `env_logger` with an `info` default; set `RUST_LOG=debug` for adapter
//! details, batch registration and periodic FPS.

mod app;
pub mod config;
pub mod error;
pub mod gpu;
pub mod input;
pub mod instances;
pub mod interpolate;
pub mod mesh;
pub mod particle;
pub mod scene;
pub mod sparkles;
pub mod spawn;
pub mod star;
pub mod time;
pub mod tree;
pub mod visuals;
pub mod world;

pub use app::{run, App};
pub use config::{Color, TreeCounts};
pub use error::{AppError, GpuError};
pub use glam::{Mat4, Vec2, Vec3};
pub use instances::{InstanceBatch, InstanceRaw};
pub use particle::{Formation, Morph, Particle, ParticleKind, ParticleTable};
pub use scene::SceneConfig;
pub use spawn::SpawnContext;
pub use world::World;

/// Convenient re-exports for driving the scene by hand.
pub mod prelude {
    pub use crate::config::{Color, TreeCounts};
    pub use crate::input::{Interaction, PointerAction};
    pub use crate::instances::InstanceBatch;
    pub use crate::particle::{Formation, Morph, Particle, ParticleKind, ParticleTable};
    pub use crate::scene::SceneConfig;
    pub use crate::sparkles::{SparkleConfig, SparkleField};
    pub use crate::spawn::SpawnContext;
    pub use crate::star::StarOutline;
    pub use crate::time::FrameClock;
    pub use crate::tree::TreeParticles;
    pub use crate::world::World;
    pub use crate::{Mat4, Vec2, Vec3};
}
