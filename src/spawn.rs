//! Spawn context for particle generation.
//!
//! Wraps a random source with the sampling shapes the generators need:
//! cone volumes, a jittered helix, scatter cubes and random rotations.
//! Every helper is written as `min + U * width` on a single uniform draw
//! so the distributions match their formulas exactly.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConeSampling, HelixSampling, ScaleRange};

/// Random source plus sampling helpers.
///
/// ```ignore
/// let mut ctx = SpawnContext::seeded(7);
/// let p = ctx.in_cone(&LEAF_CONE);
/// let cloud = ctx.in_cube(SCATTER_CENTER, 10.0);
/// ```
pub struct SpawnContext<R> {
    rng: R,
}

impl SpawnContext<SmallRng> {
    /// Context seeded from the clock: a different tree every run.
    pub fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        log::debug!("spawn seed {seed}");
        Self::seeded(seed)
    }

    /// Reproducible context.
    pub fn seeded(seed: u64) -> Self {
        Self::new(SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SpawnContext<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// `min + U * (max - min)`.
    #[inline]
    pub fn random_between(&mut self, min: f32, max: f32) -> f32 {
        min + self.random() * (max - min)
    }

    /// Uniform in `[-width/2, width/2)`.
    #[inline]
    pub fn centered(&mut self, width: f32) -> f32 {
        (self.random() - 0.5) * width
    }

    /// Sample from a size range.
    #[inline]
    pub fn scale(&mut self, range: &ScaleRange) -> f32 {
        range.min + self.random() * range.spread
    }

    // ========== Shapes ==========

    /// Random point in a cube of `half_extent` around `center`.
    pub fn in_cube(&mut self, center: Vec3, half_extent: f32) -> Vec3 {
        let width = half_extent * 2.0;
        center + Vec3::new(self.centered(width), self.centered(width), self.centered(width))
    }

    /// Random Euler angles, each in `[0, π)`.
    pub fn euler_angles(&mut self) -> Vec3 {
        Vec3::new(self.random() * PI, self.random() * PI, self.random() * PI)
    }

    /// Random point inside the tree cone.
    ///
    /// Height is `U^exponent * max_height`, radius is the cone radius at
    /// that height times a jitter in `[jitter_min, 1)`.
    pub fn in_cone(&mut self, cone: &ConeSampling) -> Vec3 {
        let height = self.random().powf(cone.height_exponent) * cone.max_height;
        let radius = cone.radius_at(height) * self.random_between(cone.jitter_min, 1.0);
        let angle = self.random() * TAU;
        Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
    }

    /// Jittered point at progress `t` along the helix.
    pub fn on_helix(&mut self, helix: &HelixSampling, t: f32) -> Vec3 {
        helix_point(helix, t)
            + Vec3::new(
                self.centered(helix.jitter),
                self.centered(helix.jitter),
                self.centered(helix.jitter),
            )
    }
}

/// Exact helix point at progress `t` in `[0, 1]`, without jitter.
pub fn helix_point(helix: &HelixSampling, t: f32) -> Vec3 {
    let height = t * helix.height;
    let radius = (1.0 - height / helix.span) * helix.base_radius + helix.min_radius;
    let angle = t * TAU * helix.turns;
    Vec3::new(angle.cos() * radius, height, angle.sin() * radius)
}
