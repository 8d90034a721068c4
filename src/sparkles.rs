//! Ambient sparkle motes.
//!
//! Cheap atmosphere around the tree and in the star's core. Motes never
//! change formation; they wobble around a fixed base point.

use glam::{Mat4, Vec3};
use rand::Rng;

use crate::config::{palette, Color};
use crate::instances::{compose, InstanceBatch};
use crate::spawn::SpawnContext;

/// Parameters of one sparkle field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparkleConfig {
    pub count: u32,
    /// Edge length of the cube the motes are spread over.
    pub scale: f32,
    /// Mote size; the rendered scale is `size * MOTE_UNIT` times a random factor.
    pub size: f32,
    pub speed: f32,
    pub opacity: f32,
    pub color: Color,
}

/// World size of one unit of [`SparkleConfig::size`].
pub const MOTE_UNIT: f32 = 0.008;

/// How far a mote strays from its base point.
const WOBBLE: f32 = 0.2;

impl SparkleConfig {
    /// Dust drifting around the whole scene.
    pub const SCENE: SparkleConfig = SparkleConfig {
        count: 200,
        scale: 20.0,
        size: 2.0,
        speed: 0.4,
        opacity: 0.3,
        color: palette::SAKURA,
    };

    /// Glow in the star's core, shown only while assembled.
    pub const STAR_CORE: SparkleConfig = SparkleConfig {
        count: 30,
        scale: 0.8,
        size: 2.0,
        speed: 0.6,
        opacity: 1.0,
        color: palette::GOLD,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Mote {
    base: Vec3,
    noise: f32,
    size: f32,
}

impl Mote {
    /// Offset from the base point at scaled time `t`.
    fn wobble(&self, t: f32) -> Vec3 {
        let k = WOBBLE * self.noise;
        Vec3::new(
            (t + self.base.y * 100.0).cos() * k,
            (t + self.base.x * 100.0).sin() * k,
            (t + self.base.z * 100.0).cos() * k,
        )
    }
}

/// A field of motes with its own instance batch.
pub struct SparkleField {
    config: SparkleConfig,
    motes: Vec<Mote>,
    batch: InstanceBatch,
    color: Vec3,
}

impl SparkleField {
    pub fn generate<R: Rng>(label: &'static str, config: SparkleConfig, ctx: &mut SpawnContext<R>) -> Self {
        let motes = (0..config.count)
            .map(|_| Mote {
                base: ctx.in_cube(Vec3::ZERO, config.scale / 2.0),
                noise: ctx.random(),
                size: config.size * MOTE_UNIT * ctx.random_between(0.5, 1.0),
            })
            .collect();

        Self {
            config,
            motes,
            batch: InstanceBatch::new(label, config.count),
            color: config.color.linear(),
        }
    }

    /// Refill the batch for this frame. `parent` places the field.
    pub fn update(&mut self, time: f32, parent: Mat4) {
        let t = time * self.config.speed;
        self.batch.begin();
        for mote in &self.motes {
            let position = mote.base + mote.wobble(t);
            let model = parent * compose(position, Vec3::ZERO, mote.size);
            self.batch.push(model, self.color);
        }
        self.batch.finish();
    }

    #[inline]
    pub fn config(&self) -> &SparkleConfig {
        &self.config
    }

    #[inline]
    pub fn batch(&self) -> &InstanceBatch {
        &self.batch
    }

    #[inline]
    pub fn batch_mut(&mut self) -> &mut InstanceBatch {
        &mut self.batch
    }
}
