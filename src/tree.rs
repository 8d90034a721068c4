//! The tree particle group: generation and per-frame update.
//!
//! ```
//! use twinkle_tree::prelude::*;
//!
//! let mut ctx = SpawnContext::seeded(7);
//! let mut tree = TreeParticles::generate(&TreeCounts::DEFAULT, &mut ctx);
//!
//! // Once per frame:
//! tree.update(0.0, Formation::Assembled, Mat4::IDENTITY);
//! for kind in ParticleKind::ALL {
//!     let batch = tree.batch_mut(kind);
//!     assert!(batch.take_dirty().is_some());
//! }
//! ```

use glam::{Mat4, Vec3};
use rand::Rng;

use crate::config::{
    palette, ConeSampling, ScaleRange, ScatterCloud, TreeCounts, HEART_CONE, HEART_SCALE,
    HEART_SCATTER, LEAF_CONE, LEAF_SCALE, LEAF_SCATTER, ORNAMENT_CONE, ORNAMENT_SCALE,
    ORNAMENT_SCATTER, RIBBON_HELIX, RIBBON_SCALE, RIBBON_SCATTER, SCATTER_CENTER,
    TREE_SMOOTHING,
};
use crate::instances::{compose, InstanceBatch};
use crate::interpolate::{ribbon_color, spin, RenderState, Sway};
use crate::particle::{Formation, Particle, ParticleKind, ParticleTable};
use crate::spawn::SpawnContext;

/// Foliage color from skewed bucket thresholds on one uniform draw.
pub fn leaf_color(roll: f32) -> Vec3 {
    let color = if roll > 0.65 {
        palette::HOT_PINK
    } else if roll > 0.3 {
        palette::SAKURA
    } else if roll > 0.1 {
        palette::PINK
    } else {
        palette::ROSE
    };
    color.linear()
}

/// Heart color by index: every 3rd hot pink, every 5th deep pink (wins).
pub fn heart_color(index: u32) -> Vec3 {
    let mut color = palette::SAKURA;
    if index % 3 == 0 {
        color = palette::HOT_PINK;
    }
    if index % 5 == 0 {
        color = palette::DEEP_PINK;
    }
    color.linear()
}

/// Ornament kind alternates by index parity.
pub fn ornament_kind(index: u32) -> ParticleKind {
    if index % 2 == 0 {
        ParticleKind::Cube
    } else {
        ParticleKind::Icosahedron
    }
}

/// Ornament color: every 3rd white, the rest blush.
pub fn ornament_color(index: u32) -> Vec3 {
    if index % 3 == 0 {
        palette::WHITE.linear()
    } else {
        palette::BLUSH.linear()
    }
}

struct Builder<'a, R> {
    ctx: &'a mut SpawnContext<R>,
    items: Vec<Particle>,
}

impl<R: Rng> Builder<'_, R> {
    fn push(
        &mut self,
        kind: ParticleKind,
        assembled: Vec3,
        cloud: ScatterCloud,
        scale: ScaleRange,
        color: Vec3,
        phase: Option<f32>,
    ) {
        let id = self.items.len() as u32;
        let scattered = self.ctx.in_cube(SCATTER_CENTER, cloud.half_extent);
        let rotation = self.ctx.euler_angles();
        let scale = self.ctx.scale(&scale);
        self.items.push(Particle {
            id,
            assembled,
            scattered,
            rotation,
            scale,
            kind,
            color,
            phase,
        });
    }

    fn cone(&mut self, cone: &ConeSampling) -> Vec3 {
        self.ctx.in_cone(cone)
    }
}

/// Generate every tree particle, grouped by kind in insertion order:
/// leaves, hearts, ornaments, ribbon. Ids run from zero without gaps.
pub fn generate_tree<R: Rng>(counts: &TreeCounts, ctx: &mut SpawnContext<R>) -> ParticleTable {
    let mut b = Builder {
        ctx,
        items: Vec::with_capacity(counts.total() as usize),
    };

    for _ in 0..counts.leaves {
        let pos = b.cone(&LEAF_CONE);
        let color = leaf_color(b.ctx.random());
        b.push(ParticleKind::Leaf, pos, LEAF_SCATTER, LEAF_SCALE, color, None);
    }

    for i in 0..counts.hearts {
        let pos = b.cone(&HEART_CONE);
        b.push(ParticleKind::Heart, pos, HEART_SCATTER, HEART_SCALE, heart_color(i), None);
    }

    for i in 0..counts.ornaments {
        let pos = b.cone(&ORNAMENT_CONE);
        b.push(
            ornament_kind(i),
            pos,
            ORNAMENT_SCATTER,
            ORNAMENT_SCALE,
            ornament_color(i),
            None,
        );
    }

    let white = palette::WHITE.linear();
    for i in 0..counts.ribbon {
        let t = i as f32 / counts.ribbon as f32;
        let pos = b.ctx.on_helix(&RIBBON_HELIX, t);
        b.push(ParticleKind::Ribbon, pos, RIBBON_SCATTER, RIBBON_SCALE, white, Some(t));
    }

    let table = ParticleTable::new(b.items);
    log::info!(
        "generated {} tree particles ({} leaves, {} hearts, {} ornaments, {} ribbon)",
        table.len(),
        counts.leaves,
        counts.hearts,
        counts.ornaments,
        counts.ribbon
    );
    table
}

/// The animated tree: immutable particles, current positions and one
/// instance batch per kind.
pub struct TreeParticles {
    table: ParticleTable,
    state: RenderState,
    batches: Vec<InstanceBatch>,
}

impl TreeParticles {
    /// Build the group around a generated table.
    ///
    /// # Panics
    ///
    /// Panics if `counts` does not describe the table exactly; batch sizes
    /// come from `counts` and must match what was generated.
    pub fn new(table: ParticleTable, counts: &TreeCounts) -> Self {
        let batches = ParticleKind::ALL
            .iter()
            .map(|&kind| {
                let capacity = counts.capacity(kind);
                assert_eq!(
                    table.count(kind),
                    capacity,
                    "{} count does not match its batch capacity",
                    kind.label()
                );
                InstanceBatch::new(kind.label(), capacity)
            })
            .collect();
        let state = RenderState::assembled(table.particles());

        Self {
            table,
            state,
            batches,
        }
    }

    /// Generate with `counts` and wrap in one go.
    pub fn generate<R: Rng>(counts: &TreeCounts, ctx: &mut SpawnContext<R>) -> Self {
        Self::new(generate_tree(counts, ctx), counts)
    }

    /// Advance one frame and refill every batch.
    ///
    /// `parent` places the tree group in the world.
    pub fn update(&mut self, time: f32, formation: Formation, parent: Mat4) {
        self.state.step(
            self.table.particles(),
            formation,
            TREE_SMOOTHING.factor(formation),
        );

        for batch in &mut self.batches {
            batch.begin();
        }

        for (p, &current) in self.table.iter().zip(self.state.positions()) {
            let mut position = current;
            if p.kind.sways(formation) {
                position += Sway::TREE.offset(time, p.id as f32);
            }
            let rotation = spin(p.rotation, time, p.kind.spin_rate());
            // Other kinds take their color from the batch material.
            let color = match p.phase {
                Some(phase) => ribbon_color(phase, time, formation),
                None => Vec3::ONE,
            };
            let model = parent * compose(position, rotation, p.scale);
            self.batches[p.kind.index()].push(model, color);
        }

        for batch in &mut self.batches {
            batch.finish();
        }
    }

    #[inline]
    pub fn table(&self) -> &ParticleTable {
        &self.table
    }

    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn batch(&self, kind: ParticleKind) -> &InstanceBatch {
        &self.batches[kind.index()]
    }

    pub fn batch_mut(&mut self, kind: ParticleKind) -> &mut InstanceBatch {
        &mut self.batches[kind.index()]
    }
}
