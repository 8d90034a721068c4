//! The hollow star on the tree tip.
//!
//! Specks sit on the outline of a five-point star and follow the same
//! generate / smooth / write cycle as the tree. On top of that the whole
//! group drifts between the tree tip and a floating center, spins, breathes
//! and carries a flickering point light.

use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3};
use rand::Rng;

use crate::config::{star, STAR_GROUP_SMOOTHING, STAR_SMOOTHING};
use crate::instances::{compose, InstanceBatch};
use crate::interpolate::{smooth_toward, RenderState, Sway};
use crate::particle::{Formation, Morph};
use crate::spawn::SpawnContext;

/// One speck of the star outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarParticle {
    pub assembled: Vec3,
    pub scattered: Vec3,
    pub scale: f32,
    /// Shimmer and spin rate.
    pub speed: f32,
}

impl Morph for StarParticle {
    #[inline]
    fn assembled(&self) -> Vec3 {
        self.assembled
    }

    #[inline]
    fn scattered(&self) -> Vec3 {
        self.scattered
    }
}

/// Vertices of a star polygon, outer and inner alternating, first on top.
pub fn star_vertices(points: usize, outer: f32, inner: f32) -> Vec<Vec2> {
    (0..points * 2)
        .map(|i| {
            let angle = i as f32 * PI / points as f32 + PI / 2.0;
            let r = if i % 2 == 0 { outer } else { inner };
            Vec2::new(angle.cos() * r, angle.sin() * r)
        })
        .collect()
}

/// Specks evenly spaced along each edge; `count % edges` is dropped.
pub fn generate_star<R: Rng>(count: u32, ctx: &mut SpawnContext<R>) -> Vec<StarParticle> {
    let vertices = star_vertices(star::POINTS, star::OUTER_RADIUS, star::INNER_RADIUS);
    let edges = vertices.len();
    let per_edge = count as usize / edges;

    let mut specks = Vec::with_capacity(per_edge * edges);
    for edge in 0..edges {
        let a = vertices[edge];
        let b = vertices[(edge + 1) % edges];
        for p in 0..per_edge {
            let t = p as f32 / per_edge as f32;
            let on_edge = a.lerp(b, t);
            let assembled = Vec3::new(
                on_edge.x + ctx.centered(star::EDGE_JITTER),
                on_edge.y + ctx.centered(star::EDGE_JITTER),
                ctx.centered(star::THICKNESS),
            );
            specks.push(StarParticle {
                assembled,
                scattered: ctx.in_cube(Vec3::ZERO, star::SCATTER_HALF_EXTENT),
                scale: ctx.scale(&star::SCALE),
                speed: ctx.scale(&star::SPEED),
            });
        }
    }
    specks
}

/// Breathing scale pulse; held at 1.0 while scattered.
#[inline]
pub fn pulse(time: f32, formation: Formation) -> f32 {
    match formation {
        Formation::Assembled => 0.97 + (time * 2.5).sin() * 0.03,
        Formation::Scattered => 1.0,
    }
}

/// Intensity of the star's point light.
#[inline]
pub fn light_intensity(time: f32, formation: Formation) -> f32 {
    match formation {
        Formation::Assembled => 120.0 + (time * 5.0).sin() * 50.0,
        Formation::Scattered => 15.0,
    }
}

/// Spin of the whole group about Y.
#[inline]
pub fn group_spin(time: f32, formation: Formation) -> f32 {
    match formation {
        Formation::Assembled => time * 0.7,
        Formation::Scattered => time * 0.2,
    }
}

/// The star group.
pub struct StarOutline {
    specks: Vec<StarParticle>,
    state: RenderState,
    batch: InstanceBatch,
    /// Group position in tree-group space.
    position: Vec3,
    transform: Mat4,
    light: f32,
}

impl StarOutline {
    /// Wrap generated specks. Each speck starts at its assembled position,
    /// edge jitter included.
    pub fn new(specks: Vec<StarParticle>) -> Self {
        let state = RenderState::assembled(&specks);
        let batch = InstanceBatch::new("Star", specks.len() as u32);
        Self {
            specks,
            state,
            batch,
            position: star::ANCHOR,
            transform: Mat4::from_translation(star::ANCHOR),
            light: light_intensity(0.0, Formation::Assembled),
        }
    }

    /// Generate `count` specks and wrap them.
    pub fn generate<R: Rng>(count: u32, ctx: &mut SpawnContext<R>) -> Self {
        let specks = generate_star(count, ctx);
        log::info!("generated {} star specks", specks.len());
        Self::new(specks)
    }

    /// Advance one frame. `parent` is the tree group's world transform.
    pub fn update(&mut self, time: f32, formation: Formation, parent: Mat4) {
        let home = match formation {
            Formation::Assembled => star::ANCHOR,
            Formation::Scattered => star::SCATTERED_CENTER,
        };
        self.position = smooth_toward(self.position, home, STAR_GROUP_SMOOTHING);
        self.transform = parent
            * Mat4::from_translation(self.position)
            * Mat4::from_rotation_y(group_spin(time, formation));

        self.state
            .step(&self.specks, formation, STAR_SMOOTHING.factor(formation));

        let breath = pulse(time, formation);
        self.batch.begin();
        for (i, (s, &current)) in self.specks.iter().zip(self.state.positions()).enumerate() {
            let phase = i as f32;
            let sway = match formation {
                Formation::Assembled => Sway::star_shimmer(s.speed),
                Formation::Scattered => Sway::STAR_SCATTERED,
            };
            let position = current + sway.offset(time, phase);
            let rotation = Vec3::new(time * s.speed, time * 0.4, phase);
            let model = self.transform * compose(position, rotation, s.scale * breath);
            self.batch.push(model, Vec3::ONE);
        }
        self.batch.finish();

        self.light = light_intensity(time, formation);
    }

    /// Group position in tree-group space.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// World position of the attached light.
    #[inline]
    pub fn light_position(&self) -> Vec3 {
        self.transform.w_axis.truncate()
    }

    /// World transform of the group, for anything riding along with it.
    #[inline]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    #[inline]
    pub fn light_intensity(&self) -> f32 {
        self.light
    }

    /// Current speck positions in star-group space.
    #[inline]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    #[inline]
    pub fn specks(&self) -> &[StarParticle] {
        &self.specks
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
