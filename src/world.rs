//! Everything that animates, without the window or the GPU.

use glam::Mat4;
use rand::Rng;

use crate::config::{star, TreeCounts};
use crate::particle::Formation;
use crate::scene::{star_light, Light, SceneConfig, MAX_LIGHTS};
use crate::sparkles::{SparkleConfig, SparkleField};
use crate::spawn::SpawnContext;
use crate::star::StarOutline;
use crate::tree::TreeParticles;

/// The tree, its star and both sparkle fields.
pub struct World {
    tree: TreeParticles,
    star: StarOutline,
    dust: SparkleField,
    star_core: SparkleField,
}

impl World {
    pub fn generate<R: Rng>(counts: &TreeCounts, ctx: &mut SpawnContext<R>) -> Self {
        Self {
            tree: TreeParticles::generate(counts, ctx),
            star: StarOutline::generate(star::PARTICLE_COUNT, ctx),
            dust: SparkleField::generate("Dust", SparkleConfig::SCENE, ctx),
            star_core: SparkleField::generate("Star Core", SparkleConfig::STAR_CORE, ctx),
        }
    }

    /// The star core only shows on the finished tree.
    #[inline]
    pub fn star_core_visible(formation: Formation) -> bool {
        !formation.is_scattered()
    }

    /// Advance every group by one frame.
    pub fn update(&mut self, time: f32, formation: Formation, scene: &SceneConfig) {
        let tree_transform = scene.tree_transform(time);
        self.tree.update(time, formation, tree_transform);
        self.star.update(time, formation, tree_transform);
        self.dust.update(time, Mat4::IDENTITY);
        if Self::star_core_visible(formation) {
            self.star_core.update(time, self.star.transform());
        }
    }

    /// World-space lights for this frame, the star's last.
    pub fn lights(&self, time: f32, scene: &SceneConfig) -> [Light; MAX_LIGHTS] {
        let star = star_light(self.star.light_position(), self.star.light_intensity());
        scene.lights.lights(time, star)
    }

    #[inline]
    pub fn tree(&self) -> &TreeParticles {
        &self.tree
    }

    #[inline]
    pub fn tree_mut(&mut self) -> &mut TreeParticles {
        &mut self.tree
    }

    #[inline]
    pub fn star(&self) -> &StarOutline {
        &self.star
    }

    #[inline]
    pub fn star_mut(&mut self) -> &mut StarOutline {
        &mut self.star
    }

    #[inline]
    pub fn dust(&self) -> &SparkleField {
        &self.dust
    }

    #[inline]
    pub fn dust_mut(&mut self) -> &mut SparkleField {
        &mut self.dust
    }

    #[inline]
    pub fn star_core(&self) -> &SparkleField {
        &self.star_core
    }

    #[inline]
    pub fn star_core_mut(&mut self) -> &mut SparkleField {
        &mut self.star_core
    }
}
