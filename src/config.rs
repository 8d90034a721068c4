//! Compiled-in tunables for particle generation and animation.
//!
//! There is no runtime configuration surface: counts, radii, speeds and
//! palettes live here as constants. Scene-level parameters (camera, lights,
//! post-processing) live in [`crate::scene::SceneConfig`].

use glam::Vec3;

use crate::particle::ParticleKind;

/// An sRGB color written as a `0xRRGGBB` literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    /// Channels in sRGB space, each 0.0-1.0.
    pub fn srgb(self) -> Vec3 {
        let r = (self.0 >> 16) & 0xFF;
        let g = (self.0 >> 8) & 0xFF;
        let b = self.0 & 0xFF;
        Vec3::new(r as f32, g as f32, b as f32) / 255.0
    }

    /// Channels converted to linear space for lighting.
    pub fn linear(self) -> Vec3 {
        let c = self.srgb();
        Vec3::new(srgb_to_linear(c.x), srgb_to_linear(c.y), srgb_to_linear(c.z))
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Named palette entries.
pub mod palette {
    use super::Color;

    pub const HOT_PINK: Color = Color(0xFF69B4);
    pub const SAKURA: Color = Color(0xFFB7C5);
    pub const PINK: Color = Color(0xFFC0CB);
    pub const ROSE: Color = Color(0xF48FB1);
    pub const DEEP_PINK: Color = Color(0xFF1493);
    pub const BLUSH: Color = Color(0xF8C8DC);
    pub const MAUVE: Color = Color(0xE0B0FF);
    pub const WHITE: Color = Color(0xFFFFFF);
    pub const GOLD: Color = Color(0xFFD700);
    pub const PEACH: Color = Color(0xFFE5B4);
    pub const NIGHT: Color = Color(0x050103);
}

/// Number of particles of each tree category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeCounts {
    pub leaves: u32,
    pub hearts: u32,
    /// Cubes and icosahedra together; they alternate by index.
    pub ornaments: u32,
    pub ribbon: u32,
}

impl TreeCounts {
    pub const DEFAULT: TreeCounts = TreeCounts {
        leaves: 5000,
        hearts: 4500,
        ornaments: 160,
        ribbon: 2500,
    };

    /// Instance capacity of the batch that holds `kind`.
    pub fn capacity(&self, kind: ParticleKind) -> u32 {
        match kind {
            ParticleKind::Leaf => self.leaves,
            ParticleKind::Heart => self.hearts,
            // Even ornament indices are cubes.
            ParticleKind::Cube => self.ornaments.div_ceil(2),
            ParticleKind::Icosahedron => self.ornaments / 2,
            ParticleKind::Ribbon => self.ribbon,
        }
    }

    /// Total particles across all categories.
    pub fn total(&self) -> u32 {
        self.leaves + self.hearts + self.ornaments + self.ribbon
    }
}

impl Default for TreeCounts {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sampling of a point inside the tree cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeSampling {
    /// `h = U^exponent * max_height`; values above 1 crowd samples low.
    pub height_exponent: f32,
    pub max_height: f32,
    /// Height at which the cone radius reaches zero.
    pub span: f32,
    pub base_radius: f32,
    /// Lower bound of the multiplicative radius jitter (upper bound is 1).
    pub jitter_min: f32,
}

impl ConeSampling {
    /// Cone radius at height `h` before jitter.
    pub fn radius_at(&self, h: f32) -> f32 {
        (1.0 - h / self.span) * self.base_radius
    }
}

/// Three-turn spiral the ribbon follows from base to tip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelixSampling {
    pub turns: f32,
    pub height: f32,
    pub span: f32,
    pub base_radius: f32,
    pub min_radius: f32,
    /// Full width of the uniform jitter on each axis.
    pub jitter: f32,
}

/// Uniform size range: `min + U * spread`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRange {
    pub min: f32,
    pub spread: f32,
}

/// Half-extent of each kind's explosion cloud, around `SCATTER_CENTER`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterCloud {
    pub half_extent: f32,
}

pub const SCATTER_CENTER: Vec3 = Vec3::new(0.0, 4.0, 0.0);

pub const LEAF_CONE: ConeSampling = ConeSampling {
    height_exponent: 1.4,
    max_height: 9.2,
    span: 9.6,
    base_radius: 3.5,
    jitter_min: 0.8,
};

pub const HEART_CONE: ConeSampling = ConeSampling {
    height_exponent: 1.4,
    max_height: 8.5,
    span: 9.6,
    base_radius: 3.3,
    jitter_min: 0.7,
};

pub const ORNAMENT_CONE: ConeSampling = ConeSampling {
    height_exponent: 1.0,
    max_height: 8.8,
    span: 9.6,
    base_radius: 3.2,
    jitter_min: 0.5,
};

pub const RIBBON_HELIX: HelixSampling = HelixSampling {
    turns: 3.0,
    height: 9.4,
    span: 10.5,
    base_radius: 4.2,
    min_radius: 0.6,
    jitter: 0.12,
};

pub const LEAF_SCALE: ScaleRange = ScaleRange { min: 0.017, spread: 0.022 };
pub const HEART_SCALE: ScaleRange = ScaleRange { min: 0.03, spread: 0.04 };
pub const ORNAMENT_SCALE: ScaleRange = ScaleRange { min: 0.04, spread: 0.035 };
pub const RIBBON_SCALE: ScaleRange = ScaleRange { min: 0.005, spread: 0.008 };

pub const LEAF_SCATTER: ScatterCloud = ScatterCloud { half_extent: 10.0 };
pub const HEART_SCATTER: ScatterCloud = ScatterCloud { half_extent: 11.0 };
pub const ORNAMENT_SCATTER: ScatterCloud = ScatterCloud { half_extent: 12.5 };
pub const RIBBON_SCATTER: ScatterCloud = ScatterCloud { half_extent: 15.0 };

/// Per-frame smoothing factors, one per formation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingRates {
    pub assembled: f32,
    pub scattered: f32,
}

pub const TREE_SMOOTHING: SmoothingRates = SmoothingRates {
    assembled: 0.07,
    scattered: 0.04,
};

pub const STAR_SMOOTHING: SmoothingRates = SmoothingRates {
    assembled: 0.06,
    scattered: 0.03,
};

/// Smoothing factor of the whole star group's position.
pub const STAR_GROUP_SMOOTHING: f32 = 0.05;

/// Star outline geometry and particle ranges.
pub mod star {
    use super::ScaleRange;
    use glam::Vec3;

    pub const PARTICLE_COUNT: u32 = 2000;
    pub const POINTS: usize = 5;
    pub const OUTER_RADIUS: f32 = 0.55;
    pub const INNER_RADIUS: f32 = 0.22;
    pub const THICKNESS: f32 = 0.05;
    pub const EDGE_JITTER: f32 = 0.02;
    pub const SCATTER_HALF_EXTENT: f32 = 7.0;
    pub const SCALE: ScaleRange = ScaleRange { min: 0.0015, spread: 0.005 };
    pub const SPEED: ScaleRange = ScaleRange { min: 0.4, spread: 1.2 };
    /// Anchor at the tree tip, in tree-group space.
    pub const ANCHOR: Vec3 = Vec3::new(0.0, 9.8, 0.0);
    /// Where the star floats while the tree is scattered.
    pub const SCATTERED_CENTER: Vec3 = Vec3::new(0.0, 10.0, 0.0);
    pub const LIGHT_DISTANCE: f32 = 7.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_srgb_channels() {
        let c = palette::HOT_PINK.srgb();
        assert!((c.x - 1.0).abs() < 1e-6);
        assert!((c.y - 105.0 / 255.0).abs() < 1e-6);
        assert!((c.z - 180.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_color_linear_is_darker_in_midtones() {
        let srgb = palette::SAKURA.srgb();
        let linear = palette::SAKURA.linear();
        assert!((linear.x - 1.0).abs() < 1e-5);
        assert!(linear.y < srgb.y);
        assert!(linear.z < srgb.z);
        assert_eq!(palette::WHITE.linear(), Vec3::ONE);
    }

    #[test]
    fn test_ornament_capacity_split() {
        let counts = TreeCounts::DEFAULT;
        assert_eq!(counts.capacity(ParticleKind::Cube), 80);
        assert_eq!(counts.capacity(ParticleKind::Icosahedron), 80);

        let odd = TreeCounts { ornaments: 7, ..counts };
        assert_eq!(odd.capacity(ParticleKind::Cube), 4);
        assert_eq!(odd.capacity(ParticleKind::Icosahedron), 3);
    }

    #[test]
    fn test_capacities_sum_to_total() {
        let counts = TreeCounts::DEFAULT;
        let sum: u32 = ParticleKind::ALL.iter().map(|k| counts.capacity(*k)).sum();
        assert_eq!(sum, counts.total());
        assert_eq!(counts.total(), 12_160);
    }

    #[test]
    fn test_cone_radius_shrinks_with_height() {
        assert!((LEAF_CONE.radius_at(0.0) - 3.5).abs() < 1e-6);
        assert!(LEAF_CONE.radius_at(9.2) > 0.0);
        assert!(LEAF_CONE.radius_at(9.6).abs() < 1e-6);
    }
}
