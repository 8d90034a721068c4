//! Surface materials for the instanced batches.
//!
//! A [`Material`] is the per-batch half of shading; the per-instance half is
//! the tint stored in each [`InstanceRaw`](crate::instances::InstanceRaw).
//! Albedo is `base_color * tint` and emissive is `emissive * intensity`.
//! Only the ribbon writes a tint other than white, so its wave brightens the
//! diffuse color while the glow stays flat.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::config::{palette, Color};
use crate::sparkles::SparkleConfig;

/// How a batch's fragments combine with what is already drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Depth-tested and depth-written, no blending.
    #[default]
    Opaque,

    /// Standard alpha blending; depth-tested but not written.
    Alpha,

    /// Colors add up, so overlapping motes glow brighter.
    Additive,
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [BlendMode::Opaque, BlendMode::Alpha, BlendMode::Additive];

    /// Whether the batch writes depth.
    #[inline]
    pub fn writes_depth(self) -> bool {
        matches!(self, BlendMode::Opaque)
    }

    /// Blended batches draw after all opaque ones.
    #[inline]
    pub fn is_transparent(self) -> bool {
        !self.writes_depth()
    }

    /// Glowing additive motes leave no contact shadow.
    #[inline]
    pub fn casts_shadow(self) -> bool {
        !matches!(self, BlendMode::Additive)
    }
}

/// Physically-inspired surface description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Linear base color.
    pub base_color: Vec3,
    pub opacity: f32,
    /// Linear emissive color.
    pub emissive: Vec3,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    /// Skip lighting and output the albedo as is.
    pub unlit: bool,
    pub blend: BlendMode,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: Vec3::ONE,
            opacity: 1.0,
            emissive: Vec3::ZERO,
            emissive_intensity: 1.0,
            metalness: 0.0,
            roughness: 1.0,
            unlit: false,
            blend: BlendMode::Opaque,
        }
    }
}

impl Material {
    /// Faceted gem look for leaves, hearts and ornaments, glowing faintly
    /// in its own color.
    pub fn diamond(color: Color) -> Self {
        let color = color.linear();
        Self {
            base_color: color,
            emissive: color,
            emissive_intensity: 0.2,
            metalness: 0.9,
            roughness: 0.05,
            ..Default::default()
        }
    }

    /// Translucent white glow along the spiral.
    pub fn ribbon() -> Self {
        Self {
            opacity: 0.8,
            emissive: palette::WHITE.linear(),
            emissive_intensity: 1.0,
            metalness: 0.5,
            roughness: 0.2,
            blend: BlendMode::Alpha,
            ..Default::default()
        }
    }

    /// Peach specks with a very strong gold glow.
    pub fn star() -> Self {
        Self {
            base_color: palette::PEACH.linear(),
            emissive: palette::GOLD.linear(),
            emissive_intensity: 18.0,
            metalness: 1.0,
            roughness: 0.1,
            ..Default::default()
        }
    }

    /// Unlit additive motes. The mote color rides in the instance tint.
    pub fn sparkle(config: &SparkleConfig) -> Self {
        Self {
            opacity: config.opacity,
            unlit: true,
            blend: BlendMode::Additive,
            ..Default::default()
        }
    }

    pub fn to_raw(&self) -> MaterialRaw {
        MaterialRaw {
            base_color: self.base_color.extend(self.opacity).to_array(),
            emissive: self.emissive.extend(self.emissive_intensity).to_array(),
            surface: [
                self.metalness,
                self.roughness,
                if self.unlit { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

/// Material uniform as seen by `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialRaw {
    /// rgb, opacity
    pub base_color: [f32; 4],
    /// rgb, intensity
    pub emissive: [f32; 4],
    /// metalness, roughness, unlit flag, unused
    pub surface: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_raw_layout() {
        assert_eq!(std::mem::size_of::<MaterialRaw>(), 48);
    }

    #[test]
    fn test_presets() {
        let d = Material::diamond(palette::MAUVE).to_raw();
        assert_eq!(d.surface, [0.9, 0.05, 0.0, 0.0]);
        assert_eq!(d.emissive[3], 0.2);
        assert_eq!(d.base_color, palette::MAUVE.linear().extend(1.0).to_array());
        assert_eq!(d.emissive[..3], d.base_color[..3]);

        let r = Material::ribbon();
        assert_eq!(r.blend, BlendMode::Alpha);
        assert_eq!(r.to_raw().base_color[3], 0.8);
        assert_eq!(r.emissive_intensity, 1.0);

        let s = Material::star();
        assert_eq!(s.emissive_intensity, 18.0);
        assert_eq!(s.blend, BlendMode::Opaque);

        let m = Material::sparkle(&SparkleConfig::SCENE);
        assert!(m.unlit);
        assert_eq!(m.to_raw().surface[2], 1.0);
        assert_eq!(m.blend, BlendMode::Additive);
        assert_eq!(m.opacity, 0.3);
    }

    #[test]
    fn test_blend_depth_rules() {
        assert!(BlendMode::Opaque.writes_depth());
        assert!(BlendMode::Alpha.is_transparent());
        assert!(BlendMode::Additive.is_transparent());
        assert!(BlendMode::Opaque.casts_shadow());
        assert!(BlendMode::Alpha.casts_shadow());
        assert!(!BlendMode::Additive.casts_shadow());
    }
}
