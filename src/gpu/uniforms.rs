//! Per-frame uniform data shared by every scene batch.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::scene::{Light, MAX_LIGHTS};

/// One light as laid out in `scene.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct LightRaw {
    /// xyz, w = 1 for spot lights
    pub position: [f32; 4],
    /// rgb, intensity
    pub color: [f32; 4],
    /// xyz toward the target, w = cosine of the outer cone
    pub direction: [f32; 4],
    /// cutoff distance, decay, cosine of the inner cone, unused
    pub params: [f32; 4],
}

impl From<&Light> for LightRaw {
    fn from(light: &Light) -> Self {
        let (is_spot, direction, cos_outer, cos_inner) = match light.spot {
            Some(spot) => (
                1.0,
                spot.direction,
                spot.angle.cos(),
                (spot.angle * (1.0 - spot.penumbra)).cos(),
            ),
            None => (0.0, Vec3::ZERO, -1.0, -1.0),
        };
        Self {
            position: light.position.extend(is_spot).to_array(),
            color: light.color.extend(light.intensity).to_array(),
            direction: direction.extend(cos_outer).to_array(),
            params: [light.distance, light.decay, cos_inner, 0.0],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// rgb, intensity
    pub ambient: [f32; 4],
    pub light_count: u32,
    pub _padding: [u32; 3],
    pub lights: [LightRaw; MAX_LIGHTS],
}

impl FrameUniforms {
    /// Extra lights past [`MAX_LIGHTS`] are dropped.
    pub fn new(
        view_proj: Mat4,
        camera_pos: Vec3,
        ambient: Vec3,
        ambient_intensity: f32,
        lights: &[Light],
    ) -> Self {
        let mut raw = [LightRaw::zeroed(); MAX_LIGHTS];
        let count = lights.len().min(MAX_LIGHTS);
        for (slot, light) in raw.iter_mut().zip(lights) {
            *slot = LightRaw::from(light);
        }
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_pos: camera_pos.extend(1.0).to_array(),
            ambient: ambient.extend(ambient_intensity).to_array(),
            light_count: count as u32,
            _padding: [0; 3],
            lights: raw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::palette;
    use crate::scene::SceneConfig;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(std::mem::size_of::<LightRaw>(), 64);
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 368);
    }

    #[test]
    fn test_spot_cone_cosines() {
        let scene = SceneConfig::default();
        let raw = LightRaw::from(&scene.lights.spots[0]);
        assert_eq!(raw.position[3], 1.0);
        assert!((raw.direction[3] - 0.3_f32.cos()).abs() < 1e-6);
        // Full penumbra fades all the way from the axis.
        assert_eq!(raw.params[2], 1.0);
        assert_eq!(raw.color[3], 500.0);
    }

    #[test]
    fn test_extra_lights_dropped() {
        let light = Light::point(Vec3::ZERO, palette::GOLD, 1.0, 7.0);
        let lights = vec![light; 6];
        let u = FrameUniforms::new(Mat4::IDENTITY, Vec3::Z, Vec3::ONE, 0.5, &lights);
        assert_eq!(u.light_count, 4);
        assert_eq!(u.lights[3].params[0], 7.0);
        assert_eq!(u.lights[0].position[3], 0.0);
    }
}
