//! Scene composition.
//!
//! Everything around the particles lives here as one parameter table:
//! camera, orbit limits, lights, the float rig the tree hangs in, which mesh
//! and material each batch uses, post-processing and the overlay text. The
//! renderer and the app read it; nothing writes it after startup.

use std::f32::consts::PI;

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::config::{palette, star, Color};
use crate::mesh::Mesh;
use crate::particle::{Formation, ParticleKind};
use crate::visuals::Material;

/// Lights the frame uniform has room for.
pub const MAX_LIGHTS: usize = 4;

pub const TITLE: &str = "MERRY CHRISTMAS";

/// Perspective camera placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

/// Orbit control limits and speeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitConfig {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Largest angle from straight up, in radians.
    pub max_polar: f32,
    /// Auto-rotation in units of one turn per minute.
    pub auto_rotate_assembled: f32,
    pub auto_rotate_scattered: f32,
    /// Distance factor per wheel line.
    pub zoom_step: f32,
}

impl OrbitConfig {
    pub fn auto_rotate(&self, formation: Formation) -> f32 {
        match formation {
            Formation::Assembled => self.auto_rotate_assembled,
            Formation::Scattered => self.auto_rotate_scattered,
        }
    }
}

/// Gentle bobbing and rocking of the whole tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRig {
    pub speed: f32,
    pub rotation_intensity: f32,
    pub float_intensity: f32,
    /// Added to the clock before evaluating.
    pub offset: f32,
}

impl FloatRig {
    /// Euler XYZ rocking angles at `time`.
    pub fn rotation(&self, time: f32) -> Vec3 {
        let s = (self.offset + time) / 4.0 * self.speed;
        let ri = self.rotation_intensity;
        Vec3::new(s.cos() / 8.0 * ri, s.sin() / 8.0 * ri, s.sin() / 20.0 * ri)
    }

    /// Vertical bob at `time`.
    pub fn height(&self, time: f32) -> f32 {
        let s = (self.offset + time) / 4.0 * self.speed;
        s.sin() / 10.0 * self.float_intensity
    }

    pub fn transform(&self, time: f32) -> Mat4 {
        let r = self.rotation(time);
        Mat4::from_rotation_translation(
            Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z),
            Vec3::new(0.0, self.height(time), 0.0),
        )
    }
}

/// Cone parameters of a spot light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spot {
    pub direction: Vec3,
    /// Half-angle of the cone, radians.
    pub angle: f32,
    /// Fraction of the cone that fades out, 0..1.
    pub penumbra: f32,
}

/// A point or spot light in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    /// Linear color.
    pub color: Vec3,
    pub intensity: f32,
    /// Cutoff range; 0 means unlimited.
    pub distance: f32,
    pub decay: f32,
    pub spot: Option<Spot>,
}

impl Light {
    pub fn point(position: Vec3, color: Color, intensity: f32, distance: f32) -> Self {
        Self {
            position,
            color: color.linear(),
            intensity,
            distance,
            decay: 2.0,
            spot: None,
        }
    }

    /// Spot light aimed at `target`.
    pub fn spot(position: Vec3, target: Vec3, color: Color, intensity: f32, angle: f32, penumbra: f32) -> Self {
        Self {
            spot: Some(Spot {
                direction: (target - position).normalize_or_zero(),
                angle,
                penumbra,
            }),
            ..Self::point(position, color, intensity, 0.0)
        }
    }
}

/// Lights of the scene other than the star's own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightRig {
    /// Spots, in the coordinates of the slowly spinning light group.
    pub spots: [Light; 2],
    /// Spin of the light group about Y, radians per second.
    pub spin: f32,
    pub ground: Light,
    pub ambient: Vec3,
    pub ambient_intensity: f32,
}

impl LightRig {
    /// World-space lights at `time`, with `star` last.
    pub fn lights(&self, time: f32, star: Light) -> [Light; MAX_LIGHTS] {
        let spin = Quat::from_rotation_y(time * self.spin);
        let [a, b] = self.spots.map(|mut light| {
            light.position = spin * light.position;
            if let Some(spot) = light.spot.as_mut() {
                // Targets stay at the origin while the group turns.
                spot.direction = (-light.position).normalize_or_zero();
            }
            light
        });
        [a, b, self.ground, star]
    }
}

/// Gold light carried by the star group.
pub fn star_light(position: Vec3, intensity: f32) -> Light {
    Light::point(position, palette::GOLD, intensity, star::LIGHT_DISTANCE)
}

/// Soft shadow on a ground plane under the tree.
///
/// Everything above the plane within `far` is rendered from below with an
/// orthographic camera; closer geometry is darker. The result is blurred
/// and laid on a square of edge `scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactShadowConfig {
    /// Center of the ground plane.
    pub position: Vec3,
    pub opacity: f32,
    /// Edge length of the plane.
    pub scale: f32,
    /// Blur spread in shadow-map texels.
    pub blur: f32,
    /// Height above the plane past which nothing casts.
    pub far: f32,
    /// Shadow map edge in texels.
    pub resolution: u32,
    pub color: Color,
}

impl ContactShadowConfig {
    /// Camera at the plane center looking straight up.
    pub fn view_proj(&self) -> Mat4 {
        let half = self.scale / 2.0;
        let view = Mat4::look_at_rh(self.position, self.position + Vec3::Y, Vec3::Z);
        Mat4::orthographic_rh(-half, half, -half, half, 0.0, self.far) * view
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomConfig {
    pub threshold: f32,
    pub intensity: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VignetteConfig {
    pub offset: f32,
    pub darkness: f32,
}

/// The full scene parameter table.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub background: Color,
    pub camera: CameraConfig,
    pub orbit: OrbitConfig,
    pub lights: LightRig,
    pub float_rig: FloatRig,
    /// Tree group position inside the float rig.
    pub tree_offset: Vec3,
    pub contact_shadow: ContactShadowConfig,
    pub bloom: BloomConfig,
    pub vignette: VignetteConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let spot_angle = 0.3;
        Self {
            background: palette::NIGHT,
            camera: CameraConfig {
                position: Vec3::new(0.0, 5.0, 12.0),
                target: Vec3::ZERO,
                fov_degrees: 45.0,
                near: 0.1,
                far: 100.0,
            },
            orbit: OrbitConfig {
                min_distance: 5.0,
                max_distance: 25.0,
                max_polar: PI / 1.5,
                auto_rotate_assembled: 1.5,
                auto_rotate_scattered: 0.5,
                zoom_step: 0.95,
            },
            lights: LightRig {
                spots: [
                    Light::spot(
                        Vec3::new(10.0, 15.0, 10.0),
                        Vec3::ZERO,
                        palette::HOT_PINK,
                        500.0,
                        spot_angle,
                        1.0,
                    ),
                    Light::spot(
                        Vec3::new(-10.0, 10.0, -10.0),
                        Vec3::ZERO,
                        palette::SAKURA,
                        300.0,
                        spot_angle,
                        1.0,
                    ),
                ],
                spin: 0.2,
                ground: Light::point(Vec3::new(0.0, -5.0, 0.0), palette::HOT_PINK, 250.0, 12.0),
                ambient: Vec3::ONE,
                ambient_intensity: 0.5,
            },
            float_rig: FloatRig {
                speed: 1.5,
                rotation_intensity: 0.2,
                float_intensity: 0.5,
                offset: 0.0,
            },
            tree_offset: Vec3::new(0.0, -5.5, 0.0),
            contact_shadow: ContactShadowConfig {
                position: Vec3::new(0.0, -5.6, 0.0),
                opacity: 0.4,
                scale: 20.0,
                blur: 2.5,
                far: 10.0,
                resolution: 256,
                color: Color(0x000000),
            },
            bloom: BloomConfig {
                threshold: 0.5,
                intensity: 1.5,
                radius: 0.4,
            },
            vignette: VignetteConfig {
                offset: 0.1,
                darkness: 0.8,
            },
        }
    }
}

impl SceneConfig {
    /// World transform of the tree group at `time`.
    pub fn tree_transform(&self, time: f32) -> Mat4 {
        self.float_rig.transform(time) * Mat4::from_translation(self.tree_offset)
    }
}

/// Mesh used for a tree particle kind.
pub fn particle_mesh(kind: ParticleKind) -> Mesh {
    match kind {
        ParticleKind::Leaf => Mesh::icosahedron(0),
        ParticleKind::Heart => Mesh::heart(0.45),
        ParticleKind::Cube => Mesh::cube(),
        ParticleKind::Icosahedron => Mesh::icosahedron(1),
        ParticleKind::Ribbon => Mesh::tetrahedron(),
    }
}

/// Material of a tree particle kind. One color per batch; only the ribbon
/// varies per instance.
pub fn particle_material(kind: ParticleKind) -> Material {
    match kind {
        ParticleKind::Leaf => Material::diamond(palette::HOT_PINK),
        ParticleKind::Heart => Material::diamond(palette::SAKURA),
        ParticleKind::Cube => Material::diamond(palette::WHITE),
        ParticleKind::Icosahedron => Material::diamond(palette::MAUVE),
        ParticleKind::Ribbon => Material::ribbon(),
    }
}

/// Mesh shared by star specks and sparkle motes.
pub fn speck_mesh() -> Mesh {
    Mesh::icosahedron(0)
}

/// Second overlay line.
pub fn subtitle(formation: Formation) -> &'static str {
    match formation {
        Formation::Assembled => "FOR MINE BOBO PIG",
        Formation::Scattered => "love you",
    }
}

/// Both overlay lines as one window title.
pub fn window_title(formation: Formation) -> String {
    format!("{TITLE} - {}", subtitle(formation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_rig_at_zero() {
        let rig = SceneConfig::default().float_rig;
        let r = rig.rotation(0.0);
        assert!((r.x - 0.2 / 8.0).abs() < 1e-6);
        assert_eq!(r.y, 0.0);
        assert_eq!(r.z, 0.0);
        assert_eq!(rig.height(0.0), 0.0);
    }

    #[test]
    fn test_float_rig_bounds() {
        let rig = SceneConfig::default().float_rig;
        for i in 0..200 {
            let t = i as f32 * 0.37;
            assert!(rig.height(t).abs() <= 0.05 + 1e-6);
            let r = rig.rotation(t);
            assert!(r.x.abs() <= 0.025 + 1e-6);
            assert!(r.z.abs() <= 0.01 + 1e-6);
        }
        // s = t / 4 * 1.5 reaches π/2 at t = 4π/3.
        let peak = 4.0 * PI / 3.0;
        assert!((rig.height(peak) - 0.05).abs() < 1e-5);
    }

    #[test]
    fn test_tree_transform_hangs_below_origin() {
        let scene = SceneConfig::default();
        let origin = scene.tree_transform(0.0).transform_point3(Vec3::ZERO);
        assert!((origin.y + 5.5).abs() < 0.2);
    }

    #[test]
    fn test_spots_track_origin_while_spinning() {
        let scene = SceneConfig::default();
        let star = star_light(Vec3::new(0.0, 4.3, 0.0), 120.0);
        let lights = scene.lights.lights(3.0, star);

        for light in &lights[..2] {
            let spot = light.spot.expect("spot light");
            let to_origin = (-light.position).normalize();
            assert!(spot.direction.dot(to_origin) > 0.9999);
        }
        // Spin keeps the height and the distance from the Y axis.
        let p = lights[0].position;
        assert!((p.y - 15.0).abs() < 1e-4);
        assert!((p.x.hypot(p.z) - 200.0_f32.sqrt()).abs() < 1e-3);
        assert!(lights[2].spot.is_none());
        assert_eq!(lights[3].distance, 7.0);
        assert_eq!(lights[3].intensity, 120.0);
    }

    #[test]
    fn test_contact_shadow_camera_looks_up() {
        let shadow = SceneConfig::default().contact_shadow;
        let vp = shadow.view_proj();

        let mid = vp.project_point3(shadow.position + Vec3::new(0.0, 5.0, 0.0));
        assert!(mid.x.abs() < 1e-5 && mid.y.abs() < 1e-5);
        assert!((mid.z - 0.5).abs() < 1e-5);

        // Plane corners land on the edges of the map.
        let corner = vp.project_point3(shadow.position + Vec3::new(10.0, 1.0, 10.0));
        assert!((corner.x.abs() - 1.0).abs() < 1e-5);
        assert!((corner.y.abs() - 1.0).abs() < 1e-5);

        // Below the plane is behind the camera.
        let below = vp.project_point3(shadow.position - Vec3::Y);
        assert!(below.z < 0.0);
    }

    #[test]
    fn test_overlay_text() {
        assert_eq!(subtitle(Formation::Assembled), "FOR MINE BOBO PIG");
        assert_eq!(subtitle(Formation::Scattered), "love you");
        assert_eq!(window_title(Formation::Scattered), "MERRY CHRISTMAS - love you");
    }

    #[test]
    fn test_every_kind_has_geometry() {
        for kind in ParticleKind::ALL {
            assert!(particle_mesh(kind).vertex_count() > 0);
        }
        assert!(particle_material(ParticleKind::Ribbon).blend.is_transparent());
        assert!(!particle_material(ParticleKind::Leaf).blend.is_transparent());
    }

    #[test]
    fn test_one_material_color_per_kind() {
        let base = |kind| particle_material(kind).base_color;
        assert_eq!(base(ParticleKind::Leaf), palette::HOT_PINK.linear());
        assert_eq!(base(ParticleKind::Heart), palette::SAKURA.linear());
        assert_eq!(base(ParticleKind::Cube), Vec3::ONE);
        assert_eq!(base(ParticleKind::Icosahedron), Color(0xE0B0FF).linear());
        assert_eq!(base(ParticleKind::Ribbon), Vec3::ONE);

        let ico = particle_material(ParticleKind::Icosahedron);
        assert_eq!(ico.emissive, ico.base_color);
        assert_eq!(ico.emissive_intensity, 0.2);
    }
}
