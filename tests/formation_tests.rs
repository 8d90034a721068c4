//! Integration tests for generation, formation morphing and pointer handling.
//!
//! Everything here runs without a window or GPU: the scene is generated
//! from a fixed seed and driven frame by frame through the public API.

use std::f32::consts::PI;

use twinkle_tree::config::{star, LEAF_CONE, LEAF_SCATTER, SCATTER_CENTER};
use twinkle_tree::gpu::OrbitCamera;
use twinkle_tree::input::{Interaction, PointerAction, DRAG_THRESHOLD};
use twinkle_tree::interpolate::ribbon_brightness;
use twinkle_tree::scene::particle_material;
use twinkle_tree::star::StarOutline;
use twinkle_tree::time::FrameClock;
use twinkle_tree::tree::{generate_tree, TreeParticles};
use twinkle_tree::{
    Color, Formation, Mat4, Morph, ParticleKind, SceneConfig, SpawnContext, TreeCounts, Vec2, World,
};

fn small_counts() -> TreeCounts {
    TreeCounts {
        leaves: 400,
        hearts: 300,
        ornaments: 30,
        ribbon: 150,
    }
}

// ============================================================================
// Generation
// ============================================================================

#[test]
fn test_default_counts_per_kind() {
    let counts = TreeCounts::DEFAULT;
    let table = generate_tree(&counts, &mut SpawnContext::seeded(1));

    assert_eq!(table.len(), 12_160);
    assert_eq!(table.count(ParticleKind::Leaf), 5000);
    assert_eq!(table.count(ParticleKind::Heart), 4500);
    assert_eq!(table.count(ParticleKind::Cube), 80);
    assert_eq!(table.count(ParticleKind::Icosahedron), 80);
    assert_eq!(table.count(ParticleKind::Ribbon), 2500);
}

#[test]
fn test_ids_are_dense_and_ordered() {
    let table = generate_tree(&small_counts(), &mut SpawnContext::seeded(2));
    for (i, p) in table.iter().enumerate() {
        assert_eq!(p.id as usize, i);
        assert_eq!(table.get(p.id), Some(p));
    }
}

#[test]
fn test_leaves_inside_cone_and_cloud() {
    let table = generate_tree(&small_counts(), &mut SpawnContext::seeded(3));
    for p in table.iter().filter(|p| p.kind == ParticleKind::Leaf) {
        let a = p.assembled;
        assert!(a.y >= 0.0 && a.y <= LEAF_CONE.max_height);
        let radial = a.x.hypot(a.z);
        assert!(radial <= LEAF_CONE.radius_at(a.y) + 1e-4);

        let offset = (p.scattered - SCATTER_CENTER).abs();
        assert!(offset.max_element() <= LEAF_SCATTER.half_extent);
    }
}

#[test]
fn test_same_seed_same_tree() {
    let a = generate_tree(&small_counts(), &mut SpawnContext::seeded(42));
    let b = generate_tree(&small_counts(), &mut SpawnContext::seeded(42));
    assert_eq!(a.particles(), b.particles());
}

#[test]
fn test_star_speck_count() {
    let star = StarOutline::generate(2000, &mut SpawnContext::seeded(5));
    assert_eq!(star.specks().len(), 2000);
    assert_eq!(star.batch().capacity(), 2000);

    // Ten edges: the remainder is dropped.
    let odd = StarOutline::generate(2005, &mut SpawnContext::seeded(5));
    assert_eq!(odd.specks().len(), 2000);
}

// ============================================================================
// Morphing
// ============================================================================

#[test]
fn test_scatter_converges() {
    let mut tree = TreeParticles::generate(&small_counts(), &mut SpawnContext::seeded(6));
    for frame in 0..300 {
        tree.update(frame as f32 / 60.0, Formation::Scattered, Mat4::IDENTITY);
    }
    for (p, &current) in tree.table().iter().zip(tree.state().positions()) {
        assert!(current.distance(p.scattered) < 0.01);
    }
}

#[test]
fn test_each_frame_closes_a_fixed_fraction() {
    let mut tree = TreeParticles::generate(&small_counts(), &mut SpawnContext::seeded(7));
    tree.update(0.0, Formation::Scattered, Mat4::IDENTITY);

    let before: Vec<_> = tree.state().positions().to_vec();
    tree.update(1.0 / 60.0, Formation::Scattered, Mat4::IDENTITY);

    for ((p, &prev), &now) in tree.table().iter().zip(&before).zip(tree.state().positions()) {
        let expected = prev.distance(p.scattered) * 0.96;
        assert!((now.distance(p.scattered) - expected).abs() < 1e-3);
    }
}

#[test]
fn test_toggle_midflight_is_continuous() {
    let mut tree = TreeParticles::generate(&small_counts(), &mut SpawnContext::seeded(8));
    for frame in 0..20 {
        tree.update(frame as f32 / 60.0, Formation::Scattered, Mat4::IDENTITY);
    }
    let before: Vec<_> = tree.state().positions().to_vec();

    tree.update(0.5, Formation::Assembled, Mat4::IDENTITY);
    for ((p, &prev), &now) in tree.table().iter().zip(&before).zip(tree.state().positions()) {
        // One step never moves farther than 7% of the way home.
        assert!(now.distance(prev) <= prev.distance(p.assembled) * 0.07 + 1e-4);
    }
}

#[test]
fn test_batches_fill_every_frame() {
    let counts = small_counts();
    let mut tree = TreeParticles::generate(&counts, &mut SpawnContext::seeded(9));
    tree.update(0.0, Formation::Assembled, Mat4::IDENTITY);

    for kind in ParticleKind::ALL {
        let batch = tree.batch(kind);
        assert_eq!(batch.written(), counts.capacity(kind));
        assert!(batch.is_dirty());
    }
}

#[test]
fn test_ribbon_brightness_at_rest() {
    // Wave 0.5 at phase 0, time 0: 1 + 0.5^6 * 15.
    assert!((ribbon_brightness(0.0, 0.0) - 1.234375).abs() < 1e-6);

    let peak = ribbon_brightness(PI / 24.0, 0.0);
    assert!((peak - 16.0).abs() < 1e-3);
}

#[test]
fn test_ribbon_flat_white_when_scattered() {
    let mut tree = TreeParticles::generate(&small_counts(), &mut SpawnContext::seeded(10));
    tree.update(0.3, Formation::Scattered, Mat4::IDENTITY);
    for instance in tree.batch(ParticleKind::Ribbon).instances() {
        assert_eq!(instance.color, [1.0, 1.0, 1.0, 1.0]);
    }
}

#[test]
fn test_star_specks_close_fixed_fractions() {
    let mut star = StarOutline::generate(star::PARTICLE_COUNT, &mut SpawnContext::seeded(11));
    let mut clock = FrameClock::manual();

    // Scattering closes 3% of the gap per frame, assembling 6%.
    for (formation, remaining) in [(Formation::Scattered, 0.97), (Formation::Assembled, 0.94)] {
        for _ in 0..3 {
            let before = star.state().positions().to_vec();
            let (time, _) = clock.advance(1.0 / 60.0);
            star.update(time, formation, Mat4::IDENTITY);

            let now = star.state().positions();
            for ((s, &prev), &current) in star.specks().iter().zip(&before).zip(now) {
                let target = s.target(formation);
                let expected = prev.distance(target) * remaining;
                assert!((current.distance(target) - expected).abs() < 1e-4);
            }
        }
    }
}

#[test]
fn test_star_specks_settle() {
    let mut star = StarOutline::generate(star::PARTICLE_COUNT, &mut SpawnContext::seeded(12));
    let mut clock = FrameClock::manual();

    for _ in 0..400 {
        let (time, _) = clock.advance(1.0 / 60.0);
        star.update(time, Formation::Scattered, Mat4::IDENTITY);
    }
    for (s, &p) in star.specks().iter().zip(star.state().positions()) {
        assert!(p.distance(s.scattered) < 1e-3);
    }

    for _ in 0..300 {
        let (time, _) = clock.advance(1.0 / 60.0);
        star.update(time, Formation::Assembled, Mat4::IDENTITY);
    }
    for (s, &p) in star.specks().iter().zip(star.state().positions()) {
        assert!(p.distance(s.assembled) < 1e-3);
    }
}

#[test]
fn test_world_round_trip() {
    let scene = SceneConfig::default();
    let mut world = World::generate(&small_counts(), &mut SpawnContext::seeded(12));
    let mut clock = FrameClock::manual();

    for _ in 0..200 {
        let (time, _) = clock.advance(1.0 / 60.0);
        world.update(time, Formation::Scattered, &scene);
    }
    for _ in 200..600 {
        let (time, _) = clock.advance(1.0 / 60.0);
        world.update(time, Formation::Assembled, &scene);
    }
    assert_eq!(clock.frame(), 600);

    let tree = world.tree();
    for (p, &current) in tree.table().iter().zip(tree.state().positions()) {
        assert!(current.distance(p.assembled) < 0.01);
    }
    assert!(world.star().position().distance(star::ANCHOR) < 0.01);
}

// ============================================================================
// Materials
// ============================================================================

#[test]
fn test_kinds_render_in_material_color() {
    let mut tree = TreeParticles::generate(&small_counts(), &mut SpawnContext::seeded(13));
    tree.update(0.5, Formation::Assembled, Mat4::IDENTITY);

    let leaves = tree.batch(ParticleKind::Leaf).instances();
    assert!(leaves.iter().all(|i| i.color == leaves[0].color));

    let leaf = particle_material(ParticleKind::Leaf);
    assert_eq!(leaf.base_color, Color(0xFF69B4).linear());

    let icosahedron = particle_material(ParticleKind::Icosahedron);
    assert_eq!(icosahedron.base_color, Color(0xE0B0FF).linear());
    assert_eq!(icosahedron.emissive, icosahedron.base_color);
    assert!((icosahedron.emissive_intensity - 0.2).abs() < 1e-6);
}

#[test]
fn test_contact_shadow_under_tree() {
    let scene = SceneConfig::default();
    let shadow = scene.contact_shadow;
    assert!((shadow.opacity - 0.4).abs() < 1e-6);
    assert_eq!(shadow.resolution, 256);

    // The tree base sits just above the plane and inside the map.
    let base = scene.tree_offset;
    let projected = shadow.view_proj().project_point3(base);
    assert!(projected.x.abs() < 1.0 && projected.y.abs() < 1.0);
    assert!(projected.z > 0.0 && projected.z < 0.05);
}

// ============================================================================
// Interaction and camera
// ============================================================================

#[test]
fn test_click_toggles_drag_orbits() {
    let mut input = Interaction::new();
    input.moved(Vec2::new(100.0, 100.0));

    input.press();
    assert_eq!(input.release(), Some(PointerAction::Toggle(Formation::Scattered)));

    input.press();
    let far = Vec2::new(100.0 + DRAG_THRESHOLD * 3.0, 100.0);
    assert!(matches!(input.moved(far), Some(PointerAction::Orbit(_))));
    assert_eq!(input.release(), None);
    assert_eq!(input.formation(), Formation::Scattered);

    input.press();
    assert_eq!(input.release(), Some(PointerAction::Toggle(Formation::Assembled)));
}

#[test]
fn test_camera_stays_in_bounds() {
    let scene = SceneConfig::default();
    let mut camera = OrbitCamera::new(&scene.camera, scene.orbit);

    camera.zoom(200.0);
    assert!((camera.distance - scene.orbit.min_distance).abs() < 1e-4);
    camera.zoom(-500.0);
    assert!((camera.distance - scene.orbit.max_distance).abs() < 1e-3);

    // Drag far down: the camera stops short of looking up from below.
    camera.orbit(Vec2::new(0.0, -5000.0), 720.0);
    let floor = camera.target.y + camera.distance * (-PI / 6.0).sin();
    assert!(camera.position().y >= floor - 1e-3);
}
