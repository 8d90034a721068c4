//! Particle records, kinds and the formation flag.
//!
//! Records are immutable once generated and live in a [`ParticleTable`].
//! The only per-particle state that changes between frames is the current
//! position, which is kept apart in [`crate::interpolate::RenderState`].

use glam::Vec3;

/// Which of the two spatial arrangements particles are heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Formation {
    /// Tree and star shapes.
    #[default]
    Assembled,
    /// Explosion cloud.
    Scattered,
}

impl Formation {
    /// The other formation.
    pub fn toggled(self) -> Self {
        match self {
            Formation::Assembled => Formation::Scattered,
            Formation::Scattered => Formation::Assembled,
        }
    }

    #[inline]
    pub fn is_scattered(self) -> bool {
        self == Formation::Scattered
    }
}

/// Closed set of tree particle categories.
///
/// Each kind has its own mesh, material and instance batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParticleKind {
    /// Foliage speck.
    Leaf,
    Heart,
    /// Cube ornament.
    Cube,
    /// Icosahedron ornament.
    Icosahedron,
    /// Speck on the spiral ribbon.
    Ribbon,
}

impl ParticleKind {
    /// All kinds, in batch order.
    pub const ALL: [ParticleKind; 5] = [
        ParticleKind::Leaf,
        ParticleKind::Heart,
        ParticleKind::Cube,
        ParticleKind::Icosahedron,
        ParticleKind::Ribbon,
    ];

    /// Number of kinds.
    pub const COUNT: usize = Self::ALL.len();

    /// Batch slot of this kind.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            ParticleKind::Leaf => 0,
            ParticleKind::Heart => 1,
            ParticleKind::Cube => 2,
            ParticleKind::Icosahedron => 3,
            ParticleKind::Ribbon => 4,
        }
    }

    /// Spin rate about X in radians per second.
    #[inline]
    pub fn spin_rate(self) -> f32 {
        match self {
            ParticleKind::Ribbon => 1.5,
            _ => 0.5,
        }
    }

    /// Ribbon specks sway in both formations; everything else only while scattered.
    #[inline]
    pub fn sways(self, formation: Formation) -> bool {
        self == ParticleKind::Ribbon || formation.is_scattered()
    }

    /// Human-readable label, used for GPU resource names and logs.
    pub fn label(self) -> &'static str {
        match self {
            ParticleKind::Leaf => "Leaf",
            ParticleKind::Heart => "Heart",
            ParticleKind::Cube => "Cube Ornament",
            ParticleKind::Icosahedron => "Icosahedron Ornament",
            ParticleKind::Ribbon => "Ribbon",
        }
    }
}

/// Anything with a position in each formation.
///
/// The interpolator only needs targets, so tree particles and star specks
/// share it through this trait.
pub trait Morph {
    fn assembled(&self) -> Vec3;
    fn scattered(&self) -> Vec3;

    /// Position to head for in `formation`.
    #[inline]
    fn target(&self, formation: Formation) -> Vec3 {
        match formation {
            Formation::Assembled => self.assembled(),
            Formation::Scattered => self.scattered(),
        }
    }
}

/// One tree particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Stable identity; also the phase seed for sway.
    pub id: u32,
    pub assembled: Vec3,
    pub scattered: Vec3,
    /// Base Euler angles (XYZ order), spun over time at render.
    pub rotation: Vec3,
    pub scale: f32,
    pub kind: ParticleKind,
    /// Generated linear color. Batches are shaded by their material color,
    /// so this is record data only; ribbon tints are recomputed each frame.
    pub color: Vec3,
    /// Normalized position along the ribbon spiral (ribbon only).
    pub phase: Option<f32>,
}

impl Morph for Particle {
    #[inline]
    fn assembled(&self) -> Vec3 {
        self.assembled
    }

    #[inline]
    fn scattered(&self) -> Vec3 {
        self.scattered
    }
}

/// Immutable arena of generated particles, grouped by kind.
#[derive(Debug, Clone)]
pub struct ParticleTable {
    particles: Vec<Particle>,
    counts: [u32; ParticleKind::COUNT],
}

impl ParticleTable {
    /// Wrap a generated list, tallying counts per kind.
    pub fn new(particles: Vec<Particle>) -> Self {
        let mut counts = [0u32; ParticleKind::COUNT];
        for p in &particles {
            counts[p.kind.index()] += 1;
        }
        Self { particles, counts }
    }

    #[inline]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Number of particles of `kind`.
    #[inline]
    pub fn count(&self, kind: ParticleKind) -> u32 {
        self.counts[kind.index()]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// Look a particle up by id.
    pub fn get(&self, id: u32) -> Option<&Particle> {
        self.particles.get(id as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(id: u32, kind: ParticleKind) -> Particle {
        Particle {
            id,
            assembled: Vec3::new(id as f32, 0.0, 0.0),
            scattered: Vec3::new(0.0, id as f32, 0.0),
            rotation: Vec3::ZERO,
            scale: 1.0,
            kind,
            color: Vec3::ONE,
            phase: None,
        }
    }

    #[test]
    fn test_formation_toggle() {
        assert_eq!(Formation::default(), Formation::Assembled);
        assert_eq!(Formation::Assembled.toggled(), Formation::Scattered);
        assert_eq!(Formation::Assembled.toggled().toggled(), Formation::Assembled);
        assert!(Formation::Scattered.is_scattered());
    }

    #[test]
    fn test_kind_indices_are_dense() {
        for (i, kind) in ParticleKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_sway_rules() {
        assert!(ParticleKind::Ribbon.sways(Formation::Assembled));
        assert!(!ParticleKind::Leaf.sways(Formation::Assembled));
        assert!(ParticleKind::Heart.sways(Formation::Scattered));
    }

    #[test]
    fn test_target_follows_formation() {
        let p = particle(3, ParticleKind::Leaf);
        assert_eq!(p.target(Formation::Assembled), p.assembled);
        assert_eq!(p.target(Formation::Scattered), p.scattered);
    }

    #[test]
    fn test_table_counts() {
        let table = ParticleTable::new(vec![
            particle(0, ParticleKind::Leaf),
            particle(1, ParticleKind::Leaf),
            particle(2, ParticleKind::Ribbon),
        ]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.count(ParticleKind::Leaf), 2);
        assert_eq!(table.count(ParticleKind::Ribbon), 1);
        assert_eq!(table.count(ParticleKind::Heart), 0);
        assert_eq!(table.get(2).map(|p| p.kind), Some(ParticleKind::Ribbon));
    }
}
