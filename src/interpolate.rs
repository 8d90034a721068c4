//! Per-frame formation interpolation.
//!
//! Current positions move toward the active formation by exponential
//! smoothing with a fixed per-frame factor. The factor is not scaled by
//! elapsed time, so perceived speed follows the display refresh rate.
//! Sway, spin and the ribbon glow are pure functions of time layered on
//! top at write time and never stored.

use glam::Vec3;

use crate::config::SmoothingRates;
use crate::particle::{Formation, Morph};

/// One exponential smoothing step.
#[inline]
pub fn smooth_toward(current: Vec3, target: Vec3, factor: f32) -> Vec3 {
    current + (target - current) * factor
}

impl SmoothingRates {
    /// Factor for the current formation.
    #[inline]
    pub fn factor(&self, formation: Formation) -> f32 {
        match formation {
            Formation::Assembled => self.assembled,
            Formation::Scattered => self.scattered,
        }
    }
}

/// Mutable current positions, indexed like the particle list they track.
#[derive(Debug, Clone)]
pub struct RenderState {
    current: Vec<Vec3>,
}

impl RenderState {
    /// Start every particle at its assembled position.
    pub fn assembled<P: Morph>(particles: &[P]) -> Self {
        Self {
            current: particles.iter().map(Morph::assembled).collect(),
        }
    }

    /// Advance every position one frame toward `formation`.
    pub fn step<P: Morph>(&mut self, particles: &[P], formation: Formation, factor: f32) {
        debug_assert_eq!(particles.len(), self.current.len());
        for (current, p) in self.current.iter_mut().zip(particles) {
            *current = smooth_toward(*current, p.target(formation), factor);
        }
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.current
    }

    #[inline]
    pub fn get(&self, index: usize) -> Vec3 {
        self.current[index]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.current.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }
}

/// Small sinusoidal drift in the XY plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sway {
    pub freq_x: f32,
    pub freq_y: f32,
    pub amplitude: f32,
}

impl Sway {
    /// Drift of the tree particles.
    pub const TREE: Sway = Sway {
        freq_x: 0.5,
        freq_y: 0.8,
        amplitude: 0.04,
    };

    /// Star specks while scattered.
    pub const STAR_SCATTERED: Sway = Sway {
        freq_x: 0.6,
        freq_y: 0.6,
        amplitude: 0.008,
    };

    /// Star specks while assembled; each speck shimmers at its own speed.
    pub fn star_shimmer(speed: f32) -> Sway {
        Sway {
            freq_x: speed,
            freq_y: speed,
            amplitude: 0.002,
        }
    }

    /// `phase` desynchronizes particles that would otherwise move in lockstep.
    #[inline]
    pub fn offset(&self, time: f32, phase: f32) -> Vec3 {
        Vec3::new(
            (time * self.freq_x + phase).sin() * self.amplitude,
            (time * self.freq_y + phase).cos() * self.amplitude,
            0.0,
        )
    }
}

/// Base rotation spun by elapsed time: X at `spin_x`, Y at a fixed 0.3.
#[inline]
pub fn spin(base: Vec3, time: f32, spin_x: f32) -> Vec3 {
    Vec3::new(base.x + time * spin_x, base.y + time * 0.3, base.z)
}

/// Traveling wave along the ribbon, in `[0, 1]`.
#[inline]
pub fn ribbon_wave(phase: f32, time: f32) -> f32 {
    (phase * 12.0 - time * 3.0).sin() * 0.5 + 0.5
}

/// Overbright multiplier: the sixth power narrows the wave into a sharp pulse.
#[inline]
pub fn ribbon_brightness(phase: f32, time: f32) -> f32 {
    1.0 + ribbon_wave(phase, time).powi(6) * 15.0
}

/// Ribbon speck color for this frame; flat white while scattered.
#[inline]
pub fn ribbon_color(phase: f32, time: f32, formation: Formation) -> Vec3 {
    match formation {
        Formation::Assembled => Vec3::splat(ribbon_brightness(phase, time)),
        Formation::Scattered => Vec3::ONE,
    }
}
