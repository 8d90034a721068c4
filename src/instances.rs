//! CPU-side instance batches.
//!
//! Each batch mirrors one GPU instance buffer: fixed capacity, one slot per
//! particle of its kind, refilled front to back every frame. The GPU layer
//! uploads a batch only when it is dirty.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};

/// Per-instance data as laid out in the instance vertex buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    /// Column-major model matrix.
    pub model: [[f32; 4]; 4],
    /// Linear RGB tint (may exceed 1.0) and alpha.
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub fn new(model: Mat4, color: Vec3) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
        }
    }

    /// Translation column of the model matrix.
    pub fn translation(&self) -> Vec3 {
        Vec3::from_slice(&self.model[3][..3])
    }
}

/// Local transform of one particle: translate, rotate (Euler XYZ), uniform scale.
#[inline]
pub fn compose(translation: Vec3, euler: Vec3, scale: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        Vec3::splat(scale),
        Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z),
        translation,
    )
}

/// A fixed-capacity, per-frame refilled instance array.
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    label: &'static str,
    instances: Vec<InstanceRaw>,
    cursor: usize,
    dirty: bool,
}

impl InstanceBatch {
    /// Allocate `capacity` zeroed slots. The capacity never changes.
    pub fn new(label: &'static str, capacity: u32) -> Self {
        Self {
            label,
            instances: vec![InstanceRaw::zeroed(); capacity as usize],
            cursor: 0,
            dirty: false,
        }
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    pub fn capacity(&self) -> u32 {
        self.instances.len() as u32
    }

    /// Slots written since the last [`begin`](Self::begin).
    #[inline]
    pub fn written(&self) -> u32 {
        self.cursor as u32
    }

    /// Reset the write cursor for a new frame.
    #[inline]
    pub fn begin(&mut self) {
        self.cursor = 0;
    }

    /// Write the next slot.
    ///
    /// # Panics
    ///
    /// Panics when the batch is already full for this frame.
    #[inline]
    pub fn push(&mut self, model: Mat4, color: Vec3) {
        assert!(
            self.cursor < self.instances.len(),
            "{} batch overfilled: capacity {}",
            self.label,
            self.instances.len()
        );
        self.instances[self.cursor] = InstanceRaw::new(model, color);
        self.cursor += 1;
    }

    /// Close the frame's pass and mark the batch for upload.
    pub fn finish(&mut self) {
        debug_assert_eq!(
            self.cursor,
            self.instances.len(),
            "{} batch underfilled",
            self.label
        );
        self.dirty = true;
    }

    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Instance bytes pending upload, clearing the dirty flag.
    pub fn take_dirty(&mut self) -> Option<&[u8]> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(bytemuck::cast_slice(&self.instances))
    }

    /// All slots, as bytes, regardless of dirtiness.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    #[inline]
    pub fn instances(&self) -> &[InstanceRaw] {
        &self.instances
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_raw_layout() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 80);
    }

    #[test]
    fn test_compose_places_translation() {
        let m = compose(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.4, 0.5, 0.6), 0.25);
        let raw = InstanceRaw::new(m, Vec3::ONE);
        assert_eq!(raw.translation(), Vec3::new(1.0, 2.0, 3.0));
        // Uniform scale survives the rotation.
        assert!((m.x_axis.truncate().length() - 0.25).abs() < 1e-6);
        assert!((m.z_axis.truncate().length() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_fill_and_upload_cycle() {
        let mut batch = InstanceBatch::new("Test", 3);
        assert!(batch.take_dirty().is_none());

        for _ in 0..2 {
            batch.begin();
            for i in 0..3 {
                batch.push(Mat4::from_translation(Vec3::X * i as f32), Vec3::ONE);
            }
            assert_eq!(batch.written(), batch.capacity());
            batch.finish();
            assert!(batch.is_dirty());

            let bytes = batch.take_dirty().map(|b| b.len());
            assert_eq!(bytes, Some(3 * 80));
            assert!(!batch.is_dirty());
            assert!(batch.take_dirty().is_none());
        }
        assert_eq!(batch.instances()[2].translation(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    #[should_panic(expected = "overfilled")]
    fn test_overfill_panics() {
        let mut batch = InstanceBatch::new("Tiny", 1);
        batch.begin();
        batch.push(Mat4::IDENTITY, Vec3::ONE);
        batch.push(Mat4::IDENTITY, Vec3::ONE);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "underfilled")]
    fn test_underfill_is_caught_in_debug() {
        let mut batch = InstanceBatch::new("Short", 2);
        batch.begin();
        batch.push(Mat4::IDENTITY, Vec3::ONE);
        batch.finish();
    }
}
