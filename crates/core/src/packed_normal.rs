//! Normals packed as three signed bytes in the low 24 bits of a `u32`.
//!
//! Layout: bits 0-7 hold X, 8-15 hold Y, 16-23 hold Z, each scaled to
//! `[-127, 127]`. The high byte is always zero.

use glam::Vec3;

const COMPONENT_RANGE: f32 = 127.0;
const X_SHIFT: u32 = 0;
const Y_SHIFT: u32 = 8;
const Z_SHIFT: u32 = 16;

/// Pack a vector whose components lie in `[-1, 1]`.
pub fn pack(x: f32, y: f32, z: f32) -> u32 {
    (encode(x) << X_SHIFT) | (encode(y) << Y_SHIFT) | (encode(z) << Z_SHIFT)
}

/// Pack a [`Vec3`].
pub fn pack_vec(v: Vec3) -> u32 {
    pack(v.x, v.y, v.z)
}

/// Decode back into a float vector (lossy to 1/127).
pub fn unpack(packed: u32) -> Vec3 {
    Vec3::new(
        decode(packed >> X_SHIFT),
        decode(packed >> Y_SHIFT),
        decode(packed >> Z_SHIFT),
    )
}

/// Negate every component of a packed normal.
pub fn flip(packed: u32) -> u32 {
    let x = (packed >> X_SHIFT) as u8 as i8;
    let y = (packed >> Y_SHIFT) as u8 as i8;
    let z = (packed >> Z_SHIFT) as u8 as i8;
    (neg(x) << X_SHIFT) | (neg(y) << Y_SHIFT) | (neg(z) << Z_SHIFT)
}

fn encode(value: f32) -> u32 {
    let scaled = (value.clamp(-1.0, 1.0) * COMPONENT_RANGE).round() as i8;
    scaled as u8 as u32
}

fn decode(bits: u32) -> f32 {
    (bits as u8 as i8) as f32 / COMPONENT_RANGE
}

fn neg(component: i8) -> u32 {
    // -128 never comes out of `encode`, saturate anyway.
    component.saturating_neg() as u8 as u32
}
