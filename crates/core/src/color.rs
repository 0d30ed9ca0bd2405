//! 32-bit color packing helpers.
//!
//! Tint sources hand out ARGB (`0xAARRGGBB`). The vertex format wants ABGR
//! (`0xAABBGGRR`) so that the bytes land as RGBA in little-endian memory.

/// Opaque white in ARGB.
pub const WHITE: u32 = 0xFFFF_FFFF;

/// Pack ARGB components.
pub const fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Split ARGB into `[a, r, g, b]`.
pub const fn unpack_argb(color: u32) -> [u8; 4] {
    [
        (color >> 24) as u8,
        (color >> 16) as u8,
        (color >> 8) as u8,
        color as u8,
    ]
}

/// Swap the red and blue channels, turning ARGB into ABGR.
pub const fn argb_to_abgr(color: u32) -> u32 {
    (color & 0xFF00_FF00) | ((color >> 16) & 0xFF) | ((color & 0xFF) << 16)
}
