//! Lightmap coordinates packed into a `u32`.
//!
//! Block light lives in bits 4-7 and sky light in bits 20-23, so each half
//! can be read as a 16-bit lightmap texture coordinate.

/// Brightest light level.
pub const MAX_LEVEL: u8 = 15;

/// Fully lit by both channels.
pub const FULL_BRIGHT: u32 = pack(MAX_LEVEL, MAX_LEVEL);

/// Pack block and sky light levels (each 0-15).
pub const fn pack(block: u8, sky: u8) -> u32 {
    ((block & 0x0F) as u32) << 4 | ((sky & 0x0F) as u32) << 20
}

/// Block light level of a packed value.
pub const fn block(packed: u32) -> u8 {
    ((packed >> 4) & 0x0F) as u8
}

/// Sky light level of a packed value.
pub const fn sky(packed: u32) -> u8 {
    ((packed >> 20) & 0x0F) as u8
}
