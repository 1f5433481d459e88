//! Morton (Z-order) addressing for octree nodes.
//!
//! Interleaves three 21-bit coordinates into one `u64`:
//!
//! ```text
//! bit:   ... 5  4  3  2  1  0
//! axis:  ... z1 y1 x1 z0 y0 x0
//! ```
//!
//! The low three bits of a code are the octant of a node inside its parent
//! (X = bit 0, Y = bit 1, Z = bit 2), so `code >> 3` is the parent and
//! `code << 3` is the first of its 8 contiguous children.

use glam::UVec3;

use crate::types::MortonCode;

/// Bits available per axis in a 64-bit code.
pub const MORTON_AXIS_BITS: u32 = 21;

/// Largest encodable coordinate on any axis.
pub const MORTON_AXIS_MAX: u32 = (1 << MORTON_AXIS_BITS) - 1;

#[inline]
fn split_by_3(value: u32) -> u64 {
  let mut x = u64::from(value) & 0x1f_ffff;
  x = (x | x << 32) & 0x001f_0000_0000_ffff;
  x = (x | x << 16) & 0x001f_0000_ff00_00ff;
  x = (x | x << 8) & 0x100f_00f0_0f00_f00f;
  x = (x | x << 4) & 0x10c3_0c30_c30c_30c3;
  x = (x | x << 2) & 0x1249_2492_4924_9249;
  x
}

#[inline]
fn compact_by_3(code: u64) -> u32 {
  let mut x = code & 0x1249_2492_4924_9249;
  x = (x ^ (x >> 2)) & 0x10c3_0c30_c30c_30c3;
  x = (x ^ (x >> 4)) & 0x100f_00f0_0f00_f00f;
  x = (x ^ (x >> 8)) & 0x001f_0000_ff00_00ff;
  x = (x ^ (x >> 16)) & 0x001f_0000_0000_ffff;
  x = (x ^ (x >> 32)) & 0x1f_ffff;
  x as u32
}

/// Interleave `(x, y, z)` into a Morton code.
///
/// Coordinates above [`MORTON_AXIS_MAX`] are truncated; callers bound-check
/// before encoding.
#[inline]
pub fn encode(x: u32, y: u32, z: u32) -> MortonCode {
  debug_assert!(x <= MORTON_AXIS_MAX && y <= MORTON_AXIS_MAX && z <= MORTON_AXIS_MAX);
  split_by_3(x) | (split_by_3(y) << 1) | (split_by_3(z) << 2)
}

/// Inverse of [`encode`].
#[inline]
pub fn decode(code: MortonCode) -> (u32, u32, u32) {
  (compact_by_3(code), compact_by_3(code >> 1), compact_by_3(code >> 2))
}

#[inline]
pub fn encode_coords(coords: UVec3) -> MortonCode {
  encode(coords.x, coords.y, coords.z)
}

#[inline]
pub fn decode_coords(code: MortonCode) -> UVec3 {
  let (x, y, z) = decode(code);
  UVec3::new(x, y, z)
}

/// Code of the node one layer up that contains `code`.
#[inline]
pub const fn parent_code(code: MortonCode) -> MortonCode {
  code >> 3
}

/// Code of the first (octant 0) child one layer down.
#[inline]
pub const fn first_child_code(code: MortonCode) -> MortonCode {
  code << 3
}

/// Code of the child in `octant` (0..8) one layer down.
#[inline]
pub const fn child_code(code: MortonCode, octant: u8) -> MortonCode {
  (code << 3) | (octant & 7) as MortonCode
}

#[cfg(test)]
#[path = "morton_test.rs"]
mod morton_test;
