//! Leaf - 4x4x4 occupancy bitmask owned by a layer-0 node.

use glam::UVec3;

use crate::morton;
use crate::types::{SubNodeIndex, LEAF_SUB_NODE_COUNT};

/// Occupancy of the 64 voxels inside one layer-0 node.
///
/// Bit `i` is the voxel with Morton index `i` in the node's 4x4x4 grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Leaf {
  sub_nodes: u64,
}

impl Leaf {
  pub const FREE: Leaf = Leaf { sub_nodes: 0 };
  pub const OCCLUDED: Leaf = Leaf { sub_nodes: u64::MAX };

  #[inline]
  pub const fn from_bits(sub_nodes: u64) -> Self {
    Self { sub_nodes }
  }

  #[inline]
  pub const fn bits(&self) -> u64 {
    self.sub_nodes
  }

  #[inline]
  pub const fn is_completely_free(&self) -> bool {
    self.sub_nodes == 0
  }

  #[inline]
  pub const fn is_completely_occluded(&self) -> bool {
    self.sub_nodes == u64::MAX
  }

  #[inline]
  pub fn is_sub_node_occluded(&self, sub_node: SubNodeIndex) -> bool {
    debug_assert!((sub_node as usize) < LEAF_SUB_NODE_COUNT);
    self.sub_nodes & (1u64 << sub_node) != 0
  }

  #[inline]
  pub fn mark_sub_node_occluded(&mut self, sub_node: SubNodeIndex) {
    debug_assert!((sub_node as usize) < LEAF_SUB_NODE_COUNT);
    self.sub_nodes |= 1u64 << sub_node;
  }

  /// Number of occluded voxels.
  #[inline]
  pub const fn occluded_count(&self) -> u32 {
    self.sub_nodes.count_ones()
  }

  /// Indices of the free voxels, in Morton order.
  pub fn free_sub_nodes(&self) -> impl Iterator<Item = SubNodeIndex> + '_ {
    (0..LEAF_SUB_NODE_COUNT as SubNodeIndex).filter(move |&i| !self.is_sub_node_occluded(i))
  }
}

/// Grid coordinates (0..4 per axis) of a leaf voxel.
#[inline]
pub fn sub_node_coords(sub_node: SubNodeIndex) -> UVec3 {
  morton::decode_coords(sub_node as u64)
}

/// Leaf voxel at grid coordinates (0..4 per axis).
#[inline]
pub fn sub_node_index(coords: UVec3) -> SubNodeIndex {
  morton::encode_coords(coords) as SubNodeIndex
}
