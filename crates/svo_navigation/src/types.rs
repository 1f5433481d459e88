//! Core addressing types shared by the octree, the graph and the searches.

use glam::IVec3;

/// Morton code of a node inside its layer.
pub type MortonCode = u64;

/// Layer of the octree. 0 is the finest layer that still has node records.
pub type LayerIndex = u8;

/// Index of a node inside its layer's node array, or of a leaf in the leaf
/// array.
pub type NodeIndex = u32;

/// Morton index (0..64) of a voxel inside a leaf's 4x4x4 grid.
pub type SubNodeIndex = u8;

/// Number of sub-voxels along one edge of a leaf.
pub const LEAF_EDGE: u32 = 4;

/// Number of sub-voxels in a leaf.
pub const LEAF_SUB_NODE_COUNT: usize = 64;

/// Location of a node in an [`SvoData`](crate::octree::SvoData).
///
/// `subnode_index` is only meaningful for layer-0 nodes that carry a leaf;
/// everywhere else it is 0 so addresses compare field-wise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeAddress {
  pub layer: LayerIndex,
  pub node_index: NodeIndex,
  pub subnode_index: SubNodeIndex,
}

impl NodeAddress {
  /// Sentinel for "no node".
  pub const INVALID: Self = Self {
    layer: LayerIndex::MAX,
    node_index: NodeIndex::MAX,
    subnode_index: 0,
  };

  /// Address of a whole node.
  #[inline]
  pub const fn new(layer: LayerIndex, node_index: NodeIndex) -> Self {
    Self {
      layer,
      node_index,
      subnode_index: 0,
    }
  }

  /// Address of one voxel of a layer-0 node's leaf.
  #[inline]
  pub const fn sub_node(node_index: NodeIndex, subnode_index: SubNodeIndex) -> Self {
    Self {
      layer: 0,
      node_index,
      subnode_index,
    }
  }

  /// False only for [`NodeAddress::INVALID`]. Whether the address resolves
  /// inside a given store is answered by the store.
  #[inline]
  pub fn is_valid(&self) -> bool {
    *self != Self::INVALID
  }

  /// Same node, with the sub-node cleared.
  #[inline]
  pub const fn node(&self) -> Self {
    Self::new(self.layer, self.node_index)
  }
}

impl Default for NodeAddress {
  fn default() -> Self {
    Self::INVALID
  }
}

/// One of the six face directions of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
  PosX = 0,
  NegX = 1,
  PosY = 2,
  NegY = 3,
  PosZ = 4,
  NegZ = 5,
}

impl Direction {
  /// All directions in neighbor-slot order.
  pub const ALL: [Direction; 6] = [
    Direction::PosX,
    Direction::NegX,
    Direction::PosY,
    Direction::NegY,
    Direction::PosZ,
    Direction::NegZ,
  ];

  /// Slot of this direction in [`Node::neighbors`](crate::octree::Node).
  #[inline]
  pub const fn index(self) -> usize {
    self as usize
  }

  /// 0 = X, 1 = Y, 2 = Z.
  #[inline]
  pub const fn axis(self) -> usize {
    self as usize / 2
  }

  #[inline]
  pub const fn is_positive(self) -> bool {
    (self as u8) & 1 == 0
  }

  #[inline]
  pub const fn opposite(self) -> Self {
    match self {
      Direction::PosX => Direction::NegX,
      Direction::NegX => Direction::PosX,
      Direction::PosY => Direction::NegY,
      Direction::NegY => Direction::PosY,
      Direction::PosZ => Direction::NegZ,
      Direction::NegZ => Direction::PosZ,
    }
  }

  /// Unit grid step.
  #[inline]
  pub const fn offset(self) -> IVec3 {
    match self {
      Direction::PosX => IVec3::new(1, 0, 0),
      Direction::NegX => IVec3::new(-1, 0, 0),
      Direction::PosY => IVec3::new(0, 1, 0),
      Direction::NegY => IVec3::new(0, -1, 0),
      Direction::PosZ => IVec3::new(0, 0, 1),
      Direction::NegZ => IVec3::new(0, 0, -1),
    }
  }
}

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;
