//! Node - one cell of a layer with its links into the rest of the tree.

use crate::types::{Direction, MortonCode, NodeAddress};

/// A materialized octree cell.
///
/// All links are addresses resolved against the owning store, never owned
/// references.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Node {
  /// Position of the node in its layer's grid.
  pub morton_code: MortonCode,

  /// Containing node one layer up. `None` only for the root.
  pub parent: Option<NodeAddress>,

  /// Above layer 0: the first of 8 contiguous children one layer down.
  /// At layer 0: the leaf holding this node's 4x4x4 occupancy, set only
  /// when the node was found occluded.
  pub first_child: Option<NodeAddress>,

  /// Face neighbors, indexed by [`Direction::index`]. A neighbor may live
  /// on a coarser layer. `None` at the volume edge or when the layer-0
  /// neighbor is fully occluded.
  pub neighbors: [Option<NodeAddress>; 6],
}

impl Node {
  pub fn new(morton_code: MortonCode) -> Self {
    Self {
      morton_code,
      parent: None,
      first_child: None,
      neighbors: [None; 6],
    }
  }

  #[inline]
  pub fn has_children(&self) -> bool {
    self.first_child.is_some()
  }

  #[inline]
  pub fn neighbor(&self, direction: Direction) -> Option<NodeAddress> {
    self.neighbors[direction.index()]
  }
}
