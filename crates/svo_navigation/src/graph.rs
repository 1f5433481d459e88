//! Graph view of an octree for the searches.
//!
//! Nodes are cells of any size: coarse nodes without children, plain
//! layer-0 nodes and free leaf voxels. Moving into a subdivided neighbor
//! descends its near face, so a step never jumps over finer geometry.
//!
//! ```text
//!   current        neighbor (subdivided)
//!  ┌───────┐      ┌───┬───┐
//!  │       │ +X   │ a │   │   only the children touching the shared
//!  │   *   ├─────►├───┼───┤   face (a, b) are returned, recursively
//!  │       │      │ b │   │
//!  └───────┘      └───┴───┘
//! ```

use glam::{IVec3, Vec3};
use smallvec::SmallVec;

use crate::octree::leaf::{sub_node_coords, sub_node_index};
use crate::octree::{Leaf, Node, SvoData};
use crate::types::{Direction, NodeAddress, NodeIndex, SubNodeIndex, LEAF_EDGE};

/// Neighbors of one cell. Six fit inline; descending a subdivided face
/// spills to the heap.
pub type NeighborList = SmallVec<[NodeAddress; 6]>;

/// Read-only adapter exposing an [`SvoData`] as a graph.
#[derive(Clone, Copy, Debug)]
pub struct NavigationGraph<'a> {
  data: &'a SvoData,
}

impl<'a> NavigationGraph<'a> {
  pub fn new(data: &'a SvoData) -> Self {
    Self { data }
  }

  #[inline]
  pub fn data(&self) -> &'a SvoData {
    self.data
  }

  /// The address resolves inside this store.
  #[inline]
  pub fn is_valid(&self, address: NodeAddress) -> bool {
    self.data.is_valid_address(address)
  }

  #[inline]
  pub fn node_to_world(&self, address: NodeAddress) -> Option<Vec3> {
    self.data.node_position(address)
  }

  #[inline]
  pub fn world_to_node(&self, position: Vec3) -> Option<NodeAddress> {
    self.data.node_address_from_position(position)
  }

  /// Free cells sharing a face with `address`.
  pub fn neighbors(&self, address: NodeAddress) -> NeighborList {
    let mut out = NeighborList::new();
    let Some(node) = self.data.node(address) else {
      return out;
    };

    match self.data.leaf_of(address) {
      Some(leaf) => self.leaf_neighbors(address, node, leaf, &mut out),
      None => self.node_neighbors(node, &mut out),
    }
    out
  }

  /// Neighbors of one voxel of a leaf.
  fn leaf_neighbors(&self, address: NodeAddress, node: &Node, leaf: &Leaf, out: &mut NeighborList) {
    let coords = sub_node_coords(address.subnode_index).as_ivec3();

    for direction in Direction::ALL {
      let mut target = coords + direction.offset();

      if is_inside_leaf(target) {
        let sub_node = sub_node_index(target.as_uvec3());
        if !leaf.is_sub_node_occluded(sub_node) {
          out.push(NodeAddress::sub_node(address.node_index, sub_node));
        }
        continue;
      }

      let Some(neighbor) = node.neighbor(direction) else {
        continue;
      };
      let Some(neighbor_leaf) = self.data.leaf_of(neighbor) else {
        // Plain layer-0 node, or a coarser node without children
        out.push(neighbor);
        continue;
      };

      // Wrap the crossed axis into the neighbor leaf
      let axis = direction.axis();
      target[axis] = target[axis].rem_euclid(LEAF_EDGE as i32);
      let sub_node = sub_node_index(target.as_uvec3());
      if !neighbor_leaf.is_sub_node_occluded(sub_node) {
        out.push(NodeAddress::sub_node(neighbor.node_index, sub_node));
      }
    }
  }

  /// Neighbors of a node without a leaf, descending subdivided ones.
  fn node_neighbors(&self, node: &Node, out: &mut NeighborList) {
    for direction in Direction::ALL {
      let Some(neighbor) = node.neighbor(direction) else {
        continue;
      };
      self.collect_facing(neighbor, direction, out);
    }
  }

  /// Free cells of `neighbor` on the face seen when stepping in
  /// `direction`.
  fn collect_facing(&self, neighbor: NodeAddress, direction: Direction, out: &mut NeighborList) {
    let mut stack: SmallVec<[NodeAddress; 16]> = SmallVec::new();
    stack.push(neighbor);

    while let Some(current) = stack.pop() {
      let Some(node) = self.data.node(current) else {
        continue;
      };
      let Some(first_child) = node.first_child else {
        out.push(current);
        continue;
      };

      if current.layer == 0 {
        if let Some(leaf) = self.data.leaf(first_child.node_index) {
          out.extend(
            facing_sub_nodes(direction)
              .filter(|&sub_node| !leaf.is_sub_node_occluded(sub_node))
              .map(|sub_node| NodeAddress::sub_node(current.node_index, sub_node)),
          );
        }
        continue;
      }

      // Pushed in reverse so children pop in octant order
      for octant in facing_octants(direction).into_iter().rev() {
        stack.push(NodeAddress::new(first_child.layer, first_child.node_index + octant as NodeIndex));
      }
    }
  }
}

#[inline]
fn is_inside_leaf(coords: IVec3) -> bool {
  coords.cmpge(IVec3::ZERO).all() && coords.cmplt(IVec3::splat(LEAF_EDGE as i32)).all()
}

/// Side (0 or 1) of the near face along the crossed axis: stepping in a
/// positive direction enters through the neighbor's minimum side.
#[inline]
fn near_side(direction: Direction) -> u32 {
  if direction.is_positive() {
    0
  } else {
    1
  }
}

/// The 4 child octants touching the near face.
fn facing_octants(direction: Direction) -> [u8; 4] {
  let bit = 1u8 << direction.axis();
  let wanted = if near_side(direction) == 0 { 0 } else { bit };
  let mut octants = [0u8; 4];
  let mut count = 0;
  for octant in 0..8u8 {
    if octant & bit == wanted {
      octants[count] = octant;
      count += 1;
    }
  }
  octants
}

/// The 16 leaf voxels touching the near face.
fn facing_sub_nodes(direction: Direction) -> impl Iterator<Item = SubNodeIndex> {
  let axis = direction.axis();
  let layer = near_side(direction) * (LEAF_EDGE - 1);
  (0..LEAF_EDGE * LEAF_EDGE).map(move |i| {
    let (u, v) = (i % LEAF_EDGE, i / LEAF_EDGE);
    let coords = match axis {
      0 => [layer, u, v],
      1 => [u, layer, v],
      _ => [u, v, layer],
    };
    sub_node_index(coords.into())
  })
}

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;
