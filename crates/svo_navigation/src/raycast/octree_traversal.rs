//! Octree ray traversal for line of sight.
//!
//! Parametric top-down walk (Revelles, Ureña, Lastra): the segment is
//! mirrored so every direction component is positive, each node is entered
//! with its slab parameters `t0`/`t1`, and children are visited in the order
//! the segment crosses them.
//!
//! ```text
//!         t1.y ─────────────┐
//!               │  2  │  3  │
//!         tm.y  ├─────┼─────┤    ray enters child `first_node(t0, tm)`,
//!               │  0  │  1  │    then follows NEXT_NODE on the exit plane
//!         t0.y ─┴─────┴─────┘
//!             t0.x  tm.x  t1.x
//! ```
//!
//! Only the part between `from` (`t = 0`) and `to` (`t = 1`) is tested.
//! Inside partially occluded leaves the walk continues through the 4x4x4
//! voxels as two more octant levels.

use glam::{BVec3, Vec3};

use super::LineOfSightModel;
use crate::octree::{Leaf, SvoData};
use crate::types::{NodeAddress, NodeIndex, SubNodeIndex};

/// Replaces zero direction components; keeps every `t` finite.
const DIRECTION_EPSILON: f32 = 1e-6;

/// Octant reached when leaving `current` through the X, Y or Z plane.
/// 8 = the parent is exited.
const NEXT_NODE: [[u8; 3]; 8] = [
  [1, 2, 4],
  [8, 3, 5],
  [3, 8, 6],
  [8, 8, 7],
  [5, 6, 8],
  [8, 7, 8],
  [7, 8, 8],
  [8, 8, 8],
];

const EXIT: u8 = 8;

/// Line of sight through the octree itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctreeRaycaster;

/// A cell visited by a traced ray.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TraversedNode {
  pub address: NodeAddress,
  /// Subdivided node, or occluded leaf voxel.
  pub is_occluded: bool,
}

/// Everything one traced ray touched, in visit order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RaycastDebugInfos {
  pub from: Vec3,
  pub to: Vec3,
  pub is_blocked: bool,
  pub traversed_nodes: Vec<TraversedNode>,
  pub traversed_leaf_sub_nodes: Vec<TraversedNode>,
}

impl OctreeRaycaster {
  pub fn new() -> Self {
    Self
  }

  /// Whether an occluded voxel lies on the segment.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "raycast::octree"))]
  pub fn is_blocked(&self, data: &SvoData, from: Vec3, to: Vec3) -> bool {
    trace(data, from, to, None)
  }

  /// [`is_blocked`](Self::is_blocked), recording every visited cell.
  pub fn is_blocked_with_debug(&self, data: &SvoData, from: Vec3, to: Vec3, debug: &mut RaycastDebugInfos) -> bool {
    debug.from = from;
    debug.to = to;
    debug.traversed_nodes.clear();
    debug.traversed_leaf_sub_nodes.clear();
    let blocked = trace(data, from, to, Some(&mut *debug));
    debug.is_blocked = blocked;
    blocked
  }
}

impl LineOfSightModel for OctreeRaycaster {
  fn has_line_of_sight(&self, data: &SvoData, from: Vec3, to: Vec3) -> bool {
    !self.is_blocked(data, from, to)
  }
}

fn trace(data: &SvoData, from: Vec3, to: Vec3, debug: Option<&mut RaycastDebugInfos>) -> bool {
  if !data.is_navigable() {
    return false;
  }
  let Some(top) = data.top_layer() else {
    return false;
  };

  let bounds = data.navigation_bounds();
  let direction = to - from;
  if direction.length_squared() < DIRECTION_EPSILON * DIRECTION_EPSILON {
    return bounds.contains_point(from) && data.node_address_from_position(from).is_none();
  }

  // Mirror negative axes around the volume center
  let center = bounds.center();
  let mut origin = from;
  let mut direction = direction;
  let mut mirror = 0u8;
  for axis in 0..3 {
    if direction[axis] < 0.0 {
      origin[axis] = 2.0 * center[axis] - origin[axis];
      direction[axis] = -direction[axis];
      mirror |= 1 << axis;
    }
    if direction[axis] < DIRECTION_EPSILON {
      direction[axis] = DIRECTION_EPSILON;
    }
  }

  let t0 = (bounds.min - origin) / direction;
  let t1 = (bounds.max - origin) / direction;
  if t0.max_element() >= t1.min_element() || !in_segment(t0, t1) {
    return false;
  }

  let mut traversal = Traversal { data, mirror, debug };
  traversal.node_hit(NodeAddress::new(top, 0), t0, t1)
}

struct Traversal<'d> {
  data: &'d SvoData,
  mirror: u8,
  debug: Option<&'d mut RaycastDebugInfos>,
}

impl Traversal<'_> {
  fn node_hit(&mut self, address: NodeAddress, t0: Vec3, t1: Vec3) -> bool {
    if !in_segment(t0, t1) {
      return false;
    }
    let Some(node) = self.data.node(address) else {
      return false;
    };
    self.record_node(address, node.has_children());

    if address.layer == 0 {
      let Some(leaf) = self.data.leaf_of(address) else {
        return false;
      };
      if leaf.is_completely_free() {
        return false;
      }
      if leaf.is_completely_occluded() {
        return true;
      }
      return self.leaf_hit(address.node_index, *leaf, t0, t1);
    }

    let Some(first_child) = node.first_child else {
      return false;
    };

    let tm = (t0 + t1) * 0.5;
    let mut octant = first_node(t0, tm);
    while octant != EXIT {
      let (c0, c1) = child_range(octant, t0, tm, t1);
      let child = NodeAddress::new(
        first_child.layer,
        first_child.node_index + NodeIndex::from(octant ^ self.mirror),
      );
      if self.node_hit(child, c0, c1) {
        return true;
      }
      octant = next_node(octant, c1);
    }
    false
  }

  /// Two octant levels over the 4x4x4 voxels.
  fn leaf_hit(&mut self, node_index: NodeIndex, leaf: Leaf, t0: Vec3, t1: Vec3) -> bool {
    let tm = (t0 + t1) * 0.5;
    let mut octant = first_node(t0, tm);

    while octant != EXIT {
      let (o0, o1) = child_range(octant, t0, tm, t1);
      if in_segment(o0, o1) {
        let om = (o0 + o1) * 0.5;
        let mut child = first_node(o0, om);
        while child != EXIT {
          let (c0, c1) = child_range(child, o0, om, o1);
          if in_segment(c0, c1) {
            let sub_node: SubNodeIndex = ((octant ^ self.mirror) << 3) | (child ^ self.mirror);
            let occluded = leaf.is_sub_node_occluded(sub_node);
            self.record_sub_node(NodeAddress::sub_node(node_index, sub_node), occluded);
            if occluded {
              return true;
            }
          }
          child = next_node(child, c1);
        }
      }
      octant = next_node(octant, o1);
    }
    false
  }

  fn record_node(&mut self, address: NodeAddress, is_occluded: bool) {
    if let Some(debug) = self.debug.as_deref_mut() {
      debug.traversed_nodes.push(TraversedNode { address, is_occluded });
    }
  }

  fn record_sub_node(&mut self, address: NodeAddress, is_occluded: bool) {
    if let Some(debug) = self.debug.as_deref_mut() {
      debug.traversed_leaf_sub_nodes.push(TraversedNode { address, is_occluded });
    }
  }
}

/// The cell overlaps the `[0, 1]` part of the ray.
#[inline]
fn in_segment(t0: Vec3, t1: Vec3) -> bool {
  t1.min_element() >= 0.0 && t0.max_element() <= 1.0
}

/// First child crossed, from the entry plane and the mid planes.
#[inline]
fn first_node(t0: Vec3, tm: Vec3) -> u8 {
  let mut octant = 0u8;
  if t0.x > t0.y && t0.x > t0.z {
    // Entry through a YZ plane
    if tm.y < t0.x {
      octant |= 2;
    }
    if tm.z < t0.x {
      octant |= 4;
    }
  } else if t0.y > t0.z {
    // XZ plane
    if tm.x < t0.y {
      octant |= 1;
    }
    if tm.z < t0.y {
      octant |= 4;
    }
  } else {
    // XY plane
    if tm.x < t0.z {
      octant |= 1;
    }
    if tm.y < t0.z {
      octant |= 2;
    }
  }
  octant
}

/// Slab parameters of one child.
#[inline]
fn child_range(octant: u8, t0: Vec3, tm: Vec3, t1: Vec3) -> (Vec3, Vec3) {
  let upper = BVec3::new(octant & 1 != 0, octant & 2 != 0, octant & 4 != 0);
  (Vec3::select(upper, tm, t0), Vec3::select(upper, t1, tm))
}

/// Sibling entered after leaving `octant`, whose exit parameters are `t1`.
#[inline]
fn next_node(octant: u8, t1: Vec3) -> u8 {
  let exit_axis = if t1.x < t1.y && t1.x < t1.z {
    0
  } else if t1.y < t1.z {
    1
  } else {
    2
  };
  NEXT_NODE[octant as usize][exit_axis]
}

#[cfg(test)]
#[path = "octree_traversal_test.rs"]
mod octree_traversal_test;
