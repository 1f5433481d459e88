//! Line-of-sight queries.
//!
//! The Theta* family asks whether two node centers see each other. Two
//! models are provided:
//!
//! - [`OctreeRaycaster`]: walks the octree itself (parametric octant
//!   traversal, down to leaf voxels). Needs nothing but the store.
//! - [`OracleLineOfSight`]: sweeps boxes along the segment against an
//!   [`OcclusionOracle`](crate::generation::OcclusionOracle), for callers
//!   whose collision world is finer than the octree.

pub mod octree_traversal;
pub mod oracle_trace;

use glam::Vec3;

use crate::octree::SvoData;
use crate::types::NodeAddress;

pub use octree_traversal::{OctreeRaycaster, RaycastDebugInfos, TraversedNode};
pub use oracle_trace::OracleLineOfSight;

/// Answers "is the segment between two points unobstructed?".
pub trait LineOfSightModel: Send + Sync {
  fn has_line_of_sight(&self, data: &SvoData, from: Vec3, to: Vec3) -> bool;

  /// Line of sight between two cell centers. Unresolvable addresses never
  /// see anything.
  fn has_line_of_sight_between(&self, data: &SvoData, from: NodeAddress, to: NodeAddress) -> bool {
    match (data.node_position(from), data.node_position(to)) {
      (Some(from), Some(to)) => self.has_line_of_sight(data, from, to),
      _ => false,
    }
  }
}
