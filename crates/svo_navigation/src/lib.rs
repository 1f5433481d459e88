//! svo_navigation - Sparse voxel octree navigation for flying agents
//!
//! This crate builds a layered sparse voxel octree from a collision oracle
//! and runs path searches over it. Open space is covered by a few coarse
//! cells, detail is only spent around geometry, and the finest level packs
//! 4x4x4 voxels into one 64-bit mask.
//!
//! # Features
//!
//! - **Generation**: rasterize a volume against any [`OcclusionOracle`],
//!   with optional agent clearance; many volumes in parallel with
//!   [`BatchGenerator`]
//! - **Searches**: A*, Theta* and Lazy Theta*, driven one step at a time
//!   or time-sliced, with pluggable cost, heuristic and line-of-sight models
//! - **Line of sight**: parametric octree ray traversal down to leaf voxels
//! - **Observers**: path building and search debug infos as event sinks
//!
//! # Example
//!
//! ```ignore
//! use svo_navigation::{generate, find_path, Aabb, AabbOccluders, GenerationSettings, QueryFilter};
//!
//! let occluders = AabbOccluders::new(vec![Aabb::new(wall_min, wall_max)]);
//! let data = generate(Aabb::cube(Vec3::ZERO, 64.0), &GenerationSettings::new(4.0), &occluders)?;
//!
//! let (result, path) = find_path(&data, start, end, &QueryFilter::default());
//! for location in path.locations() {
//!     // steer towards location...
//! }
//! ```

pub mod bounds;
pub mod config;
pub mod morton;
pub mod types;

// Re-export commonly used items
pub use bounds::Aabb;
pub use config::{GenerationError, GenerationSettings};
pub use types::{Direction, LayerIndex, MortonCode, NodeAddress, NodeIndex, SubNodeIndex};

// Layered octree store
pub mod octree;
pub use octree::{Leaf, Node, SvoData};

// Octree generation from an occlusion oracle
pub mod generation;
pub use generation::{
  generate, generate_with_stats, AabbOccluders, BatchGenerator, GeneratedVolume, GenerationStats, OcclusionOracle,
  VolumeId,
};

// Graph view for the searches
pub mod graph;
pub use graph::NavigationGraph;

// Line of sight
pub mod raycast;
pub use raycast::{LineOfSightModel, OctreeRaycaster, OracleLineOfSight, RaycastDebugInfos};

// Path searches
pub mod pathfinding;
pub use pathfinding::{
  find_path, find_path_with_debug, CostModel, DebugInfosObserver, Heuristic, HeuristicModel, NavigationPath,
  PathBuilder, PathFinderDebugInfos, PathFindingAlgorithm, PathFindingObserver, PathFindingParameters,
  PathFindingResult, PathFindingStepper, PathPoint, QueryFilter, StepperState, StepperStatus, TraversalCost,
};

#[cfg(test)]
pub mod test_utils;
