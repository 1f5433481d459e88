//! Test utilities: synthetic scenes and brute-force references shared by the
//! module tests.

use glam::Vec3;

use crate::bounds::Aabb;
use crate::config::GenerationSettings;
use crate::generation::{generate, AabbOccluders, OcclusionOracle};
use crate::octree::SvoData;
use crate::types::{LayerIndex, NodeAddress, NodeIndex};

// =============================================================================
// Scenario volume: 64 units, voxel 4 -> 3 layers (16, 32, 64 unit nodes)
// =============================================================================

pub fn scenario_bounds() -> Aabb {
  Aabb::cube(Vec3::ZERO, 64.0)
}

pub fn scenario_settings() -> GenerationSettings {
  GenerationSettings::new(4.0)
}

pub fn build<O: OcclusionOracle + ?Sized>(oracle: &O) -> SvoData {
  generate(scenario_bounds(), &scenario_settings(), oracle).expect("scenario generation should succeed")
}

/// Nothing occluded.
pub fn empty_volume() -> SvoData {
  build(&AabbOccluders::default())
}

/// Wall across the whole X = 0 plane except an opening for y > 16.
pub fn wall_occluders() -> AabbOccluders {
  AabbOccluders::new(vec![Aabb::new(
    Vec3::new(-4.0, -32.0, -32.0),
    Vec3::new(4.0, 16.0, 32.0),
  )])
}

pub fn wall_volume() -> SvoData {
  build(&wall_occluders())
}

/// Box filling half of the (+, +, +) octant's layer-0 cells.
pub fn octant_occluders() -> AabbOccluders {
  AabbOccluders::new(vec![Aabb::new(Vec3::splat(8.0), Vec3::splat(24.0))])
}

/// Every cell above the leaf voxels reports blocked, every voxel is free:
/// the tree is fully subdivided with empty leaves.
pub fn subdivided_free_oracle(_center: Vec3, half_extent: f32) -> bool {
  half_extent > 2.0
}

// =============================================================================
// Helpers
// =============================================================================

/// Addresses of every node record, layer 0 first.
pub fn all_node_addresses(data: &SvoData) -> Vec<NodeAddress> {
  data
    .layers()
    .iter()
    .enumerate()
    .flat_map(|(layer, nodes)| {
      (0..nodes.len()).map(move |index| NodeAddress::new(layer as LayerIndex, index as NodeIndex))
    })
    .collect()
}

/// Occupancy of a point as stored in the octree.
pub fn is_point_occluded(data: &SvoData, point: Vec3) -> bool {
  data.navigation_bounds().contains_point(point) && data.node_address_from_position(point).is_none()
}

/// Reference line-of-sight: sample the segment and look for occupied points.
pub fn sampled_line_of_sight(data: &SvoData, from: Vec3, to: Vec3, samples: usize) -> bool {
  (0..=samples).all(|i| {
    let t = i as f32 / samples as f32;
    !is_point_occluded(data, from.lerp(to, t))
  })
}
