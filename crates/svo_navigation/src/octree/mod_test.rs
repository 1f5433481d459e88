use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::*;
use crate::test_utils::*;
use crate::types::{NodeAddress, LEAF_SUB_NODE_COUNT};

// =========================================================================
// Position -> address
// =========================================================================

/// With nothing to avoid, the root covers every point.
#[test]
fn test_empty_volume_resolves_to_root() {
  let data = empty_volume();
  let root = NodeAddress::new(2, 0);

  for point in [Vec3::ZERO, Vec3::splat(-31.0), Vec3::new(20.0, -5.0, 31.9)] {
    assert_eq!(data.node_address_from_position(point), Some(root));
  }
  assert_eq!(data.node_position(root), Some(Vec3::ZERO));
  assert_eq!(data.node_size(root), Some(64.0));
}

#[test]
fn test_outside_navigation_bounds() {
  let data = wall_volume();
  assert!(data.node_address_from_position(Vec3::new(40.0, 0.0, 0.0)).is_none());
  assert!(data.node_address_from_position(Vec3::new(0.0, -32.5, 0.0)).is_none());
}

#[test]
fn test_occluded_voxel_resolves_to_none() {
  let data = wall_volume();
  assert!(data.node_address_from_position(Vec3::new(1.0, -10.0, 5.0)).is_none());
  assert!(data.node_address_from_position(Vec3::new(-2.0, 10.0, -30.0)).is_none());
  // Above the wall the same column is free
  assert!(data.node_address_from_position(Vec3::new(1.0, 20.0, 5.0)).is_some());
}

/// A point beside the wall resolves to the voxel of its leaf.
#[test]
fn test_free_voxel_inside_leaf() {
  let data = wall_volume();
  let address = data.node_address_from_position(Vec3::new(-10.0, -10.0, 5.0)).unwrap();

  assert_eq!(address.layer, 0);
  assert!(data.is_sub_node_address(address));
  assert_eq!(data.node_size(address), Some(4.0));
  assert_eq!(data.node_position(address), Some(Vec3::new(-10.0, -10.0, 6.0)));
  assert!(!data.leaf_of(address).unwrap().is_sub_node_occluded(address.subnode_index));
}

/// Away from the wall a point resolves to a plain layer-0 node.
#[test]
fn test_free_layer_zero_node() {
  let data = wall_volume();
  let address = data.node_address_from_position(Vec3::new(-20.0, 20.0, 0.0)).unwrap();

  assert_eq!(address.layer, 0);
  assert_eq!(address.subnode_index, 0);
  assert!(!data.is_sub_node_address(address));
  assert_eq!(data.node_size(address), Some(16.0));
  assert_eq!(data.node_position(address), Some(Vec3::new(-24.0, 24.0, 8.0)));
}

/// Every free cell's center resolves back to that cell.
#[test]
fn test_free_cell_centers_round_trip() {
  for data in [wall_volume(), build(&octant_occluders()), empty_volume()] {
    for address in data.free_nodes() {
      let center = data.node_position(address).unwrap();
      assert_eq!(data.node_address_from_position(center), Some(address));
    }
  }
}

// =========================================================================
// Free space
// =========================================================================

/// Free cells and occluded voxels tile the navigation cube exactly.
#[test]
fn test_free_nodes_tile_the_volume() {
  let data = wall_volume();
  let free_volume: f32 = data
    .free_nodes()
    .into_iter()
    .map(|address| data.node_size(address).unwrap().powi(3))
    .sum();
  let occluded_voxels: u32 = data.leaves().iter().map(|leaf| leaf.occluded_count()).sum();

  assert_eq!(free_volume + occluded_voxels as f32 * 64.0, 64.0f32.powi(3));
}

#[test]
fn test_free_nodes_below_single_leaf() {
  let data = wall_volume();
  let address = data.node_address_from_position(Vec3::new(-10.0, -10.0, 5.0)).unwrap();
  let leaf = data.leaf_of(address).unwrap();

  let mut out = Vec::new();
  data.free_nodes_below(address.node(), &mut out);
  assert_eq!(out.len(), LEAF_SUB_NODE_COUNT - leaf.occluded_count() as usize);
  assert!(out.iter().all(|free| free.node() == address.node()));
}

#[test]
fn test_random_navigable_point() {
  let data = wall_volume();
  let mut rng = StdRng::seed_from_u64(7);

  for _ in 0..200 {
    let (point, address) = data.random_navigable_point(&mut rng).unwrap();
    assert!(data.node_bounds(address).unwrap().contains_point(point));
    assert!(data.navigation_bounds().contains_point(point));
  }

  let degenerate = crate::generation::generate(
    crate::bounds::Aabb::cube(Vec3::ZERO, 8.0),
    &scenario_settings(),
    &wall_occluders(),
  )
  .unwrap();
  assert!(degenerate.random_navigable_point(&mut rng).is_none());
}

// =========================================================================
// Addresses and layers
// =========================================================================

#[test]
fn test_address_validity() {
  let data = wall_volume();
  let leaf_node = data.node_address_from_position(Vec3::new(-10.0, -10.0, 5.0)).unwrap().node();
  let plain_node = data.node_address_from_position(Vec3::new(-20.0, 20.0, 0.0)).unwrap();

  assert!(data.is_valid_address(NodeAddress::sub_node(leaf_node.node_index, 63)));
  assert!(data.is_valid_address(plain_node));
  assert!(!data.is_valid_address(NodeAddress::sub_node(plain_node.node_index, 1)));
  assert!(!data.is_valid_address(NodeAddress::sub_node(leaf_node.node_index, 64)));
  assert!(!data.is_valid_address(NodeAddress::new(0, 64)));
  assert!(!data.is_valid_address(NodeAddress::new(3, 0)));
  assert!(!data.is_valid_address(NodeAddress::INVALID));
}

#[test]
fn test_layer_ratios() {
  let data = wall_volume();
  assert_eq!(data.top_layer(), Some(2));
  assert_eq!(data.layer_ratio(0), 0.0);
  assert_eq!(data.layer_inverse_ratio(0), 1.0);
  assert!((data.layer_ratio(2) - 2.0 / 3.0).abs() < 1e-6);
  assert!((data.layer_inverse_ratio(2) - 1.0 / 3.0).abs() < 1e-6);

  let degenerate = Layer::new(1, 1.0);
  assert!(degenerate.is_empty());
}
