//! Edge cost and heuristic strategies.

use crate::octree::SvoData;
use crate::types::NodeAddress;

/// Cost of moving between two cells.
pub trait CostModel: Send + Sync {
  fn traversal_cost(&self, data: &SvoData, from: NodeAddress, to: NodeAddress) -> f32;
}

/// Estimate of the remaining cost from a cell to the goal.
pub trait HeuristicModel: Send + Sync {
  fn heuristic_cost(&self, data: &SvoData, from: NodeAddress, to: NodeAddress) -> f32;
}

/// Built-in edge costs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TraversalCost {
  /// Distance between cell centers.
  #[default]
  Distance,
  /// Same cost for every hop.
  Fixed(f32),
}

impl TraversalCost {
  /// One unit per hop.
  pub const UNIT: Self = Self::Fixed(1.0);
}

impl CostModel for TraversalCost {
  fn traversal_cost(&self, data: &SvoData, from: NodeAddress, to: NodeAddress) -> f32 {
    match *self {
      TraversalCost::Distance => match centers(data, from, to) {
        Some((from, to)) => from.distance(to),
        None => f32::INFINITY,
      },
      TraversalCost::Fixed(cost) => cost,
    }
  }
}

/// Built-in heuristics over cell centers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Heuristic {
  Manhattan,
  #[default]
  Euclidean,
}

impl HeuristicModel for Heuristic {
  fn heuristic_cost(&self, data: &SvoData, from: NodeAddress, to: NodeAddress) -> f32 {
    let Some((from, to)) = centers(data, from, to) else {
      return f32::INFINITY;
    };
    match self {
      Heuristic::Manhattan => (to - from).abs().element_sum(),
      Heuristic::Euclidean => from.distance(to),
    }
  }
}

#[inline]
fn centers(data: &SvoData, from: NodeAddress, to: NodeAddress) -> Option<(glam::Vec3, glam::Vec3)> {
  Some((data.node_position(from)?, data.node_position(to)?))
}

#[cfg(test)]
mod tests {
  use glam::Vec3;

  use super::*;
  use crate::test_utils::*;

  fn two_cells() -> (SvoData, NodeAddress, NodeAddress) {
    let data = wall_volume();
    let a = data.node_address_from_position(Vec3::new(-24.0, 24.0, 8.0)).unwrap();
    let b = data.node_address_from_position(Vec3::new(24.0, -24.0, 8.0)).unwrap();
    (data, a, b)
  }

  #[test]
  fn test_distance_cost() {
    let (data, a, b) = two_cells();
    assert_eq!(TraversalCost::Distance.traversal_cost(&data, a, b), Vec3::new(48.0, -48.0, 0.0).length());
    assert_eq!(TraversalCost::Distance.traversal_cost(&data, a, a), 0.0);
    assert_eq!(TraversalCost::Distance.traversal_cost(&data, a, NodeAddress::INVALID), f32::INFINITY);
  }

  #[test]
  fn test_fixed_cost() {
    let (data, a, b) = two_cells();
    assert_eq!(TraversalCost::UNIT.traversal_cost(&data, a, b), 1.0);
    assert_eq!(TraversalCost::Fixed(2.5).traversal_cost(&data, a, b), 2.5);
  }

  #[test]
  fn test_heuristics() {
    let (data, a, b) = two_cells();
    assert_eq!(Heuristic::Manhattan.heuristic_cost(&data, a, b), 96.0);
    assert_eq!(Heuristic::Euclidean.heuristic_cost(&data, a, b), Vec3::new(48.0, 48.0, 0.0).length());
    assert!(Heuristic::Manhattan.heuristic_cost(&data, a, b) >= Heuristic::Euclidean.heuristic_cost(&data, a, b));
    assert_eq!(Heuristic::Euclidean.heuristic_cost(&data, NodeAddress::INVALID, b), f32::INFINITY);
  }

  #[test]
  fn test_defaults() {
    assert_eq!(TraversalCost::default(), TraversalCost::Distance);
    assert_eq!(Heuristic::default(), Heuristic::Euclidean);
  }
}
