//! Waypoint output of a search.

use glam::Vec3;

use super::PathFindingParameters;
use crate::types::NodeAddress;

/// One waypoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
  pub location: Vec3,
  /// Traversal cost of the segment ending here; 0 for the first point.
  pub cost: f32,
}

/// World-space waypoints from the query start to the query end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavigationPath {
  points: Vec<PathPoint>,
}

impl NavigationPath {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_points(points: Vec<PathPoint>) -> Self {
    Self { points }
  }

  /// Waypoints for a chain of cells `[start, .., last]`.
  ///
  /// The literal start location replaces the start cell's center. With
  /// `end_location` set it replaces the last cell's center too; otherwise
  /// every cell after the start contributes its center.
  pub fn from_addresses(
    parameters: &PathFindingParameters<'_>,
    addresses: &[NodeAddress],
    end_location: Option<Vec3>,
  ) -> Self {
    let mut points = Vec::with_capacity(addresses.len() + 1);
    points.push(PathPoint {
      location: parameters.start_location,
      cost: 0.0,
    });

    let inner_end = match end_location {
      Some(_) => addresses.len().saturating_sub(1),
      None => addresses.len(),
    };
    for index in 1..inner_end {
      let Some(location) = parameters.data.node_position(addresses[index]) else {
        continue;
      };
      points.push(PathPoint {
        location,
        cost: parameters.traversal_cost(addresses[index - 1], addresses[index]),
      });
    }

    if let Some(location) = end_location {
      let cost = match addresses {
        [.., before, last] => parameters.traversal_cost(*before, *last),
        _ => 0.0,
      };
      points.push(PathPoint { location, cost });
    }

    let mut path = Self { points };
    if parameters.vertical_offset != 0.0 {
      path.apply_vertical_offset(parameters.vertical_offset);
    }
    path
  }

  #[inline]
  pub fn points(&self) -> &[PathPoint] {
    &self.points
  }

  pub fn locations(&self) -> impl Iterator<Item = Vec3> + '_ {
    self.points.iter().map(|point| point.location)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.points.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  /// Cost still ahead when standing on waypoint `index`. 0 past the end.
  pub fn cost_from_index(&self, index: usize) -> f32 {
    self.points.iter().skip(index + 1).map(|point| point.cost).sum()
  }

  /// Sum of all segment costs.
  pub fn total_cost(&self) -> f32 {
    self.cost_from_index(0)
  }

  /// Geometric length of the polyline.
  pub fn length(&self) -> f32 {
    self
      .points
      .windows(2)
      .map(|segment| segment[0].location.distance(segment[1].location))
      .sum()
  }

  /// Raise every waypoint along +Y.
  pub fn apply_vertical_offset(&mut self, offset: f32) {
    for point in &mut self.points {
      point.location.y += offset;
    }
  }

  pub fn clear(&mut self) {
    self.points.clear();
  }
}
