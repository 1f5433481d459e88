//! Path searches over a generated octree.
//!
//! A query is described by a [`QueryFilter`], resolved against a store into
//! [`PathFindingParameters`] and run by a [`PathFindingStepper`]. The
//! stepper reports what it does to [`PathFindingObserver`]s; a
//! [`PathBuilder`] turns a successful search into a [`NavigationPath`].
//!
//! ```ignore
//! let filter = QueryFilter { algorithm: PathFindingAlgorithm::ThetaStar, ..Default::default() };
//! let (result, path) = find_path(&data, start, end, &filter);
//! ```

pub mod cost;
pub mod observer;
pub mod path;
pub mod search;
pub mod stepper;

use glam::Vec3;

pub use cost::{CostModel, Heuristic, HeuristicModel, TraversalCost};
pub use observer::{
  DebugInfosObserver, PathBuilder, PathFinderDebugInfos, PathFindingObserver, ProcessedEdge, SearchContext,
};
pub use path::{NavigationPath, PathPoint};
pub use search::{OpenList, SearchNode, SearchNodeIndex, SearchNodePool};
pub use stepper::{PathFindingResult, PathFindingStepper, StepperState, StepperStatus, FATAL_PATH_LENGTH};

use crate::octree::SvoData;
use crate::raycast::{LineOfSightModel, OctreeRaycaster};
use crate::types::{LayerIndex, NodeAddress};

/// Search flavor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PathFindingAlgorithm {
  #[default]
  AStar,
  /// A* with a line-of-sight shortcut to the grandparent on every edge.
  ThetaStar,
  /// Theta* checking line of sight once per expanded node.
  LazyThetaStar,
}

/// Caller-facing query options.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryFilter {
  pub algorithm: PathFindingAlgorithm,
  pub traversal_cost: TraversalCost,
  pub heuristic: Heuristic,
  /// Weight of the heuristic. Above 1 trades optimality for speed.
  pub heuristic_scale: f32,
  /// Scale costs by `1 - layer / layer_count` to favor coarse cells.
  pub use_node_size_compensation: bool,
  /// Added to the Y of every waypoint.
  pub vertical_offset: f32,
}

impl Default for QueryFilter {
  fn default() -> Self {
    Self {
      algorithm: PathFindingAlgorithm::AStar,
      traversal_cost: TraversalCost::Distance,
      heuristic: Heuristic::Euclidean,
      heuristic_scale: 1.0,
      use_node_size_compensation: false,
      vertical_offset: 0.0,
    }
  }
}

/// A query resolved against one store.
#[derive(Clone, Copy)]
pub struct PathFindingParameters<'a> {
  pub data: &'a SvoData,
  pub start_location: Vec3,
  pub end_location: Vec3,
  /// [`NodeAddress::INVALID`] when the location is outside the volume or
  /// occluded.
  pub start: NodeAddress,
  pub end: NodeAddress,
  pub cost_model: &'a dyn CostModel,
  pub heuristic_model: &'a dyn HeuristicModel,
  pub line_of_sight: &'a dyn LineOfSightModel,
  pub heuristic_scale: f32,
  pub use_node_size_compensation: bool,
  pub vertical_offset: f32,
}

impl<'a> PathFindingParameters<'a> {
  /// Resolve both locations with the filter's built-in strategies and the
  /// octree ray caster.
  pub fn new(data: &'a SvoData, start_location: Vec3, end_location: Vec3, filter: &'a QueryFilter) -> Self {
    let resolve = |location| data.node_address_from_position(location).unwrap_or(NodeAddress::INVALID);
    Self {
      data,
      start_location,
      end_location,
      start: resolve(start_location),
      end: resolve(end_location),
      cost_model: &filter.traversal_cost,
      heuristic_model: &filter.heuristic,
      line_of_sight: &OctreeRaycaster,
      heuristic_scale: filter.heuristic_scale,
      use_node_size_compensation: filter.use_node_size_compensation,
      vertical_offset: filter.vertical_offset,
    }
  }

  pub fn with_cost_model(mut self, cost_model: &'a dyn CostModel) -> Self {
    self.cost_model = cost_model;
    self
  }

  pub fn with_heuristic_model(mut self, heuristic_model: &'a dyn HeuristicModel) -> Self {
    self.heuristic_model = heuristic_model;
    self
  }

  pub fn with_line_of_sight(mut self, line_of_sight: &'a dyn LineOfSightModel) -> Self {
    self.line_of_sight = line_of_sight;
    self
  }

  #[inline]
  pub fn traversal_cost(&self, from: NodeAddress, to: NodeAddress) -> f32 {
    self.cost_model.traversal_cost(self.data, from, to)
  }

  /// Scaled heuristic.
  #[inline]
  pub fn heuristic_cost(&self, from: NodeAddress, to: NodeAddress) -> f32 {
    self.heuristic_model.heuristic_cost(self.data, from, to) * self.heuristic_scale
  }

  /// `total` scaled for a cell on `layer`, when compensation is on.
  #[inline]
  pub fn compensate(&self, total: f32, layer: LayerIndex) -> f32 {
    if self.use_node_size_compensation {
      total * self.data.layer_inverse_ratio(layer)
    } else {
      total
    }
  }

  #[inline]
  pub fn has_line_of_sight(&self, from: NodeAddress, to: NodeAddress) -> bool {
    self.line_of_sight.has_line_of_sight_between(self.data, from, to)
  }
}

/// Run a search to completion.
///
/// The path is empty unless the result is [`PathFindingResult::Success`].
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pathfinding::find_path"))]
pub fn find_path(data: &SvoData, start: Vec3, end: Vec3, filter: &QueryFilter) -> (PathFindingResult, NavigationPath) {
  let parameters = PathFindingParameters::new(data, start, end, filter);
  let mut builder = PathBuilder::new();
  let result = {
    let mut stepper = PathFindingStepper::new(parameters, filter.algorithm).with_observer(&mut builder);
    stepper.run()
  };
  (result, builder.into_path())
}

/// [`find_path`], also recording what the search did.
pub fn find_path_with_debug(
  data: &SvoData,
  start: Vec3,
  end: Vec3,
  filter: &QueryFilter,
) -> (PathFindingResult, NavigationPath, PathFinderDebugInfos) {
  let parameters = PathFindingParameters::new(data, start, end, filter);
  let mut builder = PathBuilder::new();
  let mut debug = DebugInfosObserver::new();
  let result = {
    let mut stepper = PathFindingStepper::new(parameters, filter.algorithm)
      .with_observer(&mut builder)
      .with_observer(&mut debug);
    stepper.run()
  };
  (result, builder.into_path(), debug.into_infos())
}
