//! Search event observers.
//!
//! A stepper notifies its observers in the order they were added. Two are
//! built in: [`PathBuilder`] turns a successful search into waypoints and
//! [`DebugInfosObserver`] records what the search did.

use glam::Vec3;

use super::path::NavigationPath;
use super::search::{SearchNode, SearchNodeIndex, SearchNodePool};
use super::stepper::{PathFindingResult, FATAL_PATH_LENGTH};
use super::PathFindingParameters;
use crate::types::NodeAddress;

/// Read-only view of a running search, handed to observers.
pub struct SearchContext<'s, 'a> {
  pub(crate) parameters: &'s PathFindingParameters<'a>,
  pub(crate) pool: &'s SearchNodePool,
  pub(crate) best: Option<SearchNodeIndex>,
}

impl<'a> SearchContext<'_, 'a> {
  #[inline]
  pub fn parameters(&self) -> &PathFindingParameters<'a> {
    self.parameters
  }

  #[inline]
  pub fn search_node(&self, index: SearchNodeIndex) -> Option<&SearchNode> {
    self.pool.get(index)
  }

  /// Chain from the start to the closest node reached so far.
  pub fn best_node_addresses(&self) -> Vec<NodeAddress> {
    self
      .best
      .and_then(|best| self.pool.address_chain(best, FATAL_PATH_LENGTH))
      .unwrap_or_default()
  }

  /// World position of a cell, or of the start location for
  /// [`NodeAddress::INVALID`].
  fn location(&self, address: NodeAddress) -> Vec3 {
    self
      .parameters
      .data
      .node_position(address)
      .unwrap_or(self.parameters.start_location)
  }
}

/// Receives search events. Every method defaults to doing nothing.
pub trait PathFindingObserver {
  /// A node was popped from the open list and is about to be expanded.
  fn on_process_single_node(&mut self, _context: &SearchContext<'_, '_>, _node: &SearchNode) {}

  /// `neighbor` was reached from `from` with `cost`, which did not improve
  /// it.
  fn on_process_neighbor(&mut self, _context: &SearchContext<'_, '_>, _from: &SearchNode, _neighbor: NodeAddress, _cost: f32) {}

  /// `neighbor` got a cheaper route; its parent and costs are updated.
  fn on_neighbor_improved(&mut self, _context: &SearchContext<'_, '_>, _neighbor: &SearchNode) {}

  /// The goal was reached; `addresses` runs from start to goal.
  fn on_search_success(&mut self, _context: &SearchContext<'_, '_>, _addresses: &[NodeAddress]) {}

  /// The search ended without a path.
  fn on_search_failed(&mut self, _context: &SearchContext<'_, '_>, _result: PathFindingResult) {}
}

// =============================================================================
// Path builder
// =============================================================================

/// Builds the waypoint path of a successful search.
#[derive(Debug, Default)]
pub struct PathBuilder {
  path: NavigationPath,
}

impl PathBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn path(&self) -> &NavigationPath {
    &self.path
  }

  pub fn into_path(self) -> NavigationPath {
    self.path
  }
}

impl PathFindingObserver for PathBuilder {
  fn on_search_success(&mut self, context: &SearchContext<'_, '_>, addresses: &[NodeAddress]) {
    let parameters = context.parameters();
    self.path = NavigationPath::from_addresses(parameters, addresses, Some(parameters.end_location));
  }
}

// =============================================================================
// Debug infos
// =============================================================================

/// One edge looked at by the search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessedEdge {
  /// [`NodeAddress::INVALID`] when leaving the start location.
  pub from: NodeAddress,
  pub from_location: Vec3,
  pub to: NodeAddress,
  pub to_location: Vec3,
  pub cost: f32,
  /// The edge lowered the cost of `to`.
  pub is_improvement: bool,
}

/// What a search did, for inspection and visualization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathFinderDebugInfos {
  /// Nodes expanded.
  pub iterations: u32,
  /// Neighbor edges evaluated.
  pub visited_nodes: u32,
  /// Edge into the node expanded last.
  pub last_processed_single_node: Option<ProcessedEdge>,
  /// Edges evaluated while expanding that node.
  pub processed_neighbors: Vec<ProcessedEdge>,
  /// Best path so far; the final path once the search succeeded.
  pub current_best_path: NavigationPath,
  pub path_segment_count: usize,
  pub path_length: f32,
  pub result: Option<PathFindingResult>,
}

/// Fills a [`PathFinderDebugInfos`].
#[derive(Debug, Default)]
pub struct DebugInfosObserver {
  infos: PathFinderDebugInfos,
}

impl DebugInfosObserver {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn infos(&self) -> &PathFinderDebugInfos {
    &self.infos
  }

  pub fn into_infos(self) -> PathFinderDebugInfos {
    self.infos
  }
}

impl PathFindingObserver for DebugInfosObserver {
  fn on_process_single_node(&mut self, context: &SearchContext<'_, '_>, node: &SearchNode) {
    self.infos.last_processed_single_node = Some(ProcessedEdge {
      from: node.parent_address,
      from_location: context.location(node.parent_address),
      to: node.address,
      to_location: context.location(node.address),
      cost: node.total_cost,
      is_improvement: true,
    });
    self.infos.processed_neighbors.clear();
    self.infos.iterations += 1;

    let addresses = context.best_node_addresses();
    self.infos.current_best_path = NavigationPath::from_addresses(context.parameters(), &addresses, None);
  }

  fn on_process_neighbor(&mut self, context: &SearchContext<'_, '_>, from: &SearchNode, neighbor: NodeAddress, cost: f32) {
    self.infos.processed_neighbors.push(ProcessedEdge {
      from: from.address,
      from_location: context.location(from.address),
      to: neighbor,
      to_location: context.location(neighbor),
      cost,
      is_improvement: false,
    });
    self.infos.visited_nodes += 1;
  }

  fn on_neighbor_improved(&mut self, context: &SearchContext<'_, '_>, neighbor: &SearchNode) {
    self.infos.processed_neighbors.push(ProcessedEdge {
      from: neighbor.parent_address,
      from_location: context.location(neighbor.parent_address),
      to: neighbor.address,
      to_location: context.location(neighbor.address),
      cost: neighbor.total_cost,
      is_improvement: true,
    });
    self.infos.visited_nodes += 1;
  }

  fn on_search_success(&mut self, context: &SearchContext<'_, '_>, addresses: &[NodeAddress]) {
    let parameters = context.parameters();
    let path = NavigationPath::from_addresses(parameters, addresses, Some(parameters.end_location));
    self.infos.path_segment_count = path.len();
    self.infos.path_length = path.length();
    self.infos.current_best_path = path;
    self.infos.result = Some(PathFindingResult::Success);
  }

  fn on_search_failed(&mut self, _context: &SearchContext<'_, '_>, result: PathFindingResult) {
    self.infos.result = Some(result);
  }
}
