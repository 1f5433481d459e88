//! Steppable A* / Theta* / Lazy Theta* search.
//!
//! ```text
//!   Init ──► ProcessNode ◄──────────┐
//!                │                  │ last neighbor
//!                ▼                  │
//!           ProcessNeighbor ────────┘
//!                │
//!   goal popped / open list empty / invalid endpoints
//!                ▼
//!              Ended
//! ```
//!
//! Each [`step`](PathFindingStepper::step) expands one node or evaluates one
//! neighbor edge, so a caller can spread a search over frames or stop to
//! inspect it.

use std::time::Duration;

use web_time::Instant;

use super::observer::{PathFindingObserver, SearchContext};
use super::path::NavigationPath;
use super::search::{OpenList, SearchNode, SearchNodeIndex, SearchNodePool};
use super::{PathFindingAlgorithm, PathFindingParameters};
use crate::graph::{NavigationGraph, NeighborList};
use crate::types::NodeAddress;

/// Longest parent chain unwound into a path. Longer chains are cyclic.
pub const FATAL_PATH_LENGTH: usize = 10_000;

/// How a finished search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathFindingResult {
  Success,
  /// Start or end does not resolve to a free cell.
  Fail,
  /// Every reachable cell was expanded without finding the goal.
  GoalUnreachable,
  /// The parent chain of the goal is cyclic.
  InfiniteLoop,
}

/// Returned by every step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepperStatus {
  MustContinue,
  IsStopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepperState {
  Init,
  ProcessNode,
  ProcessNeighbor,
  Ended,
}

/// One search, advanced by the caller.
///
/// Borrows the store for its whole lifetime; the store must not be
/// regenerated while a stepper uses it.
pub struct PathFindingStepper<'a> {
  parameters: PathFindingParameters<'a>,
  algorithm: PathFindingAlgorithm,
  graph: NavigationGraph<'a>,
  observers: Vec<&'a mut (dyn PathFindingObserver + 'a)>,

  state: StepperState,
  pool: SearchNodePool,
  open_list: OpenList,
  current: Option<SearchNodeIndex>,
  neighbors: NeighborList,
  neighbor_cursor: usize,

  /// Closest node to the goal by heuristic; the goal once reached.
  best: Option<SearchNodeIndex>,
  best_heuristic: f32,
  result: Option<PathFindingResult>,

  iterations: u32,
  line_of_sight_checks: u32,
}

impl<'a> PathFindingStepper<'a> {
  pub fn new(parameters: PathFindingParameters<'a>, algorithm: PathFindingAlgorithm) -> Self {
    Self {
      graph: NavigationGraph::new(parameters.data),
      parameters,
      algorithm,
      observers: Vec::new(),
      state: StepperState::Init,
      pool: SearchNodePool::new(),
      open_list: OpenList::new(),
      current: None,
      neighbors: NeighborList::new(),
      neighbor_cursor: 0,
      best: None,
      best_heuristic: f32::INFINITY,
      result: None,
      iterations: 0,
      line_of_sight_checks: 0,
    }
  }

  /// Observers are notified in the order they were added.
  pub fn add_observer(&mut self, observer: &'a mut (dyn PathFindingObserver + 'a)) {
    self.observers.push(observer);
  }

  pub fn with_observer(mut self, observer: &'a mut (dyn PathFindingObserver + 'a)) -> Self {
    self.add_observer(observer);
    self
  }

  // =========================================================================
  // Accessors
  // =========================================================================

  #[inline]
  pub fn parameters(&self) -> &PathFindingParameters<'a> {
    &self.parameters
  }

  #[inline]
  pub fn algorithm(&self) -> PathFindingAlgorithm {
    self.algorithm
  }

  #[inline]
  pub fn state(&self) -> StepperState {
    self.state
  }

  /// Set once the stepper has stopped.
  #[inline]
  pub fn result(&self) -> Option<PathFindingResult> {
    self.result
  }

  /// Nodes expanded so far.
  #[inline]
  pub fn iterations(&self) -> u32 {
    self.iterations
  }

  /// Line-of-sight queries made by the Theta* variants.
  #[inline]
  pub fn line_of_sight_checks(&self) -> u32 {
    self.line_of_sight_checks
  }

  #[inline]
  pub fn pool(&self) -> &SearchNodePool {
    &self.pool
  }

  pub fn search_node(&self, address: NodeAddress) -> Option<&SearchNode> {
    self.pool.find(address).and_then(|index| self.pool.get(index))
  }

  /// Chain from the start to the goal, or to the closest node reached when
  /// the goal was not.
  pub fn best_node_addresses(&self) -> Vec<NodeAddress> {
    self.best_chain().unwrap_or_default()
  }

  fn best_chain(&self) -> Option<Vec<NodeAddress>> {
    let best = self.best?;
    self.pool.address_chain(best, FATAL_PATH_LENGTH)
  }

  /// Waypoints towards the closest node reached, for searches that could
  /// not reach the goal.
  pub fn partial_path(&self) -> NavigationPath {
    let addresses = self.best_node_addresses();
    if addresses.is_empty() {
      return NavigationPath::new();
    }
    NavigationPath::from_addresses(&self.parameters, &addresses, None)
  }

  // =========================================================================
  // Driving
  // =========================================================================

  /// Advance by one unit of work.
  pub fn step(&mut self) -> StepperStatus {
    match self.state {
      StepperState::Init => self.init(),
      StepperState::ProcessNode => self.process_node(),
      StepperState::ProcessNeighbor => self.process_neighbor(),
      StepperState::Ended => StepperStatus::IsStopped,
    }
  }

  /// Step until stopped or until `budget` is spent. Always steps once.
  pub fn step_for(&mut self, budget: Duration) -> StepperStatus {
    let start = Instant::now();
    loop {
      let status = self.step();
      if status == StepperStatus::IsStopped || start.elapsed() >= budget {
        return status;
      }
    }
  }

  /// Step to completion.
  #[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "pathfinding::run"))]
  pub fn run(&mut self) -> PathFindingResult {
    while self.step() == StepperStatus::MustContinue {}
    self.result.unwrap_or(PathFindingResult::Fail)
  }

  // =========================================================================
  // States
  // =========================================================================

  fn init(&mut self) -> StepperStatus {
    let (start, end) = (self.parameters.start, self.parameters.end);
    if !self.graph.is_valid(start) || !self.graph.is_valid(end) {
      return self.finish(PathFindingResult::Fail);
    }

    self.pool.clear();
    self.open_list.clear();

    let heuristic = if start == end {
      0.0
    } else {
      self.parameters.heuristic_cost(start, end)
    };
    let index = self.pool.find_or_add(start);
    let node = &mut self.pool[index];
    node.traversal_cost = 0.0;
    node.total_cost = self.parameters.compensate(heuristic, start.layer);
    node.is_open = true;
    self.open_list.push(node);

    self.best = Some(index);
    self.best_heuristic = heuristic;

    if start == end {
      return self.finish(PathFindingResult::Success);
    }

    self.state = StepperState::ProcessNode;
    StepperStatus::MustContinue
  }

  fn process_node(&mut self) -> StepperStatus {
    let Some(index) = self.open_list.pop(&self.pool) else {
      return self.finish(PathFindingResult::GoalUnreachable);
    };
    self.iterations += 1;

    let node = &mut self.pool[index];
    node.is_closed = true;
    node.is_open = false;

    if self.algorithm == PathFindingAlgorithm::LazyThetaStar {
      self.update_lazy_parent(index);
    }

    let node = self.pool[index];
    if node.address == self.parameters.end {
      self.best = Some(index);
      self.best_heuristic = 0.0;
      return self.finish(PathFindingResult::Success);
    }

    self.neighbors = self.graph.neighbors(node.address);
    self.neighbor_cursor = 0;
    self.current = Some(index);
    self.state = StepperState::ProcessNeighbor;

    self.notify(|observer, context| observer.on_process_single_node(context, &node));
    StepperStatus::MustContinue
  }

  fn process_neighbor(&mut self) -> StepperStatus {
    let (Some(current_index), Some(&neighbor_address)) = (self.current, self.neighbors.get(self.neighbor_cursor)) else {
      self.state = StepperState::ProcessNode;
      return StepperStatus::MustContinue;
    };
    self.neighbor_cursor += 1;
    if self.neighbor_cursor >= self.neighbors.len() {
      self.state = StepperState::ProcessNode;
    }

    let current = self.pool[current_index];
    if !self.graph.is_valid(neighbor_address)
      || neighbor_address == current.address
      || neighbor_address == current.parent_address
    {
      return StepperStatus::MustContinue;
    }

    let neighbor_index = self.pool.find_or_add(neighbor_address);
    if self.pool[neighbor_index].is_closed {
      return StepperStatus::MustContinue;
    }

    let (parent_index, traversal_cost) = self.route_to(&current, neighbor_address);
    let end = self.parameters.end;
    let heuristic = if neighbor_address == end {
      0.0
    } else {
      self.parameters.heuristic_cost(neighbor_address, end)
    };
    let total_cost = self
      .parameters
      .compensate(traversal_cost + heuristic, neighbor_address.layer);

    if total_cost >= self.pool[neighbor_index].total_cost {
      self.notify(|observer, context| observer.on_process_neighbor(context, &current, neighbor_address, total_cost));
      return StepperStatus::MustContinue;
    }

    let parent_address = self.pool[parent_index].address;
    let neighbor = &mut self.pool[neighbor_index];
    neighbor.traversal_cost = traversal_cost;
    neighbor.total_cost = total_cost;
    neighbor.parent_index = Some(parent_index);
    neighbor.parent_address = parent_address;
    neighbor.is_open = true;
    let neighbor = *neighbor;
    self.open_list.push(&neighbor);

    self.notify(|observer, context| observer.on_neighbor_improved(context, &neighbor));

    if heuristic < self.best_heuristic {
      self.best_heuristic = heuristic;
      self.best = Some(neighbor_index);
    }
    StepperStatus::MustContinue
  }

  /// Parent and traversal cost `neighbor` would get from `current`.
  fn route_to(&mut self, current: &SearchNode, neighbor: NodeAddress) -> (SearchNodeIndex, f32) {
    let direct = (
      current.index,
      current.traversal_cost + self.parameters.traversal_cost(current.address, neighbor),
    );
    let Some(parent_index) = current.parent_index else {
      return direct;
    };
    let parent = self.pool[parent_index];
    let via_parent = (
      parent_index,
      parent.traversal_cost + self.parameters.traversal_cost(parent.address, neighbor),
    );

    match self.algorithm {
      PathFindingAlgorithm::AStar => direct,
      PathFindingAlgorithm::ThetaStar => {
        self.line_of_sight_checks += 1;
        if self.parameters.has_line_of_sight(parent.address, neighbor) {
          via_parent
        } else {
          direct
        }
      }
      // Checked when the neighbor is expanded
      PathFindingAlgorithm::LazyThetaStar => via_parent,
    }
  }

  /// Lazy Theta*: a node assumed to see its parent that does not gets the
  /// cheapest closed neighbor as parent instead.
  fn update_lazy_parent(&mut self, index: SearchNodeIndex) {
    let node = self.pool[index];
    let Some(parent_index) = node.parent_index else {
      return;
    };

    self.line_of_sight_checks += 1;
    if self.parameters.has_line_of_sight(self.pool[parent_index].address, node.address) {
      return;
    }

    let mut best: Option<(SearchNodeIndex, f32)> = None;
    for neighbor in self.graph.neighbors(node.address) {
      let Some(candidate_index) = self.pool.find(neighbor) else {
        continue;
      };
      let candidate = self.pool[candidate_index];
      if !candidate.is_closed || candidate_index == index {
        continue;
      }
      let cost = candidate.traversal_cost + self.parameters.traversal_cost(candidate.address, node.address);
      if best.map_or(true, |(_, best_cost)| cost < best_cost) {
        best = Some((candidate_index, cost));
      }
    }
    let Some((parent_index, traversal_cost)) = best else {
      return;
    };

    let end = self.parameters.end;
    let heuristic = if node.address == end {
      0.0
    } else {
      self.parameters.heuristic_cost(node.address, end)
    };
    let total_cost = self.parameters.compensate(traversal_cost + heuristic, node.address.layer);
    let parent_address = self.pool[parent_index].address;

    let node = &mut self.pool[index];
    node.parent_index = Some(parent_index);
    node.parent_address = parent_address;
    node.traversal_cost = traversal_cost;
    node.total_cost = total_cost;
  }

  /// Enter `Ended`, unwind the path on success and notify observers.
  fn finish(&mut self, result: PathFindingResult) -> StepperStatus {
    self.state = StepperState::Ended;
    self.current = None;
    self.neighbors.clear();

    let result = match result {
      PathFindingResult::Success => match self.best_chain() {
        Some(addresses) => {
          self.notify(|observer, context| observer.on_search_success(context, &addresses));
          PathFindingResult::Success
        }
        None => PathFindingResult::InfiniteLoop,
      },
      other => other,
    };
    if result != PathFindingResult::Success {
      self.notify(|observer, context| observer.on_search_failed(context, result));
    }
    self.result = Some(result);

    #[cfg(feature = "tracing")]
    tracing::debug!(
      ?result,
      algorithm = ?self.algorithm,
      iterations = self.iterations,
      line_of_sight_checks = self.line_of_sight_checks,
      pool_size = self.pool.len(),
      "path search ended"
    );

    StepperStatus::IsStopped
  }

  fn notify(&mut self, mut event: impl FnMut(&mut (dyn PathFindingObserver + 'a), &SearchContext<'_, 'a>)) {
    if self.observers.is_empty() {
      return;
    }
    let context = SearchContext {
      parameters: &self.parameters,
      pool: &self.pool,
      best: self.best,
    };
    for observer in self.observers.iter_mut() {
      event(&mut **observer, &context);
    }
  }
}

#[cfg(test)]
#[path = "stepper_test.rs"]
mod stepper_test;
