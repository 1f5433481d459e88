use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use glam::Vec3;

use super::*;
use crate::bounds::Aabb;
use crate::generation::AabbOccluders;
use crate::octree::SvoData;
use crate::pathfinding::{
  find_path, find_path_with_debug, CostModel, DebugInfosObserver, PathBuilder, QueryFilter, TraversalCost,
};
use crate::raycast::OracleLineOfSight;
use crate::test_utils::*;

fn filter(algorithm: PathFindingAlgorithm) -> QueryFilter {
  QueryFilter {
    algorithm,
    ..Default::default()
  }
}

/// Around the wall, over its top.
const WALL_START: Vec3 = Vec3::new(-20.0, -20.0, 0.0);
const WALL_END: Vec3 = Vec3::new(20.0, -20.0, 0.0);

/// Brute-force shortest distance over the graph edges.
fn dijkstra(data: &SvoData, start: NodeAddress, end: NodeAddress) -> f32 {
  let graph = NavigationGraph::new(data);
  let mut distances: HashMap<NodeAddress, f32> = HashMap::from([(start, 0.0)]);
  let mut settled = HashSet::new();
  loop {
    let Some((node, distance)) = distances
      .iter()
      .filter(|(address, _)| !settled.contains(*address))
      .map(|(&address, &distance)| (address, distance))
      .min_by(|a, b| a.1.total_cmp(&b.1))
    else {
      return f32::INFINITY;
    };
    if node == end {
      return distance;
    }
    settled.insert(node);
    for neighbor in graph.neighbors(node) {
      let candidate = distance + TraversalCost::Distance.traversal_cost(data, node, neighbor);
      let entry = distances.entry(neighbor).or_insert(f32::INFINITY);
      if candidate < *entry {
        *entry = candidate;
      }
    }
  }
}

/// Hollow box [8, 24]^3 with walls one voxel thick around a free core.
fn sealed_shell() -> SvoData {
  let mut boxes = Vec::new();
  for axis in 0..3 {
    for (low, high) in [(8.0, 12.0), (20.0, 24.0)] {
      let mut min = Vec3::splat(8.0);
      let mut max = Vec3::splat(24.0);
      min[axis] = low;
      max[axis] = high;
      boxes.push(Aabb::new(min, max));
    }
  }
  build(&AabbOccluders::new(boxes))
}

struct Recorder {
  id: u8,
  log: Rc<RefCell<Vec<(u8, &'static str)>>>,
}

impl PathFindingObserver for Recorder {
  fn on_process_single_node(&mut self, _context: &SearchContext<'_, '_>, _node: &SearchNode) {
    self.log.borrow_mut().push((self.id, "node"));
  }

  fn on_search_success(&mut self, _context: &SearchContext<'_, '_>, _addresses: &[NodeAddress]) {
    self.log.borrow_mut().push((self.id, "success"));
  }

  fn on_search_failed(&mut self, _context: &SearchContext<'_, '_>, _result: PathFindingResult) {
    self.log.borrow_mut().push((self.id, "failed"));
  }
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_empty_volume_is_a_straight_line() {
  let data = empty_volume();
  let start = Vec3::splat(-30.0);
  let end = Vec3::splat(30.0);
  let (result, path) = find_path(&data, start, end, &QueryFilter::default());

  assert_eq!(result, PathFindingResult::Success);
  assert_eq!(path.locations().collect::<Vec<_>>(), vec![start, end]);
  assert_eq!(path.total_cost(), 0.0);
}

#[test]
fn test_start_outside_volume_fails() {
  let data = wall_volume();
  let (result, path) = find_path(&data, Vec3::new(100.0, 0.0, 0.0), WALL_END, &QueryFilter::default());
  assert_eq!(result, PathFindingResult::Fail);
  assert!(path.is_empty());
}

#[test]
fn test_occluded_end_fails() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, WALL_START, Vec3::new(0.0, -20.0, 0.0), &filter);
  assert!(!parameters.end.is_valid());

  let mut stepper = PathFindingStepper::new(parameters, filter.algorithm);
  assert_eq!(stepper.step(), StepperStatus::IsStopped);
  assert_eq!(stepper.result(), Some(PathFindingResult::Fail));
  assert!(stepper.partial_path().is_empty());
  assert!(stepper.pool().is_empty());
}

#[test]
fn test_astar_goes_around_the_wall() {
  let data = wall_volume();
  let (result, path) = find_path(&data, WALL_START, WALL_END, &filter(PathFindingAlgorithm::AStar));

  assert_eq!(result, PathFindingResult::Success);
  assert!(path.len() >= 3);
  assert_eq!(path.points()[0].location, WALL_START);
  assert_eq!(path.points()[path.len() - 1].location, WALL_END);
  // The detour climbs over the wall top
  assert!(path.locations().any(|location| location.y > 16.0));
}

#[test]
fn test_theta_star_variants_are_not_longer() {
  let data = wall_volume();
  let (_, astar) = find_path(&data, WALL_START, WALL_END, &filter(PathFindingAlgorithm::AStar));

  for algorithm in [PathFindingAlgorithm::ThetaStar, PathFindingAlgorithm::LazyThetaStar] {
    let (result, path) = find_path(&data, WALL_START, WALL_END, &filter(algorithm));
    assert_eq!(result, PathFindingResult::Success, "{algorithm:?}");
    assert!(path.length() <= astar.length() + 1e-3, "{algorithm:?}: {} > {}", path.length(), astar.length());
    assert!(path.len() <= astar.len(), "{algorithm:?}");
    assert!(path.len() >= 3, "{algorithm:?} cannot see through the wall");
  }
}

#[test]
fn test_theta_star_with_line_of_sight_has_no_waypoints() {
  let data = wall_volume();
  let start = Vec3::new(-28.0, -28.0, -28.0);
  let end = Vec3::new(-20.0, 28.0, 28.0);

  for algorithm in [PathFindingAlgorithm::ThetaStar, PathFindingAlgorithm::LazyThetaStar] {
    let (result, path) = find_path(&data, start, end, &filter(algorithm));
    assert_eq!(result, PathFindingResult::Success);
    assert_eq!(path.locations().collect::<Vec<_>>(), vec![start, end], "{algorithm:?}");
  }
}

#[test]
fn test_line_of_sight_checks_are_counted() {
  let data = wall_volume();
  let checks = |algorithm| {
    let filter = filter(algorithm);
    let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);
    let mut stepper = PathFindingStepper::new(parameters, algorithm);
    assert_eq!(stepper.run(), PathFindingResult::Success);
    (stepper.line_of_sight_checks(), stepper.iterations())
  };

  assert_eq!(checks(PathFindingAlgorithm::AStar).0, 0);
  let (eager, _) = checks(PathFindingAlgorithm::ThetaStar);
  let (lazy, lazy_iterations) = checks(PathFindingAlgorithm::LazyThetaStar);
  assert!(eager > 0);
  // At most one check per expanded node
  assert!(lazy <= lazy_iterations);
  assert!(lazy < eager);
}

// =========================================================================
// Optimality
// =========================================================================

#[test]
fn test_astar_matches_brute_force() {
  let scenes = [
    build(&octant_occluders()),
    build(&AabbOccluders::new(vec![Aabb::new(Vec3::ZERO, Vec3::splat(16.0))])),
    wall_volume(),
  ];
  let queries = [
    (Vec3::splat(-20.0), Vec3::splat(28.0)),
    (Vec3::new(-20.0, -20.0, 6.0), Vec3::new(30.0, 2.0, 30.0)),
    (WALL_START, WALL_END),
  ];

  for (scene, data) in scenes.iter().enumerate() {
    for (start, end) in queries {
      let filter = QueryFilter::default();
      let parameters = PathFindingParameters::new(data, start, end, &filter);
      if !parameters.start.is_valid() || !parameters.end.is_valid() {
        continue;
      }

      let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar);
      assert_eq!(stepper.run(), PathFindingResult::Success);
      let found = stepper.search_node(parameters.end).unwrap().traversal_cost;
      let expected = dijkstra(data, parameters.start, parameters.end);
      assert!(
        (found - expected).abs() <= 1e-2,
        "scene {scene}, {start} -> {end}: {found} vs {expected}"
      );
    }
  }
}

// =========================================================================
// Stepping
// =========================================================================

#[test]
fn test_state_transitions() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);
  let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar);

  assert_eq!(stepper.state(), StepperState::Init);
  assert_eq!(stepper.step(), StepperStatus::MustContinue);
  assert_eq!(stepper.state(), StepperState::ProcessNode);
  assert_eq!(stepper.pool().len(), 1);

  assert_eq!(stepper.step(), StepperStatus::MustContinue);
  assert_eq!(stepper.state(), StepperState::ProcessNeighbor);
  assert_eq!(stepper.iterations(), 1);
  assert!(stepper.search_node(parameters.start).unwrap().is_closed);

  let mut steps = 2;
  while stepper.step() == StepperStatus::MustContinue {
    steps += 1;
    assert_ne!(stepper.state(), StepperState::Init);
  }
  assert!(steps > 2);
  assert_eq!(stepper.state(), StepperState::Ended);
  assert_eq!(stepper.result(), Some(PathFindingResult::Success));

  // Ended is terminal
  assert_eq!(stepper.step(), StepperStatus::IsStopped);
  assert_eq!(stepper.run(), PathFindingResult::Success);
}

#[test]
fn test_step_for_zero_budget_steps_once() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);

  let mut sliced = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar);
  let mut slices = 0;
  while sliced.step_for(Duration::ZERO) == StepperStatus::MustContinue {
    slices += 1;
  }

  let mut stepped = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar);
  let mut steps = 0;
  while stepped.step() == StepperStatus::MustContinue {
    steps += 1;
  }

  assert_eq!(slices, steps);
  assert_eq!(sliced.best_node_addresses(), stepped.best_node_addresses());
}

#[test]
fn test_step_for_large_budget_finishes() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);
  let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::ThetaStar);
  assert_eq!(stepper.step_for(Duration::from_secs(60)), StepperStatus::IsStopped);
  assert_eq!(stepper.result(), Some(PathFindingResult::Success));
}

#[test]
fn test_same_start_and_end_succeeds_immediately() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let start = Vec3::new(-20.0, -20.0, -20.0);
  let end = Vec3::new(-22.0, -21.0, -19.0);
  let parameters = PathFindingParameters::new(&data, start, end, &filter);
  assert_eq!(parameters.start, parameters.end);

  let mut builder = PathBuilder::new();
  {
    let mut stepper = PathFindingStepper::new(parameters, filter.algorithm).with_observer(&mut builder);
    assert_eq!(stepper.step(), StepperStatus::IsStopped);
    assert_eq!(stepper.result(), Some(PathFindingResult::Success));
    assert_eq!(stepper.best_node_addresses(), vec![parameters.start]);
  }
  assert_eq!(builder.path().locations().collect::<Vec<_>>(), vec![start, end]);
}

// =========================================================================
// Failures
// =========================================================================

#[test]
fn test_sealed_goal_is_unreachable() {
  let data = sealed_shell();
  let start = Vec3::splat(-20.0);
  let goal = Vec3::splat(14.0);
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, start, goal, &filter);
  assert!(parameters.start.is_valid());
  assert!(parameters.end.is_valid());

  let mut debug = DebugInfosObserver::new();
  let (chain, partial) = {
    let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar).with_observer(&mut debug);
    assert_eq!(stepper.run(), PathFindingResult::GoalUnreachable);
    (stepper.best_node_addresses(), stepper.partial_path())
  };
  assert_eq!(debug.infos().result, Some(PathFindingResult::GoalUnreachable));

  // Partial path towards the closest cell outside the shell
  assert_eq!(chain[0], parameters.start);
  let closest = data.node_position(*chain.last().unwrap()).unwrap();
  assert!(closest.distance(goal) < data.node_position(parameters.start).unwrap().distance(goal));
  assert!(!data.node_bounds(*chain.last().unwrap()).unwrap().contains_point(goal));

  assert_eq!(partial.len(), chain.len());
  assert_eq!(partial.points()[0].location, start);
  assert_eq!(partial.points()[partial.len() - 1].location, closest);
}

#[test]
fn test_cyclic_parent_chain_is_an_infinite_loop() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut recorder = Recorder { id: 0, log: log.clone() };

  {
    let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar).with_observer(&mut recorder);
    let a = stepper.pool.find_or_add(parameters.start);
    let b = stepper.pool.find_or_add(parameters.end);
    stepper.pool[a].parent_index = Some(b);
    stepper.pool[b].parent_index = Some(a);
    stepper.best = Some(b);

    assert_eq!(stepper.finish(PathFindingResult::Success), StepperStatus::IsStopped);
    assert_eq!(stepper.result(), Some(PathFindingResult::InfiniteLoop));
    assert!(stepper.best_node_addresses().is_empty());
  }
  assert_eq!(*log.borrow(), vec![(0, "failed")]);
}

// =========================================================================
// Observers and parameters
// =========================================================================

#[test]
fn test_observers_are_notified_in_insertion_order() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);
  let log = Rc::new(RefCell::new(Vec::new()));
  let mut first = Recorder { id: 1, log: log.clone() };
  let mut second = Recorder { id: 2, log: log.clone() };

  {
    let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar);
    stepper.add_observer(&mut first);
    stepper.add_observer(&mut second);
    assert_eq!(stepper.run(), PathFindingResult::Success);
  }

  let log = log.borrow();
  assert_eq!(&log[..2], &[(1, "node"), (2, "node")]);
  assert_eq!(&log[log.len() - 2..], &[(1, "success"), (2, "success")]);
  for pair in log.chunks(2) {
    assert_eq!(pair[0].0, 1);
    assert_eq!(pair[1].0, 2);
    assert_eq!(pair[0].1, pair[1].1);
  }
}

#[test]
fn test_debug_infos() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);
  let mut debug = DebugInfosObserver::new();
  let iterations = {
    let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar).with_observer(&mut debug);
    assert_eq!(stepper.run(), PathFindingResult::Success);
    stepper.iterations()
  };
  let infos = debug.into_infos();

  // The goal is popped without being expanded
  assert_eq!(infos.iterations, iterations - 1);
  assert!(infos.visited_nodes > 0);
  assert!(infos.last_processed_single_node.is_some());
  assert_eq!(infos.result, Some(PathFindingResult::Success));

  let (_, path, from_helper) = find_path_with_debug(&data, WALL_START, WALL_END, &filter);
  assert_eq!(from_helper, infos);
  assert_eq!(infos.current_best_path, path);
  assert_eq!(infos.path_segment_count, path.len());
  assert!((infos.path_length - path.length()).abs() < 1e-4);
}

#[test]
fn test_node_size_compensation() {
  let data = wall_volume();
  let filter = QueryFilter {
    use_node_size_compensation: true,
    ..Default::default()
  };
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter);
  assert_eq!(parameters.compensate(12.0, 0), 12.0);
  assert_eq!(parameters.compensate(12.0, 2), 12.0 * (1.0 - 2.0 / 3.0));

  let (result, path) = find_path(&data, WALL_START, WALL_END, &filter);
  assert_eq!(result, PathFindingResult::Success);
  assert!(path.len() >= 3);
}

#[test]
fn test_injected_strategies() {
  let data = wall_volume();
  let filter = QueryFilter::default();
  let unit = TraversalCost::UNIT;
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter).with_cost_model(&unit);

  let mut builder = PathBuilder::new();
  {
    let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::AStar).with_observer(&mut builder);
    assert_eq!(stepper.run(), PathFindingResult::Success);
  }
  let path = builder.into_path();
  assert_eq!(path.total_cost(), (path.len() - 1) as f32);

  let line_of_sight = OracleLineOfSight::new(wall_occluders(), 0.0, 1.0);
  let parameters = PathFindingParameters::new(&data, WALL_START, WALL_END, &filter).with_line_of_sight(&line_of_sight);
  let mut stepper = PathFindingStepper::new(parameters, PathFindingAlgorithm::ThetaStar);
  assert_eq!(stepper.run(), PathFindingResult::Success);
  assert!(stepper.best_node_addresses().len() >= 3);
}
