//! Line of sight swept against an occlusion oracle.

use glam::Vec3;

use super::LineOfSightModel;
use crate::generation::OcclusionOracle;
use crate::octree::SvoData;

/// Sweeps a box of half extent `radius` from `from` to `to`, one oracle
/// query every `step` units (and at both ends).
///
/// Stands in for a physics line or sphere trace: the octree is ignored and
/// the oracle answers directly, so obstacles smaller than a voxel or
/// a clearance differing from generation are honored.
#[derive(Clone, Debug)]
pub struct OracleLineOfSight<O> {
  oracle: O,
  radius: f32,
  step: f32,
}

impl<O: OcclusionOracle> OracleLineOfSight<O> {
  /// `step` is clamped to at least `radius`, and to a small positive value
  /// for line traces.
  pub fn new(oracle: O, radius: f32, step: f32) -> Self {
    Self {
      oracle,
      radius: radius.max(0.0),
      step: step.max(radius).max(1e-3),
    }
  }

  #[inline]
  pub fn oracle(&self) -> &O {
    &self.oracle
  }

  #[inline]
  pub fn radius(&self) -> f32 {
    self.radius
  }

  #[inline]
  pub fn step(&self) -> f32 {
    self.step
  }
}

impl<O: OcclusionOracle> LineOfSightModel for OracleLineOfSight<O> {
  fn has_line_of_sight(&self, _data: &SvoData, from: Vec3, to: Vec3) -> bool {
    let length = from.distance(to);
    let samples = (length / self.step).ceil().max(1.0) as u32;

    (0..=samples).all(|i| {
      let position = from.lerp(to, i as f32 / samples as f32);
      !self.oracle.is_box_occluded(position, self.radius)
    })
  }
}
