//! Occlusion oracle - the collision query generation is built on.

use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

use crate::bounds::Aabb;

/// Answers "is this axis-aligned box blocked?".
///
/// Implementations must be deterministic for the duration of one generation
/// and safe to call from several threads at once: generation fans queries
/// out over rayon.
pub trait OcclusionOracle: Send + Sync {
  /// Whether the cube centered on `center` with half edge `half_extent`
  /// touches blocking geometry.
  fn is_box_occluded(&self, center: Vec3, half_extent: f32) -> bool;
}

impl<F> OcclusionOracle for F
where
  F: Fn(Vec3, f32) -> bool + Send + Sync,
{
  #[inline]
  fn is_box_occluded(&self, center: Vec3, half_extent: f32) -> bool {
    self(center, half_extent)
  }
}

/// Static set of box obstacles.
///
/// A query is occluded when it shares interior volume with any obstacle;
/// touching a face is not enough.
#[derive(Clone, Debug, Default)]
pub struct AabbOccluders {
  boxes: Vec<Aabb>,
}

impl AabbOccluders {
  pub fn new(boxes: Vec<Aabb>) -> Self {
    Self { boxes }
  }

  pub fn push(&mut self, obstacle: Aabb) {
    self.boxes.push(obstacle);
  }

  pub fn boxes(&self) -> &[Aabb] {
    &self.boxes
  }

  /// Whether a point lies strictly inside an obstacle.
  pub fn contains_point(&self, point: Vec3) -> bool {
    self
      .boxes
      .iter()
      .any(|obstacle| point.cmpgt(obstacle.min).all() && point.cmplt(obstacle.max).all())
  }
}

impl OcclusionOracle for AabbOccluders {
  fn is_box_occluded(&self, center: Vec3, half_extent: f32) -> bool {
    let query = Aabb::from_center_half_extents(center, Vec3::splat(half_extent));
    self.boxes.iter().any(|obstacle| obstacle.overlaps_interior(&query))
  }
}

/// Oracle wrapper used during generation: applies the clearance margin and
/// counts queries.
pub(crate) struct OracleQueries<'a, O: ?Sized> {
  oracle: &'a O,
  clearance: f32,
  count: AtomicU64,
}

impl<'a, O: OcclusionOracle + ?Sized> OracleQueries<'a, O> {
  pub(crate) fn new(oracle: &'a O, clearance: f32) -> Self {
    Self {
      oracle,
      clearance,
      count: AtomicU64::new(0),
    }
  }

  #[inline]
  pub(crate) fn is_occluded(&self, center: Vec3, half_extent: f32) -> bool {
    self.count.fetch_add(1, Ordering::Relaxed);
    self.oracle.is_box_occluded(center, half_extent + self.clearance)
  }

  pub(crate) fn count(&self) -> u64 {
    self.count.load(Ordering::Relaxed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_closure_oracle() {
    let oracle = |center: Vec3, _half: f32| center.x > 0.0;
    assert!(oracle.is_box_occluded(Vec3::X, 1.0));
    assert!(!oracle.is_box_occluded(-Vec3::X, 1.0));
  }

  #[test]
  fn test_aabb_occluders_strict_overlap() {
    let occluders = AabbOccluders::new(vec![Aabb::new(Vec3::ZERO, Vec3::splat(2.0))]);
    assert!(occluders.is_box_occluded(Vec3::splat(1.0), 0.5));
    assert!(occluders.is_box_occluded(Vec3::splat(-0.5), 0.6));
    // Touching the min face only
    assert!(!occluders.is_box_occluded(Vec3::new(-1.0, 1.0, 1.0), 1.0));
    assert!(occluders.contains_point(Vec3::splat(1.0)));
    assert!(!occluders.contains_point(Vec3::new(2.0, 1.0, 1.0)));
  }

  #[test]
  fn test_queries_apply_clearance_and_count() {
    let occluders = AabbOccluders::new(vec![Aabb::new(Vec3::ZERO, Vec3::splat(2.0))]);
    let queries = OracleQueries::new(&occluders, 0.5);
    // 1.0 + 0.5 clearance reaches past x = 0
    assert!(queries.is_occluded(Vec3::new(-1.25, 1.0, 1.0), 1.0));
    assert!(!queries.is_occluded(Vec3::new(-2.0, 1.0, 1.0), 1.0));
    assert_eq!(queries.count(), 2);
  }
}
