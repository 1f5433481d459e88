//! Axis-aligned boxes for navigation volumes, nodes and occluders.

use glam::Vec3;

/// Axis-aligned bounding box in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
	/// Minimum corner (inclusive).
	pub min: Vec3,
	/// Maximum corner (inclusive).
	pub max: Vec3,
}

impl Aabb {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: Vec3, max: Vec3) -> Self {
		debug_assert!(min.cmple(max).all(), "AABB min must be <= max on all axes");
		Self { min, max }
	}

	pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Cube of edge `side` centered on `center`.
	pub fn cube(center: Vec3, side: f32) -> Self {
		Self::from_center_half_extents(center, Vec3::splat(side * 0.5))
	}

	/// Finite corners with min <= max.
	pub fn is_valid(&self) -> bool {
		self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
	}

	/// Shares any interior or boundary point with `other`.
	#[inline]
	pub fn overlaps(&self, other: &Aabb) -> bool {
		self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
	}

	/// Shares interior volume with `other`; touching faces do not count.
	#[inline]
	pub fn overlaps_interior(&self, other: &Aabb) -> bool {
		self.min.cmplt(other.max).all() && self.max.cmpgt(other.min).all()
	}

	#[inline]
	pub fn contains_point(&self, point: Vec3) -> bool {
		point.cmpge(self.min).all() && point.cmple(self.max).all()
	}

	#[inline]
	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	#[inline]
	pub fn half_extents(&self) -> Vec3 {
		self.size() * 0.5
	}

	/// Largest edge length.
	#[inline]
	pub fn max_extent(&self) -> f32 {
		self.size().max_element()
	}

	#[inline]
	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_from_center_half_extents() {
		let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(10.0));
		assert_eq!(aabb.min, Vec3::splat(-10.0));
		assert_eq!(aabb.max, Vec3::splat(10.0));
		assert_eq!(Aabb::cube(Vec3::ONE, 4.0), Aabb::new(Vec3::splat(-1.0), Vec3::splat(3.0)));
	}

	#[test]
	fn test_overlaps_touching() {
		// Touching counts for overlaps, not for interior overlap
		let a = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
		let b = Aabb::new(Vec3::new(10.0, 0.0, 0.0), Vec3::splat(20.0));
		assert!(a.overlaps(&b));
		assert!(!a.overlaps_interior(&b));
	}

	#[test]
	fn test_overlaps_interior() {
		let a = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
		let b = Aabb::new(Vec3::splat(5.0), Vec3::splat(15.0));
		let c = Aabb::new(Vec3::splat(11.0), Vec3::splat(20.0));
		assert!(a.overlaps_interior(&b));
		assert!(b.overlaps_interior(&a));
		assert!(!a.overlaps(&c));
		assert!(!a.overlaps_interior(&c));
	}

	#[test]
	fn test_contains_point() {
		let aabb = Aabb::new(Vec3::ZERO, Vec3::splat(10.0));
		assert!(aabb.contains_point(Vec3::splat(5.0)));
		assert!(aabb.contains_point(Vec3::splat(10.0)));
		assert!(!aabb.contains_point(Vec3::new(5.0, -0.1, 5.0)));
	}

	#[test]
	fn test_extents() {
		let aabb = Aabb::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
		assert_eq!(aabb.size(), Vec3::new(2.0, 4.0, 6.0));
		assert_eq!(aabb.half_extents(), Vec3::new(1.0, 2.0, 3.0));
		assert_eq!(aabb.max_extent(), 6.0);
		assert_eq!(aabb.center(), Vec3::ZERO);
	}

	#[test]
	fn test_is_valid() {
		assert!(Aabb::new(Vec3::ZERO, Vec3::ONE).is_valid());
		assert!(!Aabb { min: Vec3::ONE, max: Vec3::ZERO }.is_valid());
		assert!(!Aabb { min: Vec3::splat(f32::NAN), max: Vec3::ONE }.is_valid());
	}
}
