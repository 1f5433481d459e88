//! GenerationSettings - voxel sizing and oracle query inflation for octree
//! generation.

use thiserror::Error;

use crate::bounds::Aabb;
use crate::morton::MORTON_AXIS_BITS;
use crate::types::LEAF_EDGE;

/// Tallest tree whose finest layer still fits the per-axis Morton budget.
pub const MAX_LAYER_COUNT: usize = MORTON_AXIS_BITS as usize + 1;

/// Reasons generation refuses to start.
///
/// A volume too small for two layers is not an error: it produces an empty
/// store that fails every query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
  #[error("voxel size must be finite and positive, got {0}")]
  InvalidVoxelSize(f32),

  #[error("clearance must be finite and non-negative, got {0}")]
  InvalidClearance(f32),

  #[error("volume bounds must be finite with min <= max, got {0:?}")]
  InvalidBounds(Aabb),

  #[error("volume needs {layer_count} layers, at most {MAX_LAYER_COUNT} are addressable")]
  TooManyLayers { layer_count: usize },

  #[error("generation was cancelled")]
  Cancelled,
}

/// Settings for building one navigation volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationSettings {
  /// Edge length of the finest voxel (one bit of a leaf).
  pub voxel_size: f32,

  /// Margin added to every occlusion query half extent, so that free space
  /// keeps this distance from obstacles.
  pub clearance: f32,
}

impl GenerationSettings {
  pub fn new(voxel_size: f32) -> Self {
    Self {
      voxel_size,
      ..Default::default()
    }
  }

  pub fn with_clearance(mut self, clearance: f32) -> Self {
    self.clearance = clearance;
    self
  }

  /// Edge length of a layer-0 node, which holds a 4x4x4 leaf.
  #[inline]
  pub fn leaf_node_size(&self) -> f32 {
    self.voxel_size * LEAF_EDGE as f32
  }

  /// Check the settings on their own.
  pub fn validate(&self) -> Result<(), GenerationError> {
    if !(self.voxel_size.is_finite() && self.voxel_size > 0.0) {
      return Err(GenerationError::InvalidVoxelSize(self.voxel_size));
    }
    if !(self.clearance.is_finite() && self.clearance >= 0.0) {
      return Err(GenerationError::InvalidClearance(self.clearance));
    }
    Ok(())
  }

  /// Octree height for a volume: `round(log2(max_extent / leaf_node_size))`.
  ///
  /// Negative for volumes smaller than one layer-0 node.
  pub fn voxel_exponent(&self, volume_bounds: &Aabb) -> i32 {
    let ratio = volume_bounds.max_extent() / self.leaf_node_size();
    if ratio > 0.0 {
      ratio.log2().round() as i32
    } else {
      -1
    }
  }

  /// Number of layers (`voxel_exponent + 1`), clamped at 0.
  pub fn layer_count(&self, volume_bounds: &Aabb) -> usize {
    (self.voxel_exponent(volume_bounds) + 1).max(0) as usize
  }
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      voxel_size: 1.0,
      clearance: 0.0,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
