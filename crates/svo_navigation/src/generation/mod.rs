//! Octree generation from an occlusion oracle.
//!
//! ```text
//! ┌────────────┐     ┌──────────┐     ┌─────────────┐     ┌──────────────┐     ┌────────────────┐
//! │ First pass ├────►│ Allocate ├────►│ Layer 0 +   ├────►│ Upper layers ├────►│ Neighbor links │
//! │ (layer 1)  │     │ leaves   │     │ leaves      │     │ (1..top)     │     │ (top..0)       │
//! └────────────┘     └──────────┘     └─────────────┘     └──────────────┘     └────────────────┘
//!   blocked codes                       64 queries per      first_child +        face links,
//!   per layer                           occluded node       parent back-links    coarse fallback
//! ```
//!
//! The oracle is only queried by the first pass (once per layer-1 cell) and
//! by layer-0 rasterization. Blocking above layer 1 is propagated with
//! `code >> 3` instead of re-sampling. Queries inside a stage are
//! independent and fanned out with rayon; the stages themselves run in
//! order.
//!
//! # Usage
//!
//! ```ignore
//! let occluders = AabbOccluders::new(vec![wall]);
//! let data = generate(volume_bounds, &GenerationSettings::new(4.0), &occluders)?;
//! ```

pub mod batch;
pub mod neighbors;
pub mod oracle;

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use rayon::prelude::*;
use web_time::Instant;

use crate::bounds::Aabb;
use crate::config::{GenerationError, GenerationSettings, MAX_LAYER_COUNT};
use crate::morton;
use crate::octree::leaf::sub_node_coords;
use crate::octree::{Leaf, Node, SvoData};
use crate::types::{LayerIndex, MortonCode, NodeAddress, NodeIndex, LEAF_EDGE, LEAF_SUB_NODE_COUNT};

pub use batch::{BatchGenerator, GeneratedVolume, VolumeId};
pub use oracle::{AabbOccluders, OcclusionOracle};

use oracle::OracleQueries;

/// Statistics from one generation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationStats {
  /// Oracle calls made, first pass and leaves together.
  pub oracle_queries: u64,
  /// Nodes per layer, layer 0 first.
  pub layer_node_counts: Vec<usize>,
  /// Leaves allocated (occluded layer-0 nodes).
  pub leaf_count: usize,
  /// First-pass rasterization time in microseconds.
  pub first_pass_us: u64,
  /// Layer-0 rasterization (with leaves) time in microseconds.
  pub leaf_rasterization_us: u64,
  /// Upper layer rasterization time in microseconds.
  pub layer_rasterization_us: u64,
  /// Neighbor link resolution time in microseconds.
  pub neighbor_links_us: u64,
  /// Whole run in microseconds.
  pub total_us: u64,
}

/// Build the octree of `volume_bounds`.
///
/// A volume too small for two layers yields an empty store rather than an
/// error; see [`SvoData::is_navigable`].
pub fn generate<O: OcclusionOracle + ?Sized>(
  volume_bounds: Aabb,
  settings: &GenerationSettings,
  oracle: &O,
) -> Result<SvoData, GenerationError> {
  generate_with_stats(volume_bounds, settings, oracle).map(|(data, _)| data)
}

/// [`generate`], also returning timings and counts.
pub fn generate_with_stats<O: OcclusionOracle + ?Sized>(
  volume_bounds: Aabb,
  settings: &GenerationSettings,
  oracle: &O,
) -> Result<(SvoData, GenerationStats), GenerationError> {
  generate_cancellable(volume_bounds, settings, oracle, None)
}

impl SvoData {
  /// See [`generate`].
  pub fn generate<O: OcclusionOracle + ?Sized>(
    volume_bounds: Aabb,
    settings: &GenerationSettings,
    oracle: &O,
  ) -> Result<SvoData, GenerationError> {
    generate(volume_bounds, settings, oracle)
  }

  /// Rebuild this volume with its own bounds and settings.
  ///
  /// Returns a new store; swap it in once no search is using the old one.
  pub fn regenerate<O: OcclusionOracle + ?Sized>(&self, oracle: &O) -> Result<SvoData, GenerationError> {
    generate(*self.volume_bounds(), self.settings(), oracle)
  }
}

/// Generation with a cancel flag checked between stages.
///
/// On cancellation the partial store is dropped and `Cancelled` returned.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, name = "generation::generate"))]
pub(crate) fn generate_cancellable<O: OcclusionOracle + ?Sized>(
  volume_bounds: Aabb,
  settings: &GenerationSettings,
  oracle: &O,
  cancel: Option<&AtomicBool>,
) -> Result<(SvoData, GenerationStats), GenerationError> {
  settings.validate()?;
  if !volume_bounds.is_valid() {
    return Err(GenerationError::InvalidBounds(volume_bounds));
  }
  let layer_count = settings.layer_count(&volume_bounds);
  if layer_count > MAX_LAYER_COUNT {
    return Err(GenerationError::TooManyLayers { layer_count });
  }

  let total_start = Instant::now();
  let mut data = SvoData::with_layout(volume_bounds, *settings);
  let mut stats = GenerationStats::default();

  if !data.is_navigable() {
    #[cfg(feature = "tracing")]
    tracing::warn!(layer_count, "volume too small for navigation, store left empty");
    return Ok((data, stats));
  }

  let queries = OracleQueries::new(oracle, settings.clearance);

  let stage_start = Instant::now();
  let blocked = {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("first_pass_rasterization").entered();
    first_pass_rasterization(&data, &queries)
  };
  stats.first_pass_us = stage_start.elapsed().as_micros() as u64;
  check_cancelled(cancel)?;

  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("allocate_leaves").entered();
    let leaf_capacity = blocked.get(1).map_or(0, |codes| codes.len() * 8 / 4);
    data.leaves_mut().reserve(leaf_capacity);
  }

  let stage_start = Instant::now();
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("rasterize_initial_layer").entered();
    rasterize_initial_layer(&mut data, &blocked, &queries);
  }
  stats.leaf_rasterization_us = stage_start.elapsed().as_micros() as u64;
  check_cancelled(cancel)?;

  let stage_start = Instant::now();
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("rasterize_layers").entered();
    for layer_index in 1..data.layer_count() {
      rasterize_layer(&mut data, layer_index as LayerIndex, &blocked);
    }
  }
  stats.layer_rasterization_us = stage_start.elapsed().as_micros() as u64;
  check_cancelled(cancel)?;

  let stage_start = Instant::now();
  {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("build_neighbor_links").entered();
    neighbors::build_neighbor_links(&mut data);
  }
  stats.neighbor_links_us = stage_start.elapsed().as_micros() as u64;

  stats.oracle_queries = queries.count();
  stats.layer_node_counts = data.layers().iter().map(|layer| layer.len()).collect();
  stats.leaf_count = data.leaves().len();
  stats.total_us = total_start.elapsed().as_micros() as u64;

  #[cfg(feature = "tracing")]
  tracing::debug!(
    layers = data.layer_count(),
    nodes = stats.layer_node_counts.iter().sum::<usize>(),
    leaves = stats.leaf_count,
    oracle_queries = stats.oracle_queries,
    total_us = stats.total_us,
    "octree generated"
  );

  Ok((data, stats))
}

#[inline]
fn check_cancelled(cancel: Option<&AtomicBool>) -> Result<(), GenerationError> {
  if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
    return Err(GenerationError::Cancelled);
  }
  Ok(())
}

/// Center of the cell with `code` on `layer_index`.
#[inline]
fn cell_center(data: &SvoData, layer_index: LayerIndex, code: MortonCode) -> Vec3 {
  let voxel_size = data.layers()[layer_index as usize].voxel_size();
  data.navigation_bounds().min + (morton::decode_coords(code).as_vec3() + Vec3::splat(0.5)) * voxel_size
}

/// Sample every layer-1 cell and propagate blocking upward.
///
/// Returns, per layer, the sorted Morton codes of blocked cells. Index 0 is
/// unused: layer-0 occupancy is resolved during leaf rasterization.
fn first_pass_rasterization<O: OcclusionOracle + ?Sized>(
  data: &SvoData,
  queries: &OracleQueries<'_, O>,
) -> Vec<Vec<MortonCode>> {
  let layer_count = data.layer_count();
  let mut blocked = vec![Vec::new(); layer_count];

  let layer = &data.layers()[1];
  let half_extent = layer.voxel_half_size();
  blocked[1] = (0..layer.max_node_count())
    .into_par_iter()
    .filter(|&code| queries.is_occluded(cell_center(data, 1, code), half_extent))
    .collect();

  for layer_index in 2..layer_count {
    let mut parents: Vec<MortonCode> = blocked[layer_index - 1].iter().map(|&code| morton::parent_code(code)).collect();
    parents.dedup();
    blocked[layer_index] = parents;
  }

  blocked
}

/// Codes to emit on `layer_index`: the 8 children of every blocked cell one
/// layer up. The top layer always holds the root.
fn emitted_codes(layer_count: usize, layer_index: usize, blocked: &[Vec<MortonCode>]) -> Vec<MortonCode> {
  if layer_index + 1 == layer_count {
    return vec![0];
  }
  blocked[layer_index + 1]
    .iter()
    .flat_map(|&parent| (0..8u8).map(move |octant| morton::child_code(parent, octant)))
    .collect()
}

/// Emit layer-0 nodes and rasterize a leaf for each occluded one.
fn rasterize_initial_layer<O: OcclusionOracle + ?Sized>(
  data: &mut SvoData,
  blocked: &[Vec<MortonCode>],
  queries: &OracleQueries<'_, O>,
) {
  let codes = emitted_codes(data.layer_count(), 0, blocked);
  let node_half_extent = data.layers()[0].voxel_half_size();

  let rasterized: Vec<(MortonCode, Option<Leaf>)> = {
    let data = &*data;
    codes
      .par_iter()
      .map(|&code| {
        let center = cell_center(data, 0, code);
        let leaf = queries
          .is_occluded(center, node_half_extent)
          .then(|| rasterize_leaf(data, center, queries));
        (code, leaf)
      })
      .collect()
  };

  let mut nodes = Vec::with_capacity(rasterized.len());
  for (code, leaf) in rasterized {
    let mut node = Node::new(code);
    if let Some(leaf) = leaf {
      let leaves = data.leaves_mut();
      node.first_child = Some(NodeAddress::new(0, leaves.len() as NodeIndex));
      leaves.push(leaf);
    }
    nodes.push(node);
  }
  *data.layers_mut()[0].nodes_mut() = nodes;
}

/// One oracle query per voxel of a layer-0 node.
fn rasterize_leaf<O: OcclusionOracle + ?Sized>(data: &SvoData, node_center: Vec3, queries: &OracleQueries<'_, O>) -> Leaf {
  let voxel_size = data.layers()[0].voxel_size() / LEAF_EDGE as f32;
  let half_extent = voxel_size * 0.5;
  let node_min = node_center - Vec3::splat(data.layers()[0].voxel_half_size());

  let mut leaf = Leaf::default();
  for sub_node in 0..LEAF_SUB_NODE_COUNT as u8 {
    let center = node_min + (sub_node_coords(sub_node).as_vec3() + Vec3::splat(0.5)) * voxel_size;
    if queries.is_occluded(center, half_extent) {
      leaf.mark_sub_node_occluded(sub_node);
    }
  }
  leaf
}

/// Emit the nodes of `layer_index` (>= 1) and link them with their
/// children one layer down.
fn rasterize_layer(data: &mut SvoData, layer_index: LayerIndex, blocked: &[Vec<MortonCode>]) {
  let codes = emitted_codes(data.layer_count(), layer_index as usize, blocked);
  let (below, above) = data.layers_mut().split_at_mut(layer_index as usize);
  let child_layer = &mut below[layer_index as usize - 1];
  let layer = &mut above[0];

  let mut nodes = Vec::with_capacity(codes.len());
  for code in codes {
    let node_index = nodes.len() as NodeIndex;
    let mut node = Node::new(code);

    if let Some(first_child) = child_layer.find_node_index(morton::first_child_code(code)) {
      node.first_child = Some(NodeAddress::new(layer_index - 1, first_child));
      let children = &mut child_layer.nodes_mut()[first_child as usize..first_child as usize + 8];
      for child in children {
        child.parent = Some(NodeAddress::new(layer_index, node_index));
      }
    }

    nodes.push(node);
  }
  *layer.nodes_mut() = nodes;
}
