//! SvoData - the layered octree of one navigation volume.

use glam::{UVec3, Vec3};
use rand::Rng;

use super::leaf::{sub_node_coords, sub_node_index};
use super::{Layer, Leaf, Node};
use crate::bounds::Aabb;
use crate::config::GenerationSettings;
use crate::morton;
use crate::types::{LayerIndex, NodeAddress, NodeIndex, LEAF_EDGE, LEAF_SUB_NODE_COUNT};

/// Sparse voxel octree over one volume.
///
/// Owns every node and leaf; all cross references are [`NodeAddress`]es.
/// Built by [`generate`](crate::generation::generate) and read-only
/// afterwards. Rebuilding produces a new value to swap in.
#[derive(Clone, Debug, PartialEq)]
pub struct SvoData {
  volume_bounds: Aabb,
  navigation_bounds: Aabb,
  settings: GenerationSettings,
  layers: Vec<Layer>,
  leaves: Vec<Leaf>,
}

impl SvoData {
  /// Empty store sized for `volume_bounds`: layers exist but hold no nodes.
  ///
  /// With fewer than 2 layers the store has no layers at all and every
  /// query misses.
  pub(crate) fn with_layout(volume_bounds: Aabb, settings: GenerationSettings) -> Self {
    let exponent = settings.voxel_exponent(&volume_bounds);
    let layer_count = (exponent + 1).max(0) as usize;

    if layer_count < 2 {
      return Self {
        volume_bounds,
        navigation_bounds: volume_bounds,
        settings,
        layers: Vec::new(),
        leaves: Vec::new(),
      };
    }

    let side = settings.leaf_node_size() * (1u64 << exponent) as f32;
    let layers = (0..layer_count)
      .map(|layer| {
        let edge = 1u32 << (exponent as usize - layer);
        Layer::new(edge, side / edge as f32)
      })
      .collect();

    Self {
      volume_bounds,
      navigation_bounds: Aabb::cube(volume_bounds.center(), side),
      settings,
      layers,
      leaves: Vec::new(),
    }
  }

  // =========================================================================
  // Layout
  // =========================================================================

  /// Bounds the volume was requested with.
  #[inline]
  pub fn volume_bounds(&self) -> &Aabb {
    &self.volume_bounds
  }

  /// Power-of-two cube actually covered by the tree.
  #[inline]
  pub fn navigation_bounds(&self) -> &Aabb {
    &self.navigation_bounds
  }

  #[inline]
  pub fn settings(&self) -> &GenerationSettings {
    &self.settings
  }

  #[inline]
  pub fn layer_count(&self) -> usize {
    self.layers.len()
  }

  /// A store with fewer than 2 layers holds no navigation data.
  #[inline]
  pub fn is_navigable(&self) -> bool {
    self.layers.len() >= 2
  }

  #[inline]
  pub fn layers(&self) -> &[Layer] {
    &self.layers
  }

  #[inline]
  pub fn layer(&self, layer: LayerIndex) -> Option<&Layer> {
    self.layers.get(layer as usize)
  }

  #[inline]
  pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
    &mut self.layers
  }

  #[inline]
  pub fn leaves(&self) -> &[Leaf] {
    &self.leaves
  }

  #[inline]
  pub fn leaf(&self, index: NodeIndex) -> Option<&Leaf> {
    self.leaves.get(index as usize)
  }

  #[inline]
  pub(crate) fn leaves_mut(&mut self) -> &mut Vec<Leaf> {
    &mut self.leaves
  }

  /// Index of the top layer, which holds the single root node.
  #[inline]
  pub fn top_layer(&self) -> Option<LayerIndex> {
    self.layers.len().checked_sub(1).map(|top| top as LayerIndex)
  }

  /// `layer / layer_count`.
  pub fn layer_ratio(&self, layer: LayerIndex) -> f32 {
    if self.layers.is_empty() {
      return 0.0;
    }
    f32::from(layer) / self.layers.len() as f32
  }

  /// `1 - layer / layer_count`; 1 at layer 0, smallest at the root.
  pub fn layer_inverse_ratio(&self, layer: LayerIndex) -> f32 {
    1.0 - self.layer_ratio(layer)
  }

  // =========================================================================
  // Address resolution
  // =========================================================================

  #[inline]
  pub fn node(&self, address: NodeAddress) -> Option<&Node> {
    self.layer(address.layer)?.node(address.node_index)
  }

  /// Leaf owned by a layer-0 node, if it has one.
  pub fn leaf_of(&self, address: NodeAddress) -> Option<&Leaf> {
    if address.layer != 0 {
      return None;
    }
    let leaf_address = self.node(address)?.first_child?;
    self.leaf(leaf_address.node_index)
  }

  /// The address points at an existing node, and its sub-node index is in
  /// range when the node carries a leaf (and 0 otherwise).
  pub fn is_valid_address(&self, address: NodeAddress) -> bool {
    let Some(node) = self.node(address) else {
      return false;
    };
    if address.layer == 0 && node.has_children() {
      (address.subnode_index as usize) < LEAF_SUB_NODE_COUNT
    } else {
      address.subnode_index == 0
    }
  }

  /// Whether the address names a single leaf voxel.
  #[inline]
  pub fn is_sub_node_address(&self, address: NodeAddress) -> bool {
    self.leaf_of(address).is_some()
  }

  /// Edge length of the cell an address names.
  pub fn node_size(&self, address: NodeAddress) -> Option<f32> {
    let layer = self.layer(address.layer)?;
    if self.is_sub_node_address(address) {
      Some(layer.voxel_size() / LEAF_EDGE as f32)
    } else {
      Some(layer.voxel_size())
    }
  }

  /// World-space box of the cell an address names.
  pub fn node_bounds(&self, address: NodeAddress) -> Option<Aabb> {
    let center = self.node_position(address)?;
    let size = self.node_size(address)?;
    Some(Aabb::cube(center, size))
  }

  /// World-space center of a node, or of a leaf voxel for sub-node
  /// addresses.
  pub fn node_position(&self, address: NodeAddress) -> Option<Vec3> {
    let layer = self.layer(address.layer)?;
    let node = layer.node(address.node_index)?;
    let voxel_size = layer.voxel_size();
    let node_min = self.navigation_bounds.min + morton::decode_coords(node.morton_code).as_vec3() * voxel_size;

    if address.layer == 0 && node.has_children() {
      let sub_size = voxel_size / LEAF_EDGE as f32;
      let sub_coords = sub_node_coords(address.subnode_index).as_vec3();
      return Some(node_min + sub_coords * sub_size + Vec3::splat(sub_size * 0.5));
    }

    Some(node_min + Vec3::splat(voxel_size * 0.5))
  }

  /// Finest free cell containing `position`.
  ///
  /// Descends from the root to the first node without children; inside a
  /// leaf, resolves the voxel. `None` outside the navigation bounds or when
  /// the voxel is occluded.
  pub fn node_address_from_position(&self, position: Vec3) -> Option<NodeAddress> {
    if !self.is_navigable() || !self.navigation_bounds.contains_point(position) {
      return None;
    }

    let local = position - self.navigation_bounds.min;
    let mut layer_index = self.top_layer()?;
    let mut node_index: NodeIndex = 0;

    loop {
      let layer = self.layer(layer_index)?;
      let node = layer.node(node_index)?;

      let Some(first_child) = node.first_child else {
        return Some(NodeAddress::new(layer_index, node_index));
      };

      if layer_index == 0 {
        let leaf = self.leaf(first_child.node_index)?;
        let sub_size = layer.voxel_size() / LEAF_EDGE as f32;
        let node_min = morton::decode_coords(node.morton_code).as_vec3() * layer.voxel_size();
        let sub_coords = grid_coords(local - node_min, sub_size, LEAF_EDGE);
        let sub_node = sub_node_index(sub_coords);
        if leaf.is_sub_node_occluded(sub_node) {
          return None;
        }
        return Some(NodeAddress::sub_node(node_index, sub_node));
      }

      let child_layer = self.layer(layer_index - 1)?;
      let child_coords = grid_coords(local, child_layer.voxel_size(), child_layer.edge_node_count());
      let octant = (morton::encode_coords(child_coords) & 7) as NodeIndex;
      node_index = first_child.node_index + octant;
      layer_index -= 1;
    }
  }

  // =========================================================================
  // Free space
  // =========================================================================

  /// Every free cell below (and including) `address`: nodes without
  /// children and the free voxels of leaves.
  pub fn free_nodes_below(&self, address: NodeAddress, out: &mut Vec<NodeAddress>) {
    let mut stack = vec![address.node()];
    while let Some(current) = stack.pop() {
      let Some(node) = self.node(current) else {
        continue;
      };
      match node.first_child {
        None => out.push(current),
        Some(_) if current.layer == 0 => {
          if let Some(leaf) = self.leaf_of(current) {
            out.extend(
              leaf
                .free_sub_nodes()
                .map(|sub_node| NodeAddress::sub_node(current.node_index, sub_node)),
            );
          }
        }
        Some(first_child) => {
          for octant in (0..8).rev() {
            stack.push(NodeAddress::new(current.layer - 1, first_child.node_index + octant));
          }
        }
      }
    }
  }

  /// Every free cell of the volume.
  pub fn free_nodes(&self) -> Vec<NodeAddress> {
    let mut out = Vec::new();
    if let Some(top) = self.top_layer() {
      self.free_nodes_below(NodeAddress::new(top, 0), &mut out);
    }
    out
  }

  /// Random point inside a randomly chosen free cell.
  pub fn random_navigable_point<R: Rng>(&self, rng: &mut R) -> Option<(Vec3, NodeAddress)> {
    let free = self.free_nodes();
    if free.is_empty() {
      return None;
    }
    let address = free[rng.random_range(0..free.len())];
    let bounds = self.node_bounds(address)?;
    let t = Vec3::new(rng.random(), rng.random(), rng.random());
    Some((bounds.min + bounds.size() * t, address))
  }
}

/// `floor(local / cell)` clamped into `0..edge` on every axis.
#[inline]
fn grid_coords(local: Vec3, cell: f32, edge: u32) -> UVec3 {
  (local / cell)
    .floor()
    .max(Vec3::ZERO)
    .as_uvec3()
    .min(UVec3::splat(edge - 1))
}
