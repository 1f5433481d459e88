//! Layer - one level of subdivision, nodes sorted by Morton code.

use glam::IVec3;

use super::Node;
use crate::types::{MortonCode, NodeIndex};

/// Nodes of one octree level and the size of their cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
  nodes: Vec<Node>,
  voxel_size: f32,
  edge_node_count: u32,
}

impl Layer {
  pub(crate) fn new(edge_node_count: u32, voxel_size: f32) -> Self {
    Self {
      nodes: Vec::new(),
      voxel_size,
      edge_node_count,
    }
  }

  /// Nodes in ascending Morton order.
  #[inline]
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  #[inline]
  pub(crate) fn nodes_mut(&mut self) -> &mut Vec<Node> {
    &mut self.nodes
  }

  #[inline]
  pub fn node(&self, index: NodeIndex) -> Option<&Node> {
    self.nodes.get(index as usize)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Edge length of one cell.
  #[inline]
  pub fn voxel_size(&self) -> f32 {
    self.voxel_size
  }

  #[inline]
  pub fn voxel_half_size(&self) -> f32 {
    self.voxel_size * 0.5
  }

  /// Cells along one axis of the volume.
  #[inline]
  pub fn edge_node_count(&self) -> u32 {
    self.edge_node_count
  }

  /// Cells in a fully subdivided layer (`edge^3`).
  #[inline]
  pub fn max_node_count(&self) -> u64 {
    u64::from(self.edge_node_count).pow(3)
  }

  /// Whether grid coordinates fall inside the volume at this layer.
  #[inline]
  pub fn contains_coords(&self, coords: IVec3) -> bool {
    let edge = self.edge_node_count as i32;
    coords.cmpge(IVec3::ZERO).all() && coords.cmplt(IVec3::splat(edge)).all()
  }

  /// Binary search for the node with `code`.
  pub fn find_node_index(&self, code: MortonCode) -> Option<NodeIndex> {
    self
      .nodes
      .binary_search_by_key(&code, |node| node.morton_code)
      .ok()
      .map(|index| index as NodeIndex)
  }

  /// Search for `code` starting next to `from`, only on the side where
  /// larger or smaller codes live.
  pub fn find_node_index_from(&self, from: NodeIndex, code: MortonCode) -> Option<NodeIndex> {
    let from = from as usize;
    let origin = self.nodes.get(from)?.morton_code;
    if code == origin {
      return Some(from as NodeIndex);
    }
    let (range_start, range) = if code > origin {
      (from + 1, &self.nodes[from + 1..])
    } else {
      (0, &self.nodes[..from])
    };
    range
      .binary_search_by_key(&code, |node| node.morton_code)
      .ok()
      .map(|index| (range_start + index) as NodeIndex)
  }
}
