//! Neighbor-link resolution for a fully rasterized tree.

use rayon::prelude::*;

use crate::morton;
use crate::octree::SvoData;
use crate::types::{Direction, LayerIndex, NodeAddress, NodeIndex};

/// Resolve the 6 face links of every node, layer by layer from the top.
///
/// Reads only node arrays and leaves, so each layer's links are computed in
/// parallel and written back afterwards.
pub(crate) fn build_neighbor_links(data: &mut SvoData) {
  for layer_index in (0..data.layer_count()).rev() {
    let layer_index = layer_index as LayerIndex;
    let node_count = data.layers()[layer_index as usize].len();

    let links: Vec<[Option<NodeAddress>; 6]> = {
      let data = &*data;
      (0..node_count as NodeIndex)
        .into_par_iter()
        .map(|node_index| {
          Direction::ALL.map(|direction| find_neighbor(data, layer_index, node_index, direction))
        })
        .collect()
    };

    let nodes = data.layers_mut()[layer_index as usize].nodes_mut();
    for (node, neighbors) in nodes.iter_mut().zip(links) {
      node.neighbors = neighbors;
    }
  }
}

/// Neighbor of a node across one face.
///
/// Looks for the same-sized cell first; if that cell was never materialized
/// the region is covered by a coarser node, found by retrying from the
/// parent. Layer-0 neighbors whose leaf is fully occluded count as absent.
pub(crate) fn find_neighbor(
  data: &SvoData,
  layer_index: LayerIndex,
  node_index: NodeIndex,
  direction: Direction,
) -> Option<NodeAddress> {
  let mut current = NodeAddress::new(layer_index, node_index);

  loop {
    let layer = data.layer(current.layer)?;
    let node = layer.node(current.node_index)?;

    let coords = morton::decode_coords(node.morton_code).as_ivec3() + direction.offset();
    if !layer.contains_coords(coords) {
      return None;
    }

    let target = morton::encode_coords(coords.as_uvec3());
    if let Some(found) = layer.find_node_index_from(current.node_index, target) {
      let address = NodeAddress::new(current.layer, found);
      if current.layer == 0 && data.leaf_of(address).is_some_and(|leaf| leaf.is_completely_occluded()) {
        return None;
      }
      return Some(address);
    }

    current = node.parent?;
  }
}
