//! Search bookkeeping: the node pool and the open list.
//!
//! Search nodes live in an arena and refer to each other by index, so the
//! pool can grow while indices are held.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::ops::{Index, IndexMut};

use crate::types::NodeAddress;

/// Index of a [`SearchNode`] in its pool.
pub type SearchNodeIndex = u32;

/// Per-cell state of one search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SearchNode {
  pub address: NodeAddress,
  /// Cost of the best known route from the start.
  pub traversal_cost: f32,
  /// `traversal_cost` plus heuristic, after node-size compensation.
  pub total_cost: f32,
  /// [`NodeAddress::INVALID`] until a parent is assigned.
  pub parent_address: NodeAddress,
  pub parent_index: Option<SearchNodeIndex>,
  pub index: SearchNodeIndex,
  pub is_open: bool,
  pub is_closed: bool,
}

impl SearchNode {
  fn new(address: NodeAddress, index: SearchNodeIndex) -> Self {
    Self {
      address,
      traversal_cost: f32::INFINITY,
      total_cost: f32::INFINITY,
      parent_address: NodeAddress::INVALID,
      parent_index: None,
      index,
      is_open: false,
      is_closed: false,
    }
  }

  #[inline]
  pub fn has_parent(&self) -> bool {
    self.parent_index.is_some()
  }
}

/// Arena of search nodes keyed by address.
#[derive(Debug, Default)]
pub struct SearchNodePool {
  nodes: Vec<SearchNode>,
  indices: HashMap<NodeAddress, SearchNodeIndex>,
}

impl SearchNodePool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Index of the node for `address`, created on first visit.
  pub fn find_or_add(&mut self, address: NodeAddress) -> SearchNodeIndex {
    if let Some(&index) = self.indices.get(&address) {
      return index;
    }
    let index = self.nodes.len() as SearchNodeIndex;
    self.nodes.push(SearchNode::new(address, index));
    self.indices.insert(address, index);
    index
  }

  #[inline]
  pub fn find(&self, address: NodeAddress) -> Option<SearchNodeIndex> {
    self.indices.get(&address).copied()
  }

  #[inline]
  pub fn get(&self, index: SearchNodeIndex) -> Option<&SearchNode> {
    self.nodes.get(index as usize)
  }

  #[inline]
  pub(crate) fn get_mut(&mut self, index: SearchNodeIndex) -> Option<&mut SearchNode> {
    self.nodes.get_mut(index as usize)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn clear(&mut self) {
    self.nodes.clear();
    self.indices.clear();
  }

  pub fn iter(&self) -> impl Iterator<Item = &SearchNode> {
    self.nodes.iter()
  }

  /// Addresses from the chain's root down to `index`.
  ///
  /// `None` when the chain is longer than `max_length`, which only happens
  /// on a cyclic parent chain.
  pub fn address_chain(&self, index: SearchNodeIndex, max_length: usize) -> Option<Vec<NodeAddress>> {
    let mut chain = Vec::new();
    let mut current = Some(index);
    while let Some(index) = current {
      if chain.len() >= max_length {
        return None;
      }
      let node = self.get(index)?;
      chain.push(node.address);
      current = node.parent_index;
    }
    chain.reverse();
    Some(chain)
  }
}

impl Index<SearchNodeIndex> for SearchNodePool {
  type Output = SearchNode;

  #[inline]
  fn index(&self, index: SearchNodeIndex) -> &SearchNode {
    &self.nodes[index as usize]
  }
}

impl IndexMut<SearchNodeIndex> for SearchNodePool {
  #[inline]
  fn index_mut(&mut self, index: SearchNodeIndex) -> &mut SearchNode {
    &mut self.nodes[index as usize]
  }
}

/// Heap entry; the node's cost when it was pushed.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
  total_cost: f32,
  index: SearchNodeIndex,
}

impl PartialEq for OpenEntry {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for OpenEntry {
  // Reversed: BinaryHeap is a max-heap. Ties go to the older node.
  fn cmp(&self, other: &Self) -> Ordering {
    other
      .total_cost
      .total_cmp(&self.total_cost)
      .then_with(|| other.index.cmp(&self.index))
  }
}

/// Min-heap on total cost.
///
/// Improving an open node pushes it again; the outdated entry is dropped
/// when it surfaces.
#[derive(Debug, Default)]
pub struct OpenList {
  heap: BinaryHeap<OpenEntry>,
}

impl OpenList {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, node: &SearchNode) {
    self.heap.push(OpenEntry {
      total_cost: node.total_cost,
      index: node.index,
    });
  }

  /// Cheapest open node still current in `pool`.
  pub fn pop(&mut self, pool: &SearchNodePool) -> Option<SearchNodeIndex> {
    while let Some(entry) = self.heap.pop() {
      let Some(node) = pool.get(entry.index) else {
        continue;
      };
      if node.is_closed || node.total_cost != entry.total_cost {
        continue;
      }
      return Some(entry.index);
    }
    None
  }

  /// Entries in the heap, outdated ones included.
  pub fn len(&self) -> usize {
    self.heap.len()
  }

  pub fn is_empty(&self) -> bool {
    self.heap.is_empty()
  }

  pub fn clear(&mut self) {
    self.heap.clear();
  }
}
