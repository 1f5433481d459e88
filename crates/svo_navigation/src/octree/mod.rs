//! Octree module: the layered sparse voxel octree of one volume.
//!
//! Occupancy is stored hierarchically. Only nodes whose parent touched an
//! obstacle are materialized, so open space is covered by a few coarse
//! nodes and detail is spent around geometry.
//!
//! # Layer Convention
//!
//! Layer 0 = finest node layer, the top layer holds the single root.
//!
//! ```text
//! Node size (layer L) = voxel_size * 4 * 2^L
//! Leaf voxel size     = voxel_size
//! ```
//!
//! Each layer-0 node found occluded owns a [`Leaf`], a 64-bit mask over its
//! 4x4x4 voxels, instead of further node records.
//!
//! # Module Structure
//!
//! - [`leaf`]: `Leaf` - bit-packed 4x4x4 occupancy
//! - [`node`]: `Node` - Morton code plus parent/child/neighbor links
//! - [`layer`]: `Layer` - Morton-sorted nodes of one level
//! - [`svo_data`]: `SvoData` - the store, position/address mapping

pub mod layer;
pub mod leaf;
pub mod node;
pub mod svo_data;

// Re-exports
pub use layer::Layer;
pub use leaf::Leaf;
pub use node::Node;
pub use svo_data::SvoData;

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
