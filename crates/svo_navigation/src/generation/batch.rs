//! Batch Generation - build several navigation volumes concurrently.
//!
//! Volumes are independent, so each one is generated as its own rayon task
//! and handed back over a channel.
//!
//! # Usage
//!
//! ```ignore
//! let mut batch = BatchGenerator::new();
//!
//! let id = batch.submit(bounds, settings, Arc::new(occluders));
//!
//! // Poll each frame (non-blocking)
//! for volume in batch.poll() {
//!     if let Ok(data) = volume.result {
//!         // Swap the new store in
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{self as channel, Receiver, TryRecvError};

use super::{generate_cancellable, GenerationStats, OcclusionOracle};
use crate::bounds::Aabb;
use crate::config::{GenerationError, GenerationSettings};
use crate::octree::SvoData;

/// Identifier of a submitted volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VolumeId(u64);

impl VolumeId {
	fn next() -> Self {
		static COUNTER: AtomicU64 = AtomicU64::new(0);
		Self(COUNTER.fetch_add(1, Ordering::Relaxed))
	}
}

/// A finished volume.
#[derive(Debug)]
pub struct GeneratedVolume {
	pub volume_id: VolumeId,
	/// The complete store, or why it could not be built.
	pub result: Result<(SvoData, GenerationStats), GenerationError>,
}

/// Generates independent volumes on rayon's thread pool.
///
/// Cancelling stops in-flight builds at their next stage boundary and drops
/// their results, so only complete stores are ever returned.
pub struct BatchGenerator {
	pending: Vec<(VolumeId, Receiver<GeneratedVolume>)>,
	cancel: Arc<AtomicBool>,
}

impl BatchGenerator {
	pub fn new() -> Self {
		Self {
			pending: Vec::new(),
			cancel: Arc::new(AtomicBool::new(false)),
		}
	}

	/// Start building a volume (non-blocking).
	pub fn submit<O: OcclusionOracle + 'static>(
		&mut self,
		volume_bounds: Aabb,
		settings: GenerationSettings,
		oracle: Arc<O>,
	) -> VolumeId {
		let volume_id = VolumeId::next();
		let (sender, receiver) = channel::bounded(1);
		let cancel = Arc::clone(&self.cancel);

		rayon::spawn(move || {
			if cancel.load(Ordering::Relaxed) {
				return;
			}
			let result = generate_cancellable(volume_bounds, &settings, oracle.as_ref(), Some(cancel.as_ref()));
			if matches!(result, Err(GenerationError::Cancelled)) {
				return;
			}
			// Ignore send error (receiver dropped = cancelled)
			let _ = sender.send(GeneratedVolume { volume_id, result });
		});

		self.pending.push((volume_id, receiver));
		volume_id
	}

	/// Collect finished volumes (non-blocking).
	pub fn poll(&mut self) -> Vec<GeneratedVolume> {
		let mut completed = Vec::new();

		self.pending.retain(|(_, receiver)| match receiver.try_recv() {
			Ok(volume) => {
				completed.push(volume);
				false
			}
			Err(TryRecvError::Empty) => true,
			Err(TryRecvError::Disconnected) => false,
		});

		completed
	}

	/// Block until every pending volume is done.
	pub fn wait_all(&mut self) -> Vec<GeneratedVolume> {
		self
			.pending
			.drain(..)
			.filter_map(|(_, receiver)| receiver.recv().ok())
			.collect()
	}

	pub fn pending_count(&self) -> usize {
		self.pending.len()
	}

	pub fn is_busy(&self) -> bool {
		!self.pending.is_empty()
	}

	/// Stop all pending builds and discard their results.
	///
	/// Later submissions are unaffected.
	pub fn cancel_all(&mut self) {
		#[cfg(feature = "tracing")]
		tracing::debug!(pending = self.pending.len(), "cancelling volume generation");

		self.cancel.store(true, Ordering::Relaxed);
		self.cancel = Arc::new(AtomicBool::new(false));
		self.pending.clear();
	}
}

impl Default for BatchGenerator {
	fn default() -> Self {
		Self::new()
	}
}
