//! Per-client bookkeeping so in-flight operations can be cancelled on disconnect.
//!
//! An `Arc<AtomicBool>` is shared between the registry and every [`ClientHandle`] clone handed
//! to a spawned handler: a handler that resumes after disconnect observes `is_alive() == false`
//! and discards its result rather than writing it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::task::AbortHandle;

/// A weak, checkable reference to "is my connection still alive", held by a spawned handler.
#[derive(Clone)]
pub struct ClientHandle {
	alive: Arc<AtomicBool>,
}

impl ClientHandle {
	/// Whether the owning connection is still registered.
	pub fn is_alive(&self) -> bool {
		self.alive.load(Ordering::Acquire)
	}
}

/// Tracks the live in-flight operations for one connection so they can be cancelled as a unit.
pub struct ClientRegistry {
	alive: Arc<AtomicBool>,
	pending: Mutex<Vec<AbortHandle>>,
}

impl Default for ClientRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl ClientRegistry {
	/// Registers a new client, alive from construction.
	pub fn new() -> Self {
		Self { alive: Arc::new(AtomicBool::new(true)), pending: Mutex::new(Vec::new()) }
	}

	/// Hands out a checkable handle for a spawned [`crate::request::RequestHandler`] task.
	pub fn handle(&self) -> ClientHandle {
		ClientHandle { alive: Arc::clone(&self.alive) }
	}

	/// Links a spawned task's abort handle into this client's in-flight list.
	pub fn track(&self, abort: AbortHandle) {
		let mut pending = self.pending.lock().unwrap();
		pending.retain(|h| !h.is_finished());
		pending.push(abort);
	}

	/// Unregisters the client: every still-linked `PendingOp` is unlinked, its scheduled
	/// resumption withdrawn, and the client handle nulled before this call returns.
	pub fn disconnect(&self) {
		self.alive.store(false, Ordering::Release);
		for abort in self.pending.lock().unwrap().drain(..) {
			abort.abort();
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handle_reports_alive_until_disconnect() {
		let registry = ClientRegistry::new();
		let handle = registry.handle();
		assert!(handle.is_alive());
		registry.disconnect();
		assert!(!handle.is_alive());
	}

	#[tokio::test]
	async fn disconnect_aborts_tracked_tasks() {
		let registry = ClientRegistry::new();
		let task = tokio::spawn(async {
			tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
		});
		registry.track(task.abort_handle());
		registry.disconnect();
		let result = task.await;
		assert!(result.unwrap_err().is_cancelled());
	}
}
