//! A per-connection FIFO that preserves reply ordering across asynchronous handlers.
//!
//! A [`ResponseSlot`] is created, in arrival order, for every accepted request
//! ([`ResponseQueue::push`]). Handlers may finish in any order; [`ResponseQueue::complete`]
//! marks a slot ready and drains the contiguous ready prefix from the head, writing each one
//! out before the next is even considered. A slot that becomes ready but is not at the head
//! simply waits — a `VecDeque` plus a base offset gives O(1) push/drain without needing an
//! intrusive linked list.

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

/// Identifies one [`ResponseSlot`] within its connection's queue, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSlotId(u64);

struct Inner {
	/// `slots[i]` is the slot at arrival index `base + i`. `None` means still pending.
	slots: VecDeque<Option<Vec<u8>>>,
	base: u64,
}

/// FIFO of accepted-but-not-yet-written replies for one connection.
pub struct ResponseQueue {
	inner: Mutex<Inner>,
	out: UnboundedSender<Vec<u8>>,
}

impl ResponseQueue {
	/// Creates an empty queue that writes finalized, already-framed reply bytes to `out` in
	/// strict arrival order.
	pub fn new(out: UnboundedSender<Vec<u8>>) -> Self {
		Self { inner: Mutex::new(Inner { slots: VecDeque::new(), base: 0 }), out }
	}

	/// Allocates a new slot at request-arrival time and returns its id.
	pub fn push(&self) -> ResponseSlotId {
		let mut inner = self.inner.lock().unwrap();
		let id = inner.base + inner.slots.len() as u64;
		inner.slots.push_back(None);
		ResponseSlotId(id)
	}

	/// Marks `id`'s slot ready with its finalized, already-framed reply bytes, then drains the
	/// head of the queue while it is ready. A slot that is not at the head simply waits.
	pub fn complete(&self, id: ResponseSlotId, framed_bytes: Vec<u8>) {
		let ready = {
			let mut inner = self.inner.lock().unwrap();
			let pos = (id.0 - inner.base) as usize;
			if pos >= inner.slots.len() {
				// slot already drained (cannot happen absent a bug, but never panic on it)
				return;
			}
			inner.slots[pos] = Some(framed_bytes);

			let mut ready = Vec::new();
			while matches!(inner.slots.front(), Some(Some(_))) {
				let bytes = inner.slots.pop_front().flatten().expect("checked Some above");
				inner.base += 1;
				ready.push(bytes);
			}
			ready
		};
		for bytes in ready {
			// the receiving writer task may already be gone (connection torn down); dropping
			// the reply silently is correct, there's no one left to write it to.
			let _ = self.out.send(bytes);
		}
	}

	/// Number of slots still awaiting completion, for diagnostics/tests.
	pub fn pending_count(&self) -> usize {
		self.inner.lock().unwrap().slots.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tokio::sync::mpsc::unbounded_channel;

	/// Out-of-order completion still preserves egress order.
	#[test]
	fn out_of_order_completion_preserves_fifo_egress() {
		let (tx, mut rx) = unbounded_channel();
		let queue = ResponseQueue::new(tx);

		let r1 = queue.push(); // slow "sign"
		let r2 = queue.push(); // fast "list"
		assert_eq!(queue.pending_count(), 2);

		// R2 finishes first...
		queue.complete(r2, b"r2-reply".to_vec());
		// ...but nothing is emitted yet, because R1 is still pending at the head.
		assert!(rx.try_recv().is_err());

		// Once R1 completes, both drain in arrival order.
		queue.complete(r1, b"r1-reply".to_vec());
		assert_eq!(rx.try_recv().unwrap(), b"r1-reply".to_vec());
		assert_eq!(rx.try_recv().unwrap(), b"r2-reply".to_vec());
		assert_eq!(queue.pending_count(), 0);
	}

	#[test]
	fn completion_at_head_drains_immediately() {
		let (tx, mut rx) = unbounded_channel();
		let queue = ResponseQueue::new(tx);
		let r1 = queue.push();
		queue.complete(r1, b"only".to_vec());
		assert_eq!(rx.try_recv().unwrap(), b"only".to_vec());
	}

	#[test]
	fn many_slots_drain_in_arrival_order_regardless_of_completion_order() {
		let (tx, mut rx) = unbounded_channel();
		let queue = ResponseQueue::new(tx);
		let ids: Vec<_> = (0..5).map(|_| queue.push()).collect();
		for &id in ids.iter().rev() {
			queue.complete(id, format!("{}", id.0).into_bytes());
		}
		for i in 0..5 {
			assert_eq!(rx.try_recv().unwrap(), format!("{}", i).into_bytes());
		}
	}
}
