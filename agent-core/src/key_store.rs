//! The `KeyStore` interface and its invariants.
//!
//! An interface here, a single backend (`InMemoryKeyStore`) in the sibling `agent-memstore`
//! crate — swapping backends never touches request dispatch.

use std::sync::Arc;

use crate::key::{Key, KeyVersion};
use crate::wire::Encoder;

/// Sorted collection of loaded keys with insertion, lookup, deletion, and enumeration.
///
/// # Invariants
/// 1. Ordered by `(version, public_blob)`, `public_blob` compared lexicographically as raw
///    bytes. This order is externally observable: [`KeyStore::list_serialized`] follows it.
/// 2. No two stored keys share the same `(version, public_blob)` pair.
/// 3. `public_blob` bytes are owned by the store entry and stable for the entry's lifetime.
/// 4. [`KeyStore::nth`] enumeration by version returns a contiguous run of entries.
pub trait KeyStore: Send + Sync {
	/// Inserts `key`. Returns `Err(key)` without mutating the store if an entry with the same
	/// `(version, public_blob)` already exists — the caller owns zeroing the rejected key.
	fn add(&self, key: Key) -> Result<(), Key>;

	/// O(log n) lookup by `(version, public_blob)`.
	fn find(&self, version: KeyVersion, public_blob: &[u8]) -> Option<Arc<Key>>;

	/// Removes and returns the entry at `(version, public_blob)`, if present.
	fn remove(&self, version: KeyVersion, public_blob: &[u8]) -> Option<Arc<Key>>;

	/// Drops every entry of the given version, returning the count removed.
	fn remove_all(&self, version: KeyVersion) -> usize;

	/// Number of entries of the given version.
	fn count(&self, version: KeyVersion) -> usize;

	/// The `index`-th entry of the given version, in sort order.
	fn nth(&self, version: KeyVersion, index: usize) -> Option<Arc<Key>>;

	/// Writes the version-specific list reply body into `out`.
	fn list_serialized(&self, version: KeyVersion, out: &mut Encoder) {
		let n = self.count(version);
		out.put_uint32(n as u32);
		for i in 0..n {
			let Some(key) = self.nth(version, i) else { break };
			match version {
				KeyVersion::V1 => out.put_data(&key.public_blob),
				KeyVersion::V2 => out.put_string(&key.public_blob),
			}
			out.put_string(key.comment.as_bytes());
		}
	}
}
