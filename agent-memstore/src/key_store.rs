use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use agent_core::key::{Key, KeyVersion};
use agent_core::key_store::KeyStore;

/// In-memory implementation of [`KeyStore`], ordered and deduplicated by `(version, public_blob)`
/// the same way [`BTreeMap`]'s key ordering already guarantees.
#[derive(Default)]
pub struct InMemoryKeyStore {
	keys: Mutex<BTreeMap<(KeyVersion, Vec<u8>), Arc<Key>>>,
}

impl InMemoryKeyStore {
	/// Creates an empty store.
	pub fn new() -> Self {
		Self::default()
	}
}

impl KeyStore for InMemoryKeyStore {
	fn add(&self, key: Key) -> Result<(), Key> {
		let mut keys = self.keys.lock().unwrap();
		let entry_key = (key.version, key.public_blob.clone());
		if keys.contains_key(&entry_key) {
			return Err(key);
		}
		keys.insert(entry_key, Arc::new(key));
		Ok(())
	}

	fn find(&self, version: KeyVersion, public_blob: &[u8]) -> Option<Arc<Key>> {
		self.keys.lock().unwrap().get(&(version, public_blob.to_vec())).cloned()
	}

	fn remove(&self, version: KeyVersion, public_blob: &[u8]) -> Option<Arc<Key>> {
		self.keys.lock().unwrap().remove(&(version, public_blob.to_vec()))
	}

	fn remove_all(&self, version: KeyVersion) -> usize {
		let mut keys = self.keys.lock().unwrap();
		let before = keys.len();
		keys.retain(|(v, _), _| *v != version);
		before - keys.len()
	}

	fn count(&self, version: KeyVersion) -> usize {
		self.keys.lock().unwrap().keys().filter(|(v, _)| *v == version).count()
	}

	fn nth(&self, version: KeyVersion, index: usize) -> Option<Arc<Key>> {
		self.keys
			.lock()
			.unwrap()
			.iter()
			.filter(|((v, _), _)| *v == version)
			.nth(index)
			.map(|(_, k)| Arc::clone(k))
	}
}

#[cfg(test)]
mod tests {
	use agent_core::define_key_store_tests;
	use agent_core::key_store_tests::KeyStoreTestSuite;

	use super::*;

	define_key_store_tests!(InMemoryKeyStoreTest, InMemoryKeyStore, InMemoryKeyStore::new());
}
