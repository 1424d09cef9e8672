//! Thread-safe in-memory [`CredentialStore`] implementation for tests and demos.

// self
use crate::{
	_prelude::*,
	credential::Credential,
	store::{CredentialStore, StoreError},
};

/// In-process credential store backed by a `RwLock`-protected map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<String, Credential>>>);
impl MemoryStore {
	/// Number of stored entries; useful in tests asserting no stray mutations.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether the store holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryStore {
	fn add_or_update(&self, key: &str, credential: &Credential) -> Result<(), StoreError> {
		self.0.write().insert(key.to_owned(), credential.clone());

		Ok(())
	}

	fn get(&self, key: &str) -> Result<Option<Credential>, StoreError> {
		Ok(self.0.read().get(key).cloned())
	}

	fn remove(&self, key: &str) -> Result<bool, StoreError> {
		Ok(self.0.write().remove(key).is_some())
	}
}
