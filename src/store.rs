//! Storage contracts and built-in credential store implementations.
//!
//! The OS secure store is an external collaborator: an opaque key/value map with
//! add-or-update, get, and remove operations. [`MemoryStore`] backs tests and
//! demos, [`FileStore`] provides a portable on-disk fallback, and `KeyringStore`
//! (feature `native-keyring`) talks to the platform keychain.

pub mod file;
#[cfg(feature = "native-keyring")] pub mod keyring;
pub mod memory;

pub use file::FileStore;
#[cfg(feature = "native-keyring")] pub use keyring::KeyringStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, credential::Credential};

/// Persistence contract for Git credentials, keyed by the derived storage key.
///
/// Access is process-local and single-threaded per invocation; implementations
/// only need interior mutability, not cross-process coordination.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential stored under `key`.
	fn add_or_update(&self, key: &str, credential: &Credential) -> Result<(), StoreError>;

	/// Fetches the credential stored under `key`, if present.
	fn get(&self, key: &str) -> Result<Option<Credential>, StoreError>;

	/// Removes the entry for `key`. Removing an absent key is a no-op; the return
	/// value reports whether an entry existed.
	fn remove(&self, key: &str) -> Result<bool, StoreError>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Serialization failure surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Credential store failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
