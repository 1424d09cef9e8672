//! Native OS keychain backend (Linux Secret Service, Windows Credential Manager,
//! macOS Keychain) via the `keyring` crate.
//!
//! The keychain indexes secrets by (service, account). The helper must look
//! credentials up by storage key alone, so the account half of the pair is stored
//! inside the secret payload as `account\nsecret`.

// self
use crate::{
	credential::Credential,
	store::{CredentialStore, StoreError},
};

/// Credential store backed by the platform keychain.
#[derive(Clone, Debug, Default)]
pub struct KeyringStore;
impl KeyringStore {
	const ACCOUNT: &'static str = "git-credential-broker";

	fn entry(key: &str) -> Result<keyring::Entry, StoreError> {
		keyring::Entry::new(key, Self::ACCOUNT)
			.map_err(|e| StoreError::Backend { message: format!("Keychain unavailable: {e}") })
	}
}
impl CredentialStore for KeyringStore {
	fn add_or_update(&self, key: &str, credential: &Credential) -> Result<(), StoreError> {
		let payload = format!("{}\n{}", credential.account, credential.expose_secret());

		Self::entry(key)?.set_password(&payload).map_err(|e| StoreError::Backend {
			message: format!("Failed to write '{key}' to the keychain: {e}"),
		})
	}

	fn get(&self, key: &str) -> Result<Option<Credential>, StoreError> {
		match Self::entry(key)?.get_password() {
			Ok(payload) => {
				let (account, secret) = payload.split_once('\n').ok_or_else(|| {
					StoreError::Serialization {
						message: format!("Keychain entry '{key}' has an unrecognized layout"),
					}
				})?;

				Ok(Some(Credential::new(account, secret)))
			},
			Err(keyring::Error::NoEntry) => Ok(None),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to read '{key}' from the keychain: {e}"),
			}),
		}
	}

	fn remove(&self, key: &str) -> Result<bool, StoreError> {
		match Self::entry(key)?.delete_credential() {
			Ok(()) => Ok(true),
			Err(keyring::Error::NoEntry) => Ok(false),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to erase '{key}' from the keychain: {e}"),
			}),
		}
	}
}
