//! Host provider contract and the ordered provider registry.

pub mod github;

pub use github::GitHubProvider;

// self
use crate::{_prelude::*, credential::Credential, input::InputArguments};

/// Boxed future returned by [`HostProvider`] operations.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// A pluggable policy object that knows how to authenticate against one family of
/// Git hosting services.
pub trait HostProvider
where
	Self: Send + Sync,
{
	/// Stable identifier of the provider.
	fn id(&self) -> &'static str;

	/// Human-readable provider name.
	fn name(&self) -> &'static str;

	/// Authority identifiers this provider can service.
	fn supported_authority_ids(&self) -> &'static [&'static str];

	/// Pure predicate deciding whether this provider owns the queried remote.
	fn is_supported(&self, input: &InputArguments) -> bool;

	/// Derives the provider half of the storage key: the normalized service URL.
	///
	/// Two queries the provider considers "the same service" must produce the
	/// same key.
	fn credential_key(&self, input: &InputArguments) -> Result<String>;

	/// Runs the authentication-mode negotiation and credential-generation flow.
	fn generate<'a>(&'a self, input: &'a InputArguments) -> ProviderFuture<'a, Credential>;

	/// Releases resources held by the provider at process shutdown.
	fn dispose(&mut self) -> Result<(), DisposeError> {
		Ok(())
	}
}

/// Failure raised while tearing down a provider.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Failed to dispose host provider '{provider}': {message}.")]
pub struct DisposeError {
	/// Identifier of the provider that failed to shut down.
	pub provider: &'static str,
	/// Human-readable failure payload.
	pub message: String,
}

/// Ordered collection of host providers.
///
/// Registration order is significant: the first registered provider whose
/// [`HostProvider::is_supported`] predicate matches the query wins.
#[derive(Default)]
pub struct HostProviderRegistry {
	providers: Vec<Box<dyn HostProvider>>,
}
impl HostProviderRegistry {
	/// Appends a provider, preserving registration order.
	pub fn register(&mut self, provider: Box<dyn HostProvider>) {
		self.providers.push(provider);
	}

	/// Selects the first registered provider that supports the query.
	///
	/// No matching provider is fatal to the command; there is no retry.
	pub fn get_provider(&self, input: &InputArguments) -> Result<&dyn HostProvider> {
		self.providers
			.iter()
			.find(|p| p.is_supported(input))
			.map(AsRef::as_ref)
			.ok_or(Error::NoProvider)
	}

	/// Disposes every registered provider exactly once.
	///
	/// Every provider is attempted even when an earlier one fails; the first
	/// failure is returned after the sweep completes.
	pub fn dispose(&mut self) -> Result<(), DisposeError> {
		let mut first_failure = None;

		for provider in &mut self.providers {
			if let Err(e) = provider.dispose() {
				tracing::warn!(provider = provider.id(), error = %e, "provider disposal failed");

				first_failure.get_or_insert(e);
			}
		}

		self.providers.clear();

		match first_failure {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}
}
impl Debug for HostProviderRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("HostProviderRegistry")
			.field("providers", &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>())
			.finish()
	}
}
