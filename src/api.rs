//! Remote API contract for a Git hosting service's REST/meta endpoints.

pub mod rest;

pub use rest::RestApi;

// self
use crate::{_prelude::*, credential::Credential};

/// Boxed future returned by [`RemoteApi`] implementations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + 'a + Send>>;

/// HTTP client for a host's REST and meta endpoints.
///
/// All calls are sequential suspension points within one generation flow; no
/// concurrent fan-out is performed. Timeouts are delegated to the transport.
pub trait RemoteApi
where
	Self: Send + Sync,
{
	/// Queries the instance metadata endpoint used for authentication-mode detection.
	fn meta_info<'a>(&'a self, target: &'a Url) -> ApiFuture<'a, MetaInfo>;

	/// Attempts to mint a scoped personal access token using Basic authorization,
	/// optionally carrying a two-factor `code`.
	fn create_personal_token<'a>(
		&'a self,
		target: &'a Url,
		credential: &'a Credential,
		code: Option<&'a str>,
		scopes: &'a [&'a str],
	) -> ApiFuture<'a, CreateTokenOutcome>;

	/// Resolves the authenticated user's canonical handle for `token`.
	fn user_info<'a>(&'a self, target: &'a Url, token: &'a str) -> ApiFuture<'a, UserInfo>;
}

/// Instance metadata reported by self-hosted deployments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct MetaInfo {
	/// Whether the instance can verify passwords presented over Basic auth.
	#[serde(default)]
	pub verifiable_password_authentication: bool,
	/// Product version string, e.g. `2.22.1`; absent on the hosted service.
	#[serde(default)]
	pub installed_version: Option<String>,
}

/// Authenticated user description.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
	/// Canonical user handle.
	pub login: String,
}

/// Outcome of a personal-access-token exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CreateTokenOutcome {
	/// Token minted.
	Success(String),
	/// Challenged for an authenticator-app code.
	TwoFactorApp,
	/// Challenged for an SMS-delivered code.
	TwoFactorSms,
	/// Exchange rejected for any other reason.
	Failure {
		/// HTTP status returned, when the request completed.
		status: Option<u16>,
		/// Server-supplied failure summary.
		message: String,
	},
}

/// Error type produced by [`RemoteApi`] implementations.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// Transport failure (DNS, TCP, TLS) while calling the host.
	#[error("Network error occurred while calling '{url}'.")]
	Network {
		/// Endpoint the helper was calling.
		url: String,
		/// Transport-specific failure.
		#[source]
		source: reqwest::Error,
	},
	/// The host answered with an unexpected status.
	#[error("Unexpected response from '{url}': HTTP {status}.")]
	UnexpectedResponse {
		/// Endpoint the helper was calling.
		url: String,
		/// HTTP status code.
		status: u16,
	},
	/// The host answered with JSON the helper could not decode.
	#[error("Malformed response from '{url}'.")]
	ResponseParse {
		/// Endpoint the helper was calling.
		url: String,
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
