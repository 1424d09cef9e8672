//! GitHub host provider: authentication-mode negotiation and credential generation.

// self
use crate::{
	_prelude::*,
	api::{CreateTokenOutcome, RemoteApi},
	auth::{AuthenticationModes, AuthenticationPrompt, AuthenticationPromptResult, TwoFactorChannel},
	credential::Credential,
	input::InputArguments,
	provider::{HostProvider, ProviderFuture},
	settings::Settings,
	store::CredentialStore,
};

const GITHUB_BASE_HOST: &str = "github.com";
const GIST_BASE_HOST: &str = "gist.github.com";
/// The hosted service mandates a single flow.
const DOT_COM_MODES: AuthenticationModes = AuthenticationModes::OAUTH;
/// Oldest self-hosted release whose OAuth endpoints the helper can drive.
const MIN_ENTERPRISE_OAUTH_VERSION: (u64, u64, u64) = (2, 21, 0);
const OAUTH_SCOPES: &[&str] = &["repo", "gist", "workflow"];
const TOKEN_SCOPES: &[&str] = &["gist", "repo"];
const AUTH_MODES_ENV: &str = "GCB_GITHUB_AUTH_MODES";
const AUTH_MODES_CONFIG: &str = "gitHubAuthModes";

/// Host provider for github.com, gist.github.com, and self-hosted instances.
pub struct GitHubProvider {
	api: Arc<dyn RemoteApi>,
	prompt: Arc<dyn AuthenticationPrompt>,
	settings: Arc<dyn Settings>,
	store: Arc<dyn CredentialStore>,
}
impl GitHubProvider {
	/// Builds the provider from its collaborators.
	pub fn new(
		api: Arc<dyn RemoteApi>,
		prompt: Arc<dyn AuthenticationPrompt>,
		settings: Arc<dyn Settings>,
		store: Arc<dyn CredentialStore>,
	) -> Self {
		Self { api, prompt, settings, store }
	}

	fn is_github_host(hostname: &str) -> bool {
		let hostname = hostname.to_ascii_lowercase();

		hostname == GITHUB_BASE_HOST
			|| hostname == GIST_BASE_HOST
			|| hostname.starts_with("github.")
			|| hostname.ends_with(".github.com")
	}

	fn is_dot_com(target: &Url) -> bool {
		target.host_str().is_some_and(|h| h.eq_ignore_ascii_case(GITHUB_BASE_HOST))
	}

	/// Canonicalizes the service URL used as the storage-key component.
	///
	/// Gists are git-backed repositories under the hood and share credentials
	/// with the primary domain, so the gist host collapses onto it. The trailing
	/// path separator is always trimmed; normalization is idempotent.
	fn normalize_service(url: &Url) -> String {
		if url.host_str().is_some_and(|h| h.eq_ignore_ascii_case(GIST_BASE_HOST)) {
			return format!("https://{GITHUB_BASE_HOST}");
		}

		url.as_str().trim_end_matches('/').to_owned()
	}

	/// Determines which authentication modes the target instance supports.
	///
	/// Never fails: a malformed override falls through to detection, and a failed
	/// metadata probe falls back to the conservative `{Basic, OAuth}` set with a
	/// user-visible warning.
	pub async fn supported_modes(&self, target: &Url) -> AuthenticationModes {
		if let Some(value) = self.settings.try_get(AUTH_MODES_ENV, AUTH_MODES_CONFIG) {
			match value.parse::<AuthenticationModes>() {
				Ok(modes) if !modes.is_none() => {
					tracing::debug!(%modes, "authentication modes override present");

					return modes;
				},
				_ => {
					tracing::warn!(
						value = %value,
						"invalid value for the authentication modes override; detecting instead"
					);
				},
			}
		}

		if Self::is_dot_com(target) {
			tracing::debug!(%target, modes = %DOT_COM_MODES, "target is the hosted service");

			return DOT_COM_MODES;
		}

		tracing::debug!(%target, "self-hosted instance; probing supported authentication modes");

		match self.api.meta_info(target).await {
			Ok(meta) => {
				let mut modes = AuthenticationModes::NONE;

				if meta.verifiable_password_authentication {
					modes |= AuthenticationModes::BASIC;
				}
				if meta
					.installed_version
					.as_deref()
					.and_then(parse_version)
					.is_some_and(|v| v >= MIN_ENTERPRISE_OAUTH_VERSION)
				{
					modes |= AuthenticationModes::OAUTH;
				}

				tracing::debug!(
					version = meta.installed_version.as_deref().unwrap_or("unknown"),
					%modes,
					"instance metadata resolved"
				);

				modes
			},
			Err(e) => {
				tracing::warn!(%target, error = %e, "metadata probe failed");
				eprintln!(
					"warning: failed to query '{target}' for supported authentication schemes."
				);

				AuthenticationModes::BASIC | AuthenticationModes::OAUTH
			},
		}
	}

	async fn generate_oauth(&self, target: &Url) -> Result<Credential> {
		let token = self.prompt.oauth_token(target, OAUTH_SCOPES).await?;
		let user = self.api.user_info(target, &token.access_token).await?;

		Ok(Credential::new(user.login, token.access_token))
	}

	/// Basic path: mint a personal access token, retrying exactly once on a
	/// two-factor challenge. Anything short of success after that is fatal.
	async fn generate_personal_token(&self, target: &Url, basic: &Credential) -> Result<Credential> {
		let mut outcome =
			self.api.create_personal_token(target, basic, None, TOKEN_SCOPES).await?;

		if let Some(channel) = match outcome {
			CreateTokenOutcome::TwoFactorApp => Some(TwoFactorChannel::App),
			CreateTokenOutcome::TwoFactorSms => Some(TwoFactorChannel::Sms),
			_ => None,
		} {
			let code = self.prompt.two_factor_code(target, channel).await?;

			outcome =
				self.api.create_personal_token(target, basic, Some(&code), TOKEN_SCOPES).await?;
		}

		match outcome {
			CreateTokenOutcome::Success(token) => {
				tracing::debug!(%target, "token acquisition succeeded");

				let user = self.api.user_info(target, &token).await?;

				Ok(Credential::new(user.login, token))
			},
			_ => Err(Error::InteractiveLogonFailed { url: target.to_string() }),
		}
	}
}
impl HostProvider for GitHubProvider {
	fn id(&self) -> &'static str {
		"github"
	}

	fn name(&self) -> &'static str {
		"GitHub"
	}

	fn supported_authority_ids(&self) -> &'static [&'static str] {
		&["github"]
	}

	fn is_supported(&self, input: &InputArguments) -> bool {
		let Some((hostname, _)) = input.host_and_port() else {
			return false;
		};

		// HTTP is claimed as supported so the generation flow can fail with a
		// descriptive error instead of silently skipping the provider.
		input
			.protocol()
			.is_some_and(|p| p.eq_ignore_ascii_case("http") || p.eq_ignore_ascii_case("https"))
			&& Self::is_github_host(hostname)
	}

	fn credential_key(&self, input: &InputArguments) -> Result<String> {
		Ok(Self::normalize_service(&input.remote_url()?))
	}

	fn generate<'a>(&'a self, input: &'a InputArguments) -> ProviderFuture<'a, Credential> {
		Box::pin(async move {
			// Unencrypted transport is rejected before any network activity.
			if input.protocol().is_some_and(|p| p.eq_ignore_ascii_case("http")) {
				return Err(Error::InsecureProtocol {
					host: input.host().unwrap_or(GITHUB_BASE_HOST).to_owned(),
				});
			}

			let target = input.remote_url()?;
			let service = self.credential_key(input)?;
			let modes = self.supported_modes(&target).await;

			match self.prompt.select(&target, input.username(), modes).await? {
				AuthenticationPromptResult::Basic(basic) => {
					let credential = self.generate_personal_token(&target, &basic).await?;

					// HACK: store the token immediately in case it is not yet valid
					// for SSO. If an organization requires single-sign-on approval,
					// Git fails with a 403 and calls neither 'store' nor 'erase'; the
					// user authorizes the token on the web and retries the original
					// operation with the same, now approved, token.
					self.store.add_or_update(&format!("git:{service}"), &credential)?;

					Ok(credential)
				},
				AuthenticationPromptResult::OAuth => self.generate_oauth(&target).await,
			}
		})
	}
}

/// Parses a dotted product version, tolerating missing minor/patch components.
fn parse_version(raw: &str) -> Option<(u64, u64, u64)> {
	let mut parts = raw.split('.');
	let major = parts.next()?.parse().ok()?;
	let minor = parts.next().map_or(Some(0), |p| p.parse().ok())?;
	let patch = parts.next().map_or(Some(0), |p| p.parse().ok())?;

	Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		api::{ApiError, ApiFuture, MetaInfo, UserInfo},
		auth::{OAuthToken, PromptError, PromptFuture},
		input::InputArguments,
		settings::MapSettings,
		store::MemoryStore,
	};

	/// Spy API double: scripted responses plus call counters, so tests can assert
	/// that certain paths perform zero network activity.
	#[derive(Default)]
	struct SpyApi {
		meta: Option<MetaInfo>,
		meta_fails: bool,
		token_outcomes: RwLock<Vec<CreateTokenOutcome>>,
		meta_calls: AtomicUsize,
		token_calls: AtomicUsize,
		user_calls: AtomicUsize,
	}
	impl SpyApi {
		fn total_calls(&self) -> usize {
			self.meta_calls.load(Ordering::SeqCst)
				+ self.token_calls.load(Ordering::SeqCst)
				+ self.user_calls.load(Ordering::SeqCst)
		}

		fn probe_failure() -> ApiError {
			ApiError::UnexpectedResponse { url: "https://ghe.example.com/meta".into(), status: 503 }
		}
	}
	impl RemoteApi for SpyApi {
		fn meta_info<'a>(&'a self, _: &'a Url) -> ApiFuture<'a, MetaInfo> {
			self.meta_calls.fetch_add(1, Ordering::SeqCst);

			let result = if self.meta_fails {
				Err(Self::probe_failure())
			} else {
				Ok(self.meta.clone().unwrap_or_default())
			};

			Box::pin(async move { result })
		}

		fn create_personal_token<'a>(
			&'a self,
			_: &'a Url,
			_: &'a Credential,
			_: Option<&'a str>,
			_: &'a [&'a str],
		) -> ApiFuture<'a, CreateTokenOutcome> {
			self.token_calls.fetch_add(1, Ordering::SeqCst);

			let outcome = {
				let mut scripted = self.token_outcomes.write();

				if scripted.is_empty() {
					CreateTokenOutcome::Failure { status: Some(401), message: "unscripted".into() }
				} else {
					scripted.remove(0)
				}
			};

			Box::pin(async move { Ok(outcome) })
		}

		fn user_info<'a>(&'a self, _: &'a Url, _: &'a str) -> ApiFuture<'a, UserInfo> {
			self.user_calls.fetch_add(1, Ordering::SeqCst);

			Box::pin(async move { Ok(UserInfo { login: "mona".into() }) })
		}
	}

	/// Scripted prompt double.
	struct ScriptedPrompt {
		selection: AuthenticationPromptResult,
		code: &'static str,
		code_calls: AtomicUsize,
	}
	impl ScriptedPrompt {
		fn basic() -> Self {
			Self {
				selection: AuthenticationPromptResult::Basic(Credential::new("mona", "hunter2")),
				code: "123456",
				code_calls: Default::default(),
			}
		}

		fn oauth() -> Self {
			Self {
				selection: AuthenticationPromptResult::OAuth,
				code: "",
				code_calls: Default::default(),
			}
		}
	}
	impl AuthenticationPrompt for ScriptedPrompt {
		fn select<'a>(
			&'a self,
			_: &'a Url,
			_: Option<&'a str>,
			modes: AuthenticationModes,
		) -> PromptFuture<'a, AuthenticationPromptResult> {
			let result = if modes.is_none() {
				Err(PromptError::Declined { reason: "no modes".into() })
			} else {
				Ok(self.selection.clone())
			};

			Box::pin(async move { result })
		}

		fn two_factor_code<'a>(
			&'a self,
			_: &'a Url,
			_: TwoFactorChannel,
		) -> PromptFuture<'a, String> {
			self.code_calls.fetch_add(1, Ordering::SeqCst);

			Box::pin(async move { Ok(self.code.to_owned()) })
		}

		fn oauth_token<'a>(
			&'a self,
			_: &'a Url,
			_: &'a [&'a str],
		) -> PromptFuture<'a, OAuthToken> {
			Box::pin(async move { Ok(OAuthToken { access_token: "oauth-token".into() }) })
		}
	}

	struct Fixture {
		api: Arc<SpyApi>,
		prompt: Arc<ScriptedPrompt>,
		store: MemoryStore,
		provider: GitHubProvider,
	}

	fn fixture(api: SpyApi, prompt: ScriptedPrompt, settings: MapSettings) -> Fixture {
		let api = Arc::new(api);
		let prompt = Arc::new(prompt);
		let store = MemoryStore::default();
		let provider = GitHubProvider::new(
			api.clone(),
			prompt.clone(),
			Arc::new(settings),
			Arc::new(store.clone()),
		);

		Fixture { api, prompt, store, provider }
	}

	fn https_input(host: &str) -> InputArguments {
		InputArguments::new(vec![
			("protocol".into(), "https".into()),
			("host".into(), host.into()),
		])
	}

	fn url(raw: &str) -> Url {
		Url::parse(raw).unwrap()
	}

	#[test]
	fn supports_hosted_and_enterprise_hosts() {
		let f = fixture(SpyApi::default(), ScriptedPrompt::oauth(), MapSettings::default());

		assert!(f.provider.is_supported(&https_input("github.com")));
		assert!(f.provider.is_supported(&https_input("gist.github.com")));
		assert!(f.provider.is_supported(&https_input("github.example.com")));
		assert!(!f.provider.is_supported(&https_input("gitlab.com")));
		assert!(!f.provider.is_supported(&InputArguments::new(vec![
			("protocol".into(), "ssh".into()),
			("host".into(), "github.com".into()),
		])));
	}

	#[test]
	fn normalization_is_idempotent_and_collapses_gists() {
		let github = GitHubProvider::normalize_service(&url("https://github.com/"));

		assert_eq!(github, "https://github.com");
		assert_eq!(GitHubProvider::normalize_service(&url(&github)), github);
		assert_eq!(
			GitHubProvider::normalize_service(&url("https://gist.github.com/mona/abc123")),
			"https://github.com"
		);
	}

	#[tokio::test]
	async fn override_setting_bypasses_detection() {
		let f = fixture(
			SpyApi::default(),
			ScriptedPrompt::oauth(),
			MapSettings::new([(AUTH_MODES_ENV, "oauth")]),
		);
		let modes = f.provider.supported_modes(&url("https://ghe.example.com/")).await;

		assert_eq!(modes, AuthenticationModes::OAUTH);
		assert_eq!(f.api.total_calls(), 0);
	}

	#[tokio::test]
	async fn malformed_override_falls_through_to_detection() {
		let api = SpyApi {
			meta: Some(MetaInfo {
				verifiable_password_authentication: true,
				installed_version: Some("2.12.0".into()),
			}),
			..Default::default()
		};
		let f = fixture(api, ScriptedPrompt::oauth(), MapSettings::new([(AUTH_MODES_ENV, "ntlm")]));
		let modes = f.provider.supported_modes(&url("https://ghe.example.com/")).await;

		assert_eq!(modes, AuthenticationModes::BASIC);
		assert_eq!(f.api.meta_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn dot_com_uses_the_fixed_mode_set_without_probing() {
		let f = fixture(SpyApi::default(), ScriptedPrompt::oauth(), MapSettings::default());
		let modes = f.provider.supported_modes(&url("https://github.com/")).await;

		assert_eq!(modes, DOT_COM_MODES);
		assert_eq!(f.api.total_calls(), 0);
	}

	#[tokio::test]
	async fn enterprise_mode_matrix() {
		let cases = [
			(true, "2.12.0", AuthenticationModes::BASIC),
			(false, "2.22.1", AuthenticationModes::OAUTH),
			(true, "3.0.0", AuthenticationModes::BASIC | AuthenticationModes::OAUTH),
			(false, "2.12.0", AuthenticationModes::NONE),
		];

		for (verifiable, version, expected) in cases {
			let api = SpyApi {
				meta: Some(MetaInfo {
					verifiable_password_authentication: verifiable,
					installed_version: Some(version.into()),
				}),
				..Default::default()
			};
			let f = fixture(api, ScriptedPrompt::oauth(), MapSettings::default());
			let modes = f.provider.supported_modes(&url("https://ghe.example.com/")).await;

			assert_eq!(modes, expected, "verifiable={verifiable} version={version}");
		}
	}

	#[tokio::test]
	async fn metadata_failure_falls_back_to_the_conservative_set() {
		let api = SpyApi { meta_fails: true, ..Default::default() };
		let f = fixture(api, ScriptedPrompt::oauth(), MapSettings::default());
		let modes = f.provider.supported_modes(&url("https://ghe.example.com/")).await;

		assert_eq!(modes, AuthenticationModes::BASIC | AuthenticationModes::OAUTH);
	}

	#[tokio::test]
	async fn http_is_rejected_before_any_network_call() {
		let f = fixture(SpyApi::default(), ScriptedPrompt::oauth(), MapSettings::default());
		let input = InputArguments::new(vec![
			("protocol".into(), "http".into()),
			("host".into(), "github.com".into()),
		]);
		let result = f.provider.generate(&input).await;

		assert!(matches!(result, Err(Error::InsecureProtocol { .. })));
		assert_eq!(f.api.total_calls(), 0);
	}

	#[tokio::test]
	async fn oauth_path_resolves_the_handle_and_does_not_persist() {
		let f = fixture(SpyApi::default(), ScriptedPrompt::oauth(), MapSettings::default());
		let credential = f.provider.generate(&https_input("github.com")).await.unwrap();

		assert_eq!(credential.account, "mona");
		assert_eq!(credential.expose_secret(), "oauth-token");
		// Persistence of the OAuth credential is Git's job via a later `store`.
		assert!(f.store.is_empty());
	}

	#[tokio::test]
	async fn basic_path_persists_eagerly_under_the_normalized_key() {
		let api = SpyApi {
			meta: Some(MetaInfo {
				verifiable_password_authentication: true,
				installed_version: None,
			}),
			token_outcomes: RwLock::new(vec![CreateTokenOutcome::Success("pat-1".into())]),
			..Default::default()
		};
		let f = fixture(api, ScriptedPrompt::basic(), MapSettings::default());
		let credential = f.provider.generate(&https_input("gist.github.com")).await.unwrap();

		assert_eq!(credential.expose_secret(), "pat-1");

		let stored = f.store.get("git:https://github.com").unwrap().unwrap();

		assert_eq!(stored, credential);
	}

	#[tokio::test]
	async fn two_factor_challenge_retries_exactly_once() {
		let api = SpyApi {
			meta: Some(MetaInfo {
				verifiable_password_authentication: true,
				installed_version: None,
			}),
			token_outcomes: RwLock::new(vec![
				CreateTokenOutcome::TwoFactorApp,
				CreateTokenOutcome::Success("pat-2fa".into()),
			]),
			..Default::default()
		};
		let f = fixture(api, ScriptedPrompt::basic(), MapSettings::default());
		let credential = f.provider.generate(&https_input("ghe.example.com")).await.unwrap();

		assert_eq!(credential.expose_secret(), "pat-2fa");
		assert_eq!(f.api.token_calls.load(Ordering::SeqCst), 2);
		assert_eq!(f.prompt.code_calls.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn exhausted_two_factor_fails_without_touching_the_store() {
		let api = SpyApi {
			meta: Some(MetaInfo {
				verifiable_password_authentication: true,
				installed_version: None,
			}),
			token_outcomes: RwLock::new(vec![
				CreateTokenOutcome::TwoFactorSms,
				CreateTokenOutcome::Failure { status: Some(401), message: "bad code".into() },
			]),
			..Default::default()
		};
		let f = fixture(api, ScriptedPrompt::basic(), MapSettings::default());
		let result = f.provider.generate(&https_input("ghe.example.com")).await;

		assert!(matches!(result, Err(Error::InteractiveLogonFailed { .. })));
		assert_eq!(f.api.token_calls.load(Ordering::SeqCst), 2);
		assert!(f.store.is_empty());
	}

	#[test]
	fn version_parsing_tolerates_short_forms() {
		assert_eq!(parse_version("2.22.1"), Some((2, 22, 1)));
		assert_eq!(parse_version("3.1"), Some((3, 1, 0)));
		assert_eq!(parse_version("3"), Some((3, 0, 0)));
		assert_eq!(parse_version("GitHub AE"), None);
	}
}
