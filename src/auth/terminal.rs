//! Terminal-backed [`AuthenticationPrompt`] implementation.
//!
//! Prompts are written to standard error and answers are read from the
//! controlling terminal, never from standard input: standard input belongs to
//! the Git credential protocol. The OAuth path uses the device-authorization
//! grant so no local redirect listener is needed.

// std
use std::{
	env,
	io::{BufRead, BufReader, Write},
	time::Duration,
};
// self
use crate::{
	_prelude::*,
	api::ApiError,
	auth::{
		AuthenticationModes, AuthenticationPrompt, AuthenticationPromptResult, OAuthToken,
		PromptError, PromptFuture, TwoFactorChannel,
	},
	credential::Credential,
};

/// OAuth application identifier presented during the device grant.
const OAUTH_CLIENT_ID: &str = "0120e057bd645470c1ed";
/// Environment toggle Git uses to forbid terminal prompting.
const GIT_TERMINAL_PROMPT: &str = "GIT_TERMINAL_PROMPT";

/// Interactive prompt that talks to the user over the controlling terminal.
#[derive(Clone, Debug, Default)]
pub struct TerminalPrompt {
	client: ReqwestClient,
}
impl TerminalPrompt {
	/// Wraps an existing reqwest client for the device-grant exchanges.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client }
	}

	fn ensure_interactive() -> Result<(), PromptError> {
		match env::var(GIT_TERMINAL_PROMPT) {
			Ok(value) if value.trim() == "0" => Err(PromptError::NonInteractive),
			_ => Ok(()),
		}
	}

	fn ask(prompt: &str) -> Result<String, PromptError> {
		Self::ensure_interactive()?;

		eprint!("{prompt}");
		std::io::stderr().flush()?;

		let mut answer = String::new();

		Self::terminal_reader()?.read_line(&mut answer)?;

		Ok(answer.trim().to_owned())
	}

	#[cfg(unix)]
	fn terminal_reader() -> Result<Box<dyn BufRead>, PromptError> {
		match std::fs::File::open("/dev/tty") {
			Ok(tty) => Ok(Box::new(BufReader::new(tty))),
			// No controlling terminal; fall back to the inherited stdin handle.
			Err(_) => Ok(Box::new(BufReader::new(std::io::stdin()))),
		}
	}

	#[cfg(not(unix))]
	fn terminal_reader() -> Result<Box<dyn BufRead>, PromptError> {
		Ok(Box::new(BufReader::new(std::io::stdin())))
	}

	fn login_base(target: &Url) -> String {
		let host = target.host_str().unwrap_or_default();
		let host =
			if host.eq_ignore_ascii_case("gist.github.com") { "github.com" } else { host };

		format!("https://{host}/login")
	}

	async fn request_device_code(
		&self,
		target: &Url,
		scopes: &[&str],
	) -> Result<DeviceCodeResponse, PromptError> {
		let url = format!("{}/device/code", Self::login_base(target));
		let scope = scopes.join(" ");
		let response = self
			.client
			.post(&url)
			.header(reqwest::header::ACCEPT, "application/json")
			.form(&[("client_id", OAUTH_CLIENT_ID), ("scope", scope.as_str())])
			.send()
			.await
			.map_err(|e| PromptError::OAuth(ApiError::Network { url: url.clone(), source: e }))?;
		let status = response.status();

		if !status.is_success() {
			return Err(PromptError::OAuth(ApiError::UnexpectedResponse {
				url,
				status: status.as_u16(),
			}));
		}

		decode_json(response, &url).await
	}

	async fn poll_for_token(
		&self,
		target: &Url,
		device: &DeviceCodeResponse,
	) -> Result<OAuthToken, PromptError> {
		let url = format!("{}/oauth/access_token", Self::login_base(target));
		let mut interval = device.interval.max(1);
		let mut remaining = device.expires_in;

		loop {
			if remaining <= interval {
				return Err(PromptError::Declined {
					reason: "the device authorization expired".to_owned(),
				});
			}

			tokio::time::sleep(Duration::from_secs(interval)).await;

			remaining = remaining.saturating_sub(interval);

			let response = self
				.client
				.post(&url)
				.header(reqwest::header::ACCEPT, "application/json")
				.form(&[
					("client_id", OAUTH_CLIENT_ID),
					("device_code", device.device_code.as_str()),
					("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
				])
				.send()
				.await
				.map_err(|e| {
					PromptError::OAuth(ApiError::Network { url: url.clone(), source: e })
				})?;
			let decoded: TokenPollResponse = decode_json(response, &url).await?;

			if let Some(token) = decoded.access_token {
				return Ok(OAuthToken { access_token: token });
			}

			match decoded.error.as_deref() {
				Some("authorization_pending") => {},
				Some("slow_down") => interval += 5,
				Some(other) => {
					return Err(PromptError::Declined { reason: other.to_owned() });
				},
				None => {
					return Err(PromptError::Declined {
						reason: "token endpoint returned neither a token nor an error".to_owned(),
					});
				},
			}
		}
	}
}
impl AuthenticationPrompt for TerminalPrompt {
	fn select<'a>(
		&'a self,
		target: &'a Url,
		username: Option<&'a str>,
		modes: AuthenticationModes,
	) -> PromptFuture<'a, AuthenticationPromptResult> {
		Box::pin(async move {
			Self::ensure_interactive()?;

			let use_basic = if modes.contains(AuthenticationModes::BASIC)
				&& modes.contains(AuthenticationModes::OAUTH)
			{
				eprintln!("Select an authentication method for '{target}':");
				eprintln!("  1. Username/password");
				eprintln!("  2. Web browser (OAuth)");

				loop {
					match Self::ask("option (enter for 2): ")?.as_str() {
						"1" => break true,
						"" | "2" => break false,
						_ => eprintln!("Unrecognized option."),
					}
				}
			} else if modes.contains(AuthenticationModes::BASIC) {
				true
			} else if modes.contains(AuthenticationModes::OAUTH) {
				false
			} else {
				return Err(PromptError::Declined {
					reason: format!("'{target}' supports no known authentication mode"),
				});
			};

			if !use_basic {
				return Ok(AuthenticationPromptResult::OAuth);
			}

			let account = match username {
				Some(name) if !name.is_empty() => name.to_owned(),
				_ => Self::ask(&format!("Username for '{target}': "))?,
			};
			let secret = Self::ask(&format!("Password for '{account}@{target}': "))?;

			Ok(AuthenticationPromptResult::Basic(Credential::new(account, secret)))
		})
	}

	fn two_factor_code<'a>(
		&'a self,
		target: &'a Url,
		channel: TwoFactorChannel,
	) -> PromptFuture<'a, String> {
		Box::pin(async move {
			let source = match channel {
				TwoFactorChannel::App => "authenticator app",
				TwoFactorChannel::Sms => "SMS",
			};

			Self::ask(&format!("Two-factor code ({source}) for '{target}': "))
		})
	}

	fn oauth_token<'a>(
		&'a self,
		target: &'a Url,
		scopes: &'a [&'a str],
	) -> PromptFuture<'a, OAuthToken> {
		Box::pin(async move {
			Self::ensure_interactive()?;

			let device = self.request_device_code(target, scopes).await?;

			eprintln!("To authenticate, visit {}", device.verification_uri);
			eprintln!("and enter the code: {}", device.user_code);

			self.poll_for_token(target, &device).await
		})
	}
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
	device_code: String,
	user_code: String,
	verification_uri: String,
	#[serde(default = "default_expiry")]
	expires_in: u64,
	#[serde(default = "default_interval")]
	interval: u64,
}

fn default_expiry() -> u64 {
	900
}

fn default_interval() -> u64 {
	5
}

#[derive(Debug, Default, Deserialize)]
struct TokenPollResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	error: Option<String>,
}

async fn decode_json<T>(response: reqwest::Response, url: &str) -> Result<T, PromptError>
where
	T: for<'de> Deserialize<'de>,
{
	let bytes = response.bytes().await.map_err(|e| {
		PromptError::OAuth(ApiError::Network { url: url.to_owned(), source: e })
	})?;
	let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| PromptError::OAuth(ApiError::ResponseParse { url: url.to_owned(), source: e }))
}
