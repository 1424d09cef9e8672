//! reqwest-backed [`RemoteApi`] implementation.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use reqwest::{
	RequestBuilder, Response, StatusCode,
	header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
// self
use crate::{
	_prelude::*,
	api::{ApiError, ApiFuture, CreateTokenOutcome, MetaInfo, RemoteApi, UserInfo},
	credential::Credential,
};

const HTTP_USER_AGENT: &str =
	concat!("Git-Credential-Broker/", env!("CARGO_PKG_VERSION"));
/// Header carrying the two-factor one-time code, and signaling the challenge.
const OTP_HEADER: &str = "X-GitHub-OTP";

/// REST client for hosted and self-hosted GitHub-style instances.
#[derive(Clone, Debug, Default)]
pub struct RestApi {
	client: ReqwestClient,
	base_override: Option<Url>,
}
impl RestApi {
	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self { client, base_override: None }
	}

	/// Replaces the derived endpoint base; used by tests to target a mock server.
	pub fn with_api_base(mut self, base: Url) -> Self {
		self.base_override = Some(base);

		self
	}

	fn base_for(&self, target: &Url) -> Result<Url, ApiError> {
		match &self.base_override {
			Some(base) => Ok(base.clone()),
			None => Self::api_base(target),
		}
	}

	/// Derives the REST endpoint base for `target`.
	///
	/// The hosted service serves its API from a dedicated domain; self-hosted
	/// instances serve it under `/api/v3/` on the instance host itself.
	pub fn api_base(target: &Url) -> Result<Url, ApiError> {
		let host = target.host_str().unwrap_or_default();
		let base = if host.eq_ignore_ascii_case("github.com")
			|| host.eq_ignore_ascii_case("gist.github.com")
		{
			"https://api.github.com/".to_owned()
		} else {
			let authority = match target.port() {
				Some(port) => format!("{host}:{port}"),
				None => host.to_owned(),
			};

			format!("https://{authority}/api/v3/")
		};

		// Both arms are well-formed by construction; host came from a parsed URL.
		Ok(Url::parse(&base).expect("API base URL should always parse"))
	}

	fn request(&self, builder: RequestBuilder) -> RequestBuilder {
		builder.header(USER_AGENT, HTTP_USER_AGENT).header(ACCEPT, "application/json")
	}

	fn basic_authorization(credential: &Credential) -> String {
		let raw = format!("{}:{}", credential.account, credential.expose_secret());

		format!("Basic {}", BASE64.encode(raw))
	}

	async fn send(builder: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
		builder
			.send()
			.await
			.map_err(|e| ApiError::Network { url: url.to_string(), source: e })
	}

	async fn decode<T>(response: Response, url: &Url) -> Result<T, ApiError>
	where
		T: for<'de> Deserialize<'de>,
	{
		let bytes = response
			.bytes()
			.await
			.map_err(|e| ApiError::Network { url: url.to_string(), source: e })?;
		let mut deserializer = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|e| ApiError::ResponseParse { url: url.to_string(), source: e })
	}

	fn two_factor_challenge(response: &Response) -> Option<CreateTokenOutcome> {
		let value = response.headers().get(OTP_HEADER)?.to_str().ok()?;

		if !value.to_ascii_lowercase().starts_with("required") {
			return None;
		}

		if value.to_ascii_lowercase().contains("sms") {
			Some(CreateTokenOutcome::TwoFactorSms)
		} else {
			Some(CreateTokenOutcome::TwoFactorApp)
		}
	}
}
impl RemoteApi for RestApi {
	fn meta_info<'a>(&'a self, target: &'a Url) -> ApiFuture<'a, MetaInfo> {
		Box::pin(async move {
			let url = self.base_for(target)?.join("meta").expect("meta endpoint should join");

			tracing::debug!(%url, "querying instance metadata");

			let response = Self::send(self.request(self.client.get(url.clone())), &url).await?;

			if !response.status().is_success() {
				return Err(ApiError::UnexpectedResponse {
					url: url.to_string(),
					status: response.status().as_u16(),
				});
			}

			Self::decode(response, &url).await
		})
	}

	fn create_personal_token<'a>(
		&'a self,
		target: &'a Url,
		credential: &'a Credential,
		code: Option<&'a str>,
		scopes: &'a [&'a str],
	) -> ApiFuture<'a, CreateTokenOutcome> {
		Box::pin(async move {
			let url = self.base_for(target)?
				.join("authorizations")
				.expect("authorizations endpoint should join");
			let body = serde_json::json!({
				"scopes": scopes,
				"note": format!("git: {target}"),
			});
			let mut builder = self
				.request(self.client.post(url.clone()))
				.header(AUTHORIZATION, Self::basic_authorization(credential))
				.json(&body);

			if let Some(code) = code {
				builder = builder.header(OTP_HEADER, code);
			}

			let response = Self::send(builder, &url).await?;
			let status = response.status();

			if status == StatusCode::UNAUTHORIZED
				&& let Some(challenge) = Self::two_factor_challenge(&response)
			{
				return Ok(challenge);
			}

			if status.is_success() {
				#[derive(Deserialize)]
				struct TokenResponse {
					token: String,
				}

				let decoded: TokenResponse = Self::decode(response, &url).await?;

				return Ok(CreateTokenOutcome::Success(decoded.token));
			}

			#[derive(Default, Deserialize)]
			struct FailureResponse {
				#[serde(default)]
				message: Option<String>,
			}

			let decoded: FailureResponse = Self::decode(response, &url).await.unwrap_or_default();

			Ok(CreateTokenOutcome::Failure {
				status: Some(status.as_u16()),
				message: decoded.message.unwrap_or_else(|| "authorization rejected".to_owned()),
			})
		})
	}

	fn user_info<'a>(&'a self, target: &'a Url, token: &'a str) -> ApiFuture<'a, UserInfo> {
		Box::pin(async move {
			let url = self.base_for(target)?.join("user").expect("user endpoint should join");
			let builder = self
				.request(self.client.get(url.clone()))
				.header(AUTHORIZATION, format!("token {token}"));
			let response = Self::send(builder, &url).await?;

			if !response.status().is_success() {
				return Err(ApiError::UnexpectedResponse {
					url: url.to_string(),
					status: response.status().as_u16(),
				});
			}

			Self::decode(response, &url).await
		})
	}
}
