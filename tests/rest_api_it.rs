// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use git_credential_broker::{
	api::{ApiError, CreateTokenOutcome, RemoteApi, RestApi},
	credential::Credential,
};

fn api_for(server: &MockServer) -> RestApi {
	RestApi::default()
		.with_api_base(Url::parse(&server.base_url()).expect("mock server URL should parse"))
}

fn target() -> Url {
	Url::parse("https://ghe.example.com/").expect("target fixture should parse")
}

#[tokio::test]
async fn meta_info_decodes_instance_metadata() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/meta");
			then.status(200).json_body(serde_json::json!({
				"verifiable_password_authentication": true,
				"installed_version": "2.22.1",
			}));
		})
		.await;
	let meta = api_for(&server)
		.meta_info(&target())
		.await
		.expect("metadata query against the mock server should succeed");

	mock.assert_async().await;

	assert!(meta.verifiable_password_authentication);
	assert_eq!(meta.installed_version.as_deref(), Some("2.22.1"));
}

#[tokio::test]
async fn meta_info_surfaces_unexpected_statuses() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/meta");
			then.status(503);
		})
		.await;

	let err = api_for(&server)
		.meta_info(&target())
		.await
		.expect_err("a 503 from the metadata endpoint should be an error");

	assert!(matches!(err, ApiError::UnexpectedResponse { status: 503, .. }));
}

#[tokio::test]
async fn create_token_succeeds_with_basic_authorization() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/authorizations")
				.header("authorization", "Basic bW9uYTpodW50ZXIy")
				.header_missing("x-github-otp");
			then.status(201).json_body(serde_json::json!({ "token": "pat-123" }));
		})
		.await;
	let outcome = api_for(&server)
		.create_personal_token(
			&target(),
			&Credential::new("mona", "hunter2"),
			None,
			&["gist", "repo"],
		)
		.await
		.expect("token exchange against the mock server should succeed");

	mock.assert_async().await;

	assert_eq!(outcome, CreateTokenOutcome::Success("pat-123".into()));
}

#[tokio::test]
async fn create_token_reports_the_two_factor_channel() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/authorizations").header_missing("x-github-otp");
			then.status(401).header("X-GitHub-OTP", "required; sms");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/authorizations").header("x-github-otp", "123456");
			then.status(201).json_body(serde_json::json!({ "token": "pat-2fa" }));
		})
		.await;

	let api = api_for(&server);
	let credential = Credential::new("mona", "hunter2");
	let challenge = api
		.create_personal_token(&target(), &credential, None, &["gist", "repo"])
		.await
		.expect("the challenged exchange should complete without a transport error");

	assert_eq!(challenge, CreateTokenOutcome::TwoFactorSms);

	let retried = api
		.create_personal_token(&target(), &credential, Some("123456"), &["gist", "repo"])
		.await
		.expect("the retried exchange should complete without a transport error");

	assert_eq!(retried, CreateTokenOutcome::Success("pat-2fa".into()));
}

#[tokio::test]
async fn create_token_rejection_carries_the_server_message() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/authorizations");
			then.status(422).json_body(serde_json::json!({ "message": "Validation failed" }));
		})
		.await;

	let outcome = api_for(&server)
		.create_personal_token(
			&target(),
			&Credential::new("mona", "wrong"),
			None,
			&["gist", "repo"],
		)
		.await
		.expect("a rejected exchange is an outcome, not a transport error");

	assert_eq!(
		outcome,
		CreateTokenOutcome::Failure { status: Some(422), message: "Validation failed".into() }
	);
}

#[tokio::test]
async fn user_info_resolves_the_canonical_handle() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/user").header("authorization", "token pat-123");
			then.status(200).json_body(serde_json::json!({ "login": "mona" }));
		})
		.await;
	let user = api_for(&server)
		.user_info(&target(), "pat-123")
		.await
		.expect("user-info query against the mock server should succeed");

	mock.assert_async().await;

	assert_eq!(user.login, "mona");
}

#[tokio::test]
async fn malformed_json_is_a_parse_error_with_a_path() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/user");
			then.status(200).json_body(serde_json::json!({ "id": 42 }));
		})
		.await;

	let err = api_for(&server)
		.user_info(&target(), "pat-123")
		.await
		.expect_err("a payload without 'login' should fail to decode");

	assert!(matches!(err, ApiError::ResponseParse { .. }));
}
