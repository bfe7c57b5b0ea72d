// std
use std::collections::HashMap;
// crates.io
use httpmock::prelude::*;
// self
use sfdc_auth::{
	config::AuthConfig,
	error::Error,
	flows::{CallbackParams, Gateway},
	store::{
		CODE_VERIFIER_COOKIE, CookieJar, OAUTH_STATE_COOKIE, REFRESH_TOKEN_COOKIE, SESSION_COOKIE,
	},
	url::Url,
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";

fn build_gateway(server: &MockServer) -> Gateway {
	let config = AuthConfig::builder()
		.client_id(CLIENT_ID)
		.client_secret(CLIENT_SECRET)
		.redirect_uri("https://app.example.com/api/oauth2/callback")
		.login_url(server.base_url())
		.app_base_url("https://app.example.com")
		.build()
		.expect("Gateway configuration should be valid for login tests.");

	Gateway::new(config)
}

fn token_response_body(server: &MockServer) -> String {
	format!(
		"{{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"token_type\":\"Bearer\",\
		\"scope\":\"api refresh_token\",\"instance_url\":\"https://example.my.salesforce.com\",\
		\"issued_at\":\"1736954740000\",\"id\":\"{}\"}}",
		server.url("/id/00D/005"),
	)
}

const IDENTITY_BODY: &str = r#"{
	"user_id": "005xx000001X8Uz",
	"username": "jane@example.com",
	"organization_id": "00Dxx0000001gPL",
	"email": "jane@example.com",
	"urls": { "profile": "https://example.my.salesforce.com/005xx000001X8Uz" }
}"#;

// Starts a login on one request-scoped jar, then replays the staged secrets into a
// fresh jar the way the browser would on the callback request.
fn staged_login(gateway: &Gateway, return_url: Option<&str>) -> (Url, CookieJar) {
	let mut jar = CookieJar::default();
	let authorize_url = gateway
		.start_authorization(&mut jar, return_url)
		.expect("Authorization initiation should succeed.");
	let state = jar.get(OAUTH_STATE_COOKIE).expect("State secret should be staged.").to_owned();
	let verifier =
		jar.get(CODE_VERIFIER_COOKIE).expect("Verifier secret should be staged.").to_owned();
	let callback_jar = CookieJar::from_header(&format!(
		"{OAUTH_STATE_COOKIE}={state}; {CODE_VERIFIER_COOKIE}={verifier}"
	));

	(authorize_url, callback_jar)
}

fn echoed_state(authorize_url: &Url) -> String {
	authorize_url
		.query_pairs()
		.find_map(|(key, value)| (key == "state").then_some(value.into_owned()))
		.expect("Authorize URL should carry a state parameter.")
}

#[tokio::test]
async fn login_round_trip_materializes_the_session() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let (authorize_url, mut jar) = staged_login(&gateway, Some("/accounts"));

	let pairs: HashMap<_, _> = authorize_url.query_pairs().into_owned().collect();

	assert_eq!(authorize_url.path(), "/services/oauth2/authorize");
	assert_eq!(pairs["response_type"], "code");
	assert_eq!(pairs["scope"], "api refresh_token");
	assert_eq!(pairs["prompt"], "consent");
	assert_eq!(pairs["code_challenge_method"], "S256");

	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/services/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_response_body(&server));
		})
		.await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/id/00D/005").header("authorization", "Bearer AT1");
			then.status(200).header("content-type", "application/json").body(IDENTITY_BODY);
		})
		.await;
	let params =
		CallbackParams { code: Some("valid-code".into()), state: Some(echoed_state(&authorize_url)) };
	let outcome =
		gateway.handle_callback(&mut jar, params).await.expect("Callback should succeed.");

	token_mock.assert_async().await;
	identity_mock.assert_async().await;

	assert_eq!(outcome.redirect_to.as_str(), "https://app.example.com/accounts");
	assert_eq!(outcome.session.access_token.expose(), "AT1");
	assert_eq!(outcome.session.issued_at, "1736954740000");
	assert_eq!(outcome.session.user_info.username, "jane@example.com");
	assert_eq!(outcome.session.user_info.org_id, "00Dxx0000001gPL");

	let summary = outcome.summary();

	assert_eq!(summary.access_token, "AT1");
	assert_eq!(summary.refresh_token.as_deref(), Some("RT1"));

	// Session persisted, refresh token staged long-lived, transient secrets consumed.
	let stored = jar.get(SESSION_COOKIE).expect("Session cookie should be staged.");

	assert!(stored.contains("\"accessToken\":\"AT1\""));
	assert_eq!(jar.get(REFRESH_TOKEN_COOKIE), Some("RT1"));
	assert_eq!(jar.get(CODE_VERIFIER_COOKIE), None);
	assert_eq!(jar.get(OAUTH_STATE_COOKIE), None);

	let headers = jar.set_cookie_headers();

	assert!(headers.iter().any(|h| h.starts_with("sf_session=") && h.contains("Max-Age=86400")));
	assert!(
		headers.iter().any(|h| h.starts_with("refresh_token=RT1") && h.contains("Max-Age=2592000"))
	);
	assert!(headers.iter().any(|h| h.starts_with("code_verifier=; Max-Age=0")));
	assert!(headers.iter().any(|h| h.starts_with("oauth_state=; Max-Age=0")));
	assert!(headers.iter().all(|h| h.contains("HttpOnly") && h.contains("SameSite=Lax")));
}

#[tokio::test]
async fn callback_rejects_tampered_state_before_any_network_call() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let (_, mut jar) = staged_login(&gateway, None);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let params =
		CallbackParams { code: Some("valid-code".into()), state: Some("forged-token:%2F".into()) };
	let err = gateway
		.handle_callback(&mut jar, params)
		.await
		.expect_err("Tampered state should be rejected.");

	assert!(matches!(err, Error::Csrf(_)));
	assert_eq!(err.status_code(), 403);
	assert_eq!(err.public_message(), "Invalid state");

	token_mock.assert_hits_async(0).await;

	// CSRF rejections leave the staged secrets untouched for diagnosis.
	assert!(jar.set_cookie_headers().is_empty());
}

#[tokio::test]
async fn callback_rejects_state_sharing_only_a_prefix() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let (authorize_url, mut jar) = staged_login(&gateway, None);
	// Extend the genuine token; anything but exact equality must fail.
	let params = CallbackParams {
		code: Some("valid-code".into()),
		state: Some(echoed_state(&authorize_url).replacen(':', "tail:", 1)),
	};
	let err = gateway
		.handle_callback(&mut jar, params)
		.await
		.expect_err("A state extending the stored token should be rejected.");

	assert!(matches!(err, Error::Csrf(_)));
}

#[tokio::test]
async fn callback_rejects_missing_inputs_with_bad_request() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let mut jar = CookieJar::default();
	let err = gateway
		.handle_callback(&mut jar, CallbackParams { code: None, state: Some("s:%2F".into()) })
		.await
		.expect_err("A callback without a code should be rejected.");

	assert!(matches!(err, Error::Input(_)));
	assert_eq!(err.status_code(), 400);
	assert_eq!(err.public_message(), "Missing code or state");

	let err = gateway
		.handle_callback(&mut jar, CallbackParams { code: Some("c".into()), state: None })
		.await
		.expect_err("A callback without a state should be rejected.");

	assert!(matches!(err, Error::Input(_)));
	assert!(jar.set_cookie_headers().is_empty());
}

#[tokio::test]
async fn callback_requires_the_staged_verifier() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	// State matches but the verifier cookie expired between initiation and callback.
	let mut jar = CookieJar::from_header("oauth_state=tok12345");
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let err = gateway
		.handle_callback(
			&mut jar,
			CallbackParams { code: Some("c".into()), state: Some("tok12345:%2F".into()) },
		)
		.await
		.expect_err("A callback without the staged verifier should be rejected.");

	assert!(matches!(err, Error::Input(_)));
	assert_eq!(err.status_code(), 400);

	token_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn failed_exchange_still_consumes_the_staged_secrets() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let (authorize_url, mut jar) = staged_login(&gateway, None);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"expired authorization code"}"#);
		})
		.await;
	let params =
		CallbackParams { code: Some("stale-code".into()), state: Some(echoed_state(&authorize_url)) };
	let err = gateway
		.handle_callback(&mut jar, params)
		.await
		.expect_err("A rejected exchange should fail the callback.");

	token_mock.assert_async().await;

	assert!(matches!(err, Error::Upstream(_)));
	assert_eq!(err.status_code(), 400);
	assert_eq!(err.public_message(), "Token exchange failed");
	// Detail stays server-side; the caller-facing message never carries it.
	assert!(err.to_string().contains("expired authorization code"));

	let headers = jar.set_cookie_headers();

	assert!(headers.iter().any(|h| h.starts_with("code_verifier=; Max-Age=0")));
	assert!(headers.iter().any(|h| h.starts_with("oauth_state=; Max-Age=0")));
	assert_eq!(jar.get(SESSION_COOKIE), None);
}

#[tokio::test]
async fn failed_identity_fetch_maps_to_server_error() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let (authorize_url, mut jar) = staged_login(&gateway, None);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_response_body(&server));
		})
		.await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/id/00D/005");
			then.status(503).body("identity service unavailable");
		})
		.await;
	let params =
		CallbackParams { code: Some("valid-code".into()), state: Some(echoed_state(&authorize_url)) };
	let err = gateway
		.handle_callback(&mut jar, params)
		.await
		.expect_err("A failed identity fetch should fail the callback.");

	token_mock.assert_async().await;
	identity_mock.assert_async().await;

	assert!(matches!(err, Error::Upstream(_)));
	assert_eq!(err.status_code(), 500);
	assert_eq!(err.public_message(), "Internal server error");
	assert_eq!(jar.get(SESSION_COOKIE), None);
}

#[tokio::test]
async fn login_without_a_granted_refresh_token_still_succeeds() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let (authorize_url, mut jar) = staged_login(&gateway, None);
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"AT1\",\"token_type\":\"Bearer\",\"id\":\"{}\"}}",
				server.url("/id/00D/005"),
			));
		})
		.await;
	let _identity_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/id/00D/005");
			then.status(200).header("content-type", "application/json").body(IDENTITY_BODY);
		})
		.await;
	let params =
		CallbackParams { code: Some("valid-code".into()), state: Some(echoed_state(&authorize_url)) };
	let outcome =
		gateway.handle_callback(&mut jar, params).await.expect("Callback should succeed.");

	// No return URL was supplied at initiation, so the redirect lands on the dashboard.
	assert_eq!(outcome.redirect_to.as_str(), "https://app.example.com/dashboard");
	assert!(outcome.session.refresh_token.is_none());
	assert_eq!(jar.get(REFRESH_TOKEN_COOKIE), None);
	assert!(jar.set_cookie_headers().iter().all(|h| !h.starts_with("refresh_token=")));
}
