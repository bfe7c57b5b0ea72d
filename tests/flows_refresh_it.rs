// crates.io
use httpmock::prelude::*;
// self
use sfdc_auth::{
	config::AuthConfig,
	error::Error,
	flows::Gateway,
	session::{SecretString, Session, UserInfo},
	store::{CookieJar, REFRESH_TOKEN_COOKIE, SESSION_COOKIE},
	url::Url,
};

fn build_gateway(server: &MockServer) -> Gateway {
	let config = AuthConfig::builder()
		.client_id("client-it")
		.client_secret("secret-it")
		.redirect_uri("https://app.example.com/api/oauth2/callback")
		.login_url(server.base_url())
		.app_base_url("https://app.example.com")
		.build()
		.expect("Gateway configuration should be valid for refresh tests.");

	Gateway::new(config)
}

fn seeded_session(refresh_token: Option<&str>) -> Session {
	Session {
		access_token: SecretString::new("AT1"),
		refresh_token: refresh_token.map(SecretString::new),
		instance_url: Some(
			Url::parse("https://example.my.salesforce.com")
				.expect("Instance URL fixture should parse."),
		),
		issued_at: "1736954740000".into(),
		scope: Some("api refresh_token".into()),
		token_type: Some("Bearer".into()),
		user_info: UserInfo {
			id: "005xx000001X8Uz".into(),
			username: "jane@example.com".into(),
			org_id: "00Dxx0000001gPL".into(),
			email: Some("jane@example.com".into()),
			profile: None,
		},
	}
}

fn seeded_jar(refresh_token: Option<&str>) -> CookieJar {
	let mut jar = CookieJar::default();

	seeded_session(refresh_token)
		.write(&mut jar)
		.expect("Seeding the session cookie should succeed.");

	jar
}

#[tokio::test]
async fn refresh_replaces_the_token_and_keeps_the_identity() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let mut jar = seeded_jar(Some("RT1"));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/services/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(
				r#"{"access_token":"AT2","token_type":"Bearer","scope":"api refresh_token",
				"instance_url":"https://example.my.salesforce.com","issued_at":"1736958340000"}"#,
			);
		})
		.await;
	let refreshed =
		gateway.refresh_session(&mut jar).await.expect("Session renewal should succeed.");

	token_mock.assert_async().await;

	assert_eq!(refreshed.access_token.expose(), "AT2");
	assert_eq!(refreshed.issued_at, "1736958340000");
	// The renewal grant returns no refresh token; the stored one survives.
	assert_eq!(refreshed.refresh_token.as_ref().map(SecretString::expose), Some("RT1"));
	assert_eq!(refreshed.user_info.username, "jane@example.com");

	// The rewritten cookie carries the new token with a full TTL.
	let stored = jar.get(SESSION_COOKIE).expect("Session cookie should be staged.");

	assert!(stored.contains("\"accessToken\":\"AT2\""));
	assert!(
		jar.set_cookie_headers()
			.iter()
			.any(|h| h.starts_with("sf_session=") && h.contains("Max-Age=86400"))
	);
	assert_eq!(gateway.refresh_metrics().success(), 1);
	assert_eq!(gateway.refresh_metrics().failure(), 0);
}

#[tokio::test]
async fn refresh_without_a_session_is_unauthorized_and_offline() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let mut jar = CookieJar::default();
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let err = gateway
		.refresh_session(&mut jar)
		.await
		.expect_err("Renewal without a session should be rejected.");

	assert!(matches!(err, Error::NoSession));
	assert_eq!(err.status_code(), 401);
	assert_eq!(err.public_message(), "No session");

	token_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn refresh_without_a_refresh_token_is_rejected_before_the_network() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let mut jar = seeded_jar(None);
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body("{}");
		})
		.await;
	let err = gateway
		.refresh_session(&mut jar)
		.await
		.expect_err("Renewal without a refresh token should be rejected.");

	assert!(matches!(err, Error::NoRefreshToken));
	assert_eq!(err.status_code(), 400);
	assert_eq!(err.public_message(), "No refresh token");

	token_mock.assert_hits_async(0).await;

	assert_eq!(gateway.refresh_metrics().attempts(), 1);
	assert_eq!(gateway.refresh_metrics().failure(), 1);
}

#[tokio::test]
async fn rejected_renewal_leaves_the_stored_session_unmodified() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let mut jar = seeded_jar(Some("RT1"));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"token revoked"}"#);
		})
		.await;
	let err = gateway
		.refresh_session(&mut jar)
		.await
		.expect_err("A rejected renewal should fail.");

	token_mock.assert_async().await;

	assert!(matches!(err, Error::Upstream(_)));
	assert_eq!(err.status_code(), 400);
	assert!(err.to_string().contains("token revoked"));

	let current = gateway
		.current_session(&jar)
		.expect("The original session should remain readable after a failed renewal.");

	assert_eq!(current.access_token.expose(), "AT1");
	assert_eq!(current.issued_at, "1736954740000");
}

#[tokio::test]
async fn current_session_reads_without_touching_the_provider() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let jar = seeded_jar(Some("RT1"));
	let session =
		gateway.current_session(&jar).expect("A seeded session should read back.");

	assert_eq!(session.access_token.expose(), "AT1");
	assert_eq!(session.summary().without_refresh_token().refresh_token, None);

	let err = gateway
		.current_session(&CookieJar::default())
		.expect_err("An empty jar should read as signed out.");

	assert!(matches!(err, Error::NoSession));
}

#[tokio::test]
async fn logout_tears_down_session_and_refresh_secrets() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let mut jar = CookieJar::from_header(&format!(
		"{SESSION_COOKIE}=opaque; {REFRESH_TOKEN_COOKIE}=RT1"
	));

	gateway.logout(&mut jar);

	let headers = jar.set_cookie_headers();

	assert!(headers.iter().any(|h| h.starts_with("sf_session=; Max-Age=0")));
	assert!(headers.iter().any(|h| h.starts_with("refresh_token=; Max-Age=0")));
	assert!(matches!(
		gateway.current_session(&jar).expect_err("Logout should clear the session."),
		Error::NoSession
	));
}
