//! Authorization initiation: PKCE material, CSRF state, and the provider redirect.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	flows::Gateway,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CODE_VERIFIER_COOKIE, OAUTH_STATE_COOKIE, STATE_TTL, SecretStore, VERIFIER_TTL},
};

/// Separator between the CSRF token and the percent-encoded return URL inside the
/// `state` parameter. Never occurs inside the alphanumeric token itself, so the first
/// occurrence always splits correctly.
pub const STATE_DELIMITER: char = ':';
/// Landing path used when the caller supplies no return URL.
pub const DEFAULT_RETURN_URL: &str = "/dashboard";

const AUTHORIZE_PATH: &str = "/services/oauth2/authorize";
const OAUTH_SCOPE: &str = "api refresh_token";
const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

impl Gateway {
	/// Starts a login: generates fresh PKCE and CSRF material, stages it in the store,
	/// and returns the provider authorization URL to redirect the user to.
	///
	/// `return_url` is the application path to land on after the callback; it rides
	/// percent-encoded inside the `state` parameter. Every invocation generates fresh
	/// secrets, so concurrent logins in one browser overwrite each other and only the
	/// most recent one can complete.
	pub fn start_authorization(
		&self,
		store: &mut dyn SecretStore,
		return_url: Option<&str>,
	) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Authorize;

		let span = FlowSpan::new(KIND, "start_authorization");
		let _guard = span.entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = self.start_authorization_inner(store, return_url);

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::error_event("authorize", err);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	fn start_authorization_inner(
		&self,
		store: &mut dyn SecretStore,
		return_url: Option<&str>,
	) -> Result<Url> {
		let return_url =
			return_url.filter(|value| !value.is_empty()).unwrap_or(DEFAULT_RETURN_URL);
		let pkce = PkcePair::generate();
		let state = random_string(STATE_LEN);
		let mut url = self.config().provider_endpoint(AUTHORIZE_PATH);

		url.query_pairs_mut()
			.append_pair("response_type", "code")
			.append_pair("client_id", &self.config().client_id)
			.append_pair("redirect_uri", self.config().redirect_uri.as_str())
			.append_pair("state", &pack_state(&state, return_url))
			.append_pair("scope", OAUTH_SCOPE)
			// Forces the consent screen so the provider issues a refresh token even for
			// users who already approved the client.
			.append_pair("prompt", "consent")
			.append_pair("code_challenge", pkce.challenge())
			.append_pair("code_challenge_method", pkce.method());

		store.write(OAUTH_STATE_COOKIE, &state, STATE_TTL)?;
		store.write(CODE_VERIFIER_COOKIE, pkce.verifier(), VERIFIER_TTL)?;

		Ok(url)
	}
}

/// One-time PKCE verifier/challenge pair bound to a single authorization attempt.
#[derive(Clone)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
}
impl PkcePair {
	/// Generates a fresh pair from a CSPRNG.
	pub fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge }
	}

	/// Secret verifier; transmitted only to the token endpoint.
	pub fn verifier(&self) -> &str {
		&self.verifier
	}

	/// Public challenge sent with the authorization request.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method label; only `S256` is supported.
	pub fn method(&self) -> &'static str {
		"S256"
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.finish()
	}
}

/// Computes the S256 challenge: unpadded URL-safe Base64 of the verifier's SHA-256.
pub fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Packs the CSRF token and percent-encoded return URL into the `state` parameter.
pub(crate) fn pack_state(token: &str, return_url: &str) -> String {
	format!("{token}{STATE_DELIMITER}{}", urlencoding::encode(return_url))
}

/// Splits an incoming `state` into its token prefix and optional encoded return URL.
pub(crate) fn split_state(state: &str) -> (&str, Option<&str>) {
	match state.split_once(STATE_DELIMITER) {
		Some((token, encoded)) => (token, Some(encoded)),
		None => (state, None),
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
