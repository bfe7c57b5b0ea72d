//! Callback handling: from redirect parameters to a materialized session.
//!
//! The flow is strictly ordered so every rejection happens as early as possible:
//! parameter presence, CSRF state comparison, verifier recovery, code exchange,
//! identity fetch, session persistence, and only then the redirect. The staged
//! `oauth_state` and `code_verifier` secrets are single-use; they are consumed as soon
//! as the exchange attempt returns, whether it succeeded or not. CSRF and missing-input
//! rejections leave them untouched since no exchange was attempted.

// self
use crate::{
	_prelude::*,
	error::{CsrfError, InputError},
	flows::{Gateway, authorize, issued_at_or_now},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{Session, SessionSummary},
	store::{
		CODE_VERIFIER_COOKIE, OAUTH_STATE_COOKIE, REFRESH_TOKEN_COOKIE, REFRESH_TOKEN_TTL,
		SecretStore,
	},
};

/// Query parameters delivered by the provider to the callback endpoint.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackParams {
	/// One-time authorization code.
	#[serde(default)]
	pub code: Option<String>,
	/// Echoed `state` parameter: CSRF token plus encoded return URL.
	#[serde(default)]
	pub state: Option<String>,
}

/// Outcome of a successful callback.
#[derive(Clone, Debug)]
pub struct CallbackOutcome {
	/// The freshly materialized session, already written to the store.
	pub session: Session,
	/// Absolute URL to redirect the user to, resolved against the application base.
	pub redirect_to: Url,
}
impl CallbackOutcome {
	/// Public-safe projection of the new session.
	pub fn summary(&self) -> SessionSummary {
		self.session.summary()
	}
}

impl Gateway {
	/// Completes a login from the provider redirect.
	///
	/// On success the session is persisted, the refresh token (when granted) is staged
	/// under its own long-lived secret, and the staged transient secrets are gone.
	pub async fn handle_callback(
		&self,
		store: &mut dyn SecretStore,
		params: CallbackParams,
	) -> Result<CallbackOutcome> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "handle_callback");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.handle_callback_inner(store, params)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::error_event("callback", err);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn handle_callback_inner(
		&self,
		store: &mut dyn SecretStore,
		params: CallbackParams,
	) -> Result<CallbackOutcome> {
		let code = params
			.code
			.as_deref()
			.filter(|value| !value.is_empty())
			.ok_or(InputError::MissingCode)?;
		let state = params
			.state
			.as_deref()
			.filter(|value| !value.is_empty())
			.ok_or(InputError::MissingState)?;
		let stored_state =
			store.read(OAUTH_STATE_COOKIE).ok_or(CsrfError::MissingStoredState)?;
		let (token, encoded_return) = authorize::split_state(state);

		// Exact equality against the staged token; a prefix relation is not enough.
		if token != stored_state {
			return Err(CsrfError::StateMismatch.into());
		}

		let return_url = decode_return_url(encoded_return);
		let verifier =
			store.read(CODE_VERIFIER_COOKIE).ok_or(InputError::MissingCodeVerifier)?;
		let facade = self.token_facade()?;
		let exchanged = facade.exchange_code(code, &verifier).await;

		// The staged secrets are consumed by the exchange attempt, failed or not.
		store.delete(CODE_VERIFIER_COOKIE);
		store.delete(OAUTH_STATE_COOKIE);

		let grant = exchanged.inspect_err(|err| obs::error_event("callback.exchange", err))?;
		let identity_url = facade.identity_endpoint(&grant);
		let identity = facade
			.fetch_identity(grant.access_token.expose(), &identity_url)
			.await
			.inspect_err(|err| obs::error_event("callback.identity", err))?;
		let session = Session {
			access_token: grant.access_token,
			refresh_token: grant.refresh_token.clone(),
			instance_url: grant.instance_url,
			issued_at: issued_at_or_now(grant.issued_at.as_deref()),
			scope: grant.scope,
			token_type: grant.token_type,
			user_info: identity.into_user_info(),
		};

		session.write(store)?;

		match &grant.refresh_token {
			Some(secret) =>
				store.write(REFRESH_TOKEN_COOKIE, secret.expose(), REFRESH_TOKEN_TTL)?,
			None => obs::warn_event("callback", "Provider granted no refresh token."),
		}

		let redirect_to = self
			.config()
			.app_base_url
			.join(&return_url)
			.map_err(|source| InputError::InvalidReturnUrl { source })?;

		Ok(CallbackOutcome { session, redirect_to })
	}
}

/// Decodes the return URL carried in the state suffix, falling back to the root path
/// when it is absent or fails to percent-decode.
fn decode_return_url(encoded: Option<&str>) -> String {
	let Some(encoded) = encoded.filter(|value| !value.is_empty()) else {
		return "/".into();
	};

	match urlencoding::decode(encoded) {
		Ok(decoded) => decoded.into_owned(),
		Err(_) => {
			obs::warn_event("callback", "Return URL failed to percent-decode; using root.");

			"/".into()
		},
	}
}
