//! Session renewal, inspection, and teardown.

mod metrics;
pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	flows::{Gateway, issued_at_or_now},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::Session,
	store::SecretStore,
};

impl Gateway {
	/// Returns the current session, or [`Error::NoSession`] when none is stored.
	///
	/// Purely a read; never talks to the provider and never mutates the store.
	pub fn current_session(&self, store: &dyn SecretStore) -> Result<Session> {
		Session::read(store).ok_or(Error::NoSession)
	}

	/// Renews the session's access token via the refresh-token grant.
	///
	/// Requires an existing session carrying a refresh token; the absence of either is
	/// rejected before any network traffic. On success the token-bearing fields are
	/// replaced and the session is rewritten with a fresh TTL; the refresh token and
	/// identity summary are retained as-is. On failure the stored session is left
	/// unmodified.
	///
	/// Renewals are serialized per gateway so concurrent callers cannot race the
	/// provider with the same refresh token.
	pub async fn refresh_session(&self, store: &mut dyn SecretStore) -> Result<Session> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.refresh_session_inner(store)).await;

		match &result {
			Ok(_) => {
				self.refresh_metrics().record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(err) => {
				self.refresh_metrics().record_failure();
				obs::error_event("refresh", err);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn refresh_session_inner(&self, store: &mut dyn SecretStore) -> Result<Session> {
		self.refresh_metrics().record_attempt();

		let _serialized = self.refresh_guard.lock().await;
		let mut session = self.current_session(store)?;
		let refresh_token = session
			.refresh_token
			.clone()
			.filter(|secret| !secret.is_empty())
			.ok_or(Error::NoRefreshToken)?;
		let facade = self.token_facade()?;
		let grant = facade
			.refresh(refresh_token.expose())
			.await
			.inspect_err(|err| obs::error_event("refresh.exchange", err))?;

		session.access_token = grant.access_token;
		session.issued_at = issued_at_or_now(grant.issued_at.as_deref());

		if let Some(instance_url) = grant.instance_url {
			session.instance_url = Some(instance_url);
		}
		if let Some(scope) = grant.scope {
			session.scope = Some(scope);
		}
		if let Some(token_type) = grant.token_type {
			session.token_type = Some(token_type);
		}

		session.write(store)?;

		Ok(session)
	}

	/// Tears down the session and its companion refresh-token secret.
	pub fn logout(&self, store: &mut dyn SecretStore) {
		Session::delete(store);
	}
}
