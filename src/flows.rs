//! Gateway flows: authorization initiation, callback handling, and session renewal.
//!
//! [`Gateway`] is the long-lived entry point. It owns the validated configuration, the
//! shared HTTP transport, and the refresh serialization guard; each operation takes the
//! request-scoped [`SecretStore`](crate::store::SecretStore) by reference and leaves its
//! cookie mutations there for the embedding layer to materialize.

pub mod authorize;
pub mod callback;
pub mod refresh;

pub use authorize::{DEFAULT_RETURN_URL, PkcePair, STATE_DELIMITER, compute_pkce_challenge};
pub use callback::{CallbackOutcome, CallbackParams};
pub use refresh::RefreshMetrics;

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	config::AuthConfig,
	http::HttpClient,
	oauth::TokenFacade,
	store::CookiePolicy,
};

/// Long-lived OAuth session gateway shared across requests.
#[derive(Clone)]
pub struct Gateway {
	config: Arc<AuthConfig>,
	http_client: HttpClient,
	refresh_guard: Arc<AsyncMutex<()>>,
	refresh_metrics: Arc<RefreshMetrics>,
}
impl Gateway {
	/// Creates a gateway with a default HTTP transport.
	pub fn new(config: AuthConfig) -> Self {
		Self::with_http_client(config, HttpClient::default())
	}

	/// Creates a gateway reusing an existing HTTP transport.
	pub fn with_http_client(config: AuthConfig, http_client: HttpClient) -> Self {
		Self {
			config: Arc::new(config),
			http_client,
			refresh_guard: Arc::new(AsyncMutex::new(())),
			refresh_metrics: Arc::new(RefreshMetrics::default()),
		}
	}

	/// Returns the validated configuration.
	pub fn config(&self) -> &AuthConfig {
		&self.config
	}

	/// Returns the cookie policy matching the deployment settings.
	pub fn cookie_policy(&self) -> CookiePolicy {
		CookiePolicy { secure: self.config.secure_cookies }
	}

	/// Returns the refresh flow counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	pub(crate) fn token_facade(&self) -> Result<TokenFacade> {
		TokenFacade::from_config(&self.config, self.http_client.clone()).map_err(Into::into)
	}
}
impl Debug for Gateway {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway").field("config", &self.config).finish()
	}
}

/// Prefers the provider-reported issue timestamp, stamping the current instant in
/// RFC 3339 when the provider omitted one.
pub(crate) fn issued_at_or_now(reported: Option<&str>) -> String {
	match reported.filter(|value| !value.is_empty()) {
		Some(value) => value.to_owned(),
		None => OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn issued_at_prefers_the_reported_value() {
		assert_eq!(issued_at_or_now(Some("1736954740000")), "1736954740000");
	}

	#[test]
	fn issued_at_stamps_rfc3339_when_absent() {
		let stamped = issued_at_or_now(None);

		assert!(stamped.contains('T'), "local stamp should be RFC 3339, got {stamped}");
	}
}
