//! Storage contracts and built-in secret store implementations.
//!
//! Sessions and transient flow secrets are opaque named values with a TTL. The
//! [`SecretStore`] capability trait keeps the flows independent of where those values
//! live: the shipped [`CookieJar`] backs them with client-held HTTP cookies, while
//! [`MemoryStore`] keeps them in-process for tests and development servers. Expiry is
//! evaluated lazily on read; a value past its TTL reads as absent.

pub mod cookie;
pub mod memory;

pub use cookie::{CookieJar, CookiePolicy};
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Name of the CSRF state secret.
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";
/// Name of the transient PKCE verifier secret.
pub const CODE_VERIFIER_COOKIE: &str = "code_verifier";
/// Name of the serialized session value.
pub const SESSION_COOKIE: &str = "sf_session";
/// Name of the long-lived refresh token secret.
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// TTL of the CSRF state secret.
pub const STATE_TTL: Duration = Duration::hours(24);
/// TTL of the PKCE verifier secret.
pub const VERIFIER_TTL: Duration = Duration::seconds(600);
/// TTL of the session value; fixed, independent of the access token's own expiry.
pub const SESSION_TTL: Duration = Duration::hours(24);
/// TTL of the separately persisted refresh token.
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(30);

/// Capability contract for session and transient-secret storage.
///
/// Writes are atomic per name; partial writes are not representable. Implementations
/// must treat unreadable or expired values as absent rather than failing the request.
pub trait SecretStore
where
	Self: Send,
{
	/// Returns the stored value, or `None` when absent, expired, or unreadable.
	fn read(&self, name: &str) -> Option<String>;

	/// Persists or replaces the named value with the provided TTL.
	fn write(&mut self, name: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

	/// Removes the named value.
	fn delete(&mut self, name: &str);
}

/// Error type produced by [`SecretStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_gateway_error_with_source() {
		let store_error = StoreError::Backend { message: "jar unavailable".into() };
		let gateway_error: Error = store_error.clone().into();

		assert!(matches!(gateway_error, Error::Store(_)));
		assert!(gateway_error.to_string().contains("jar unavailable"));

		let source = StdError::source(&gateway_error)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn ttl_constants_match_the_cookie_contract() {
		assert_eq!(VERIFIER_TTL.whole_seconds(), 600);
		assert_eq!(STATE_TTL.whole_hours(), 24);
		assert_eq!(SESSION_TTL.whole_hours(), 24);
		assert_eq!(REFRESH_TOKEN_TTL.whole_days(), 30);
	}
}
