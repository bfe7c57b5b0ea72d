//! Gateway-level error types shared across flows, the token facade, and stores.
//!
//! Flow steps return tagged errors; the embedding HTTP layer maps them to a transport
//! status at a single boundary via [`Error::status_code`] and replies with
//! [`Error::public_message`]. Upstream response bodies ride along in
//! [`UpstreamError`] for server-side logs and never reach the caller verbatim.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request is missing a required input.
	#[error(transparent)]
	Input(#[from] InputError),
	/// CSRF state validation failed.
	#[error(transparent)]
	Csrf(#[from] CsrfError),
	/// The provider's token or identity endpoint rejected the call.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),

	/// No session cookie is present, or the stored session failed to parse.
	#[error("No session.")]
	NoSession,
	/// The stored session carries no refresh token.
	#[error("No refresh token.")]
	NoRefreshToken,
}
impl Error {
	/// HTTP status the embedding layer should answer with.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Store(_) | Self::Config(_) => 500,
			Self::Input(_) | Self::NoRefreshToken => 400,
			Self::Csrf(_) => 403,
			Self::Upstream(e) => e.stage().status_code(),
			Self::NoSession => 401,
		}
	}

	/// Generic caller-facing message; never contains upstream bodies or secret values.
	pub fn public_message(&self) -> &'static str {
		match self {
			Self::Store(_) => "Internal server error",
			Self::Config(_) => "Server configuration error",
			Self::Input(_) => "Missing code or state",
			Self::Csrf(_) => "Invalid state",
			Self::Upstream(e) => match e.stage() {
				UpstreamStage::TokenExchange => "Token exchange failed",
				UpstreamStage::Identity => "Internal server error",
			},
			Self::NoSession => "No session",
			Self::NoRefreshToken => "No refresh token",
		}
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required configuration variable was not supplied. The message names the
	/// variable only; supplied values are never echoed.
	#[error("Missing required configuration variable: {name}.")]
	MissingVariable {
		/// Environment variable name.
		name: &'static str,
	},
	/// A URL-valued configuration variable could not be parsed.
	#[error("Configuration variable {name} is not a valid URL.")]
	InvalidUrl {
		/// Environment variable name.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Missing-input failures detected before any network call is made.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum InputError {
	/// Callback request carried no `code` query parameter.
	#[error("Callback request is missing the authorization code.")]
	MissingCode,
	/// Callback request carried no `state` query parameter.
	#[error("Callback request is missing the state parameter.")]
	MissingState,
	/// The transient `code_verifier` secret is absent or expired.
	#[error("PKCE code verifier is missing; the flow may have started elsewhere or expired.")]
	MissingCodeVerifier,
	/// The return URL embedded in the state cannot be resolved against the app base URL.
	#[error("Return URL embedded in the state parameter is invalid.")]
	InvalidReturnUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// CSRF state validation failures.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CsrfError {
	/// No `oauth_state` secret is stored for this user agent.
	#[error("No stored authorization state for this request.")]
	MissingStoredState,
	/// The incoming state's token portion does not exactly equal the stored value.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}

/// Which provider endpoint an upstream failure originated from; decides the
/// transport status the embedder replies with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpstreamStage {
	/// The `/services/oauth2/token` endpoint (code exchange or refresh).
	TokenExchange,
	/// The identity endpoint queried with the fresh access token.
	Identity,
}
impl UpstreamStage {
	/// Stable label for spans and logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::TokenExchange => "token_exchange",
			Self::Identity => "identity",
		}
	}

	/// HTTP status surfaced to callers for failures at this stage.
	pub const fn status_code(self) -> u16 {
		match self {
			Self::TokenExchange => 400,
			Self::Identity => 500,
		}
	}
}
impl Display for UpstreamStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Failures reported by the provider's token or identity endpoints.
///
/// `detail` fields hold upstream error bodies for diagnostics; they are logged
/// server-side and must never be echoed to the user agent.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Provider answered with a non-2xx response.
	#[error("Provider {stage} endpoint rejected the request: {detail}.")]
	Rejected {
		/// Endpoint the failure originated from.
		stage: UpstreamStage,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Upstream error body or OAuth error description; server-side logs only.
		detail: String,
	},
	/// Provider answered 2xx with a body that could not be parsed.
	#[error("Provider {stage} endpoint returned malformed JSON.")]
	Parse {
		/// Endpoint the failure originated from.
		stage: UpstreamStage,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport-level failure (DNS, TCP, TLS, timeout) before a response arrived.
	#[error("Network error occurred while calling the provider {stage} endpoint.")]
	Network {
		/// Endpoint the failure originated from.
		stage: UpstreamStage,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl UpstreamError {
	/// Returns the endpoint stage the failure originated from.
	pub fn stage(&self) -> UpstreamStage {
		match self {
			Self::Rejected { stage, .. } | Self::Parse { stage, .. } | Self::Network { stage, .. } =>
				*stage,
		}
	}

	/// Wraps a transport-specific network error for the provided stage.
	pub fn network(stage: UpstreamStage, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { stage, source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_codes_match_error_taxonomy() {
		assert_eq!(Error::from(InputError::MissingCode).status_code(), 400);
		assert_eq!(Error::from(CsrfError::StateMismatch).status_code(), 403);
		assert_eq!(
			Error::from(ConfigError::MissingVariable { name: "SALESFORCE_CLIENT_ID" })
				.status_code(),
			500
		);
		assert_eq!(Error::NoSession.status_code(), 401);
		assert_eq!(Error::NoRefreshToken.status_code(), 400);

		let token = UpstreamError::Rejected {
			stage: UpstreamStage::TokenExchange,
			status: Some(400),
			detail: "invalid_grant".into(),
		};
		let identity = UpstreamError::Rejected {
			stage: UpstreamStage::Identity,
			status: Some(503),
			detail: "unavailable".into(),
		};

		assert_eq!(Error::from(token).status_code(), 400);
		assert_eq!(Error::from(identity).status_code(), 500);
	}

	#[test]
	fn public_messages_never_leak_upstream_detail() {
		let err = Error::from(UpstreamError::Rejected {
			stage: UpstreamStage::TokenExchange,
			status: Some(400),
			detail: "invalid_client: secret mismatch for client 3MVG9".into(),
		});

		assert_eq!(err.public_message(), "Token exchange failed");
		assert!(!err.public_message().contains("3MVG9"));
	}

	#[test]
	fn config_error_names_the_variable_only() {
		let err = ConfigError::MissingVariable { name: "SALESFORCE_CLIENT_SECRET" };

		assert_eq!(
			err.to_string(),
			"Missing required configuration variable: SALESFORCE_CLIENT_SECRET."
		);
	}
}
