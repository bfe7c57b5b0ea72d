//! Session aggregate: the unit of trust handed to the rest of the application.

pub mod identity;
pub mod secret;

pub use identity::{Identity, IdentityUrls, UserInfo};
pub use secret::SecretString;

// self
use crate::{
	_prelude::*,
	obs,
	store::{REFRESH_TOKEN_COOKIE, SESSION_COOKIE, SESSION_TTL, SecretStore, StoreError},
};

/// Authenticated-user aggregate materialized at a successful callback.
///
/// Serialized as a single opaque JSON value under the `sf_session` name with a fixed
/// 24-hour TTL, independent of the access token's own expiry. The refresh flow mutates
/// the token-bearing fields in place and rewrites the value with a fresh TTL; the
/// refresh token and identity summary survive every refresh.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	/// Bearer credential for provider API calls.
	#[serde(rename = "accessToken")]
	pub access_token: SecretString,
	/// Long-lived renewal credential; present only on first/consent grants.
	#[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<SecretString>,
	/// Instance endpoint URL the access token is valid against.
	#[serde(rename = "instanceUrl", default, skip_serializing_if = "Option::is_none")]
	pub instance_url: Option<Url>,
	/// Issue timestamp as reported by the provider (epoch-millis string) or stamped
	/// locally in RFC 3339 when the provider omits it.
	pub issued_at: String,
	/// Scope string granted with the token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Token type reported by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Identity summary fetched at login.
	#[serde(rename = "userInfo")]
	pub user_info: UserInfo,
}
impl Session {
	/// A session is trusted only while it carries a non-empty access token.
	pub fn is_valid(&self) -> bool {
		!self.access_token.is_empty()
	}

	/// Reads and parses the stored session.
	///
	/// Absent, expired, invalid, or unparsable values all read as `None`; a corrupt
	/// cookie is logged and treated as "not signed in", never as a crash.
	pub fn read(store: &dyn SecretStore) -> Option<Self> {
		let raw = store.read(SESSION_COOKIE)?;
		let mut deserializer = serde_json::Deserializer::from_str(&raw);

		match serde_path_to_error::deserialize::<_, Self>(&mut deserializer) {
			Ok(session) if session.is_valid() => Some(session),
			Ok(_) => {
				obs::warn_event("session.read", "Stored session has an empty access token.");

				None
			},
			Err(err) => {
				obs::warn_event(
					"session.read",
					format!("Stored session failed to parse at {}.", err.path()),
				);

				None
			},
		}
	}

	/// Serializes the session and writes it with a fresh TTL.
	pub fn write(&self, store: &mut dyn SecretStore) -> Result<(), StoreError> {
		let raw = serde_json::to_string(self)
			.map_err(|err| StoreError::Serialization { message: err.to_string() })?;

		store.write(SESSION_COOKIE, &raw, SESSION_TTL)
	}

	/// Removes the session and its companion refresh-token secret.
	pub fn delete(store: &mut dyn SecretStore) {
		store.delete(SESSION_COOKIE);
		store.delete(REFRESH_TOKEN_COOKIE);
	}

	/// Public-safe projection returned to API-style callers.
	pub fn summary(&self) -> SessionSummary {
		SessionSummary {
			user_info: self.user_info.clone(),
			access_token: self.access_token.expose().to_owned(),
			instance_url: self.instance_url.clone(),
			refresh_token: self.refresh_token.as_ref().map(|secret| secret.expose().to_owned()),
		}
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("instance_url", &self.instance_url)
			.field("issued_at", &self.issued_at)
			.field("scope", &self.scope)
			.field("token_type", &self.token_type)
			.field("user_info", &self.user_info)
			.finish()
	}
}

/// Projection of a [`Session`] safe to hand to API-style callers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
	/// Identity summary.
	#[serde(rename = "userInfo")]
	pub user_info: UserInfo,
	/// Current access token.
	#[serde(rename = "accessToken")]
	pub access_token: String,
	/// Instance endpoint URL.
	#[serde(rename = "instanceUrl", skip_serializing_if = "Option::is_none")]
	pub instance_url: Option<Url>,
	/// Refresh token, included only when the caller needs it.
	#[serde(rename = "refreshToken", skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}
impl SessionSummary {
	/// Strips the refresh token from the projection.
	pub fn without_refresh_token(mut self) -> Self {
		self.refresh_token = None;

		self
	}
}
