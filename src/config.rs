//! Explicit gateway configuration, validated once at construction.
//!
//! The original deployment read provider settings ambiently from the process environment
//! on every request; here the settings are collected into [`AuthConfig`] exactly once and
//! passed by reference into each flow. Validation failures name the offending variable
//! and never echo supplied values.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable carrying the OAuth client identifier.
pub const CLIENT_ID_VAR: &str = "SALESFORCE_CLIENT_ID";
/// Environment variable carrying the OAuth client secret.
pub const CLIENT_SECRET_VAR: &str = "SALESFORCE_CLIENT_SECRET";
/// Environment variable carrying the registered redirect URI.
pub const REDIRECT_URI_VAR: &str = "SALESFORCE_REDIRECT_URI";
/// Environment variable carrying the provider login base URL.
pub const LOGIN_URL_VAR: &str = "SALESFORCE_LOGIN_URL";
/// Environment variable carrying the public base URL of the embedding application.
pub const APP_BASE_URL_VAR: &str = "PUBLIC_BASE_URL";
/// Environment variable selecting the deployment environment (`production` hardens cookies).
pub const APP_ENV_VAR: &str = "APP_ENV";

const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
const DEFAULT_APP_BASE_URL: &str = "http://localhost:3000";

/// Provider and deployment settings shared by every flow.
///
/// The client secret is optional at construction because the authorization initiator
/// does not need it; the callback and refresh flows fail closed with a
/// [`ConfigError::MissingVariable`] when it is absent.
#[derive(Clone)]
pub struct AuthConfig {
	/// OAuth 2.0 client identifier sent with every grant.
	pub client_id: String,
	/// Confidential client secret; required by the token endpoint grants only.
	pub client_secret: Option<String>,
	/// Redirect URI registered with the provider for the callback endpoint.
	pub redirect_uri: Url,
	/// Provider login base URL hosting `/services/oauth2/*`.
	pub login_url: Url,
	/// Public base URL used to resolve relative return paths after login.
	pub app_base_url: Url,
	/// Marks cookies `Secure`; enabled outside development deployments.
	pub secure_cookies: bool,
}
impl AuthConfig {
	/// Returns a builder with the production login URL and local app base pre-filled.
	pub fn builder() -> AuthConfigBuilder {
		AuthConfigBuilder::default()
	}

	/// Reads the configuration from the process environment in one shot.
	///
	/// `SALESFORCE_LOGIN_URL` and `PUBLIC_BASE_URL` fall back to their defaults;
	/// `APP_ENV=production` turns on `Secure` cookies.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut builder = Self::builder();

		if let Ok(value) = env::var(CLIENT_ID_VAR) {
			builder = builder.client_id(value);
		}
		if let Ok(value) = env::var(CLIENT_SECRET_VAR) {
			builder = builder.client_secret(value);
		}
		if let Ok(value) = env::var(REDIRECT_URI_VAR) {
			builder = builder.redirect_uri(value);
		}
		if let Ok(value) = env::var(LOGIN_URL_VAR) {
			builder = builder.login_url(value);
		}
		if let Ok(value) = env::var(APP_BASE_URL_VAR) {
			builder = builder.app_base_url(value);
		}
		if matches!(env::var(APP_ENV_VAR).as_deref(), Ok("production")) {
			builder = builder.secure_cookies(true);
		}

		builder.build()
	}

	/// Requires the client secret, naming the variable when it is missing.
	pub(crate) fn require_client_secret(&self) -> Result<&str, ConfigError> {
		self.client_secret
			.as_deref()
			.filter(|secret| !secret.is_empty())
			.ok_or(ConfigError::MissingVariable { name: CLIENT_SECRET_VAR })
	}

	/// Resolves a provider endpoint path against the login base URL.
	pub(crate) fn provider_endpoint(&self, path: &str) -> Url {
		let mut url = self.login_url.clone();

		url.set_path(path);
		url.set_query(None);

		url
	}
}
impl Debug for AuthConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.field("login_url", &self.login_url)
			.field("app_base_url", &self.app_base_url)
			.field("secure_cookies", &self.secure_cookies)
			.finish()
	}
}

/// Builder for [`AuthConfig`]; validation happens in [`build`](AuthConfigBuilder::build).
#[derive(Clone, Debug)]
pub struct AuthConfigBuilder {
	client_id: Option<String>,
	client_secret: Option<String>,
	redirect_uri: Option<String>,
	login_url: String,
	app_base_url: String,
	secure_cookies: bool,
}
impl Default for AuthConfigBuilder {
	fn default() -> Self {
		Self {
			client_id: None,
			client_secret: None,
			redirect_uri: None,
			login_url: DEFAULT_LOGIN_URL.into(),
			app_base_url: DEFAULT_APP_BASE_URL.into(),
			secure_cookies: false,
		}
	}
}
impl AuthConfigBuilder {
	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, value: impl Into<String>) -> Self {
		self.client_id = Some(value.into());

		self
	}

	/// Sets the confidential client secret.
	pub fn client_secret(mut self, value: impl Into<String>) -> Self {
		self.client_secret = Some(value.into());

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, value: impl Into<String>) -> Self {
		self.redirect_uri = Some(value.into());

		self
	}

	/// Overrides the provider login base URL.
	pub fn login_url(mut self, value: impl Into<String>) -> Self {
		self.login_url = value.into();

		self
	}

	/// Overrides the public application base URL.
	pub fn app_base_url(mut self, value: impl Into<String>) -> Self {
		self.app_base_url = value.into();

		self
	}

	/// Toggles the `Secure` cookie attribute.
	pub fn secure_cookies(mut self, value: bool) -> Self {
		self.secure_cookies = value;

		self
	}

	/// Validates the collected settings and produces an [`AuthConfig`].
	pub fn build(self) -> Result<AuthConfig, ConfigError> {
		let client_id = self
			.client_id
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::MissingVariable { name: CLIENT_ID_VAR })?;
		let redirect_uri = self
			.redirect_uri
			.filter(|value| !value.is_empty())
			.ok_or(ConfigError::MissingVariable { name: REDIRECT_URI_VAR })?;
		let redirect_uri = Url::parse(&redirect_uri)
			.map_err(|source| ConfigError::InvalidUrl { name: REDIRECT_URI_VAR, source })?;
		let login_url = Url::parse(&self.login_url)
			.map_err(|source| ConfigError::InvalidUrl { name: LOGIN_URL_VAR, source })?;
		let app_base_url = Url::parse(&self.app_base_url)
			.map_err(|source| ConfigError::InvalidUrl { name: APP_BASE_URL_VAR, source })?;

		Ok(AuthConfig {
			client_id,
			client_secret: self.client_secret.filter(|value| !value.is_empty()),
			redirect_uri,
			login_url,
			app_base_url,
			secure_cookies: self.secure_cookies,
		})
	}
}
