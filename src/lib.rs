//! Salesforce OAuth 2.0 session gateway - authorization code + PKCE login, cookie-backed
//! sessions, and refresh-token renewal for dashboard backends.
//!
//! The crate is transport-agnostic on the inbound side: every endpoint of the embedding
//! application maps to a [`flows::Gateway`] operation plus a set of cookie mutations
//! recorded on a [`store::CookieJar`]. The embedding HTTP layer parses the request's
//! `Cookie` header into a jar, invokes the operation, then materializes the jar's
//! pending `Set-Cookie` values and the operation's redirect/JSON outcome into a
//! response. Outbound, the gateway talks to the provider's token and identity
//! endpoints over HTTPS via [`http::HttpClient`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{config::AuthConfig, flows::Gateway, store::CookieJar};

	/// Builds a gateway pointed at a mock provider base URL, with cookie security relaxed
	/// the way a development deployment would run.
	pub fn build_test_gateway(login_url: &str) -> Gateway {
		let config = AuthConfig::builder()
			.client_id("client-it")
			.client_secret("secret-it")
			.redirect_uri("https://app.example.com/api/oauth2/callback")
			.login_url(login_url)
			.app_base_url("https://app.example.com")
			.build()
			.expect("Test gateway configuration should be valid.");

		Gateway::new(config)
	}

	/// Returns a request-scoped cookie jar parsed from the provided `Cookie` header.
	pub fn jar_with_cookies(header: &str) -> CookieJar {
		CookieJar::from_header(header)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tokio as _};
