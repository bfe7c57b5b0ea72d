//! Token and identity facade over the provider's OAuth 2.0 endpoints.
//!
//! Grant exchanges go through the `oauth2` crate with a provider-specific token
//! response type carrying Salesforce's extra fields (`instance_url`, `issued_at`,
//! the `id` identity URL). The identity fetch is a plain bearer-authenticated GET.
//! All upstream failures are folded into [`UpstreamError`] with the response status
//! captured by the instrumented transport; bodies stay in the error for server-side
//! logs only.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken,
	RequestTokenError, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	config::AuthConfig,
	error::{ConfigError, UpstreamError, UpstreamStage},
	http::{HttpClient, ResponseMetadata, ResponseMetadataSlot},
	session::{Identity, SecretString},
};

const TOKEN_PATH: &str = "/services/oauth2/token";
const USERINFO_PATH: &str = "/services/oauth2/userinfo";

/// Salesforce-specific fields riding alongside the standard token response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderTokenFields {
	/// Instance endpoint URL the issued access token is valid against.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub instance_url: Option<Url>,
	/// Issue timestamp as an epoch-millis string.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub issued_at: Option<String>,
	/// Identity URL to query for the subject's claims.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Url>,
	/// OpenID Connect identity token, when the scope requested one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
	/// Response signature; carried through without verification.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub signature: Option<String>,
}
impl ExtraTokenFields for ProviderTokenFields {}

type ProviderTokenResponse = StandardTokenResponse<ProviderTokenFields, BasicTokenType>;
type ProviderClient<
	HasAuthUrl = EndpointNotSet,
	HasDeviceAuthUrl = EndpointNotSet,
	HasIntrospectionUrl = EndpointNotSet,
	HasRevocationUrl = EndpointNotSet,
	HasTokenUrl = EndpointNotSet,
> = oauth2::Client<
	BasicErrorResponse,
	ProviderTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	HasAuthUrl,
	HasDeviceAuthUrl,
	HasIntrospectionUrl,
	HasRevocationUrl,
	HasTokenUrl,
>;
type ConfiguredProviderClient =
	ProviderClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Normalized outcome of a token endpoint grant.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// Issued bearer credential.
	pub access_token: SecretString,
	/// Renewal credential, when the grant produced one.
	pub refresh_token: Option<SecretString>,
	/// Scope string granted with the token.
	pub scope: Option<String>,
	/// Token type label reported by the provider.
	pub token_type: Option<String>,
	/// Relative expiry hint, when the provider supplied one.
	pub expires_in: Option<Duration>,
	/// Instance endpoint URL for subsequent API calls.
	pub instance_url: Option<Url>,
	/// Issue timestamp as reported by the provider.
	pub issued_at: Option<String>,
	/// Identity URL naming the authenticated subject.
	pub identity_url: Option<Url>,
	/// OpenID Connect identity token.
	pub id_token: Option<String>,
}
impl TokenGrant {
	fn from_response(response: ProviderTokenResponse) -> Self {
		let extra = response.extra_fields().clone();

		Self {
			access_token: SecretString::new(response.access_token().secret().clone()),
			refresh_token: response
				.refresh_token()
				.map(|token| SecretString::new(token.secret().clone())),
			scope: response.scopes().map(|scopes| {
				scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" ")
			}),
			token_type: token_type_label(response.token_type()),
			expires_in: response.expires_in().and_then(|delta| Duration::try_from(delta).ok()),
			instance_url: extra.instance_url,
			issued_at: extra.issued_at,
			identity_url: extra.id,
			id_token: extra.id_token,
		}
	}
}

/// Facade owning the configured `oauth2` client and the shared transport.
#[derive(Debug)]
pub(crate) struct TokenFacade {
	oauth_client: ConfiguredProviderClient,
	http_client: HttpClient,
	redirect_uri: Url,
	login_url: Url,
}
impl TokenFacade {
	/// Builds the facade; requires the confidential client secret.
	pub(crate) fn from_config(
		config: &AuthConfig,
		http_client: HttpClient,
	) -> Result<Self, ConfigError> {
		let client_secret = config.require_client_secret()?.to_owned();
		let token_url = TokenUrl::from_url(config.provider_endpoint(TOKEN_PATH));
		let redirect_url = RedirectUrl::from_url(config.redirect_uri.clone());
		// The provider expects client credentials in the form body, not basic auth.
		let oauth_client = ProviderClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(client_secret))
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self {
			oauth_client,
			http_client,
			redirect_uri: config.redirect_uri.clone(),
			login_url: config.login_url.clone(),
		})
	}

	/// Exchanges an authorization code plus PKCE verifier for a token grant.
	pub(crate) async fn exchange_code(&self, code: &str, verifier: &str) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let request = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_token_request_error(meta.take(), err))?;

		Ok(TokenGrant::from_response(response))
	}

	/// Renews an access token from a refresh token.
	pub(crate) async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let request = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.add_extra_param("redirect_uri", self.redirect_uri.as_str());
		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_token_request_error(meta.take(), err))?;

		Ok(TokenGrant::from_response(response))
	}

	/// Picks the identity endpoint for a grant: the `id` URL from the token response,
	/// falling back to the instance (or login) userinfo endpoint.
	pub(crate) fn identity_endpoint(&self, grant: &TokenGrant) -> Url {
		if let Some(url) = &grant.identity_url {
			return url.clone();
		}

		let mut url = grant.instance_url.clone().unwrap_or_else(|| self.login_url.clone());

		url.set_path(USERINFO_PATH);
		url.set_query(None);

		url
	}

	/// Fetches the subject's identity claims with the freshly issued bearer token.
	pub(crate) async fn fetch_identity(
		&self,
		access_token: &str,
		identity_url: &Url,
	) -> Result<Identity> {
		const STAGE: UpstreamStage = UpstreamStage::Identity;

		let response = self
			.http_client
			.get(identity_url.clone())
			.bearer_auth(access_token)
			.send()
			.await
			.map_err(|err| UpstreamError::network(STAGE, err))?;
		let status = response.status().as_u16();
		let body = response.bytes().await.map_err(|err| UpstreamError::network(STAGE, err))?;

		if !(200..300).contains(&status) {
			return Err(UpstreamError::Rejected {
				stage: STAGE,
				status: Some(status),
				detail: String::from_utf8_lossy(&body).into_owned(),
			}
			.into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&body);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			UpstreamError::Parse { stage: STAGE, source, status: Some(status) }.into()
		})
	}
}

fn token_type_label(token_type: &BasicTokenType) -> Option<String> {
	// BasicTokenType has no Display; round-trip through serde for the wire label.
	serde_json::to_value(token_type)
		.ok()
		.and_then(|value| value.as_str().map(str::to_owned))
}

fn map_token_request_error(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	const STAGE: UpstreamStage = UpstreamStage::TokenExchange;

	let status = meta.and_then(|value| value.status);

	match err {
		RequestTokenError::ServerResponse(response) => {
			let detail = match response.error_description() {
				Some(description) =>
					format!("{}: {description}", response.error().as_ref()),
				None => response.error().as_ref().to_owned(),
			};

			UpstreamError::Rejected { stage: STAGE, status, detail }.into()
		},
		RequestTokenError::Request(error) => map_transport_error(status, error),
		RequestTokenError::Parse(source, _body) =>
			UpstreamError::Parse { stage: STAGE, source, status }.into(),
		RequestTokenError::Other(message) =>
			UpstreamError::Rejected { stage: STAGE, status, detail: message }.into(),
	}
}

fn map_transport_error(status: Option<u16>, err: HttpClientError<ReqwestError>) -> Error {
	const STAGE: UpstreamStage = UpstreamStage::TokenExchange;

	match err {
		HttpClientError::Reqwest(inner) => UpstreamError::network(STAGE, *inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) =>
			UpstreamError::Network { stage: STAGE, source: Box::new(inner) }.into(),
		HttpClientError::Other(message) =>
			UpstreamError::Rejected { stage: STAGE, status, detail: message }.into(),
		_ => UpstreamError::Rejected {
			stage: STAGE,
			status,
			detail: "HTTP client error occurred while calling the token endpoint".into(),
		}
		.into(),
	}
}
