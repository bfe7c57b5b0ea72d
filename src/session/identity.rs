//! Identity claims fetched from the provider and their session-facing summary.

// self
use crate::_prelude::*;

/// Raw payload returned by the provider's identity endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Identity {
	/// Subject identifier.
	pub user_id: String,
	/// Login username.
	pub username: String,
	/// Organization (tenant) identifier.
	pub organization_id: String,
	/// Account email address.
	#[serde(default)]
	pub email: Option<String>,
	/// Endpoint URL map published alongside the claims.
	#[serde(default)]
	pub urls: IdentityUrls,
}
impl Identity {
	/// Projects the claims into the session-facing summary shape.
	pub fn into_user_info(self) -> UserInfo {
		UserInfo {
			id: self.user_id,
			username: self.username,
			org_id: self.organization_id,
			email: self.email,
			profile: self.urls.profile,
		}
	}
}

/// Subset of the identity endpoint's `urls` map the session keeps.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityUrls {
	/// Link to the user's profile page.
	#[serde(default)]
	pub profile: Option<String>,
}

/// Identity summary embedded in the session and its public projection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Subject identifier.
	pub id: String,
	/// Login username.
	pub username: String,
	/// Organization (tenant) identifier.
	#[serde(rename = "orgId")]
	pub org_id: String,
	/// Account email address.
	#[serde(default)]
	pub email: Option<String>,
	/// Link to the user's profile page.
	#[serde(default)]
	pub profile: Option<String>,
}
