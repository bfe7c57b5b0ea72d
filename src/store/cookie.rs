//! Request-scoped cookie jar backing the [`SecretStore`] contract.
//!
//! The jar is the bridge between the gateway and the embedding HTTP layer: the embedder
//! parses the request's `Cookie` header into a jar, hands it to a flow, then copies
//! [`CookieJar::set_cookie_headers`] onto the response. Every cookie the gateway writes
//! is `HttpOnly`, `SameSite=Lax`, `Path=/`, and `Secure` when the policy says so, which
//! keeps the stored credentials out of reach of page scripts and cross-site posts.
//! Values are percent-encoded on the wire so the JSON session survives cookie syntax.

// std
use std::borrow::Cow;
// self
use crate::{
	_prelude::*,
	store::{SecretStore, StoreError},
};

/// Cookie attribute policy derived from the deployment environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CookiePolicy {
	/// Marks every written cookie `Secure`; enabled outside development.
	pub secure: bool,
}

#[derive(Clone, Debug)]
struct PendingCookie {
	name: String,
	// `None` renders a removal cookie (`Max-Age=0`).
	value: Option<String>,
	max_age: Duration,
}

/// Per-request cookie state: values read from the incoming header plus the mutations
/// recorded by the flows, in application order (later writes win).
#[derive(Clone, Debug, Default)]
pub struct CookieJar {
	policy: CookiePolicy,
	incoming: HashMap<String, String>,
	pending: Vec<PendingCookie>,
}
impl CookieJar {
	/// Creates an empty jar with the provided attribute policy.
	pub fn new(policy: CookiePolicy) -> Self {
		Self { policy, incoming: HashMap::new(), pending: Vec::new() }
	}

	/// Parses a `Cookie` request header with the default (development) policy.
	pub fn from_header(header: &str) -> Self {
		Self::from_header_with_policy(CookiePolicy::default(), header)
	}

	/// Parses a `Cookie` request header, applying `policy` to every later write.
	pub fn from_header_with_policy(policy: CookiePolicy, header: &str) -> Self {
		let mut incoming = HashMap::new();

		for pair in header.split(';') {
			let Some((name, value)) = pair.trim().split_once('=') else {
				continue;
			};
			let value = match urlencoding::decode(value) {
				Ok(decoded) => decoded.into_owned(),
				// Not percent-encoded by us; keep the raw bytes.
				Err(_) => value.to_owned(),
			};

			incoming.insert(name.to_owned(), value);
		}

		Self { policy, incoming, pending: Vec::new() }
	}

	/// Returns the current value of a cookie, honoring pending writes and removals.
	pub fn get(&self, name: &str) -> Option<&str> {
		for pending in self.pending.iter().rev() {
			if pending.name == name {
				return pending.value.as_deref();
			}
		}

		self.incoming.get(name).map(String::as_str)
	}

	/// Records a cookie write with the provided TTL.
	pub fn set(&mut self, name: &str, value: &str, max_age: Duration) {
		self.pending.push(PendingCookie {
			name: name.to_owned(),
			value: Some(value.to_owned()),
			max_age,
		});
	}

	/// Records a cookie removal.
	pub fn remove(&mut self, name: &str) {
		self.pending.push(PendingCookie { name: name.to_owned(), value: None, max_age: Duration::ZERO });
	}

	/// Renders the pending mutations as `Set-Cookie` header values, last write per name
	/// winning so the response carries at most one directive per cookie.
	pub fn set_cookie_headers(&self) -> Vec<String> {
		let mut rendered: Vec<(usize, &PendingCookie)> = Vec::new();

		for (idx, pending) in self.pending.iter().enumerate() {
			if let Some(slot) = rendered.iter_mut().find(|(_, c)| c.name == pending.name) {
				*slot = (idx, pending);
			} else {
				rendered.push((idx, pending));
			}
		}

		rendered.sort_by_key(|(idx, _)| *idx);
		rendered.into_iter().map(|(_, cookie)| self.render(cookie)).collect()
	}

	fn render(&self, cookie: &PendingCookie) -> String {
		let mut header = match &cookie.value {
			Some(value) => format!(
				"{}={}; Max-Age={}",
				cookie.name,
				encode_value(value),
				cookie.max_age.whole_seconds().max(0),
			),
			None => format!("{}=; Max-Age=0", cookie.name),
		};

		header.push_str("; Path=/; HttpOnly; SameSite=Lax");

		if self.policy.secure {
			header.push_str("; Secure");
		}

		header
	}
}
impl SecretStore for CookieJar {
	fn read(&self, name: &str) -> Option<String> {
		self.get(name).map(str::to_owned)
	}

	fn write(&mut self, name: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
		self.set(name, value, ttl);

		Ok(())
	}

	fn delete(&mut self, name: &str) {
		self.remove(name);
	}
}

fn encode_value(value: &str) -> Cow<'_, str> {
	urlencoding::encode(value)
}
