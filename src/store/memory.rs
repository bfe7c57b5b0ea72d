//! Thread-safe in-memory [`SecretStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{SecretStore, StoreError},
};

#[derive(Clone, Debug)]
struct StoredSecret {
	value: String,
	expires_at: OffsetDateTime,
}

/// Thread-safe storage backend that keeps secrets in-process.
///
/// Expiry is evaluated lazily: a read past the stored TTL removes the entry and
/// reports the value as absent, matching the cookie jar's behavior.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<HashMap<String, StoredSecret>>>);
impl MemoryStore {
	/// Returns the number of live (unexpired) entries; intended for tests.
	pub fn len(&self) -> usize {
		let now = OffsetDateTime::now_utc();

		self.0.read().values().filter(|secret| secret.expires_at > now).count()
	}

	/// Returns `true` when no live entries remain.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl SecretStore for MemoryStore {
	fn read(&self, name: &str) -> Option<String> {
		let now = OffsetDateTime::now_utc();

		{
			let guard = self.0.read();

			match guard.get(name) {
				None => return None,
				Some(secret) if secret.expires_at > now => return Some(secret.value.clone()),
				Some(_) => {},
			}
		}

		self.0.write().remove(name);

		None
	}

	fn write(&mut self, name: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
		let secret =
			StoredSecret { value: value.to_owned(), expires_at: OffsetDateTime::now_utc() + ttl };

		self.0.write().insert(name.to_owned(), secret);

		Ok(())
	}

	fn delete(&mut self, name: &str) {
		self.0.write().remove(name);
	}
}
