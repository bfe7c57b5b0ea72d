// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Lock-free counters for the refresh flow, always on regardless of feature flags.
///
/// Shared by every clone of a gateway; useful for health endpoints and tests.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl RefreshMetrics {
	/// Records an attempted renewal.
	pub fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	/// Records a successful renewal.
	pub fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	/// Records a failed renewal.
	pub fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	/// Returns the attempted renewal count.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the successful renewal count.
	pub fn success(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the failed renewal count.
	pub fn failure(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}
}
impl Display for RefreshMetrics {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(
			f,
			"refresh attempts={} success={} failure={}",
			self.attempts(),
			self.success(),
			self.failure()
		)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn counters_accumulate_independently() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_attempt();
		metrics.record_success();
		metrics.record_failure();

		assert_eq!(metrics.attempts(), 2);
		assert_eq!(metrics.success(), 1);
		assert_eq!(metrics.failure(), 1);
		assert_eq!(metrics.to_string(), "refresh attempts=2 success=1 failure=1");
	}
}
