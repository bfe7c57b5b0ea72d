//! Optional observability helpers for gateway flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `sfdc_auth.flow` with the `flow` and
//!   `stage` fields, plus warn/error events at the flow boundaries (upstream bodies are
//!   logged here and never echoed to callers).
//! - Enable `metrics` to increment the `sfdc_auth_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Flow kinds observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization initiation (PKCE + state generation, redirect construction).
	Authorize,
	/// Callback handling (state validation, code exchange, session materialization).
	Callback,
	/// Refresh-token renewal.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::Callback => "callback",
			FlowKind::Refresh => "refresh",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a gateway operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Emits a warn-level event (when `tracing` is enabled) tagged with the call site stage.
pub(crate) fn warn_event(stage: &'static str, message: impl Display) {
	#[cfg(feature = "tracing")]
	{
		::tracing::warn!(stage, "{message}");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message);
	}
}

/// Emits an error-level event (when `tracing` is enabled) tagged with the call site stage.
pub(crate) fn error_event(stage: &'static str, message: impl Display) {
	#[cfg(feature = "tracing")]
	{
		::tracing::error!(stage, "{message}");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message);
	}
}
