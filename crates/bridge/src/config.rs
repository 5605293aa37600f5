use std::fmt;
use std::sync::Arc;

use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::signal::{ParkSignal, WakeSignal};

/// Default dispatcher thread name.
pub const DEFAULT_THREAD_NAME: &str = "xeno-bridge-dispatch";

/// What the dispatcher does when a callback body panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
	/// Catch the panic, report [`crate::Diagnostic::CallbackPanicked`] and keep dispatching.
	#[default]
	Isolate,
	/// Let the panic unwind out of the dispatcher. No callback is delivered afterwards.
	Propagate,
}

/// Construction-time configuration for a [`crate::Bridge`].
#[derive(Clone)]
pub struct BridgeConfig {
	pub(crate) thread_name: String,
	pub(crate) failure_policy: FailurePolicy,
	pub(crate) handle_limit: u64,
	pub(crate) sink: Arc<dyn DiagnosticSink>,
	pub(crate) signal: Arc<dyn WakeSignal>,
}

impl Default for BridgeConfig {
	fn default() -> Self {
		Self {
			thread_name: DEFAULT_THREAD_NAME.to_string(),
			failure_policy: FailurePolicy::default(),
			handle_limit: u64::MAX,
			sink: Arc::new(TracingSink),
			signal: Arc::new(ParkSignal::new()),
		}
	}
}

impl fmt::Debug for BridgeConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("BridgeConfig")
			.field("thread_name", &self.thread_name)
			.field("failure_policy", &self.failure_policy)
			.field("handle_limit", &self.handle_limit)
			.finish_non_exhaustive()
	}
}

impl BridgeConfig {
	/// Creates the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the dispatcher thread name.
	pub fn thread_name(mut self, name: impl Into<String>) -> Self {
		self.thread_name = name.into();
		self
	}

	/// Sets the callback failure policy.
	pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
		self.failure_policy = policy;
		self
	}

	/// Sets the largest handle value the bridge will issue.
	///
	/// # Panics
	///
	/// Panics if `limit` is zero.
	pub fn handle_limit(mut self, limit: u64) -> Self {
		assert!(limit > 0, "handle limit must be > 0");
		self.handle_limit = limit;
		self
	}

	/// Routes diagnostics to `sink` instead of `tracing`.
	pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
		self.sink = sink;
		self
	}

	/// Uses a host-provided wake primitive instead of [`ParkSignal`].
	pub fn signal(mut self, signal: Arc<dyn WakeSignal>) -> Self {
		self.signal = signal;
		self
	}
}
