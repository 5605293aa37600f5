//! Host-visible diagnostic channel.
//!
//! Non-fatal conditions observed by trampolines and the dispatcher are
//! reported through a [`DiagnosticSink`]. Nothing reported here stops
//! dispatch.

use std::fmt;

use parking_lot::Mutex;

use crate::error::HostError;
use crate::event::EventEffect;
use crate::handle::Handle;

/// One non-fatal condition reported by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Diagnostic {
	/// A queued invocation targeted a handle that was already released.
	ReleasedHandle { handle: Handle, sequence: u64 },
	/// A callback body panicked and was isolated.
	CallbackPanicked { handle: Handle, message: String },
	/// A synchronous event effect failed on the host side.
	EffectFailed { handle: Handle, effect: EventEffect, error: HostError },
	/// An event trampoline was called without an event argument.
	MissingEvent { handle: Handle },
}

impl Diagnostic {
	/// Handle the diagnostic refers to.
	pub fn handle(&self) -> Handle {
		match self {
			Self::ReleasedHandle { handle, .. }
			| Self::CallbackPanicked { handle, .. }
			| Self::EffectFailed { handle, .. }
			| Self::MissingEvent { handle } => *handle,
		}
	}
}

impl fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::ReleasedHandle { handle, sequence } => write!(f, "call to released callback {handle} (invocation {sequence})"),
			Self::CallbackPanicked { handle, message } => write!(f, "callback {handle} panicked: {message}"),
			Self::EffectFailed { handle, effect, error } => write!(f, "callback {handle}: {} failed: {error}", effect.method()),
			Self::MissingEvent { handle } => write!(f, "event callback {handle} called without an event"),
		}
	}
}

/// Receiver for bridge diagnostics.
///
/// Called from whichever thread observed the condition: host threads for
/// trampoline-side reports, the dispatcher thread otherwise. Implementations
/// must not block for long.
pub trait DiagnosticSink: Send + Sync + 'static {
	/// Records one diagnostic.
	fn report(&self, diagnostic: Diagnostic);
}

/// Sink that forwards every diagnostic to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
	fn report(&self, diagnostic: Diagnostic) {
		match &diagnostic {
			Diagnostic::ReleasedHandle { handle, sequence } => {
				tracing::error!(handle = %handle, sequence, "call to released callback");
			}
			Diagnostic::CallbackPanicked { handle, message } => {
				tracing::error!(handle = %handle, panic = %message, "callback panicked");
			}
			Diagnostic::EffectFailed { handle, effect, error } => {
				tracing::warn!(handle = %handle, effect = effect.method(), %error, "event effect failed");
			}
			Diagnostic::MissingEvent { handle } => {
				tracing::warn!(handle = %handle, "event callback called without an event");
			}
		}
	}
}

/// Sink that keeps diagnostics in memory for later inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
	entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
	/// Creates an empty sink.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns a copy of everything recorded so far.
	pub fn snapshot(&self) -> Vec<Diagnostic> {
		self.entries.lock().clone()
	}

	/// Removes and returns everything recorded so far.
	pub fn take(&self) -> Vec<Diagnostic> {
		std::mem::take(&mut *self.entries.lock())
	}

	/// Number of recorded diagnostics.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when nothing has been recorded.
	pub fn is_empty(&self) -> bool {
		self.entries.lock().is_empty()
	}
}

impl DiagnosticSink for MemorySink {
	fn report(&self, diagnostic: Diagnostic) {
		tracing::debug!(%diagnostic, "bridge.diagnostic");
		self.entries.lock().push(diagnostic);
	}
}
