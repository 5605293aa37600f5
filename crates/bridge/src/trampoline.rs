//! Host-callable entry points.
//!
//! A trampoline captures a handle and the shared queue, never the callback
//! itself. The dispatcher resolves the handle at delivery time, which is what
//! makes releasing a callback with invocations still in flight safe.

use std::fmt;
use std::sync::Arc;

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::event::{EventFlags, apply_effects};
use crate::handle::Handle;
use crate::queue::PendingQueue;
use crate::value::{HostValue, expand_arguments};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
	Plain,
	Event(EventFlags),
}

/// Boundary-callable object handed to the host.
///
/// Calling it never runs the callback inline. It appends an invocation to the
/// pending queue and wakes the dispatcher, then returns.
pub struct Trampoline<V> {
	handle: Handle,
	mode: Mode,
	queue: Arc<PendingQueue<V>>,
	sink: Arc<dyn DiagnosticSink>,
}

impl<V> Clone for Trampoline<V> {
	fn clone(&self) -> Self {
		Self {
			handle: self.handle,
			mode: self.mode,
			queue: Arc::clone(&self.queue),
			sink: Arc::clone(&self.sink),
		}
	}
}

impl<V> fmt::Debug for Trampoline<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Trampoline").field("handle", &self.handle).field("mode", &self.mode).finish()
	}
}

impl<V: HostValue> Trampoline<V> {
	pub(crate) fn plain(handle: Handle, queue: Arc<PendingQueue<V>>, sink: Arc<dyn DiagnosticSink>) -> Self {
		Self {
			handle,
			mode: Mode::Plain,
			queue,
			sink,
		}
	}

	pub(crate) fn event(handle: Handle, flags: EventFlags, queue: Arc<PendingQueue<V>>, sink: Arc<dyn DiagnosticSink>) -> Self {
		Self {
			handle,
			mode: Mode::Event(flags),
			queue,
			sink,
		}
	}

	/// Handle this trampoline enqueues for.
	pub fn handle(&self) -> Handle {
		self.handle
	}

	/// Event flags, for event trampolines.
	pub fn flags(&self) -> Option<EventFlags> {
		match self.mode {
			Mode::Plain => None,
			Mode::Event(flags) => Some(flags),
		}
	}

	/// Host entry point: queue one invocation with `args`.
	///
	/// Event trampolines first apply their flagged effects to `args[0]` on the
	/// calling thread and queue only that event. Called with no arguments they
	/// report [`Diagnostic::MissingEvent`] and queue nothing.
	pub fn call(&self, args: Vec<V>) {
		match self.mode {
			Mode::Plain => {
				self.queue.push(self.handle, args);
			}
			Mode::Event(flags) => {
				let extra = args.len().saturating_sub(1);
				let Some(event) = args.into_iter().next() else {
					self.sink.report(Diagnostic::MissingEvent { handle: self.handle });
					return;
				};
				if extra > 0 {
					tracing::trace!(handle = %self.handle, extra, "bridge.event.extra_args_dropped");
				}
				apply_effects(flags, &event, self.handle, self.sink.as_ref());
				self.queue.push(self.handle, vec![event]);
			}
		}
	}

	/// Host entry point taking a native array-like arguments object.
	pub fn call_with_arguments(&self, arguments: &V) {
		self.call(expand_arguments(arguments));
	}
}
