//! The single worker that drains the pending queue.
//!
//! The dispatcher is a dedicated OS thread started by the first registration
//! and never stopped. Each wake it pops records front to back until the queue
//! is empty, resolving every handle against the registry at delivery time and
//! running the callback inline. A callback that blocks therefore blocks all
//! later deliveries; long work belongs in [`crate::offload`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread::ThreadId;

use parking_lot::Mutex;

use crate::bridge::Shared;
use crate::config::FailurePolicy;
use crate::diagnostics::Diagnostic;
use crate::error::{BridgeError, Result};
use crate::queue::InvocationRecord;
use crate::stats::DispatchCounters;

/// Dispatcher lifecycle. `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
	/// No callback has been registered yet.
	Unstarted,
	/// The dispatcher thread is alive (or halted by a propagated panic).
	Running {
		/// Thread all callback bodies run on.
		thread: ThreadId,
	},
}

/// Start-once guard around the dispatcher thread.
pub(crate) struct Dispatcher {
	state: Mutex<DispatcherState>,
	#[cfg(test)]
	spawns: std::sync::atomic::AtomicUsize,
}

impl Dispatcher {
	pub fn new() -> Self {
		Self {
			state: Mutex::new(DispatcherState::Unstarted),
			#[cfg(test)]
			spawns: std::sync::atomic::AtomicUsize::new(0),
		}
	}

	pub fn state(&self) -> DispatcherState {
		*self.state.lock()
	}

	/// Spawns the dispatcher thread unless it already runs.
	///
	/// The state lock is held across the spawn so that racing first
	/// registrations observe `Running` and return without spawning.
	pub fn ensure_started<V: Send + 'static>(&self, shared: &Arc<Shared<V>>) -> Result<()> {
		let mut state = self.state.lock();
		if let DispatcherState::Running { .. } = *state {
			return Ok(());
		}

		let name = shared.thread_name.clone();
		let worker = Arc::clone(shared);
		let thread = std::thread::Builder::new()
			.name(name.clone())
			.spawn(move || run(worker))
			.map_err(|error| BridgeError::DispatcherSpawn { name: name.clone(), error })?;

		#[cfg(test)]
		self.spawns.fetch_add(1, Ordering::SeqCst);

		*state = DispatcherState::Running {
			thread: thread.thread().id(),
		};
		tracing::debug!(thread = %name, "bridge.dispatcher.started");
		Ok(())
	}

	#[cfg(test)]
	pub(crate) fn spawns_for_tests(&self) -> usize {
		self.spawns.load(Ordering::SeqCst)
	}
}

/// Marks the bridge halted if a callback panic unwinds through the loop.
struct HaltGuard<'a> {
	counters: &'a DispatchCounters,
}

impl Drop for HaltGuard<'_> {
	fn drop(&mut self) {
		if std::thread::panicking() {
			self.counters.halted.store(true, Ordering::SeqCst);
			tracing::error!("bridge dispatcher halted by a callback panic; no further callbacks will run");
		}
	}
}

fn run<V: Send + 'static>(shared: Arc<Shared<V>>) {
	let _guard = HaltGuard { counters: &shared.counters };
	loop {
		shared.queue.wait();
		drain(&shared);
	}
}

/// Delivers every queued record, oldest first. Returns how many were popped.
pub(crate) fn drain<V: Send + 'static>(shared: &Shared<V>) -> usize {
	let mut popped = 0;
	while let Some(record) = shared.queue.pop_front() {
		popped += 1;
		deliver(shared, record);
	}
	if popped > 0 {
		tracing::trace!(popped, "bridge.dispatcher.drained");
	}
	popped
}

fn deliver<V: Send + 'static>(shared: &Shared<V>, record: InvocationRecord<V>) {
	let InvocationRecord { handle, args, sequence, span } = record;

	// Registry lock is released before the body runs.
	let Some((func, kind)) = shared.registry.resolve(handle) else {
		DispatchCounters::bump(&shared.counters.dropped);
		shared.sink.report(Diagnostic::ReleasedHandle { handle, sequence });
		return;
	};

	let _caller = span.enter();
	let _dispatch = tracing::debug_span!("bridge.dispatch", handle = %handle, sequence, ?kind).entered();
	DispatchCounters::bump(&shared.counters.delivered);

	match shared.failure_policy {
		FailurePolicy::Propagate => func(args),
		FailurePolicy::Isolate => {
			if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| func(args))) {
				DispatchCounters::bump(&shared.counters.failed);
				shared.sink.report(Diagnostic::CallbackPanicked {
					handle,
					message: panic_message(payload.as_ref()),
				});
			}
		}
	}
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(msg) = payload.downcast_ref::<&'static str>() {
		(*msg).to_string()
	} else if let Some(msg) = payload.downcast_ref::<String>() {
		msg.clone()
	} else {
		"non-string panic payload".to_string()
	}
}
