use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::dispatcher::DispatcherState;

/// Point-in-time view of a bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeStats {
	/// Dispatcher lifecycle state.
	pub dispatcher: DispatcherState,
	/// `true` once a propagated callback panic stopped the dispatcher.
	pub halted: bool,
	/// Live registered callbacks.
	pub registered: usize,
	/// Handles issued so far; the process bridge never reissues one.
	pub handles_issued: u64,
	/// Invocations waiting in the pending queue.
	pub pending: usize,
	/// Invocations ever queued by trampolines.
	pub enqueued: u64,
	/// Invocations handed to a callback body.
	pub delivered: u64,
	/// Invocations dropped because their handle was released.
	pub dropped: u64,
	/// Callback bodies that panicked.
	pub failed: u64,
}

/// Dispatch counters updated by the dispatcher thread.
#[derive(Debug, Default)]
pub(crate) struct DispatchCounters {
	pub delivered: AtomicU64,
	pub dropped: AtomicU64,
	pub failed: AtomicU64,
	pub halted: AtomicBool,
}

impl DispatchCounters {
	pub fn bump(counter: &AtomicU64) {
		counter.fetch_add(1, Ordering::Relaxed);
	}

	pub fn load(counter: &AtomicU64) -> u64 {
		counter.load(Ordering::Relaxed)
	}
}
