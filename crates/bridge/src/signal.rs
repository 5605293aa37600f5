//! Wake primitive the dispatcher sleeps on.

use parking_lot::{Condvar, Mutex};

/// Blocking "sleep until signaled" primitive.
///
/// `notify` may be called any number of times from any thread. `wait` is only
/// ever called by the dispatcher thread. A `notify` that happens before the
/// matching `wait` must not be lost: `wait` returns immediately in that case.
/// Spurious returns from `wait` are allowed, the dispatcher tolerates empty
/// drain passes.
pub trait WakeSignal: Send + Sync + 'static {
	/// Marks work as available and wakes the waiter if it is parked.
	fn notify(&self);

	/// Blocks until at least one `notify` happened since the previous return.
	fn wait(&self);
}

/// Single-permit wake signal on a `parking_lot` condition variable.
///
/// Notifications coalesce: many `notify` calls before a `wait` release that
/// `wait` exactly once.
#[derive(Debug, Default)]
pub struct ParkSignal {
	permit: Mutex<bool>,
	cond: Condvar,
}

impl ParkSignal {
	/// Creates a signal with no pending permit.
	pub fn new() -> Self {
		Self::default()
	}
}

impl WakeSignal for ParkSignal {
	fn notify(&self) {
		let mut permit = self.permit.lock();
		*permit = true;
		drop(permit);
		self.cond.notify_one();
	}

	fn wait(&self) {
		let mut permit = self.permit.lock();
		while !*permit {
			self.cond.wait(&mut permit);
		}
		*permit = false;
	}
}
