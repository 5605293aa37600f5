use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::event::EventFlags;
use crate::handle::{Handle, HandleCounter};

/// Registered callback body.
pub(crate) type CallbackFn<V> = Arc<dyn Fn(Vec<V>) + Send + Sync>;

/// Flavor a callback was registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
	/// Receives every argument the host passed.
	Plain,
	/// Receives exactly one event, after the flagged effects ran on the host side.
	Event(EventFlags),
}

struct Entry<V> {
	func: CallbackFn<V>,
	kind: CallbackKind,
}

struct RegistryState<V> {
	entries: FxHashMap<Handle, Entry<V>>,
	counter: HandleCounter,
}

/// Handle table owning every live callback.
///
/// Allocation and insertion happen under one lock so concurrent registrations
/// never collide. The lock is never held while a callback runs: `resolve`
/// hands out a clone of the callback `Arc`.
pub(crate) struct CallbackRegistry<V> {
	inner: Mutex<RegistryState<V>>,
}

impl<V> CallbackRegistry<V> {
	/// Creates an empty registry that issues handles up to `handle_limit`.
	pub fn new(handle_limit: u64) -> Self {
		Self {
			inner: Mutex::new(RegistryState {
				entries: FxHashMap::default(),
				counter: HandleCounter::new(handle_limit),
			}),
		}
	}

	/// Stores `func` under a fresh handle.
	pub fn register(&self, kind: CallbackKind, func: CallbackFn<V>) -> Result<Handle> {
		let mut state = self.inner.lock();
		let handle = state.counter.next()?;
		state.entries.insert(handle, Entry { func, kind });
		Ok(handle)
	}

	/// Removes the entry for `handle`. Returns `false` if there was none.
	pub fn release(&self, handle: Handle) -> bool {
		self.inner.lock().entries.remove(&handle).is_some()
	}

	/// Looks up the callback for `handle`.
	pub fn resolve(&self, handle: Handle) -> Option<(CallbackFn<V>, CallbackKind)> {
		let state = self.inner.lock();
		state.entries.get(&handle).map(|entry| (Arc::clone(&entry.func), entry.kind))
	}

	/// Returns `true` while `handle` is registered.
	pub fn contains(&self, handle: Handle) -> bool {
		self.inner.lock().entries.contains_key(&handle)
	}

	/// Number of live callbacks.
	pub fn len(&self) -> usize {
		self.inner.lock().entries.len()
	}

	/// Number of handles ever issued.
	pub fn issued(&self) -> u64 {
		self.inner.lock().counter.issued()
	}
}
