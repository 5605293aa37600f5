use std::any::{Any, type_name};
use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};

use crate::config::{BridgeConfig, FailurePolicy};
use crate::diagnostics::DiagnosticSink;
use crate::dispatcher::{Dispatcher, DispatcherState};
use crate::error::{BridgeError, Result};
use crate::event::EventFlags;
use crate::handle::Handle;
use crate::queue::PendingQueue;
use crate::registry::{CallbackKind, CallbackRegistry};
use crate::stats::{BridgeStats, DispatchCounters};
use crate::trampoline::Trampoline;
use crate::value::HostValue;


/// State shared by the bridge facade, its trampolines and the dispatcher thread.
pub(crate) struct Shared<V> {
	pub(crate) thread_name: String,
	pub(crate) failure_policy: FailurePolicy,
	pub(crate) registry: CallbackRegistry<V>,
	pub(crate) queue: Arc<PendingQueue<V>>,
	pub(crate) sink: Arc<dyn DiagnosticSink>,
	pub(crate) counters: DispatchCounters,
	pub(crate) dispatcher: Dispatcher,
}

/// The one bridge of this process, type-erased over its host value type.
static PROCESS_BRIDGE: OnceLock<Installed> = OnceLock::new();

struct Installed {
	host_type: &'static str,
	bridge: Box<dyn Any + Send + Sync>,
}

impl Installed {
	fn new<V: HostValue>(bridge: Bridge<V>) -> Self {
		tracing::debug!(host_type = type_name::<V>(), thread = %bridge.shared.thread_name, "bridge.install");
		Self {
			host_type: type_name::<V>(),
			bridge: Box::new(bridge),
		}
	}

	fn bridge<V: HostValue>(&'static self) -> Result<&'static Bridge<V>> {
		self.bridge.downcast_ref::<Bridge<V>>().ok_or(BridgeError::HostTypeMismatch {
			installed: self.host_type,
			requested: type_name::<V>(),
		})
	}
}

/// Ordered callback bridge between a host runtime and Rust.
///
/// A process has at most one bridge, obtained through [`Bridge::install`] or
/// [`Bridge::global`], so every handle comes from one sequence and every
/// callback runs on one dispatcher thread. Pass the `&'static` reference (or
/// a clone) to whatever registers callbacks. The dispatcher thread is spawned
/// by the first successful registration and lives as long as the process.
pub struct Bridge<V> {
	shared: Arc<Shared<V>>,
}

impl<V> Clone for Bridge<V> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<V> fmt::Debug for Bridge<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Bridge")
			.field("thread_name", &self.shared.thread_name)
			.field("dispatcher", &self.shared.dispatcher.state())
			.field("registered", &self.shared.registry.len())
			.finish_non_exhaustive()
	}
}

impl<V: HostValue> Bridge<V> {
	/// Builds the process bridge from `config`.
	///
	/// Fails with [`BridgeError::AlreadyInstalled`] once a bridge exists,
	/// whether it came from an earlier `install` or from [`Bridge::global`].
	pub fn install(config: BridgeConfig) -> Result<&'static Self> {
		let mut config = Some(config);
		let installed = PROCESS_BRIDGE.get_or_init(|| Installed::new(Self::build(config.take().unwrap_or_default())));
		if config.is_some() {
			return Err(BridgeError::AlreadyInstalled {
				host_type: installed.host_type,
			});
		}
		installed.bridge()
	}

	/// Returns the process bridge, building it with the default configuration
	/// on first use.
	///
	/// Fails with [`BridgeError::HostTypeMismatch`] when the process bridge
	/// was installed for a different host value type.
	pub fn global() -> Result<&'static Self> {
		PROCESS_BRIDGE.get_or_init(|| Installed::new(Self::build(BridgeConfig::default()))).bridge()
	}

	/// Standalone bridge with its own handle sequence and dispatcher, for unit tests.
	#[cfg(test)]
	pub(crate) fn with_config(config: BridgeConfig) -> Self {
		Self::build(config)
	}

	fn build(config: BridgeConfig) -> Self {
		let BridgeConfig {
			thread_name,
			failure_policy,
			handle_limit,
			sink,
			signal,
		} = config;
		Self {
			shared: Arc::new(Shared {
				thread_name,
				failure_policy,
				registry: CallbackRegistry::new(handle_limit),
				queue: Arc::new(PendingQueue::new(signal)),
				sink,
				counters: DispatchCounters::default(),
				dispatcher: Dispatcher::new(),
			}),
		}
	}

	/// Registers `func` and returns its handle together with a host trampoline.
	///
	/// Every call of the trampoline queues one invocation of `func` with the
	/// host's arguments. Invocations run on the dispatcher thread, one at a
	/// time, in the order the trampolines were called.
	pub fn register<F>(&self, func: F) -> Result<Callback<V>>
	where
		F: Fn(Vec<V>) + Send + Sync + 'static,
	{
		let handle = self.insert(CallbackKind::Plain, Arc::new(func))?;
		let trampoline = Trampoline::plain(handle, Arc::clone(&self.shared.queue), Arc::clone(&self.shared.sink));
		Ok(Callback { handle, trampoline, bridge: self.clone() })
	}

	/// Registers an event handler.
	///
	/// The returned trampoline takes exactly one event. Before queueing, it
	/// calls `preventDefault`, `stopPropagation` and `stopImmediatePropagation`
	/// on the event, in that order, for each bit set in `flags`. Those calls
	/// happen synchronously on the host's thread; `func` itself runs later on
	/// the dispatcher.
	pub fn register_event<F>(&self, flags: EventFlags, func: F) -> Result<Callback<V>>
	where
		F: Fn(V) + Send + Sync + 'static,
	{
		let body = move |args: Vec<V>| {
			if let Some(event) = args.into_iter().next() {
				func(event);
			}
		};
		let handle = self.insert(CallbackKind::Event(flags), Arc::new(body))?;
		let trampoline = Trampoline::event(handle, flags, Arc::clone(&self.shared.queue), Arc::clone(&self.shared.sink));
		Ok(Callback { handle, trampoline, bridge: self.clone() })
	}

	fn insert(&self, kind: CallbackKind, func: crate::registry::CallbackFn<V>) -> Result<Handle> {
		self.shared.dispatcher.ensure_started(&self.shared)?;
		let handle = self.shared.registry.register(kind, func)?;
		tracing::debug!(handle = %handle, ?kind, "bridge.register");
		Ok(handle)
	}

	/// Releases the callback behind `handle`.
	///
	/// Invocations already queued for it are dropped at delivery with a
	/// [`crate::Diagnostic::ReleasedHandle`]. Releasing twice, or releasing a
	/// handle that was never issued, does nothing and returns `false`.
	pub fn release(&self, handle: Handle) -> bool {
		let removed = self.shared.registry.release(handle);
		tracing::debug!(handle = %handle, removed, "bridge.release");
		removed
	}

	/// Returns `true` while `handle` resolves to a callback.
	pub fn is_registered(&self, handle: Handle) -> bool {
		self.shared.registry.contains(handle)
	}

	/// Dispatcher lifecycle state.
	pub fn state(&self) -> DispatcherState {
		self.shared.dispatcher.state()
	}

	/// Snapshot of counters and queue depth.
	pub fn stats(&self) -> BridgeStats {
		let counters = &self.shared.counters;
		BridgeStats {
			dispatcher: self.shared.dispatcher.state(),
			halted: counters.halted.load(Ordering::SeqCst),
			registered: self.shared.registry.len(),
			handles_issued: self.shared.registry.issued(),
			pending: self.shared.queue.len(),
			enqueued: self.shared.queue.appended(),
			delivered: DispatchCounters::load(&counters.delivered),
			dropped: DispatchCounters::load(&counters.dropped),
			failed: DispatchCounters::load(&counters.failed),
		}
	}
}

/// A registered callback: its handle, its host trampoline and a way to release it.
///
/// Dropping a `Callback` does not release it; hosts keep calling the
/// trampoline until [`Callback::release`] is called.
pub struct Callback<V> {
	handle: Handle,
	trampoline: Trampoline<V>,
	bridge: Bridge<V>,
}

impl<V> Clone for Callback<V> {
	fn clone(&self) -> Self {
		Self {
			handle: self.handle,
			trampoline: self.trampoline.clone(),
			bridge: self.bridge.clone(),
		}
	}
}

impl<V> fmt::Debug for Callback<V> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callback").field("handle", &self.handle).field("trampoline", &self.trampoline).finish()
	}
}

impl<V: HostValue> Callback<V> {
	/// Handle identifying this callback.
	pub fn handle(&self) -> Handle {
		self.handle
	}

	/// Trampoline to hand to the host.
	pub fn trampoline(&self) -> &Trampoline<V> {
		&self.trampoline
	}

	/// Shorthand for `self.trampoline().call(args)`.
	pub fn call(&self, args: Vec<V>) {
		self.trampoline.call(args);
	}

	/// Frees the callback. See [`Bridge::release`].
	pub fn release(&self) -> bool {
		self.bridge.release(self.handle)
	}
}
