//! Ordered callback bridge between a host runtime and Rust.
//!
//! # Purpose
//!
//! - Let Rust code register functions that a foreign event loop (the host) can call at any time, from any thread.
//! - Deliver every host call to Rust on one dispatcher thread, in exactly the order the host made them.
//! - Keep registration and release race-free against calls that are already queued.
//!
//! # Mental model
//!
//! - The process holds one [`Bridge`], built by [`Bridge::install`] or on first use by [`Bridge::global`]. It owns a
//!   handle table (`CallbackRegistry`), a FIFO of pending invocations (`PendingQueue`) and a
//!   dispatcher thread that is spawned by the first registration and never stops.
//! - [`Bridge::register`] returns a [`Callback`]: a [`Handle`] plus a [`Trampoline`] the host stores and calls.
//! - A trampoline only enqueues `{handle, args}` and wakes the dispatcher. The function is looked up by handle at
//!   delivery time, so releasing a callback with calls in flight drops those calls instead of running freed code.
//! - Event trampolines ([`Bridge::register_event`]) additionally run up to three [`EventFlags`] effects on the host's
//!   stack before queueing, because those affect host behaviour that must be settled before the host call returns.
//!
//! # Key types
//!
//! | Type | Meaning | Constraints | Constructed / mutated in |
//! |---|---|---|---|
//! | [`Bridge`] | Process-wide bridge facade | Exactly one per process; cheap to clone | [`Bridge::install`], [`Bridge::global`] |
//! | [`Handle`] | Callback identifier | Starts at 1, strictly increasing, never reused | `CallbackRegistry::register` |
//! | [`Trampoline`] | Host-callable enqueue point | Captures handle + queue only, never the function | [`Bridge::register`], [`Bridge::register_event`] |
//! | [`EventFlags`] | Synchronous event effects | Applied in fixed order before queueing | caller |
//! | [`HostValue`] | Host value capability (`get`/`call`/`index`/`length`) | `Send`; provided by the embedder | embedder |
//! | [`WakeSignal`] | Dispatcher park/unpark primitive | A notify before wait must not be lost | [`BridgeConfig::signal`] |
//! | [`DiagnosticSink`] | Non-fatal condition reports | Must not block | [`BridgeConfig::sink`] |
//!
//! # Invariants
//!
//! - Handles are unique for the process lifetime; exhaustion is an error, never a wrap.
//! - Invocations are delivered in append order; batch wakes never reorder.
//! - At most one dispatcher thread per process, even under concurrent first registrations.
//! - No lock is held while a callback body runs; callbacks may register and release.
//! - A queued invocation whose handle was released is dropped and reported, never delivered.
//! - Release is idempotent.
//!
//! # Failure handling
//!
//! - A callback that blocks stalls all later deliveries. Use [`offload`] / [`offload_blocking`] for long work.
//! - A callback panic is isolated and reported under [`FailurePolicy::Isolate`] (the default). Under
//!   [`FailurePolicy::Propagate`] it unwinds the dispatcher thread and no callback is delivered afterwards.

mod bridge;
mod config;
mod diagnostics;
mod dispatcher;
mod error;
mod event;
mod handle;
mod offload;
mod queue;
mod registry;
mod signal;
mod stats;
mod trampoline;
mod value;


pub use bridge::{Bridge, Callback};
pub use config::{BridgeConfig, DEFAULT_THREAD_NAME, FailurePolicy};
pub use diagnostics::{Diagnostic, DiagnosticSink, MemorySink, TracingSink};
pub use dispatcher::DispatcherState;
pub use error::{BridgeError, HostError, Result};
pub use event::{EventEffect, EventFlags};
pub use handle::Handle;
pub use offload::{offload, offload_blocking, offload_panic_message};
pub use registry::CallbackKind;
pub use signal::{ParkSignal, WakeSignal};
pub use stats::BridgeStats;
pub use trampoline::Trampoline;
pub use value::HostValue;
