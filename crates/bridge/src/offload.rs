//! Helpers for moving long-running work off the dispatcher thread.
//!
//! Callbacks run inline on the single dispatcher, so a callback that blocks
//! delays every later delivery. Callbacks that need to wait on I/O or do heavy
//! computation should hand that work to one of these helpers and return.

use std::future::Future;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::{JoinError, JoinHandle};

use crate::dispatcher::panic_message;
use crate::error::{BridgeError, Result};

/// Thread name prefix of the fallback runtime's workers and blocking threads.
pub(crate) const OFFLOAD_THREAD_PREFIX: &str = "xeno-bridge-offload";

const MAX_FALLBACK_WORKERS: usize = 4;

/// Runtime used when the caller has no ambient one. The dispatcher thread
/// never enters a runtime, so every offload from a callback lands here.
/// A build failure is kept and reported on each later attempt.
static FALLBACK: OnceLock<std::result::Result<Runtime, String>> = OnceLock::new();

fn build_fallback() -> std::result::Result<Runtime, String> {
	let workers = std::thread::available_parallelism().map_or(1, |n| n.get().min(MAX_FALLBACK_WORKERS));
	let spawned = AtomicUsize::new(0);
	let runtime = Builder::new_multi_thread()
		.enable_all()
		.worker_threads(workers)
		.thread_name_fn(move || format!("{OFFLOAD_THREAD_PREFIX}-{}", spawned.fetch_add(1, Ordering::Relaxed)))
		.build();
	match runtime {
		Ok(runtime) => {
			tracing::debug!(workers, "bridge.offload.runtime_started");
			Ok(runtime)
		}
		Err(error) => {
			tracing::error!(%error, "bridge.offload.runtime_failed");
			Err(error.to_string())
		}
	}
}

fn spawner() -> Result<Handle> {
	if let Ok(handle) = Handle::try_current() {
		return Ok(handle);
	}
	match FALLBACK.get_or_init(build_fallback) {
		Ok(runtime) => Ok(runtime.handle().clone()),
		Err(message) => Err(BridgeError::OffloadRuntime { message: message.clone() }),
	}
}

/// Spawns an async task outside the dispatcher.
///
/// Uses the ambient tokio runtime when there is one, otherwise a lazily built
/// process-global runtime.
#[allow(clippy::disallowed_methods)]
pub fn offload<F>(fut: F) -> Result<JoinHandle<F::Output>>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	let spawner = spawner()?;
	tracing::trace!("bridge.offload.spawn");
	Ok(spawner.spawn(fut))
}

/// Runs blocking work on the tokio blocking pool outside the dispatcher.
#[allow(clippy::disallowed_methods)]
pub fn offload_blocking<F, R>(f: F) -> Result<JoinHandle<R>>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	let spawner = spawner()?;
	tracing::trace!("bridge.offload.spawn_blocking");
	Ok(spawner.spawn_blocking(f))
}

/// Returns the panic message of a failed offloaded task, or `None` if it was cancelled.
pub fn offload_panic_message(err: JoinError) -> Option<String> {
	if !err.is_panic() {
		return None;
	}
	Some(panic_message(err.into_panic().as_ref()))
}
