//! Error types for bridge registration and host calls.

use thiserror::Error;

/// Errors surfaced by [`crate::Bridge`] operations.
#[derive(Debug, Error)]
pub enum BridgeError {
	/// The handle counter reached the configured limit.
	///
	/// Handles are never reused, so a bridge that exhausts its handle space
	/// refuses further registrations instead of wrapping around.
	#[error("callback handle space exhausted (limit {limit})")]
	HandlesExhausted {
		/// The configured `handle_limit`.
		limit: u64,
	},

	/// The dispatcher thread could not be spawned.
	#[error("failed to spawn dispatcher thread '{name}': {error}")]
	DispatcherSpawn {
		/// Requested thread name.
		name: String,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// [`crate::Bridge::install`] was called after the process bridge already existed.
	#[error("process bridge already installed for host type {host_type}")]
	AlreadyInstalled {
		/// Host value type of the existing bridge.
		host_type: &'static str,
	},

	/// The process bridge carries a different host value type than requested.
	#[error("process bridge is installed for {installed}, not {requested}")]
	HostTypeMismatch {
		/// Host value type of the existing bridge.
		installed: &'static str,
		/// Host value type the caller asked for.
		requested: &'static str,
	},

	/// The fallback runtime for offloaded work could not be built.
	#[error("failed to start offload runtime: {message}")]
	OffloadRuntime {
		/// Builder error, rendered once when the runtime was first needed.
		message: String,
	},
}

/// Failure reported by the host when invoking an operation on a [`crate::HostValue`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
	/// The named member exists but is not callable.
	#[error("'{0}' is not a function")]
	NotCallable(String),

	/// The host operation raised an exception.
	#[error("host exception: {0}")]
	Thrown(String),
}

/// A convenient type alias for `Result` with `E` = [`BridgeError`].
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;
