//! Host value capability consumed by the bridge.
//!
//! The bridge never inspects host values beyond the four operations below.
//! Marshalling between host objects and concrete Rust types is the embedder's
//! concern.

use crate::error::HostError;

/// Opaque handle to a value owned by the host runtime.
///
/// Implementations are typically thin wrappers around a host reference
/// (an object id, a GC root, etc). They must be `Send` because invocation
/// records carry them from the host's thread to the dispatcher thread.
pub trait HostValue: Sized + Send + 'static {
	/// Reads a property. Returns `None` when the property is absent.
	fn get(&self, property: &str) -> Option<Self>;

	/// Invokes a method on this value with the given arguments.
	fn call(&self, method: &str, args: &[Self]) -> Result<Self, HostError>;

	/// Reads one element of an array-like value. Returns `None` out of bounds.
	fn index(&self, index: usize) -> Option<Self>;

	/// Length of an array-like value. Non array-like values report 0.
	fn length(&self) -> usize;
}

/// Expands a host arguments object into an ordered argument list.
///
/// Holes (indices for which [`HostValue::index`] yields nothing) are skipped.
pub(crate) fn expand_arguments<V: HostValue>(arguments: &V) -> Vec<V> {
	let len = arguments.length();
	let mut args = Vec::with_capacity(len);
	for i in 0..len {
		match arguments.index(i) {
			Some(value) => args.push(value),
			None => tracing::trace!(index = i, "bridge.arguments.hole"),
		}
	}
	args
}
