use std::fmt;
use std::num::NonZeroU64;

use crate::error::{BridgeError, Result};

/// Identifier for one registered callback.
///
/// Handles start at 1 and increase monotonically for the lifetime of the
/// process bridge. A released handle is never handed out again, so a stale
/// handle can only ever fail to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(NonZeroU64);

impl Handle {
	/// Wraps a raw handle value. Returns `None` for the reserved value 0.
	pub const fn from_raw(raw: u64) -> Option<Self> {
		match NonZeroU64::new(raw) {
			Some(id) => Some(Self(id)),
			None => None,
		}
	}

	/// Returns the raw integer value.
	pub const fn get(self) -> u64 {
		self.0.get()
	}
}

impl fmt::Display for Handle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "cb#{}", self.0)
	}
}

/// Monotonic handle counter with a hard upper bound.
///
/// Not synchronized on its own; the registry advances it under the same lock
/// that guards insertion.
#[derive(Debug)]
pub(crate) struct HandleCounter {
	issued: u64,
	limit: u64,
}

impl HandleCounter {
	/// Creates a counter whose first handle is 1 and last handle is `limit`.
	pub fn new(limit: u64) -> Self {
		Self { issued: 0, limit }
	}

	/// Returns the next handle, or an error once `limit` has been handed out.
	pub fn next(&mut self) -> Result<Handle> {
		let exhausted = BridgeError::HandlesExhausted { limit: self.limit };
		if self.issued >= self.limit {
			return Err(exhausted);
		}
		self.issued += 1;
		Handle::from_raw(self.issued).ok_or(exhausted)
	}

	/// Number of handles issued so far.
	pub fn issued(&self) -> u64 {
		self.issued
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn zero_is_never_a_handle() {
		assert!(Handle::from_raw(0).is_none());
		assert_eq!(Handle::from_raw(5).map(Handle::get), Some(5));
	}

	#[test]
	fn counter_starts_at_one_and_increases() {
		let mut counter = HandleCounter::new(u64::MAX);
		let a = counter.next().unwrap();
		let b = counter.next().unwrap();
		assert_eq!(a.get(), 1);
		assert_eq!(b.get(), 2);
		assert_eq!(counter.issued(), 2);
	}

	#[test]
	fn counter_refuses_past_limit() {
		let mut counter = HandleCounter::new(2);
		assert!(counter.next().is_ok());
		assert!(counter.next().is_ok());
		assert!(matches!(counter.next(), Err(BridgeError::HandlesExhausted { limit: 2 })));
		assert!(matches!(counter.next(), Err(BridgeError::HandlesExhausted { limit: 2 })));
	}

	#[test]
	fn counter_does_not_reissue_max() {
		let mut counter = HandleCounter {
			issued: u64::MAX - 1,
			limit: u64::MAX,
		};
		assert_eq!(counter.next().unwrap().get(), u64::MAX);
		assert!(counter.next().is_err());
	}

	#[test]
	fn display_is_prefixed() {
		assert_eq!(Handle::from_raw(42).unwrap().to_string(), "cb#42");
	}
}
