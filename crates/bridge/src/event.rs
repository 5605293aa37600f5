//! Event modifier flags and the synchronous effects they request.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::handle::Handle;
use crate::value::HostValue;

bitflags::bitflags! {
	/// Effects an event trampoline applies to its event before queueing.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct EventFlags: u8 {
		/// Call `event.preventDefault()`.
		const PREVENT_DEFAULT = 1 << 0;
		/// Call `event.stopPropagation()`.
		const STOP_PROPAGATION = 1 << 1;
		/// Call `event.stopImmediatePropagation()`.
		const STOP_IMMEDIATE_PROPAGATION = 1 << 2;
	}
}

/// One synchronous event effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventEffect {
	/// Suppresses the host's default handling of the event.
	PreventDefault,
	/// Stops the event from reaching handlers further up the propagation path.
	StopPropagation,
	/// Stops every remaining handler, including those on the current target.
	StopImmediatePropagation,
}

impl EventEffect {
	/// Effects in the order they are applied.
	pub const ORDER: [Self; 3] = [Self::PreventDefault, Self::StopPropagation, Self::StopImmediatePropagation];

	/// Host method invoked for this effect.
	pub const fn method(self) -> &'static str {
		match self {
			Self::PreventDefault => "preventDefault",
			Self::StopPropagation => "stopPropagation",
			Self::StopImmediatePropagation => "stopImmediatePropagation",
		}
	}

	/// Flag bit that enables this effect.
	pub const fn flag(self) -> EventFlags {
		match self {
			Self::PreventDefault => EventFlags::PREVENT_DEFAULT,
			Self::StopPropagation => EventFlags::STOP_PROPAGATION,
			Self::StopImmediatePropagation => EventFlags::STOP_IMMEDIATE_PROPAGATION,
		}
	}
}

impl From<EventEffect> for EventFlags {
	fn from(effect: EventEffect) -> Self {
		effect.flag()
	}
}

impl FromIterator<EventEffect> for EventFlags {
	fn from_iter<I: IntoIterator<Item = EventEffect>>(iter: I) -> Self {
		let mut flags = EventFlags::empty();
		for effect in iter {
			flags |= effect.flag();
		}
		flags
	}
}

/// Applies the requested effects to `event` on the caller's stack.
///
/// Effects run in [`EventEffect::ORDER`]. A method the event does not have is
/// skipped; a method that fails is reported and the remaining effects still
/// run.
pub(crate) fn apply_effects<V: HostValue>(flags: EventFlags, event: &V, handle: Handle, sink: &dyn DiagnosticSink) {
	for effect in EventEffect::ORDER {
		if !flags.contains(effect.flag()) {
			continue;
		}
		if event.get(effect.method()).is_none() {
			tracing::debug!(handle = %handle, effect = effect.method(), "bridge.event.effect_unsupported");
			continue;
		}
		if let Err(error) = event.call(effect.method(), &[]) {
			sink.report(Diagnostic::EffectFailed { handle, effect, error });
		}
	}
}
