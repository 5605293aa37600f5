use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::handle::Handle;
use crate::signal::WakeSignal;

/// One queued call from the host, waiting for the dispatcher.
#[derive(Debug)]
pub(crate) struct InvocationRecord<V> {
	pub handle: Handle,
	pub args: Vec<V>,
	/// Position in the total append order of this queue.
	pub sequence: u64,
	/// Span active on the host thread when the trampoline was called.
	pub span: tracing::Span,
}

struct QueueState<V> {
	records: VecDeque<InvocationRecord<V>>,
	next_sequence: u64,
}

/// FIFO buffer shared between trampolines (producers) and the dispatcher (consumer).
///
/// Records are moved in and out whole under the lock, so a pop never sees a
/// partially written record. The wake signal is raised after the record is
/// visible, never before.
pub(crate) struct PendingQueue<V> {
	state: Mutex<QueueState<V>>,
	signal: Arc<dyn WakeSignal>,
}

impl<V> PendingQueue<V> {
	pub fn new(signal: Arc<dyn WakeSignal>) -> Self {
		Self {
			state: Mutex::new(QueueState {
				records: VecDeque::new(),
				next_sequence: 0,
			}),
			signal,
		}
	}

	/// Appends one invocation and wakes the dispatcher. Returns its sequence number.
	pub fn push(&self, handle: Handle, args: Vec<V>) -> u64 {
		let span = tracing::Span::current();
		let mut state = self.state.lock();
		let sequence = state.next_sequence;
		state.next_sequence = state.next_sequence.wrapping_add(1);
		state.records.push_back(InvocationRecord { handle, args, sequence, span });
		let pending = state.records.len();
		drop(state);

		tracing::trace!(handle = %handle, sequence, pending, "bridge.queue.push");
		self.signal.notify();
		sequence
	}

	/// Removes the oldest record, if any.
	pub fn pop_front(&self) -> Option<InvocationRecord<V>> {
		self.state.lock().records.pop_front()
	}

	/// Blocks until a push may have happened since the last wait.
	pub fn wait(&self) {
		self.signal.wait();
	}

	/// Number of records waiting.
	pub fn len(&self) -> usize {
		self.state.lock().records.len()
	}

	/// Total number of records ever appended.
	pub fn appended(&self) -> u64 {
		self.state.lock().next_sequence
	}
}
