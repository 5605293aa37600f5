//! A host-provided wake signal driving the process bridge.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use xeno_bridge::{Bridge, BridgeConfig, DispatcherState, HostError, HostValue, ParkSignal, WakeSignal};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq)]
struct Tick(u32);

impl HostValue for Tick {
	fn get(&self, _property: &str) -> Option<Self> {
		None
	}

	fn call(&self, method: &str, _args: &[Self]) -> Result<Self, HostError> {
		Err(HostError::NotCallable(method.to_string()))
	}

	fn index(&self, _index: usize) -> Option<Self> {
		None
	}

	fn length(&self) -> usize {
		0
	}
}

/// Wake signal that counts notifications and keeps the dispatcher asleep until opened.
#[derive(Default)]
struct HeldSignal {
	inner: ParkSignal,
	notifies: AtomicUsize,
	held: Mutex<bool>,
	opened: Condvar,
}

impl HeldSignal {
	fn holding() -> Self {
		Self {
			held: Mutex::new(true),
			..Self::default()
		}
	}

	fn open(&self) {
		*self.held.lock() = false;
		self.opened.notify_all();
	}
}

impl WakeSignal for HeldSignal {
	fn notify(&self) {
		self.notifies.fetch_add(1, Ordering::SeqCst);
		self.inner.notify();
	}

	fn wait(&self) {
		let mut held = self.held.lock();
		while *held {
			self.opened.wait(&mut held);
		}
		drop(held);
		self.inner.wait();
	}
}

#[test]
fn calls_queued_before_the_first_wake_are_delivered_in_order() {
	let signal = Arc::new(HeldSignal::holding());
	let bridge: &'static Bridge<Tick> = Bridge::install(BridgeConfig::new().signal(signal.clone())).unwrap();
	assert_eq!(bridge.state(), DispatcherState::Unstarted);

	let (tx, rx) = mpsc::channel::<u32>();
	let tx = Mutex::new(tx);
	let ticks = bridge
		.register(move |args| {
			for Tick(n) in args {
				let _ = tx.lock().send(n);
			}
		})
		.unwrap();
	assert!(matches!(bridge.state(), DispatcherState::Running { .. }));

	for n in 1..=3 {
		ticks.call(vec![Tick(n)]);
	}
	assert_eq!(signal.notifies.load(Ordering::SeqCst), 3);
	assert_eq!(bridge.stats().pending, 3);

	signal.open();
	let delivered: Vec<u32> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
	assert_eq!(delivered, vec![1, 2, 3]);
	assert!(rx.recv_timeout(Duration::from_millis(50)).is_err(), "exactly three deliveries");
}
