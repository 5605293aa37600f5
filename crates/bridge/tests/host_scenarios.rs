//! End-to-end host scenarios driven through the public API only.
//!
//! Every test in this binary shares the one process bridge, so assertions
//! about diagnostics are filtered by handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use xeno_bridge::{
	Bridge, BridgeConfig, BridgeError, Diagnostic, DispatcherState, EventEffect, EventFlags, Handle, HostError, HostValue, MemorySink,
};

const WAIT: Duration = Duration::from_secs(5);

/// Minimal host: numbers, argument lists and DOM-like events.
#[derive(Debug, Clone)]
enum JsValue {
	Number(f64),
	Arguments(Vec<JsValue>),
	Event(Arc<EventLog>),
}

#[derive(Debug, Default)]
struct EventLog {
	calls: Mutex<Vec<&'static str>>,
}

impl HostValue for JsValue {
	fn get(&self, property: &str) -> Option<Self> {
		match self {
			Self::Event(_) => EventEffect::ORDER.iter().any(|effect| effect.method() == property).then_some(Self::Number(0.0)),
			_ => None,
		}
	}

	fn call(&self, method: &str, _args: &[Self]) -> Result<Self, HostError> {
		let Self::Event(log) = self else {
			return Err(HostError::NotCallable(method.to_string()));
		};
		let effect = EventEffect::ORDER
			.into_iter()
			.find(|effect| effect.method() == method)
			.ok_or_else(|| HostError::Thrown(format!("unknown method {method}")))?;
		log.calls.lock().push(effect.method());
		Ok(Self::Number(0.0))
	}

	fn index(&self, index: usize) -> Option<Self> {
		match self {
			Self::Arguments(items) => items.get(index).cloned(),
			_ => None,
		}
	}

	fn length(&self) -> usize {
		match self {
			Self::Arguments(items) => items.len(),
			_ => 0,
		}
	}
}

/// A host value type the process bridge was not installed for.
#[derive(Debug, Clone)]
struct OtherHost;

impl HostValue for OtherHost {
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

fn sink() -> &'static Arc<MemorySink> {
	static SINK: OnceLock<Arc<MemorySink>> = OnceLock::new();
	SINK.get_or_init(|| Arc::new(MemorySink::new()))
}

fn bridge() -> &'static Bridge<JsValue> {
	static INSTALLED: OnceLock<&'static Bridge<JsValue>> = OnceLock::new();
	INSTALLED.get_or_init(|| {
		Bridge::install(BridgeConfig::new().thread_name("host-scenarios-dispatch").sink(sink().clone()))
			.expect("host scenarios install the process bridge first")
	})
}

fn diagnostics_for(handle: Handle) -> Vec<Diagnostic> {
	sink().snapshot().into_iter().filter(|diagnostic| diagnostic.handle() == handle).collect()
}

/// Parks the dispatcher inside a callback until the returned sender fires.
fn hold_dispatcher() -> Sender<()> {
	let (tx, rx) = mpsc::channel::<()>();
	let rx = Mutex::new(rx);
	let gate = bridge()
		.register(move |_| {
			let _ = rx.lock().recv_timeout(WAIT);
		})
		.unwrap();
	gate.call(Vec::new());
	tx
}

fn number(value: &JsValue) -> f64 {
	match value {
		JsValue::Number(n) => *n,
		other => panic!("expected a number, got {other:?}"),
	}
}

#[test]
fn calls_made_while_the_dispatcher_is_busy_arrive_in_order() {
	let (tx, rx) = mpsc::channel::<f64>();
	let tx = Mutex::new(tx);
	let c1 = bridge()
		.register(move |args| {
			let _ = tx.lock().send(number(&args[0]));
		})
		.unwrap();

	let gate = hold_dispatcher();
	for n in [1.0, 2.0, 3.0] {
		c1.call(vec![JsValue::Number(n)]);
	}
	let _ = gate.send(());

	let delivered: Vec<f64> = (0..3).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
	assert_eq!(delivered, vec![1.0, 2.0, 3.0]);
	assert!(rx.recv_timeout(Duration::from_millis(50)).is_err(), "exactly three deliveries");
	assert!(diagnostics_for(c1.handle()).is_empty());
}

#[test]
fn released_callback_is_skipped_and_reported() {
	let hits = Arc::new(AtomicUsize::new(0));
	let counted = Arc::clone(&hits);
	let c2 = bridge()
		.register(move |_| {
			counted.fetch_add(1, Ordering::SeqCst);
		})
		.unwrap();
	let (done_tx, done_rx) = mpsc::channel::<()>();
	let done_tx = Mutex::new(done_tx);
	let done = bridge()
		.register(move |_| {
			let _ = done_tx.lock().send(());
		})
		.unwrap();

	let gate = hold_dispatcher();
	c2.call(Vec::new());
	c2.release();
	done.call(Vec::new());
	let _ = gate.send(());

	done_rx.recv_timeout(WAIT).unwrap();
	assert_eq!(hits.load(Ordering::SeqCst), 0);
	let diagnostics = diagnostics_for(c2.handle());
	assert_eq!(diagnostics.len(), 1);
	assert!(matches!(diagnostics[0], Diagnostic::ReleasedHandle { .. }));
}

#[test]
fn event_callback_applies_selected_effects_before_running() {
	let (tx, rx) = mpsc::channel::<Vec<&'static str>>();
	let tx = Mutex::new(tx);
	let flags: EventFlags = [EventEffect::PreventDefault, EventEffect::StopImmediatePropagation].into_iter().collect();
	let callback = bridge()
		.register_event(flags, move |event| {
			if let JsValue::Event(log) = event {
				let _ = tx.lock().send(log.calls.lock().clone());
			}
		})
		.unwrap();

	let log = Arc::new(EventLog::default());
	callback.trampoline().call_with_arguments(&JsValue::Arguments(vec![JsValue::Event(Arc::clone(&log))]));

	assert_eq!(rx.recv_timeout(WAIT).unwrap(), vec!["preventDefault", "stopImmediatePropagation"]);
	assert!(!log.calls.lock().contains(&"stopPropagation"));
}

#[test]
fn every_bridge_value_shares_one_handle_sequence_and_dispatcher() {
	let installed = bridge();
	let looked_up: Bridge<JsValue> = Bridge::global().unwrap().clone();

	let a = installed.register(|_| {}).unwrap();
	let b = looked_up.register(|_| {}).unwrap();

	assert_ne!(a.handle(), b.handle());
	assert!(b.handle() > a.handle());
	assert!(matches!(installed.state(), DispatcherState::Running { .. }));
	assert_eq!(installed.state(), looked_up.state());
	assert!(looked_up.release(a.handle()));
	assert!(!installed.is_registered(a.handle()));
}

#[test]
fn second_install_is_refused() {
	bridge();
	let again = Bridge::<JsValue>::install(BridgeConfig::new());
	assert!(matches!(again, Err(BridgeError::AlreadyInstalled { .. })));
}

#[test]
fn other_host_types_cannot_reach_the_process_bridge() {
	bridge();
	assert!(matches!(Bridge::<OtherHost>::global(), Err(BridgeError::HostTypeMismatch { .. })));
	assert!(matches!(Bridge::<OtherHost>::install(BridgeConfig::new()), Err(BridgeError::AlreadyInstalled { .. })));
}
