//! Monitor channel integration tests against libzmq.

use std::cell::RefCell;
use std::time::{Duration, Instant};
use zbind::{Context, EventMask, MonitorEventKind, Poller, SocketType, ZmqError};

fn tcp_endpoint() -> String {
    let port = portpicker::pick_unused_port().expect("no free port");
    format!("tcp://127.0.0.1:{port}")
}

#[test]
fn test_drain_after_close_delivers_stop_once() {
    zbind::dev_tracing::init_tracing();
    let ctx = Context::new().unwrap();
    let socket = ctx.socket(SocketType::Push).unwrap();
    socket.set_linger(0).unwrap();
    let monitor = socket.monitor(EventMask::ALL).unwrap();
    assert!(monitor.endpoint().starts_with("inproc://"));
    assert!(!monitor.is_stopped());

    let events = RefCell::new(Vec::new());
    let stop_seen_while_running = RefCell::new(0);
    let mut poller = Poller::builder()
        .handle_monitor(&monitor, |event| {
            if event.is_stopped() {
                *stop_seen_while_running.borrow_mut() += 1;
            }
            events.borrow_mut().push(event.clone());
        })
        .build()
        .unwrap();

    socket.bind(&tcp_endpoint()).unwrap();
    socket.close();
    poller.drain_monitors_until_stopped().unwrap();
    drop(poller);

    assert!(monitor.is_stopped());
    assert_eq!(*stop_seen_while_running.borrow(), 1);

    let events = events.into_inner();
    let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
    assert!(kinds.contains(&MonitorEventKind::Listening), "{kinds:?}");
    assert_eq!(kinds.last(), Some(&MonitorEventKind::MonitorStopped));
    assert_eq!(events.last().and_then(|e| e.endpoint.clone()), None);

    let listening = events
        .iter()
        .find(|e| e.kind == MonitorEventKind::Listening)
        .unwrap();
    assert!(listening.endpoint.as_deref().unwrap_or_default().starts_with("tcp://"));
    assert!(listening.error.is_none());
}

#[test]
fn test_drain_returns_immediately_when_stopped() {
    let ctx = Context::new().unwrap();
    let socket = ctx.socket(SocketType::Pair).unwrap();
    let monitor = socket.monitor(EventMask::ALL).unwrap();
    socket.close();

    let mut poller = Poller::builder().handle_monitor(&monitor, |_| {}).build().unwrap();
    poller.drain_monitors_until_stopped().unwrap();
    assert!(monitor.is_stopped());
    // the stream is over; a second drain has nothing to wait for
    poller.drain_monitors_until_stopped().unwrap();
}

#[test]
fn test_connection_events_through_poll() {
    let ctx = Context::new().unwrap();
    let endpoint = tcp_endpoint();
    let server = ctx.socket(SocketType::Pull).unwrap();
    server.bind(&endpoint).unwrap();
    let monitor = server
        .monitor(MonitorEventKind::Accepted | MonitorEventKind::MonitorStopped)
        .unwrap();

    let client = ctx.socket(SocketType::Push).unwrap();
    client.set_linger(0).unwrap();
    client.connect(&endpoint).unwrap();

    let accepted = RefCell::new(None);
    let mut poller = Poller::builder()
        .handle_monitor(&monitor, |event| {
            if event.kind == MonitorEventKind::Accepted {
                *accepted.borrow_mut() = Some(event.to_string());
            }
        })
        .build()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while accepted.borrow().is_none() {
        assert!(Instant::now() < deadline, "no Accepted event");
        poller.poll(100).unwrap();
    }
    assert_eq!(accepted.borrow().as_deref(), Some("Accepted"));

    server.close();
    poller.drain_monitors_until_stopped().unwrap();
    assert!(monitor.is_stopped());
}

#[test]
fn test_failure_event_carries_error() {
    let ctx = Context::new().unwrap();
    let endpoint = tcp_endpoint();
    let first = ctx.socket(SocketType::Pull).unwrap();
    first.bind(&endpoint).unwrap();

    let second = ctx.socket(SocketType::Pull).unwrap();
    let monitor = second.monitor(EventMask::ALL).unwrap();
    let err = second.bind(&endpoint).unwrap_err();
    assert!(matches!(err, ZmqError::Native { .. }), "{err}");

    let failures = RefCell::new(Vec::new());
    let mut poller = Poller::builder()
        .handle_monitor(&monitor, |event| {
            if event.is_failure() {
                failures.borrow_mut().push(event.clone());
            }
        })
        .build()
        .unwrap();
    second.close();
    poller.drain_monitors_until_stopped().unwrap();
    drop(poller);

    let failures = failures.into_inner();
    assert!(!failures.is_empty(), "no failure event delivered");
    for event in failures {
        assert_eq!(event.kind, MonitorEventKind::BindFailed);
        assert_eq!(event.error.as_ref().and_then(ZmqError::code), Some(event.value));
    }
}

#[test]
fn test_monitor_on_closed_socket_fails() {
    let ctx = Context::new().unwrap();
    let socket = ctx.socket(SocketType::Pair).unwrap();
    socket.close();
    assert_eq!(socket.monitor(EventMask::ALL).unwrap_err(), ZmqError::Closed);
}

#[test]
fn test_decode_without_pending_event() {
    let ctx = Context::new().unwrap();
    let socket = ctx.socket(SocketType::Pair).unwrap();
    let monitor = socket.monitor(EventMask::from(MonitorEventKind::Connected)).unwrap();

    assert_eq!(monitor.decode_next().unwrap(), None);
    assert!(!monitor.is_stopped());

    monitor.close();
    assert_eq!(monitor.decode_next(), Err(ZmqError::Closed));
}
