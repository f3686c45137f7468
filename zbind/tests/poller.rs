//! Poller integration tests against libzmq.

use std::cell::RefCell;
use zbind::{Context, Poller, Socket, SocketType, ZmqError};

/// Wait until `socket` is readable without consuming anything.
///
/// Readiness is level-triggered, so a no-op handler leaves the frame queued.
fn wait_readable(socket: &Socket) -> bool {
    let mut poller = Poller::builder().handle_socket(socket, |_| {}).build().unwrap();
    poller.poll(5000).unwrap()
}

/// A PULL socket with one frame waiting, plus the PUSH that sent it.
fn loaded_pull(ctx: &Context, name: &str) -> (Socket, Socket) {
    let endpoint = format!("inproc://{name}");
    let pull = ctx.socket(SocketType::Pull).unwrap();
    pull.bind(&endpoint).unwrap();
    let push = ctx.socket(SocketType::Push).unwrap();
    push.set_linger(0).unwrap();
    push.connect(&endpoint).unwrap();
    assert!(push.send(name.as_bytes(), false, false).unwrap());

    assert!(wait_readable(&pull), "{name} never became readable");
    (pull, push)
}

#[test]
fn test_build_without_registrations_fails() {
    let err = Poller::builder().build().unwrap_err();
    assert!(matches!(err, ZmqError::InvalidOperation(_)), "{err}");
}

#[test]
fn test_negative_timeout_rejected() {
    let ctx = Context::new().unwrap();
    let pull = ctx.socket(SocketType::Pull).unwrap();
    let mut poller = Poller::builder().handle_socket(&pull, |_| {}).build().unwrap();

    let err = poller.poll(-1).unwrap_err();
    assert!(matches!(err, ZmqError::InvalidArgument(_)), "{err}");
}

#[test]
fn test_idle_poll_returns_false() {
    let ctx = Context::new().unwrap();
    let pull = ctx.socket(SocketType::Pull).unwrap();
    pull.bind("inproc://idle").unwrap();
    let calls = RefCell::new(0);
    let mut poller = Poller::builder()
        .handle_socket(&pull, |_| *calls.borrow_mut() += 1)
        .build()
        .unwrap();

    assert!(!poller.poll(0).unwrap());
    assert!(!poller.poll(20).unwrap());
    drop(poller);
    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_dispatch_follows_registration_order() {
    zbind::dev_tracing::init_tracing();
    let ctx = Context::new().unwrap();
    let (a, _push_a) = loaded_pull(&ctx, "order-a");
    let (b, _push_b) = loaded_pull(&ctx, "order-b");

    for (first, second, expected) in [(&a, &b, ["A", "B"]), (&b, &a, ["B", "A"])] {
        let order = RefCell::new(Vec::new());
        let label = |s: &Socket| if std::ptr::eq(s, &a) { "A" } else { "B" };
        let mut poller = Poller::builder()
            .handle_socket(first, |s| order.borrow_mut().push(label(s)))
            .handle_socket(second, |s| order.borrow_mut().push(label(s)))
            .build()
            .unwrap();

        assert!(poller.poll(0).unwrap());
        drop(poller);
        assert_eq!(*order.borrow(), expected);
    }
}

#[test]
fn test_readable_before_writable_and_shared_handlers() {
    let ctx = Context::new().unwrap();
    let (a, _push_a) = loaded_pull(&ctx, "shared-a");
    let (b, _push_b) = loaded_pull(&ctx, "shared-b");

    let received = RefCell::new(Vec::new());
    let mut poller = Poller::builder()
        .handle_sockets(&[&a, &b], |s: &Socket| {
            let frame = s.receive_bytes(true).unwrap().expect("queued frame");
            received.borrow_mut().push(frame);
        })
        .build()
        .unwrap();
    assert!(poller.poll(0).unwrap());
    drop(poller);
    assert_eq!(*received.borrow(), ["shared-a", "shared-b"]);

    let pair_a = ctx.socket(SocketType::Pair).unwrap();
    pair_a.set_linger(0).unwrap();
    pair_a.bind("inproc://pair-dir").unwrap();
    let pair_b = ctx.socket(SocketType::Pair).unwrap();
    pair_b.set_linger(0).unwrap();
    pair_b.connect("inproc://pair-dir").unwrap();
    pair_b.send(b"ping", false, false).unwrap();
    assert!(wait_readable(&pair_a));

    let log = RefCell::new(Vec::new());
    let mut poller = Poller::builder()
        .handle_socket_with_send(
            &pair_a,
            |s| {
                s.receive_bytes(true).unwrap();
                log.borrow_mut().push("in");
            },
            |_| log.borrow_mut().push("out"),
        )
        .build()
        .unwrap();
    assert!(poller.poll(0).unwrap());
    drop(poller);
    assert_eq!(*log.borrow(), ["in", "out"]);
}

#[test]
fn test_writable_only_registration() {
    let ctx = Context::new().unwrap();
    let pull = ctx.socket(SocketType::Pull).unwrap();
    pull.bind("inproc://writable").unwrap();
    let push = ctx.socket(SocketType::Push).unwrap();
    push.set_linger(0).unwrap();
    push.connect("inproc://writable").unwrap();

    let writable = RefCell::new(false);
    let mut poller = Poller::builder()
        .handle_writable(&push, |s| {
            *writable.borrow_mut() = s.send(b"go", false, true).unwrap();
        })
        .build()
        .unwrap();
    assert!(poller.poll(1000).unwrap());
    drop(poller);
    assert!(*writable.borrow());
}

#[test]
fn test_poll_after_close_reports_closed() {
    let ctx = Context::new().unwrap();
    let pull = ctx.socket(SocketType::Pull).unwrap();
    let mut poller = Poller::builder().handle_socket(&pull, |_| {}).build().unwrap();

    pull.close();
    assert_eq!(poller.poll(0), Err(ZmqError::Closed));
}
