//! Context integration tests against libzmq.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use zbind::{Context, ContextOptions, SocketType};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_context_is_shareable() {
    assert_send_sync::<Context>();
    let ctx = Context::new().unwrap();
    let clone = ctx.clone();
    let handle = thread::spawn(move || clone.socket(SocketType::Pair).map(|s| s.kind()));
    assert_eq!(handle.join().unwrap().unwrap(), SocketType::Pair);
}

#[test]
fn test_default_and_custom_options() {
    let ctx = Context::new().unwrap();
    assert_eq!(ctx.io_threads().unwrap(), 1);
    assert_eq!(ctx.max_sockets().unwrap(), 1023);
    assert!(!ctx.ipv6().unwrap());

    let ctx = Context::with_options(ContextOptions::new().with_io_threads(2).with_max_sockets(64).with_ipv6(true))
        .unwrap();
    assert_eq!(ctx.io_threads().unwrap(), 2);
    assert_eq!(ctx.max_sockets().unwrap(), 64);
    assert!(ctx.ipv6().unwrap());

    let socket = ctx.socket(SocketType::Dealer).unwrap();
    assert!(socket.ipv6().unwrap());

    ctx.set_ipv6(false).unwrap();
    assert!(!ctx.ipv6().unwrap());
}

#[test]
fn test_shutdown_unblocks_receive() {
    let ctx = Context::new().unwrap();
    let pull = ctx.socket(SocketType::Pull).unwrap();
    pull.bind("inproc://shutdown").unwrap();

    let waiter = thread::spawn(move || {
        let mut buffer = Vec::new();
        let result = pull.receive(&mut buffer, false);
        drop(pull);
        result
    });

    thread::sleep(Duration::from_millis(100));
    ctx.shutdown().unwrap();
    assert_eq!(waiter.join().unwrap(), Ok(None));
}

#[test]
fn test_operations_after_shutdown_are_no_ops() {
    let ctx = Context::new().unwrap();
    let push = ctx.socket(SocketType::Push).unwrap();
    ctx.shutdown().unwrap();

    push.connect("tcp://127.0.0.1:1").unwrap();
    assert!(push.send(b"dropped", false, false).unwrap());
    assert_eq!(push.receive(&mut Vec::new(), false), Ok(None));
    push.close();
    assert!(ctx.socket(SocketType::Pair).is_err());
}

#[test]
fn test_custom_error_log_is_used_by_context() {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = Arc::clone(&seen);
    let options = ContextOptions::new().with_error_log(Arc::new(move |message: &str| {
        sink.lock().unwrap().push(message.to_string());
    }));

    let ctx = Context::with_options(options).unwrap();
    let socket = ctx.socket(SocketType::Pair).unwrap();
    socket.close();
    drop(ctx);

    // clean teardown reports nothing
    assert!(seen.lock().unwrap().is_empty());
}
