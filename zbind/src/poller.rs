//! Readiness poller over sockets and monitor channels.
//!
//! ```rust,no_run
//! use zbind::{Context, EventMask, Poller, SocketType};
//!
//! # fn example() -> zbind::Result<()> {
//! let ctx = Context::new()?;
//! let pull = ctx.socket(SocketType::Pull)?;
//! pull.bind("tcp://127.0.0.1:5555")?;
//! let monitor = pull.monitor(EventMask::ALL)?;
//!
//! let mut buffer = Vec::new();
//! let mut poller = Poller::builder()
//!     .handle_socket(&pull, |s| {
//!         let _ = s.receive(&mut buffer, true);
//!     })
//!     .handle_monitor(&monitor, |event| println!("{event}"))
//!     .build()?;
//!
//! poller.poll(1000)?;
//! # Ok(())
//! # }
//! ```

use crate::monitor::MonitorChannel;
use crate::native::LibZmq;
use crate::socket::Socket;
use smallvec::SmallVec;
use std::ffi::c_long;
use std::fmt;
use tracing::{debug, trace, warn};
use zbind_core::error::{Result, ZmqError};
use zbind_core::monitor::MonitorEvent;
use zbind_core::policy::{retry_if_interrupted, Outcome};
use zbind_core::poll::{check_timeout, sweep, PollEvents, PollTarget, DRAIN_INTERVAL_MS};

type SocketHandler<'a> = Box<dyn FnMut(&Socket) + 'a>;
type EventHandler<'a> = Box<dyn FnMut(&MonitorEvent) + 'a>;
type PollItems = SmallVec<[zmq_sys::zmq_pollitem_t; 8]>;

struct SocketEntry<'a> {
    socket: &'a Socket,
    on_readable: Option<SocketHandler<'a>>,
    on_writable: Option<SocketHandler<'a>>,
}

impl PollTarget for SocketEntry<'_> {
    fn interest(&self) -> PollEvents {
        PollEvents::interest(self.on_readable.is_some(), self.on_writable.is_some())
    }

    fn on_ready(&mut self, ready: PollEvents) -> Result<()> {
        if ready.is_readable() {
            if let Some(handler) = self.on_readable.as_mut() {
                handler(self.socket);
            }
        }
        if ready.is_writable() {
            if let Some(handler) = self.on_writable.as_mut() {
                handler(self.socket);
            }
        }
        Ok(())
    }
}

struct MonitorEntry<'a> {
    monitor: &'a MonitorChannel,
    on_event: EventHandler<'a>,
}

impl PollTarget for MonitorEntry<'_> {
    fn interest(&self) -> PollEvents {
        PollEvents::READABLE
    }

    fn on_ready(&mut self, _ready: PollEvents) -> Result<()> {
        if let Some(event) = self.monitor.decode_next()? {
            trace!("[POLLER] Monitor event {event}");
            (self.on_event)(&event);
        }
        Ok(())
    }
}

/// Collects registrations for a [`Poller`].
///
/// [`build`](Self::build) consumes the builder, so one builder yields at most
/// one poller.
#[derive(Default)]
pub struct PollerBuilder<'a> {
    sockets: Vec<SocketEntry<'a>>,
    monitors: Vec<MonitorEntry<'a>>,
}

impl<'a> PollerBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `on_readable` whenever `socket` has a frame to receive.
    pub fn handle_socket(self, socket: &'a Socket, on_readable: impl FnMut(&Socket) + 'a) -> Self {
        self.push_socket(socket, Some(Box::new(on_readable)), None)
    }

    /// Like [`handle_socket`](Self::handle_socket), also calling
    /// `on_writable` whenever a frame can be sent without blocking.
    pub fn handle_socket_with_send(
        self,
        socket: &'a Socket,
        on_readable: impl FnMut(&Socket) + 'a,
        on_writable: impl FnMut(&Socket) + 'a,
    ) -> Self {
        self.push_socket(socket, Some(Box::new(on_readable)), Some(Box::new(on_writable)))
    }

    /// Call `on_writable` only; the socket is never polled for input.
    pub fn handle_writable(self, socket: &'a Socket, on_writable: impl FnMut(&Socket) + 'a) -> Self {
        self.push_socket(socket, None, Some(Box::new(on_writable)))
    }

    /// Register several sockets sharing one receive handler.
    pub fn handle_sockets<F>(mut self, sockets: &[&'a Socket], on_readable: F) -> Self
    where
        F: FnMut(&Socket) + Clone + 'a,
    {
        for &socket in sockets {
            self = self.handle_socket(socket, on_readable.clone());
        }
        self
    }

    /// Call `on_event` for every event decoded from `monitor`.
    pub fn handle_monitor(mut self, monitor: &'a MonitorChannel, on_event: impl FnMut(&MonitorEvent) + 'a) -> Self {
        self.monitors.push(MonitorEntry {
            monitor,
            on_event: Box::new(on_event),
        });
        self
    }

    fn push_socket(
        mut self,
        socket: &'a Socket,
        on_readable: Option<SocketHandler<'a>>,
        on_writable: Option<SocketHandler<'a>>,
    ) -> Self {
        self.sockets.push(SocketEntry {
            socket,
            on_readable,
            on_writable,
        });
        self
    }

    /// Freeze the registrations into a poller.
    pub fn build(self) -> Result<Poller<'a>> {
        if self.sockets.is_empty() && self.monitors.is_empty() {
            return Err(ZmqError::invalid_operation(
                "poller needs at least one socket or monitor to poll",
            ));
        }
        debug!(
            "[POLLER] Built with {} sockets and {} monitors",
            self.sockets.len(),
            self.monitors.len()
        );
        Ok(Poller {
            sockets: self.sockets,
            monitors: self.monitors,
            items: PollItems::new(),
            revents: SmallVec::new(),
        })
    }
}

/// Waits on a fixed set of sockets and monitor channels and dispatches
/// readiness to their handlers.
///
/// Sockets are dispatched in registration order, each one's receive handler
/// before its send handler, then monitors in registration order.
pub struct Poller<'a> {
    sockets: Vec<SocketEntry<'a>>,
    monitors: Vec<MonitorEntry<'a>>,
    items: PollItems,
    revents: SmallVec<[PollEvents; 8]>,
}

impl fmt::Debug for Poller<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller")
            .field("sockets", &self.sockets.len())
            .field("monitors", &self.monitors.len())
            .finish()
    }
}

fn pollitem(socket: &Socket, events: PollEvents) -> Result<zmq_sys::zmq_pollitem_t> {
    Ok(zmq_sys::zmq_pollitem_t {
        socket: socket.raw()?,
        fd: 0,
        events: events.bits(),
        revents: 0,
    })
}

/// One interrupt-safe wait. `None` means the context is shutting down.
fn wait(items: &mut PollItems, timeout_ms: i64) -> Result<Option<usize>> {
    let len = i32::try_from(items.len())
        .map_err(|_| ZmqError::invalid_operation("too many poll registrations"))?;
    let timeout = c_long::try_from(timeout_ms).unwrap_or(c_long::MAX);
    let rc = retry_if_interrupted(&LibZmq, || unsafe { zmq_sys::zmq_poll(items.as_mut_ptr(), len, timeout) });
    match Outcome::classify(rc, &LibZmq) {
        Outcome::Success(ready) => Ok(Some(ready as usize)),
        Outcome::WouldBlock => Ok(Some(0)),
        Outcome::ContextTerminated => Ok(None),
        Outcome::Fatal { code, description } => Err(ZmqError::Native { code, description }),
    }
}

impl<'a> Poller<'a> {
    pub fn builder() -> PollerBuilder<'a> {
        PollerBuilder::new()
    }

    /// Wait up to `timeout_ms` milliseconds and dispatch whatever became
    /// ready. `0` returns immediately.
    ///
    /// Returns whether anything was ready. Fails with `Closed` if a
    /// registered socket or monitor has been closed.
    pub fn poll(&mut self, timeout_ms: i64) -> Result<bool> {
        let timeout = check_timeout(timeout_ms)?;

        self.items.clear();
        for entry in &self.sockets {
            self.items.push(pollitem(entry.socket, entry.interest())?);
        }
        for entry in &self.monitors {
            self.items.push(pollitem(entry.monitor.socket(), entry.interest())?);
        }

        let Some(ready) = wait(&mut self.items, timeout)? else {
            trace!("[POLLER] Context terminated while polling");
            return Ok(false);
        };
        if ready == 0 {
            return Ok(false);
        }

        self.collect_revents();
        let (socket_ready, monitor_ready) = self.revents.split_at(self.sockets.len());
        sweep(&mut self.sockets, socket_ready)?;
        sweep(&mut self.monitors, monitor_ready)?;
        Ok(true)
    }

    /// Wait on the monitor channels alone until every one of them has
    /// delivered its terminal event.
    ///
    /// Close the monitored sockets first; the engine only ends a monitor's
    /// stream once its socket is gone. Returns early if the context shuts
    /// down, since no further events can arrive.
    pub fn drain_monitors_until_stopped(&mut self) -> Result<()> {
        while !self.monitors.iter().all(|entry| entry.monitor.is_stopped()) {
            self.items.clear();
            for entry in &self.monitors {
                self.items.push(pollitem(entry.monitor.socket(), entry.interest())?);
            }

            match wait(&mut self.items, DRAIN_INTERVAL_MS)? {
                None => {
                    warn!("[POLLER] Context terminated before all monitors stopped");
                    return Ok(());
                }
                Some(0) => continue,
                Some(_) => {
                    self.collect_revents();
                    sweep(&mut self.monitors, &self.revents)?;
                }
            }
        }
        debug!("[POLLER] All monitors stopped");
        Ok(())
    }

    fn collect_revents(&mut self) {
        self.revents.clear();
        self.revents
            .extend(self.items.iter().map(|item| PollEvents::from_bits(item.revents)));
    }
}
