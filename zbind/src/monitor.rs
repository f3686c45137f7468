//! Socket monitoring channel.
//!
//! libzmq publishes a monitored socket's events on a private `inproc://`
//! endpoint. [`MonitorChannel`] connects a PAIR socket to that endpoint and
//! decodes what arrives on it.
//!
//! The engine always ends the stream with a `MonitorStopped` event once the
//! monitored socket is closed. Callers should keep decoding until
//! [`MonitorChannel::is_stopped`] turns true (see
//! [`Poller::drain_monitors_until_stopped`](crate::Poller::drain_monitors_until_stopped))
//! before dropping the channel.

use crate::native::LibZmq;
use crate::socket::Socket;
use std::cell::RefCell;
use std::ffi::CString;
use std::fmt;
use tracing::debug;
use zbind_core::error::{Result, ZmqError};
use zbind_core::monitor::{EventMask, FrameSource, MonitorDecoder, MonitorEvent};
use zbind_core::policy::check;
use zbind_core::socket_type::SocketType;

impl FrameSource for Socket {
    // frames of one message arrive together, so none of them needs to block
    fn recv_frame(&self, buffer: &mut Vec<u8>) -> Result<Option<usize>> {
        self.receive(buffer, true)
    }

    fn has_more(&self) -> Result<bool> {
        self.has_more_to_receive()
    }
}

/// Event stream of one monitored socket.
pub struct MonitorChannel {
    pair: Socket,
    endpoint: String,
    decoder: RefCell<MonitorDecoder>,
}

impl MonitorChannel {
    pub(crate) fn new(target: &Socket, mask: EventMask) -> Result<Self> {
        let handle = target.raw()?;
        let endpoint = format!("inproc://{:032x}", rand::random::<u128>());
        let addr = CString::new(endpoint.as_str())
            .map_err(|_| ZmqError::invalid_argument("monitor endpoint contains a NUL byte"))?;
        let rc = unsafe { zmq_sys::zmq_socket_monitor(handle, addr.as_ptr(), i32::from(mask.bits())) };
        check(&LibZmq, rc)?;

        let pair = target.context().socket(SocketType::Pair)?;
        pair.connect(&endpoint)?;
        debug!("[MONITOR] Monitoring {} socket on {endpoint}", target.kind());
        Ok(Self {
            pair,
            endpoint,
            decoder: RefCell::new(MonitorDecoder::new()),
        })
    }

    /// The private endpoint the events arrive on.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True once `MonitorStopped` has been decoded. Never reverts.
    pub fn is_stopped(&self) -> bool {
        self.decoder.borrow().is_stopped()
    }

    /// Decode the next pending event, if any.
    ///
    /// Returns `None` when no event is pending or a malformed message was
    /// skipped.
    pub fn decode_next(&self) -> Result<Option<MonitorEvent>> {
        self.decoder.borrow_mut().decode_next(&self.pair, &LibZmq)
    }

    pub(crate) fn socket(&self) -> &Socket {
        &self.pair
    }

    /// Close the receiving side. Idempotent.
    pub fn close(&self) {
        self.pair.close();
    }
}

impl fmt::Debug for MonitorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorChannel")
            .field("endpoint", &self.endpoint)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
