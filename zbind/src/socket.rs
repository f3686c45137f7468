//! Engine sockets.
//!
//! A [`Socket`] exclusively owns one native socket handle. All methods take
//! `&self` so a socket can be closed while a [`Poller`](crate::Poller) still
//! borrows it; every operation on a closed socket fails with
//! [`ZmqError::Closed`].
//!
//! # Safety
//!
//! The native handle is only dereferenced by libzmq. It is read out of a
//! `Cell`, which keeps `Socket` `!Sync`: libzmq sockets must not be used from
//! two threads at once, but may move between threads.

use crate::context::Context;
use crate::monitor::MonitorChannel;
use crate::native::{LibZmq, ScratchMessage, ZMQ_DONTWAIT, ZMQ_SNDMORE};
use bytes::Bytes;
use std::cell::Cell;
use std::ffi::{c_void, CString};
use std::fmt;
use std::ptr;
use tracing::{debug, trace};
use zbind_core::codec::{self, RawOptions};
use zbind_core::error::{Result, ZmqError};
use zbind_core::monitor::EventMask;
use zbind_core::option::{self, OptionDescriptor};
use zbind_core::options::SocketOptions;
use zbind_core::policy::{
    resolve, resolve_expecting_retry, retry_if_interrupted, ErrorSource, Outcome, ERROR_RETURN, ETERM,
};
use zbind_core::socket_type::{SecurityMechanism, SocketType};

/// A libzmq socket.
pub struct Socket {
    handle: Cell<*mut c_void>,
    kind: SocketType,
    context: Context,
}

// SAFETY: the handle is owned exclusively and libzmq allows a socket to
// migrate between threads
unsafe impl Send for Socket {}

macro_rules! int_option {
    ($(#[$doc:meta])* $get:ident, $set:ident, $descriptor:expr) => {
        $(#[$doc])*
        pub fn $get(&self) -> Result<i32> {
            self.with_open(|s| codec::get_i32(s, &$descriptor))
        }

        $(#[$doc])*
        pub fn $set(&self, value: i32) -> Result<()> {
            self.with_open(|s| codec::set_i32(s, &$descriptor, value))
        }
    };
}

macro_rules! bool_option {
    ($(#[$doc:meta])* $get:ident, $set:ident, $descriptor:expr) => {
        $(#[$doc])*
        pub fn $get(&self) -> Result<bool> {
            self.with_open(|s| codec::get_bool(s, &$descriptor))
        }

        $(#[$doc])*
        pub fn $set(&self, value: bool) -> Result<()> {
            self.with_open(|s| codec::set_bool(s, &$descriptor, value))
        }
    };
}

macro_rules! text_option {
    ($(#[$doc:meta])* $get:ident, $set:ident, $descriptor:expr) => {
        $(#[$doc])*
        pub fn $get(&self) -> Result<String> {
            self.with_open(|s| codec::get_str(s, &$descriptor))
        }

        /// `None` passes a null value; the engine decides what that resets.
        pub fn $set(&self, value: Option<&str>) -> Result<()> {
            self.with_open(|s| codec::set_str(s, &$descriptor, value))
        }
    };
}

macro_rules! key_option {
    ($(#[$doc:meta])* $get:ident, $set:ident, $descriptor:expr) => {
        $(#[$doc])*
        pub fn $get(&self) -> Result<Vec<u8>> {
            self.with_open(|s| codec::get_bytes(s, &$descriptor))
        }

        $(#[$doc])*
        pub fn $set(&self, value: &[u8]) -> Result<()> {
            self.with_open(|s| codec::set_bytes(s, &$descriptor, value))
        }
    };
}

impl Socket {
    pub(crate) fn new(context: &Context, kind: SocketType) -> Result<Self> {
        let handle = unsafe { zmq_sys::zmq_socket(context.as_ptr(), kind.as_raw()) };
        if handle.is_null() {
            let code = LibZmq.last_error();
            return Err(ZmqError::native(code, LibZmq.describe(code)));
        }
        debug!("[SOCKET] Created {kind} socket");
        Ok(Self {
            handle: Cell::new(handle),
            kind,
            context: context.clone(),
        })
    }

    /// The kind this socket was created with.
    pub fn kind(&self) -> SocketType {
        self.kind
    }

    pub fn is_closed(&self) -> bool {
        self.handle.get().is_null()
    }

    pub(crate) fn raw(&self) -> Result<*mut c_void> {
        let handle = self.handle.get();
        if handle.is_null() {
            Err(ZmqError::Closed)
        } else {
            Ok(handle)
        }
    }

    fn with_open<T>(&self, op: impl FnOnce(&Self) -> Result<T>) -> Result<T> {
        self.raw()?;
        op(self)
    }

    fn endpoint(endpoint: &str) -> Result<CString> {
        if endpoint.trim().is_empty() {
            return Err(ZmqError::invalid_argument("endpoint cannot be empty"));
        }
        CString::new(endpoint).map_err(|_| ZmqError::invalid_argument("endpoint contains a NUL byte"))
    }

    /// Bind to a local endpoint such as `tcp://127.0.0.1:5555`.
    ///
    /// A no-op if the context is shutting down.
    pub fn bind(&self, endpoint: &str) -> Result<()> {
        let addr = Self::endpoint(endpoint)?;
        let handle = self.raw()?;
        let rc = unsafe { zmq_sys::zmq_bind(handle, addr.as_ptr()) };
        resolve(&LibZmq, rc)?;
        debug!("[SOCKET] {} bound to {endpoint}", self.kind);
        Ok(())
    }

    /// Connect to a remote endpoint.
    ///
    /// A no-op if the context is shutting down.
    pub fn connect(&self, endpoint: &str) -> Result<()> {
        let addr = Self::endpoint(endpoint)?;
        let handle = self.raw()?;
        let rc = unsafe { zmq_sys::zmq_connect(handle, addr.as_ptr()) };
        resolve(&LibZmq, rc)?;
        debug!("[SOCKET] {} connected to {endpoint}", self.kind);
        Ok(())
    }

    /// Send one frame.
    ///
    /// Returns `false` if `do_not_wait` is set and the frame could not be
    /// queued right away. During context shutdown nothing is sent and the
    /// call still returns `true`.
    pub fn send(&self, buffer: &[u8], has_more: bool, do_not_wait: bool) -> Result<bool> {
        let handle = self.raw()?;
        let mut flags = 0;
        if has_more {
            flags |= ZMQ_SNDMORE;
        }
        if do_not_wait {
            flags |= ZMQ_DONTWAIT;
        }
        let rc = retry_if_interrupted(&LibZmq, || unsafe {
            zmq_sys::zmq_send(handle, buffer.as_ptr().cast(), buffer.len(), flags)
        });
        let sent = resolve_expecting_retry(&LibZmq, rc)?.is_some();
        trace!("[SOCKET] send {} bytes (more={has_more}, sent={sent})", buffer.len());
        Ok(sent)
    }

    /// Receive one frame into `buffer`, returning its length.
    ///
    /// `buffer` is only reallocated when it is smaller than the frame and is
    /// never shrunk; bytes past the returned length are left untouched.
    /// Returns `None` when nothing was received: no frame was ready and
    /// `do_not_wait` was set, or the context is shutting down.
    pub fn receive(&self, buffer: &mut Vec<u8>, do_not_wait: bool) -> Result<Option<usize>> {
        let handle = self.raw()?;
        let flags = if do_not_wait { ZMQ_DONTWAIT } else { 0 };
        let mut msg = ScratchMessage::new();
        let rc = retry_if_interrupted(&LibZmq, || msg.recv(handle, flags));
        match Outcome::classify(rc, &LibZmq) {
            Outcome::Success(_) => {
                let frame = msg.bytes();
                let len = frame.len();
                if buffer.len() < len {
                    *buffer = vec![0; len];
                }
                buffer[..len].copy_from_slice(frame);
                trace!("[SOCKET] received {len} bytes");
                Ok(Some(len))
            }
            Outcome::WouldBlock | Outcome::ContextTerminated => Ok(None),
            Outcome::Fatal { code, description } => Err(ZmqError::Native { code, description }),
        }
    }

    /// Receive one frame as an owned buffer.
    pub fn receive_bytes(&self, do_not_wait: bool) -> Result<Option<Bytes>> {
        let mut buffer = Vec::new();
        Ok(self
            .receive(&mut buffer, do_not_wait)?
            .map(|len| Bytes::from(buffer).slice(..len)))
    }

    /// Whether the last received frame has more frames following it.
    pub fn has_more_to_receive(&self) -> Result<bool> {
        self.with_open(|s| codec::get_bool(s, &option::RCVMORE))
    }

    /// Start monitoring this socket's lifecycle events.
    pub fn monitor(&self, mask: EventMask) -> Result<MonitorChannel> {
        MonitorChannel::new(self, mask)
    }

    /// Apply every option set in `options`.
    pub fn apply_options(&self, options: &SocketOptions) -> Result<()> {
        self.with_open(|s| options.apply(s))
    }

    /// Subscribe to messages starting with `prefix` (SUB sockets).
    pub fn subscribe(&self, prefix: &[u8]) -> Result<()> {
        self.with_open(|s| codec::set_bytes(s, &option::SUBSCRIBE, prefix))
    }

    /// Subscribe to every message.
    pub fn subscribe_all(&self) -> Result<()> {
        self.subscribe(&[])
    }

    pub fn unsubscribe(&self, prefix: &[u8]) -> Result<()> {
        self.with_open(|s| codec::set_bytes(s, &option::UNSUBSCRIBE, prefix))
    }

    pub fn unsubscribe_all(&self) -> Result<()> {
        self.unsubscribe(&[])
    }

    /// The kind as reported by the engine.
    pub fn socket_type(&self) -> Result<SocketType> {
        let raw = self.with_open(|s| codec::get_i32(s, &option::TYPE))?;
        SocketType::from_raw(raw)
            .ok_or_else(|| ZmqError::invalid_operation(format!("engine reported unknown socket type {raw}")))
    }

    pub fn mechanism(&self) -> Result<SecurityMechanism> {
        self.with_open(|s| codec::get_i32(s, &option::MECHANISM))
            .map(SecurityMechanism::from_raw)
    }

    /// Endpoint of the last bind or connect, with wildcards resolved.
    pub fn last_endpoint(&self) -> Result<String> {
        self.with_open(|s| codec::get_str(s, &option::LAST_ENDPOINT))
    }

    int_option!(
        /// Outbound high water mark, in messages.
        send_hwm, set_send_hwm, option::SNDHWM
    );
    int_option!(
        /// Inbound high water mark, in messages.
        receive_hwm, set_receive_hwm, option::RCVHWM
    );
    int_option!(rate, set_rate, option::RATE);
    int_option!(recovery_ivl, set_recovery_ivl, option::RECOVERY_IVL);
    int_option!(send_buffer, set_send_buffer, option::SNDBUF);
    int_option!(receive_buffer, set_receive_buffer, option::RCVBUF);
    int_option!(
        /// Milliseconds to keep unsent messages after close; -1 waits forever.
        linger, set_linger, option::LINGER
    );
    int_option!(reconnect_ivl, set_reconnect_ivl, option::RECONNECT_IVL);
    int_option!(reconnect_ivl_max, set_reconnect_ivl_max, option::RECONNECT_IVL_MAX);
    int_option!(backlog, set_backlog, option::BACKLOG);
    int_option!(multicast_hops, set_multicast_hops, option::MULTICAST_HOPS);
    int_option!(
        /// Receive timeout in milliseconds; -1 blocks forever.
        receive_timeout, set_receive_timeout, option::RCVTIMEO
    );
    int_option!(
        /// Send timeout in milliseconds; -1 blocks forever.
        send_timeout, set_send_timeout, option::SNDTIMEO
    );
    int_option!(tcp_keepalive, set_tcp_keepalive, option::TCP_KEEPALIVE);
    int_option!(tcp_keepalive_cnt, set_tcp_keepalive_cnt, option::TCP_KEEPALIVE_CNT);
    int_option!(tcp_keepalive_idle, set_tcp_keepalive_idle, option::TCP_KEEPALIVE_IDLE);
    int_option!(tcp_keepalive_intvl, set_tcp_keepalive_intvl, option::TCP_KEEPALIVE_INTVL);

    bool_option!(immediate, set_immediate, option::IMMEDIATE);
    bool_option!(ipv6, set_ipv6, option::IPV6);
    bool_option!(plain_server, set_plain_server, option::PLAIN_SERVER);
    bool_option!(curve_server, set_curve_server, option::CURVE_SERVER);

    text_option!(plain_username, set_plain_username, option::PLAIN_USERNAME);
    text_option!(plain_password, set_plain_password, option::PLAIN_PASSWORD);
    text_option!(zap_domain, set_zap_domain, option::ZAP_DOMAIN);
    text_option!(curve_public_key_z85, set_curve_public_key_z85, option::CURVE_PUBLICKEY_Z85);
    text_option!(curve_secret_key_z85, set_curve_secret_key_z85, option::CURVE_SECRETKEY_Z85);
    text_option!(curve_server_key_z85, set_curve_server_key_z85, option::CURVE_SERVERKEY_Z85);

    key_option!(
        /// Routing identity, at most 255 bytes.
        identity, set_identity, option::IDENTITY
    );
    key_option!(
        /// 32-byte binary CURVE key.
        curve_public_key, set_curve_public_key, option::CURVE_PUBLICKEY
    );
    key_option!(
        /// 32-byte binary CURVE key.
        curve_secret_key, set_curve_secret_key, option::CURVE_SECRETKEY
    );
    key_option!(
        /// 32-byte binary CURVE key.
        curve_server_key, set_curve_server_key, option::CURVE_SERVERKEY
    );

    pub fn affinity(&self) -> Result<u64> {
        self.with_open(|s| codec::get_u64(s, &option::AFFINITY))
    }

    pub fn set_affinity(&self, value: u64) -> Result<()> {
        self.with_open(|s| codec::set_u64(s, &option::AFFINITY, value))
    }

    /// Largest inbound message in bytes; -1 means unlimited.
    pub fn max_msg_size(&self) -> Result<i64> {
        self.with_open(|s| codec::get_i64(s, &option::MAXMSGSIZE))
    }

    pub fn set_max_msg_size(&self, value: i64) -> Result<()> {
        self.with_open(|s| codec::set_i64(s, &option::MAXMSGSIZE, value))
    }

    pub fn set_router_mandatory(&self, value: bool) -> Result<()> {
        self.with_open(|s| codec::set_bool(s, &option::ROUTER_MANDATORY, value))
    }

    pub fn set_probe_router(&self, value: bool) -> Result<()> {
        self.with_open(|s| codec::set_bool(s, &option::PROBE_ROUTER, value))
    }

    pub fn set_req_correlate(&self, value: bool) -> Result<()> {
        self.with_open(|s| codec::set_bool(s, &option::REQ_CORRELATE, value))
    }

    pub fn set_req_relaxed(&self, value: bool) -> Result<()> {
        self.with_open(|s| codec::set_bool(s, &option::REQ_RELAXED, value))
    }

    pub fn set_conflate(&self, value: bool) -> Result<()> {
        self.with_open(|s| codec::set_bool(s, &option::CONFLATE, value))
    }

    /// Read any integer option from the descriptor table.
    pub fn get_option_i32(&self, descriptor: &OptionDescriptor) -> Result<i32> {
        self.with_open(|s| codec::get_i32(s, descriptor))
    }

    /// Write any integer option from the descriptor table.
    pub fn set_option_i32(&self, descriptor: &OptionDescriptor, value: i32) -> Result<()> {
        self.with_open(|s| codec::set_i32(s, descriptor, value))
    }

    /// Close the socket. Safe to call more than once; never fails.
    ///
    /// Failures other than context shutdown are reported to the context's
    /// error log.
    pub fn close(&self) {
        let handle = self.handle.replace(ptr::null_mut());
        if handle.is_null() {
            return;
        }
        let rc = unsafe { zmq_sys::zmq_close(handle) };
        if rc == ERROR_RETURN {
            let code = LibZmq.last_error();
            if code != ETERM {
                (self.context.error_log())(&format!(
                    "Error closing {} socket: {}",
                    self.kind,
                    ZmqError::native(code, LibZmq.describe(code))
                ));
                return;
            }
        }
        trace!("[SOCKET] {} closed", self.kind);
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("kind", &self.kind)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl ErrorSource for Socket {
    fn last_error(&self) -> i32 {
        LibZmq.last_error()
    }

    fn describe(&self, code: i32) -> String {
        LibZmq.describe(code)
    }
}

impl RawOptions for Socket {
    fn set_option_raw(&self, code: i32, value: Option<&[u8]>) -> i32 {
        let (data, len) = match value {
            Some(bytes) => (bytes.as_ptr().cast::<c_void>(), bytes.len()),
            None => (ptr::null(), 0),
        };
        unsafe { zmq_sys::zmq_setsockopt(self.handle.get(), code, data, len) }
    }

    fn get_option_raw(&self, code: i32, value: &mut [u8], size: &mut usize) -> i32 {
        unsafe { zmq_sys::zmq_getsockopt(self.handle.get(), code, value.as_mut_ptr().cast(), size) }
    }
}
