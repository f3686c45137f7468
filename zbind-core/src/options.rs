//! Declarative socket and context configuration.
//!
//! [`SocketOptions`] collects the options a caller wants on a socket and
//! pushes them through the option codec in one go. Unset fields leave the
//! engine default in place.

use crate::codec::{self, RawOptions};
use crate::error::{Result, ZmqError};
use crate::log::{default_error_log, ErrorLog};
use crate::option::{self, MAX_OPTION_LEN};
use bytes::Bytes;
use std::fmt;
use std::time::Duration;
use tracing::trace;

/// Socket configuration options.
///
/// # Examples
///
/// ```
/// use zbind_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_recv_timeout(Duration::from_secs(5))
///     .with_linger(Duration::ZERO);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocketOptions {
    /// Receive timeout (ZMQ_RCVTIMEO). Engine default blocks forever.
    pub recv_timeout: Option<Duration>,

    /// Send timeout (ZMQ_SNDTIMEO). Engine default blocks forever.
    pub send_timeout: Option<Duration>,

    /// Linger period on close (ZMQ_LINGER). Engine default waits forever.
    pub linger: Option<Duration>,

    /// Initial reconnect interval (ZMQ_RECONNECT_IVL)
    pub reconnect_ivl: Option<Duration>,

    /// Reconnect backoff ceiling (ZMQ_RECONNECT_IVL_MAX)
    pub reconnect_ivl_max: Option<Duration>,

    /// High water mark for receiving (ZMQ_RCVHWM), in messages
    pub recv_hwm: Option<i32>,

    /// High water mark for sending (ZMQ_SNDHWM), in messages
    pub send_hwm: Option<i32>,

    /// Only queue messages to completed connections (ZMQ_IMMEDIATE)
    pub immediate: Option<bool>,

    /// Largest inbound message accepted (ZMQ_MAXMSGSIZE)
    pub max_msg_size: Option<i64>,

    /// Listen backlog (ZMQ_BACKLOG)
    pub backlog: Option<i32>,

    /// I/O thread affinity bitmap (ZMQ_AFFINITY)
    pub affinity: Option<u64>,

    /// Socket identity (ZMQ_IDENTITY), at most 255 bytes
    pub routing_id: Option<Bytes>,

    /// Fail sends to unknown peers instead of dropping (ZMQ_ROUTER_MANDATORY)
    pub router_mandatory: Option<bool>,

    /// Send an empty message on connect (ZMQ_PROBE_ROUTER)
    pub probe_router: Option<bool>,

    /// Keep only the last message (ZMQ_CONFLATE)
    pub conflate: Option<bool>,

    /// Enable IPv6 on this socket (ZMQ_IPV6)
    pub ipv6: Option<bool>,

    /// TCP keepalive override (ZMQ_TCP_KEEPALIVE): -1 OS default, 0 off, 1 on
    pub tcp_keepalive: Option<i32>,
}

fn duration_ms(value: Duration) -> i32 {
    i32::try_from(value.as_millis()).unwrap_or(i32::MAX)
}

impl SocketOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = Some(linger);
        self
    }

    pub fn with_reconnect_ivl(mut self, ivl: Duration) -> Self {
        self.reconnect_ivl = Some(ivl);
        self
    }

    pub fn with_reconnect_ivl_max(mut self, max: Duration) -> Self {
        self.reconnect_ivl_max = Some(max);
        self
    }

    pub fn with_recv_hwm(mut self, hwm: i32) -> Self {
        self.recv_hwm = Some(hwm);
        self
    }

    pub fn with_send_hwm(mut self, hwm: i32) -> Self {
        self.send_hwm = Some(hwm);
        self
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = Some(immediate);
        self
    }

    pub fn with_max_msg_size(mut self, size: i64) -> Self {
        self.max_msg_size = Some(size);
        self
    }

    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = Some(backlog);
        self
    }

    pub fn with_affinity(mut self, affinity: u64) -> Self {
        self.affinity = Some(affinity);
        self
    }

    pub fn with_routing_id(mut self, id: impl Into<Bytes>) -> Self {
        self.routing_id = Some(id.into());
        self
    }

    pub fn with_router_mandatory(mut self, enabled: bool) -> Self {
        self.router_mandatory = Some(enabled);
        self
    }

    pub fn with_probe_router(mut self, enabled: bool) -> Self {
        self.probe_router = Some(enabled);
        self
    }

    pub fn with_conflate(mut self, enabled: bool) -> Self {
        self.conflate = Some(enabled);
        self
    }

    pub fn with_ipv6(mut self, enabled: bool) -> Self {
        self.ipv6 = Some(enabled);
        self
    }

    pub fn with_tcp_keepalive(mut self, mode: i32) -> Self {
        self.tcp_keepalive = Some(mode);
        self
    }

    /// Validate a routing ID
    ///
    /// Routing IDs may be empty (the engine assigns one) but cannot exceed
    /// 255 bytes.
    pub fn validate_routing_id(id: &[u8]) -> Result<()> {
        if id.len() > MAX_OPTION_LEN {
            return Err(ZmqError::invalid_argument(format!(
                "routing ID cannot exceed {MAX_OPTION_LEN} bytes (got {})",
                id.len()
            )));
        }
        Ok(())
    }

    /// Push every set field to `target`, stopping at the first failure.
    pub fn apply<T: RawOptions + ?Sized>(&self, target: &T) -> Result<()> {
        if let Some(id) = &self.routing_id {
            Self::validate_routing_id(id)?;
        }

        let durations = [
            (&option::RCVTIMEO, self.recv_timeout),
            (&option::SNDTIMEO, self.send_timeout),
            (&option::LINGER, self.linger),
            (&option::RECONNECT_IVL, self.reconnect_ivl),
            (&option::RECONNECT_IVL_MAX, self.reconnect_ivl_max),
        ];
        for (descriptor, value) in durations {
            if let Some(value) = value {
                codec::set_i32(target, descriptor, duration_ms(value))?;
            }
        }

        let ints = [
            (&option::RCVHWM, self.recv_hwm),
            (&option::SNDHWM, self.send_hwm),
            (&option::BACKLOG, self.backlog),
            (&option::TCP_KEEPALIVE, self.tcp_keepalive),
        ];
        for (descriptor, value) in ints {
            if let Some(value) = value {
                codec::set_i32(target, descriptor, value)?;
            }
        }

        let flags = [
            (&option::IMMEDIATE, self.immediate),
            (&option::ROUTER_MANDATORY, self.router_mandatory),
            (&option::PROBE_ROUTER, self.probe_router),
            (&option::CONFLATE, self.conflate),
            (&option::IPV6, self.ipv6),
        ];
        for (descriptor, value) in flags {
            if let Some(value) = value {
                codec::set_bool(target, descriptor, value)?;
            }
        }

        if let Some(size) = self.max_msg_size {
            codec::set_i64(target, &option::MAXMSGSIZE, size)?;
        }
        if let Some(affinity) = self.affinity {
            codec::set_u64(target, &option::AFFINITY, affinity)?;
        }
        if let Some(id) = &self.routing_id {
            codec::set_bytes(target, &option::IDENTITY, id)?;
        }

        trace!("[OPTIONS] Applied {self:?}");
        Ok(())
    }
}

/// Context configuration.
#[derive(Clone)]
pub struct ContextOptions {
    /// Engine I/O threads (ZMQ_IO_THREADS). Default 1.
    pub io_threads: i32,

    /// Socket limit (ZMQ_MAX_SOCKETS). Default 1023.
    pub max_sockets: i32,

    /// IPv6 default for new sockets (ZMQ_IPV6). Default off.
    pub ipv6: bool,

    /// Receives teardown failures. Default forwards to `tracing`.
    pub error_log: ErrorLog,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self {
            io_threads: 1,
            max_sockets: 1023,
            ipv6: false,
            error_log: default_error_log(),
        }
    }
}

impl fmt::Debug for ContextOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOptions")
            .field("io_threads", &self.io_threads)
            .field("max_sockets", &self.max_sockets)
            .field("ipv6", &self.ipv6)
            .finish_non_exhaustive()
    }
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_io_threads(mut self, threads: i32) -> Self {
        self.io_threads = threads;
        self
    }

    pub fn with_max_sockets(mut self, max: i32) -> Self {
        self.max_sockets = max;
        self
    }

    pub fn with_ipv6(mut self, enabled: bool) -> Self {
        self.ipv6 = enabled;
        self
    }

    pub fn with_error_log(mut self, log: ErrorLog) -> Self {
        self.error_log = log;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::testing::FakeOptions;

    #[test]
    fn test_default_options() {
        let opts = SocketOptions::default();
        assert!(opts.recv_timeout.is_none());
        assert!(opts.linger.is_none());
        assert!(opts.routing_id.is_none());

        let ctx = ContextOptions::default();
        assert_eq!(ctx.io_threads, 1);
        assert_eq!(ctx.max_sockets, 1023);
        assert!(!ctx.ipv6);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = SocketOptions::new()
            .with_recv_timeout(Duration::from_secs(5))
            .with_send_hwm(2000)
            .with_routing_id(&b"peer-1"[..]);

        assert_eq!(opts.recv_timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.send_hwm, Some(2000));
        assert_eq!(opts.routing_id.as_deref(), Some(&b"peer-1"[..]));
    }

    #[test]
    fn test_validate_routing_id() {
        assert!(SocketOptions::validate_routing_id(b"").is_ok());
        assert!(SocketOptions::validate_routing_id(&[7u8; 255]).is_ok());
        assert!(SocketOptions::validate_routing_id(&[7u8; 256])
            .unwrap_err()
            .is_precondition());
    }

    #[test]
    fn test_apply_pushes_only_set_fields() {
        let fake = FakeOptions::default();
        SocketOptions::new()
            .with_linger(Duration::from_millis(250))
            .with_conflate(true)
            .with_routing_id(&b"abc"[..])
            .apply(&fake)
            .unwrap();

        let sets = fake.sets.borrow();
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0], (option::LINGER.code, Some(250i32.to_ne_bytes().to_vec())));
        assert_eq!(sets[1], (option::CONFLATE.code, Some(1i32.to_ne_bytes().to_vec())));
        assert_eq!(sets[2], (option::IDENTITY.code, Some(b"abc".to_vec())));
    }

    #[test]
    fn test_apply_rejects_long_routing_id_before_any_call() {
        let fake = FakeOptions::default();
        let err = SocketOptions::new()
            .with_send_hwm(5)
            .with_routing_id(vec![1u8; 300])
            .apply(&fake)
            .unwrap_err();
        assert!(err.is_precondition());
        assert!(fake.sets.borrow().is_empty());
    }

    #[test]
    fn test_long_durations_saturate() {
        assert_eq!(duration_ms(Duration::from_secs(u64::MAX)), i32::MAX);
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
    }
}
