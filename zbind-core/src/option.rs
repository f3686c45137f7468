//! Socket option descriptor table.
//!
//! Every option the binding exposes is described once here: its numeric
//! code, the shape of its value and whether it may be read and/or written.
//! The table is a process-wide constant.

use std::fmt;

/// Capacity used for variable-length values without a fixed width.
pub const MAX_OPTION_LEN: usize = 255;

/// Width of a binary CURVE key.
pub const CURVE_KEY_LEN: usize = 32;

/// Width of a Z85-encoded CURVE key, without the terminating NUL.
pub const CURVE_KEY_Z85_LEN: usize = 40;

/// Length constraint of a variable-size option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    /// At most this many bytes.
    UpTo(usize),
    /// Exactly this many bytes.
    Exactly(usize),
}

impl Width {
    /// Upper bound on the value length.
    pub const fn max(self) -> usize {
        match self {
            Self::UpTo(n) | Self::Exactly(n) => n,
        }
    }

    /// Check a value length against the constraint.
    pub const fn accepts(self, len: usize) -> bool {
        match self {
            Self::UpTo(n) => len <= n,
            Self::Exactly(n) => len == n,
        }
    }
}

/// Shape of an option value as passed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionShape {
    Int32,
    Int64,
    UInt64,
    Bytes(Width),
    /// NUL-terminated ASCII text; the width excludes the terminator.
    Str(Width),
}

/// Which directions an option supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

/// Static description of one socket option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub code: i32,
    pub shape: OptionShape,
    pub access: Access,
}

impl OptionDescriptor {
    const fn new(name: &'static str, code: i32, shape: OptionShape, access: Access) -> Self {
        Self {
            name,
            code,
            shape,
            access,
        }
    }

    pub const fn is_readable(&self) -> bool {
        !matches!(self.access, Access::WriteOnly)
    }

    pub const fn is_writable(&self) -> bool {
        !matches!(self.access, Access::ReadOnly)
    }
}

impl fmt::Display for OptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZMQ_{} ({})", self.name, self.code)
    }
}

use Access::{ReadOnly, ReadWrite, WriteOnly};
use OptionShape::{Bytes, Int32, Int64, Str, UInt64};

const TEXT: OptionShape = Str(Width::UpTo(MAX_OPTION_LEN));
const BLOB: OptionShape = Bytes(Width::UpTo(MAX_OPTION_LEN));
const CURVE_KEY: OptionShape = Bytes(Width::Exactly(CURVE_KEY_LEN));
const CURVE_KEY_Z85: OptionShape = Str(Width::Exactly(CURVE_KEY_Z85_LEN));

pub const AFFINITY: OptionDescriptor = OptionDescriptor::new("AFFINITY", 4, UInt64, ReadWrite);
pub const IDENTITY: OptionDescriptor = OptionDescriptor::new("IDENTITY", 5, BLOB, ReadWrite);
pub const SUBSCRIBE: OptionDescriptor = OptionDescriptor::new("SUBSCRIBE", 6, BLOB, WriteOnly);
pub const UNSUBSCRIBE: OptionDescriptor = OptionDescriptor::new("UNSUBSCRIBE", 7, BLOB, WriteOnly);
pub const RATE: OptionDescriptor = OptionDescriptor::new("RATE", 8, Int32, ReadWrite);
pub const RECOVERY_IVL: OptionDescriptor = OptionDescriptor::new("RECOVERY_IVL", 9, Int32, ReadWrite);
pub const SNDBUF: OptionDescriptor = OptionDescriptor::new("SNDBUF", 11, Int32, ReadWrite);
pub const RCVBUF: OptionDescriptor = OptionDescriptor::new("RCVBUF", 12, Int32, ReadWrite);
pub const RCVMORE: OptionDescriptor = OptionDescriptor::new("RCVMORE", 13, Int32, ReadOnly);
pub const TYPE: OptionDescriptor = OptionDescriptor::new("TYPE", 16, Int32, ReadOnly);
pub const LINGER: OptionDescriptor = OptionDescriptor::new("LINGER", 17, Int32, ReadWrite);
pub const RECONNECT_IVL: OptionDescriptor = OptionDescriptor::new("RECONNECT_IVL", 18, Int32, ReadWrite);
pub const BACKLOG: OptionDescriptor = OptionDescriptor::new("BACKLOG", 19, Int32, ReadWrite);
pub const RECONNECT_IVL_MAX: OptionDescriptor =
    OptionDescriptor::new("RECONNECT_IVL_MAX", 21, Int32, ReadWrite);
pub const MAXMSGSIZE: OptionDescriptor = OptionDescriptor::new("MAXMSGSIZE", 22, Int64, ReadWrite);
pub const SNDHWM: OptionDescriptor = OptionDescriptor::new("SNDHWM", 23, Int32, ReadWrite);
pub const RCVHWM: OptionDescriptor = OptionDescriptor::new("RCVHWM", 24, Int32, ReadWrite);
pub const MULTICAST_HOPS: OptionDescriptor = OptionDescriptor::new("MULTICAST_HOPS", 25, Int32, ReadWrite);
pub const RCVTIMEO: OptionDescriptor = OptionDescriptor::new("RCVTIMEO", 27, Int32, ReadWrite);
pub const SNDTIMEO: OptionDescriptor = OptionDescriptor::new("SNDTIMEO", 28, Int32, ReadWrite);
pub const LAST_ENDPOINT: OptionDescriptor = OptionDescriptor::new("LAST_ENDPOINT", 32, TEXT, ReadOnly);
pub const ROUTER_MANDATORY: OptionDescriptor =
    OptionDescriptor::new("ROUTER_MANDATORY", 33, Int32, WriteOnly);
pub const TCP_KEEPALIVE: OptionDescriptor = OptionDescriptor::new("TCP_KEEPALIVE", 34, Int32, ReadWrite);
pub const TCP_KEEPALIVE_CNT: OptionDescriptor =
    OptionDescriptor::new("TCP_KEEPALIVE_CNT", 35, Int32, ReadWrite);
pub const TCP_KEEPALIVE_IDLE: OptionDescriptor =
    OptionDescriptor::new("TCP_KEEPALIVE_IDLE", 36, Int32, ReadWrite);
pub const TCP_KEEPALIVE_INTVL: OptionDescriptor =
    OptionDescriptor::new("TCP_KEEPALIVE_INTVL", 37, Int32, ReadWrite);
pub const IMMEDIATE: OptionDescriptor = OptionDescriptor::new("IMMEDIATE", 39, Int32, ReadWrite);
pub const IPV6: OptionDescriptor = OptionDescriptor::new("IPV6", 42, Int32, ReadWrite);
pub const MECHANISM: OptionDescriptor = OptionDescriptor::new("MECHANISM", 43, Int32, ReadOnly);
pub const PLAIN_SERVER: OptionDescriptor = OptionDescriptor::new("PLAIN_SERVER", 44, Int32, ReadWrite);
pub const PLAIN_USERNAME: OptionDescriptor = OptionDescriptor::new("PLAIN_USERNAME", 45, TEXT, ReadWrite);
pub const PLAIN_PASSWORD: OptionDescriptor = OptionDescriptor::new("PLAIN_PASSWORD", 46, TEXT, ReadWrite);
pub const CURVE_SERVER: OptionDescriptor = OptionDescriptor::new("CURVE_SERVER", 47, Int32, ReadWrite);
pub const CURVE_PUBLICKEY: OptionDescriptor =
    OptionDescriptor::new("CURVE_PUBLICKEY", 48, CURVE_KEY, ReadWrite);
pub const CURVE_SECRETKEY: OptionDescriptor =
    OptionDescriptor::new("CURVE_SECRETKEY", 49, CURVE_KEY, ReadWrite);
pub const CURVE_SERVERKEY: OptionDescriptor =
    OptionDescriptor::new("CURVE_SERVERKEY", 50, CURVE_KEY, ReadWrite);
pub const CURVE_PUBLICKEY_Z85: OptionDescriptor =
    OptionDescriptor::new("CURVE_PUBLICKEY", 48, CURVE_KEY_Z85, ReadWrite);
pub const CURVE_SECRETKEY_Z85: OptionDescriptor =
    OptionDescriptor::new("CURVE_SECRETKEY", 49, CURVE_KEY_Z85, ReadWrite);
pub const CURVE_SERVERKEY_Z85: OptionDescriptor =
    OptionDescriptor::new("CURVE_SERVERKEY", 50, CURVE_KEY_Z85, ReadWrite);
pub const PROBE_ROUTER: OptionDescriptor = OptionDescriptor::new("PROBE_ROUTER", 51, Int32, WriteOnly);
pub const REQ_CORRELATE: OptionDescriptor = OptionDescriptor::new("REQ_CORRELATE", 52, Int32, WriteOnly);
pub const REQ_RELAXED: OptionDescriptor = OptionDescriptor::new("REQ_RELAXED", 53, Int32, WriteOnly);
pub const CONFLATE: OptionDescriptor = OptionDescriptor::new("CONFLATE", 54, Int32, WriteOnly);
pub const ZAP_DOMAIN: OptionDescriptor = OptionDescriptor::new("ZAP_DOMAIN", 55, TEXT, ReadWrite);

/// Every option known to the binding.
///
/// The CURVE keys appear twice: once per value encoding.
pub const ALL: &[OptionDescriptor] = &[
    AFFINITY,
    IDENTITY,
    SUBSCRIBE,
    UNSUBSCRIBE,
    RATE,
    RECOVERY_IVL,
    SNDBUF,
    RCVBUF,
    RCVMORE,
    TYPE,
    LINGER,
    RECONNECT_IVL,
    BACKLOG,
    RECONNECT_IVL_MAX,
    MAXMSGSIZE,
    SNDHWM,
    RCVHWM,
    MULTICAST_HOPS,
    RCVTIMEO,
    SNDTIMEO,
    LAST_ENDPOINT,
    ROUTER_MANDATORY,
    TCP_KEEPALIVE,
    TCP_KEEPALIVE_CNT,
    TCP_KEEPALIVE_IDLE,
    TCP_KEEPALIVE_INTVL,
    IMMEDIATE,
    IPV6,
    MECHANISM,
    PLAIN_SERVER,
    PLAIN_USERNAME,
    PLAIN_PASSWORD,
    CURVE_SERVER,
    CURVE_PUBLICKEY,
    CURVE_SECRETKEY,
    CURVE_SERVERKEY,
    CURVE_PUBLICKEY_Z85,
    CURVE_SECRETKEY_Z85,
    CURVE_SERVERKEY_Z85,
    PROBE_ROUTER,
    REQ_CORRELATE,
    REQ_RELAXED,
    CONFLATE,
    ZAP_DOMAIN,
];

/// Find an option by name (without the `ZMQ_` prefix), case-insensitively.
pub fn by_name(name: &str) -> Option<&'static OptionDescriptor> {
    let name = name.strip_prefix("ZMQ_").unwrap_or(name);
    ALL.iter().find(|d| d.name.eq_ignore_ascii_case(name))
}
