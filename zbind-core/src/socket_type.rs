//! Socket type enumeration for ZeroMQ socket types.
//!
//! The numeric values are the ones the engine expects in `zmq_socket` and
//! reports through the `ZMQ_TYPE` option.

use std::fmt;

/// ZeroMQ socket types.
///
/// Corresponds to ZMQ_TYPE socket option (16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SocketType {
    /// PAIR socket for exclusive bidirectional communication
    Pair = 0,

    /// PUB socket for publishing messages to subscribers
    Pub = 1,

    /// SUB socket for subscribing to published messages
    Sub = 2,

    /// REQ socket for synchronous request-reply client
    Req = 3,

    /// REP socket for synchronous request-reply server
    Rep = 4,

    /// DEALER socket for asynchronous request-reply patterns
    Dealer = 5,

    /// ROUTER socket for routing messages by identity
    Router = 6,

    /// PULL socket for receiving messages from pushers
    Pull = 7,

    /// PUSH socket for sending messages to pullers
    Push = 8,

    /// XPUB socket for extended publisher with subscription awareness
    XPub = 9,

    /// XSUB socket for extended subscriber with dynamic subscriptions
    XSub = 10,

    /// STREAM socket for raw TCP connections
    Stream = 11,
}

impl SocketType {
    /// All socket types, in numeric order.
    pub const ALL: [SocketType; 12] = [
        Self::Pair,
        Self::Pub,
        Self::Sub,
        Self::Req,
        Self::Rep,
        Self::Dealer,
        Self::Router,
        Self::Pull,
        Self::Push,
        Self::XPub,
        Self::XSub,
        Self::Stream,
    ];

    /// Map the engine's numeric socket type back to the enum.
    pub fn from_raw(raw: i32) -> Option<Self> {
        usize::try_from(raw).ok().and_then(|i| Self::ALL.get(i)).copied()
    }

    /// The numeric value passed to the engine.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Get the socket type as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
            Self::Stream => "STREAM",
        }
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Security mechanism reported by the `ZMQ_MECHANISM` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SecurityMechanism {
    Null = 0,
    Plain = 1,
    Curve = 2,
    /// A mechanism this binding does not know about.
    Unknown = -1,
}

impl SecurityMechanism {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Null,
            1 => Self::Plain,
            2 => Self::Curve,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_type_display() {
        assert_eq!(SocketType::Dealer.to_string(), "DEALER");
        assert_eq!(SocketType::Router.to_string(), "ROUTER");
        assert_eq!(SocketType::Pub.to_string(), "PUB");
    }

    #[test]
    fn test_raw_round_trip() {
        for kind in SocketType::ALL {
            assert_eq!(SocketType::from_raw(kind.as_raw()), Some(kind));
        }
        assert_eq!(SocketType::from_raw(12), None);
        assert_eq!(SocketType::from_raw(-1), None);
    }

    #[test]
    fn test_mechanism_from_raw() {
        assert_eq!(SecurityMechanism::from_raw(0), SecurityMechanism::Null);
        assert_eq!(SecurityMechanism::from_raw(2), SecurityMechanism::Curve);
        assert_eq!(SecurityMechanism::from_raw(9), SecurityMechanism::Unknown);
    }
}
