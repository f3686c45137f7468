//! Socket event monitoring.
//!
//! The engine publishes lifecycle events of a monitored socket as two-frame
//! messages on a private PAIR channel:
//!
//! ```text
//! frame 1: [ kind: u16 | value: i32 ]   (6 bytes, native byte order)
//! frame 2: endpoint, ASCII              (empty for MonitorStopped)
//! ```
//!
//! [`MonitorDecoder`] turns that stream into [`MonitorEvent`] values and
//! tracks the terminal `MonitorStopped` event.

use crate::error::{Result, ZmqError};
use crate::policy::ErrorSource;
use std::fmt;
use std::ops::BitOr;
use tracing::{trace, warn};

/// Size of the first frame of every monitor message.
pub const EVENT_HEADER_LEN: usize = 6;

/// Socket lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MonitorEventKind {
    /// Socket successfully connected to a peer.
    Connected = 0x0001,
    /// Connection is pending and will complete asynchronously.
    ConnectDelayed = 0x0002,
    /// A connect attempt is being retried.
    ConnectRetried = 0x0004,
    /// Socket is listening for incoming connections.
    Listening = 0x0008,
    /// Bind operation failed.
    BindFailed = 0x0010,
    /// Socket accepted a new incoming connection.
    Accepted = 0x0020,
    /// Accepting a connection failed.
    AcceptFailed = 0x0040,
    /// Socket closed a connection.
    Closed = 0x0080,
    /// Closing a connection failed.
    CloseFailed = 0x0100,
    /// Socket disconnected from a peer.
    Disconnected = 0x0200,
    /// Monitoring stopped; always the last event on the channel.
    MonitorStopped = 0x0400,
}

impl MonitorEventKind {
    pub const ALL: [MonitorEventKind; 11] = [
        Self::Connected,
        Self::ConnectDelayed,
        Self::ConnectRetried,
        Self::Listening,
        Self::BindFailed,
        Self::Accepted,
        Self::AcceptFailed,
        Self::Closed,
        Self::CloseFailed,
        Self::Disconnected,
        Self::MonitorStopped,
    ];

    pub fn from_raw(raw: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| *kind as u16 == raw)
    }

    /// True for the kinds whose value is an engine error code.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::BindFailed | Self::AcceptFailed | Self::CloseFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "Connected",
            Self::ConnectDelayed => "ConnectDelayed",
            Self::ConnectRetried => "ConnectRetried",
            Self::Listening => "Listening",
            Self::BindFailed => "BindFailed",
            Self::Accepted => "Accepted",
            Self::AcceptFailed => "AcceptFailed",
            Self::Closed => "Closed",
            Self::CloseFailed => "CloseFailed",
            Self::Disconnected => "Disconnected",
            Self::MonitorStopped => "MonitorStopped",
        }
    }
}

impl fmt::Display for MonitorEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of event kinds to request from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventMask(u16);

impl EventMask {
    pub const NONE: EventMask = EventMask(0);
    pub const ALL: EventMask = EventMask(0x07FF);

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, kind: MonitorEventKind) -> bool {
        self.0 & kind as u16 != 0
    }
}

impl Default for EventMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl From<MonitorEventKind> for EventMask {
    fn from(kind: MonitorEventKind) -> Self {
        EventMask(kind as u16)
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

impl BitOr<MonitorEventKind> for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: MonitorEventKind) -> EventMask {
        self | EventMask::from(rhs)
    }
}

impl BitOr for MonitorEventKind {
    type Output = EventMask;

    fn bitor(self, rhs: MonitorEventKind) -> EventMask {
        EventMask::from(self) | rhs
    }
}

/// One decoded monitor event.
///
/// Each call to [`MonitorDecoder::decode_next`] produces a fresh value, so
/// events may be kept for as long as the caller likes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorEvent {
    pub kind: MonitorEventKind,
    /// Errno for the failure kinds, usually a file descriptor otherwise.
    pub value: i32,
    /// The decoded engine error for the failure kinds.
    pub error: Option<ZmqError>,
    /// Absent for `MonitorStopped`. Not guaranteed to be a meaningful address.
    pub endpoint: Option<String>,
}

impl MonitorEvent {
    pub const fn is_failure(&self) -> bool {
        self.kind.is_failure()
    }

    pub fn is_stopped(&self) -> bool {
        self.kind == MonitorEventKind::MonitorStopped
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(err) = &self.error {
            write!(f, " ({err})")?;
        }
        Ok(())
    }
}

/// Split the first frame into its kind code and value.
pub fn parse_header(frame: &[u8]) -> Option<(u16, i32)> {
    if frame.len() != EVENT_HEADER_LEN {
        return None;
    }
    let kind = u16::from_ne_bytes([frame[0], frame[1]]);
    let value = i32::from_ne_bytes([frame[2], frame[3], frame[4], frame[5]]);
    Some((kind, value))
}

/// Source of monitor frames, implemented by the channel's PAIR socket.
pub trait FrameSource {
    /// Receive the next frame into `buffer`, returning its length, or `None`
    /// when nothing could be received (would-block or context shutdown).
    fn recv_frame(&self, buffer: &mut Vec<u8>) -> Result<Option<usize>>;

    /// Whether the message being received has more frames.
    fn has_more(&self) -> Result<bool>;
}

/// Stateful decoder for one monitor channel.
#[derive(Debug)]
pub struct MonitorDecoder {
    buffer: Vec<u8>,
    stopped: bool,
}

impl Default for MonitorDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorDecoder {
    pub fn new() -> Self {
        Self {
            buffer: vec![0; 256],
            stopped: false,
        }
    }

    /// Whether the terminal event has been decoded. Never reverts.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Decode one event.
    ///
    /// Malformed or unknown messages are logged, drained and reported as
    /// `Ok(None)` so a bad message never desynchronizes the stream.
    pub fn decode_next<S, E>(&mut self, source: &S, errors: &E) -> Result<Option<MonitorEvent>>
    where
        S: FrameSource + ?Sized,
        E: ErrorSource + ?Sized,
    {
        let Some(len) = source.recv_frame(&mut self.buffer)? else {
            return Ok(None);
        };
        let Some((code, value)) = parse_header(&self.buffer[..len]) else {
            warn!("[MONITOR] Received {len} bytes, expecting {EVENT_HEADER_LEN} in the first frame");
            self.discard_rest(source)?;
            return Ok(None);
        };
        let Some(kind) = MonitorEventKind::from_raw(code) else {
            warn!("[MONITOR] Unknown event kind {code:#06x}");
            self.discard_rest(source)?;
            return Ok(None);
        };

        if kind == MonitorEventKind::MonitorStopped {
            self.stopped = true;
            // some engine versions send an empty second frame, others none
            self.discard_rest(source)?;
            trace!("[MONITOR] Stopped");
            return Ok(Some(MonitorEvent {
                kind,
                value,
                error: None,
                endpoint: None,
            }));
        }

        let endpoint = if source.has_more()? {
            let len = source.recv_frame(&mut self.buffer)?.unwrap_or(0);
            Some(String::from_utf8_lossy(&self.buffer[..len]).into_owned())
        } else {
            warn!("[MONITOR] {kind} event arrived without an endpoint frame");
            None
        };
        self.discard_rest(source)?;

        let error = kind
            .is_failure()
            .then(|| ZmqError::native(value, errors.describe(value)));
        trace!("[MONITOR] Decoded {kind} (value={value})");
        Ok(Some(MonitorEvent {
            kind,
            value,
            error,
            endpoint,
        }))
    }

    fn discard_rest<S: FrameSource + ?Sized>(&mut self, source: &S) -> Result<()> {
        while source.has_more()? {
            if source.recv_frame(&mut self.buffer)?.is_none() {
                break;
            }
        }
        Ok(())
    }
}
