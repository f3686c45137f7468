//! # zbind
//!
//! Safe, typed access to libzmq sockets, polling and socket monitoring.
//!
//! ## Architecture
//!
//! - **`zbind-core`**: engine-independent logic (error policy, option codec,
//!   monitor decoding, poll dispatch), free of `unsafe`
//! - **`zbind`**: the native layer (this crate), which owns every libzmq handle
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zbind::prelude::*;
//!
//! # fn example() -> zbind::Result<()> {
//! let ctx = Context::new()?;
//!
//! let push = ctx.socket(SocketType::Push)?;
//! push.bind("tcp://127.0.0.1:5555")?;
//!
//! let pull = ctx.socket(SocketType::Pull)?;
//! pull.connect("tcp://127.0.0.1:5555")?;
//!
//! push.send(b"Hello", false, false)?;
//!
//! let mut buffer = Vec::new();
//! if let Some(len) = pull.receive(&mut buffer, false)? {
//!     println!("Received: {:?}", &buffer[..len]);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Interrupted calls are retried internally. "Would block" is reported in
//! return values (`send` returns `false`, `receive` returns `None`), and so
//! is context shutdown, which turns every blocking call into a no-op.
//! Everything else is a [`ZmqError`].

#![warn(clippy::all)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

mod context;
pub mod dev_tracing;
mod monitor;
mod native;
mod poller;
mod socket;

pub use context::Context;
pub use monitor::MonitorChannel;
pub use poller::{Poller, PollerBuilder};
pub use socket::Socket;

pub use zbind_core::error::{Result, ZmqError};
pub use zbind_core::log::{default_error_log, ErrorLog};
pub use zbind_core::monitor::{EventMask, MonitorEvent, MonitorEventKind};
pub use zbind_core::option;
pub use zbind_core::options::{ContextOptions, SocketOptions};
pub use zbind_core::socket_type::{SecurityMechanism, SocketType};

/// Convenient imports.
///
/// ```rust
/// use zbind::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        Context, ContextOptions, EventMask, MonitorChannel, MonitorEvent, MonitorEventKind, Poller, Socket,
        SocketOptions, SocketType, ZmqError,
    };
}
