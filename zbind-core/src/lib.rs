//! zbind Core
//!
//! Engine-independent building blocks of the binding:
//! - Error taxonomy (`error`) and the retry/resolve policy (`policy`)
//! - Option descriptor table (`option`) and typed option codec (`codec`)
//! - Socket kinds and security mechanisms (`socket_type`)
//! - Monitor event model and two-frame decoder (`monitor`)
//! - Poll interest flags and the readiness sweep (`poll`)
//! - Declarative configuration (`options`) and the teardown log (`log`)
//!
//! Nothing here touches native handles; the `zbind` crate supplies the
//! native implementations of the traits defined here.

#![deny(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_same_arms)]
pub mod codec;
pub mod error;
pub mod log;
pub mod monitor;
pub mod option;
pub mod options;
pub mod policy;
pub mod poll;
pub mod socket_type;

pub mod prelude {
    pub use crate::error::{Result, ZmqError};
    pub use crate::log::ErrorLog;
    pub use crate::monitor::{EventMask, MonitorEvent, MonitorEventKind};
    pub use crate::options::{ContextOptions, SocketOptions};
    pub use crate::poll::PollEvents;
    pub use crate::socket_type::{SecurityMechanism, SocketType};
}
