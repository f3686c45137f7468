//! Error and retry policy shared by every native call.
//!
//! The engine reports failures the classic C way: a return value of `-1` and
//! a thread-local error code. This module turns that pair into an [`Outcome`]
//! and implements the uniform handling every caller relies on:
//!
//! - interrupted calls are retried transparently ([`retry_if_interrupted`])
//! - "would block" and "context terminated" are non-fatal
//! - everything else becomes [`ZmqError::Native`]

use crate::error::{Result, ZmqError};
use tracing::trace;

/// The only failure value a primitive is allowed to return.
pub const ERROR_RETURN: i32 = -1;

/// Base of the engine's private error code range.
pub const ZMQ_HAUSNUMERO: i32 = 156_384_712;

/// Interrupted system call.
pub const EINTR: i32 = libc::EINTR;

/// Resource temporarily unavailable.
pub const EAGAIN: i32 = libc::EAGAIN;

/// The owning context was terminated.
pub const ETERM: i32 = ZMQ_HAUSNUMERO + 53;

/// Access to the engine's last-error state.
///
/// Implemented by the native binding; tests use an in-memory fake.
pub trait ErrorSource {
    /// Error code of the last failed call on this thread.
    fn last_error(&self) -> i32;

    /// Human-readable description of an error code.
    fn describe(&self, code: i32) -> String;
}

/// Classified result of a primitive call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The call succeeded; carries the non-negative return value.
    Success(i32),
    /// A non-blocking call could not complete immediately.
    WouldBlock,
    /// The owning context is shutting down.
    ContextTerminated,
    /// Any other engine failure.
    Fatal { code: i32, description: String },
}

impl Outcome {
    /// Classify the raw return value of an integer-returning primitive.
    ///
    /// # Panics
    ///
    /// Panics if `rc` is negative but not [`ERROR_RETURN`]; primitives never
    /// return such values, so this is a binding bug.
    pub fn classify<E: ErrorSource + ?Sized>(rc: i32, errors: &E) -> Self {
        if rc >= 0 {
            return Self::Success(rc);
        }
        assert!(
            rc == ERROR_RETURN,
            "primitive returned {rc}; expected {ERROR_RETURN} or a non-negative value"
        );
        Self::from_code(errors.last_error(), errors)
    }

    /// Classify the result of a pointer-returning primitive.
    pub fn classify_ptr<E: ErrorSource + ?Sized>(is_null: bool, errors: &E) -> Self {
        if is_null {
            Self::from_code(errors.last_error(), errors)
        } else {
            Self::Success(0)
        }
    }

    /// Classify an error code that is already known to be a failure.
    pub fn from_code<E: ErrorSource + ?Sized>(code: i32, errors: &E) -> Self {
        match code {
            EAGAIN => Self::WouldBlock,
            ETERM => Self::ContextTerminated,
            _ => Self::Fatal {
                code,
                description: errors.describe(code),
            },
        }
    }

    /// Returns true if the call was interrupted and should be retried.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Fatal { code, .. } if *code == EINTR)
    }

    /// Resolve into the caller-facing result.
    ///
    /// Would-block and context-terminated both mean "0 performed".
    pub fn into_result(self) -> Result<i32> {
        match self {
            Self::Success(value) => Ok(value),
            Self::WouldBlock | Self::ContextTerminated => Ok(0),
            Self::Fatal { code, description } => Err(ZmqError::Native { code, description }),
        }
    }

    /// Resolve, surfacing would-block as `None`.
    pub fn into_retry_result(self) -> Result<Option<i32>> {
        match self {
            Self::WouldBlock => Ok(None),
            other => other.into_result().map(Some),
        }
    }
}

/// Invoke `op` until it returns something other than an interrupted failure.
///
/// Must wrap every primitive that can block: send, receive, poll and the
/// option accessors.
pub fn retry_if_interrupted<E, F>(errors: &E, mut op: F) -> i32
where
    E: ErrorSource + ?Sized,
    F: FnMut() -> i32,
{
    loop {
        let rc = op();
        if rc == ERROR_RETURN && errors.last_error() == EINTR {
            trace!("[POLICY] Call interrupted, retrying");
            continue;
        }
        return rc;
    }
}

/// Classify `rc` and resolve it; see [`Outcome::into_result`].
pub fn resolve<E: ErrorSource + ?Sized>(errors: &E, rc: i32) -> Result<i32> {
    Outcome::classify(rc, errors).into_result()
}

/// Classify `rc` and resolve it; see [`Outcome::into_retry_result`].
pub fn resolve_expecting_retry<E: ErrorSource + ?Sized>(errors: &E, rc: i32) -> Result<Option<i32>> {
    Outcome::classify(rc, errors).into_retry_result()
}

/// Classify `rc` with no tolerance: any failure, including would-block and
/// context termination, becomes an error.
///
/// Used for setup calls that are expected to happen before any shutdown race.
pub fn check<E: ErrorSource + ?Sized>(errors: &E, rc: i32) -> Result<i32> {
    if rc >= 0 {
        return Ok(rc);
    }
    let code = errors.last_error();
    match Outcome::classify(rc, errors) {
        Outcome::Success(value) => Ok(value),
        Outcome::Fatal { code, description } => Err(ZmqError::Native { code, description }),
        Outcome::WouldBlock | Outcome::ContextTerminated => {
            Err(ZmqError::native(code, errors.describe(code)))
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::ErrorSource;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;

    /// Scripted error source: each failure pops the next queued code, the
    /// last one sticks.
    #[derive(Default)]
    pub struct FakeErrors {
        pub codes: RefCell<VecDeque<i32>>,
        pub current: Cell<i32>,
    }

    impl FakeErrors {
        pub fn with_codes(codes: &[i32]) -> Self {
            let fake = Self::default();
            fake.codes.borrow_mut().extend(codes.iter().copied());
            fake
        }

        /// Advance to the next scripted error code.
        pub fn fail(&self) -> i32 {
            if let Some(code) = self.codes.borrow_mut().pop_front() {
                self.current.set(code);
            }
            super::ERROR_RETURN
        }
    }

    impl ErrorSource for FakeErrors {
        fn last_error(&self) -> i32 {
            self.current.get()
        }

        fn describe(&self, code: i32) -> String {
            format!("error {code}")
        }
    }
}
