//! Engine context.
//!
//! A [`Context`] owns the engine's I/O threads. It is cheap to clone and
//! every [`Socket`] keeps a clone, so the native context is terminated only
//! after the last socket has been closed.

use crate::native::{LibZmq, ZMQ_CTX_IPV6, ZMQ_IO_THREADS, ZMQ_MAX_SOCKETS};
use crate::socket::Socket;
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};
use zbind_core::error::{Result, ZmqError};
use zbind_core::log::ErrorLog;
use zbind_core::options::ContextOptions;
use zbind_core::policy::{check, ErrorSource, EINTR, ERROR_RETURN};
use zbind_core::socket_type::SocketType;

struct RawContext {
    handle: *mut c_void,
    error_log: ErrorLog,
}

// SAFETY: libzmq contexts are thread-safe
unsafe impl Send for RawContext {}
unsafe impl Sync for RawContext {}

impl Drop for RawContext {
    fn drop(&mut self) {
        loop {
            let rc = unsafe { zmq_sys::zmq_ctx_term(self.handle) };
            if rc != ERROR_RETURN {
                trace!("[CONTEXT] Terminated");
                return;
            }
            let code = LibZmq.last_error();
            if code == EINTR {
                continue;
            }
            (self.error_log)(&format!(
                "Error terminating context: {}",
                ZmqError::native(code, LibZmq.describe(code))
            ));
            return;
        }
    }
}

/// Shared handle to an engine context.
#[derive(Clone)]
pub struct Context {
    inner: Arc<RawContext>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("handle", &self.inner.handle).finish()
    }
}

impl Context {
    /// Create a context with default options.
    pub fn new() -> Result<Self> {
        Self::with_options(ContextOptions::default())
    }

    pub fn with_options(options: ContextOptions) -> Result<Self> {
        let handle = unsafe { zmq_sys::zmq_ctx_new() };
        if handle.is_null() {
            let code = LibZmq.last_error();
            return Err(ZmqError::native(code, LibZmq.describe(code)));
        }
        let ctx = Self {
            inner: Arc::new(RawContext {
                handle,
                error_log: options.error_log,
            }),
        };
        ctx.set(ZMQ_IO_THREADS, options.io_threads)?;
        ctx.set(ZMQ_MAX_SOCKETS, options.max_sockets)?;
        ctx.set(ZMQ_CTX_IPV6, i32::from(options.ipv6))?;
        debug!(
            "[CONTEXT] Created (io_threads={}, max_sockets={}, ipv6={})",
            options.io_threads, options.max_sockets, options.ipv6
        );
        Ok(ctx)
    }

    fn set(&self, option: i32, value: i32) -> Result<()> {
        let rc = unsafe { zmq_sys::zmq_ctx_set(self.inner.handle, option, value) };
        check(&LibZmq, rc).map(|_| ())
    }

    fn get(&self, option: i32) -> Result<i32> {
        let rc = unsafe { zmq_sys::zmq_ctx_get(self.inner.handle, option) };
        check(&LibZmq, rc)
    }

    pub fn io_threads(&self) -> Result<i32> {
        self.get(ZMQ_IO_THREADS)
    }

    /// Only takes effect before the first socket is created.
    pub fn set_io_threads(&self, threads: i32) -> Result<()> {
        self.set(ZMQ_IO_THREADS, threads)
    }

    pub fn max_sockets(&self) -> Result<i32> {
        self.get(ZMQ_MAX_SOCKETS)
    }

    pub fn set_max_sockets(&self, max: i32) -> Result<()> {
        self.set(ZMQ_MAX_SOCKETS, max)
    }

    pub fn ipv6(&self) -> Result<bool> {
        self.get(ZMQ_CTX_IPV6).map(|v| v == 1)
    }

    pub fn set_ipv6(&self, enabled: bool) -> Result<()> {
        self.set(ZMQ_CTX_IPV6, i32::from(enabled))
    }

    /// Create a socket of the given kind.
    pub fn socket(&self, kind: SocketType) -> Result<Socket> {
        Socket::new(self, kind)
    }

    /// Make blocking operations on every socket of this context return
    /// immediately as context-terminated.
    pub fn shutdown(&self) -> Result<()> {
        let rc = unsafe { zmq_sys::zmq_ctx_shutdown(self.inner.handle) };
        check(&LibZmq, rc)?;
        debug!("[CONTEXT] Shut down");
        Ok(())
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.inner.handle
    }

    pub(crate) fn error_log(&self) -> &ErrorLog {
        &self.inner.error_log
    }
}
