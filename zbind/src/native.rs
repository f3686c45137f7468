//! Thin layer over the `zmq-sys` declarations.
//!
//! # Safety
//!
//! This is one of the few modules that calls into libzmq directly. Pointers
//! handed to the engine are either owned handles that outlive the call or
//! buffers borrowed for the duration of the call.

use std::ffi::{c_void, CStr};
use std::mem::MaybeUninit;
use zbind_core::policy::ErrorSource;

/// Send flag: fail with EAGAIN instead of blocking.
pub(crate) const ZMQ_DONTWAIT: i32 = zmq_sys::ZMQ_DONTWAIT as i32;
/// Send flag: more frames of the same message follow.
pub(crate) const ZMQ_SNDMORE: i32 = zmq_sys::ZMQ_SNDMORE as i32;

/// Context option codes for `zmq_ctx_set` / `zmq_ctx_get`.
pub(crate) const ZMQ_IO_THREADS: i32 = zmq_sys::ZMQ_IO_THREADS as i32;
pub(crate) const ZMQ_MAX_SOCKETS: i32 = zmq_sys::ZMQ_MAX_SOCKETS as i32;
pub(crate) const ZMQ_CTX_IPV6: i32 = zmq_sys::ZMQ_IPV6 as i32;

/// The engine's thread-local error state.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LibZmq;

impl ErrorSource for LibZmq {
    fn last_error(&self) -> i32 {
        unsafe { zmq_sys::zmq_errno() }
    }

    fn describe(&self, code: i32) -> String {
        let text = unsafe { zmq_sys::zmq_strerror(code) };
        if text.is_null() {
            return format!("error {code}");
        }
        // SAFETY: zmq_strerror returns a static NUL-terminated string
        unsafe { CStr::from_ptr(text) }.to_string_lossy().into_owned()
    }
}

/// Receive scratch message, closed when dropped.
///
/// The message lives on the heap and is initialized in place, so it never
/// moves once libzmq has seen it.
pub(crate) struct ScratchMessage {
    msg: Box<zmq_sys::zmq_msg_t>,
}

impl ScratchMessage {
    pub(crate) fn new() -> Self {
        let slot = Box::into_raw(Box::new(MaybeUninit::<zmq_sys::zmq_msg_t>::uninit()));
        // SAFETY: zmq_msg_init fully initializes the message and cannot fail;
        // MaybeUninit<T> has the layout of T, so the box is handed back as-is
        unsafe {
            zmq_sys::zmq_msg_init((*slot).as_mut_ptr());
            Self {
                msg: Box::from_raw(slot.cast::<zmq_sys::zmq_msg_t>()),
            }
        }
    }

    /// One `zmq_msg_recv` call; returns the raw result.
    pub(crate) fn recv(&mut self, socket: *mut c_void, flags: i32) -> i32 {
        unsafe { zmq_sys::zmq_msg_recv(&mut *self.msg, socket, flags) }
    }

    /// Payload of the last received frame.
    pub(crate) fn bytes(&mut self) -> &[u8] {
        // SAFETY: data/size describe the message body, valid until the next
        // recv or close, both of which need `&mut self`
        unsafe {
            let len = zmq_sys::zmq_msg_size(&*self.msg);
            let data = zmq_sys::zmq_msg_data(&mut *self.msg);
            if len == 0 || data.is_null() {
                return &[];
            }
            std::slice::from_raw_parts(data.cast::<u8>(), len)
        }
    }
}

impl Drop for ScratchMessage {
    fn drop(&mut self) {
        unsafe {
            zmq_sys::zmq_msg_close(&mut *self.msg);
        }
    }
}
