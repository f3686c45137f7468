//! Typed option codec.
//!
//! The engine takes and returns option values as untyped `(buffer, size)`
//! pairs. This module converts between those buffers and Rust values using
//! the shapes declared in [`crate::option`].
//!
//! Variable-length reads use a two-field protocol: the buffer has a bounded
//! capacity and the size cell is overwritten by the engine with the actual
//! length. Only that many bytes are ever read back.

use crate::error::{Result, ZmqError};
use crate::option::{OptionDescriptor, OptionShape, Width};
use crate::policy::{resolve, retry_if_interrupted, ErrorSource};

/// Raw option access on one native socket.
///
/// Implementations perform exactly one native call per method and report
/// failures through [`ErrorSource`].
pub trait RawOptions: ErrorSource {
    /// Set an option. `None` passes a null pointer with zero length.
    fn set_option_raw(&self, code: i32, value: Option<&[u8]>) -> i32;

    /// Get an option into `value`. `size` holds the capacity on entry and
    /// the length written by the engine on return.
    fn get_option_raw(&self, code: i32, value: &mut [u8], size: &mut usize) -> i32;
}

fn wrong_shape(option: &OptionDescriptor, wanted: &str) -> ZmqError {
    ZmqError::invalid_operation(format!("{option} holds {:?}, not {wanted}", option.shape))
}

fn ensure_scalar(option: &OptionDescriptor, expected: OptionShape) -> Result<()> {
    if option.shape == expected {
        Ok(())
    } else {
        Err(wrong_shape(option, &format!("{expected:?}")))
    }
}

fn write_raw<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: Option<&[u8]>) -> Result<()> {
    if !option.is_writable() {
        return Err(ZmqError::invalid_operation(format!("{option} is read-only")));
    }
    let rc = retry_if_interrupted(target, || target.set_option_raw(option.code, value));
    resolve(target, rc).map(|_| ())
}

fn read_raw<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: &mut [u8]) -> Result<usize> {
    if !option.is_readable() {
        return Err(ZmqError::invalid_operation(format!("{option} is write-only")));
    }
    let mut size = value.len();
    let rc = retry_if_interrupted(target, || {
        size = value.len();
        target.get_option_raw(option.code, value, &mut size)
    });
    resolve(target, rc)?;
    Ok(size.min(value.len()))
}

fn read_scalar<const N: usize, T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor) -> Result<[u8; N]> {
    let mut value = [0u8; N];
    read_raw(target, option, &mut value)?;
    Ok(value)
}

/// Set a 32-bit integer option.
pub fn set_i32<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: i32) -> Result<()> {
    ensure_scalar(option, OptionShape::Int32)?;
    write_raw(target, option, Some(&value.to_ne_bytes()))
}

/// Get a 32-bit integer option.
pub fn get_i32<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor) -> Result<i32> {
    ensure_scalar(option, OptionShape::Int32)?;
    read_scalar::<4, _>(target, option).map(i32::from_ne_bytes)
}

/// Set a boolean carried as a 32-bit integer (0 or 1).
pub fn set_bool<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: bool) -> Result<()> {
    set_i32(target, option, i32::from(value))
}

/// Get a boolean carried as a 32-bit integer; only 1 reads as true.
pub fn get_bool<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor) -> Result<bool> {
    get_i32(target, option).map(|v| v == 1)
}

/// Set a signed 64-bit option.
pub fn set_i64<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: i64) -> Result<()> {
    ensure_scalar(option, OptionShape::Int64)?;
    write_raw(target, option, Some(&value.to_ne_bytes()))
}

/// Get a signed 64-bit option.
pub fn get_i64<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor) -> Result<i64> {
    ensure_scalar(option, OptionShape::Int64)?;
    read_scalar::<8, _>(target, option).map(i64::from_ne_bytes)
}

/// Set an unsigned 64-bit option.
pub fn set_u64<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: u64) -> Result<()> {
    ensure_scalar(option, OptionShape::UInt64)?;
    write_raw(target, option, Some(&value.to_ne_bytes()))
}

/// Get an unsigned 64-bit option.
pub fn get_u64<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor) -> Result<u64> {
    ensure_scalar(option, OptionShape::UInt64)?;
    read_scalar::<8, _>(target, option).map(u64::from_ne_bytes)
}

fn check_width(option: &OptionDescriptor, width: Width, len: usize) -> Result<()> {
    if width.accepts(len) {
        return Ok(());
    }
    Err(ZmqError::invalid_argument(match width {
        Width::Exactly(n) => format!("{option}: value's size is {len}, but it must be {n}"),
        Width::UpTo(n) => format!("{option}: value's size is {len}, but it cannot be larger than {n}"),
    }))
}

/// Set a binary option.
///
/// The length is checked against the option's width before the native call.
pub fn set_bytes<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: &[u8]) -> Result<()> {
    let OptionShape::Bytes(width) = option.shape else {
        return Err(wrong_shape(option, "Bytes"));
    };
    check_width(option, width, value.len())?;
    write_raw(target, option, Some(value))
}

/// Get a binary option, truncated to the length reported by the engine.
pub fn get_bytes<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor) -> Result<Vec<u8>> {
    let OptionShape::Bytes(width) = option.shape else {
        return Err(wrong_shape(option, "Bytes"));
    };
    let mut value = vec![0u8; width.max()];
    let len = read_raw(target, option, &mut value)?;
    value.truncate(len);
    Ok(value)
}

/// Set a text option. `None` clears the option.
///
/// The buffer handed to the engine carries a terminating NUL that is not
/// counted in the length.
pub fn set_str<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor, value: Option<&str>) -> Result<()> {
    let OptionShape::Str(width) = option.shape else {
        return Err(wrong_shape(option, "Str"));
    };
    let Some(value) = value else {
        return write_raw(target, option, None);
    };
    check_width(option, width, value.len())?;
    if value.as_bytes().contains(&0) {
        return Err(ZmqError::invalid_argument(format!("{option}: value contains a NUL byte")));
    }
    let mut encoded = Vec::with_capacity(value.len() + 1);
    encoded.extend_from_slice(value.as_bytes());
    encoded.push(0);
    // the terminator sits right past the slice handed to the engine
    write_raw(target, option, Some(&encoded[..value.len()]))
}

/// Get a text option, stopping at the reported length or the first NUL.
pub fn get_str<T: RawOptions + ?Sized>(target: &T, option: &OptionDescriptor) -> Result<String> {
    let OptionShape::Str(width) = option.shape else {
        return Err(wrong_shape(option, "Str"));
    };
    let mut value = vec![0u8; width.max() + 1];
    let len = read_raw(target, option, &mut value)?;
    let text = &value[..len];
    let end = text.iter().position(|&b| b == 0).unwrap_or(text.len());
    Ok(String::from_utf8_lossy(&text[..end]).into_owned())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::RawOptions;
    use crate::policy::{ErrorSource, ERROR_RETURN};
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// In-memory option store that behaves like the engine's option calls.
    #[derive(Default)]
    pub struct FakeOptions {
        pub values: RefCell<HashMap<i32, Vec<u8>>>,
        /// Every successful set call, in order.
        pub sets: RefCell<Vec<(i32, Option<Vec<u8>>)>>,
        pub gets: Cell<usize>,
        /// Number of upcoming calls that fail with this code.
        pub fail_next: Cell<(usize, i32)>,
        pub errno: Cell<i32>,
    }

    impl FakeOptions {
        fn should_fail(&self) -> bool {
            let (count, code) = self.fail_next.get();
            if count == 0 {
                return false;
            }
            self.fail_next.set((count - 1, code));
            self.errno.set(code);
            true
        }
    }

    impl ErrorSource for FakeOptions {
        fn last_error(&self) -> i32 {
            self.errno.get()
        }

        fn describe(&self, code: i32) -> String {
            format!("fake error {code}")
        }
    }

    impl RawOptions for FakeOptions {
        fn set_option_raw(&self, code: i32, value: Option<&[u8]>) -> i32 {
            if self.should_fail() {
                return ERROR_RETURN;
            }
            self.sets.borrow_mut().push((code, value.map(<[u8]>::to_vec)));
            self.values
                .borrow_mut()
                .insert(code, value.map(<[u8]>::to_vec).unwrap_or_default());
            0
        }

        fn get_option_raw(&self, code: i32, value: &mut [u8], size: &mut usize) -> i32 {
            self.gets.set(self.gets.get() + 1);
            if self.should_fail() {
                return ERROR_RETURN;
            }
            let values = self.values.borrow();
            let stored = values.get(&code).cloned().unwrap_or_default();
            if stored.len() > *size {
                self.errno.set(22);
                return ERROR_RETURN;
            }
            value[..stored.len()].copy_from_slice(&stored);
            *size = stored.len();
            0
        }
    }
}
