#![no_main]

use libfuzzer_sys::fuzz_target;
use std::cell::RefCell;
use zbind_core::codec::{self, RawOptions};
use zbind_core::option::{self, OptionShape};
use zbind_core::policy::ErrorSource;

// The engine side writes an arbitrary (possibly oversized) length back.
struct Hostile {
    reply: RefCell<Vec<u8>>,
    claimed: usize,
}

impl ErrorSource for Hostile {
    fn last_error(&self) -> i32 {
        0
    }

    fn describe(&self, code: i32) -> String {
        format!("error {code}")
    }
}

impl RawOptions for Hostile {
    fn set_option_raw(&self, _code: i32, _value: Option<&[u8]>) -> i32 {
        0
    }

    fn get_option_raw(&self, _code: i32, value: &mut [u8], size: &mut usize) -> i32 {
        let reply = self.reply.borrow();
        let n = reply.len().min(value.len());
        value[..n].copy_from_slice(&reply[..n]);
        *size = self.claimed;
        0
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let descriptor = &option::ALL[usize::from(selector) % option::ALL.len()];
    let target = Hostile {
        reply: RefCell::new(rest.to_vec()),
        claimed: rest.len().saturating_mul(usize::from(selector & 3)),
    };

    match descriptor.shape {
        OptionShape::Int32 => {
            let _ = codec::get_i32(&target, descriptor);
        }
        OptionShape::Int64 => {
            let _ = codec::get_i64(&target, descriptor);
        }
        OptionShape::UInt64 => {
            let _ = codec::get_u64(&target, descriptor);
        }
        OptionShape::Bytes(width) => {
            if let Ok(value) = codec::get_bytes(&target, descriptor) {
                assert!(value.len() <= width.max());
            }
            let _ = codec::set_bytes(&target, descriptor, rest);
        }
        OptionShape::Str(width) => {
            if let Ok(value) = codec::get_str(&target, descriptor) {
                assert!(!value.contains('\0'));
                assert!(value.len() <= (width.max() + 1) * 3);
            }
            let _ = codec::set_str(&target, descriptor, std::str::from_utf8(rest).ok());
        }
    }
});
