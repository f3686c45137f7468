#![no_main]

use libfuzzer_sys::fuzz_target;
use std::cell::RefCell;
use std::collections::VecDeque;
use zbind_core::error::Result;
use zbind_core::monitor::{FrameSource, MonitorDecoder};
use zbind_core::policy::ErrorSource;

// Input layout: a sequence of [len: u8][more: u8][len bytes] frames.
struct Frames {
    queue: RefCell<VecDeque<(Vec<u8>, bool)>>,
    more: RefCell<bool>,
}

impl Frames {
    fn parse(mut data: &[u8]) -> Self {
        let mut queue = VecDeque::new();
        while data.len() >= 2 {
            let len = usize::from(data[0]).min(data.len() - 2);
            let more = data[1] & 1 == 1;
            queue.push_back((data[2..2 + len].to_vec(), more));
            data = &data[2 + len..];
        }
        Self {
            queue: RefCell::new(queue),
            more: RefCell::new(false),
        }
    }
}

impl FrameSource for Frames {
    fn recv_frame(&self, buffer: &mut Vec<u8>) -> Result<Option<usize>> {
        let Some((frame, more)) = self.queue.borrow_mut().pop_front() else {
            *self.more.borrow_mut() = false;
            return Ok(None);
        };
        if buffer.len() < frame.len() {
            buffer.resize(frame.len(), 0);
        }
        buffer[..frame.len()].copy_from_slice(&frame);
        *self.more.borrow_mut() = more;
        Ok(Some(frame.len()))
    }

    fn has_more(&self) -> Result<bool> {
        Ok(*self.more.borrow())
    }
}

struct Errors;

impl ErrorSource for Errors {
    fn last_error(&self) -> i32 {
        0
    }

    fn describe(&self, code: i32) -> String {
        format!("error {code}")
    }
}

fuzz_target!(|data: &[u8]| {
    let frames = Frames::parse(data);
    let mut decoder = MonitorDecoder::new();
    let mut was_stopped = false;

    while !frames.queue.borrow().is_empty() {
        if let Ok(Some(event)) = decoder.decode_next(&frames, &Errors) {
            if event.is_stopped() {
                assert!(event.endpoint.is_none());
            }
            assert_eq!(event.error.is_some(), event.is_failure());
        }
        // the stopped flag never reverts
        assert!(!was_stopped || decoder.is_stopped());
        was_stopped = decoder.is_stopped();
    }
});
