//! Poll interest flags and the readiness sweep.
//!
//! The native wait fills one `revents` word per descriptor. After each wait
//! the poller walks its registrations in the order they were added and hands
//! each one the readiness bits it asked for.

use crate::error::{Result, ZmqError};
use std::fmt;
use std::ops::BitOr;

/// Interval used when waiting on monitor channels alone.
pub const DRAIN_INTERVAL_MS: i64 = 100;

/// Readiness bits as the engine reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PollEvents(i16);

impl PollEvents {
    pub const EMPTY: PollEvents = PollEvents(0);
    pub const READABLE: PollEvents = PollEvents(1);
    pub const WRITABLE: PollEvents = PollEvents(2);
    pub const ERROR: PollEvents = PollEvents(4);

    pub const fn from_bits(bits: i16) -> Self {
        PollEvents(bits)
    }

    pub const fn bits(self) -> i16 {
        self.0
    }

    /// Interest mask for a registration with the given handlers.
    pub const fn interest(readable: bool, writable: bool) -> Self {
        let mut bits = 0;
        if readable {
            bits |= Self::READABLE.0;
        }
        if writable {
            bits |= Self::WRITABLE.0;
        }
        PollEvents(bits)
    }

    pub const fn is_readable(self) -> bool {
        self.0 & Self::READABLE.0 != 0
    }

    pub const fn is_writable(self) -> bool {
        self.0 & Self::WRITABLE.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Keep only the bits present in `mask`.
    pub const fn masked(self, mask: PollEvents) -> Self {
        PollEvents(self.0 & mask.0)
    }
}

impl BitOr for PollEvents {
    type Output = PollEvents;

    fn bitor(self, rhs: PollEvents) -> PollEvents {
        PollEvents(self.0 | rhs.0)
    }
}

impl fmt::Display for PollEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::with_capacity(3);
        if self.is_readable() {
            names.push("IN");
        }
        if self.is_writable() {
            names.push("OUT");
        }
        if self.0 & Self::ERROR.0 != 0 {
            names.push("ERR");
        }
        if names.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&names.join("|"))
        }
    }
}

/// One registration in a poll set.
pub trait PollTarget {
    /// Bits to wait for. Fixed for the life of the registration.
    fn interest(&self) -> PollEvents;

    /// Handle readiness; `ready` only holds bits from [`interest`](Self::interest).
    /// Readable work happens before writable work.
    fn on_ready(&mut self, ready: PollEvents) -> Result<()>;
}

/// Dispatch `revents` to `targets`, pairing them by index.
///
/// Returns how many targets had work. Targets beyond the end of `revents` are
/// treated as not ready.
pub fn sweep<T: PollTarget>(targets: &mut [T], revents: &[PollEvents]) -> Result<usize> {
    let mut fired = 0;
    for (target, ready) in targets.iter_mut().zip(revents) {
        let ready = ready.masked(target.interest());
        if ready.is_empty() {
            continue;
        }
        fired += 1;
        target.on_ready(ready)?;
    }
    Ok(fired)
}

/// Validate a caller-supplied poll timeout in milliseconds.
pub fn check_timeout(timeout_ms: i64) -> Result<i64> {
    if timeout_ms < 0 {
        return Err(ZmqError::invalid_argument(format!(
            "poll timeout must be non-negative, got {timeout_ms}"
        )));
    }
    Ok(timeout_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: &'static str,
        interest: PollEvents,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl PollTarget for Recorder {
        fn interest(&self) -> PollEvents {
            self.interest
        }

        fn on_ready(&mut self, ready: PollEvents) -> Result<()> {
            if ready.is_readable() {
                self.log.borrow_mut().push(format!("{}:in", self.name));
            }
            if ready.is_writable() {
                self.log.borrow_mut().push(format!("{}:out", self.name));
            }
            Ok(())
        }
    }

    fn recorder(name: &'static str, interest: PollEvents, log: &Rc<RefCell<Vec<String>>>) -> Recorder {
        Recorder {
            name,
            interest,
            log: Rc::clone(log),
        }
    }

    #[test]
    fn test_interest_from_handlers() {
        assert_eq!(PollEvents::interest(true, false), PollEvents::READABLE);
        assert_eq!(PollEvents::interest(false, true), PollEvents::WRITABLE);
        assert_eq!(PollEvents::interest(true, true).bits(), 3);
        assert!(PollEvents::interest(false, false).is_empty());
    }

    #[test]
    fn test_sweep_follows_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let both = PollEvents::READABLE | PollEvents::WRITABLE;
        let mut targets = vec![
            recorder("a", both, &log),
            recorder("b", PollEvents::READABLE, &log),
            recorder("c", both, &log),
        ];
        let revents = [both, both, PollEvents::WRITABLE];

        let fired = sweep(&mut targets, &revents).unwrap();
        assert_eq!(fired, 3);
        assert_eq!(*log.borrow(), ["a:in", "a:out", "b:in", "c:out"]);
    }

    #[test]
    fn test_sweep_ignores_bits_outside_interest() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut targets = vec![recorder("a", PollEvents::READABLE, &log)];

        let fired = sweep(&mut targets, &[PollEvents::WRITABLE | PollEvents::ERROR]).unwrap();
        assert_eq!(fired, 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_negative_timeout_rejected() {
        assert!(check_timeout(-1).unwrap_err().is_precondition());
        assert_eq!(check_timeout(0), Ok(0));
        assert_eq!(check_timeout(DRAIN_INTERVAL_MS), Ok(100));
    }

    #[test]
    fn test_display() {
        assert_eq!((PollEvents::READABLE | PollEvents::ERROR).to_string(), "IN|ERR");
        assert_eq!(PollEvents::EMPTY.to_string(), "-");
    }
}
