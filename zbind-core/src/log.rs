//! Error-log side channel.
//!
//! Teardown paths (socket close, context termination) must never fail, so
//! unexpected errors there are reported through an [`ErrorLog`] instead.

use std::sync::Arc;

/// Callback receiving teardown failures.
pub type ErrorLog = Arc<dyn Fn(&str) + Send + Sync>;

/// The default log: forwards to `tracing` at error level.
pub fn default_error_log() -> ErrorLog {
    Arc::new(|message: &str| tracing::error!("{message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_custom_log_receives_messages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let log: ErrorLog = Arc::new(move |message: &str| sink.lock().unwrap().push(message.to_string()));

        log("close failed");
        default_error_log()("ignored by the test subscriber");
        assert_eq!(*seen.lock().unwrap(), ["close failed"]);
    }
}
