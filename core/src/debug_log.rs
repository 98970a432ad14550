//! Deduplicated debug logging.
//!
//! Grounded on the teacher's file-based `debug_log!` (global, write-once
//! log file) but consolidated into an owned field on [`crate::Mapper`] per
//! the Design Notes in spec §9: identical consecutive messages are
//! suppressed for 1200ms, and the *decision* to suppress is preserved
//! without preserving the teacher's exact suppression scheme (global
//! statics).

use std::time::{Duration, Instant};

const SUPPRESS_WINDOW: Duration = Duration::from_millis(1200);

#[derive(Debug, Default)]
pub struct DedupLog {
    last_message: Option<String>,
    last_emitted_at: Option<Instant>,
}

impl DedupLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `msg` unless it is identical to the last message emitted within
    /// the suppression window.
    pub fn emit(&mut self, now: Instant, msg: impl Into<String>) {
        let msg = msg.into();
        if let (Some(last), Some(at)) = (&self.last_message, self.last_emitted_at) {
            if *last == msg && now.duration_since(at) < SUPPRESS_WINDOW {
                return;
            }
        }
        tracing::debug!(target: "mapper_core", "{msg}");
        self.last_message = Some(msg);
        self.last_emitted_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suppresses_identical_consecutive_messages() {
        let mut log = DedupLog::new();
        let t0 = Instant::now();
        log.emit(t0, "hello");
        assert_eq!(log.last_message.as_deref(), Some("hello"));
        let first_emit = log.last_emitted_at;

        log.emit(t0 + Duration::from_millis(500), "hello");
        assert_eq!(log.last_emitted_at, first_emit, "suppressed duplicate should not update timestamp");
    }

    #[test]
    fn re_emits_after_window_elapses() {
        let mut log = DedupLog::new();
        let t0 = Instant::now();
        log.emit(t0, "hello");
        let later = t0 + Duration::from_millis(1300);
        log.emit(later, "hello");
        assert_eq!(log.last_emitted_at, Some(later));
    }

    #[test]
    fn distinct_messages_always_emit() {
        let mut log = DedupLog::new();
        let t0 = Instant::now();
        log.emit(t0, "a");
        log.emit(t0, "b");
        assert_eq!(log.last_message.as_deref(), Some("b"));
    }
}
