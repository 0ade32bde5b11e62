//! Timing state for a single request/response exchange.

use chrono::{DateTime, Utc};
use std::time::Instant;

/// Lifecycle phase of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Intercepted, start timestamps captured.
    Pending,
    /// Handed to the downstream service.
    Active,
    /// Response body fully sent, or abandoned by the client.
    Finished,
}

/// Start timestamps and captured client address of one exchange.
///
/// Created by the middleware when a request is intercepted and dropped once
/// the exchange has been logged. Never shared between requests.
#[derive(Debug, Clone)]
pub struct RequestTimeline {
    start_wall: DateTime<Utc>,
    start_monotonic: Instant,
    remote_address: Option<String>,
    phase: Phase,
}

impl RequestTimeline {
    /// Captures the start of an exchange.
    ///
    /// # Arguments
    ///
    /// - `remote_address` - Connection-level client address known at interception
    pub fn start(remote_address: Option<String>) -> Self {
        Self {
            start_wall: Utc::now(),
            start_monotonic: Instant::now(),
            remote_address,
            phase: Phase::Pending,
        }
    }

    pub fn start_wall(&self) -> DateTime<Utc> {
        self.start_wall
    }

    pub fn start_monotonic(&self) -> Instant {
        self.start_monotonic
    }

    pub fn remote_address(&self) -> Option<&str> {
        self.remote_address.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Marks the request as handed to downstream processing.
    pub fn activate(&mut self) {
        if self.phase == Phase::Pending {
            self.phase = Phase::Active;
        }
    }

    /// Marks the response as finished and returns the finish instant.
    ///
    /// Calling this more than once keeps the phase at [`Phase::Finished`]
    /// and returns a fresh reading each time.
    pub fn finish(&mut self) -> Instant {
        self.phase = Phase::Finished;
        Instant::now()
    }
}

/// Milliseconds elapsed between two monotonic readings, saturating at zero.
pub fn elapsed_ms(start: Instant, end: Instant) -> f64 {
    end.saturating_duration_since(start).as_secs_f64() * 1e3
}
