use std::sync::atomic::{AtomicU64, Ordering};

use crate::severity::Severity;

/// Closed flag, stored above the threshold rank.
const CLOSED: u64 = 1 << 32;
const RANK: u64 = CLOSED - 1;

/// Consistent view of a sink's threshold and lifecycle state.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Snapshot {
    pub threshold: Severity,
    pub closed: bool,
}

/// Threshold and lifecycle state shared by every sink.
///
/// Concrete sinks embed this struct and expose it through `Sink::base`. Both values are packed into
/// a single atomic word, so a dispatch always observes a threshold/state pair that was written as a
/// whole, while configuration changes never block logging threads.
#[derive(Debug)]
pub struct SinkBase {
    name: String,
    state: AtomicU64,
}

#[inline]
fn pack(threshold: Severity) -> u64 {
    threshold.as_i32() as u32 as u64
}

#[inline]
fn unpack(word: u64) -> Snapshot {
    let rank = (word & RANK) as u32 as i32;

    Snapshot {
        threshold: Severity::from_i32(rank).unwrap_or(Severity::NotSet),
        closed: word & CLOSED != 0,
    }
}

impl SinkBase {
    /// Constructs an opened base with no threshold.
    pub fn new<N: Into<String>>(name: N) -> SinkBase {
        SinkBase {
            name: name.into(),
            state: AtomicU64::new(pack(Severity::NotSet)),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn snapshot(&self) -> Snapshot {
        unpack(self.state.load(Ordering::Acquire))
    }

    #[inline]
    pub fn threshold(&self) -> Severity {
        self.snapshot().threshold
    }

    /// Replaces the current threshold, keeping the lifecycle state intact.
    pub fn set_threshold(&self, threshold: Severity) {
        let mut word = self.state.load(Ordering::Acquire);

        loop {
            let new = (word & CLOSED) | pack(threshold);

            match self.state.compare_exchange_weak(word, new, Ordering::AcqRel, Ordering::Acquire) {
                Ok(..) => break,
                Err(actual) => word = actual,
            }
        }
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.snapshot().closed
    }

    /// Marks the sink as closed.
    ///
    /// Returns `true` only for the call that actually performed the transition.
    pub fn mark_closed(&self) -> bool {
        self.state.fetch_or(CLOSED, Ordering::AcqRel) & CLOSED == 0
    }
}
