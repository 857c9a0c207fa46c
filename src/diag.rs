//! Process-wide fallback channel for failures that must not reach the instrumented application.
//!
//! Sinks never report their own failures through themselves. By default every failure is written
//! as a single line to the standard error stream.

use std::fmt::{self, Display, Formatter};
use std::io::{self, Write};
use std::sync::{Arc, PoisonError, RwLock};

use crate::sink::Error;

/// Failure that happened below the dispatch boundary.
#[derive(Debug)]
pub enum Failure<'a> {
    /// An accepted record was not delivered.
    Emit { sink: &'a str, err: &'a Error },
    /// A sink failed to reacquire its underlying resource.
    Reopen { sink: &'a str, err: &'a Error },
    /// A closed sink was detached from its logger.
    Detached { sink: &'a str },
}

impl<'a> Failure<'a> {
    /// Returns the name of the sink this failure belongs to.
    pub fn sink(&self) -> &'a str {
        match *self {
            Failure::Emit { sink, .. } | Failure::Reopen { sink, .. } | Failure::Detached { sink } => {
                sink
            }
        }
    }
}

impl<'a> Display for Failure<'a> {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        match *self {
            Failure::Emit { sink, err } => write!(fmt, "sink \"{}\" failed to emit: {}", sink, err),
            Failure::Reopen { sink, err } => write!(fmt, "sink \"{}\" failed to reopen: {}", sink, err),
            Failure::Detached { sink } => write!(fmt, "sink \"{}\" is closed, detached", sink),
        }
    }
}

pub trait Handler: Send + Sync {
    fn handle(&self, failure: &Failure);
}

impl<F> Handler for F
    where F: Fn(&Failure) + Send + Sync
{
    fn handle(&self, failure: &Failure) {
        self(failure)
    }
}

static HANDLER: RwLock<Option<Arc<dyn Handler>>> = RwLock::new(None);

/// Replaces the process-wide failure handler.
pub fn set_handler<H: Handler + 'static>(handler: H) {
    *HANDLER.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
}

/// Restores the default handler, which writes to stderr.
pub fn reset_handler() {
    *HANDLER.write().unwrap_or_else(PoisonError::into_inner) = None;
}

/// Reports the given failure.
///
/// The handler is invoked without holding the internal lock, so it may replace itself.
pub fn report(failure: &Failure) {
    let handler = HANDLER.read().unwrap_or_else(PoisonError::into_inner).clone();

    match handler {
        Some(handler) => handler.handle(failure),
        None => {
            let stderr = io::stderr();
            let mut wr = stderr.lock();
            // Nowhere left to report to.
            let _ = writeln!(wr, "blacksink: {}", failure);
        }
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::{Mutex, Once, PoisonError};

    use super::{set_handler, Failure};

    static INSTALL: Once = Once::new();
    static FAILURES: Mutex<Vec<(String, String)>> = Mutex::new(Vec::new());

    /// Installs a capturing handler once per test binary.
    pub fn capture() {
        INSTALL.call_once(|| {
            set_handler(|failure: &Failure| {
                FAILURES.lock().unwrap_or_else(PoisonError::into_inner)
                    .push((failure.sink().to_owned(), failure.to_string()));
            });
        });
    }

    /// Returns rendered failures reported for the given sink name.
    pub fn failures(sink: &str) -> Vec<String> {
        FAILURES.lock().unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|&&(ref name, _)| name == sink)
            .map(|&(_, ref failure)| failure.clone())
            .collect()
    }
}
