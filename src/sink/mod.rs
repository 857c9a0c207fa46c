//! Sinks are responsible for delivering accepted records to their destination.
//!
//! Every sink consists of two parts. `SinkBase` holds the threshold and lifecycle state, and the
//! `Sink` trait lists the hooks a concrete destination implements: emitting a record, reacquiring
//! and releasing the underlying resource. The entry points callers use live in `Dispatch`, which is
//! implemented once for every sink, so filtering and the closed-state guard can never be skipped
//! or altered by an implementation.

use std::error;
use std::fmt::{self, Display, Formatter};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{PoisonError, RwLock};

use crate::diag::{self, Failure};
use crate::layout::{self, Layout};
use crate::record::Record;
use crate::registry::ConfigError;
use crate::severity::Severity;

mod base;
mod file;
mod null;
mod queue;
mod term;

pub use self::base::{SinkBase, Snapshot};
pub use self::file::{FileSink, FileSinkFactory};
pub use self::null::{NullSink, NullSinkFactory};
pub use self::queue::{QueueSink, QueueSinkFactory};
pub use self::term::{Stream, TermSink, TermSinkFactory};

quick_error! {
    /// Reasons an accepted record failed to reach its destination, or a resource failed to be
    /// reacquired.
    #[derive(Debug)]
    pub enum Error {
        Io(err: io::Error) {
            from()
            display("I/O error: {}", err)
            source(err)
        }
        Layout(err: layout::Error) {
            from()
            display("layout error: {}", err)
            source(err)
        }
        NoLayout {
            display("no layout attached")
        }
        NotOpened {
            display("underlying resource is not opened")
        }
        Closed {
            display("sink is closed")
        }
        Panic(message: String) {
            display("emit panicked: {}", message)
        }
    }
}

impl Error {
    fn panic(payload: Box<dyn Any + Send>) -> Error {
        let message = match payload.downcast::<String>() {
            Ok(message) => *message,
            Err(payload) => match payload.downcast_ref::<&'static str>() {
                Some(message) => (*message).to_owned(),
                None => "unknown cause".to_owned(),
            },
        };

        Error::Panic(message)
    }
}

/// Dispatching into a closed sink.
///
/// This is the only condition crossing the dispatch boundary, because it indicates a lifecycle bug
/// on the caller side rather than a problem with the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkClosed {
    name: String,
}

impl SinkClosed {
    pub fn new<N: Into<String>>(name: N) -> SinkClosed {
        SinkClosed { name: name.into() }
    }

    /// Returns the name of the closed sink.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for SinkClosed {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        write!(fmt, "sink \"{}\" is closed", self.name)
    }
}

impl error::Error for SinkClosed {}

/// What happened to a dispatched record.
///
/// None of these are errors: filtering is the expected outcome for records below threshold, and
/// emission failures are already reported through the diagnostic channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The record was below the threshold and dropped without being formatted.
    Filtered,
    /// The record was formatted and written.
    Emitted,
    /// The record was accepted, but the emission failed.
    Failed,
}

/// Hooks implemented by concrete sinks.
///
/// Apart from `base`, `requires_layout` and `set_layout` these are never called directly: `emit`
/// bypasses the closed guard and the threshold, and `release` leaves an open sink without its
/// resource. Go through `Dispatch` instead.
pub trait Sink: Send + Sync {
    /// Returns the threshold and lifecycle holder this sink embeds.
    fn base(&self) -> &SinkBase;

    /// Formats and writes an accepted record.
    ///
    /// Called by `Dispatch::dispatch` only, for open sinks and records passing the threshold,
    /// possibly from many threads at once. A panic here is caught and reported as an emission
    /// failure.
    #[doc(hidden)]
    fn emit(&self, rec: &Record) -> Result<(), Error>;

    /// Releases and acquires again the underlying resource, like a file or a socket.
    ///
    /// Called by `Dispatch::reopen` only. Sinks without a resource keep this default, others
    /// must fail with `Error::Closed` once the base is closed.
    #[doc(hidden)]
    fn reacquire(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Releases all resources. Called by `Dispatch::close` exactly once, on the first close.
    #[doc(hidden)]
    fn release(&self);

    /// Whether this sink needs a layout attached before use.
    fn requires_layout(&self) -> bool;

    /// Attaches the given layout, replacing the current one.
    fn set_layout(&self, layout: Box<dyn Layout>) -> Result<(), ConfigError>;
}

/// Sink entry points, shared by every sink implementation.
///
/// This trait is implemented for all `Sink` types and can not be implemented manually.
pub trait Dispatch: Sink {
    fn name(&self) -> &str;

    fn threshold(&self) -> Severity;

    /// Changes the threshold. Takes effect on the next dispatch.
    fn set_threshold(&self, threshold: Severity);

    fn is_closed(&self) -> bool;

    /// Offers the given record to this sink.
    fn dispatch(&self, rec: &Record) -> Result<Outcome, SinkClosed>;

    /// Reopens the underlying resource, keeping the name, threshold and attachments.
    ///
    /// Returns `false` if the resource could not be reacquired, the failure itself is reported
    /// through the diagnostic channel. A closed sink is never resurrected: reopening it is a no-op
    /// that reports failure.
    fn reopen(&self) -> bool;

    /// Closes this sink, releasing its resources. Subsequent calls are no-op.
    fn close(&self);
}

impl<T: Sink + ?Sized> Dispatch for T {
    #[inline]
    fn name(&self) -> &str {
        self.base().name()
    }

    #[inline]
    fn threshold(&self) -> Severity {
        self.base().threshold()
    }

    #[inline]
    fn set_threshold(&self, threshold: Severity) {
        self.base().set_threshold(threshold)
    }

    #[inline]
    fn is_closed(&self) -> bool {
        self.base().is_closed()
    }

    fn dispatch(&self, rec: &Record) -> Result<Outcome, SinkClosed> {
        let base = self.base();
        let snapshot = base.snapshot();

        if snapshot.closed {
            return Err(SinkClosed::new(base.name()));
        }

        if !rec.severity().passes(snapshot.threshold) {
            return Ok(Outcome::Filtered);
        }

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.emit(rec)))
            .unwrap_or_else(|payload| Err(Error::panic(payload)));

        match result {
            Ok(()) => Ok(Outcome::Emitted),
            Err(err) => {
                diag::report(&Failure::Emit { sink: base.name(), err: &err });
                Ok(Outcome::Failed)
            }
        }
    }

    fn reopen(&self) -> bool {
        let base = self.base();

        let result = if base.is_closed() {
            Err(Error::Closed)
        } else {
            self.reacquire()
        };

        match result {
            Ok(()) => true,
            Err(err) => {
                diag::report(&Failure::Reopen { sink: base.name(), err: &err });
                false
            }
        }
    }

    fn close(&self) {
        if self.base().mark_closed() {
            self.release();
        }
    }
}

/// Layout slot for sinks that format records, replaceable at runtime.
#[derive(Default)]
pub struct LayoutCell {
    layout: RwLock<Option<Box<dyn Layout>>>,
}

impl LayoutCell {
    pub fn new() -> LayoutCell {
        LayoutCell::default()
    }

    pub fn set(&self, layout: Box<dyn Layout>) {
        *self.layout.write().unwrap_or_else(PoisonError::into_inner) = Some(layout);
    }

    pub fn is_set(&self) -> bool {
        self.layout.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Formats the given record into a fresh buffer.
    pub fn format(&self, rec: &Record) -> Result<Vec<u8>, Error> {
        let layout = self.layout.read().unwrap_or_else(PoisonError::into_inner);

        match *layout {
            Some(ref layout) => {
                let mut buf = Vec::with_capacity(128);
                layout.format(rec, &mut buf)?;
                Ok(buf)
            }
            None => Err(Error::NoLayout),
        }
    }
}
