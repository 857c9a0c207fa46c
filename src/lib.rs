//! Threshold-gated dispatch of log records into sinks.
//!
//! A record created at a call site is offered to sinks through `Dispatch::dispatch`. Each sink
//! drops records below its threshold without formatting them, formats and writes accepted ones,
//! and contains its own failures: the only error ever crossing the dispatch boundary is
//! `SinkClosed`. Everything else is reported through the `diag` channel.

#[macro_use] extern crate quick_error;

#[macro_use] mod record;
mod meta;
mod severity;
mod thread;

pub mod diag;
pub mod factory;
pub mod layout;
pub mod logger;
pub mod registry;
pub mod sink;

pub use self::factory::Factory;
pub use self::layout::Layout;
pub use self::logger::{Logger, SyncLogger};
pub use self::meta::{Meta, Value};
pub use self::record::Record;
pub use self::registry::{Config, ConfigError, Registry};
pub use self::severity::{ParseSeverityError, Severity};
pub use self::sink::{Dispatch, Outcome, Sink, SinkBase, SinkClosed};
