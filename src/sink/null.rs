use crate::factory::{self, Factory};
use crate::layout::Layout;
use crate::record::Record;
use crate::registry::{Config, ConfigError, Registry};

use super::{Error, Sink, SinkBase};

/// A null sink merely exists, it never outputs a record to any device.
///
/// This struct exists primarily for benchmarking reasons to measure the entire dispatching
/// pipeline. It never fails, because it does nothing. It does not use layouts and rejects any
/// attempt to attach one.
///
/// ```
/// #[macro_use] extern crate blacksink;
///
/// use blacksink::{Dispatch, Outcome, Severity};
/// use blacksink::sink::NullSink;
///
/// fn main() {
///     let sink = NullSink::new("null");
///
///     assert_eq!(Ok(Outcome::Emitted), sink.dispatch(&record!(Severity::Info)));
/// }
/// ```
#[derive(Debug)]
pub struct NullSink {
    base: SinkBase,
}

impl NullSink {
    pub fn new<N: Into<String>>(name: N) -> NullSink {
        NullSink {
            base: SinkBase::new(name),
        }
    }
}

impl Sink for NullSink {
    fn base(&self) -> &SinkBase {
        &self.base
    }

    fn emit(&self, _rec: &Record) -> Result<(), Error> {
        Ok(())
    }

    fn release(&self) {}

    fn requires_layout(&self) -> bool {
        false
    }

    fn set_layout(&self, _layout: Box<dyn Layout>) -> Result<(), ConfigError> {
        Err(ConfigError::LayoutNotSupported(self.base.name().to_owned()))
    }
}

pub struct NullSinkFactory;

impl Factory for NullSinkFactory {
    type Item = dyn Sink;

    fn ty() -> &'static str {
        "null"
    }

    fn from(&self, cfg: &Config, _registry: &Registry) -> Result<Box<dyn Sink>, ConfigError> {
        let name = factory::string(cfg, "name")?;

        Ok(Box::new(NullSink::new(name)))
    }
}
