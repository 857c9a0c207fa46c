use std::io::{self, Write};

use crate::factory::{self, Factory};
use crate::layout::Layout;
use crate::record::Record;
use crate::registry::{Config, ConfigError, Registry};

use super::{Error, LayoutCell, Sink, SinkBase};

/// Standard stream a terminal sink writes into.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Writes formatted records, one per line, into the standard output or error stream.
///
/// The stream lock is held for the whole line, so records from concurrent threads never interleave.
pub struct TermSink {
    base: SinkBase,
    stream: Stream,
    layout: LayoutCell,
}

impl TermSink {
    pub fn new<N: Into<String>>(name: N, stream: Stream) -> TermSink {
        TermSink {
            base: SinkBase::new(name),
            stream,
            layout: LayoutCell::new(),
        }
    }

    pub fn stream(&self) -> Stream {
        self.stream
    }
}

fn write_line<W: Write>(mut wr: W, message: &[u8]) -> Result<(), io::Error> {
    wr.write_all(message)?;
    wr.write_all(b"\n")?;
    wr.flush()
}

impl Sink for TermSink {
    fn base(&self) -> &SinkBase {
        &self.base
    }

    fn emit(&self, rec: &Record) -> Result<(), Error> {
        let message = self.layout.format(rec)?;

        match self.stream {
            Stream::Stdout => write_line(io::stdout().lock(), &message)?,
            Stream::Stderr => write_line(io::stderr().lock(), &message)?,
        }

        Ok(())
    }

    fn release(&self) {
        // Standard streams are never closed, only flushed.
        let _ = match self.stream {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
        };
    }

    fn requires_layout(&self) -> bool {
        true
    }

    fn set_layout(&self, layout: Box<dyn Layout>) -> Result<(), ConfigError> {
        self.layout.set(layout);
        Ok(())
    }
}

pub struct TermSinkFactory;

impl Factory for TermSinkFactory {
    type Item = dyn Sink;

    fn ty() -> &'static str {
        "term"
    }

    fn from(&self, cfg: &Config, _registry: &Registry) -> Result<Box<dyn Sink>, ConfigError> {
        let name = factory::string(cfg, "name")?;

        let stream = match factory::optional_string(cfg, "stream")? {
            None | Some("stdout") => Stream::Stdout,
            Some("stderr") => Stream::Stderr,
            Some(..) => {
                return Err(ConfigError::FieldType("stream", "either \"stdout\" or \"stderr\""));
            }
        };

        Ok(Box::new(TermSink::new(name, stream)))
    }
}
