use std::io::Write;

use crate::factory::Factory;
use crate::layout::{Error, Layout};
use crate::record::Record;
use crate::registry::{Config, ConfigError, Registry};

/// Renders `SEVERITY - message`.
#[derive(Debug, Copy, Clone, Default)]
pub struct SimpleLayout;

impl Layout for SimpleLayout {
    fn format(&self, rec: &Record, wr: &mut dyn Write) -> Result<(), Error> {
        write!(wr, "{} - {}", rec.severity(), rec.message())?;
        Ok(())
    }
}

/// Renders `seconds SEVERITY module: message`, where seconds is the unix timestamp of the record.
#[derive(Debug, Copy, Clone, Default)]
pub struct BasicLayout;

impl Layout for BasicLayout {
    fn format(&self, rec: &Record, wr: &mut dyn Write) -> Result<(), Error> {
        write!(wr, "{} {} {}: {}",
            rec.datetime().timestamp(), rec.severity(), rec.module(), rec.message())?;
        Ok(())
    }
}

pub struct SimpleLayoutFactory;

impl Factory for SimpleLayoutFactory {
    type Item = dyn Layout;

    fn ty() -> &'static str {
        "simple"
    }

    fn from(&self, _cfg: &Config, _registry: &Registry) -> Result<Box<dyn Layout>, ConfigError> {
        Ok(Box::new(SimpleLayout))
    }
}

pub struct BasicLayoutFactory;

impl Factory for BasicLayoutFactory {
    type Item = dyn Layout;

    fn ty() -> &'static str {
        "basic"
    }

    fn from(&self, _cfg: &Config, _registry: &Registry) -> Result<Box<dyn Layout>, ConfigError> {
        Ok(Box::new(BasicLayout))
    }
}
