//! Layouts render records into bytes.
//!
//! Sinks never inspect the rendered form, they only forward it to their destination.

use std::io::Write;

use crate::record::Record;

mod basic;
pub mod pattern;

pub use self::basic::{BasicLayout, BasicLayoutFactory, SimpleLayout, SimpleLayoutFactory};
pub use self::pattern::{PatternLayout, PatternLayoutFactory};

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        Io(err: ::std::io::Error) {
            from()
            display("failed to write formatted record: {}", err)
            source(err)
        }
        MetaNotFound(name: String) {
            display("attribute \"{}\" not found", name)
        }
    }
}

/// Formats a record. Must not fail for any well-formed record, except on I/O.
pub trait Layout: Send + Sync {
    fn format(&self, rec: &Record, wr: &mut dyn Write) -> Result<(), Error>;
}

impl<F> Layout for F
    where F: Fn(&Record, &mut dyn Write) -> Result<(), Error> + Send + Sync
{
    fn format(&self, rec: &Record, wr: &mut dyn Write) -> Result<(), Error> {
        self(rec, wr)
    }
}
