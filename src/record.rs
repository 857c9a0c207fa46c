use chrono::{DateTime, Utc};

use crate::meta::Meta;
use crate::severity::Severity;
use crate::thread;

/// Logging event.
///
/// A record is immutable once constructed: it is created at the call site, offered to any number
/// of sinks by shared reference and then discarded. Nothing it borrows outlives the call.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    severity: Severity,
    timestamp: DateTime<Utc>,
    message: &'a str,
    module: &'static str,
    line: u32,
    thread: usize,
    meta: &'a [Meta<'a>],
}

impl<'a> Record<'a> {
    /// Constructs a record stamped with the current time and the calling thread id.
    pub fn new(severity: Severity, message: &'a str, module: &'static str, line: u32,
        meta: &'a [Meta<'a>]) -> Record<'a>
    {
        Record::with_timestamp(severity, Utc::now(), message, module, line, meta)
    }

    pub fn with_timestamp(severity: Severity, timestamp: DateTime<Utc>, message: &'a str,
        module: &'static str, line: u32, meta: &'a [Meta<'a>]) -> Record<'a>
    {
        Record {
            severity,
            timestamp,
            message,
            module,
            line,
            thread: thread::id(),
            meta,
        }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn datetime(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[inline]
    pub fn message(&self) -> &str {
        self.message
    }

    #[inline]
    pub fn module(&self) -> &'static str {
        self.module
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn thread(&self) -> usize {
        self.thread
    }

    /// Returns a front-to-back iterator over attached meta information.
    pub fn iter(&self) -> ::std::slice::Iter<'a, Meta<'a>> {
        self.meta.iter()
    }

    /// Finds the first attribute with the given name.
    pub fn find(&self, name: &str) -> Option<&'a Meta<'a>> {
        self.meta.iter().find(|meta| meta.name == name)
    }
}

/// Constructs a record capturing the call site module and line.
///
/// Attached meta information lives on stack until the end of the enclosing statement, so a record
/// with attributes is meant to be passed directly into a dispatch call.
///
/// ```
/// #[macro_use] extern crate blacksink;
///
/// use blacksink::{Record, Severity};
///
/// fn count(rec: &Record) -> usize {
///     rec.iter().count()
/// }
///
/// fn main() {
///     let rec = record!(Severity::Warn, "disk is almost full");
///     assert_eq!(Severity::Warn, rec.severity());
///
///     assert_eq!(2, count(&record!(Severity::Warn, "disk is almost full", {
///         free: 42,
///         mount: "/var",
///     })));
/// }
/// ```
#[macro_export]
macro_rules! record (
    ($sev:expr, $message:expr, {$($name:ident: $val:expr,)*}) => {
        $crate::Record::new($sev, $message, module_path!(), line!(), &[
            $($crate::Meta::new(stringify!($name), $val)),*
        ])
    };
    ($sev:expr, $message:expr) => {
        $crate::record!($sev, $message, {})
    };
    ($sev:expr) => {
        $crate::record!($sev, "", {})
    };
);
