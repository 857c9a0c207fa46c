use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use log::Level;

quick_error! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum ParseSeverityError {
        Unknown(name: String) {
            display("unknown severity \"{}\"", name)
        }
    }
}

/// Severity levels, from the most verbose to the most severe.
///
/// `NotSet` is a sentinel: used as a threshold it disables severity filtering entirely.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    NotSet = -1,
    Debug = 0,
    Info = 1,
    Notice = 2,
    Warn = 3,
    Error = 4,
    Crit = 5,
    Alert = 6,
    Fatal = 7,
}

const ALL: [Severity; 9] = [
    Severity::NotSet,
    Severity::Debug,
    Severity::Info,
    Severity::Notice,
    Severity::Warn,
    Severity::Error,
    Severity::Crit,
    Severity::Alert,
    Severity::Fatal,
];

impl Severity {
    /// Returns an integer severity representation.
    #[inline]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Restores a severity from its rank, if there is such.
    pub fn from_i32(rank: i32) -> Option<Severity> {
        ALL.iter().cloned().find(|sev| sev.as_i32() == rank)
    }

    pub fn name(self) -> &'static str {
        match self {
            Severity::NotSet => "NOTSET",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Crit => "CRIT",
            Severity::Alert => "ALERT",
            Severity::Fatal => "FATAL",
        }
    }

    /// Compares two severities by their rank.
    #[inline]
    pub fn compare(a: Severity, b: Severity) -> Ordering {
        a.as_i32().cmp(&b.as_i32())
    }

    /// Checks whether a record of this severity passes the given threshold.
    ///
    /// A `NotSet` threshold acts as minus infinity, so everything passes it.
    #[inline]
    pub fn passes(self, threshold: Severity) -> bool {
        threshold == Severity::NotSet || Severity::compare(self, threshold) != Ordering::Less
    }
}

impl Default for Severity {
    fn default() -> Severity {
        Severity::NotSet
    }
}

impl Display for Severity {
    fn fmt(&self, fmt: &mut Formatter) -> Result<(), fmt::Error> {
        fmt.pad(self.name())
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(name: &str) -> Result<Severity, ParseSeverityError> {
        let upper = name.trim().to_ascii_uppercase();

        let sev = match upper.as_str() {
            "WARNING" => Severity::Warn,
            "EMERG" => Severity::Fatal,
            upper => ALL.iter().cloned().find(|sev| sev.name() == upper)
                .ok_or_else(|| ParseSeverityError::Unknown(name.to_owned()))?,
        };

        Ok(sev)
    }
}

impl From<Level> for Severity {
    fn from(level: Level) -> Severity {
        match level {
            Level::Error => Severity::Error,
            Level::Warn => Severity::Warn,
            Level::Info => Severity::Info,
            Level::Debug | Level::Trace => Severity::Debug,
        }
    }
}
