use crate::record::Record;
use crate::severity::Severity;

/// Loggers route records to the sinks attached to them.
pub trait Logger: Send + Sync {
    /// Checks whether a record of the given severity would be accepted by at least one sink.
    ///
    /// Allows to skip message formatting entirely for records nobody is interested in.
    fn enabled(&self, severity: Severity) -> bool;

    fn log(&self, rec: &Record);
}

/// Formats a message and logs it with optional meta information attached.
///
/// Nothing is formatted unless the logger is enabled for the given severity.
#[macro_export]
macro_rules! log (
    ($log:expr, $sev:expr, $fmt:expr, [$($args:tt)*], {$($name:ident: $val:expr,)*}) => {{
        let severity = $sev;
        if $crate::Logger::enabled(&$log, severity) {
            let message = format!($fmt, $($args)*);
            $crate::Logger::log(&$log, &$crate::Record::new(severity, &message, module_path!(),
                line!(), &[
                    $($crate::Meta::new(stringify!($name), $val)),*
                ]
            ));
        }
    }};
    ($log:expr, $sev:expr, $fmt:expr, {$($name:ident: $val:expr,)*}) => {{
        $crate::log!($log, $sev, $fmt, [], {$($name: $val,)*})
    }};
    ($log:expr, $sev:expr, $fmt:expr, [$($args:tt)*]) => {{
        $crate::log!($log, $sev, $fmt, [$($args)*], {})
    }};
    ($log:expr, $sev:expr, $fmt:expr, $($args:tt)*) => {{
        $crate::log!($log, $sev, $fmt, [$($args)*], {})
    }};
    ($log:expr, $sev:expr, $fmt:expr) => {{
        $crate::log!($log, $sev, $fmt, [], {})
    }};
);

// Declared after the macro to have it in scope.
mod sync;

pub use self::sync::SyncLogger;
