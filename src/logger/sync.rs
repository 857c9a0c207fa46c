use std::sync::{Arc, Mutex, PoisonError};

use log::{Metadata, Record as LogRecord};

use crate::diag::{self, Failure};
use crate::logger::Logger;
use crate::meta::Meta;
use crate::record::Record;
use crate::severity::Severity;
use crate::sink::{Dispatch, Sink};

type Sinks = Arc<Vec<Arc<dyn Sink>>>;

/// Blocking, but still fast, thread-safe reloadable synchronous logger.
///
/// Represents a logger, which handles incoming records by sequentially offering them to the
/// attached sinks. Each dispatch happens on a snapshot of the sink list, so attaching, detaching
/// or resetting sinks concurrently with logging is safe and never blocks on sink I/O.
///
/// A sink found closed while dispatching is detached from the logger and the detachment is
/// reported through the diagnostic channel.
#[derive(Clone)]
pub struct SyncLogger {
    sinks: Arc<Mutex<Sinks>>,
}

impl SyncLogger {
    pub fn new(sinks: Vec<Arc<dyn Sink>>) -> SyncLogger {
        SyncLogger {
            sinks: Arc::new(Mutex::new(Arc::new(sinks))),
        }
    }

    /// Replaces all attached sinks with the given ones.
    pub fn reset(&self, sinks: Vec<Arc<dyn Sink>>) {
        *self.sinks.lock().unwrap_or_else(PoisonError::into_inner) = Arc::new(sinks);
    }

    pub fn attach(&self, sink: Arc<dyn Sink>) {
        self.update(|sinks| sinks.push(sink));
    }

    /// Detaches all sinks with the given name, returning whether there were any.
    pub fn detach(&self, name: &str) -> bool {
        let mut detached = false;
        self.update(|sinks| {
            let len = sinks.len();
            sinks.retain(|sink| sink.name() != name);
            detached = sinks.len() != len;
        });

        detached
    }

    /// Returns a snapshot of currently attached sinks.
    pub fn sinks(&self) -> Sinks {
        self.sinks.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn update<F>(&self, f: F)
        where F: FnOnce(&mut Vec<Arc<dyn Sink>>)
    {
        let mut sinks = self.sinks.lock().unwrap_or_else(PoisonError::into_inner);
        let mut updated = sinks.as_ref().clone();
        f(&mut updated);
        *sinks = Arc::new(updated);
    }
}

impl Logger for SyncLogger {
    fn enabled(&self, severity: Severity) -> bool {
        self.sinks().iter().any(|sink| {
            let snapshot = sink.base().snapshot();
            !snapshot.closed && severity.passes(snapshot.threshold)
        })
    }

    fn log(&self, rec: &Record) {
        for sink in self.sinks().iter() {
            if let Err(err) = sink.dispatch(rec) {
                if self.detach(err.name()) {
                    diag::report(&Failure::Detached { sink: err.name() });
                }
            }
        }
    }
}

/// Integration with the `log` facade.
///
/// ```
/// use std::sync::Arc;
///
/// use blacksink::SyncLogger;
/// use blacksink::sink::{NullSink, Sink};
///
/// let sink: Arc<dyn Sink> = Arc::new(NullSink::new("null"));
/// let logger = SyncLogger::new(vec![sink]);
///
/// log::set_boxed_logger(Box::new(logger)).unwrap();
/// log::set_max_level(log::LevelFilter::Trace);
///
/// log::info!("nginx/1.6 configured");
/// ```
impl log::Log for SyncLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    fn log(&self, record: &LogRecord) {
        let severity = Severity::from(record.level());
        if !Logger::enabled(self, severity) {
            return;
        }

        let message = record.args().to_string();
        let meta = [Meta::new("target", record.target())];
        let rec = Record::new(severity, &message, record.module_path_static().unwrap_or(""),
            record.line().unwrap_or(0), &meta);

        Logger::log(self, &rec);
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use log::Log;

    use crate::{Dispatch, Logger, Severity};
    use crate::diag::testing;
    use crate::layout::PatternLayout;
    use crate::sink::{NullSink, QueueSink, Sink};
    use super::SyncLogger;

    fn queue(name: &str, pattern: &str) -> Arc<QueueSink> {
        let sink = QueueSink::new(name);
        sink.set_layout(Box::new(PatternLayout::new(pattern).unwrap())).unwrap();
        Arc::new(sink)
    }

    #[test]
    fn log_only_message() {
        let log = SyncLogger::new(vec![]);

        log!(log, Severity::Info, "file does not exist: /var/www/favicon.ico");
    }

    #[test]
    fn log_fans_out_to_every_sink() {
        let first = queue("first", "{message}");
        let second = queue("second", "{severity}: {message}");
        second.set_threshold(Severity::Error);

        let log = SyncLogger::new(vec![first.clone(), second.clone()]);

        log!(log, Severity::Warn, "{} {} HTTP/1.1 {} {}", "GET", "/static/image.png", 404, 347);
        log!(log, Severity::Error, "file does not exist: {}", ["/var/www/favicon.ico"]);

        assert_eq!(vec![
            "GET /static/image.png HTTP/1.1 404 347".to_owned(),
            "file does not exist: /var/www/favicon.ico".to_owned(),
        ], first.drain());
        assert_eq!(vec!["ERROR: file does not exist: /var/www/favicon.ico".to_owned()],
            second.drain());
    }

    #[test]
    fn log_macro_with_meta() {
        let sink = queue("meta", "{message} [{...}]");
        let log = SyncLogger::new(vec![sink.clone()]);

        log!(log, Severity::Info, "nginx/1.6 configured", {
            config: "/etc/nginx/nginx.conf",
            elapsed: 42.15,
        });

        log!(log, Severity::Error, "file does not exist: {}", ["/var/www/favicon.ico"], {
            cache: true,
            version: 1,
        });

        assert_eq!(vec![
            "nginx/1.6 configured [config: /etc/nginx/nginx.conf, elapsed: 42.15]".to_owned(),
            "file does not exist: /var/www/favicon.ico [cache: true, version: 1]".to_owned(),
        ], sink.drain());
    }

    #[test]
    fn enabled_reflects_sink_thresholds() {
        let sink = Arc::new(NullSink::new("null"));
        sink.set_threshold(Severity::Warn);

        let log = SyncLogger::new(vec![sink.clone()]);
        assert!(!Logger::enabled(&log, Severity::Info));
        assert!(Logger::enabled(&log, Severity::Warn));

        sink.close();
        assert!(!Logger::enabled(&log, Severity::Fatal));
        assert!(!Logger::enabled(&SyncLogger::new(vec![]), Severity::Fatal));
    }

    #[test]
    fn closed_sinks_are_detached() {
        testing::capture();

        let closed = queue("logger-closed", "{message}");
        let alive = queue("logger-alive", "{message}");
        let log = SyncLogger::new(vec![closed.clone(), alive.clone()]);

        closed.close();
        log!(log, Severity::Info, "first");
        log!(log, Severity::Info, "second");

        assert_eq!(1, log.sinks().len());
        assert_eq!(vec!["first".to_owned(), "second".to_owned()], alive.drain());
        assert_eq!(vec!["sink \"logger-closed\" is closed, detached".to_owned()],
            testing::failures("logger-closed"));
    }

    #[test]
    fn log_after_clone_and_reset() {
        let sink = queue("reset", "{message}");
        let log1 = SyncLogger::new(vec![]);
        let log2 = log1.clone();

        log2.reset(vec![sink.clone()]);

        log!(log1, Severity::Info, "first");
        log!(log2, Severity::Info, "second");
        assert_eq!(2, sink.len());

        assert!(log1.detach("reset"));
        assert!(!log2.detach("reset"));
        log!(log2, Severity::Info, "dropped");
        assert_eq!(2, sink.len());
    }

    #[test]
    fn log_facade() {
        let sink = queue("facade", "{severity} {target}: {message}");
        let logger = SyncLogger::new(vec![sink.clone()]);

        Log::log(&logger, &log::Record::builder()
            .args(format_args!("client stopped connection"))
            .level(log::Level::Warn)
            .target("nginx")
            .build());

        assert!(Log::enabled(&logger, &log::Metadata::builder().level(log::Level::Trace).build()));
        assert_eq!(vec!["WARN nginx: client stopped connection".to_owned()], sink.drain());
    }
}
