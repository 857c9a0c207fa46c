use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::factory::{self, Factory};
use crate::layout::Layout;
use crate::record::Record;
use crate::registry::{Config, ConfigError, Registry};

use super::{Error, LayoutCell, Sink, SinkBase};

/// Writes formatted records, one per line, into a file.
///
/// Reopening closes the current file and opens the same path again, which makes external log
/// rotation possible: move the file away, then reopen the sink.
///
/// # Note
///
/// The file handle is guarded by a mutex, which is held both while writing a record and while
/// reopening or releasing, so no write ever observes a half-reopened file.
pub struct FileSink {
    base: SinkBase,
    path: PathBuf,
    /// Options for reopening, which never truncate: records written before a reopen are kept.
    reopen: OpenOptions,
    layout: LayoutCell,
    file: Mutex<Option<File>>,
}

impl FileSink {
    /// Opens the file at the given path for appending, creating it if required.
    pub fn new<N, P>(name: N, path: P) -> Result<FileSink, io::Error>
        where N: Into<String>,
              P: AsRef<Path>
    {
        FileSink::with_options(name, path, true, None)
    }

    /// Opens the file at the given path, truncating it unless `append` is set.
    ///
    /// Only the initial open truncates, reopening always appends.
    ///
    /// On unix the optional `mode` sets permissions of a newly created file.
    pub fn with_options<N, P>(name: N, path: P, append: bool, mode: Option<u32>) ->
        Result<FileSink, io::Error>
        where N: Into<String>,
              P: AsRef<Path>
    {
        let mut reopen = OpenOptions::new();
        reopen.create(true).append(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;

            if let Some(mode) = mode {
                reopen.mode(mode);
            }
        }
        #[cfg(not(unix))]
        let _ = mode;

        let path = path.as_ref().to_path_buf();
        let file = if append {
            reopen.open(&path)?
        } else {
            let mut options = reopen.clone();
            options.append(false).write(true).truncate(true);
            options.open(&path)?
        };

        let res = FileSink {
            base: SinkBase::new(name),
            path,
            reopen,
            layout: LayoutCell::new(),
            file: Mutex::new(Some(file)),
        };

        Ok(res)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn base(&self) -> &SinkBase {
        &self.base
    }

    fn emit(&self, rec: &Record) -> Result<(), Error> {
        let mut message = self.layout.format(rec)?;
        message.push(b'\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        match *file {
            Some(ref mut file) => file.write_all(&message)?,
            None if self.base.is_closed() => return Err(Error::Closed),
            None => return Err(Error::NotOpened),
        }

        Ok(())
    }

    fn reacquire(&self) -> Result<(), Error> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        // Closing marks the base before releasing under this lock, so a reopen racing with it
        // either sees the flag here or has its handle taken by the release.
        if self.base.is_closed() {
            return Err(Error::Closed);
        }

        // The old handle is closed before opening a new one even if the latter fails.
        *file = None;
        *file = Some(self.reopen.open(&self.path)?);

        Ok(())
    }

    fn release(&self) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(file) = file.take() {
            // Close errors are not actionable at this point.
            let _ = file.sync_all();
        }
    }

    fn requires_layout(&self) -> bool {
        true
    }

    fn set_layout(&self, layout: Box<dyn Layout>) -> Result<(), ConfigError> {
        self.layout.set(layout);
        Ok(())
    }
}

pub struct FileSinkFactory;

impl Factory for FileSinkFactory {
    type Item = dyn Sink;

    fn ty() -> &'static str {
        "file"
    }

    fn from(&self, cfg: &Config, _registry: &Registry) -> Result<Box<dyn Sink>, ConfigError> {
        let name = factory::string(cfg, "name")?;
        let path = factory::string(cfg, "path")?;
        let append = factory::optional_bool(cfg, "append")?.unwrap_or(true);
        let mode = match factory::optional_u64(cfg, "mode")? {
            Some(mode) => Some(u32::try_from(mode)
                .map_err(|_| ConfigError::FieldType("mode", "a 32-bit unsigned integer"))?),
            None => None,
        };

        let res = FileSink::with_options(name, path, append, mode)?;

        Ok(Box::new(res))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use std::sync::PoisonError;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::{Factory, Outcome, Registry, Severity};
    use crate::diag::testing;
    use crate::layout::SimpleLayout;
    use crate::registry::ConfigError;
    use crate::sink::{Dispatch, Error, Sink};
    use super::{FileSink, FileSinkFactory};

    fn sink(dir: &TempDir, name: &str) -> FileSink {
        let sink = FileSink::new(name, dir.path().join("app.log")).unwrap();
        sink.set_layout(Box::new(SimpleLayout)).unwrap();
        sink
    }

    #[test]
    fn write_lines() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir, "file-write");
        sink.set_threshold(Severity::Warn);

        sink.dispatch(&record!(Severity::Info, "skipped")).unwrap();
        sink.dispatch(&record!(Severity::Warn, "first")).unwrap();
        sink.dispatch(&record!(Severity::Error, "second")).unwrap();

        assert_eq!("WARN - first\nERROR - second\n",
            fs::read_to_string(sink.path()).unwrap());
    }

    #[test]
    fn truncate_unless_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "stale\n").unwrap();

        let sink = FileSink::with_options("file-truncate", &path, false, None).unwrap();
        sink.set_layout(Box::new(SimpleLayout)).unwrap();
        sink.dispatch(&record!(Severity::Info, "fresh")).unwrap();

        assert_eq!("INFO - fresh\n", fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn reopen_keeps_records_of_truncated_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "stale\n").unwrap();

        let sink = FileSink::with_options("file-truncate-reopen", &path, false, None).unwrap();
        sink.set_layout(Box::new(SimpleLayout)).unwrap();

        sink.dispatch(&record!(Severity::Error, "before reopen")).unwrap();
        assert!(sink.reopen());
        sink.dispatch(&record!(Severity::Error, "after reopen")).unwrap();

        assert_eq!("ERROR - before reopen\nERROR - after reopen\n",
            fs::read_to_string(&path).unwrap());
    }

    #[test]
    fn reacquire_after_close_keeps_file_released() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir, "file-reacquire-closed");

        // The interleaving of a reopen that passed the closed check right before a close.
        sink.close();

        match sink.reacquire() {
            Err(Error::Closed) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(sink.file.lock().unwrap_or_else(PoisonError::into_inner).is_none());
    }

    #[test]
    fn factory_rejects_out_of_range_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let cfg = json!({
            "type": "file",
            "name": "file-mode",
            "path": path.to_str().unwrap(),
            "mode": 1u64 << 32,
        });

        match FileSinkFactory.from(&cfg, &Registry::empty()) {
            Err(ConfigError::FieldType("mode", ..)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        assert!(!path.exists());
    }

    #[test]
    fn reopen_after_rotation() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir, "file-rotate");
        let rotated = dir.path().join("app.log.1");

        sink.dispatch(&record!(Severity::Info, "before")).unwrap();
        fs::rename(sink.path(), &rotated).unwrap();

        assert!(sink.reopen());
        sink.dispatch(&record!(Severity::Info, "after")).unwrap();

        assert_eq!("INFO - before\n", fs::read_to_string(&rotated).unwrap());
        assert_eq!("INFO - after\n", fs::read_to_string(sink.path()).unwrap());
    }

    #[test]
    fn reopen_failure_degrades_but_keeps_sink_open() {
        testing::capture();

        let dir = TempDir::new().unwrap();
        let sink = sink(&dir, "file-deleted");
        sink.set_threshold(Severity::Info);

        fs::remove_dir_all(dir.path()).unwrap();

        assert!(!sink.reopen());
        assert!(!sink.is_closed());
        assert_eq!("file-deleted", sink.name());
        assert_eq!(Severity::Info, sink.threshold());

        assert_eq!(Ok(Outcome::Failed), sink.dispatch(&record!(Severity::Error, "lost")));

        let failures = testing::failures("file-deleted");
        assert_eq!(2, failures.len());
        assert!(failures[0].starts_with("sink \"file-deleted\" failed to reopen: I/O error:"));
        assert_eq!("sink \"file-deleted\" failed to emit: underlying resource is not opened",
            failures[1]);
    }

    #[test]
    fn closed_sink_releases_file() {
        let dir = TempDir::new().unwrap();
        let sink = sink(&dir, "file-close");

        sink.close();
        sink.close();

        assert!(sink.dispatch(&record!(Severity::Fatal)).is_err());
        assert!(!sink.reopen());
        assert_eq!("", fs::read_to_string(sink.path()).unwrap());
    }
}
