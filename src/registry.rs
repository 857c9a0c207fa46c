use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use crate::factory::{self, Factory};
use crate::layout::{BasicLayoutFactory, Layout, PatternLayoutFactory, SimpleLayoutFactory};
use crate::layout::pattern::ParseError;
use crate::logger::SyncLogger;
use crate::severity::{ParseSeverityError, Severity};
use crate::sink::{Dispatch, FileSinkFactory, NullSinkFactory, QueueSinkFactory, Sink,
    TermSinkFactory};

pub type Config = Value;

quick_error! {
    #[derive(Debug)]
    pub enum ConfigError {
        FieldRequired(field: &'static str) {
            display("field \"{}\" is required", field)
        }
        FieldType(field: &'static str, expected: &'static str) {
            display("field \"{}\" must be {}", field, expected)
        }
        UnknownType(ty: String) {
            display("component with type \"{}\" not found", ty)
        }
        DuplicateName(name: String) {
            display("sink \"{}\" is already registered", name)
        }
        NotFound(name: String) {
            display("sink \"{}\" is not registered", name)
        }
        LayoutRequired(name: String) {
            display("sink \"{}\" requires a layout", name)
        }
        LayoutNotSupported(name: String) {
            display("sink \"{}\" does not support layouts", name)
        }
        Severity(err: ParseSeverityError) {
            from()
            display("{}", err)
            source(err)
        }
        Pattern(err: ParseError) {
            from()
            display("invalid pattern: {}", err)
            source(err)
        }
        Io(err: io::Error) {
            from()
            display("I/O error: {}", err)
            source(err)
        }
    }
}

/// Builds sinks and layouts from configuration and owns named sinks.
///
/// Sink names are unique within a registry. Components are described by JSON objects with a
/// mandatory `type` field, for example:
///
/// ```
/// use serde_json::json;
///
/// use blacksink::{Dispatch, Registry, Severity};
///
/// let registry = Registry::new();
/// let sink = registry.sink(&json!({
///     "type": "queue",
///     "name": "audit",
///     "threshold": "warn",
///     "layout": {"type": "pattern", "pattern": "[{severity}] {message}"},
/// })).unwrap();
///
/// assert_eq!(Severity::Warn, sink.threshold());
/// assert!(registry.get("audit").is_some());
/// ```
pub struct Registry {
    layouts: HashMap<&'static str, Box<dyn Factory<Item = dyn Layout>>>,
    sinks: HashMap<&'static str, Box<dyn Factory<Item = dyn Sink>>>,
    named: RwLock<HashMap<String, Arc<dyn Sink>>>,
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}

impl Registry {
    /// Constructs a registry with all builtin sinks and layouts.
    pub fn new() -> Registry {
        let mut result = Registry::empty();

        result.add_layout(SimpleLayoutFactory);
        result.add_layout(BasicLayoutFactory);
        result.add_layout(PatternLayoutFactory);

        result.add_sink(NullSinkFactory);
        result.add_sink(TermSinkFactory);
        result.add_sink(FileSinkFactory);
        result.add_sink(QueueSinkFactory);

        result
    }

    /// Constructs a registry without any factories.
    pub fn empty() -> Registry {
        Registry {
            layouts: HashMap::new(),
            sinks: HashMap::new(),
            named: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a layout factory, replacing one with the same type.
    pub fn add_layout<F>(&mut self, factory: F)
        where F: Factory<Item = dyn Layout> + 'static
    {
        self.layouts.insert(F::ty(), Box::new(factory));
    }

    /// Registers a sink factory, replacing one with the same type.
    pub fn add_sink<F>(&mut self, factory: F)
        where F: Factory<Item = dyn Sink> + 'static
    {
        self.sinks.insert(F::ty(), Box::new(factory));
    }

    pub fn layout(&self, cfg: &Config) -> Result<Box<dyn Layout>, ConfigError> {
        let ty = factory::string(cfg, "type")?;

        self.layouts.get(ty)
            .ok_or_else(|| ConfigError::UnknownType(ty.to_owned()))?
            .from(cfg, self)
    }

    /// Builds, validates and registers a sink.
    ///
    /// Sinks requiring a layout must have one configured, while others must not.
    pub fn sink(&self, cfg: &Config) -> Result<Arc<dyn Sink>, ConfigError> {
        let ty = factory::string(cfg, "type")?;
        let name = factory::string(cfg, "name")?;

        if self.get(name).is_some() {
            return Err(ConfigError::DuplicateName(name.to_owned()));
        }

        let threshold = match factory::optional_string(cfg, "threshold")? {
            Some(threshold) => threshold.parse()?,
            None => Severity::NotSet,
        };

        let layout = match cfg.get("layout") {
            Some(layout) => Some(self.layout(layout)?),
            None => None,
        };

        let sink: Arc<dyn Sink> = self.sinks.get(ty)
            .ok_or_else(|| ConfigError::UnknownType(ty.to_owned()))?
            .from(cfg, self)?
            .into();

        let configured = match layout {
            Some(layout) => sink.set_layout(layout),
            None if sink.requires_layout() => Err(ConfigError::LayoutRequired(name.to_owned())),
            None => Ok(()),
        };

        if let Err(err) = configured {
            sink.close();
            return Err(err);
        }

        sink.set_threshold(threshold);

        self.insert(sink.clone())?;

        Ok(sink)
    }

    /// Registers an already constructed sink under its name.
    pub fn insert(&self, sink: Arc<dyn Sink>) -> Result<(), ConfigError> {
        let mut named = self.named.write().unwrap_or_else(PoisonError::into_inner);

        match named.entry(sink.name().to_owned()) {
            Entry::Occupied(..) => {
                let name = sink.name().to_owned();
                sink.close();
                Err(ConfigError::DuplicateName(name))
            }
            Entry::Vacant(entry) => {
                entry.insert(sink);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.named.read().unwrap_or_else(PoisonError::into_inner).get(name).cloned()
    }

    /// Unregisters a sink without closing it.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Sink>> {
        self.named.write().unwrap_or_else(PoisonError::into_inner).remove(name)
    }

    /// Returns registered sink names in no particular order.
    pub fn names(&self) -> Vec<String> {
        self.named.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }

    /// Reopens every registered sink, returning `true` only if all of them succeeded.
    pub fn reopen_all(&self) -> bool {
        self.snapshot().iter().fold(true, |result, sink| sink.reopen() && result)
    }

    /// Closes every registered sink. They stay registered, so dispatching into them reports
    /// `SinkClosed`.
    pub fn close_all(&self) {
        for sink in self.snapshot() {
            sink.close();
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn Sink>> {
        self.named.read().unwrap_or_else(PoisonError::into_inner).values().cloned().collect()
    }

    /// Builds a logger attached to the sinks listed in the `sinks` array.
    ///
    /// Each entry is either a sink config, which is built and registered, or a string naming an
    /// already registered sink.
    pub fn logger(&self, cfg: &Config) -> Result<SyncLogger, ConfigError> {
        let sinks = cfg.get("sinks")
            .ok_or(ConfigError::FieldRequired("sinks"))?
            .as_array()
            .ok_or(ConfigError::FieldType("sinks", "an array"))?
            .iter()
            .map(|cfg| {
                match cfg.as_str() {
                    Some(name) => self.get(name).ok_or_else(|| ConfigError::NotFound(name.to_owned())),
                    None => self.sink(cfg),
                }
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(SyncLogger::new(sinks))
    }
}
