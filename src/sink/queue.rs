use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

use crate::factory::{self, Factory};
use crate::layout::Layout;
use crate::record::Record;
use crate::registry::{Config, ConfigError, Registry};

use super::{Error, LayoutCell, Sink, SinkBase};

/// Keeps formatted records in memory, so they can be consumed later.
///
/// With a capacity set the oldest message is discarded when the queue is full. Messages survive
/// closing, only new ones are not accepted.
pub struct QueueSink {
    base: SinkBase,
    capacity: Option<NonZeroUsize>,
    layout: LayoutCell,
    queue: Mutex<VecDeque<String>>,
}

impl QueueSink {
    pub fn new<N: Into<String>>(name: N) -> QueueSink {
        QueueSink::with_capacity(name, None)
    }

    pub fn with_capacity<N: Into<String>>(name: N, capacity: Option<NonZeroUsize>) -> QueueSink {
        QueueSink {
            base: SinkBase::new(name),
            capacity,
            layout: LayoutCell::new(),
            queue: Mutex::new(VecDeque::new()),
        }
    }

    /// Removes and returns the oldest message.
    pub fn pop(&self) -> Option<String> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).pop_front()
    }

    /// Removes and returns all queued messages, oldest first.
    pub fn drain(&self) -> Vec<String> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Sink for QueueSink {
    fn base(&self) -> &SinkBase {
        &self.base
    }

    fn emit(&self, rec: &Record) -> Result<(), Error> {
        let message = self.layout.format(rec)?;
        let message = String::from_utf8_lossy(&message).into_owned();

        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(capacity) = self.capacity {
            while queue.len() >= capacity.get() {
                queue.pop_front();
            }
        }
        queue.push_back(message);

        Ok(())
    }

    fn release(&self) {}

    fn requires_layout(&self) -> bool {
        true
    }

    fn set_layout(&self, layout: Box<dyn Layout>) -> Result<(), ConfigError> {
        self.layout.set(layout);
        Ok(())
    }
}

pub struct QueueSinkFactory;

impl Factory for QueueSinkFactory {
    type Item = dyn Sink;

    fn ty() -> &'static str {
        "queue"
    }

    fn from(&self, cfg: &Config, _registry: &Registry) -> Result<Box<dyn Sink>, ConfigError> {
        let name = factory::string(cfg, "name")?;
        let capacity = match factory::optional_u64(cfg, "capacity")? {
            Some(capacity) => {
                let capacity = usize::try_from(capacity).ok().and_then(NonZeroUsize::new)
                    .ok_or(ConfigError::FieldType("capacity", "a positive integer"))?;
                Some(capacity)
            }
            None => None,
        };

        Ok(Box::new(QueueSink::with_capacity(name, capacity)))
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use serde_json::json;

    use crate::{Factory, Registry, Severity};
    use crate::layout::SimpleLayout;
    use crate::registry::ConfigError;
    use crate::sink::{Dispatch, Sink};
    use super::{QueueSink, QueueSinkFactory};

    #[test]
    fn keeps_order() {
        let sink = QueueSink::new("queue");
        sink.set_layout(Box::new(SimpleLayout)).unwrap();

        sink.dispatch(&record!(Severity::Info, "first")).unwrap();
        sink.dispatch(&record!(Severity::Warn, "second")).unwrap();

        assert_eq!(2, sink.len());
        assert_eq!(Some("INFO - first".to_owned()), sink.pop());
        assert_eq!(vec!["WARN - second".to_owned()], sink.drain());
        assert!(sink.is_empty());
    }

    #[test]
    fn bounded_discards_oldest() {
        let sink = QueueSink::with_capacity("queue", NonZeroUsize::new(2));
        sink.set_layout(Box::new(SimpleLayout)).unwrap();

        for message in &["1", "2", "3"] {
            sink.dispatch(&record!(Severity::Info, message)).unwrap();
        }

        assert_eq!(vec!["INFO - 2".to_owned(), "INFO - 3".to_owned()], sink.drain());
    }

    #[test]
    fn messages_survive_close() {
        let sink = QueueSink::new("queue");
        sink.set_layout(Box::new(SimpleLayout)).unwrap();

        sink.dispatch(&record!(Severity::Info, "kept")).unwrap();
        sink.close();

        assert!(sink.dispatch(&record!(Severity::Info, "rejected")).is_err());
        assert_eq!(vec!["INFO - kept".to_owned()], sink.drain());
    }

    #[test]
    fn factory_rejects_zero_capacity() {
        let registry = Registry::empty();

        let cfg = json!({"type": "queue", "name": "queue", "capacity": 0});
        match QueueSinkFactory.from(&cfg, &registry) {
            Err(ConfigError::FieldType("capacity", ..)) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }

        let sink = QueueSinkFactory.from(&json!({"type": "queue", "name": "queue", "capacity": 1}),
            &registry).unwrap();
        sink.set_layout(Box::new(SimpleLayout)).unwrap();
        sink.dispatch(&record!(Severity::Info, "kept")).unwrap();
    }
}
