//! Event handler contract shared by every stage of the pipeline.

use std::sync::{Mutex, PoisonError};

use nodeweight_core::{Payload, WatchEvent};

/// Receiver of cluster add/update/delete callbacks.
///
/// Stages compose by delegation: a stage handles an event and then hands
/// the same arguments to its configured next stage.
pub trait EventHandler: Send + Sync {
    fn on_add(&self, obj: &Payload);

    fn on_update(&self, old: &Payload, new: &Payload);

    fn on_delete(&self, obj: &Payload);

    /// Route a decoded event to the matching callback.
    fn handle(&self, event: &WatchEvent) {
        match event {
            WatchEvent::Added(obj) => self.on_add(obj),
            WatchEvent::Updated { old, new } => self.on_update(old, new),
            WatchEvent::Deleted(obj) => self.on_delete(obj),
        }
    }
}

/// Terminal handler that records every event it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<WatchEvent>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, in delivery order.
    pub fn events(&self) -> Vec<WatchEvent> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of received events of the given type ("add", "update", "delete").
    pub fn count(&self, event_type: &str) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<WatchEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: WatchEvent) {
        self.lock().push(event);
    }
}

impl EventHandler for Recorder {
    fn on_add(&self, obj: &Payload) {
        self.push(WatchEvent::Added(obj.clone()));
    }

    fn on_update(&self, old: &Payload, new: &Payload) {
        self.push(WatchEvent::Updated {
            old: old.clone(),
            new: new.clone(),
        });
    }

    fn on_delete(&self, obj: &Payload) {
        self.push(WatchEvent::Deleted(obj.clone()));
    }
}
