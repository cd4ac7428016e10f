//! Headless window host.
//!
//! A [`Window`] bundles what a page script can reach: the document, the
//! location with its session history, durable storage and a timer queue. It
//! has no rendering or networking; a navigation is just a fresh `Window`.

mod history;
mod storage;
mod timers;

pub use history::History;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};
pub use timers::TimerQueue;

use core_types::{Millis, TimerId};
use dom::Document;
use url::Url;

pub struct Window<T> {
    pub document: Document,
    history: History,
    storage: Box<dyn Storage>,
    timers: TimerQueue<T>,
}

impl<T> Window<T> {
    pub fn new(document: Document, url: Url, storage: Box<dyn Storage>) -> Self {
        log::debug!(target: "platform", "window opened at {url}");
        Self {
            document,
            history: History::new(url),
            storage,
            timers: TimerQueue::new(),
        }
    }

    pub fn location(&self) -> &Url {
        self.history.current()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Resolves `target` against the current location and appends it to the
    /// session history.
    pub fn push_state(&mut self, target: &str) -> Result<(), url::ParseError> {
        let url = self.location().join(target)?;
        log::trace!(target: "platform", "pushState {url}");
        self.history.push_state(url);
        Ok(())
    }

    /// Like [`Window::push_state`] but replaces the current entry.
    pub fn replace_state(&mut self, target: &str) -> Result<(), url::ParseError> {
        let url = self.location().join(target)?;
        log::trace!(target: "platform", "replaceState {url}");
        self.history.replace_state(url);
        Ok(())
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    pub fn storage_mut(&mut self) -> &mut dyn Storage {
        self.storage.as_mut()
    }

    /// Document and storage borrowed together, for code that reads one while
    /// writing the other.
    pub fn document_and_storage(&mut self) -> (&mut Document, &mut dyn Storage) {
        (&mut self.document, self.storage.as_mut())
    }

    pub fn set_timeout(&mut self, delay: Millis, task: T) -> TimerId {
        self.timers.schedule(delay, task)
    }

    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.timers.cancel(id)
    }

    pub fn timers(&self) -> &TimerQueue<T> {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut TimerQueue<T> {
        &mut self.timers
    }

    pub fn now(&self) -> Millis {
        self.timers.now()
    }
}
