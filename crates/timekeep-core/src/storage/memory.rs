//! In-memory store.
//!
//! Default store for tests and embedding library users. A single mutex
//! guards both maps, which makes each trait method (the compound commits
//! included) atomic from the caller's point of view.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::storage::TimerStore;
use crate::timer::{TimeEntry, Timer};

#[derive(Debug, Default)]
struct Inner {
    timers: BTreeMap<String, Timer>,
    entries: BTreeMap<String, TimeEntry>,
}

/// Mutex-guarded in-memory implementation of [`TimerStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl TimerStore for MemoryStore {
    fn insert_timer(&self, timer: &Timer) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.timers.insert(timer.id.clone(), timer.clone());
        Ok(())
    }

    fn update_timer(&self, timer: &Timer) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.timers.insert(timer.id.clone(), timer.clone());
        Ok(())
    }

    fn get_timer(&self, owner: &str, timer_id: &str) -> Result<Option<Timer>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .timers
            .get(timer_id)
            .filter(|t| t.owner_id == owner)
            .cloned())
    }

    fn list_timers(&self, owner: &str) -> Result<Vec<Timer>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .timers
            .values()
            .filter(|t| t.owner_id == owner)
            .cloned()
            .collect())
    }

    fn remove_timer(&self, owner: &str, timer_id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let owned = inner
            .timers
            .get(timer_id)
            .is_some_and(|t| t.owner_id == owner);
        if owned {
            inner.timers.remove(timer_id);
            inner.entries.retain(|_, e| e.timer_id != timer_id);
        }
        Ok(())
    }

    fn get_entry(&self, owner: &str, entry_id: &str) -> Result<Option<TimeEntry>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .get(entry_id)
            .filter(|e| e.owner_id == owner)
            .cloned())
    }

    fn list_entries(&self, owner: &str) -> Result<Vec<TimeEntry>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .values()
            .filter(|e| e.owner_id == owner)
            .cloned()
            .collect())
    }

    fn open_entries(&self, owner: &str, timer_id: &str) -> Result<Vec<TimeEntry>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .values()
            .filter(|e| e.owner_id == owner && e.timer_id == timer_id && e.is_open())
            .cloned()
            .collect())
    }

    fn update_entry(&self, entry: &TimeEntry) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    fn close_entries(&self, entries: &[TimeEntry]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        for entry in entries {
            inner.entries.insert(entry.id.clone(), entry.clone());
        }
        Ok(())
    }

    fn commit_start(
        &self,
        new_timer: Option<&Timer>,
        closing: &[TimeEntry],
        opening: &TimeEntry,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if let Some(timer) = new_timer {
            inner.timers.insert(timer.id.clone(), timer.clone());
        }
        for entry in closing {
            inner.entries.insert(entry.id.clone(), entry.clone());
        }
        inner.entries.insert(opening.id.clone(), opening.clone());
        Ok(())
    }

    fn commit_end(&self, timer: &Timer, closing: &[TimeEntry]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        for entry in closing {
            inner.entries.insert(entry.id.clone(), entry.clone());
        }
        inner.timers.insert(timer.id.clone(), timer.clone());
        Ok(())
    }
}
