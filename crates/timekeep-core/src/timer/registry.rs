//! Timer registry: creation, metadata edits, finalize, remove.
//!
//! All validation happens here, before anything is staged or written.
//! Metadata edits stay legal on ended timers; only session commands are
//! inert against them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::error::{CoreError, NotFoundError, Result, ValidationError};
use crate::storage::TimerStore;
use crate::timer::model::Timer;

/// Maximum timer name length, in characters after trimming.
pub const MAX_NAME_LEN: usize = 120;

/// Maximum tag length, in characters after trimming.
pub const MAX_TAG_LEN: usize = 60;

/// Registry over a store and a clock.
pub struct TimerRegistry<'a, S: TimerStore> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: TimerStore> TimerRegistry<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Create a timer with a validated name.
    pub fn create(&self, owner: &str, name: &str) -> Result<Timer> {
        let name = validate_name(name)?;
        let timer = Timer::new(owner, name, self.clock.now());
        self.store.insert_timer(&timer)?;
        Ok(timer)
    }

    /// Rename a timer. Same validation as `create`.
    pub fn rename(&self, owner: &str, timer_id: &str, name: &str) -> Result<Timer> {
        let name = validate_name(name)?;
        let mut timer = self.fetch(owner, timer_id)?;
        timer.name = name;
        self.store.update_timer(&timer)?;
        Ok(timer)
    }

    /// Replace the tag set wholesale. Idempotent.
    pub fn set_tags<I, T>(&self, owner: &str, timer_id: &str, tags: I) -> Result<Timer>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let tags = normalize_tags(tags)?;
        let mut timer = self.fetch(owner, timer_id)?;
        timer.tags = tags;
        self.store.update_timer(&timer)?;
        Ok(timer)
    }

    /// Add one tag. Idempotent: adding a present tag changes nothing.
    pub fn add_tag(&self, owner: &str, timer_id: &str, tag: &str) -> Result<Timer> {
        let tag = validate_tag(tag)?;
        let mut timer = self.fetch(owner, timer_id)?;
        if let Some(tag) = tag {
            if timer.tags.insert(tag) {
                self.store.update_timer(&timer)?;
            }
        }
        Ok(timer)
    }

    /// Remove one tag. Idempotent: removing an absent tag changes nothing.
    pub fn remove_tag(&self, owner: &str, timer_id: &str, tag: &str) -> Result<Timer> {
        let mut timer = self.fetch(owner, timer_id)?;
        if timer.tags.remove(tag.trim()) {
            self.store.update_timer(&timer)?;
        }
        Ok(timer)
    }

    /// Finalize a timer. Duplicate calls are no-ops returning the existing
    /// timestamp.
    pub fn finalize(&self, owner: &str, timer_id: &str) -> Result<DateTime<Utc>> {
        let mut timer = self.fetch(owner, timer_id)?;
        if let Some(existing) = timer.finalized_at {
            return Ok(existing);
        }
        let now = self.clock.now();
        timer.finalized_at = Some(now);
        self.store.update_timer(&timer)?;
        Ok(now)
    }

    /// Finalize with strict semantics: a second call is a conflict.
    pub fn finalize_strict(&self, owner: &str, timer_id: &str) -> Result<DateTime<Utc>> {
        let timer = self.fetch(owner, timer_id)?;
        if timer.finalized_at.is_some() {
            return Err(CoreError::Conflict {
                message: format!("timer {timer_id} is already ended"),
            });
        }
        self.finalize(owner, timer_id)
    }

    /// Delete a timer and all of its entries.
    pub fn remove(&self, owner: &str, timer_id: &str) -> Result<()> {
        // Surface a NotFound instead of silently deleting nothing.
        self.fetch(owner, timer_id)?;
        self.store.remove_timer(owner, timer_id)?;
        Ok(())
    }

    pub fn fetch(&self, owner: &str, timer_id: &str) -> Result<Timer> {
        self.store
            .get_timer(owner, timer_id)?
            .ok_or_else(|| NotFoundError::Timer(timer_id.to_string()).into())
    }
}

/// Trim and validate a timer name.
pub(crate) fn validate_name(name: &str) -> Result<String, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            len,
            max: MAX_NAME_LEN,
        });
    }
    Ok(name.to_string())
}

/// Trim one tag; empty collapses to `None`, too long is an error.
fn validate_tag(tag: &str) -> Result<Option<String>, ValidationError> {
    let tag = tag.trim();
    if tag.is_empty() {
        return Ok(None);
    }
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(ValidationError::TagTooLong {
            tag: tag.to_string(),
            max: MAX_TAG_LEN,
        });
    }
    Ok(Some(tag.to_string()))
}

/// Normalize a tag collection: trim each, drop empties, collapse duplicates.
fn normalize_tags<I, T>(tags: I) -> Result<BTreeSet<String>, ValidationError>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut set = BTreeSet::new();
    for tag in tags {
        if let Some(tag) = validate_tag(tag.as_ref())? {
            set.insert(tag);
        }
    }
    Ok(set)
}
