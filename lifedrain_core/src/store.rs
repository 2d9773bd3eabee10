//! Per-category meter storage with freeze/thaw of the active category.
//!
//! The store keeps one dormant [`Meter`] per category plus a single live
//! working meter that mirrors the active category. Switching categories
//! writes the live value back (freeze) before loading the next one (thaw).

use crate::{CategoryKey, Error, Meter, Result};
use std::collections::{BTreeMap, HashMap};

#[derive(Clone, Debug)]
pub struct CategoryStore {
    max: i64,
    meters: HashMap<CategoryKey, Meter>,
    active: Option<CategoryKey>,
    live: Meter,
}

impl CategoryStore {
    /// Create an empty store whose meters all share `max`.
    pub fn new(max: i64) -> Self {
        let live = Meter::new(max);
        Self {
            max: live.max(),
            meters: HashMap::new(),
            active: None,
            live,
        }
    }

    /// Register `key` at full value. Registering a known key is a no-op.
    pub fn register(&mut self, key: CategoryKey) {
        self.meters.entry(key).or_insert_with(|| {
            tracing::debug!("Registered category {}", key);
            Meter::new(self.max)
        });
    }

    pub fn contains(&self, key: CategoryKey) -> bool {
        self.meters.contains_key(&key)
    }

    /// Drop a category and its meter. The active category is frozen and
    /// deactivated first.
    pub fn remove(&mut self, key: CategoryKey) -> Option<Meter> {
        if self.active == Some(key) {
            self.freeze();
            self.active = None;
        }
        self.meters.remove(&key)
    }

    /// Switch the live meter to `key`, or to nothing.
    ///
    /// The previously active category is frozen first. An unregistered key is
    /// rejected before anything changes.
    pub fn activate(&mut self, key: Option<CategoryKey>) -> Result<()> {
        if let Some(k) = key {
            if !self.meters.contains_key(&k) {
                return Err(Error::UnknownCategory(k));
            }
        }

        self.freeze();

        match key {
            Some(k) => {
                if let Some(stored) = self.meters.get(&k) {
                    self.live.set_value(stored.value());
                }
                self.active = Some(k);
                tracing::debug!("Activated category {} at {}", k, self.live.value());
            }
            None => {
                if let Some(previous) = self.active.take() {
                    tracing::debug!("Deactivated category {}", previous);
                }
            }
        }
        Ok(())
    }

    fn freeze(&mut self) {
        if let Some(k) = self.active {
            if let Some(stored) = self.meters.get_mut(&k) {
                stored.set_value(self.live.value());
            }
        }
    }

    pub fn active_key(&self) -> Option<CategoryKey> {
        self.active
    }

    pub fn live_value(&self) -> Result<i64> {
        self.ensure_active()?;
        Ok(self.live.value())
    }

    pub fn set_live_value(&mut self, value: i64) -> Result<()> {
        self.ensure_active()?;
        self.live.set_value(value);
        Ok(())
    }

    pub fn live_increment(&mut self, delta: i64) -> Result<()> {
        self.ensure_active()?;
        self.live.increment(delta);
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        match self.active {
            Some(_) => Ok(()),
            None => Err(Error::NoActiveCategory),
        }
    }

    /// Current value of `key`, reading through to the live meter when `key`
    /// is active.
    pub fn value_of(&self, key: CategoryKey) -> Option<i64> {
        if self.active == Some(key) {
            return Some(self.live.value());
        }
        self.meters.get(&key).map(Meter::value)
    }

    /// Overwrite the value of a registered category (clamped). Returns false
    /// for unknown keys.
    pub fn set_value_of(&mut self, key: CategoryKey, value: i64) -> bool {
        match self.meters.get_mut(&key) {
            Some(stored) => {
                stored.set_value(value);
                if self.active == Some(key) {
                    self.live.set_value(value);
                }
                true
            }
            None => false,
        }
    }

    /// Every category's current value, ordered by key
    pub fn values(&self) -> BTreeMap<CategoryKey, i64> {
        self.meters
            .keys()
            .map(|&k| (k, self.value_of(k).unwrap_or(self.max)))
            .collect()
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn len(&self) -> usize {
        self.meters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meters.is_empty()
    }
}
