//! Drain/recovery state machine.
//!
//! The engine interprets host lifecycle events into meter mutations and
//! decides when the decay timer runs:
//! - Screen changes bank pending recovery, swap the active category and
//!   start the timer only on the review screen
//! - Presenting the next work item grants recovery for the completed one
//! - Resetting (undo) a work item claws the recovery back
//! - Every tick drains one point from the active category

use crate::timer::{DrainTimer, NullDriver, TimerDriver};
use crate::{
    CategoryKey, CategoryStore, DrainConfig, Event, MeterSnapshot, Result, Screen, SessionState,
};

/// Single-instance owner of the store, session flags and timer.
///
/// Handlers run to completion synchronously and must be called in host
/// delivery order.
#[derive(Debug)]
pub struct DrainEngine<D: TimerDriver = NullDriver> {
    config: DrainConfig,
    store: CategoryStore,
    session: SessionState,
    timer: DrainTimer<D>,
    visible: bool,
}

impl DrainEngine<NullDriver> {
    pub fn new(config: DrainConfig) -> Self {
        Self::with_driver(config, NullDriver)
    }
}

impl<D: TimerDriver> DrainEngine<D> {
    /// Create an engine whose timer is scheduled by `driver`.
    pub fn with_driver(config: DrainConfig, driver: D) -> Self {
        let config = config.normalized();
        Self {
            config,
            store: CategoryStore::new(config.max_value),
            session: SessionState::default(),
            timer: DrainTimer::new(driver, config.tick_interval_ms),
            visible: false,
        }
    }

    /// Dispatch one host event.
    pub fn handle(&mut self, event: Event) -> Result<()> {
        tracing::debug!("Handling {}", event.label());
        match event {
            Event::ProfileLoaded { categories } => {
                self.on_profile_loaded(categories);
                Ok(())
            }
            Event::ScreenChanged { screen, category } => {
                self.on_screen_changed(screen, || category)
            }
            Event::WorkItemPresented => self.on_work_item_presented(),
            Event::WorkItemCompleted => {
                self.on_work_item_completed();
                Ok(())
            }
            Event::SessionReset => self.on_session_reset(),
            Event::TogglePause => {
                self.on_toggle_pause();
                Ok(())
            }
            Event::Tick => self.on_tick(),
        }
    }

    /// Seed every known category at full value. A new profile starts from a
    /// clean store and session.
    pub fn on_profile_loaded<I>(&mut self, categories: I)
    where
        I: IntoIterator<Item = CategoryKey>,
    {
        self.timer.stop();
        self.store = CategoryStore::new(self.config.max_value);
        self.session = SessionState::default();
        self.visible = false;

        for key in categories {
            self.store.register(key);
        }
        tracing::info!("Profile loaded with {} categories", self.store.len());
    }

    /// Handle a screen transition.
    ///
    /// `resolve` yields the host's current category and is only called when
    /// the new screen is Overview or Review.
    pub fn on_screen_changed<F>(&mut self, screen: Screen, resolve: F) -> Result<()>
    where
        F: FnOnce() -> Option<CategoryKey>,
    {
        self.timer.stop();

        // Banked against the category that was live on the previous screen
        if self.session.completed_pending && screen.is_reviewing_context() {
            self.adjust_live(self.config.recover_value, "banked recovery")?;
        }
        self.session.completed_pending = false;
        self.session.current_screen = screen;

        if screen.is_reviewing_context() {
            let key = resolve();
            if let Some(k) = key {
                if !self.store.contains(k) {
                    tracing::info!("Registering category {} discovered after startup", k);
                    self.store.register(k);
                }
            }
            self.store.activate(key)?;
            self.visible = key.is_some();
        } else {
            self.visible = false;
            self.store.activate(None)?;
        }

        if screen == Screen::Review && self.store.active_key().is_some() {
            self.timer.resume();
        }
        Ok(())
    }

    /// Resume the timer and grant recovery for a completed unit, once.
    pub fn on_work_item_presented(&mut self) -> Result<()> {
        self.timer.resume();
        if self.session.take_pending() {
            self.adjust_live(self.config.recover_value, "recovery")?;
        }
        Ok(())
    }

    pub fn on_work_item_completed(&mut self) {
        self.timer.resume();
        self.session.completed_pending = true;
    }

    /// Undo: drop the pending completion and, while reviewing, claw back one
    /// recovery amount.
    pub fn on_session_reset(&mut self) -> Result<()> {
        self.session.completed_pending = false;
        if self.session.current_screen == Screen::Review {
            self.timer.resume();
            self.adjust_live(self.config.recover_value.saturating_neg(), "clawback")?;
        }
        Ok(())
    }

    pub fn on_toggle_pause(&mut self) {
        self.timer.toggle();
        tracing::debug!(
            "Drain {}",
            if self.timer.is_running() { "resumed" } else { "paused" }
        );
    }

    /// Drain one point. Ticks delivered after the timer stopped are stale and
    /// ignored.
    pub fn on_tick(&mut self) -> Result<()> {
        if !self.timer.is_running() {
            tracing::debug!("Ignoring tick while the drain timer is stopped");
            return Ok(());
        }
        self.adjust_live(-1, "drain")
    }

    fn adjust_live(&mut self, delta: i64, reason: &str) -> Result<()> {
        match self.store.active_key() {
            Some(key) => {
                self.store.live_increment(delta)?;
                tracing::debug!(
                    "Applied {} {:+} to category {} -> {}",
                    reason,
                    delta,
                    key,
                    self.store.live_value()?
                );
            }
            None => tracing::debug!("Skipped {} {:+}: no active category", reason, delta),
        }
        Ok(())
    }

    // ── Host-side management ─────────────────────────────────────────

    /// Remove a category deleted on the host side.
    pub fn remove_category(&mut self, key: CategoryKey) -> bool {
        let was_active = self.store.active_key() == Some(key);
        let removed = self.store.remove(key).is_some();
        if was_active {
            self.visible = false;
            self.timer.stop();
        }
        removed
    }

    /// Overwrite one category's value (clamped). False for unknown keys.
    pub fn set_category_value(&mut self, key: CategoryKey, value: i64) -> bool {
        self.store.set_value_of(key, value)
    }

    /// Capture every category's value, including the live one.
    pub fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot::new(self.store.values())
    }

    /// Load values from a snapshot into registered categories.
    pub fn restore(&mut self, snapshot: &MeterSnapshot) {
        for (&key, &value) in &snapshot.values {
            if !self.store.set_value_of(key, value) {
                tracing::warn!("Snapshot value for unknown category {} ignored", key);
            }
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Value for the presentation layer; `None` while the meter is hidden.
    pub fn current_visible_value(&self) -> Option<i64> {
        if self.visible {
            self.store.live_value().ok()
        } else {
            None
        }
    }

    pub fn timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn store(&self) -> &CategoryStore {
        &self.store
    }

    pub fn config(&self) -> &DrainConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        self.timer.driver()
    }

    pub fn driver_mut(&mut self) -> &mut D {
        self.timer.driver_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;

    const DECK_A: CategoryKey = CategoryKey(1);
    const DECK_B: CategoryKey = CategoryKey(2);

    fn create_test_engine() -> DrainEngine {
        crate::logging::init_test();
        let mut engine = DrainEngine::new(DrainConfig::default());
        engine.on_profile_loaded([DECK_A, DECK_B]);
        engine
    }

    fn reviewing(value: i64) -> DrainEngine {
        let mut engine = create_test_engine();
        assert!(engine.set_category_value(DECK_A, value));
        engine
            .on_screen_changed(Screen::Review, || Some(DECK_A))
            .unwrap();
        engine
    }

    fn ticks(engine: &mut DrainEngine, n: usize) {
        for _ in 0..n {
            engine.on_tick().unwrap();
        }
    }

    #[test]
    fn test_startup_state() {
        let engine = create_test_engine();

        assert_eq!(engine.store().len(), 2);
        assert_eq!(engine.store().value_of(DECK_A), Some(150));
        assert_eq!(engine.session().current_screen, Screen::None);
        assert!(!engine.session().completed_pending);
        assert!(!engine.timer_running());
        assert_eq!(engine.current_visible_value(), None);
    }

    #[test]
    fn test_drain_then_recover_from_full() {
        let mut engine = reviewing(150);

        engine.on_work_item_completed();
        ticks(&mut engine, 3);
        engine.on_work_item_presented().unwrap();

        assert_eq!(engine.current_visible_value(), Some(150));
    }

    #[test]
    fn test_drain_then_recover_from_low() {
        let mut engine = reviewing(10);

        engine.on_work_item_completed();
        ticks(&mut engine, 3);
        engine.on_work_item_presented().unwrap();

        assert_eq!(engine.current_visible_value(), Some(29));
    }

    #[test]
    fn test_negative_recover_value_lowers_meter() {
        crate::logging::init_test();
        let mut engine = DrainEngine::new(DrainConfig {
            recover_value: -5,
            ..DrainConfig::default()
        });
        engine.on_profile_loaded([DECK_A]);
        engine
            .on_screen_changed(Screen::Review, || Some(DECK_A))
            .unwrap();

        engine.on_work_item_completed();
        engine.on_work_item_presented().unwrap();
        assert_eq!(engine.current_visible_value(), Some(145));

        // Undo raises it back
        engine.on_work_item_completed();
        engine.on_session_reset().unwrap();
        assert_eq!(engine.current_visible_value(), Some(150));
    }

    #[test]
    fn test_recovery_granted_once_per_completion() {
        let mut engine = reviewing(50);

        engine.on_work_item_completed();
        engine.on_work_item_presented().unwrap();
        engine.on_work_item_presented().unwrap();
        assert_eq!(engine.current_visible_value(), Some(72));

        // Already consumed, so leaving does not bank it again
        engine
            .on_screen_changed(Screen::Overview, || Some(DECK_A))
            .unwrap();
        assert_eq!(engine.current_visible_value(), Some(72));
    }

    #[test]
    fn test_undo_clawback() {
        let mut engine = reviewing(100);

        engine.on_work_item_completed();
        engine.on_session_reset().unwrap();

        assert_eq!(engine.current_visible_value(), Some(78));
        assert!(!engine.session().completed_pending);
        assert!(engine.timer_running());
    }

    #[test]
    fn test_reset_outside_review_only_clears_pending() {
        let mut engine = reviewing(100);
        engine
            .on_screen_changed(Screen::Overview, || Some(DECK_A))
            .unwrap();

        engine.on_work_item_completed();
        engine.on_session_reset().unwrap();

        assert_eq!(engine.current_visible_value(), Some(100));
        assert!(!engine.session().completed_pending);
    }

    #[test]
    fn test_screen_exit_banking() {
        let mut engine = reviewing(50);
        engine.on_work_item_completed();
        assert!(engine.session().completed_pending);

        engine
            .on_screen_changed(Screen::Overview, || Some(DECK_A))
            .unwrap();
        assert_eq!(engine.current_visible_value(), Some(72));
        assert!(!engine.session().completed_pending);

        engine
            .on_screen_changed(Screen::Overview, || Some(DECK_A))
            .unwrap();
        assert_eq!(engine.current_visible_value(), Some(72));
    }

    #[test]
    fn test_banking_credits_previous_category() {
        let mut engine = reviewing(50);
        engine.on_work_item_completed();

        engine
            .on_screen_changed(Screen::Overview, || Some(DECK_B))
            .unwrap();

        assert_eq!(engine.store().value_of(DECK_A), Some(72));
        assert_eq!(engine.current_visible_value(), Some(150));
    }

    #[test]
    fn test_leaving_to_other_screen_does_not_bank() {
        let mut engine = reviewing(50);
        engine.on_work_item_completed();

        engine.on_screen_changed(Screen::Other, || None).unwrap();

        assert_eq!(engine.store().value_of(DECK_A), Some(50));
        assert!(!engine.session().completed_pending);
        assert_eq!(engine.current_visible_value(), None);
    }

    #[test]
    fn test_timer_lifecycle() {
        let mut engine = create_test_engine();

        engine
            .on_screen_changed(Screen::Overview, || Some(DECK_A))
            .unwrap();
        assert!(!engine.timer_running());

        engine
            .on_screen_changed(Screen::Review, || Some(DECK_A))
            .unwrap();
        assert!(engine.timer_running());

        engine.on_toggle_pause();
        assert!(!engine.timer_running());
        engine.on_toggle_pause();
        assert!(engine.timer_running());

        engine.on_screen_changed(Screen::Other, || None).unwrap();
        assert!(!engine.timer_running());

        // Toggle flips regardless of screen
        engine.on_toggle_pause();
        assert!(engine.timer_running());
    }

    #[test]
    fn test_paused_engine_ignores_ticks() {
        let mut engine = reviewing(100);
        engine.on_toggle_pause();
        ticks(&mut engine, 5);
        assert_eq!(engine.current_visible_value(), Some(100));

        engine.on_toggle_pause();
        ticks(&mut engine, 5);
        assert_eq!(engine.current_visible_value(), Some(95));
    }

    #[test]
    fn test_presented_resumes_paused_timer() {
        let mut engine = reviewing(100);
        engine.on_toggle_pause();

        engine.on_work_item_presented().unwrap();
        assert!(engine.timer_running());
    }

    #[test]
    fn test_overview_ticks_are_stale() {
        let mut engine = create_test_engine();
        engine
            .on_screen_changed(Screen::Overview, || Some(DECK_A))
            .unwrap();
        ticks(&mut engine, 10);
        assert_eq!(engine.current_visible_value(), Some(150));
    }

    #[test]
    fn test_drain_clamps_at_zero() {
        let mut engine = reviewing(2);
        ticks(&mut engine, 10);
        assert_eq!(engine.current_visible_value(), Some(0));
    }

    #[test]
    fn test_categories_drain_independently() {
        let mut engine = reviewing(150);
        ticks(&mut engine, 20);

        engine
            .on_screen_changed(Screen::Review, || Some(DECK_B))
            .unwrap();
        ticks(&mut engine, 5);

        engine
            .on_screen_changed(Screen::Review, || Some(DECK_A))
            .unwrap();
        assert_eq!(engine.current_visible_value(), Some(130));
        assert_eq!(engine.store().value_of(DECK_B), Some(145));
    }

    #[test]
    fn test_resolver_only_called_for_reviewing_screens() {
        let mut engine = create_test_engine();
        let calls = Cell::new(0);

        engine
            .on_screen_changed(Screen::Other, || {
                calls.set(calls.get() + 1);
                Some(DECK_A)
            })
            .unwrap();
        assert_eq!(calls.get(), 0);

        engine
            .on_screen_changed(Screen::Overview, || {
                calls.set(calls.get() + 1);
                Some(DECK_A)
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_category_discovered_after_startup() {
        let mut engine = create_test_engine();
        let new_deck = CategoryKey(42);

        engine
            .on_screen_changed(Screen::Review, || Some(new_deck))
            .unwrap();

        assert!(engine.store().contains(new_deck));
        assert_eq!(engine.current_visible_value(), Some(150));
        assert!(engine.timer_running());
    }

    #[test]
    fn test_review_without_category_keeps_timer_stopped() {
        let mut engine = create_test_engine();

        engine.on_screen_changed(Screen::Review, || None).unwrap();

        assert!(!engine.timer_running());
        assert_eq!(engine.current_visible_value(), None);
    }

    #[test]
    fn test_no_active_category_guard() {
        let mut engine = create_test_engine();

        // Recovery with nothing active is skipped, not an error
        engine.on_work_item_completed();
        engine.on_work_item_presented().unwrap();
        engine.on_tick().unwrap();

        let mut store = engine.store().clone();
        assert!(matches!(
            store.live_increment(-1),
            Err(Error::NoActiveCategory)
        ));
    }

    #[test]
    fn test_handle_dispatches_events() {
        crate::logging::init_test();
        let mut engine = DrainEngine::new(DrainConfig::default());
        let events = vec![
            Event::ProfileLoaded {
                categories: vec![DECK_A],
            },
            Event::ScreenChanged {
                screen: Screen::Review,
                category: Some(DECK_A),
            },
            Event::WorkItemPresented,
            Event::Tick,
            Event::Tick,
            Event::WorkItemCompleted,
            Event::SessionReset,
        ];
        for event in events {
            engine.handle(event).unwrap();
        }
        assert_eq!(engine.current_visible_value(), Some(126));
    }

    #[test]
    fn test_remove_active_category_stops_timer() {
        let mut engine = reviewing(80);
        assert!(engine.remove_category(DECK_A));
        assert!(!engine.timer_running());
        assert_eq!(engine.current_visible_value(), None);
        assert!(!engine.remove_category(DECK_A));
    }

    #[test]
    fn test_snapshot_and_restore() {
        let mut engine = reviewing(150);
        ticks(&mut engine, 7);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.values[&DECK_A], 143);

        let mut fresh = create_test_engine();
        fresh.restore(&snapshot);
        fresh
            .on_screen_changed(Screen::Review, || Some(DECK_A))
            .unwrap();
        assert_eq!(fresh.current_visible_value(), Some(143));
    }

    #[test]
    fn test_profile_reload_resets_values() {
        let mut engine = reviewing(20);
        engine.on_profile_loaded([DECK_A]);

        assert!(!engine.timer_running());
        assert_eq!(engine.store().value_of(DECK_A), Some(150));
        assert!(!engine.store().contains(DECK_B));
    }
}
