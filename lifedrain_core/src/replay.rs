//! Deterministic replay of a journal against a virtual clock.

use crate::journal::ScriptStep;
use crate::timer::VirtualTimer;
use crate::trace::TraceRow;
use crate::{DrainConfig, DrainEngine, Result};

/// Drives a [`DrainEngine`] from script steps, delivering the ticks a real
/// host timer would have fired.
#[derive(Debug)]
pub struct Replayer {
    engine: DrainEngine<VirtualTimer>,
    elapsed_ms: u64,
    trace: Vec<TraceRow>,
}

impl Replayer {
    pub fn new(config: DrainConfig) -> Self {
        Self {
            engine: DrainEngine::with_driver(config, VirtualTimer::new()),
            elapsed_ms: 0,
            trace: Vec::new(),
        }
    }

    pub fn apply(&mut self, step: &ScriptStep) -> Result<()> {
        match step {
            ScriptStep::Advance { advance_ms } => {
                let due = self.engine.driver_mut().advance(*advance_ms);
                self.elapsed_ms = self.elapsed_ms.saturating_add(*advance_ms);
                // Past `max` ticks every meter is already at 0
                let deliver = due.min(self.engine.store().max().unsigned_abs());
                for _ in 0..deliver {
                    self.engine.on_tick()?;
                }
                if due > 0 {
                    tracing::debug!("Delivered {} ticks after {} ms", due, advance_ms);
                }
            }
            ScriptStep::Event(event) => self.engine.handle(event.clone())?,
        }
        self.record(step.label());
        Ok(())
    }

    pub fn run<'a, I>(&mut self, steps: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a ScriptStep>,
    {
        for step in steps {
            self.apply(step)?;
        }
        Ok(())
    }

    fn record(&mut self, step: String) {
        let session = self.engine.session();
        self.trace.push(TraceRow {
            elapsed_ms: self.elapsed_ms,
            step,
            screen: session.current_screen.to_string(),
            category: self.engine.store().active_key().map(|k| k.id()),
            visible_value: self.engine.current_visible_value(),
            timer_running: self.engine.timer_running(),
            completed_pending: session.completed_pending,
        });
    }

    pub fn engine(&self) -> &DrainEngine<VirtualTimer> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut DrainEngine<VirtualTimer> {
        &mut self.engine
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn trace(&self) -> &[TraceRow] {
        &self.trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategoryKey, Event, Screen};

    fn study_script() -> Vec<ScriptStep> {
        vec![
            Event::ProfileLoaded {
                categories: vec![CategoryKey(1)],
            }
            .into(),
            Event::ScreenChanged {
                screen: Screen::Overview,
                category: Some(CategoryKey(1)),
            }
            .into(),
            ScriptStep::Advance { advance_ms: 30_000 },
            Event::ScreenChanged {
                screen: Screen::Review,
                category: Some(CategoryKey(1)),
            }
            .into(),
            Event::WorkItemPresented.into(),
            ScriptStep::Advance { advance_ms: 40_500 },
            Event::WorkItemCompleted.into(),
            ScriptStep::Advance { advance_ms: 2_000 },
            Event::WorkItemPresented.into(),
        ]
    }

    #[test]
    fn test_overview_time_does_not_drain() {
        let mut replayer = Replayer::new(DrainConfig::default());
        replayer.run(&study_script()[..3]).unwrap();

        assert_eq!(replayer.engine().current_visible_value(), Some(150));
        assert_eq!(replayer.elapsed_ms(), 30_000);
    }

    #[test]
    fn test_study_session_replay() {
        let mut replayer = Replayer::new(DrainConfig::default());
        replayer.run(&study_script()).unwrap();

        // 40 ticks at the first card, the 500 ms phase carries into 2 s -> 2 more
        // ticks, then one recovery: 150 - 42 + 22
        assert_eq!(replayer.engine().current_visible_value(), Some(130));
        assert_eq!(replayer.trace().len(), 9);

        let last = replayer.trace().last().unwrap();
        assert_eq!(last.step, "work_item_presented");
        assert_eq!(last.category, Some(1));
        assert!(last.timer_running);
        assert!(!last.completed_pending);
    }

    #[test]
    fn test_paused_time_does_not_drain() {
        let mut replayer = Replayer::new(DrainConfig::default());
        let mut script = study_script()[..4].to_vec();
        script.push(Event::TogglePause.into());
        script.push(ScriptStep::Advance { advance_ms: 60_000 });
        script.push(Event::TogglePause.into());
        script.push(ScriptStep::Advance { advance_ms: 5_000 });
        replayer.run(&script).unwrap();

        assert_eq!(replayer.engine().current_visible_value(), Some(145));
    }

    #[test]
    fn test_huge_advance_empties_meter_without_overflow() {
        let mut replayer = Replayer::new(DrainConfig::default());
        let mut script = study_script()[..5].to_vec();
        script.push(ScriptStep::Advance { advance_ms: 500 });
        script.push(ScriptStep::Advance {
            advance_ms: u64::MAX,
        });
        replayer.run(&script).unwrap();

        assert_eq!(replayer.engine().current_visible_value(), Some(0));
        assert_eq!(replayer.elapsed_ms(), u64::MAX);
        assert!(replayer.engine().timer_running());
    }

    #[test]
    fn test_long_advance_delivers_at_most_max_ticks() {
        let mut replayer = Replayer::new(DrainConfig::default());
        let mut script = study_script()[..5].to_vec();
        script.push(ScriptStep::Advance {
            advance_ms: 1_000_000_000_000_000,
        });
        replayer.run(&script).unwrap();

        assert_eq!(replayer.engine().current_visible_value(), Some(0));
        assert_eq!(replayer.elapsed_ms(), 30_000 + 1_000_000_000_000_000);
    }
}
