//! Tick-indexed scheduler of pending actions
//!
//! Actions scheduled for the same tick run in insertion order. That order
//! is the only ordering guarantee, and it is what keeps cooperating
//! processes reproducible.

use crate::action::{Action, ActionOutcome};
use crate::changes::Changes;
use crate::model::Model;
use crate::time::Tick;
use std::collections::BTreeMap;
use tracing::debug;

/// Summary of one processed tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: Tick,
    /// Actions whose condition held
    pub executed: usize,
    /// Actions whose condition did not hold
    pub skipped: usize,
    /// Executed actions with at least one rejected operation
    pub failed: usize,
}

/// Pending actions by tick
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    actions: BTreeMap<Tick, Vec<Action>>,
    current_tick: Tick,
}

impl ActionQueue {
    /// Create an empty queue at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `action` to the actions of `tick`
    pub fn schedule(&mut self, tick: Tick, action: Action) {
        debug!(tick, action = %action.id(), "Scheduled action");
        self.actions.entry(tick).or_default().push(action);
    }

    /// Schedule `delay` ticks after the current tick
    pub fn schedule_in(&mut self, delay: Tick, action: Action) {
        self.schedule(self.current_tick.saturating_add(delay), action);
    }

    /// Actions of `tick` in insertion order; empty if none are scheduled
    pub fn get_actions(&self, tick: Tick) -> &[Action] {
        self.actions.get(&tick).map(Vec::as_slice).unwrap_or_default()
    }

    /// Drop every action of `tick`
    pub fn clear_actions(&mut self, tick: Tick) {
        self.actions.remove(&tick);
    }

    /// Number of actions across all ticks
    pub fn pending_actions(&self) -> usize {
        self.actions.values().map(Vec::len).sum()
    }

    /// Ticks that have actions, ascending
    pub fn ticks(&self) -> impl Iterator<Item = Tick> + '_ {
        self.actions.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn set_current_tick(&mut self, tick: Tick) {
        self.current_tick = tick;
    }

    pub fn increment_tick(&mut self) -> Tick {
        self.current_tick += 1;
        self.current_tick
    }

    /// Run the actions of `tick` in order, then clear the tick
    pub fn process(&mut self, tick: Tick, model: &mut Model, changes: &mut Changes) -> TickReport {
        let mut report = TickReport {
            tick,
            ..TickReport::default()
        };

        for action in self.get_actions(tick) {
            match action.check_conditions(model, changes) {
                ActionOutcome::Skipped => report.skipped += 1,
                outcome => {
                    report.executed += 1;
                    if !outcome.is_success() {
                        report.failed += 1;
                    }
                }
            }
        }

        self.clear_actions(tick);
        debug!(
            tick,
            executed = report.executed,
            skipped = report.skipped,
            failed = report.failed,
            "Processed tick"
        );
        report
    }
}
