// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named rendezvous barriers.
//!
//! Each orchestrator owns one [`BarrierBoard`]. Counters only ever grow: a
//! barrier name serves a single round of arrivals, and every later arrival is
//! released immediately. Use a fresh name per round.
//!
//! A barrier that never sees enough arrivals blocks its sequence forever. Wrap
//! it in a timeout where the wait must be bounded.

use crate::step::{Step, StepContext, StepStatus};
use indexmap::IndexMap;
use std::cell::RefCell;

/// Monotonic arrival counters keyed by barrier name
#[derive(Debug, Default)]
pub struct BarrierBoard {
    counters: RefCell<IndexMap<String, u32>>,
}

impl BarrierBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one arrival and return the new count
    pub fn arrive(&self, name: &str) -> u32 {
        let mut counters = self.counters.borrow_mut();
        let count = counters.entry(name.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    /// Current arrival count (zero for unknown names)
    pub fn count(&self, name: &str) -> u32 {
        self.counters.borrow().get(name).copied().unwrap_or(0)
    }

    /// All counters, in first-arrival order
    pub fn counters(&self) -> Vec<(String, u32)> {
        self.counters
            .borrow()
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect()
    }

    /// Get barrier count
    pub fn len(&self) -> usize {
        self.counters.borrow().len()
    }

    /// Check if no barrier has been signalled
    pub fn is_empty(&self) -> bool {
        self.counters.borrow().is_empty()
    }
}

/// Arrive at a named barrier and wait for the expected number of parties
#[derive(Debug, Clone)]
pub struct Barrier {
    /// Barrier name
    pub name: String,
    /// Arrivals required for release
    pub expected: u32,
    released: bool,
    waited: f32,
    warned: bool,
}

impl Barrier {
    /// Create a new barrier step
    pub fn new(name: impl Into<String>, expected: u32) -> Self {
        Self {
            name: name.into(),
            expected,
            released: false,
            waited: 0.0,
            warned: false,
        }
    }
}

impl Step for Barrier {
    fn label(&self) -> &str {
        "barrier"
    }

    fn on_enter(&mut self, ctx: &StepContext<'_>) {
        let count = ctx.orchestrator.barriers().arrive(&self.name);
        self.released = count >= self.expected;
        self.waited = 0.0;
        self.warned = false;
        tracing::debug!(
            "Sequence '{}' arrived at barrier '{}' ({}/{})",
            ctx.sequence,
            self.name,
            count,
            self.expected
        );
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        if !self.released {
            self.released = ctx.orchestrator.barriers().count(&self.name) >= self.expected;
        }
        if self.released {
            return StepStatus::Succeeded;
        }

        self.waited += dt;
        if let Some(limit) = ctx.orchestrator.config().barrier_warn_after {
            if !self.warned && self.waited > limit {
                self.warned = true;
                tracing::warn!(
                    "Sequence '{}' has waited {:.1}s at barrier '{}' ({}/{} arrivals)",
                    ctx.sequence,
                    self.waited,
                    self.name,
                    ctx.orchestrator.barriers().count(&self.name),
                    self.expected
                );
            }
        }
        StepStatus::Running
    }
}
