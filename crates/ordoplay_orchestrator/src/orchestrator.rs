// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequence registry and per-frame driver.
//!
//! The orchestrator is single-threaded and re-entrant: every method takes
//! `&self`, so steps running inside [`Orchestrator::tick`] may start, stop,
//! pause or restore any sequence, including their own. No internal borrow is
//! held while user code (steps, guards, validators, callbacks) runs.

use crate::barrier::BarrierBoard;
use crate::builder::SequenceBuilder;
use crate::config::OrchestratorConfig;
use crate::sequence::{Sequence, Snapshot};
use crate::step::{Context, StepContext};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt::Write;
use std::rc::Rc;

/// Error raised by registration and start
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// A sequence with this name is already registered
    #[error("Sequence already registered: {0}")]
    DuplicateSequence(String),

    /// Pre-flight validation failed
    #[error("Sequence '{sequence}' failed validation: {}", .failures.join("; "))]
    ValidationFailed {
        /// Sequence name
        sequence: String,
        /// Messages from every failing validator
        failures: Vec<String>,
    },
}

/// Registry and per-frame driver of sequences
#[derive(Debug, Default)]
pub struct Orchestrator {
    config: OrchestratorConfig,
    sequences: RefCell<IndexMap<String, Rc<Sequence>>>,
    active: RefCell<Vec<Rc<Sequence>>>,
    barriers: BarrierBoard,
}

impl Orchestrator {
    /// Create an orchestrator with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an orchestrator with the given configuration
    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Active configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Barrier counters owned by this orchestrator
    pub fn barriers(&self) -> &BarrierBoard {
        &self.barriers
    }

    /// Current arrival count of a barrier
    pub fn barrier_count(&self, name: &str) -> u32 {
        self.barriers.count(name)
    }

    /// Begin building a sequence that registers here
    pub fn build(&self, name: impl Into<String>) -> SequenceBuilder<'_> {
        SequenceBuilder::new(self, name)
    }

    /// Register a finished sequence
    pub fn register(&self, sequence: Sequence) -> Result<(), OrchestratorError> {
        let mut sequences = self.sequences.borrow_mut();
        if sequences.contains_key(sequence.name()) {
            return Err(OrchestratorError::DuplicateSequence(sequence.name().to_string()));
        }
        tracing::debug!(
            "Registered sequence '{}' ({} steps)",
            sequence.name(),
            sequence.step_count()
        );
        sequences.insert(sequence.name().to_string(), Rc::new(sequence));
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<Rc<Sequence>> {
        let found = self.sequences.borrow().get(name).cloned();
        if found.is_none() {
            tracing::warn!("Unknown sequence '{}'", name);
        }
        found
    }

    fn activate(&self, sequence: &Rc<Sequence>) {
        let mut active = self.active.borrow_mut();
        if !active.iter().any(|s| Rc::ptr_eq(s, sequence)) {
            active.push(sequence.clone());
        }
    }

    fn deactivate(&self, sequence: &Rc<Sequence>) {
        self.active.borrow_mut().retain(|s| !Rc::ptr_eq(s, sequence));
    }

    /// Check if a sequence is registered
    pub fn contains(&self, name: &str) -> bool {
        self.sequences.borrow().contains_key(name)
    }

    /// Registered sequence names, in registration order
    pub fn sequence_names(&self) -> Vec<String> {
        self.sequences.borrow().keys().cloned().collect()
    }

    /// Start a sequence from its first step.
    ///
    /// Returns `Ok(false)` for unknown names, sequences that are already
    /// running and guard refusals. Failing validators produce an error and the
    /// sequence does not start.
    pub fn start(&self, name: &str, ctx: Context<'_>) -> Result<bool, OrchestratorError> {
        let Some(sequence) = self.lookup(name) else {
            return Ok(false);
        };
        if !sequence.begin(ctx.scene)? {
            return Ok(false);
        }
        self.activate(&sequence);
        sequence.notify_started();
        Ok(true)
    }

    /// Stop a running sequence. The current step does not get `on_exit`.
    pub fn stop(&self, name: &str) -> bool {
        let Some(sequence) = self.lookup(name) else {
            return false;
        };
        let stopped = sequence.halt();
        self.deactivate(&sequence);
        stopped
    }

    /// Pause a sequence; it stays active but is not ticked
    pub fn pause(&self, name: &str) -> bool {
        self.set_paused(name, true)
    }

    /// Resume a paused sequence
    pub fn resume(&self, name: &str) -> bool {
        self.set_paused(name, false)
    }

    /// Toggle pause/resume
    pub fn toggle_pause(&self, name: &str) -> bool {
        let Some(sequence) = self.lookup(name) else {
            return false;
        };
        sequence.set_paused(!sequence.is_paused());
        true
    }

    fn set_paused(&self, name: &str, paused: bool) -> bool {
        let Some(sequence) = self.lookup(name) else {
            return false;
        };
        sequence.set_paused(paused);
        true
    }

    /// Check if a sequence is paused
    pub fn is_paused(&self, name: &str) -> bool {
        self.sequences
            .borrow()
            .get(name)
            .is_some_and(|s| s.is_paused())
    }

    /// Check if a sequence is running
    pub fn is_running(&self, name: &str) -> bool {
        self.sequences
            .borrow()
            .get(name)
            .is_some_and(|s| s.is_running())
    }

    /// Rewind a sequence to its first step without changing run state
    pub fn reset(&self, name: &str) -> bool {
        let Some(sequence) = self.lookup(name) else {
            return false;
        };
        sequence.rewind();
        true
    }

    /// Unregister a sequence, stopping it first if it is running
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.sequences.borrow_mut().shift_remove(name);
        let Some(sequence) = removed else {
            return false;
        };
        sequence.halt();
        self.deactivate(&sequence);
        tracing::info!("Removed sequence '{}'", name);
        true
    }

    /// Number of active (running) sequences, paused ones included
    pub fn active_count(&self) -> usize {
        self.active.borrow().len()
    }

    /// Advance every active, unpaused sequence by `dt` seconds.
    ///
    /// Iterates a copy of the active list taken at the start of the call.
    /// Sequences that were idle when the tick began first run on the next one.
    /// A sequence already in the copy that another step stops and restarts
    /// during the same tick still runs in this tick, from its first step.
    pub fn tick(&self, dt: f32, ctx: Context<'_>) {
        let snapshot: Vec<Rc<Sequence>> = self.active.borrow().clone();

        for sequence in snapshot {
            if sequence.is_paused() {
                continue;
            }

            let step_ctx = StepContext::new(ctx, self, sequence.name());
            sequence.tick(dt, &step_ctx);

            if !sequence.is_running() {
                self.deactivate(&sequence);
            }
        }
    }

    /// Capture the current step index of a sequence
    pub fn capture(&self, name: &str) -> Option<Snapshot> {
        self.lookup(name).map(|s| s.snapshot())
    }

    /// Resume a sequence at a captured step.
    ///
    /// The step at the restored index is entered again on the next tick. Its
    /// previous activation, if any, is dropped without `on_exit`.
    pub fn restore(&self, snapshot: &Snapshot) -> bool {
        let Some(sequence) = self.lookup(&snapshot.sequence) else {
            return false;
        };
        sequence.resume_at(snapshot.step_index);
        self.activate(&sequence);
        tracing::info!(
            "Restored sequence '{}' at step {}",
            snapshot.sequence,
            sequence.current_step()
        );
        true
    }

    /// Human-readable dump of every sequence and barrier
    pub fn debug_summary(&self) -> String {
        let mut out = String::new();
        let sequences = self.sequences.borrow();
        let _ = writeln!(
            out,
            "Orchestrator: {} sequence(s), {} active",
            sequences.len(),
            self.active.borrow().len()
        );
        for sequence in sequences.values() {
            let state = if sequence.is_running() { "running" } else { "idle" };
            let paused = if sequence.is_paused() { ", paused" } else { "" };
            let _ = writeln!(
                out,
                "  {} [{}{}] step {}/{}",
                sequence.name(),
                state,
                paused,
                sequence.current_step(),
                sequence.step_count()
            );
        }
        for (name, count) in self.barriers.counters() {
            let _ = writeln!(out, "  barrier {} = {}", name, count);
        }
        out
    }
}
