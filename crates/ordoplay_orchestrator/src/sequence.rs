// SPDX-License-Identifier: MIT OR Apache-2.0
//! Named sequence of steps with its own run cursor.
//!
//! Run state lives in `Cell`s so the orchestrator, and steps running inside
//! this very sequence, can stop, pause, reset or restore it while a tick is in
//! progress. The step list sits behind a `RefCell` that is only borrowed while
//! the sequence itself is being ticked.

use crate::orchestrator::OrchestratorError;
use crate::scene::Scene;
use crate::step::{BoxedStep, StepContext};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

/// Start-time predicate gating [`crate::Orchestrator::start`]
pub type Guard = Box<dyn Fn(&dyn Scene) -> bool>;

/// One-shot pre-flight check; `Err` carries a human-readable message
pub type Validator = Box<dyn Fn(&dyn Scene) -> Result<(), String>>;

/// Lifecycle notification, called with the sequence name
pub type LifecycleCallback = Box<dyn Fn(&str)>;

/// Optional lifecycle hooks
#[derive(Default)]
pub(crate) struct SequenceCallbacks {
    pub(crate) on_started: Option<LifecycleCallback>,
    pub(crate) on_completed: Option<LifecycleCallback>,
    pub(crate) on_stopped: Option<LifecycleCallback>,
}

/// Step-granular checkpoint of a sequence.
///
/// Only the top-level step index is kept. Timers and child progress inside
/// the step at that index start fresh on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequence name
    pub sequence: String,
    /// Top-level step to resume at
    pub step_index: usize,
}

impl Snapshot {
    /// Serialize to a RON string
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        ron::to_string(self)
    }

    /// Deserialize from a RON string
    pub fn from_ron(s: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(s)
    }
}

/// A registered sequence
pub struct Sequence {
    name: String,
    steps: RefCell<Vec<BoxedStep>>,
    step_count: usize,
    guard: Option<Guard>,
    validators: RefCell<Vec<Validator>>,
    callbacks: SequenceCallbacks,
    current: Cell<usize>,
    entered: Cell<bool>,
    running: Cell<bool>,
    paused: Cell<bool>,
    /// Bumped whenever the cursor is replaced from outside a step tick
    generation: Cell<u64>,
}

impl Sequence {
    /// Create a sequence from a finished step list
    pub fn new(name: impl Into<String>, steps: Vec<BoxedStep>) -> Self {
        let step_count = steps.len();
        Self {
            name: name.into(),
            steps: RefCell::new(steps),
            step_count,
            guard: None,
            validators: RefCell::new(Vec::new()),
            callbacks: SequenceCallbacks::default(),
            current: Cell::new(0),
            entered: Cell::new(false),
            running: Cell::new(false),
            paused: Cell::new(false),
            generation: Cell::new(0),
        }
    }

    pub(crate) fn with_guard(mut self, guard: Option<Guard>) -> Self {
        self.guard = guard;
        self
    }

    pub(crate) fn with_validators(mut self, validators: Vec<Validator>) -> Self {
        self.validators = RefCell::new(validators);
        self
    }

    pub(crate) fn with_callbacks(mut self, callbacks: SequenceCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Sequence name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get step count
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Index of the current top-level step
    pub fn current_step(&self) -> usize {
        self.current.get()
    }

    /// Check if the sequence is running
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Check if the sequence is paused
    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    /// Check if validators are still waiting for the first start
    pub fn has_pending_validators(&self) -> bool {
        !self.validators.borrow().is_empty()
    }

    /// Capture a step-granular checkpoint
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sequence: self.name.clone(),
            step_index: self.current.get(),
        }
    }

    /// Try to start the sequence.
    ///
    /// Returns `Ok(false)` when already running or refused by the guard. The
    /// validators run on the first attempt that gets past the guard and are
    /// discarded afterwards, pass or fail.
    pub(crate) fn begin(&self, scene: &dyn Scene) -> Result<bool, OrchestratorError> {
        if self.running.get() {
            tracing::debug!("Sequence '{}' is already running", self.name);
            return Ok(false);
        }

        if let Some(guard) = &self.guard {
            if !guard(scene) {
                tracing::warn!("Sequence '{}' refused by its guard", self.name);
                return Ok(false);
            }
        }

        let validators = self.validators.take();
        let failures: Vec<String> = validators
            .iter()
            .filter_map(|validate| validate(scene).err())
            .collect();
        if !failures.is_empty() {
            return Err(OrchestratorError::ValidationFailed {
                sequence: self.name.clone(),
                failures,
            });
        }

        self.running.set(true);
        self.rewind();
        tracing::info!("Started sequence '{}' ({} steps)", self.name, self.step_count);
        Ok(true)
    }

    pub(crate) fn notify_started(&self) {
        if let Some(callback) = &self.callbacks.on_started {
            callback(&self.name);
        }
    }

    /// Stop without exiting the current step. Returns false if not running.
    pub(crate) fn halt(&self) -> bool {
        if !self.running.get() {
            return false;
        }
        self.running.set(false);
        self.entered.set(false);
        tracing::info!("Stopped sequence '{}' at step {}", self.name, self.current.get());
        if let Some(callback) = &self.callbacks.on_stopped {
            callback(&self.name);
        }
        true
    }

    pub(crate) fn set_paused(&self, paused: bool) {
        self.paused.set(paused);
    }

    /// Move the cursor back to the first step
    pub(crate) fn rewind(&self) {
        self.current.set(0);
        self.entered.set(false);
        self.generation.set(self.generation.get() + 1);
    }

    /// Force the sequence running at `index`, clamped to the step count
    pub(crate) fn resume_at(&self, index: usize) {
        self.running.set(true);
        self.current.set(index.min(self.step_count));
        self.entered.set(false);
        self.generation.set(self.generation.get() + 1);
    }

    fn complete(&self) {
        self.running.set(false);
        self.entered.set(false);
        tracing::info!("Completed sequence '{}'", self.name);
        if let Some(callback) = &self.callbacks.on_completed {
            callback(&self.name);
        }
    }

    /// Drive the current step for one frame.
    ///
    /// At most one step settles per tick. A failed step advances the cursor
    /// exactly like a successful one.
    pub(crate) fn tick(&self, dt: f32, ctx: &StepContext<'_>) {
        if !self.running.get() || self.paused.get() {
            return;
        }

        let index = self.current.get();
        if index >= self.step_count {
            self.complete();
            return;
        }

        let Ok(mut steps) = self.steps.try_borrow_mut() else {
            tracing::warn!("Sequence '{}' ticked while already ticking; skipped", self.name);
            return;
        };
        let Some(step) = steps.get_mut(index) else {
            return;
        };
        let generation = self.generation.get();

        if !self.entered.get() {
            self.entered.set(true);
            if ctx.trace_steps() {
                tracing::debug!("Sequence '{}': enter {} [{}]", self.name, step.label(), index);
            }
            step.on_enter(ctx);
        }

        let status = step.tick(dt, ctx);
        if status.is_running() {
            return;
        }

        step.on_exit(ctx);
        if ctx.trace_steps() {
            tracing::debug!(
                "Sequence '{}': exit {} [{}] {:?}",
                self.name,
                step.label(),
                index,
                status
            );
        }

        // The step restarted or restored this sequence; keep the new cursor
        if generation != self.generation.get() {
            return;
        }
        self.entered.set(false);
        self.current.set(index + 1);
    }
}

impl std::fmt::Debug for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field("step_count", &self.step_count)
            .field("current", &self.current.get())
            .field("running", &self.running.get())
            .field("paused", &self.paused.get())
            .finish_non_exhaustive()
    }
}
