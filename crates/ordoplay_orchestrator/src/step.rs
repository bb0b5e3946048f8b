// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step contract shared by every leaf and composite step.
//!
//! A step is activated with [`Step::on_enter`], ticked once per frame until it
//! reports a terminal [`StepStatus`], then closed with [`Step::on_exit`] in the
//! same frame. Owners that abandon a running step (parallel fan-in, sequence
//! stop) skip the exit call, so steps must tolerate never being exited.

use crate::event::{EventSink, SequenceEvent};
use crate::orchestrator::Orchestrator;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};

/// Outcome of a single step tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    /// Still working, tick again next frame
    Running,
    /// Finished successfully
    Succeeded,
    /// Finished with a failure
    Failed,
}

impl StepStatus {
    /// Check if the step is still running
    pub fn is_running(&self) -> bool {
        matches!(self, StepStatus::Running)
    }

    /// Check if the step has settled (succeeded or failed)
    pub fn is_terminal(&self) -> bool {
        !self.is_running()
    }

    /// Check if the step succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Succeeded)
    }

    /// Check if the step failed
    pub fn is_failure(&self) -> bool {
        matches!(self, StepStatus::Failed)
    }

    /// Map a boolean outcome onto a terminal status
    pub fn from_outcome(ok: bool) -> Self {
        if ok {
            StepStatus::Succeeded
        } else {
            StepStatus::Failed
        }
    }
}

/// Engine services forwarded untouched to every step.
///
/// The orchestrator never reads these fields; they exist for host-defined
/// steps and callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineContext {
    /// Host frame counter
    pub frame: u64,
    /// Host elapsed time in seconds
    pub elapsed: f64,
    /// Host time scale
    pub time_scale: f32,
}

impl Default for EngineContext {
    fn default() -> Self {
        Self {
            frame: 0,
            elapsed: 0.0,
            time_scale: 1.0,
        }
    }
}

/// Host bundle passed to [`Orchestrator::start`] and [`Orchestrator::tick`]
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Scene the sequences act upon
    pub scene: &'a dyn Scene,
    /// Opaque engine services
    pub engine: &'a EngineContext,
    /// Event publish target
    pub events: &'a dyn EventSink,
}

impl<'a> Context<'a> {
    /// Create a new host context
    pub fn new(scene: &'a dyn Scene, engine: &'a EngineContext, events: &'a dyn EventSink) -> Self {
        Self {
            scene,
            engine,
            events,
        }
    }
}

/// Context visible to a step while its sequence is being driven
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Host bundle for this frame
    pub host: Context<'a>,
    /// Orchestrator driving the sequence
    pub orchestrator: &'a Orchestrator,
    /// Name of the sequence that owns the step
    pub sequence: &'a str,
}

impl<'a> StepContext<'a> {
    /// Create a step context
    pub fn new(host: Context<'a>, orchestrator: &'a Orchestrator, sequence: &'a str) -> Self {
        Self {
            host,
            orchestrator,
            sequence,
        }
    }

    /// Scene the sequence acts upon
    pub fn scene(&self) -> &'a dyn Scene {
        self.host.scene
    }

    /// Opaque engine services
    pub fn engine(&self) -> &'a EngineContext {
        self.host.engine
    }

    /// Publish an event through the host sink
    pub fn publish(&self, event: SequenceEvent) {
        self.host.events.publish(event);
    }

    /// Whether step transitions should be traced
    pub(crate) fn trace_steps(&self) -> bool {
        self.orchestrator.config().trace_steps
    }
}

/// A unit of multi-frame work
pub trait Step {
    /// Short label used in traces
    fn label(&self) -> &str {
        "step"
    }

    /// Called once per activation, before the first tick
    fn on_enter(&mut self, _ctx: &StepContext<'_>) {}

    /// Advance the step by `dt` seconds
    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus;

    /// Called once after a terminal tick, unless the owner abandons the step
    fn on_exit(&mut self, _ctx: &StepContext<'_>) {}
}

/// Owned, type-erased step
pub type BoxedStep = Box<dyn Step>;

/// Predicate polled by conditional steps
pub type Predicate = Box<dyn FnMut(&StepContext<'_>) -> bool>;
