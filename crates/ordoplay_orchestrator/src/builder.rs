// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fluent construction of step lists and sequences.
//!
//! Nested composites take a closure that fills a child [`StepListBuilder`]:
//!
//! ```
//! use ordoplay_orchestrator::{Orchestrator, TimeoutPolicy};
//!
//! let orchestrator = Orchestrator::new();
//! orchestrator
//!     .build("intro")
//!     .steps(|s| {
//!         s.signal("fade_in")
//!             .wait(1.5)
//!             .parallel_all(|p| {
//!                 p.signal("music").wait_frames(2);
//!             })
//!             .timeout(3.0, TimeoutPolicy::SkipStep, |t| {
//!                 t.barrier("actors_ready", 2);
//!             });
//!     })
//!     .register()
//!     .expect("fresh name");
//! assert!(orchestrator.contains("intro"));
//! ```

use crate::barrier::Barrier;
use crate::event::SequenceEvent;
use crate::flow::{Group, IfElse, Retry, Timeout, TimeoutPolicy, WaitUntil};
use crate::leaf::{
    Callback, InvokeSystem, PublishEvent, SetComponentEnabled, StartSequence, StopSequence,
    WaitFrames, WaitSeconds,
};
use crate::orchestrator::{Orchestrator, OrchestratorError};
use crate::parallel::Parallel;
use crate::scene::{EntityId, Scene, SystemCommand};
use crate::sequence::{Guard, Sequence, SequenceCallbacks, Validator};
use crate::step::{BoxedStep, Step, StepContext};
use crate::tween::{Easing, TweenStep};

/// Accumulates an ordered list of steps
#[derive(Default)]
pub struct StepListBuilder {
    steps: Vec<BoxedStep>,
}

impl StepListBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    fn nested(body: impl FnOnce(&mut StepListBuilder)) -> Vec<BoxedStep> {
        let mut child = StepListBuilder::new();
        body(&mut child);
        child.into_steps()
    }

    /// Append any step
    pub fn step(&mut self, step: impl Step + 'static) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Append an already boxed step
    pub fn boxed(&mut self, step: BoxedStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Wait for `seconds`
    pub fn wait(&mut self, seconds: f32) -> &mut Self {
        self.step(WaitSeconds::new(seconds))
    }

    /// Wait for `frames` ticks
    pub fn wait_frames(&mut self, frames: u32) -> &mut Self {
        self.step(WaitFrames::new(frames))
    }

    /// Publish an event
    pub fn publish(&mut self, event: SequenceEvent) -> &mut Self {
        self.step(PublishEvent::new(event))
    }

    /// Publish a payload-free signal
    pub fn signal(&mut self, name: impl Into<String>) -> &mut Self {
        self.publish(SequenceEvent::signal(name))
    }

    /// Call a scene system
    pub fn invoke(&mut self, system: impl Into<String>, command: SystemCommand) -> &mut Self {
        self.step(InvokeSystem::new(system, command))
    }

    /// Toggle a component on an entity
    pub fn set_component_enabled(
        &mut self,
        entity: EntityId,
        component: impl Into<String>,
        enabled: bool,
    ) -> &mut Self {
        self.step(SetComponentEnabled::new(entity, component, enabled))
    }

    /// Run an arbitrary closure as an instant step
    pub fn call(&mut self, action: impl FnMut(&StepContext<'_>) + 'static) -> &mut Self {
        self.step(Callback::new(action))
    }

    /// Start another registered sequence
    pub fn start_sequence(&mut self, target: impl Into<String>) -> &mut Self {
        self.step(StartSequence::new(target))
    }

    /// Stop another registered sequence
    pub fn stop_sequence(&mut self, target: impl Into<String>) -> &mut Self {
        self.step(StopSequence::new(target))
    }

    /// Tween an entity's position
    pub fn move_to(
        &mut self,
        entity: EntityId,
        position: [f32; 3],
        duration: f32,
        easing: Easing,
    ) -> &mut Self {
        self.step(TweenStep::move_to(entity, position, duration, easing))
    }

    /// Tween an entity's rotation
    pub fn rotate_to(
        &mut self,
        entity: EntityId,
        rotation: [f32; 4],
        duration: f32,
        easing: Easing,
    ) -> &mut Self {
        self.step(TweenStep::rotate_to(entity, rotation, duration, easing))
    }

    /// Tween an entity's scale
    pub fn scale_to(
        &mut self,
        entity: EntityId,
        scale: [f32; 3],
        duration: f32,
        easing: Easing,
    ) -> &mut Self {
        self.step(TweenStep::scale_to(entity, scale, duration, easing))
    }

    /// Turn an entity to face a point
    pub fn look_at(
        &mut self,
        entity: EntityId,
        point: [f32; 3],
        duration: f32,
        easing: Easing,
    ) -> &mut Self {
        self.step(TweenStep::look_at(entity, point, duration, easing))
    }

    /// Branch on a predicate evaluated when the step is entered
    pub fn if_else(
        &mut self,
        predicate: impl FnMut(&StepContext<'_>) -> bool + 'static,
        then: impl FnOnce(&mut StepListBuilder),
        otherwise: impl FnOnce(&mut StepListBuilder),
    ) -> &mut Self {
        let then = Self::nested(then);
        let otherwise = Self::nested(otherwise);
        self.step(IfElse::new(predicate, then, otherwise))
    }

    /// Run `then` only when the predicate holds
    pub fn when(
        &mut self,
        predicate: impl FnMut(&StepContext<'_>) -> bool + 'static,
        then: impl FnOnce(&mut StepListBuilder),
    ) -> &mut Self {
        self.if_else(predicate, then, |_| {})
    }

    /// Poll a predicate until it holds or `timeout` elapses
    pub fn wait_until(
        &mut self,
        predicate: impl FnMut(&StepContext<'_>) -> bool + 'static,
        timeout: Option<f32>,
        policy: TimeoutPolicy,
    ) -> &mut Self {
        self.step(WaitUntil::new(predicate, timeout, policy))
    }

    /// Bound the run time of a nested list
    pub fn timeout(
        &mut self,
        seconds: f32,
        policy: TimeoutPolicy,
        body: impl FnOnce(&mut StepListBuilder),
    ) -> &mut Self {
        let steps = Self::nested(body);
        self.step(Timeout::new(seconds, policy, steps))
    }

    /// Re-run a nested list up to `attempts` times
    pub fn retry(&mut self, attempts: u32, body: impl FnOnce(&mut StepListBuilder)) -> &mut Self {
        let steps = Self::nested(body);
        self.step(Retry::new(attempts, steps))
    }

    /// Run nested steps side by side until all succeed or one fails
    pub fn parallel_all(&mut self, body: impl FnOnce(&mut StepListBuilder)) -> &mut Self {
        let steps = Self::nested(body);
        self.step(Parallel::all(steps))
    }

    /// Run nested steps side by side until one succeeds or all fail
    pub fn parallel_any(&mut self, body: impl FnOnce(&mut StepListBuilder)) -> &mut Self {
        let steps = Self::nested(body);
        self.step(Parallel::any(steps))
    }

    /// Run a nested list as a single step
    pub fn group(&mut self, body: impl FnOnce(&mut StepListBuilder)) -> &mut Self {
        let steps = Self::nested(body);
        self.step(Group::new(steps))
    }

    /// Rendezvous with other sequences on a named barrier
    pub fn barrier(&mut self, name: impl Into<String>, expected: u32) -> &mut Self {
        self.step(Barrier::new(name, expected))
    }

    /// Get step count
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if no step was added
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Finish the list
    pub fn into_steps(self) -> Vec<BoxedStep> {
        self.steps
    }
}

/// Builds a [`Sequence`] and registers it with an [`Orchestrator`]
pub struct SequenceBuilder<'a> {
    orchestrator: &'a Orchestrator,
    name: String,
    steps: StepListBuilder,
    guard: Option<Guard>,
    validators: Vec<Validator>,
    callbacks: SequenceCallbacks,
}

impl<'a> SequenceBuilder<'a> {
    /// Start a builder for `name`
    pub fn new(orchestrator: &'a Orchestrator, name: impl Into<String>) -> Self {
        Self {
            orchestrator,
            name: name.into(),
            steps: StepListBuilder::new(),
            guard: None,
            validators: Vec::new(),
            callbacks: SequenceCallbacks::default(),
        }
    }

    /// Refuse to start while the predicate is false. A later call replaces
    /// an earlier one.
    pub fn guard(mut self, guard: impl Fn(&dyn Scene) -> bool + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Add a one-shot pre-flight check
    pub fn validate(
        mut self,
        validator: impl Fn(&dyn Scene) -> Result<(), String> + 'static,
    ) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Called after a successful start
    pub fn on_started(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.callbacks.on_started = Some(Box::new(callback));
        self
    }

    /// Called when the last step has run
    pub fn on_completed(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.callbacks.on_completed = Some(Box::new(callback));
        self
    }

    /// Called when the sequence is stopped or removed while running
    pub fn on_stopped(mut self, callback: impl Fn(&str) + 'static) -> Self {
        self.callbacks.on_stopped = Some(Box::new(callback));
        self
    }

    /// Append steps through a list builder
    pub fn steps(mut self, body: impl FnOnce(&mut StepListBuilder)) -> Self {
        body(&mut self.steps);
        self
    }

    /// Append a single step
    pub fn step(mut self, step: impl Step + 'static) -> Self {
        self.steps.step(step);
        self
    }

    /// Finish without registering
    pub fn into_sequence(self) -> Sequence {
        Sequence::new(self.name, self.steps.into_steps())
            .with_guard(self.guard)
            .with_validators(self.validators)
            .with_callbacks(self.callbacks)
    }

    /// Finish and register with the orchestrator
    pub fn register(self) -> Result<(), OrchestratorError> {
        let orchestrator = self.orchestrator;
        orchestrator.register(self.into_sequence())
    }
}
