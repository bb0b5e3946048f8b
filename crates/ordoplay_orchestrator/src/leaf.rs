// SPDX-License-Identifier: MIT OR Apache-2.0
//! Leaf steps: waits, events, scene calls and sibling sequence control.

use crate::event::SequenceEvent;
use crate::scene::{EntityId, SystemCommand};
use crate::step::{Step, StepContext, StepStatus};

/// Wait for a duration in seconds
#[derive(Debug, Clone)]
pub struct WaitSeconds {
    /// Duration to wait
    pub seconds: f32,
    elapsed: f32,
}

impl WaitSeconds {
    /// Create a new timed wait
    pub fn new(seconds: f32) -> Self {
        Self {
            seconds,
            elapsed: 0.0,
        }
    }
}

impl Step for WaitSeconds {
    fn label(&self) -> &str {
        "wait-seconds"
    }

    fn on_enter(&mut self, _ctx: &StepContext<'_>) {
        self.elapsed = 0.0;
    }

    fn tick(&mut self, dt: f32, _ctx: &StepContext<'_>) -> StepStatus {
        self.elapsed += dt;
        if self.elapsed >= self.seconds {
            StepStatus::Succeeded
        } else {
            StepStatus::Running
        }
    }
}

/// Wait for a number of ticks, regardless of delta time
#[derive(Debug, Clone)]
pub struct WaitFrames {
    /// Ticks to wait
    pub frames: u32,
    counted: u32,
}

impl WaitFrames {
    /// Create a new frame-counted wait
    pub fn new(frames: u32) -> Self {
        Self { frames, counted: 0 }
    }
}

impl Step for WaitFrames {
    fn label(&self) -> &str {
        "wait-frames"
    }

    fn on_enter(&mut self, _ctx: &StepContext<'_>) {
        self.counted = 0;
    }

    fn tick(&mut self, _dt: f32, _ctx: &StepContext<'_>) -> StepStatus {
        self.counted += 1;
        if self.counted >= self.frames {
            StepStatus::Succeeded
        } else {
            StepStatus::Running
        }
    }
}

/// Publish an event through the host sink
#[derive(Debug, Clone)]
pub struct PublishEvent {
    /// Event to publish on every activation
    pub event: SequenceEvent,
}

impl PublishEvent {
    /// Create a new publish step
    pub fn new(event: SequenceEvent) -> Self {
        Self { event }
    }
}

impl Step for PublishEvent {
    fn label(&self) -> &str {
        "publish-event"
    }

    fn tick(&mut self, _dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        ctx.publish(self.event.clone());
        StepStatus::Succeeded
    }
}

/// Deliver a command to a named scene system
#[derive(Debug, Clone)]
pub struct InvokeSystem {
    /// Target system name
    pub system: String,
    /// Command to deliver
    pub command: SystemCommand,
}

impl InvokeSystem {
    /// Create a new system call
    pub fn new(system: impl Into<String>, command: SystemCommand) -> Self {
        Self {
            system: system.into(),
            command,
        }
    }
}

impl Step for InvokeSystem {
    fn label(&self) -> &str {
        "invoke-system"
    }

    fn tick(&mut self, _dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        if ctx.scene().invoke(&self.system, &self.command) {
            StepStatus::Succeeded
        } else {
            tracing::warn!(
                "Sequence '{}': system '{}' did not accept '{}'",
                ctx.sequence,
                self.system,
                self.command.action
            );
            StepStatus::Failed
        }
    }
}

/// Enable or disable a component on an entity
#[derive(Debug, Clone)]
pub struct SetComponentEnabled {
    /// Target entity
    pub entity: EntityId,
    /// Component name
    pub component: String,
    /// Desired state
    pub enabled: bool,
}

impl SetComponentEnabled {
    /// Create a new component toggle
    pub fn new(entity: EntityId, component: impl Into<String>, enabled: bool) -> Self {
        Self {
            entity,
            component: component.into(),
            enabled,
        }
    }
}

impl Step for SetComponentEnabled {
    fn label(&self) -> &str {
        "set-component-enabled"
    }

    fn tick(&mut self, _dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        let ok = ctx
            .scene()
            .set_component_enabled(self.entity, &self.component, self.enabled);
        if !ok {
            tracing::warn!(
                "Sequence '{}': component '{}' not found on {:?}",
                ctx.sequence,
                self.component,
                self.entity
            );
        }
        StepStatus::from_outcome(ok)
    }
}

/// Run a closure once and succeed.
///
/// Panics raised by the closure are not caught; they unwind out of
/// [`crate::Orchestrator::tick`].
pub struct Callback {
    action: Box<dyn FnMut(&StepContext<'_>)>,
}

impl Callback {
    /// Create a new callback step
    pub fn new(action: impl FnMut(&StepContext<'_>) + 'static) -> Self {
        Self {
            action: Box::new(action),
        }
    }
}

impl Step for Callback {
    fn label(&self) -> &str {
        "callback"
    }

    fn tick(&mut self, _dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        (self.action)(ctx);
        StepStatus::Succeeded
    }
}

/// Start a sibling sequence on the same orchestrator
#[derive(Debug, Clone)]
pub struct StartSequence {
    /// Sequence to start
    pub target: String,
}

impl StartSequence {
    /// Create a new start step
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Step for StartSequence {
    fn label(&self) -> &str {
        "start-sequence"
    }

    fn tick(&mut self, _dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        match ctx.orchestrator.start(&self.target, ctx.host) {
            Ok(started) => StepStatus::from_outcome(started),
            Err(e) => {
                tracing::error!(
                    "Sequence '{}' failed to start '{}': {}",
                    ctx.sequence,
                    self.target,
                    e
                );
                StepStatus::Failed
            }
        }
    }
}

/// Stop a sibling sequence on the same orchestrator
#[derive(Debug, Clone)]
pub struct StopSequence {
    /// Sequence to stop
    pub target: String,
}

impl StopSequence {
    /// Create a new stop step
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl Step for StopSequence {
    fn label(&self) -> &str {
        "stop-sequence"
    }

    fn tick(&mut self, _dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        StepStatus::from_outcome(ctx.orchestrator.stop(&self.target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventPayload;
    use crate::scene::Transform;
    use crate::testing::Harness;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_wait_seconds() {
        let harness = Harness::new();
        let mut wait = WaitSeconds::new(2.0);
        let statuses = harness.drive(&mut wait, 1.0, 5);
        assert_eq!(statuses, vec![StepStatus::Running, StepStatus::Succeeded]);
    }

    #[test]
    fn test_wait_seconds_restarts_on_enter() {
        let harness = Harness::new();
        let mut wait = WaitSeconds::new(2.0);
        harness.drive(&mut wait, 1.5, 1);

        // A fresh activation does not inherit the earlier 1.5s
        let statuses = harness.drive(&mut wait, 1.5, 5);
        assert_eq!(statuses, vec![StepStatus::Running, StepStatus::Succeeded]);
    }

    #[test]
    fn test_wait_frames_ignores_dt() {
        let harness = Harness::new();
        let mut wait = WaitFrames::new(3);
        let statuses = harness.drive(&mut wait, 100.0, 5);
        assert_eq!(
            statuses,
            vec![StepStatus::Running, StepStatus::Running, StepStatus::Succeeded]
        );
    }

    #[test]
    fn test_publish_event() {
        let harness = Harness::new();
        let mut step = PublishEvent::new(SequenceEvent::custom("door", EventPayload::Bool(true)));
        assert_eq!(harness.drive(&mut step, 0.016, 1), vec![StepStatus::Succeeded]);

        let events = harness.events.take();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "door");
        assert_eq!(events[0].payload().as_bool(), Some(true));
    }

    #[test]
    fn test_invoke_system() {
        let harness = Harness::new();
        harness.scene.add_system("audio");

        let mut play = InvokeSystem::new("audio", SystemCommand::new("play"));
        assert_eq!(harness.drive(&mut play, 0.016, 1), vec![StepStatus::Succeeded]);

        let mut missing = InvokeSystem::new("physics", SystemCommand::new("sleep"));
        assert_eq!(harness.drive(&mut missing, 0.016, 1), vec![StepStatus::Failed]);
    }

    #[test]
    fn test_set_component_enabled() {
        let harness = Harness::new();
        let lamp = harness.scene.spawn(Transform::default());
        harness.scene.add_component(lamp, "light", false);

        let mut step = SetComponentEnabled::new(lamp, "light", true);
        assert_eq!(harness.drive(&mut step, 0.016, 1), vec![StepStatus::Succeeded]);
        assert_eq!(harness.scene.component_enabled(lamp, "light"), Some(true));
    }

    #[test]
    fn test_callback_runs_each_activation() {
        let harness = Harness::new();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut step = Callback::new(move |_| counter.set(counter.get() + 1));

        harness.drive(&mut step, 0.016, 1);
        harness.drive(&mut step, 0.016, 1);
        assert_eq!(calls.get(), 2);
    }
}
