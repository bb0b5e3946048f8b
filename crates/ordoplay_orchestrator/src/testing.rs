// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shared doubles for unit tests.

use crate::event::EventLog;
use crate::orchestrator::Orchestrator;
use crate::scene::InMemoryScene;
use crate::step::{Context, EngineContext, Step, StepContext, StepStatus};
use std::cell::Cell;
use std::rc::Rc;

/// Lifecycle counters shared with a [`Probe`]
#[derive(Debug, Clone, Default)]
pub(crate) struct ProbeCounters {
    enters: Rc<Cell<u32>>,
    ticks: Rc<Cell<u32>>,
    exits: Rc<Cell<u32>>,
}

impl ProbeCounters {
    pub(crate) fn enters(&self) -> u32 {
        self.enters.get()
    }

    pub(crate) fn ticks(&self) -> u32 {
        self.ticks.get()
    }

    pub(crate) fn exits(&self) -> u32 {
        self.exits.get()
    }
}

/// Step that replays a scripted list of statuses.
///
/// The script continues across activations; once exhausted the last entry
/// repeats.
pub(crate) struct Probe {
    script: Vec<StepStatus>,
    cursor: usize,
    counters: ProbeCounters,
}

impl Probe {
    pub(crate) fn new(script: impl Into<Vec<StepStatus>>) -> (Self, ProbeCounters) {
        let counters = ProbeCounters::default();
        let probe = Self {
            script: script.into(),
            cursor: 0,
            counters: counters.clone(),
        };
        (probe, counters)
    }

    /// Runs for `ticks - 1` ticks, then settles with `outcome`
    pub(crate) fn settle_after(ticks: u32, outcome: StepStatus) -> (Self, ProbeCounters) {
        let mut script = vec![StepStatus::Running; ticks.saturating_sub(1) as usize];
        script.push(outcome);
        Self::new(script)
    }

    /// Never settles
    pub(crate) fn forever() -> (Self, ProbeCounters) {
        Self::new([StepStatus::Running])
    }
}

impl Step for Probe {
    fn label(&self) -> &str {
        "probe"
    }

    fn on_enter(&mut self, _ctx: &StepContext<'_>) {
        self.counters.enters.set(self.counters.enters.get() + 1);
    }

    fn tick(&mut self, _dt: f32, _ctx: &StepContext<'_>) -> StepStatus {
        self.counters.ticks.set(self.counters.ticks.get() + 1);
        let status = self
            .script
            .get(self.cursor)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(StepStatus::Succeeded);
        self.cursor += 1;
        status
    }

    fn on_exit(&mut self, _ctx: &StepContext<'_>) {
        self.counters.exits.set(self.counters.exits.get() + 1);
    }
}

/// Scene, sinks and orchestrator bundled for driving steps directly
pub(crate) struct Harness {
    pub(crate) scene: InMemoryScene,
    pub(crate) engine: EngineContext,
    pub(crate) events: EventLog,
    pub(crate) orchestrator: Orchestrator,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            scene: InMemoryScene::new(),
            engine: EngineContext::default(),
            events: EventLog::new(),
            orchestrator: Orchestrator::new(),
        }
    }

    pub(crate) fn ctx(&self) -> Context<'_> {
        Context::new(&self.scene, &self.engine, &self.events)
    }

    pub(crate) fn step_ctx(&self) -> StepContext<'_> {
        StepContext::new(self.ctx(), &self.orchestrator, "test")
    }

    /// Enter `step`, tick it up to `ticks` times and exit it once it settles
    pub(crate) fn drive(&self, step: &mut dyn Step, dt: f32, ticks: usize) -> Vec<StepStatus> {
        let ctx = self.step_ctx();
        step.on_enter(&ctx);
        let mut statuses = Vec::with_capacity(ticks);
        for _ in 0..ticks {
            let status = step.tick(dt, &ctx);
            statuses.push(status);
            if status.is_terminal() {
                step.on_exit(&ctx);
                break;
            }
        }
        statuses
    }

    /// Tick the orchestrator once
    pub(crate) fn frame(&self, dt: f32) {
        self.orchestrator.tick(dt, self.ctx());
    }
}
