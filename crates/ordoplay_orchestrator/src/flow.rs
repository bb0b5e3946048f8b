// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sequential control-flow composites.
//!
//! Every composite here drives its children through a [`StepList`], a
//! private mini-sequence with its own cursor. Children are entered lazily when
//! the cursor reaches them and exited in the same tick they settle.

use crate::step::{BoxedStep, Predicate, Step, StepContext, StepStatus};
use serde::{Deserialize, Serialize};

/// How a [`StepList`] reacts to a child that settles as failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChildFailure {
    /// Move on to the next child, like a top-level sequence
    #[default]
    Advance,
    /// Stop and report the list as failed
    Propagate,
}

/// Outcome applied when a timed step runs out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// Timeout fails the step
    #[default]
    Fail,
    /// Timeout skips the step, reporting success
    SkipStep,
    /// Timeout counts as success
    Succeed,
}

impl TimeoutPolicy {
    /// Status reported when the timeout fires
    pub fn outcome(self) -> StepStatus {
        match self {
            TimeoutPolicy::Fail => StepStatus::Failed,
            TimeoutPolicy::SkipStep | TimeoutPolicy::Succeed => StepStatus::Succeeded,
        }
    }
}

/// Ordered child steps with a cursor
pub struct StepList {
    steps: Vec<BoxedStep>,
    index: usize,
    entered: bool,
    on_failure: ChildFailure,
}

impl StepList {
    /// Create a new step list
    pub fn new(steps: Vec<BoxedStep>, on_failure: ChildFailure) -> Self {
        Self {
            steps,
            index: 0,
            entered: false,
            on_failure,
        }
    }

    /// Get step count
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the list has no steps
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the current child
    pub fn cursor(&self) -> usize {
        self.index
    }

    /// Move the cursor back to the first child
    pub fn rewind(&mut self) {
        self.index = 0;
        self.entered = false;
    }

    /// Advance the current child.
    ///
    /// Returns `Succeeded` once every child has run, `Failed` when a child
    /// fails under [`ChildFailure::Propagate`], and `Running` otherwise.
    pub fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        let Some(step) = self.steps.get_mut(self.index) else {
            return StepStatus::Succeeded;
        };

        if !self.entered {
            self.entered = true;
            if ctx.trace_steps() {
                tracing::debug!(
                    "Sequence '{}': enter {} [{}]",
                    ctx.sequence,
                    step.label(),
                    self.index
                );
            }
            step.on_enter(ctx);
        }

        let status = step.tick(dt, ctx);
        if status.is_running() {
            return StepStatus::Running;
        }

        step.on_exit(ctx);
        if ctx.trace_steps() {
            tracing::debug!(
                "Sequence '{}': exit {} [{}] {:?}",
                ctx.sequence,
                step.label(),
                self.index,
                status
            );
        }
        self.entered = false;
        self.index += 1;

        if status.is_failure() && self.on_failure == ChildFailure::Propagate {
            return StepStatus::Failed;
        }
        if self.index >= self.steps.len() {
            StepStatus::Succeeded
        } else {
            StepStatus::Running
        }
    }

    /// Exit the in-flight child, if any, and park the cursor at the end
    pub fn cancel(&mut self, ctx: &StepContext<'_>) {
        if self.entered {
            if let Some(step) = self.steps.get_mut(self.index) {
                step.on_exit(ctx);
            }
        }
        self.entered = false;
        self.index = self.steps.len();
    }
}

/// Run children in order as a single step; a failed child fails the group
pub struct Group {
    inner: StepList,
}

impl Group {
    /// Create a new group
    pub fn new(steps: Vec<BoxedStep>) -> Self {
        Self {
            inner: StepList::new(steps, ChildFailure::Propagate),
        }
    }
}

impl Step for Group {
    fn label(&self) -> &str {
        "group"
    }

    fn on_enter(&mut self, _ctx: &StepContext<'_>) {
        self.inner.rewind();
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        self.inner.tick(dt, ctx)
    }
}

/// Which branch an [`IfElse`] chose on enter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    Then,
    Otherwise,
}

/// Evaluate a predicate once on enter and run one of two branches
pub struct IfElse {
    predicate: Predicate,
    then: StepList,
    otherwise: StepList,
    branch: Branch,
}

impl IfElse {
    /// Create a new conditional
    pub fn new(
        predicate: impl FnMut(&StepContext<'_>) -> bool + 'static,
        then: Vec<BoxedStep>,
        otherwise: Vec<BoxedStep>,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            then: StepList::new(then, ChildFailure::Advance),
            otherwise: StepList::new(otherwise, ChildFailure::Advance),
            branch: Branch::Then,
        }
    }

    fn selected(&mut self) -> &mut StepList {
        match self.branch {
            Branch::Then => &mut self.then,
            Branch::Otherwise => &mut self.otherwise,
        }
    }
}

impl Step for IfElse {
    fn label(&self) -> &str {
        "if-else"
    }

    fn on_enter(&mut self, ctx: &StepContext<'_>) {
        self.branch = if (self.predicate)(ctx) {
            Branch::Then
        } else {
            Branch::Otherwise
        };
        self.selected().rewind();
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        self.selected().tick(dt, ctx)
    }
}

/// Poll a predicate every tick, optionally bounded by a timeout
pub struct WaitUntil {
    predicate: Predicate,
    timeout: Option<f32>,
    policy: TimeoutPolicy,
    elapsed: f32,
}

impl WaitUntil {
    /// Create a new wait; `None` waits forever
    pub fn new(
        predicate: impl FnMut(&StepContext<'_>) -> bool + 'static,
        timeout: Option<f32>,
        policy: TimeoutPolicy,
    ) -> Self {
        Self {
            predicate: Box::new(predicate),
            timeout,
            policy,
            elapsed: 0.0,
        }
    }
}

impl Step for WaitUntil {
    fn label(&self) -> &str {
        "wait-until"
    }

    fn on_enter(&mut self, _ctx: &StepContext<'_>) {
        self.elapsed = 0.0;
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        if (self.predicate)(ctx) {
            return StepStatus::Succeeded;
        }

        self.elapsed += dt;
        match self.timeout {
            Some(limit) if self.elapsed >= limit => {
                tracing::debug!(
                    "Sequence '{}': wait-until timed out after {:.2}s",
                    ctx.sequence,
                    limit
                );
                self.policy.outcome()
            }
            _ => StepStatus::Running,
        }
    }
}

/// Bound the total run time of an inner step list
pub struct Timeout {
    seconds: f32,
    policy: TimeoutPolicy,
    inner: StepList,
    elapsed: f32,
}

impl Timeout {
    /// Create a new timeout wrapper
    pub fn new(seconds: f32, policy: TimeoutPolicy, steps: Vec<BoxedStep>) -> Self {
        Self {
            seconds,
            policy,
            inner: StepList::new(steps, ChildFailure::Advance),
            elapsed: 0.0,
        }
    }
}

impl Step for Timeout {
    fn label(&self) -> &str {
        "timeout"
    }

    fn on_enter(&mut self, _ctx: &StepContext<'_>) {
        self.elapsed = 0.0;
        self.inner.rewind();
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        self.elapsed += dt;
        if self.elapsed > self.seconds {
            tracing::debug!(
                "Sequence '{}': timeout of {:.2}s hit at child {}",
                ctx.sequence,
                self.seconds,
                self.inner.cursor()
            );
            self.inner.cancel(ctx);
            return self.policy.outcome();
        }
        self.inner.tick(dt, ctx)
    }
}

/// Re-run an inner step list until it completes without a failure
pub struct Retry {
    attempts: u32,
    failures: u32,
    inner: StepList,
}

impl Retry {
    /// Create a new retry wrapper. `attempts` is clamped to at least one.
    pub fn new(attempts: u32, steps: Vec<BoxedStep>) -> Self {
        Self {
            attempts: attempts.max(1),
            failures: 0,
            inner: StepList::new(steps, ChildFailure::Propagate),
        }
    }

    /// Failed passes in the current activation
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

impl Step for Retry {
    fn label(&self) -> &str {
        "retry"
    }

    fn on_enter(&mut self, _ctx: &StepContext<'_>) {
        self.failures = 0;
        self.inner.rewind();
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        match self.inner.tick(dt, ctx) {
            StepStatus::Failed => {
                self.failures += 1;
                if self.failures >= self.attempts {
                    tracing::debug!(
                        "Sequence '{}': retry gave up after {} attempt(s)",
                        ctx.sequence,
                        self.failures
                    );
                    return StepStatus::Failed;
                }
                self.inner.rewind();
                StepStatus::Running
            }
            status => status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::WaitSeconds;
    use crate::testing::{Harness, Probe};
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::step::StepStatus::{Failed, Running, Succeeded};

    fn boxed(step: impl Step + 'static) -> BoxedStep {
        Box::new(step)
    }

    #[test]
    fn test_if_else_picks_branch_once() {
        let harness = Harness::new();
        let flag = Rc::new(Cell::new(true));
        let read = flag.clone();
        let (then, then_probe) = Probe::settle_after(2, Succeeded);
        let (otherwise, else_probe) = Probe::settle_after(1, Succeeded);
        let mut step = IfElse::new(move |_| read.get(), vec![boxed(then)], vec![boxed(otherwise)]);

        let ctx = harness.step_ctx();
        step.on_enter(&ctx);
        // Flipping the flag mid-activation changes nothing
        flag.set(false);
        assert_eq!(step.tick(1.0, &ctx), Running);
        assert_eq!(step.tick(1.0, &ctx), Succeeded);

        assert_eq!(then_probe.enters(), 1);
        assert_eq!(then_probe.exits(), 1);
        assert_eq!(else_probe.enters(), 0);
    }

    #[test]
    fn test_if_else_empty_branch_succeeds() {
        let harness = Harness::new();
        let mut step = IfElse::new(|_| false, vec![boxed(WaitSeconds::new(5.0))], Vec::new());
        assert_eq!(harness.drive(&mut step, 1.0, 3), vec![Succeeded]);
    }

    #[test]
    fn test_wait_until_predicate() {
        let harness = Harness::new();
        let polls = Rc::new(Cell::new(0));
        let counter = polls.clone();
        let mut step = WaitUntil::new(
            move |_| {
                counter.set(counter.get() + 1);
                counter.get() >= 3
            },
            None,
            TimeoutPolicy::Fail,
        );
        assert_eq!(harness.drive(&mut step, 1.0, 10), vec![Running, Running, Succeeded]);
        assert_eq!(polls.get(), 3);
    }

    #[test]
    fn test_wait_until_timeout_policies() {
        let harness = Harness::new();

        let mut fail = WaitUntil::new(|_| false, Some(2.0), TimeoutPolicy::Fail);
        assert_eq!(harness.drive(&mut fail, 1.0, 5), vec![Running, Failed]);

        let mut skip = WaitUntil::new(|_| false, Some(2.0), TimeoutPolicy::SkipStep);
        assert_eq!(harness.drive(&mut skip, 1.0, 5), vec![Running, Succeeded]);

        let mut succeed = WaitUntil::new(|_| false, Some(2.0), TimeoutPolicy::Succeed);
        assert_eq!(harness.drive(&mut succeed, 1.0, 5), vec![Running, Succeeded]);
    }

    #[test]
    fn test_timeout_skip_abandons_long_wait() {
        let harness = Harness::new();
        let (slow, probe) = Probe::settle_after(5, Succeeded);
        let mut step = Timeout::new(2.0, TimeoutPolicy::SkipStep, vec![boxed(slow)]);

        let statuses = harness.drive(&mut step, 1.0, 10);
        assert_eq!(statuses, vec![Running, Running, Succeeded]);

        // The inner step never reached its own completion but was exited
        assert_eq!(probe.ticks(), 2);
        assert_eq!(probe.exits(), 1);
    }

    #[test]
    fn test_timeout_fail_policy() {
        let harness = Harness::new();
        let mut step = Timeout::new(1.5, TimeoutPolicy::Fail, vec![boxed(WaitSeconds::new(5.0))]);
        assert_eq!(harness.drive(&mut step, 1.0, 10), vec![Running, Failed]);
    }

    #[test]
    fn test_timeout_inner_finishes_first() {
        let harness = Harness::new();
        let mut step = Timeout::new(
            5.0,
            TimeoutPolicy::Fail,
            vec![boxed(WaitSeconds::new(1.0)), boxed(WaitSeconds::new(1.0))],
        );
        assert_eq!(harness.drive(&mut step, 1.0, 10), vec![Running, Succeeded]);
    }

    #[test]
    fn test_retry_recovers() {
        let harness = Harness::new();
        let (flaky, probe) = Probe::new([Failed, Succeeded]);
        let mut step = Retry::new(2, vec![boxed(flaky)]);

        assert_eq!(harness.drive(&mut step, 1.0, 10), vec![Running, Succeeded]);
        assert_eq!(probe.enters(), 2);
        assert_eq!(probe.exits(), 2);
    }

    #[test]
    fn test_retry_single_attempt_fails() {
        let harness = Harness::new();
        let (flaky, probe) = Probe::new([Failed, Succeeded]);
        let mut step = Retry::new(1, vec![boxed(flaky)]);

        assert_eq!(harness.drive(&mut step, 1.0, 10), vec![Failed]);
        assert_eq!(probe.enters(), 1);
    }

    #[test]
    fn test_retry_restarts_from_first_child() {
        let harness = Harness::new();
        let (first, first_probe) = Probe::settle_after(1, Succeeded);
        let (second, _) = Probe::new([Failed, Succeeded]);
        let mut step = Retry::new(3, vec![boxed(first), boxed(second)]);

        let statuses = harness.drive(&mut step, 1.0, 10);
        assert_eq!(statuses, vec![Running, Running, Running, Succeeded]);
        assert_eq!(first_probe.enters(), 2);
    }

    #[test]
    fn test_group_propagates_failure() {
        let harness = Harness::new();
        let (bad, _) = Probe::settle_after(1, Failed);
        let (never, never_probe) = Probe::settle_after(1, Succeeded);
        let mut group = Group::new(vec![boxed(bad), boxed(never)]);

        assert_eq!(harness.drive(&mut group, 1.0, 5), vec![Failed]);
        assert_eq!(never_probe.enters(), 0);
    }
}
