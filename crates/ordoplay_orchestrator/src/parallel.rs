// SPDX-License-Identifier: MIT OR Apache-2.0
//! Parallel fan-out/fan-in.
//!
//! Children run side by side inside a single tick; there are no threads.
//! When the composite decides early (first failure for `All`, first success
//! for `Any`), children still running are abandoned: they are never ticked
//! again and never see `on_exit`. Steps that acquire something in `on_enter`
//! must not rely on a matching exit when placed under a parallel.

use crate::step::{BoxedStep, Step, StepContext, StepStatus};

/// Fan-in rule for a [`Parallel`] step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParallelMode {
    /// Succeed when every child succeeds, fail on the first failure
    All,
    /// Succeed on the first success, fail when every child failed
    Any,
}

impl ParallelMode {
    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "parallel-all",
            Self::Any => "parallel-any",
        }
    }
}

/// A child plus its settled status for the current activation
struct Branch {
    step: BoxedStep,
    settled: Option<StepStatus>,
}

/// Run every child each tick until the fan-in rule decides
pub struct Parallel {
    mode: ParallelMode,
    branches: Vec<Branch>,
}

impl Parallel {
    /// Create a new parallel step
    pub fn new(mode: ParallelMode, children: Vec<BoxedStep>) -> Self {
        Self {
            mode,
            branches: children
                .into_iter()
                .map(|step| Branch {
                    step,
                    settled: None,
                })
                .collect(),
        }
    }

    /// Parallel-all over `children`
    pub fn all(children: Vec<BoxedStep>) -> Self {
        Self::new(ParallelMode::All, children)
    }

    /// Parallel-any over `children`
    pub fn any(children: Vec<BoxedStep>) -> Self {
        Self::new(ParallelMode::Any, children)
    }

    /// Fan-in rule
    pub fn mode(&self) -> ParallelMode {
        self.mode
    }

    /// Get child count
    pub fn child_count(&self) -> usize {
        self.branches.len()
    }

    fn pending(&self) -> usize {
        self.branches.iter().filter(|b| b.settled.is_none()).count()
    }
}

impl Step for Parallel {
    fn label(&self) -> &str {
        self.mode.name()
    }

    fn on_enter(&mut self, ctx: &StepContext<'_>) {
        for branch in &mut self.branches {
            branch.settled = None;
            branch.step.on_enter(ctx);
        }
    }

    fn tick(&mut self, dt: f32, ctx: &StepContext<'_>) -> StepStatus {
        let mut failed = false;
        let mut succeeded = false;

        for branch in self.branches.iter_mut().filter(|b| b.settled.is_none()) {
            let status = branch.step.tick(dt, ctx);
            if status.is_running() {
                continue;
            }
            branch.step.on_exit(ctx);
            branch.settled = Some(status);
            failed |= status.is_failure();
            succeeded |= status.is_success();
        }

        let pending = self.pending();
        let decided = match self.mode {
            ParallelMode::All if failed => Some(StepStatus::Failed),
            ParallelMode::Any if succeeded => Some(StepStatus::Succeeded),
            ParallelMode::All if pending == 0 => Some(StepStatus::Succeeded),
            ParallelMode::Any if pending == 0 => Some(StepStatus::Failed),
            _ => None,
        };

        match decided {
            Some(status) => {
                if pending > 0 {
                    tracing::debug!(
                        "Sequence '{}': {} settled {:?}, abandoning {} running child(ren)",
                        ctx.sequence,
                        self.mode.name(),
                        status,
                        pending
                    );
                }
                status
            }
            None => StepStatus::Running,
        }
    }
}
