// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame-driven sequence orchestration for `OrdoPlay`.
//!
//! This crate provides scripted, multi-frame sequencing:
//! - Named, reusable sequences of steps
//! - Timed and frame-counted waits, events, system calls, tweens
//! - Branching, wait-until, timeouts and retries
//! - Parallel fan-out/fan-in
//! - Named rendezvous barriers shared across sequences
//!
//! ## Architecture
//!
//! The orchestrator is built on:
//! - An enter/tick/exit step contract with a tri-state status
//! - Composite steps that drive child steps through the same contract
//! - A registry that ticks every active sequence once per host frame
//! - A fluent builder that assembles immutable step lists
//!
//! Everything runs cooperatively on the thread that owns the scene. The only
//! suspension point is a step returning [`StepStatus::Running`].

pub mod step;
pub mod scene;
pub mod event;
pub mod leaf;
pub mod tween;
pub mod flow;
pub mod parallel;
pub mod barrier;
pub mod sequence;
pub mod orchestrator;
pub mod builder;
pub mod config;

#[cfg(test)]
pub(crate) mod testing;

pub use step::{BoxedStep, Context, EngineContext, Predicate, Step, StepContext, StepStatus};
pub use scene::{EntityId, InMemoryScene, Scene, SystemCommand, Transform};
pub use event::{EventLog, EventPayload, EventSink, NullSink, SequenceEvent};
pub use leaf::{
    Callback, InvokeSystem, PublishEvent, SetComponentEnabled, StartSequence, StopSequence,
    WaitFrames, WaitSeconds,
};
pub use tween::{Easing, Interpolation, TweenStep, TweenTarget};
pub use flow::{ChildFailure, Group, IfElse, Retry, StepList, Timeout, TimeoutPolicy, WaitUntil};
pub use parallel::{Parallel, ParallelMode};
pub use barrier::{Barrier, BarrierBoard};
pub use sequence::{Guard, LifecycleCallback, Sequence, Snapshot, Validator};
pub use orchestrator::{Orchestrator, OrchestratorError};
pub use builder::{SequenceBuilder, StepListBuilder};
pub use config::{ConfigError, OrchestratorConfig};
