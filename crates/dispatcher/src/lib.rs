//! 前置条件门控的任务派发
//!
//! 校验计划、汇合门控、负载组装和结果跟踪在此组合为 [`DispatchCoordinator`]。

pub mod aggregator;
pub mod composer;
pub mod coordinator;
pub mod gate;
pub mod outcome;
pub mod plan;

#[cfg(test)]
pub mod test_utils;

pub use aggregator::{ResultAggregator, ZoneAttribute};
pub use composer::PayloadComposer;
pub use coordinator::{DispatchCoordinator, ARM_TASK_PREFIX, COUPLE_TASK_PREFIX};
pub use gate::{FailureKind, FailureReason, GateSignal, PendingCounters, PrerequisiteGate};
pub use outcome::{DispatchOutcome, DispatchState, OutcomeTracker};
pub use plan::{PlannedVerification, VerificationPlan};
