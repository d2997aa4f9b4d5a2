use fleet_domain::{DispatchError, DispatchResult};
use serde_json::Value;
use tracing::warn;

use crate::gate::FailureReason;

/// 一次派发尝试的最终结果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Succeeded { request_id: String, response: Value },
    Cancelled(FailureReason),
    TimedOut { request_id: String, waited_ms: u64 },
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Succeeded { .. })
    }

    pub fn into_result(self) -> DispatchResult<Value> {
        match self {
            DispatchOutcome::Succeeded { response, .. } => Ok(response),
            DispatchOutcome::Cancelled(reason) => Err(reason.to_error()),
            DispatchOutcome::TimedOut {
                request_id,
                waited_ms,
            } => Err(DispatchError::ResponseTimeout {
                request_id,
                waited_ms,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    PendingPrerequisites,
    Published,
    AwaitingResponse,
    ResolvedSuccess,
    ResolvedTimeout,
    Cancelled,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchState::ResolvedSuccess | DispatchState::ResolvedTimeout | DispatchState::Cancelled
        )
    }

    /// 状态只能单向前进
    pub fn can_transition_to(&self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (PendingPrerequisites, Published)
                | (PendingPrerequisites, Cancelled)
                | (Published, AwaitingResponse)
                | (AwaitingResponse, ResolvedSuccess)
                | (AwaitingResponse, ResolvedTimeout)
        )
    }
}

/// 单次赋值的结果持有者
///
/// 第一次合法的解析生效；之后的解析是确定性的空操作，返回 `false`。
#[derive(Debug)]
pub struct OutcomeTracker {
    state: DispatchState,
    outcome: Option<DispatchOutcome>,
}

impl Default for OutcomeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeTracker {
    pub fn new() -> Self {
        Self {
            state: DispatchState::PendingPrerequisites,
            outcome: None,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn mark_published(&mut self) -> bool {
        self.advance(DispatchState::Published)
    }

    pub fn mark_awaiting(&mut self) -> bool {
        self.advance(DispatchState::AwaitingResponse)
    }

    pub fn resolve(&mut self, outcome: DispatchOutcome) -> bool {
        let next = match &outcome {
            DispatchOutcome::Succeeded { .. } => DispatchState::ResolvedSuccess,
            DispatchOutcome::TimedOut { .. } => DispatchState::ResolvedTimeout,
            DispatchOutcome::Cancelled(_) => DispatchState::Cancelled,
        };
        if !self.advance(next) {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    fn advance(&mut self, next: DispatchState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!(from = ?self.state, to = ?next, "忽略无效的派发状态转换");
            return false;
        }
        self.state = next;
        true
    }

    pub fn outcome(&self) -> Option<&DispatchOutcome> {
        self.outcome.as_ref()
    }

    pub fn into_outcome(self) -> Option<DispatchOutcome> {
        self.outcome
    }
}
