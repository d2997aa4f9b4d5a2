use fleet_domain::{
    DispatchError, SlotIndex, SlotKind, SlotToken, VerificationOutcome, VerificationResult,
};
use tracing::{debug, info, warn};

use crate::aggregator::ResultAggregator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingCounters {
    pub zone_requests_pending: u32,
    pub effector_checks_pending: u32,
}

impl PendingCounters {
    pub fn is_clear(&self) -> bool {
        self.zone_requests_pending == 0 && self.effector_checks_pending == 0
    }

    pub fn total(&self) -> u32 {
        self.zone_requests_pending + self.effector_checks_pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Rejected,
    Unavailable,
}

/// 导致整次派发取消的失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub token: Option<SlotToken>,
    pub target: String,
    pub detail: String,
}

impl FailureReason {
    pub fn rejected(token: SlotToken, target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Rejected,
            token: Some(token),
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn unavailable(
        token: SlotToken,
        target: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: FailureKind::Unavailable,
            token: Some(token),
            target: target.into(),
            detail: detail.into(),
        }
    }

    pub fn to_error(&self) -> DispatchError {
        match self.kind {
            FailureKind::Rejected => DispatchError::rejected(&self.target, &self.detail),
            FailureKind::Unavailable => DispatchError::unavailable(&self.target, &self.detail),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.token {
            Some(token) => write!(f, "[{token}] {}", self.to_error()),
            None => write!(f, "{}", self.to_error()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Unregistered,
    Collecting,
    Fired,
    Cancelled,
}

/// 每次上报后门控给出的信号
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateSignal {
    /// 仍有未完成的校验
    Pending,
    /// 全部校验通过，只会出现一次
    Ready,
    /// 首个失败，整次派发取消
    Cancelled(FailureReason),
    /// 取消或就绪之后到达的上报，不产生任何效果
    Ignored,
}

/// 前置条件门控
///
/// 计数器和结果都由门控独占，所有修改都经过 `report_*`。
/// 就绪判断与状态切换在同一个 `&mut self` 调用里完成，因此
/// 无论完成顺序如何，`Ready` 至多返回一次。
#[derive(Debug)]
pub struct PrerequisiteGate {
    counters: PendingCounters,
    results: ResultAggregator,
    state: GateState,
}

impl Default for PrerequisiteGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PrerequisiteGate {
    pub fn new() -> Self {
        Self {
            counters: PendingCounters::default(),
            results: ResultAggregator::new(),
            state: GateState::Unregistered,
        }
    }

    pub fn register(&mut self, expected_zone_checks: u32, expected_effector_checks: u32) -> GateSignal {
        if self.state != GateState::Unregistered {
            warn!("门控已注册，忽略重复注册");
            return GateSignal::Ignored;
        }

        self.counters = PendingCounters {
            zone_requests_pending: expected_zone_checks,
            effector_checks_pending: expected_effector_checks,
        };
        self.state = GateState::Collecting;
        debug!(
            zone_checks = expected_zone_checks,
            effector_checks = expected_effector_checks,
            "注册前置校验"
        );

        self.try_fire()
    }

    pub fn report_zone_success(&mut self, slot: SlotIndex, attribute: impl Into<String>) -> GateSignal {
        if self.state != GateState::Collecting {
            debug!(%slot, "忽略门控关闭后到达的区域校验结果");
            return GateSignal::Ignored;
        }
        if self.counters.zone_requests_pending == 0 {
            warn!(%slot, "收到多余的区域校验结果");
            return GateSignal::Ignored;
        }

        let zone = attribute.into();
        info!(%slot, zone = %zone, "区域校验通过");
        self.results.record_zone(slot, zone);
        self.counters.zone_requests_pending -= 1;

        self.try_fire()
    }

    pub fn report_effector_success(&mut self, slot: SlotIndex) -> GateSignal {
        if self.state != GateState::Collecting {
            debug!(%slot, "忽略门控关闭后到达的执行器校验结果");
            return GateSignal::Ignored;
        }
        if self.counters.effector_checks_pending == 0 {
            warn!(%slot, "收到多余的执行器校验结果");
            return GateSignal::Ignored;
        }

        info!(%slot, label = slot.action_label(), "执行器校验通过");
        self.counters.effector_checks_pending -= 1;

        self.try_fire()
    }

    pub fn report_failure(&mut self, reason: FailureReason) -> GateSignal {
        match self.state {
            GateState::Unregistered | GateState::Collecting => {
                warn!(reason = %reason, "前置校验失败，取消派发");
                self.state = GateState::Cancelled;
                self.results.discard();
                GateSignal::Cancelled(reason)
            }
            GateState::Fired | GateState::Cancelled => {
                debug!(reason = %reason, "门控已关闭，忽略失败上报");
                GateSignal::Ignored
            }
        }
    }

    /// 按结果携带的令牌路由到对应的上报方法
    pub fn apply(&mut self, result: VerificationResult) -> GateSignal {
        let VerificationResult {
            token,
            target,
            outcome,
        } = result;

        match (token.kind, outcome) {
            (SlotKind::Zone, VerificationOutcome::Confirmed(Some(zone))) => {
                self.report_zone_success(token.slot, zone)
            }
            (SlotKind::Zone, VerificationOutcome::Confirmed(None)) => self.report_failure(
                FailureReason::rejected(token, target, "区域校验未返回区域名"),
            ),
            (SlotKind::Effector, VerificationOutcome::Confirmed(_)) => {
                self.report_effector_success(token.slot)
            }
            (_, VerificationOutcome::Rejected(detail)) => {
                self.report_failure(FailureReason::rejected(token, target, detail))
            }
            (_, VerificationOutcome::Unavailable(detail)) => {
                self.report_failure(FailureReason::unavailable(token, target, detail))
            }
        }
    }

    fn try_fire(&mut self) -> GateSignal {
        if self.state == GateState::Collecting && self.counters.is_clear() {
            self.state = GateState::Fired;
            info!("所有前置校验完成，准备派发");
            return GateSignal::Ready;
        }
        GateSignal::Pending
    }

    pub fn counters(&self) -> PendingCounters {
        self.counters
    }

    /// 就绪之后才应读取
    pub fn results(&self) -> &ResultAggregator {
        &self.results
    }

    pub fn has_fired(&self) -> bool {
        self.state == GateState::Fired
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == GateState::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain::VerificationRequest;

    fn zone_ok(slot: SlotIndex, zone: &str) -> VerificationResult {
        VerificationResult {
            token: SlotToken::zone(slot),
            target: format!("object-{slot}"),
            outcome: VerificationOutcome::Confirmed(Some(zone.to_string())),
        }
    }

    fn effector_ok(slot: SlotIndex) -> VerificationResult {
        VerificationResult {
            token: SlotToken::effector(slot),
            target: format!("action-{slot}"),
            outcome: VerificationOutcome::Confirmed(None),
        }
    }

    fn rejected(token: SlotToken) -> VerificationResult {
        VerificationResult {
            token,
            target: "target".to_string(),
            outcome: VerificationOutcome::Rejected("not ready".to_string()),
        }
    }

    /// 生成全部排列
    fn permutations(items: Vec<VerificationResult>) -> Vec<Vec<VerificationResult>> {
        if items.len() <= 1 {
            return vec![items];
        }
        let mut all = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.clone();
            let head = rest.remove(i);
            for mut tail in permutations(rest) {
                tail.insert(0, head.clone());
                all.push(tail);
            }
        }
        all
    }

    fn full_set() -> Vec<VerificationResult> {
        vec![
            zone_ok(SlotIndex::First, "Z1"),
            zone_ok(SlotIndex::Second, "Z2"),
            effector_ok(SlotIndex::First),
            effector_ok(SlotIndex::Second),
        ]
    }

    #[test]
    fn test_zero_prerequisites_ready_on_register() {
        let mut gate = PrerequisiteGate::new();
        assert_eq!(gate.register(0, 0), GateSignal::Ready);
        assert!(gate.has_fired());
        // 已就绪后再上报不会再次触发
        assert_eq!(gate.report_effector_success(SlotIndex::First), GateSignal::Ignored);
    }

    #[test]
    fn test_ready_exactly_once_for_every_completion_order() {
        for order in permutations(full_set()) {
            let mut gate = PrerequisiteGate::new();
            assert_eq!(gate.register(2, 2), GateSignal::Pending);

            let signals: Vec<GateSignal> = order.into_iter().map(|r| gate.apply(r)).collect();
            let ready_count = signals.iter().filter(|s| **s == GateSignal::Ready).count();

            assert_eq!(ready_count, 1);
            assert_eq!(signals.last(), Some(&GateSignal::Ready));
            assert_eq!(gate.results().zone(SlotIndex::First), Some("Z1"));
            assert_eq!(gate.results().zone(SlotIndex::Second), Some("Z2"));
        }
    }

    #[test]
    fn test_single_failure_cancels_for_every_position() {
        let failures = [
            SlotToken::zone(SlotIndex::First),
            SlotToken::zone(SlotIndex::Second),
            SlotToken::effector(SlotIndex::First),
            SlotToken::effector(SlotIndex::Second),
        ];

        for failing in failures {
            let set: Vec<VerificationResult> = full_set()
                .into_iter()
                .map(|r| if r.token == failing { rejected(failing) } else { r })
                .collect();

            for order in permutations(set) {
                let mut gate = PrerequisiteGate::new();
                gate.register(2, 2);

                let signals: Vec<GateSignal> = order.into_iter().map(|r| gate.apply(r)).collect();

                assert!(!signals.contains(&GateSignal::Ready));
                let cancelled = signals
                    .iter()
                    .filter(|s| matches!(s, GateSignal::Cancelled(_)))
                    .count();
                assert_eq!(cancelled, 1);

                // 取消之后的上报全部被忽略
                let position = signals
                    .iter()
                    .position(|s| matches!(s, GateSignal::Cancelled(_)))
                    .unwrap();
                assert!(signals[position + 1..].iter().all(|s| *s == GateSignal::Ignored));
                assert!(gate.is_cancelled());
            }
        }
    }

    #[test]
    fn test_late_success_after_failure_does_not_decrement() {
        let mut gate = PrerequisiteGate::new();
        gate.register(1, 1);
        gate.apply(rejected(SlotToken::effector(SlotIndex::First)));
        let before = gate.counters();

        assert_eq!(
            gate.report_zone_success(SlotIndex::First, "Z3"),
            GateSignal::Ignored
        );
        assert_eq!(gate.counters(), before);
        assert_eq!(gate.results().zone(SlotIndex::First), None);
    }

    #[test]
    fn test_failure_after_cancellation_is_ignored() {
        let mut gate = PrerequisiteGate::new();
        gate.register(0, 2);
        let first = gate.apply(rejected(SlotToken::effector(SlotIndex::First)));
        assert!(matches!(first, GateSignal::Cancelled(_)));

        let second = gate.report_failure(FailureReason::unavailable(
            SlotToken::effector(SlotIndex::Second),
            "fleet_effector_query",
            "timeout",
        ));
        assert_eq!(second, GateSignal::Ignored);
    }

    #[test]
    fn test_cancellation_discards_confirmed_zone() {
        let mut gate = PrerequisiteGate::new();
        gate.register(2, 0);
        gate.apply(zone_ok(SlotIndex::First, "Z1"));
        assert_eq!(gate.results().zone(SlotIndex::First), Some("Z1"));

        gate.apply(rejected(SlotToken::zone(SlotIndex::Second)));
        assert_eq!(gate.results().zone(SlotIndex::First), None);
    }

    #[test]
    fn test_unavailable_routes_to_failure() {
        let request = VerificationRequest::zone(SlotIndex::First, "bin7");
        let mut gate = PrerequisiteGate::new();
        gate.register(1, 1);

        let signal = gate.apply(VerificationResult::unavailable(&request, "service missing"));
        match signal {
            GateSignal::Cancelled(reason) => {
                assert_eq!(reason.kind, FailureKind::Unavailable);
                assert!(reason.to_error().is_prerequisite_failure());
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[test]
    fn test_zone_confirmation_without_zone_is_rejected() {
        let mut gate = PrerequisiteGate::new();
        gate.register(1, 0);
        let signal = gate.apply(VerificationResult {
            token: SlotToken::zone(SlotIndex::First),
            target: "bin7".to_string(),
            outcome: VerificationOutcome::Confirmed(None),
        });
        assert!(matches!(signal, GateSignal::Cancelled(_)));
    }

    #[test]
    fn test_surplus_report_is_ignored() {
        let mut gate = PrerequisiteGate::new();
        gate.register(1, 1);
        assert_eq!(gate.apply(effector_ok(SlotIndex::First)), GateSignal::Pending);
        assert_eq!(gate.apply(effector_ok(SlotIndex::Second)), GateSignal::Ignored);
        assert_eq!(gate.counters().total(), 1);
        assert_eq!(gate.apply(zone_ok(SlotIndex::First, "Z1")), GateSignal::Ready);
    }

    #[test]
    fn test_double_register_is_ignored() {
        let mut gate = PrerequisiteGate::new();
        gate.register(1, 0);
        assert_eq!(gate.register(0, 0), GateSignal::Ignored);
        assert_eq!(gate.counters().zone_requests_pending, 1);
    }
}
