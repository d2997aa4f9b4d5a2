use std::sync::Arc;
use std::time::Duration;

use fleet_config::{DispatchSettings, TransportConfig};
use fleet_domain::{
    ApiRequest, ApiResponse, ArmTaskRequest, Clock, CoupleTaskRequest, DispatchError,
    DispatchResult, SlotKind, TaskChannel, TaskPayload, VerificationClient, VerificationResult,
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::composer::PayloadComposer;
use crate::gate::{FailureKind, FailureReason, GateSignal, PrerequisiteGate};
use crate::outcome::{DispatchOutcome, OutcomeTracker};
use crate::plan::{PlannedVerification, VerificationPlan};

pub const ARM_TASK_PREFIX: &str = "dispatch_arm_task_";
pub const COUPLE_TASK_PREFIX: &str = "couple_decouple_action_";

/// 前置条件门控的派发协调器
///
/// 并发发出所有校验请求，在单一逻辑线程上逐个处理完成结果；
/// 全部通过后组装并发布任务，再在限定时间内等待关联响应。
pub struct DispatchCoordinator {
    verifier: Arc<dyn VerificationClient>,
    channel: Arc<dyn TaskChannel>,
    clock: Arc<dyn Clock>,
    transport: TransportConfig,
    settings: DispatchSettings,
}

impl DispatchCoordinator {
    pub fn new(
        verifier: Arc<dyn VerificationClient>,
        channel: Arc<dyn TaskChannel>,
        clock: Arc<dyn Clock>,
        transport: TransportConfig,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            verifier,
            channel,
            clock,
            transport,
            settings,
        }
    }

    /// 派发带前置校验的动作任务
    ///
    /// 配置错误在发出任何请求之前以 `Err` 返回；取消、超时和成功
    /// 都以 [`DispatchOutcome`] 返回。
    pub async fn dispatch_arm_task(&self, task: &ArmTaskRequest) -> DispatchResult<DispatchOutcome> {
        let plan = VerificationPlan::for_arm_task(task, &self.settings, &self.transport)?;
        let mut tracker = OutcomeTracker::new();
        let mut gate = PrerequisiteGate::new();

        let signal = gate.register(plan.count(SlotKind::Zone), plan.count(SlotKind::Effector));
        if signal == GateSignal::Ready {
            info!("无需前置校验，直接派发");
        } else if let Err(reason) = self.collect_verifications(&mut gate, plan).await {
            tracker.resolve(DispatchOutcome::Cancelled(reason));
            return finish(tracker);
        }

        let payload = PayloadComposer::new(&self.settings).compose_arm_task(
            task,
            gate.results(),
            self.clock.now(),
        )?;

        self.publish_and_await(payload, ARM_TASK_PREFIX, tracker).await
    }

    /// 派发多机耦合/解耦任务，无前置校验
    pub async fn dispatch_couple_task(
        &self,
        task: &CoupleTaskRequest,
    ) -> DispatchResult<DispatchOutcome> {
        let payload =
            PayloadComposer::new(&self.settings).compose_couple_task(task, self.clock.now())?;

        self.publish_and_await(payload, COUPLE_TASK_PREFIX, OutcomeTracker::new())
            .await
    }

    /// 扇出所有校验请求并在本任务上逐个汇合
    ///
    /// 取消时直接返回，已发出的请求继续运行，其结果因接收端关闭被丢弃。
    async fn collect_verifications(
        &self,
        gate: &mut PrerequisiteGate,
        plan: VerificationPlan,
    ) -> Result<(), FailureReason> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let wait = self.transport.service_wait_timeout();
        let call_timeout = self.transport.verification_timeout();

        for planned in plan.verifications {
            let verifier = Arc::clone(&self.verifier);
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = issue_verification(verifier.as_ref(), &planned, wait, call_timeout).await;
                let _ = tx.send(result);
            });
        }
        drop(tx);

        while let Some(result) = rx.recv().await {
            match gate.apply(result) {
                GateSignal::Ready => return Ok(()),
                GateSignal::Cancelled(reason) => return Err(reason),
                GateSignal::Pending | GateSignal::Ignored => {}
            }
        }

        error!(pending = gate.counters().total(), "校验任务提前结束");
        Err(FailureReason {
            kind: FailureKind::Unavailable,
            token: None,
            target: "verification".to_string(),
            detail: "校验任务未返回结果".to_string(),
        })
    }

    async fn publish_and_await(
        &self,
        payload: TaskPayload,
        prefix: &str,
        mut tracker: OutcomeTracker,
    ) -> DispatchResult<DispatchOutcome> {
        let request_id = format!("{prefix}{}", Uuid::new_v4());
        let message = ApiRequest {
            request_id: request_id.clone(),
            json_msg: serde_json::to_string(&payload)?,
        };
        info!(
            request_id = %request_id,
            request_type = payload.type_name(),
            "任务负载:\n{}",
            serde_json::to_string_pretty(&payload)?
        );

        // 先订阅再发布，避免错过快速到达的响应
        let mut responses = self
            .channel
            .subscribe(&self.transport.task_response_channel)
            .await?;
        self.channel
            .publish(&self.transport.task_request_channel, &message)
            .await?;
        tracker.mark_published();
        tracker.mark_awaiting();

        let bound = self.transport.response_timeout();
        let outcome = match timeout(bound, wait_for_response(&mut responses, &request_id)).await {
            Ok(Some(response)) => match response.decode() {
                Ok(value) => {
                    info!(request_id = %request_id, "收到任务响应");
                    DispatchOutcome::Succeeded {
                        request_id,
                        response: value,
                    }
                }
                Err(err) => {
                    // 任务已被接收方处理，结果未知，不按超时或取消上报
                    error!(request_id = %request_id, error = %err, "任务响应无法解析");
                    return Err(err.into());
                }
            },
            Ok(None) => {
                warn!(request_id = %request_id, "响应通道已关闭");
                timed_out(request_id, bound)
            }
            Err(_) => {
                warn!(request_id = %request_id, "等待任务响应超时");
                timed_out(request_id, bound)
            }
        };

        tracker.resolve(outcome);
        finish(tracker)
    }
}

fn timed_out(request_id: String, bound: Duration) -> DispatchOutcome {
    DispatchOutcome::TimedOut {
        request_id,
        waited_ms: bound.as_millis() as u64,
    }
}

fn finish(tracker: OutcomeTracker) -> DispatchResult<DispatchOutcome> {
    tracker
        .into_outcome()
        .ok_or_else(|| DispatchError::Internal("派发结果未被解析".to_string()))
}

async fn issue_verification(
    verifier: &dyn VerificationClient,
    planned: &PlannedVerification,
    wait: Duration,
    call_timeout: Duration,
) -> VerificationResult {
    let PlannedVerification { service, request } = planned;

    if !verifier.wait_for_service(service, wait).await {
        warn!(service = %service, "等待服务可用超时");
        return VerificationResult::unavailable(
            request,
            format!("服务 {service} 在 {}ms 内不可用", wait.as_millis()),
        );
    }

    info!(
        service = %service,
        token = %request.token,
        target = %request.target,
        "发送前置校验请求"
    );
    match timeout(call_timeout, verifier.call(service, request)).await {
        Ok(Ok(response)) => {
            debug!(token = %request.token, detail = %response.detail, "收到校验应答");
            VerificationResult::from_response(request, response)
        }
        Ok(Err(err)) => {
            error!(service = %service, error = %err, "校验服务调用失败");
            VerificationResult::unavailable(request, err.to_string())
        }
        Err(_) => {
            warn!(service = %service, "校验服务应答超时");
            VerificationResult::unavailable(
                request,
                format!("服务 {service} 在 {}ms 内未应答", call_timeout.as_millis()),
            )
        }
    }
}

/// 只接收与本次请求标识匹配的响应，其余忽略
async fn wait_for_response(
    responses: &mut broadcast::Receiver<ApiResponse>,
    request_id: &str,
) -> Option<ApiResponse> {
    loop {
        match responses.recv().await {
            Ok(response) if response.request_id == request_id => return Some(response),
            Ok(response) => {
                debug!(other = %response.request_id, "忽略无关的任务响应");
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "响应订阅落后，部分消息被跳过");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}
