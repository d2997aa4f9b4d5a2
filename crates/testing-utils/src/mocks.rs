//! 校验服务、任务通道和时钟的内存 mock

use async_trait::async_trait;
use fleet_domain::{
    ApiRequest, ApiResponse, Clock, SlotKind, TaskChannel, Timestamp, VerificationClient,
    VerificationRequest, VerificationResponse,
};
use fleet_errors::{DispatchError, DispatchResult};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

/// 可编程的前置条件校验服务
///
/// 区域查询按对象名返回配置的区域，执行器查询对 `ready` 集合内的动作返回成功。
#[derive(Debug, Clone, Default)]
pub struct MockVerificationClient {
    zones: Arc<Mutex<HashMap<String, String>>>,
    ready_actions: Arc<Mutex<HashSet<String>>>,
    unavailable_services: Arc<Mutex<HashSet<String>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    call_errors: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<(String, VerificationRequest)>>>,
}

impl MockVerificationClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(self, object_name: &str, zone: &str) -> Self {
        self.zones
            .lock()
            .unwrap()
            .insert(object_name.to_string(), zone.to_string());
        self
    }

    pub fn with_ready(self, action: &str) -> Self {
        self.ready_actions.lock().unwrap().insert(action.to_string());
        self
    }

    pub fn with_unavailable_service(self, service: &str) -> Self {
        self.unavailable_services
            .lock()
            .unwrap()
            .insert(service.to_string());
        self
    }

    /// 对指定目标的应答延迟
    pub fn with_delay(self, target: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(target.to_string(), delay);
        self
    }

    /// 对指定目标的调用返回传输错误
    pub fn with_call_error(self, target: &str) -> Self {
        self.call_errors.lock().unwrap().insert(target.to_string());
        self
    }

    pub fn calls(&self) -> Vec<(String, VerificationRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl VerificationClient for MockVerificationClient {
    async fn wait_for_service(&self, service: &str, _timeout: Duration) -> bool {
        !self.unavailable_services.lock().unwrap().contains(service)
    }

    async fn call(
        &self,
        service: &str,
        request: &VerificationRequest,
    ) -> DispatchResult<VerificationResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((service.to_string(), request.clone()));

        let delay = self.delays.lock().unwrap().get(&request.target).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.call_errors.lock().unwrap().contains(&request.target) {
            return Err(DispatchError::unavailable(service, "connection reset"));
        }

        let response = match request.token.kind {
            SlotKind::Zone => match self.zones.lock().unwrap().get(&request.target) {
                Some(zone) => VerificationResponse::confirmed(Some(zone.clone()), "zone found"),
                None => VerificationResponse::negative(format!("{} is not in a zone", request.target)),
            },
            SlotKind::Effector => {
                if self.ready_actions.lock().unwrap().contains(&request.target) {
                    VerificationResponse::confirmed(None, "effector ready")
                } else {
                    VerificationResponse::negative(format!("{} is not ready", request.target))
                }
            }
        };
        Ok(response)
    }
}

/// 任务通道在收到发布后的应答方式
#[derive(Debug, Clone)]
pub enum ReplyMode {
    Silent,
    Reply(Value),
    /// 先发一条无关请求标识的响应，再发匹配的响应
    ReplyAfterNoise(Value),
    ReplyAfter(Duration, Value),
    /// 原样回复 `json_msg`，可用于构造无法解析的响应
    ReplyRaw(String),
}

/// 记录所有发布的任务通道
#[derive(Debug, Clone)]
pub struct RecordingTaskChannel {
    responses: broadcast::Sender<ApiResponse>,
    published: Arc<Mutex<Vec<(String, ApiRequest)>>>,
    reply: Arc<Mutex<ReplyMode>>,
}

impl RecordingTaskChannel {
    pub fn new(reply: ReplyMode) -> Self {
        let (responses, _) = broadcast::channel(64);
        Self {
            responses,
            published: Arc::new(Mutex::new(Vec::new())),
            reply: Arc::new(Mutex::new(reply)),
        }
    }

    pub fn silent() -> Self {
        Self::new(ReplyMode::Silent)
    }

    pub fn replying(response: Value) -> Self {
        Self::new(ReplyMode::Reply(response))
    }

    pub fn published(&self) -> Vec<(String, ApiRequest)> {
        self.published.lock().unwrap().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    /// 解析最后一次发布的任务负载
    pub fn last_payload(&self) -> Option<Value> {
        self.published
            .lock()
            .unwrap()
            .last()
            .and_then(|(_, request)| serde_json::from_str(&request.json_msg).ok())
    }

    /// 直接注入一条响应
    pub fn respond(&self, request_id: &str, response: &Value) {
        self.respond_raw(request_id, &response.to_string());
    }

    pub fn respond_raw(&self, request_id: &str, json_msg: &str) {
        let _ = self.responses.send(ApiResponse {
            request_id: request_id.to_string(),
            json_msg: json_msg.to_string(),
        });
    }
}

#[async_trait]
impl TaskChannel for RecordingTaskChannel {
    async fn publish(&self, channel: &str, request: &ApiRequest) -> DispatchResult<()> {
        self.published
            .lock()
            .unwrap()
            .push((channel.to_string(), request.clone()));

        let reply = self.reply.lock().unwrap().clone();
        match reply {
            ReplyMode::Silent => {}
            ReplyMode::Reply(response) => self.respond(&request.request_id, &response),
            ReplyMode::ReplyAfterNoise(response) => {
                self.respond("unrelated_request", &serde_json::json!({"success": false}));
                self.respond(&request.request_id, &response);
            }
            ReplyMode::ReplyAfter(delay, response) => {
                let channel = self.clone();
                let request_id = request.request_id.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    channel.respond(&request_id, &response);
                });
            }
            ReplyMode::ReplyRaw(json_msg) => self.respond_raw(&request.request_id, &json_msg),
        }
        Ok(())
    }

    async fn subscribe(&self, _channel: &str) -> DispatchResult<broadcast::Receiver<ApiResponse>> {
        Ok(self.responses.subscribe())
    }
}

/// 手动推进的时钟
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Timestamp>>,
}

impl ManualClock {
    pub fn new(secs: i64, nanos: u32) -> Self {
        Self {
            now: Arc::new(Mutex::new(Timestamp::new(secs, nanos))),
        }
    }

    pub fn set(&self, now: Timestamp) {
        *self.now.lock().unwrap() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        let nanos = u64::from(now.nanos) + u64::from(by.subsec_nanos());
        now.secs += by.as_secs() as i64 + (nanos / 1_000_000_000) as i64;
        now.nanos = (nanos % 1_000_000_000) as u32;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_domain::SlotIndex;

    #[tokio::test]
    async fn test_mock_verification_client() {
        let client = MockVerificationClient::new()
            .with_zone("bin7", "zone_a")
            .with_ready("pick");

        let zone = client
            .call("mm_zone_query", &VerificationRequest::zone(SlotIndex::First, "bin7"))
            .await
            .unwrap();
        assert_eq!(zone.attribute.as_deref(), Some("zone_a"));

        let effector = client
            .call(
                "mm_effector_query",
                &VerificationRequest::effector(SlotIndex::First, "place", "mm_1"),
            )
            .await
            .unwrap();
        assert!(!effector.success);
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_recording_channel_replies_to_subscribers() {
        let channel = RecordingTaskChannel::replying(serde_json::json!({"success": true}));
        let mut responses = channel.subscribe("task_api_responses").await.unwrap();

        let request = ApiRequest {
            request_id: "r1".to_string(),
            json_msg: "{}".to_string(),
        };
        channel.publish("task_api_requests", &request).await.unwrap();

        let response = responses.recv().await.unwrap();
        assert_eq!(response.request_id, "r1");
        assert_eq!(channel.publish_count(), 1);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(10, 900_000_000);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now(), Timestamp::new(11, 150_000_000));
    }
}
