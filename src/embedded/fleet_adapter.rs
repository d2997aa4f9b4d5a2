use fleet_config::{EmbeddedConfig, TransportConfig};
use fleet_domain::{ApiRequest, ApiResponse};
use fleet_infrastructure::InMemoryBus;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 模拟的车队适配器：接收派发的任务并回复受理结果
pub struct SimulatedFleetAdapter {
    bus: InMemoryBus,
    request_channel: String,
    response_channel: String,
    respond: bool,
    response_delay: Duration,
}

impl SimulatedFleetAdapter {
    pub fn new(bus: InMemoryBus, transport: &TransportConfig, config: &EmbeddedConfig) -> Self {
        Self {
            bus,
            request_channel: transport.task_request_channel.clone(),
            response_channel: transport.task_response_channel.clone(),
            respond: config.respond,
            response_delay: Duration::from_millis(config.response_delay_ms),
        }
    }

    /// 先完成订阅再返回，保证之后发布的任务不会丢失
    pub async fn spawn(self, mut shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let mut requests = self.bus.subscribe_requests(&self.request_channel).await;
        info!("模拟车队适配器已订阅 '{}'", self.request_channel);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("模拟车队适配器收到关闭信号");
                        break;
                    }
                    received = requests.recv() => match received {
                        Ok(request) => self.handle(request).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("模拟车队适配器落后，跳过 {} 条请求", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        })
    }

    async fn handle(&self, request: ApiRequest) {
        if !self.respond {
            debug!("忽略任务请求 {}", request.request_id);
            return;
        }

        let response = ApiResponse {
            request_id: request.request_id.clone(),
            json_msg: acknowledgement(&request).to_string(),
        };

        if self.response_delay.is_zero() {
            self.bus.publish_response(&self.response_channel, response).await;
            return;
        }

        let bus = self.bus.clone();
        let channel = self.response_channel.clone();
        let delay = self.response_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            bus.publish_response(&channel, response).await;
        });
    }
}

/// 对任务请求生成受理应答
pub fn acknowledgement(request: &ApiRequest) -> Value {
    match serde_json::from_str::<Value>(&request.json_msg) {
        Ok(payload) => json!({
            "success": true,
            "state": {
                "booking": {
                    "id": request.request_id,
                    "unix_millis_earliest_start_time":
                        payload["request"]["unix_millis_earliest_start_time"],
                },
                "category": payload["request"]["description"]["category"],
                "status": "queued",
            }
        }),
        Err(e) => json!({
            "success": false,
            "errors": [{"code": 5, "category": "Invalid request format", "detail": e.to_string()}],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acknowledgement_echoes_booking() {
        let request = ApiRequest {
            request_id: "dispatch_arm_task_1".to_string(),
            json_msg: json!({
                "type": "dispatch_task_request",
                "request": {
                    "category": "compose",
                    "unix_millis_earliest_start_time": 42,
                    "description": {"category": "scan", "phases": []}
                }
            })
            .to_string(),
        };

        let ack = acknowledgement(&request);
        assert_eq!(ack["success"], true);
        assert_eq!(ack["state"]["booking"]["id"], "dispatch_arm_task_1");
        assert_eq!(ack["state"]["category"], "scan");
    }

    #[test]
    fn test_acknowledgement_rejects_invalid_json() {
        let request = ApiRequest {
            request_id: "r1".to_string(),
            json_msg: "not json".to_string(),
        };
        assert_eq!(acknowledgement(&request)["success"], false);
    }

    #[tokio::test]
    async fn test_adapter_replies_on_bus() {
        let bus = InMemoryBus::new();
        let transport = TransportConfig::default();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = SimulatedFleetAdapter::new(bus.clone(), &transport, &EmbeddedConfig::default())
            .spawn(shutdown_rx)
            .await;

        let mut responses = fleet_domain::TaskChannel::subscribe(&bus, "task_api_responses")
            .await
            .unwrap();
        let request = ApiRequest {
            request_id: "r1".to_string(),
            json_msg: "{}".to_string(),
        };
        fleet_domain::TaskChannel::publish(&bus, "task_api_requests", &request)
            .await
            .unwrap();

        let response = responses.recv().await.unwrap();
        assert_eq!(response.request_id, "r1");

        let _ = shutdown_tx.send(());
        handle.await.unwrap();
    }
}
