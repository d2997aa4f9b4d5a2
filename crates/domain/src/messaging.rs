use std::time::Duration;

use async_trait::async_trait;
use fleet_errors::DispatchResult;
use tokio::sync::broadcast;

use crate::entities::{ApiRequest, ApiResponse, VerificationRequest, VerificationResponse};

/// 前置条件校验服务的请求/应答接口
#[async_trait]
pub trait VerificationClient: Send + Sync {
    /// 在限定时间内等待服务可用
    async fn wait_for_service(&self, service: &str, timeout: Duration) -> bool;

    /// 发起一次请求/应答交换；连接失败返回 `TransportUnavailable`
    async fn call(
        &self,
        service: &str,
        request: &VerificationRequest,
    ) -> DispatchResult<VerificationResponse>;
}

/// 任务派发通道：广播发布请求，订阅响应
#[async_trait]
pub trait TaskChannel: Send + Sync {
    async fn publish(&self, channel: &str, request: &ApiRequest) -> DispatchResult<()>;

    async fn subscribe(&self, channel: &str) -> DispatchResult<broadcast::Receiver<ApiResponse>>;
}
