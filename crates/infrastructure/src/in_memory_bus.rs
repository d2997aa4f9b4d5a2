use async_trait::async_trait;
use fleet_domain::{
    ApiRequest, ApiResponse, TaskChannel, VerificationClient, VerificationRequest,
    VerificationResponse,
};
use fleet_errors::{DispatchError, DispatchResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// 注册在总线上的请求/应答服务
#[async_trait]
pub trait ServiceHandler: Send + Sync {
    async fn handle(&self, request: &VerificationRequest) -> DispatchResult<VerificationResponse>;
}

#[derive(Debug, Clone)]
pub struct InMemoryBusConfig {
    /// 每个话题的广播缓冲容量
    pub channel_capacity: usize,
    /// 等待服务上线时的轮询间隔（毫秒）
    pub service_poll_interval_ms: u64,
}

impl Default for InMemoryBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            service_poll_interval_ms: 50,
        }
    }
}

/// 内存消息总线
///
/// 进程内的服务注册表加发布/订阅话题，适用于嵌入式部署和集成测试。
/// 请求话题承载 [`ApiRequest`]，响应话题承载 [`ApiResponse`]。
#[derive(Clone)]
pub struct InMemoryBus {
    services: Arc<RwLock<HashMap<String, Arc<dyn ServiceHandler>>>>,
    request_topics: Arc<RwLock<HashMap<String, broadcast::Sender<ApiRequest>>>>,
    response_topics: Arc<RwLock<HashMap<String, broadcast::Sender<ApiResponse>>>>,
    config: InMemoryBusConfig,
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_config(InMemoryBusConfig::default())
    }

    pub fn with_config(config: InMemoryBusConfig) -> Self {
        debug!("Creating in-memory bus with config: {:?}", config);
        Self {
            services: Arc::new(RwLock::new(HashMap::new())),
            request_topics: Arc::new(RwLock::new(HashMap::new())),
            response_topics: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub async fn register_service(&self, name: &str, handler: Arc<dyn ServiceHandler>) {
        info!("注册服务: {}", name);
        self.services.write().await.insert(name.to_string(), handler);
    }

    pub async fn has_service(&self, name: &str) -> bool {
        self.services.read().await.contains_key(name)
    }

    /// 订阅请求话题，供模拟车队适配器接收派发的任务
    pub async fn subscribe_requests(&self, channel: &str) -> broadcast::Receiver<ApiRequest> {
        self.request_sender(channel).await.subscribe()
    }

    /// 在响应话题上发布；返回收到消息的订阅者数量
    pub async fn publish_response(&self, channel: &str, response: ApiResponse) -> usize {
        let sender = self.response_sender(channel).await;
        match sender.send(response) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("响应话题 '{}' 没有订阅者", channel);
                0
            }
        }
    }

    async fn request_sender(&self, channel: &str) -> broadcast::Sender<ApiRequest> {
        if let Some(sender) = self.request_topics.read().await.get(channel) {
            return sender.clone();
        }
        let mut topics = self.request_topics.write().await;
        topics
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0)
            .clone()
    }

    async fn response_sender(&self, channel: &str) -> broadcast::Sender<ApiResponse> {
        if let Some(sender) = self.response_topics.read().await.get(channel) {
            return sender.clone();
        }
        let mut topics = self.response_topics.write().await;
        topics
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.config.channel_capacity).0)
            .clone()
    }
}

#[async_trait]
impl VerificationClient for InMemoryBus {
    async fn wait_for_service(&self, service: &str, timeout: Duration) -> bool {
        let poll = Duration::from_millis(self.config.service_poll_interval_ms.max(1));
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            if self.has_service(service).await {
                return true;
            }
            if tokio::time::Instant::now() >= deadline {
                return false;
            }
            debug!("服务 '{}' 尚未就绪，继续等待", service);
            tokio::time::sleep(poll).await;
        }
    }

    async fn call(
        &self,
        service: &str,
        request: &VerificationRequest,
    ) -> DispatchResult<VerificationResponse> {
        let handler = self.services.read().await.get(service).cloned();
        match handler {
            Some(handler) => handler.handle(request).await,
            None => {
                warn!("调用未注册的服务: {}", service);
                Err(DispatchError::unavailable(service, "服务未注册"))
            }
        }
    }
}

#[async_trait]
impl TaskChannel for InMemoryBus {
    async fn publish(&self, channel: &str, request: &ApiRequest) -> DispatchResult<()> {
        debug!("Publishing request '{}' to '{}'", request.request_id, channel);
        let sender = self.request_sender(channel).await;
        // 无订阅者时消息被丢弃，与话题语义一致
        if sender.send(request.clone()).is_err() {
            warn!("请求话题 '{}' 没有订阅者，消息 {} 未被接收", channel, request.request_id);
        }
        Ok(())
    }

    async fn subscribe(&self, channel: &str) -> DispatchResult<broadcast::Receiver<ApiResponse>> {
        Ok(self.response_sender(channel).await.subscribe())
    }
}
