//! 嵌入式模拟后端
//!
//! 在内存总线上注册区域查询、执行器查询服务和模拟车队适配器，
//! 无需外部基础设施即可端到端运行派发流程。

pub mod fleet_adapter;
pub mod services;

use std::sync::Arc;

use fleet_config::{EmbeddedConfig, TransportConfig};
use fleet_infrastructure::InMemoryBus;
use tokio::task::JoinHandle;
use tracing::info;

use crate::shutdown::ShutdownManager;

pub use fleet_adapter::SimulatedFleetAdapter;
pub use services::{EffectorQueryService, ZoneQueryService};

pub struct EmbeddedBackend {
    adapter_handle: JoinHandle<()>,
}

impl EmbeddedBackend {
    /// 注册模拟服务并启动车队适配器
    ///
    /// 执行器服务名依赖车队名，未给出车队时不注册执行器服务。
    pub async fn start(
        bus: &InMemoryBus,
        transport: &TransportConfig,
        config: &EmbeddedConfig,
        fleet: Option<&str>,
        shutdown: &ShutdownManager,
    ) -> Self {
        info!("启动嵌入式模拟后端");

        bus.register_service(
            &transport.zone_service,
            Arc::new(ZoneQueryService::from_config(config)),
        )
        .await;

        if let Some(fleet) = fleet.filter(|f| !f.is_empty()) {
            bus.register_service(
                &transport.effector_service(fleet),
                Arc::new(EffectorQueryService::from_config(config)),
            )
            .await;
        }

        let adapter_handle = SimulatedFleetAdapter::new(bus.clone(), transport, config)
            .spawn(shutdown.subscribe().await)
            .await;

        Self { adapter_handle }
    }

    pub async fn join(self) {
        let _ = self.adapter_handle.await;
    }
}
