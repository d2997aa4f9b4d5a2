use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use fleet_config::AppConfig;
use fleet_dispatcher::{DispatchCoordinator, DispatchOutcome};
use fleet_domain::{Clock, DispatchResult};
use fleet_infrastructure::{InMemoryBus, SimClock, SystemClock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cli::{DispatchCommand, GlobalOptions};
use crate::embedded::EmbeddedBackend;
use crate::shutdown::ShutdownManager;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_CANCELLED: u8 = 2;
pub const EXIT_TIMED_OUT: u8 = 3;

const SIM_CLOCK_TICK: Duration = Duration::from_millis(10);

/// 派发结果对应的进程退出码
pub fn exit_code(outcome: &DispatchOutcome) -> u8 {
    match outcome {
        DispatchOutcome::Succeeded { .. } => EXIT_SUCCESS,
        DispatchOutcome::Cancelled(_) => EXIT_CANCELLED,
        DispatchOutcome::TimedOut { .. } => EXIT_TIMED_OUT,
    }
}

/// 失败结果的说明：先给出按类别的提示，再附上细节；成功时为 `None`
pub fn failure_summary(outcome: &DispatchOutcome) -> Option<String> {
    let error = outcome.clone().into_result().err()?;
    let summary = match outcome {
        DispatchOutcome::Cancelled(reason) => format!("{}: {reason}", error.user_message()),
        _ => format!("{}: {error}", error.user_message()),
    };
    Some(summary)
}

/// 主应用程序
pub struct Application {
    bus: InMemoryBus,
    coordinator: DispatchCoordinator,
    shutdown_manager: ShutdownManager,
    embedded: Option<EmbeddedBackend>,
    sim_clock_handle: Option<JoinHandle<()>>,
}

impl Application {
    /// 组装总线、时钟和协调器；`--embedded` 时在同一总线上启动模拟后端
    pub async fn new(
        config: AppConfig,
        options: &GlobalOptions,
        command: &DispatchCommand,
    ) -> Result<Self> {
        info!(
            embedded = options.embedded,
            use_sim_time = options.use_sim_time,
            "初始化应用程序"
        );

        let bus = InMemoryBus::new();
        let shutdown_manager = ShutdownManager::new();

        let (clock, sim_clock_handle): (Arc<dyn Clock>, _) = if options.use_sim_time {
            let sim = SimClock::new();
            let handle = sim.drive(SIM_CLOCK_TICK);
            (Arc::new(sim), Some(handle))
        } else {
            (Arc::new(SystemClock), None)
        };

        let embedded = if options.embedded {
            Some(
                EmbeddedBackend::start(
                    &bus,
                    &config.transport,
                    &config.embedded,
                    command.fleet(),
                    &shutdown_manager,
                )
                .await,
            )
        } else {
            warn!("未启用嵌入式后端，校验服务需由外部注册到总线");
            None
        };

        let coordinator = DispatchCoordinator::new(
            Arc::new(bus.clone()),
            Arc::new(bus.clone()),
            clock,
            config.transport.clone(),
            config.dispatch.clone(),
        );

        Ok(Self {
            bus,
            coordinator,
            shutdown_manager,
            embedded,
            sim_clock_handle,
        })
    }

    pub fn bus(&self) -> &InMemoryBus {
        &self.bus
    }

    pub async fn run(&self, command: &DispatchCommand) -> DispatchResult<DispatchOutcome> {
        match command {
            DispatchCommand::Arm(task) => self.coordinator.dispatch_arm_task(task).await,
            DispatchCommand::Couple(task) => self.coordinator.dispatch_couple_task(task).await,
        }
    }

    /// 通知后台任务退出并等待其结束
    pub async fn shutdown(self) {
        self.shutdown_manager.shutdown().await;

        if let Some(handle) = self.sim_clock_handle {
            handle.abort();
        }

        if let Some(embedded) = self.embedded {
            if tokio::time::timeout(Duration::from_secs(5), embedded.join())
                .await
                .is_err()
            {
                warn!("嵌入式后端关闭超时");
            }
        }

        info!("应用已关闭");
    }
}
