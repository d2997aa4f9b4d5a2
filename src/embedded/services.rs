use async_trait::async_trait;
use fleet_config::EmbeddedConfig;
use fleet_domain::{DispatchResult, VerificationRequest, VerificationResponse};
use fleet_infrastructure::ServiceHandler;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// 模拟的对象区域查询服务
#[derive(Debug, Clone, Default)]
pub struct ZoneQueryService {
    zones: HashMap<String, String>,
}

impl ZoneQueryService {
    pub fn from_config(config: &EmbeddedConfig) -> Self {
        Self {
            zones: config
                .zones
                .iter()
                .map(|entry| (entry.object.clone(), entry.zone.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl ServiceHandler for ZoneQueryService {
    async fn handle(&self, request: &VerificationRequest) -> DispatchResult<VerificationResponse> {
        debug!("区域查询: {}", request.target);
        let response = match self.zones.get(&request.target) {
            Some(zone) => VerificationResponse::confirmed(
                Some(zone.clone()),
                format!("{} is in {}", request.target, zone),
            ),
            None => VerificationResponse::negative(format!("{} is not in any zone", request.target)),
        };
        Ok(response)
    }
}

/// 模拟的执行器就绪查询服务
#[derive(Debug, Clone, Default)]
pub struct EffectorQueryService {
    ready_actions: HashSet<String>,
}

impl EffectorQueryService {
    pub fn from_config(config: &EmbeddedConfig) -> Self {
        Self {
            ready_actions: config.ready_actions.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl ServiceHandler for EffectorQueryService {
    async fn handle(&self, request: &VerificationRequest) -> DispatchResult<VerificationResponse> {
        debug!("执行器查询: {} (robot: {})", request.target, request.requester);
        let response = if self.ready_actions.contains(&request.target) {
            VerificationResponse::confirmed(None, format!("{} ready", request.target))
        } else {
            VerificationResponse::negative(format!("{} not ready", request.target))
        };
        Ok(response)
    }
}
