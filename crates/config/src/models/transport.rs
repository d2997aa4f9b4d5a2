use std::time::Duration;

use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

/// 消息通道与校验服务的命名及等待上限
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    pub task_request_channel: String,
    pub task_response_channel: String,
    pub zone_service: String,
    /// 执行器校验服务名 = 车队名 + 后缀
    pub effector_service_suffix: String,
    pub service_wait_timeout_ms: u64,
    /// 单次校验请求的应答上限
    pub verification_timeout_ms: u64,
    pub response_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            task_request_channel: "task_api_requests".to_string(),
            task_response_channel: "task_api_responses".to_string(),
            zone_service: "mm_zone_query".to_string(),
            effector_service_suffix: "_effector_query".to_string(),
            service_wait_timeout_ms: 5000,
            verification_timeout_ms: 5000,
            response_timeout_ms: 5000,
        }
    }
}

impl TransportConfig {
    pub fn effector_service(&self, fleet: &str) -> String {
        format!("{fleet}{}", self.effector_service_suffix)
    }

    pub fn service_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.service_wait_timeout_ms)
    }

    pub fn verification_timeout(&self) -> Duration {
        Duration::from_millis(self.verification_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl ConfigValidator for TransportConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(
            &self.task_request_channel,
            "transport.task_request_channel",
        )?;
        ValidationUtils::validate_not_empty(
            &self.task_response_channel,
            "transport.task_response_channel",
        )?;
        ValidationUtils::validate_not_empty(&self.zone_service, "transport.zone_service")?;
        ValidationUtils::validate_not_empty(
            &self.effector_service_suffix,
            "transport.effector_service_suffix",
        )?;
        ValidationUtils::validate_timeout_ms(
            self.service_wait_timeout_ms,
            "transport.service_wait_timeout_ms",
        )?;
        ValidationUtils::validate_timeout_ms(
            self.verification_timeout_ms,
            "transport.verification_timeout_ms",
        )?;
        ValidationUtils::validate_timeout_ms(
            self.response_timeout_ms,
            "transport.response_timeout_ms",
        )?;
        Ok(())
    }
}
