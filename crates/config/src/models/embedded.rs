use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

/// 对象所在区域的静态映射
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ZoneEntry {
    pub object: String,
    pub zone: String,
}

/// 嵌入式模拟后端的数据
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EmbeddedConfig {
    pub zones: Vec<ZoneEntry>,
    pub ready_actions: Vec<String>,
    /// 模拟车队适配器是否应答派发的任务
    pub respond: bool,
    pub response_delay_ms: u64,
}

impl Default for EmbeddedConfig {
    fn default() -> Self {
        Self {
            zones: Vec::new(),
            ready_actions: Vec::new(),
            respond: true,
            response_delay_ms: 0,
        }
    }
}

impl EmbeddedConfig {
    pub fn zone_of(&self, object: &str) -> Option<&str> {
        self.zones
            .iter()
            .find(|entry| entry.object == object)
            .map(|entry| entry.zone.as_str())
    }
}

impl ConfigValidator for EmbeddedConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        for entry in &self.zones {
            ValidationUtils::validate_not_empty(&entry.object, "embedded.zones.object")?;
        }
        ValidationUtils::validate_entries_not_empty(&self.ready_actions, "embedded.ready_actions")?;
        Ok(())
    }
}
