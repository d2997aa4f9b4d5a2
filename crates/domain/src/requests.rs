//! 已校验过命令行语法的派发输入

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entities::SlotIndex;

/// 单个动作槽位的配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActionSlot {
    pub action: String,
    /// 需要先确认所在区域的对象
    pub object_name: Option<String>,
    pub description: Map<String, Value>,
}

impl ActionSlot {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            object_name: None,
            description: Map::new(),
        }
    }

    pub fn with_object(mut self, object_name: impl Into<String>) -> Self {
        self.object_name = Some(object_name.into());
        self
    }

    pub fn with_description(mut self, description: Map<String, Value>) -> Self {
        self.description = description;
        self
    }

    pub fn requires_zone(&self) -> bool {
        self.object_name.as_deref().is_some_and(|name| !name.is_empty())
    }
}

/// 带前置校验的机械臂/动作任务
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArmTaskRequest {
    pub fleet: String,
    pub robot: Option<String>,
    /// 区域活动的途经点，两个槽位共用
    pub places: Vec<String>,
    pub first: Option<ActionSlot>,
    pub second: Option<ActionSlot>,
    pub start_offset_secs: i64,
    pub priority: i64,
}

impl ArmTaskRequest {
    pub fn slot(&self, slot: SlotIndex) -> Option<&ActionSlot> {
        match slot {
            SlotIndex::First => self.first.as_ref(),
            SlotIndex::Second => self.second.as_ref(),
        }
    }

    /// 按槽位顺序列出已配置的动作
    pub fn configured_slots(&self) -> impl Iterator<Item = (SlotIndex, &ActionSlot)> {
        SlotIndex::ALL
            .into_iter()
            .filter_map(move |slot| self.slot(slot).map(|action| (slot, action)))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CoupleKind {
    Couple,
    Decouple,
}

impl std::str::FromStr for CoupleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "couple" => Ok(CoupleKind::Couple),
            "decouple" => Ok(CoupleKind::Decouple),
            _ => Err(format!("Action should be 'couple' or 'decouple', got '{s}'")),
        }
    }
}

impl std::fmt::Display for CoupleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoupleKind::Couple => write!(f, "couple"),
            CoupleKind::Decouple => write!(f, "decouple"),
        }
    }
}

/// 多机耦合/解耦任务，无前置校验
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CoupleTaskRequest {
    /// 原始动作名，组装前才解析为 [`CoupleKind`]
    pub action: String,
    pub zone_name: String,
    pub fleet: Option<String>,
    pub robot: Option<String>,
    pub candidates_fleet: Option<String>,
    pub candidates_robots: Vec<String>,
    pub number_of_robots: u32,
    pub start_offset_secs: i64,
    pub priority: i64,
    pub requester: Option<String>,
}
