use serde::{Deserialize, Serialize};

/// 动作槽位：最多两个并行的动作上下文，按顺序组合
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SlotIndex {
    First,
    Second,
}

impl SlotIndex {
    pub const ALL: [SlotIndex; 2] = [SlotIndex::First, SlotIndex::Second];

    pub fn position(self) -> usize {
        match self {
            SlotIndex::First => 0,
            SlotIndex::Second => 1,
        }
    }

    /// 日志中使用的动作标签
    pub fn action_label(self) -> &'static str {
        match self {
            SlotIndex::First => "action",
            SlotIndex::Second => "action2",
        }
    }
}

impl std::fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotIndex::First => write!(f, "first"),
            SlotIndex::Second => write!(f, "second"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Zone,
    Effector,
}

impl std::fmt::Display for SlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotKind::Zone => write!(f, "zone"),
            SlotKind::Effector => write!(f, "effector"),
        }
    }
}

/// 校验请求的路由令牌，随请求下发并原样随结果返回
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SlotToken {
    pub kind: SlotKind,
    pub slot: SlotIndex,
}

impl SlotToken {
    pub fn zone(slot: SlotIndex) -> Self {
        Self {
            kind: SlotKind::Zone,
            slot,
        }
    }

    pub fn effector(slot: SlotIndex) -> Self {
        Self {
            kind: SlotKind::Effector,
            slot,
        }
    }
}

impl std::fmt::Display for SlotToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.slot)
    }
}

/// 一次前置条件校验请求，发出后不可变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationRequest {
    pub token: SlotToken,
    /// 对象名（区域校验）或动作名（执行器校验）
    pub target: String,
    /// 请求方身份：区域校验为空，执行器校验为机器人名
    pub requester: String,
}

impl VerificationRequest {
    pub fn zone(slot: SlotIndex, object_name: impl Into<String>) -> Self {
        Self {
            token: SlotToken::zone(slot),
            target: object_name.into(),
            requester: String::new(),
        }
    }

    pub fn effector(
        slot: SlotIndex,
        action_name: impl Into<String>,
        robot_name: impl Into<String>,
    ) -> Self {
        Self {
            token: SlotToken::effector(slot),
            target: action_name.into(),
            requester: robot_name.into(),
        }
    }
}

/// 外部校验服务的原始应答
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerificationResponse {
    pub success: bool,
    pub attribute: Option<String>,
    pub detail: String,
}

impl VerificationResponse {
    pub fn confirmed(attribute: Option<String>, detail: impl Into<String>) -> Self {
        Self {
            success: true,
            attribute,
            detail: detail.into(),
        }
    }

    pub fn negative(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            attribute: None,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    Confirmed(Option<String>),
    Rejected(String),
    Unavailable(String),
}

impl VerificationOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, VerificationOutcome::Confirmed(_))
    }
}

/// 每个校验请求恰好产生一次的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationResult {
    pub token: SlotToken,
    pub target: String,
    pub outcome: VerificationOutcome,
}

impl VerificationResult {
    /// 将服务应答归一为校验结果；区域校验还要求应答携带非空区域名
    pub fn from_response(request: &VerificationRequest, response: VerificationResponse) -> Self {
        let outcome = match request.token.kind {
            SlotKind::Zone => match response.attribute {
                Some(zone) if response.success && !zone.is_empty() => {
                    VerificationOutcome::Confirmed(Some(zone))
                }
                _ => VerificationOutcome::Rejected(response.detail),
            },
            SlotKind::Effector if response.success => {
                VerificationOutcome::Confirmed(response.attribute)
            }
            SlotKind::Effector => VerificationOutcome::Rejected(response.detail),
        };
        Self {
            token: request.token,
            target: request.target.clone(),
            outcome,
        }
    }

    pub fn unavailable(request: &VerificationRequest, detail: impl Into<String>) -> Self {
        Self {
            token: request.token,
            target: request.target.clone(),
            outcome: VerificationOutcome::Unavailable(detail.into()),
        }
    }
}

/// 任务派发消息信封
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiRequest {
    pub request_id: String,
    pub json_msg: String,
}

/// 任务响应消息信封
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponse {
    pub request_id: String,
    pub json_msg: String,
}

impl ApiResponse {
    pub fn decode(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.json_msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_response_requires_zone_name() {
        let request = VerificationRequest::zone(SlotIndex::First, "bin7");

        let ok = VerificationResult::from_response(
            &request,
            VerificationResponse::confirmed(Some("Z3".to_string()), "found"),
        );
        assert_eq!(ok.outcome, VerificationOutcome::Confirmed(Some("Z3".to_string())));

        let empty = VerificationResult::from_response(
            &request,
            VerificationResponse::confirmed(Some(String::new()), "no zone"),
        );
        assert_eq!(empty.outcome, VerificationOutcome::Rejected("no zone".to_string()));

        let missing = VerificationResult::from_response(
            &request,
            VerificationResponse::confirmed(None, "no zone"),
        );
        assert!(!missing.outcome.is_confirmed());
    }

    #[test]
    fn test_effector_response_mapping() {
        let request = VerificationRequest::effector(SlotIndex::Second, "scan", "mm_1");
        assert_eq!(request.token, SlotToken::effector(SlotIndex::Second));
        assert_eq!(request.requester, "mm_1");

        let ready = VerificationResult::from_response(
            &request,
            VerificationResponse::confirmed(None, "ready"),
        );
        assert_eq!(ready.outcome, VerificationOutcome::Confirmed(None));

        let not_ready = VerificationResult::from_response(
            &request,
            VerificationResponse::negative("gripper offline"),
        );
        assert_eq!(
            not_ready.outcome,
            VerificationOutcome::Rejected("gripper offline".to_string())
        );
        assert_eq!(not_ready.token.slot, SlotIndex::Second);
    }

    #[test]
    fn test_slot_labels() {
        assert_eq!(SlotIndex::First.action_label(), "action");
        assert_eq!(SlotIndex::Second.action_label(), "action2");
        assert_eq!(SlotToken::zone(SlotIndex::Second).to_string(), "zone/second");
    }
}
