use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("服务不可用: {service} - {detail}")]
    TransportUnavailable { service: String, detail: String },
    #[error("前置条件校验未通过: {target} - {detail}")]
    PrerequisiteRejected { target: String, detail: String },
    #[error("等待任务响应超时: {request_id} ({waited_ms}ms)")]
    ResponseTimeout { request_id: String, waited_ms: u64 },
    #[error("无效的派发配置: {0}")]
    MalformedConfiguration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

impl DispatchError {
    pub fn unavailable<S: Into<String>, D: Into<String>>(service: S, detail: D) -> Self {
        Self::TransportUnavailable {
            service: service.into(),
            detail: detail.into(),
        }
    }
    pub fn rejected<S: Into<String>, D: Into<String>>(target: S, detail: D) -> Self {
        Self::PrerequisiteRejected {
            target: target.into(),
            detail: detail.into(),
        }
    }
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedConfiguration(msg.into())
    }
    /// 前置条件失败：不可用与被拒绝在门控边界上按同一种失败处理
    pub fn is_prerequisite_failure(&self) -> bool {
        matches!(
            self,
            DispatchError::TransportUnavailable { .. } | DispatchError::PrerequisiteRejected { .. }
        )
    }
    /// 面向操作者的简短说明，细节见 `Display`
    pub fn user_message(&self) -> &str {
        match self {
            DispatchError::TransportUnavailable { .. } => "无法连接校验服务，任务已取消",
            DispatchError::PrerequisiteRejected { .. } => "前置条件不满足，任务已取消",
            DispatchError::ResponseTimeout { .. } => "任务已发布但未收到响应",
            DispatchError::MalformedConfiguration(_) => "派发参数配置有误",
            DispatchError::Serialization(_) => "任务消息格式无效",
            DispatchError::Internal(_) => "内部错误，请查看日志",
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests;
