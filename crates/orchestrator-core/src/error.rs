use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which end of the trip a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Origin,
    Destination,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Origin => write!(f, "起点"),
            Endpoint::Destination => write!(f, "终点"),
        }
    }
}

/// Recoverable pipeline failures. Each one becomes a `success=false` reply.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("interpreter output malformed: {0}")]
    InterpretationMalformed(String),

    #[error("address formatting failed after all strategies")]
    AddressFormattingFailed,

    #[error("no coordinates for {endpoint} '{address}'")]
    GeocodeNotFound { endpoint: Endpoint, address: String },

    #[error("distance unavailable")]
    DistanceUnavailable,

    #[error("no route from {origin} to {destination}")]
    RouteUnavailable { origin: String, destination: String },

    #[error("session state corrupted")]
    SessionStateCorrupted,

    #[error("{call} timed out after {after:?}")]
    Timeout { call: &'static str, after: Duration },
}

impl PipelineError {
    /// Text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InterpretationMalformed(_) => "❌ 无法识别路径规划需求: 识别过程出错".to_string(),
            PipelineError::AddressFormattingFailed => "❌ 地址格式化失败，请重新提供清晰的城市信息".to_string(),
            PipelineError::GeocodeNotFound { endpoint, address } => {
                format!("❌ 无法找到{} '{}' 的位置信息，请检查地址是否正确", endpoint, address)
            }
            PipelineError::DistanceUnavailable => "❌ 无法获取距离信息".to_string(),
            PipelineError::RouteUnavailable { origin, destination } => {
                format!("❌ 无法获取从 {} 到 {} 的路线信息", origin, destination)
            }
            PipelineError::SessionStateCorrupted => "❌ 会话状态异常，请重新开始".to_string(),
            PipelineError::Timeout { .. } => "❌ 外部服务响应超时，请稍后重试".to_string(),
        }
    }
}
