use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::QuestionId;

/// 生成服务失败的分类
///
/// 只用于向最外层调用方报告原因，不参与内部重试决策
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFailureKind {
    /// 限流或容量不足
    Overloaded,
    /// 返回内容无法解析
    MalformedOutput,
    /// 其他错误
    Other,
}

impl fmt::Display for ProviderFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderFailureKind::Overloaded => "服务繁忙",
            ProviderFailureKind::MalformedOutput => "返回格式错误",
            ProviderFailureKind::Other => "其他错误",
        };
        f.write_str(label)
    }
}

/// 题目生成服务错误
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 请求频率限制 / 服务过载
    #[error("生成服务过载 (模型: {model}): {message}")]
    Overloaded { model: String, message: String },
    /// 返回内容无法解析为题目列表
    #[error("生成结果无法解析: {reason}")]
    MalformedOutput { reason: String },
    /// API 调用失败
    #[error("生成服务调用失败 (模型: {model}): {message}")]
    RequestFailed { model: String, message: String },
    /// 其他错误
    #[error("生成服务错误: {0}")]
    Other(String),
}

impl ProviderError {
    /// 错误分类
    pub fn kind(&self) -> ProviderFailureKind {
        match self {
            ProviderError::Overloaded { .. } => ProviderFailureKind::Overloaded,
            ProviderError::MalformedOutput { .. } => ProviderFailureKind::MalformedOutput,
            ProviderError::RequestFailed { .. } | ProviderError::Other(_) => {
                ProviderFailureKind::Other
            }
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ProviderError::MalformedOutput {
            reason: reason.into(),
        }
    }
}

impl From<regex::Error> for ProviderError {
    fn from(err: regex::Error) -> Self {
        ProviderError::Other(err.to_string())
    }
}

/// 题库存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 题目不存在
    #[error("题目不存在: {0}")]
    NotFound(QuestionId),
    /// 存储不可用
    #[error("题库不可用: {0}")]
    Unavailable(String),
    /// 写入失败
    #[error("写入题库失败: {0}")]
    WriteFailed(String),
}

/// 聚类错误
#[derive(Debug, Error)]
pub enum ClusterError {
    /// 相似度阈值不在 [0, 1] 范围内
    #[error("相似度阈值 {0} 超出范围 [0, 1]")]
    InvalidThreshold(f64),
}

/// 组卷错误
#[derive(Debug, Error)]
pub enum FulfillError {
    /// 所有分类都没有取到题目，稍后重试
    #[error("题目服务暂时不可用，请稍后重试{}", failure_suffix(.last_failure))]
    Unavailable {
        last_failure: Option<ProviderFailureKind>,
    },
}

fn failure_suffix(last_failure: &Option<ProviderFailureKind>) -> String {
    last_failure
        .map(|kind| format!(" (原因: {})", kind))
        .unwrap_or_default()
}

impl FulfillError {
    /// 是否可以通过重新调用恢复
    pub fn is_retryable(&self) -> bool {
        matches!(self, FulfillError::Unavailable { .. })
    }
}
