//! 题目生成能力 - 业务能力层

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::models::{CategoryQuota, Difficulty, QuestionItem, Topic};

/// 一次生成请求
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub count: usize,
    /// 需要回避的题干
    pub avoid_texts: Vec<String>,
    pub sub_topic: Option<String>,
}

impl GenerationRequest {
    pub fn for_quota(quota: &CategoryQuota, count: usize, avoid_texts: Vec<String>) -> Self {
        Self {
            topic: quota.topic,
            difficulty: quota.difficulty,
            count,
            avoid_texts,
            sub_topic: quota.sub_topic.clone(),
        }
    }
}

/// 一次生成的结果
///
/// `items` 已通过校验且没有编号，`rejected` 是被丢弃的条数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationBatch {
    pub items: Vec<QuestionItem>,
    pub rejected: usize,
}

impl GenerationBatch {
    pub fn new(items: Vec<QuestionItem>) -> Self {
        Self { items, rejected: 0 }
    }
}

/// 题目生成服务
///
/// 单条候选题格式错误只丢弃该条，整体失败才返回 `Err`
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationBatch, ProviderError>;
}
