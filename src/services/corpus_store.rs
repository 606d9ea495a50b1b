//! 题库存储能力 - 业务能力层
//!
//! 只描述组卷需要的存储能力，具体存储引擎由基础设施层实现

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Difficulty, QuestionId, QuestionItem, Topic};

/// 题库存储
///
/// 存储层本身不做去重，查重由调用方在 `create` 之前完成
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// 同一分类下是否已有相同题干（只比较去首尾空白后的文本，不区分难度）
    async fn exists(&self, text: &str, topic: Topic) -> Result<bool, StoreError>;

    /// 保存题目并分配编号
    async fn create(&self, item: QuestionItem) -> Result<QuestionItem, StoreError>;

    /// 按使用次数升序取出启用中的题目
    async fn select_least_used(
        &self,
        topic: Topic,
        difficulty: Difficulty,
        limit: usize,
    ) -> Result<Vec<QuestionItem>, StoreError>;

    /// 使用次数 +1
    async fn increment_usage(&self, id: QuestionId) -> Result<(), StoreError>;

    /// 导出全部题目（供查重聚类使用）
    async fn snapshot(&self) -> Result<Vec<QuestionItem>, StoreError>;
}
