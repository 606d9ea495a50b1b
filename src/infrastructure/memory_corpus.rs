//! 内存题库 - 基础设施层
//!
//! 持有题库数据，只暴露 `CorpusStore` 能力。可以从 TOML 快照加载，也可以导出快照写回文件

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::models::{Difficulty, QuestionId, QuestionItem, Topic};
use crate::services::CorpusStore;

#[derive(Debug, Default)]
struct CorpusState {
    items: Vec<QuestionItem>,
    next_id: u64,
}

impl CorpusState {
    fn assign_id(&mut self) -> QuestionId {
        self.next_id += 1;
        QuestionId(self.next_id)
    }
}

/// 内存题库
///
/// 职责：
/// - 唯一持有题目数据
/// - 分配题目编号
/// - 不做去重（查重由组卷流程负责）
#[derive(Debug, Default)]
pub struct InMemoryCorpus {
    state: RwLock<CorpusState>,
}

impl InMemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从已有题目构建题库
    ///
    /// 保留已有编号，没有编号的题目按顺序分配新编号
    pub fn from_items(items: Vec<QuestionItem>) -> Self {
        let mut state = CorpusState {
            next_id: items
                .iter()
                .filter_map(|item| item.id)
                .map(|id| id.0)
                .max()
                .unwrap_or(0),
            items: Vec::with_capacity(items.len()),
        };

        for mut item in items {
            if item.id.is_none() {
                item.id = Some(state.assign_id());
            }
            state.items.push(item);
        }

        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.items.is_empty()
    }

    /// 按编号查找题目
    pub async fn get(&self, id: QuestionId) -> Option<QuestionItem> {
        self.state
            .read()
            .await
            .items
            .iter()
            .find(|item| item.id == Some(id))
            .cloned()
    }
}

#[async_trait]
impl CorpusStore for InMemoryCorpus {
    async fn exists(&self, text: &str, topic: Topic) -> Result<bool, StoreError> {
        let needle = text.trim();
        let state = self.state.read().await;
        Ok(state
            .items
            .iter()
            .any(|item| item.topic == topic && item.stored_text() == needle))
    }

    async fn create(&self, mut item: QuestionItem) -> Result<QuestionItem, StoreError> {
        let mut state = self.state.write().await;
        item.id = Some(state.assign_id());
        item.text = item.text.trim().to_string();
        item.created_at = Some(Utc::now());
        state.items.push(item.clone());

        debug!("题目已入库: {}", item);
        Ok(item)
    }

    async fn select_least_used(
        &self,
        topic: Topic,
        difficulty: Difficulty,
        limit: usize,
    ) -> Result<Vec<QuestionItem>, StoreError> {
        let state = self.state.read().await;
        let mut eligible: Vec<&QuestionItem> = state
            .items
            .iter()
            .filter(|item| item.active && item.topic == topic && item.difficulty == difficulty)
            .collect();

        // 稳定排序：使用次数相同时保持入库顺序
        eligible.sort_by_key(|item| item.usage_count);

        Ok(eligible.into_iter().take(limit).cloned().collect())
    }

    async fn increment_usage(&self, id: QuestionId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .iter_mut()
            .find(|item| item.id == Some(id))
            .ok_or(StoreError::NotFound(id))?;
        item.usage_count = item.usage_count.saturating_add(1);
        Ok(())
    }

    async fn snapshot(&self) -> Result<Vec<QuestionItem>, StoreError> {
        Ok(self.state.read().await.items.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerKey;

    fn item(text: &str, topic: Topic, difficulty: Difficulty, usage: u32) -> QuestionItem {
        let mut item = QuestionItem::new(
            text,
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerKey::A,
            topic,
            difficulty,
        );
        item.usage_count = usage;
        item
    }

    #[tokio::test]
    async fn test_from_items_keeps_and_assigns_ids() {
        let mut existing = item("Q1", Topic::VerbalAbility, Difficulty::Easy, 0);
        existing.id = Some(QuestionId(10));
        let corpus = InMemoryCorpus::from_items(vec![
            existing,
            item("Q2", Topic::VerbalAbility, Difficulty::Easy, 0),
        ]);

        assert!(corpus.get(QuestionId(10)).await.is_some());
        assert_eq!(corpus.get(QuestionId(11)).await.unwrap().text, "Q2");

        let created = corpus
            .create(item("Q3", Topic::VerbalAbility, Difficulty::Easy, 0))
            .await
            .unwrap();
        assert_eq!(created.id, Some(QuestionId(12)));
        assert!(created.created_at.is_some());
        assert_eq!(corpus.len().await, 3);
    }

    #[tokio::test]
    async fn test_exists_is_trimmed_exact_and_topic_scoped() {
        let corpus = InMemoryCorpus::from_items(vec![item(
            "Synonym of 'rapid'?",
            Topic::VerbalAbility,
            Difficulty::Hard,
            0,
        )]);

        // 不区分难度
        assert!(corpus.exists("  Synonym of 'rapid'? ", Topic::VerbalAbility).await.unwrap());
        // 区分大小写
        assert!(!corpus.exists("synonym of 'rapid'?", Topic::VerbalAbility).await.unwrap());
        // 区分分类
        assert!(!corpus.exists("Synonym of 'rapid'?", Topic::GeneralAwareness).await.unwrap());
    }

    #[tokio::test]
    async fn test_select_least_used_orders_and_filters() {
        let mut inactive = item("inactive", Topic::LogicalReasoning, Difficulty::Easy, 0);
        inactive.active = false;
        let corpus = InMemoryCorpus::from_items(vec![
            item("used twice", Topic::LogicalReasoning, Difficulty::Easy, 2),
            item("fresh", Topic::LogicalReasoning, Difficulty::Easy, 0),
            inactive,
            item("other difficulty", Topic::LogicalReasoning, Difficulty::Hard, 0),
            item("used once", Topic::LogicalReasoning, Difficulty::Easy, 1),
            item("also fresh", Topic::LogicalReasoning, Difficulty::Easy, 0),
        ]);

        let picked = corpus
            .select_least_used(Topic::LogicalReasoning, Difficulty::Easy, 3)
            .await
            .unwrap();
        let texts: Vec<&str> = picked.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["fresh", "also fresh", "used once"]);
    }

    #[tokio::test]
    async fn test_increment_usage() {
        let corpus = InMemoryCorpus::from_items(vec![item(
            "Q",
            Topic::DataInterpretation,
            Difficulty::Medium,
            3,
        )]);
        corpus.increment_usage(QuestionId(1)).await.unwrap();
        assert_eq!(corpus.get(QuestionId(1)).await.unwrap().usage_count, 4);

        let err = corpus.increment_usage(QuestionId(99)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(QuestionId(99))));
    }
}
