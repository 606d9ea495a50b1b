//! 组卷上下文
//!
//! 一次 `fulfill` 调用独享的去重记录，随调用链显式传递，不做任何共享

use std::collections::HashSet;

use crate::models::{normalize_text, QuestionId, QuestionItem};

/// 组卷上下文
///
/// 记录本次调用已经放入结果的题目编号和题干，只增不减
#[derive(Debug, Default)]
pub struct RunCtx {
    /// 跨会话需要回避的题干
    cross_run_avoid: Vec<String>,
    placed_ids: HashSet<QuestionId>,
    placed_texts: HashSet<String>,
    /// 按放入顺序保存的题干，用于生成回避列表
    placed_order: Vec<String>,
}

impl RunCtx {
    pub fn new(cross_run_avoid: &[String]) -> Self {
        Self {
            cross_run_avoid: cross_run_avoid.to_vec(),
            ..Self::default()
        }
    }

    pub fn contains_id(&self, id: QuestionId) -> bool {
        self.placed_ids.contains(&id)
    }

    /// 题干（去空白 + 忽略大小写）是否已经放入结果
    pub fn contains_text(&self, text: &str) -> bool {
        self.placed_texts.contains(&normalize_text(text))
    }

    /// 题目是否已经放入结果：编号相同或题干相同都算
    pub fn is_placed(&self, item: &QuestionItem) -> bool {
        item.id.is_some_and(|id| self.contains_id(id)) || self.contains_text(&item.text)
    }

    /// 记录放入结果的题目
    ///
    /// 已记录过的返回 `false`
    pub fn track(&mut self, item: &QuestionItem) -> bool {
        if self.is_placed(item) {
            return false;
        }

        if let Some(id) = item.id {
            self.placed_ids.insert(id);
        }
        self.placed_texts.insert(item.normalized_text());
        self.placed_order.push(item.text.trim().to_string());
        true
    }

    /// 回避列表：跨会话题干 + 本次已放入的题干
    pub fn avoid_texts(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.cross_run_avoid
            .iter()
            .chain(self.placed_order.iter())
            .filter(|text| seen.insert(normalize_text(text)))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerKey, Difficulty, Topic};

    fn item(id: Option<u64>, text: &str) -> QuestionItem {
        let mut item = QuestionItem::new(
            text,
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerKey::A,
            Topic::GeneralAwareness,
            Difficulty::Easy,
        );
        item.id = id.map(QuestionId);
        item
    }

    #[test]
    fn test_track_rejects_same_id_or_same_text() {
        let mut ctx = RunCtx::default();
        assert!(ctx.track(&item(Some(1), "Largest planet?")));
        assert!(!ctx.track(&item(Some(1), "Something else?")));
        assert!(!ctx.track(&item(Some(2), "  largest PLANET? ")));
        assert!(!ctx.track(&item(None, "Largest planet?")));
        assert!(ctx.track(&item(None, "Smallest planet?")));
        assert_eq!(ctx.avoid_texts().len(), 2);
        assert!(ctx.contains_id(QuestionId(1)));
        assert!(!ctx.contains_id(QuestionId(2)));
    }

    #[test]
    fn test_avoid_texts_merges_without_duplicates() {
        let mut ctx = RunCtx::new(&["Old question?".to_string(), "Largest planet?".to_string()]);
        ctx.track(&item(Some(1), "largest planet?"));
        ctx.track(&item(Some(2), "New question?"));

        assert_eq!(
            ctx.avoid_texts(),
            vec![
                "Old question?".to_string(),
                "Largest planet?".to_string(),
                "New question?".to_string(),
            ]
        );
    }
}
