//! 题干相似度与查重聚类 - 业务能力层
//!
//! 纯计算，不访问题库。输入是题库快照，输出给人工审核删除用的重复组

use serde::Serialize;

use crate::error::ClusterError;
use crate::models::{normalize_text, QuestionId, QuestionItem};

/// 与保留题相似的题目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarItem {
    pub item: QuestionItem,
    /// 与保留题的相似度
    pub similarity: f64,
}

/// 一组疑似重复的题目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    /// 保留的题目（种子）
    pub keep: QuestionItem,
    pub duplicates: Vec<SimilarItem>,
    /// 组内各题与种子相似度的平均值
    pub similarity: f64,
    pub max_similarity: f64,
}

impl DuplicateGroup {
    /// 建议删除的题目编号（未入库的题目没有编号，跳过）
    pub fn removal_ids(&self) -> Vec<QuestionId> {
        self.duplicates
            .iter()
            .filter_map(|dup| dup.item.id)
            .collect()
    }

    /// 组内题目总数（含保留题）
    pub fn len(&self) -> usize {
        self.duplicates.len() + 1
    }
}

/// 编辑距离（单字符插入 / 删除 / 替换，按字符计）
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// 归一化相似度：`1 - 编辑距离 / 较长文本长度`
///
/// 比较前去首尾空白并转小写；两个空文本视为完全相同
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&normalize_text(a), &normalize_text(b))
}

/// 按相似度对题目分组
///
/// 按输入顺序逐个作为种子，只和后面尚未分组的题目比较；
/// 相似度 >= `threshold` 的加入种子所在组。分组不做传递闭包，
/// 没有相似题的题目不输出。复杂度 O(n²)，适合几百道题的批量审核。
pub fn cluster(items: &[QuestionItem], threshold: f64) -> Result<Vec<DuplicateGroup>, ClusterError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ClusterError::InvalidThreshold(threshold));
    }

    let normalized: Vec<String> = items.iter().map(QuestionItem::normalized_text).collect();
    let mut grouped = vec![false; items.len()];
    let mut groups = Vec::new();

    for i in 0..items.len() {
        if grouped[i] {
            continue;
        }

        let mut duplicates = Vec::new();
        for j in (i + 1)..items.len() {
            if grouped[j] {
                continue;
            }
            let score = similarity(&normalized[i], &normalized[j]);
            if score >= threshold {
                grouped[j] = true;
                duplicates.push(SimilarItem {
                    item: items[j].clone(),
                    similarity: score,
                });
            }
        }

        if duplicates.is_empty() {
            continue;
        }

        grouped[i] = true;
        let total: f64 = duplicates.iter().map(|d| d.similarity).sum();
        let max_similarity = duplicates
            .iter()
            .map(|d| d.similarity)
            .fold(0.0_f64, f64::max);

        groups.push(DuplicateGroup {
            keep: items[i].clone(),
            similarity: total / duplicates.len() as f64,
            max_similarity,
            duplicates,
        });
    }

    tracing::debug!("查重聚类完成: {} 道题目，{} 个重复组", items.len(), groups.len());

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerKey, Difficulty, Topic};

    fn item(id: u64, text: &str) -> QuestionItem {
        let mut item = QuestionItem::new(
            text,
            ["a".into(), "b".into(), "c".into(), "d".into()],
            AnswerKey::A,
            Topic::QuantitativeAptitude,
            Difficulty::Easy,
        );
        item.id = Some(QuestionId(id));
        item
    }

    #[test]
    fn test_edit_distance_basics() {
        assert_eq!(edit_distance("", ""), 0);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("", "ab"), 2);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("same text", "same text"), 0);
        // 按字符而不是字节计算
        assert_eq!(edit_distance("数学题", "数学题目"), 1);
    }

    #[test]
    fn test_similarity_is_symmetric_and_normalized() {
        let pairs = [
            ("What is 2+2?", "What is 2 + 2?"),
            ("Capital of France?", "capital of spain?"),
            ("", "abc"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a));
        }
        assert_eq!(similarity("  Hello ", "hello"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_cluster_example() {
        let items = vec![
            item(1, "What is 2+2?"),
            item(2, "What is 2 + 2?"),
            item(3, "Capital of France?"),
        ];
        let groups = cluster(&items, 0.85).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].keep.id, Some(QuestionId(1)));
        assert_eq!(groups[0].removal_ids(), vec![QuestionId(2)]);
        assert!(groups[0].similarity >= 0.85);
        assert_eq!(groups[0].similarity, groups[0].max_similarity);
    }

    #[test]
    fn test_cluster_threshold_one_only_groups_identical_text() {
        let items = vec![
            item(1, "Find the odd one out"),
            item(2, "find the odd one out  "),
            item(3, "Find the odd one out!"),
        ];
        let groups = cluster(&items, 1.0).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].removal_ids(), vec![QuestionId(2)]);
        assert_eq!(groups[0].max_similarity, 1.0);
    }

    #[test]
    fn test_cluster_threshold_zero_groups_everything_under_first_seed() {
        let items = vec![item(1, "alpha"), item(2, "beta"), item(3, "gamma")];
        let groups = cluster(&items, 0.0).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].keep.id, Some(QuestionId(1)));
        assert_eq!(groups[0].len(), 3);
    }

    #[test]
    fn test_cluster_is_not_transitive() {
        // b 与 a、c 都相似，但 a 与 c 不相似；a 作为种子先拿走 b，c 落单
        let items = vec![item(1, "abcdefghij"), item(2, "abcdefghXY"), item(3, "abcdefUVXY")];
        assert!(similarity("abcdefghij", "abcdefghXY") >= 0.7);
        assert!(similarity("abcdefghXY", "abcdefUVXY") >= 0.7);
        assert!(similarity("abcdefghij", "abcdefUVXY") < 0.7);

        let groups = cluster(&items, 0.7).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].removal_ids(), vec![QuestionId(2)]);
    }

    #[test]
    fn test_cluster_rejects_bad_threshold() {
        assert!(cluster(&[], 1.5).is_err());
        assert!(cluster(&[], -0.1).is_err());
        assert!(cluster(&[], f64::NAN).is_err());
        assert!(cluster(&[item(1, "solo")], 0.5).unwrap().is_empty());
    }
}
