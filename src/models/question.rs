use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::topic::{Difficulty, Topic};

/// 题库中的题目编号，由存储层分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 正确答案标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnswerKey {
    A,
    B,
    C,
    D,
}

impl AnswerKey {
    pub const ALL: [AnswerKey; 4] = [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D];

    /// 对应选项下标（0-based）
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(AnswerKey::A),
            'B' => Some(AnswerKey::B),
            'C' => Some(AnswerKey::C),
            'D' => Some(AnswerKey::D),
            _ => None,
        }
    }
}

/// 题目来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    #[default]
    Generated,
    Curated,
    Manual,
}

/// 单选题
///
/// `options` 固定 4 项，`answer` 一定落在其中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<QuestionId>,
    pub text: String,
    pub options: [String; 4],
    pub answer: AnswerKey,
    #[serde(default)]
    pub explanation: String,
    pub topic: Topic,
    pub difficulty: Difficulty,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_topic: Option<String>,
    #[serde(default)]
    pub usage_count: u32,
    #[serde(default)]
    pub provenance: Provenance,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl QuestionItem {
    /// 创建尚未入库的题目
    pub fn new(
        text: impl Into<String>,
        options: [String; 4],
        answer: AnswerKey,
        topic: Topic,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: None,
            text: text.into(),
            options,
            answer,
            explanation: String::new(),
            topic,
            difficulty,
            sub_topic: None,
            usage_count: 0,
            provenance: Provenance::Generated,
            active: true,
            created_at: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn with_sub_topic(mut self, sub_topic: Option<String>) -> Self {
        self.sub_topic = sub_topic;
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// 正确选项的内容
    pub fn correct_option(&self) -> &str {
        &self.options[self.answer.index()]
    }

    /// 题库精确查重使用的文本（只去首尾空白）
    pub fn stored_text(&self) -> &str {
        self.text.trim()
    }

    /// 本次组卷内查重使用的文本（去首尾空白 + 忽略大小写）
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }
}

/// 去首尾空白并转小写
pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}

impl std::fmt::Display for QuestionItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let preview = if self.text.chars().count() > 80 {
            self.text.chars().take(80).collect::<String>() + "..."
        } else {
            self.text.clone()
        };

        match self.id {
            Some(id) => write!(f, "{} {} [{}/{}]", id, preview, self.topic, self.difficulty),
            None => write!(f, "(未入库) {} [{}/{}]", preview, self.topic, self.difficulty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> [String; 4] {
        ["3".to_string(), "4".to_string(), "5".to_string(), "6".to_string()]
    }

    #[test]
    fn test_correct_option_follows_answer_key() {
        let item = QuestionItem::new(
            "What is 2+2?",
            options(),
            AnswerKey::B,
            Topic::QuantitativeAptitude,
            Difficulty::Easy,
        );
        assert_eq!(item.correct_option(), "4");
        assert_eq!(AnswerKey::from_index(3), Some(AnswerKey::D));
        assert_eq!(AnswerKey::from_index(4), None);
        assert_eq!(AnswerKey::from_letter('c'), Some(AnswerKey::C));
    }

    #[test]
    fn test_normalized_text_folds_case_and_whitespace() {
        let item = QuestionItem::new(
            "  What IS 2+2? \n",
            options(),
            AnswerKey::B,
            Topic::QuantitativeAptitude,
            Difficulty::Easy,
        );
        assert_eq!(item.stored_text(), "What IS 2+2?");
        assert_eq!(item.normalized_text(), "what is 2+2?");
    }

    #[test]
    fn test_deserialize_defaults() {
        let raw = r#"
            text = "Synonym of 'rapid'?"
            options = ["slow", "fast", "late", "calm"]
            answer = "B"
            topic = "verbal"
            difficulty = "easy"
        "#;
        let item: QuestionItem = toml::from_str(raw).unwrap();
        assert_eq!(item.id, None);
        assert_eq!(item.topic, Topic::VerbalAbility);
        assert_eq!(item.difficulty, Difficulty::Easy);
        assert_eq!(item.usage_count, 0);
        assert_eq!(item.provenance, Provenance::Generated);
        assert!(item.active);
    }
}
