use serde::{Deserialize, Serialize};

use super::topic::{Difficulty, Topic};

/// 单个分类的出题需求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuota {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_topic: Option<String>,
}

impl CategoryQuota {
    pub fn new(topic: Topic, difficulty: Difficulty, count: usize) -> Self {
        Self {
            topic,
            difficulty,
            count,
            sub_topic: None,
        }
    }

    pub fn with_sub_topic(mut self, sub_topic: impl Into<String>) -> Self {
        self.sub_topic = Some(sub_topic.into());
        self
    }
}

impl std::fmt::Display for CategoryQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.sub_topic {
            Some(sub) => write!(f, "{}/{}/{} x{}", self.topic, sub, self.difficulty, self.count),
            None => write!(f, "{}/{} x{}", self.topic, self.difficulty, self.count),
        }
    }
}

/// 一次组卷请求：分类需求 + 跨会话需要回避的题干
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotaPlan {
    #[serde(default)]
    pub avoid: Vec<String>,
    #[serde(default)]
    pub quotas: Vec<CategoryQuota>,
}
