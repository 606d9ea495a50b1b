use phf::phf_map;
use serde::{Deserialize, Serialize};

/// 题目分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Topic {
    /// 数量能力
    QuantitativeAptitude,
    /// 逻辑推理
    LogicalReasoning,
    /// 语言能力
    VerbalAbility,
    /// 数据分析
    DataInterpretation,
    /// 常识
    GeneralAwareness,
    /// 计算机基础
    ComputerFundamentals,
}

/// 分类别名表（全部小写）
static TOPIC_ALIASES: phf::Map<&'static str, Topic> = phf_map! {
    "quantitative aptitude" => Topic::QuantitativeAptitude,
    "quantitative" => Topic::QuantitativeAptitude,
    "quant" => Topic::QuantitativeAptitude,
    "aptitude" => Topic::QuantitativeAptitude,
    "logical reasoning" => Topic::LogicalReasoning,
    "logical" => Topic::LogicalReasoning,
    "reasoning" => Topic::LogicalReasoning,
    "lr" => Topic::LogicalReasoning,
    "verbal ability" => Topic::VerbalAbility,
    "verbal" => Topic::VerbalAbility,
    "english" => Topic::VerbalAbility,
    "data interpretation" => Topic::DataInterpretation,
    "di" => Topic::DataInterpretation,
    "general awareness" => Topic::GeneralAwareness,
    "general knowledge" => Topic::GeneralAwareness,
    "gk" => Topic::GeneralAwareness,
    "computer fundamentals" => Topic::ComputerFundamentals,
    "computer" => Topic::ComputerFundamentals,
    "cs" => Topic::ComputerFundamentals,
};

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::QuantitativeAptitude,
        Topic::LogicalReasoning,
        Topic::VerbalAbility,
        Topic::DataInterpretation,
        Topic::GeneralAwareness,
        Topic::ComputerFundamentals,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            Topic::QuantitativeAptitude => "Quantitative Aptitude",
            Topic::LogicalReasoning => "Logical Reasoning",
            Topic::VerbalAbility => "Verbal Ability",
            Topic::DataInterpretation => "Data Interpretation",
            Topic::GeneralAwareness => "General Awareness",
            Topic::ComputerFundamentals => "Computer Fundamentals",
        }
    }

    /// 从名称或别名解析分类（忽略大小写和多余空白）
    pub fn find(s: &str) -> Option<Self> {
        let key = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        TOPIC_ALIASES.get(key.as_str()).copied()
    }
}

impl TryFrom<String> for Topic {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Topic::find(&value).ok_or_else(|| format!("未知的题目分类: {}", value))
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.name().to_string()
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    #[serde(alias = "easy", alias = "EASY")]
    Easy,
    #[serde(alias = "medium", alias = "MEDIUM")]
    Medium,
    #[serde(alias = "hard", alias = "HARD")]
    Hard,
}

impl Difficulty {
    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
