//! 候选题校验
//!
//! 生成服务返回的是未定型的 JSON，只有通过校验的才会变成 `QuestionItem`

use serde_json::Value as JsonValue;
use thiserror::Error;

use super::question::{AnswerKey, Provenance, QuestionItem};
use super::topic::{Difficulty, Topic};

/// 被丢弃的候选题
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectedCandidate {
    #[error("候选题不是 JSON 对象")]
    NotAnObject,
    #[error("候选题缺少题干")]
    MissingText,
    #[error("候选题选项数量应为 4，实际为 {found}")]
    BadOptions { found: usize },
    #[error("无法识别的正确答案: {0}")]
    BadAnswer(String),
}

const TEXT_FIELDS: [&str; 3] = ["question", "text", "questionText"];
const ANSWER_FIELDS: [&str; 4] = ["correct_answer", "correctAnswer", "answer", "correct"];

/// 把一条生成结果校验为题目
pub fn validate_candidate(
    payload: &JsonValue,
    topic: Topic,
    difficulty: Difficulty,
    sub_topic: Option<&str>,
) -> Result<QuestionItem, RejectedCandidate> {
    let obj = payload.as_object().ok_or(RejectedCandidate::NotAnObject)?;

    let text = TEXT_FIELDS
        .iter()
        .find_map(|key| obj.get(*key).and_then(|v| v.as_str()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RejectedCandidate::MissingText)?;

    let options = parse_options(obj.get("options"))?;

    let raw_answer = ANSWER_FIELDS
        .iter()
        .find_map(|key| obj.get(*key))
        .ok_or_else(|| RejectedCandidate::BadAnswer(String::new()))?;
    let answer = parse_answer(raw_answer, &options)?;

    let explanation = obj
        .get("explanation")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Ok(QuestionItem::new(text, options, answer, topic, difficulty)
        .with_explanation(explanation)
        .with_sub_topic(sub_topic.map(str::to_string))
        .with_provenance(Provenance::Generated))
}

fn parse_options(value: Option<&JsonValue>) -> Result<[String; 4], RejectedCandidate> {
    let list = match value.and_then(|v| v.as_array()) {
        Some(list) => list,
        None => return Err(RejectedCandidate::BadOptions { found: 0 }),
    };

    let options: Vec<String> = list
        .iter()
        .filter_map(|v| match v {
            JsonValue::String(s) => Some(s.trim().to_string()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    let found = options.len();
    options
        .try_into()
        .map_err(|_| RejectedCandidate::BadOptions { found })
}

fn parse_answer(value: &JsonValue, options: &[String; 4]) -> Result<AnswerKey, RejectedCandidate> {
    let bad = || RejectedCandidate::BadAnswer(value.to_string());

    if let Some(index) = value.as_u64() {
        return AnswerKey::from_index(index as usize).ok_or_else(bad);
    }

    let raw = value.as_str().map(str::trim).ok_or_else(bad)?;

    // 直接给出了选项内容
    if let Some(index) = options.iter().position(|opt| opt == raw) {
        return AnswerKey::from_index(index).ok_or_else(bad);
    }

    let lower = raw.to_lowercase();
    let stripped = ["option", "answer", "choice"]
        .iter()
        .find_map(|prefix| lower.strip_prefix(prefix))
        .unwrap_or(&lower)
        .trim_start_matches(|c: char| c.is_whitespace() || c == ':');

    let mut chars = stripped.chars();
    if let Some(first) = chars.next() {
        let standalone = chars.next().map_or(true, |c| !c.is_alphanumeric());
        if standalone {
            if let Some(key) = AnswerKey::from_letter(first) {
                return Ok(key);
            }
        }
    }

    stripped
        .parse::<usize>()
        .ok()
        .and_then(AnswerKey::from_index)
        .ok_or_else(bad)
}
