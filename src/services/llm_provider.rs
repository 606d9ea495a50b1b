//! LLM 出题服务 - 业务能力层
//!
//! 只负责"让 LLM 出一批题"，不关心查重和入库
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini, Doubao 等）

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{ProviderError, ProviderFailureKind};
use crate::models::validate_candidate;
use crate::services::provider::{GenerationBatch, GenerationRequest, QuestionProvider};
use crate::utils::logging::truncate_text;

const SYSTEM_MESSAGE: &str = "You are an experienced exam setter for competitive aptitude tests. \
    You write clear, unambiguous multiple-choice questions with exactly four options and one correct answer. \
    You always reply with a JSON array and nothing else.";

/// LLM 出题服务
///
/// 职责：
/// - 构造出题 prompt 并调用 LLM
/// - 把返回内容校验成题目，格式错误的单条直接丢弃
/// - 把各种失败归类为 过载 / 格式错误 / 其他
pub struct LlmQuestionProvider {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    avoid_prompt_limit: usize,
}

impl LlmQuestionProvider {
    /// 创建新的出题服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            avoid_prompt_limit: config.avoid_prompt_limit,
        }
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 返回 LLM 的响应内容（字符串）
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> Result<String, ProviderError> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.len());

        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(|e| ProviderError::Other(e.to_string()))?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(|e| ProviderError::Other(e.to_string()))?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(4096u32)
            .build()
            .map_err(|e| ProviderError::Other(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            classify_failure(&self.model_name, &e.to_string())
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ProviderError::malformed("LLM 返回内容为空"))?;

        Ok(content.trim().to_string())
    }

    /// 构建出题用的用户消息
    fn build_generation_message(&self, request: &GenerationRequest) -> String {
        let scope = match &request.sub_topic {
            Some(sub) => format!("{} (sub-topic: {})", request.topic, sub),
            None => request.topic.to_string(),
        };

        // 只带最近的若干条回避题干，避免 prompt 过长
        let skip = request
            .avoid_texts
            .len()
            .saturating_sub(self.avoid_prompt_limit);
        let avoid: Vec<String> = request
            .avoid_texts
            .iter()
            .skip(skip)
            .map(|text| format!("- {}", text))
            .collect();
        let avoid_block = if avoid.is_empty() {
            "(none)".to_string()
        } else {
            avoid.join("\n")
        };

        format!(
            r#"Write {count} new multiple-choice questions.

Topic: {scope}
Difficulty: {difficulty}

Do NOT repeat or paraphrase any of these existing questions:
{avoid_block}

Reply with a JSON array of exactly {count} objects, each shaped like:
{{"question": "...", "options": ["...", "...", "...", "..."], "correct_answer": "A", "explanation": "..."}}

Rules:
- exactly four options per question
- correct_answer is one of "A", "B", "C", "D"
- every question must be different from the others"#,
            count = request.count,
            scope = scope,
            difficulty = request.difficulty,
            avoid_block = avoid_block,
        )
    }
}

#[async_trait]
impl QuestionProvider for LlmQuestionProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationBatch, ProviderError> {
        if request.count == 0 {
            return Ok(GenerationBatch::default());
        }

        debug!(
            "请求生成 {} 道题: {}/{}，回避 {} 条",
            request.count,
            request.topic,
            request.difficulty,
            request.avoid_texts.len()
        );

        let user_message = self.build_generation_message(request);
        let response = self.send_to_llm(&user_message, Some(SYSTEM_MESSAGE)).await?;

        parse_generation_response(&response, request)
    }
}

/// 解析 LLM 的出题结果
///
/// 支持裸数组、```json 代码块、`{"questions": [...]}` 以及夹杂说明文字的回复
pub(crate) fn parse_generation_response(
    response: &str,
    request: &GenerationRequest,
) -> Result<GenerationBatch, ProviderError> {
    let entries = extract_entries(response)?;

    let mut batch = GenerationBatch::default();
    for entry in &entries {
        match validate_candidate(
            entry,
            request.topic,
            request.difficulty,
            request.sub_topic.as_deref(),
        ) {
            Ok(item) => batch.items.push(item),
            Err(reason) => {
                debug!("丢弃候选题: {}", reason);
                batch.rejected += 1;
            }
        }
    }

    if batch.rejected > 0 {
        warn!(
            "LLM 返回 {} 条，其中 {} 条格式错误已丢弃",
            entries.len(),
            batch.rejected
        );
    }

    Ok(batch)
}

fn extract_entries(response: &str) -> Result<Vec<JsonValue>, ProviderError> {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)```")?;
    let body = fence
        .captures(response)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
        .trim();

    if let Ok(value) = serde_json::from_str::<JsonValue>(body) {
        match value {
            JsonValue::Array(entries) => return Ok(entries),
            JsonValue::Object(mut obj) => {
                if let Some(JsonValue::Array(entries)) = obj.remove("questions") {
                    return Ok(entries);
                }
            }
            _ => {}
        }
    }

    // 回复里夹杂了说明文字，取第一个 '[' 到最后一个 ']'
    let array = Regex::new(r"(?s)\[.*\]")?;
    let json_text = array.find(body).map(|m| m.as_str()).ok_or_else(|| {
        ProviderError::malformed(format!("回复中没有 JSON 数组: {}", truncate_text(body, 80)))
    })?;

    serde_json::from_str::<Vec<JsonValue>>(json_text)
        .map_err(|e| ProviderError::malformed(format!("JSON 数组解析失败: {}", e)))
}

/// 根据错误信息判断失败类型
pub(crate) fn classify_failure(model: &str, message: &str) -> ProviderError {
    match failure_kind(message) {
        ProviderFailureKind::Overloaded => ProviderError::Overloaded {
            model: model.to_string(),
            message: message.to_string(),
        },
        ProviderFailureKind::MalformedOutput => ProviderError::malformed(message),
        ProviderFailureKind::Other => ProviderError::RequestFailed {
            model: model.to_string(),
            message: message.to_string(),
        },
    }
}

fn failure_kind(message: &str) -> ProviderFailureKind {
    const OVERLOAD_MARKERS: [&str; 9] = [
        "429",
        "503",
        "529",
        "rate limit",
        "rate_limit",
        "too many requests",
        "overloaded",
        "capacity",
        "quota",
    ];
    const MALFORMED_MARKERS: [&str; 3] = ["failed to deserialize", "json", "invalid type"];

    let lower = message.to_lowercase();
    if OVERLOAD_MARKERS.iter().any(|m| lower.contains(m)) {
        ProviderFailureKind::Overloaded
    } else if MALFORMED_MARKERS.iter().any(|m| lower.contains(m)) {
        ProviderFailureKind::MalformedOutput
    } else {
        ProviderFailureKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerKey, Difficulty, Topic};

    fn request() -> GenerationRequest {
        GenerationRequest {
            topic: Topic::VerbalAbility,
            difficulty: Difficulty::Easy,
            count: 2,
            avoid_texts: vec!["Old one?".to_string()],
            sub_topic: None,
        }
    }

    /// 创建测试用的出题服务
    fn create_test_provider() -> LlmQuestionProvider {
        let config = Config {
            avoid_prompt_limit: 2,
            ..Config::default()
        };
        LlmQuestionProvider::new(&config)
    }

    #[test]
    fn test_parse_bare_array() {
        let response = r#"[
            {"question": "Synonym of 'big'?", "options": ["large", "tiny", "thin", "low"], "correct_answer": "A", "explanation": "big = large"},
            {"question": "Antonym of 'hot'?", "options": ["warm", "cold", "dry", "wet"], "correct_answer": "B"}
        ]"#;
        let batch = parse_generation_response(response, &request()).unwrap();
        assert_eq!(batch.items.len(), 2);
        assert_eq!(batch.rejected, 0);
        assert_eq!(batch.items[1].answer, AnswerKey::B);
        assert!(batch.items.iter().all(|item| item.topic == Topic::VerbalAbility));
    }

    #[test]
    fn test_parse_fenced_block_with_prose() {
        let response = "Here you go:\n```json\n[{\"question\": \"Q1?\", \"options\": [\"a\", \"b\", \"c\", \"d\"], \"correct_answer\": \"C\"}]\n```\nGood luck!";
        let batch = parse_generation_response(response, &request()).unwrap();
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.items[0].text, "Q1?");
    }

    #[test]
    fn test_parse_wrapped_object_and_prose_array() {
        let wrapped = r#"{"questions": [{"question": "Q?", "options": ["a", "b", "c", "d"], "correct_answer": "D"}]}"#;
        assert_eq!(parse_generation_response(wrapped, &request()).unwrap().items.len(), 1);

        let prose = r#"Sure! [{"question": "Q?", "options": ["a", "b", "c", "d"], "correct_answer": "A"}] hope it helps"#;
        assert_eq!(parse_generation_response(prose, &request()).unwrap().items.len(), 1);
    }

    #[test]
    fn test_malformed_entry_does_not_abort_batch() {
        let response = r#"[
            {"question": "Good?", "options": ["a", "b", "c", "d"], "correct_answer": "A"},
            {"question": "Three options?", "options": ["a", "b", "c"], "correct_answer": "A"},
            "not even an object"
        ]"#;
        let batch = parse_generation_response(response, &request()).unwrap();
        assert_eq!(batch.items.len(), 1);
        assert_eq!(batch.rejected, 2);
    }

    #[test]
    fn test_unparsable_reply_is_malformed() {
        let err = parse_generation_response("I cannot help with that.", &request()).unwrap_err();
        assert_eq!(err.kind(), ProviderFailureKind::MalformedOutput);

        let err = parse_generation_response("[{broken json", &request()).unwrap_err();
        assert_eq!(err.kind(), ProviderFailureKind::MalformedOutput);
    }

    #[test]
    fn test_classify_failure() {
        assert_eq!(
            classify_failure("m", "http error: 429 Too Many Requests").kind(),
            ProviderFailureKind::Overloaded
        );
        assert_eq!(
            classify_failure("m", "The server is overloaded").kind(),
            ProviderFailureKind::Overloaded
        );
        assert_eq!(
            classify_failure("m", "failed to deserialize api response").kind(),
            ProviderFailureKind::MalformedOutput
        );
        assert_eq!(
            classify_failure("m", "connection reset by peer").kind(),
            ProviderFailureKind::Other
        );
    }

    #[test]
    fn test_prompt_keeps_only_recent_avoid_texts() {
        let provider = create_test_provider();
        let mut req = request();
        req.avoid_texts = vec!["first?".into(), "second?".into(), "third?".into()];
        req.sub_topic = Some("Synonyms".to_string());

        let message = provider.build_generation_message(&req);
        assert!(!message.contains("- first?"));
        assert!(message.contains("- second?"));
        assert!(message.contains("- third?"));
        assert!(message.contains("Verbal Ability (sub-topic: Synonyms)"));
        assert!(message.contains("Write 2 new"));
    }

    /// 测试真实 LLM 出题（需要配置 LLM_API_KEY）
    #[tokio::test]
    #[ignore]
    async fn test_generate_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let provider = LlmQuestionProvider::new(&Config::from_env());
        let batch = provider.generate(&request()).await.unwrap();

        println!("生成 {} 道题，丢弃 {} 条", batch.items.len(), batch.rejected);
        for item in &batch.items {
            println!("{}", item);
        }
        assert!(!batch.items.is_empty());
    }
}
