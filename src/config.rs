use crate::workflow::FulfillmentSettings;

/// 运行模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMode {
    /// 按组卷文件出题
    Fulfill,
    /// 对题库做查重聚类
    Cluster,
}

impl AppMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "fulfill" | "generate" => Some(AppMode::Fulfill),
            "cluster" | "dedup" => Some(AppMode::Cluster),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 运行模式
    pub mode: AppMode,
    /// 题库快照文件
    pub corpus_file: String,
    /// 组卷请求文件
    pub quota_file: String,
    /// 结果输出文件（JSON）
    pub output_file: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    /// prompt 中最多带多少条回避题干
    pub avoid_prompt_limit: usize,
    // --- 组卷参数 ---
    pub max_retry_attempts: usize,
    pub retry_batch_cap: usize,
    pub retry_padding: usize,
    pub fallback_multiplier: usize,
    // --- 查重参数 ---
    pub cluster_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        let settings = FulfillmentSettings::default();
        Self {
            mode: AppMode::Fulfill,
            corpus_file: "corpus.toml".to_string(),
            quota_file: "quotas.toml".to_string(),
            output_file: "output.json".to_string(),
            output_log_file: "output.txt".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            llm_temperature: 0.7,
            avoid_prompt_limit: 50,
            max_retry_attempts: settings.max_retry_attempts,
            retry_batch_cap: settings.retry_batch_cap,
            retry_padding: settings.retry_padding,
            fallback_multiplier: settings.fallback_multiplier,
            cluster_threshold: 0.85,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            mode: std::env::var("APP_MODE").ok().and_then(|v| AppMode::parse(&v)).unwrap_or(default.mode),
            corpus_file: std::env::var("CORPUS_FILE").unwrap_or(default.corpus_file),
            quota_file: std::env::var("QUOTA_FILE").unwrap_or(default.quota_file),
            output_file: std::env::var("OUTPUT_FILE").unwrap_or(default.output_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            llm_temperature: std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.llm_temperature),
            avoid_prompt_limit: std::env::var("AVOID_PROMPT_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.avoid_prompt_limit),
            max_retry_attempts: std::env::var("MAX_RETRY_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retry_attempts),
            retry_batch_cap: std::env::var("RETRY_BATCH_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_batch_cap),
            retry_padding: std::env::var("RETRY_PADDING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_padding),
            fallback_multiplier: std::env::var("FALLBACK_MULTIPLIER").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fallback_multiplier),
            cluster_threshold: std::env::var("CLUSTER_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.cluster_threshold),
        }
    }

    /// 组卷参数
    pub fn fulfillment_settings(&self) -> FulfillmentSettings {
        FulfillmentSettings {
            max_retry_attempts: self.max_retry_attempts,
            retry_batch_cap: self.retry_batch_cap.max(1),
            retry_padding: self.retry_padding,
            fallback_multiplier: self.fallback_multiplier.max(1),
        }
    }
}
