//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 本模块是命令行程序的入口，负责资源管理和模式调度。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：初始化日志文件、加载题库快照
//! 2. **组卷模式**：加载组卷文件 → 调用 `QuotaFulfillment` → 输出结果 → 写回题库
//! 3. **查重模式**：对题库快照做相似度聚类 → 输出重复组
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有题库和生成服务的模块
//! - **向下委托**：具体流程交给 `QuotaFulfillment` / `similarity::cluster`

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::{info, warn};

use crate::config::{AppMode, Config};
use crate::infrastructure::InMemoryCorpus;
use crate::models::{load_corpus_snapshot, load_quota_plan, save_corpus_snapshot};
use crate::orchestrator::fulfillment::QuotaFulfillment;
use crate::services::{cluster, CorpusStore, LlmQuestionProvider};
use crate::utils::logging::{
    init_log_file, log_startup, print_cluster_stats, print_fulfillment_stats,
};

/// 应用主结构
pub struct App {
    config: Config,
    corpus: Arc<InMemoryCorpus>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        let items = load_corpus_snapshot(Path::new(&config.corpus_file)).await?;
        let corpus = Arc::new(InMemoryCorpus::from_items(items));

        let mode = match config.mode {
            AppMode::Fulfill => "组卷",
            AppMode::Cluster => "查重",
        };
        log_startup(mode, corpus.len().await);

        Ok(Self { config, corpus })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        match self.config.mode {
            AppMode::Fulfill => self.run_fulfill().await,
            AppMode::Cluster => self.run_cluster().await,
        }
    }

    /// 组卷模式
    async fn run_fulfill(&self) -> Result<()> {
        let plan = load_quota_plan(Path::new(&self.config.quota_file)).await?;

        if plan.quotas.is_empty() {
            warn!("⚠️ 组卷文件中没有分类需求，程序结束");
            return Ok(());
        }

        if self.config.llm_api_key.is_empty() {
            warn!("⚠️ 未配置 LLM_API_KEY，出题请求可能失败，将依赖题库补题");
        }

        let provider = Arc::new(LlmQuestionProvider::new(&self.config));
        let fulfillment = QuotaFulfillment::with_settings(
            provider,
            self.corpus.clone(),
            self.config.fulfillment_settings(),
        );

        let result = fulfillment.fulfill(&plan.quotas, &plan.avoid).await;

        // 无论是否取到题，题库变化（新题、使用次数）都要写回
        self.save_corpus().await?;

        let result = result.into_available()?;

        write_json(&self.config.output_file, &result).await?;
        print_fulfillment_stats(&result, &self.config.output_file);

        Ok(())
    }

    /// 查重模式
    async fn run_cluster(&self) -> Result<()> {
        if self.corpus.is_empty().await {
            warn!("⚠️ 题库为空，无需查重");
            return Ok(());
        }

        let items = self.corpus.snapshot().await?;
        let threshold = self.config.cluster_threshold;

        info!("🔍 正在对 {} 道题目查重...", items.len());
        let groups = cluster(&items, threshold)?;

        write_json(&self.config.output_file, &groups).await?;
        print_cluster_stats(&groups, threshold, &self.config.output_file);

        Ok(())
    }

    async fn save_corpus(&self) -> Result<()> {
        let items = self.corpus.snapshot().await?;
        save_corpus_snapshot(Path::new(&self.config.corpus_file), items).await
    }
}

async fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("无法序列化输出结果")?;
    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入输出文件: {}", path))?;
    Ok(())
}
