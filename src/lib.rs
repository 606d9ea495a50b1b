//! # Question Pool
//!
//! 按分类需求组卷：LLM 出题 + 题库兜底 + 去重，以及题库查重聚类
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有题库数据，只暴露存储能力
//! - `InMemoryCorpus` - 内存题库，可从 TOML 快照加载
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionProvider` / `LlmQuestionProvider` - 出题能力
//! - `CorpusStore` - 题库能力
//! - `similarity` - 相似度与查重聚类
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个分类需求"的完整处理流程
//! - `RunCtx` - 一次组卷独享的去重记录
//! - `QuotaFlow` - 流程编排（出题 → 入库 → 补题 → 重试）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/fulfillment` - 按顺序处理所有分类需求并汇总
//! - `orchestrator/app` - 命令行应用
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{ClusterError, FulfillError, ProviderError, ProviderFailureKind, StoreError};
pub use infrastructure::InMemoryCorpus;
pub use models::{CategoryQuota, Difficulty, QuestionId, QuestionItem, Topic};
pub use orchestrator::{App, FulfillmentResult, QuotaFulfillment};
pub use services::{cluster, CorpusStore, DuplicateGroup, GenerationBatch, GenerationRequest, QuestionProvider};
pub use workflow::{FulfillmentSettings, QuotaReport, RunCtx};
