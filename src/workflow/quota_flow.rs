//! 单个分类的组卷流程 - 流程层
//!
//! 核心职责：定义"一个分类需求"的完整处理流程
//!
//! 流程顺序：
//! 1. LLM 出题
//! 2. 查重 → 入库 → 放入结果
//! 3. 不够时从题库按使用次数最少补题
//! 4. 仍不够时有限次重试出题（最多 3 次，出不来新题就提前停止）
//! 5. 记录缺口，不让单个分类拖垮整次组卷

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::ProviderFailureKind;
use crate::models::{CategoryQuota, Difficulty, QuestionItem, Topic};
use crate::services::{CorpusStore, GenerationRequest, QuestionProvider};
use crate::utils::logging::truncate_text;
use crate::workflow::run_ctx::RunCtx;

/// 组卷参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfillmentSettings {
    /// 每个分类最多重试出题次数
    pub max_retry_attempts: usize,
    /// 单次重试最多请求的题数
    pub retry_batch_cap: usize,
    /// 重试时在缺口之外多要的题数
    pub retry_padding: usize,
    /// 补题时按缺口的倍数从题库取候选
    pub fallback_multiplier: usize,
}

impl Default for FulfillmentSettings {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            retry_batch_cap: 10,
            retry_padding: 2,
            fallback_multiplier: 3,
        }
    }
}

/// 单个分类的处理记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaReport {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub requested: usize,
    pub collected: usize,
    /// LLM 返回的有效候选题数
    pub generated: usize,
    /// LLM 返回但格式错误被丢弃的条数
    pub rejected: usize,
    /// 新入库的题数
    pub created: usize,
    /// 题库中已有相同题干
    pub db_duplicates: usize,
    /// 本次组卷中已经出现过
    pub run_duplicates: usize,
    /// 入库失败但仍放入结果的题数（没有编号）
    pub degraded: usize,
    /// 从题库补的题数
    pub fallback_used: usize,
    pub retry_attempts: usize,
    pub provider_failures: usize,
    pub last_failure: Option<ProviderFailureKind>,
    pub shortfall: usize,
}

impl QuotaReport {
    fn new(quota: &CategoryQuota) -> Self {
        Self {
            topic: quota.topic,
            difficulty: quota.difficulty,
            requested: quota.count,
            collected: 0,
            generated: 0,
            rejected: 0,
            created: 0,
            db_duplicates: 0,
            run_duplicates: 0,
            degraded: 0,
            fallback_used: 0,
            retry_attempts: 0,
            provider_failures: 0,
            last_failure: None,
            shortfall: 0,
        }
    }
}

/// 单个分类的处理结果
#[derive(Debug, Clone)]
pub struct QuotaOutcome {
    pub items: Vec<QuestionItem>,
    pub report: QuotaReport,
}

impl QuotaOutcome {
    fn new(quota: &CategoryQuota) -> Self {
        Self {
            items: Vec::new(),
            report: QuotaReport::new(quota),
        }
    }

    /// 还差几道题
    pub fn remaining(&self) -> usize {
        self.report.requested.saturating_sub(self.items.len())
    }

    /// 放入结果并记录到上下文，已放入过的返回 `false`
    fn place(&mut self, ctx: &mut RunCtx, item: QuestionItem) -> bool {
        if !ctx.track(&item) {
            self.report.run_duplicates += 1;
            return false;
        }
        self.items.push(item);
        true
    }
}

/// 分类组卷流程
///
/// - 编排出题、查重、入库、补题、重试
/// - 不持有去重状态（状态在 `RunCtx` 中）
/// - 生成服务和题库的错误都在这里消化，不向上抛出
pub struct QuotaFlow {
    provider: Arc<dyn QuestionProvider>,
    store: Arc<dyn CorpusStore>,
    settings: FulfillmentSettings,
}

impl QuotaFlow {
    pub fn new(
        provider: Arc<dyn QuestionProvider>,
        store: Arc<dyn CorpusStore>,
        settings: FulfillmentSettings,
    ) -> Self {
        Self {
            provider,
            store,
            settings,
        }
    }

    pub async fn run(&self, quota: &CategoryQuota, ctx: &mut RunCtx) -> QuotaOutcome {
        let mut outcome = QuotaOutcome::new(quota);
        if quota.count == 0 {
            return outcome;
        }

        // ========== 流程 1-2: 出题并入库 ==========
        let candidates = self
            .request_candidates(quota, quota.count, ctx, &mut outcome.report)
            .await;
        self.absorb_candidates(quota, candidates, ctx, &mut outcome)
            .await;

        // ========== 流程 3: 题库补题 ==========
        if outcome.remaining() > 0 {
            info!(
                "[{}] 出题后仍缺 {} 道，从题库补题",
                quota,
                outcome.remaining()
            );
            self.fill_from_corpus(quota, ctx, &mut outcome).await;
        }

        // ========== 流程 4: 有限次重试 ==========
        while outcome.remaining() > 0
            && outcome.report.retry_attempts < self.settings.max_retry_attempts
        {
            outcome.report.retry_attempts += 1;
            let ask = outcome
                .remaining()
                .saturating_add(self.settings.retry_padding)
                .min(self.settings.retry_batch_cap);

            info!(
                "[{}] 第 {}/{} 次重试，缺 {} 道，请求 {} 道",
                quota,
                outcome.report.retry_attempts,
                self.settings.max_retry_attempts,
                outcome.remaining(),
                ask
            );

            let before = outcome.items.len();
            let candidates = self
                .request_candidates(quota, ask, ctx, &mut outcome.report)
                .await;
            self.absorb_candidates(quota, candidates, ctx, &mut outcome)
                .await;

            if outcome.items.len() == before {
                info!("[{}] 本次重试没有新题，停止重试", quota);
                break;
            }
        }

        // ========== 流程 5: 记录缺口 ==========
        outcome.report.collected = outcome.items.len();
        outcome.report.shortfall = outcome.remaining();

        if outcome.report.shortfall > 0 {
            warn!(
                "[{}] ⚠️ 只取到 {}/{} 道题",
                quota, outcome.report.collected, outcome.report.requested
            );
        } else {
            info!("[{}] ✓ 已取满 {} 道题", quota, outcome.report.collected);
        }

        outcome
    }

    /// 调用生成服务，失败时视为没有候选题
    async fn request_candidates(
        &self,
        quota: &CategoryQuota,
        count: usize,
        ctx: &RunCtx,
        report: &mut QuotaReport,
    ) -> Vec<QuestionItem> {
        let request = GenerationRequest::for_quota(quota, count, ctx.avoid_texts());

        match self.provider.generate(&request).await {
            Ok(batch) => {
                debug!(
                    "[{}] 生成服务返回 {} 道，丢弃 {} 条",
                    quota,
                    batch.items.len(),
                    batch.rejected
                );
                report.generated += batch.items.len();
                report.rejected += batch.rejected;
                batch.items
            }
            Err(e) => {
                warn!("[{}] 生成服务失败，按 0 道处理: {}", quota, e);
                report.provider_failures += 1;
                report.last_failure = Some(e.kind());
                Vec::new()
            }
        }
    }

    /// 逐条查重、入库、放入结果
    async fn absorb_candidates(
        &self,
        quota: &CategoryQuota,
        candidates: Vec<QuestionItem>,
        ctx: &mut RunCtx,
        outcome: &mut QuotaOutcome,
    ) {
        for candidate in candidates {
            if outcome.remaining() == 0 {
                break;
            }

            let preview = truncate_text(candidate.stored_text(), 40);

            match self.store.exists(candidate.stored_text(), quota.topic).await {
                Ok(true) => {
                    debug!("[{}] 题库已有: {}", quota, preview);
                    outcome.report.db_duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => warn!("[{}] 查重失败，继续入库: {}", quota, e),
            }

            if ctx.contains_text(&candidate.text) {
                debug!("[{}] 本次已出现: {}", quota, preview);
                outcome.report.run_duplicates += 1;
                continue;
            }

            match self.store.create(candidate.clone()).await {
                Ok(saved) => {
                    if saved.id.is_some_and(|id| ctx.contains_id(id)) {
                        outcome.report.run_duplicates += 1;
                        continue;
                    }
                    if outcome.place(ctx, saved) {
                        outcome.report.created += 1;
                    }
                }
                Err(e) => {
                    // 入库失败的题目仍然可用，只是没有编号
                    warn!("[{}] 入库失败，保留未入库题目: {} ({})", quota, preview, e);
                    if outcome.place(ctx, candidate) {
                        outcome.report.degraded += 1;
                    }
                }
            }
        }
    }

    /// 从题库按使用次数最少补题
    async fn fill_from_corpus(
        &self,
        quota: &CategoryQuota,
        ctx: &mut RunCtx,
        outcome: &mut QuotaOutcome,
    ) {
        let limit = outcome
            .remaining()
            .saturating_mul(self.settings.fallback_multiplier);

        let pool = match self
            .store
            .select_least_used(quota.topic, quota.difficulty, limit)
            .await
        {
            Ok(pool) => pool,
            Err(e) => {
                warn!("[{}] 题库补题失败: {}", quota, e);
                return;
            }
        };

        debug!("[{}] 题库候选 {} 道", quota, pool.len());

        for mut item in pool {
            if outcome.remaining() == 0 {
                break;
            }
            if ctx.is_placed(&item) {
                continue;
            }

            if let Some(id) = item.id {
                match self.store.increment_usage(id).await {
                    Ok(()) => item.usage_count = item.usage_count.saturating_add(1),
                    Err(e) => warn!("[{}] 更新使用次数失败 {}: {}", quota, id, e),
                }
            }

            if outcome.place(ctx, item) {
                outcome.report.fallback_used += 1;
            }
        }
    }
}
