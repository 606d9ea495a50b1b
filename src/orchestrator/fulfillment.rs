//! 组卷编排器 - 编排层
//!
//! ## 职责
//!
//! 1. **顺序处理**：按输入顺序逐个处理分类需求，分类之间不并发
//! 2. **上下文管理**：每次调用新建 `RunCtx`，不同调用之间互不影响
//! 3. **结果汇总**：拼接各分类题目，记录缺口和处理记录
//! 4. **对外约定**：全部分类都没取到题时，由 `into_available` 转换为可重试错误

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::{FulfillError, ProviderFailureKind};
use crate::models::{CategoryQuota, QuestionItem, Topic};
use crate::services::{CorpusStore, QuestionProvider};
use crate::workflow::{FulfillmentSettings, QuotaFlow, QuotaReport, RunCtx};

/// 一次组卷的结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct FulfillmentResult {
    pub items: Vec<QuestionItem>,
    /// 各分类缺口，只记录缺口大于 0 的分类
    pub shortfall: BTreeMap<Topic, usize>,
    /// 各分类处理记录，与输入顺序一致
    pub reports: Vec<QuotaReport>,
}

impl FulfillmentResult {
    /// 请求的题目总数
    pub fn requested(&self) -> usize {
        self.reports
            .iter()
            .fold(0usize, |total, r| total.saturating_add(r.requested))
    }

    /// 是否所有分类都已取满
    pub fn is_complete(&self) -> bool {
        self.shortfall.is_empty()
    }

    /// 最后一次生成服务失败的类型
    pub fn last_failure(&self) -> Option<ProviderFailureKind> {
        self.reports.iter().rev().find_map(|r| r.last_failure)
    }

    /// 对外约定：有请求但一道题都没取到时返回可重试错误
    pub fn into_available(self) -> Result<Self, FulfillError> {
        if self.items.is_empty() && self.requested() > 0 {
            return Err(FulfillError::Unavailable {
                last_failure: self.last_failure(),
            });
        }
        Ok(self)
    }
}

/// 组卷编排器
///
/// 生成服务和题库由调用方注入，可以被多个并发请求共享
pub struct QuotaFulfillment {
    flow: QuotaFlow,
}

impl QuotaFulfillment {
    pub fn new(provider: Arc<dyn QuestionProvider>, store: Arc<dyn CorpusStore>) -> Self {
        Self::with_settings(provider, store, FulfillmentSettings::default())
    }

    pub fn with_settings(
        provider: Arc<dyn QuestionProvider>,
        store: Arc<dyn CorpusStore>,
        settings: FulfillmentSettings,
    ) -> Self {
        Self {
            flow: QuotaFlow::new(provider, store, settings),
        }
    }

    /// 按分类需求组卷
    ///
    /// # 参数
    /// - `quotas`: 分类需求，按顺序处理
    /// - `avoid_texts`: 之前会话已经出过的题干
    ///
    /// # 返回
    /// 不会失败；取不满的分类记录在 `shortfall` 中
    pub async fn fulfill(
        &self,
        quotas: &[CategoryQuota],
        avoid_texts: &[String],
    ) -> FulfillmentResult {
        let mut ctx = RunCtx::new(avoid_texts);
        let mut result = FulfillmentResult::default();

        for (index, quota) in quotas.iter().enumerate() {
            info!("[分类 {}/{}] 开始处理: {}", index + 1, quotas.len(), quota);

            let outcome = self.flow.run(quota, &mut ctx).await;

            if outcome.report.shortfall > 0 {
                let missing = result.shortfall.entry(quota.topic).or_insert(0);
                *missing = missing.saturating_add(outcome.report.shortfall);
            }
            result.items.extend(outcome.items);
            result.reports.push(outcome.report);
        }

        info!(
            "组卷完成: {}/{} 道题，{} 个分类有缺口",
            result.items.len(),
            result.requested(),
            result.shortfall.len()
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;

    fn report(requested: usize, last_failure: Option<ProviderFailureKind>) -> QuotaReport {
        QuotaReport {
            topic: Topic::VerbalAbility,
            difficulty: Difficulty::Easy,
            requested,
            collected: 0,
            generated: 0,
            rejected: 0,
            created: 0,
            db_duplicates: 0,
            run_duplicates: 0,
            degraded: 0,
            fallback_used: 0,
            retry_attempts: 0,
            provider_failures: usize::from(last_failure.is_some()),
            last_failure,
            shortfall: requested,
        }
    }

    #[test]
    fn test_empty_result_for_real_request_is_unavailable() {
        let result = FulfillmentResult {
            reports: vec![
                report(2, Some(ProviderFailureKind::MalformedOutput)),
                report(3, Some(ProviderFailureKind::Overloaded)),
            ],
            ..Default::default()
        };

        match result.into_available() {
            Err(FulfillError::Unavailable { last_failure }) => {
                assert_eq!(last_failure, Some(ProviderFailureKind::Overloaded));
            }
            other => panic!("expected unavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_request_is_not_unavailable() {
        let result = FulfillmentResult::default();
        assert!(result.is_complete());
        assert!(result.into_available().is_ok());
    }
}
