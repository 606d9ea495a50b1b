use crate::models::question::QuestionItem;
use crate::models::quota::QuotaPlan;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// 题库快照文件格式
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CorpusSnapshot {
    #[serde(default)]
    pub questions: Vec<QuestionItem>,
}

/// 从 TOML 文件加载题库快照
///
/// 文件不存在时返回空题库
pub async fn load_corpus_snapshot(path: &Path) -> Result<Vec<QuestionItem>> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        tracing::warn!("题库文件不存在，使用空题库: {}", path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取题库文件: {}", path.display()))?;

    let snapshot: CorpusSnapshot = toml::from_str(&content)
        .with_context(|| format!("无法解析题库文件: {}", path.display()))?;

    let total = snapshot.questions.len();
    let questions: Vec<QuestionItem> = snapshot
        .questions
        .into_iter()
        .filter(|item| {
            let blank = item.stored_text().is_empty();
            if blank {
                tracing::warn!("跳过题干为空的题目: {:?}", item.id);
            }
            !blank
        })
        .collect();

    tracing::info!(
        "成功加载 {} 道题目（跳过 {} 道空题干）",
        questions.len(),
        total - questions.len()
    );

    Ok(questions)
}

/// 把题库快照写回 TOML 文件
pub async fn save_corpus_snapshot(path: &Path, questions: Vec<QuestionItem>) -> Result<()> {
    let snapshot = CorpusSnapshot { questions };
    let content = toml::to_string_pretty(&snapshot).context("无法序列化题库快照")?;

    fs::write(path, content)
        .await
        .with_context(|| format!("无法写入题库文件: {}", path.display()))?;

    tracing::info!(
        "题库已保存: {} ({} 道题目)",
        path.display(),
        snapshot.questions.len()
    );

    Ok(())
}

/// 从 TOML 文件加载组卷请求
pub async fn load_quota_plan(path: &Path) -> Result<QuotaPlan> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取组卷文件: {}", path.display()))?;

    let plan: QuotaPlan = toml::from_str(&content)
        .with_context(|| format!("无法解析组卷文件: {}", path.display()))?;

    tracing::info!(
        "成功加载 {} 个分类需求，回避题干 {} 条",
        plan.quotas.len(),
        plan.avoid.len()
    );

    Ok(plan)
}
