//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use anyhow::Result;
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::orchestrator::FulfillmentResult;
use crate::services::DuplicateGroup;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n组卷日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(mode: &str, corpus_size: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {} 模式", mode);
    info!("📚 题库题目数: {}", corpus_size);
    info!("{}", "=".repeat(60));
}

/// 打印组卷统计
pub fn print_fulfillment_stats(result: &FulfillmentResult, output_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 组卷完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));

    for report in &result.reports {
        info!(
            "{}/{}: {}/{} (新题 {}, 补题 {}, 未入库 {}, 题库重复 {}, 本次重复 {}, 重试 {})",
            report.topic,
            report.difficulty,
            report.collected,
            report.requested,
            report.created,
            report.fallback_used,
            report.degraded,
            report.db_duplicates,
            report.run_duplicates,
            report.retry_attempts
        );
    }

    info!("{}", "─".repeat(60));
    info!("✅ 取到: {}/{}", result.items.len(), result.requested());
    for (topic, missing) in &result.shortfall {
        warn!("❌ {} 缺 {} 道", topic, missing);
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_file);
}

/// 打印查重聚类统计
pub fn print_cluster_stats(groups: &[DuplicateGroup], threshold: f64, output_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 查重完成 (阈值 {:.2})", threshold);
    info!("{}", "=".repeat(60));

    for group in groups {
        info!(
            "保留 {} | 重复 {} 道 | 平均相似度 {:.2} | 最高 {:.2}",
            truncate_text(&group.keep.to_string(), 60),
            group.duplicates.len(),
            group.similarity,
            group.max_similarity
        );
    }

    let removable: usize = groups.iter().map(|g| g.removal_ids().len()).sum();
    info!("{}", "─".repeat(60));
    info!("重复组: {}，建议删除: {} 道", groups.len(), removable);
    info!("\n结果已保存至: {}", output_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("abcdefghij", 4), "abcd...");
        assert_eq!(truncate_text("数学题目很长", 2), "数学...");
    }
}
