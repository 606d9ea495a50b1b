//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整次组卷的调度和汇总，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `fulfillment` - 组卷编排器
//! - 按顺序处理 `Vec<CategoryQuota>`
//! - 每次调用新建 `RunCtx`
//! - 汇总题目、缺口和处理记录
//!
//! ### `app` - 命令行应用
//! - 加载题库快照和组卷文件
//! - 持有题库和生成服务
//! - 组卷 / 查重两种模式
//!
//! ## 层次关系
//!
//! ```text
//! app (加载文件、选择模式)
//!     ↓
//! fulfillment (处理 Vec<CategoryQuota>)
//!     ↓
//! workflow::QuotaFlow (处理单个 CategoryQuota)
//!     ↓
//! services (能力层：出题 / 题库 / 相似度)
//!     ↓
//! infrastructure (基础设施：InMemoryCorpus)
//! ```

pub mod app;
pub mod fulfillment;

// 重新导出主要类型
pub use app::App;
pub use fulfillment::{FulfillmentResult, QuotaFulfillment};
