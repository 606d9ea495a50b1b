pub mod quota_flow;
pub mod run_ctx;

pub use quota_flow::{FulfillmentSettings, QuotaFlow, QuotaOutcome, QuotaReport};
pub use run_ctx::RunCtx;
