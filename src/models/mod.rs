pub mod candidate;
pub mod loaders;
pub mod question;
pub mod quota;
pub mod topic;

pub use candidate::{validate_candidate, RejectedCandidate};
pub use loaders::{load_corpus_snapshot, load_quota_plan, save_corpus_snapshot};
pub use question::{normalize_text, AnswerKey, Provenance, QuestionId, QuestionItem};
pub use quota::{CategoryQuota, QuotaPlan};
pub use topic::{Difficulty, Topic};
