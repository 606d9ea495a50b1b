pub mod corpus_store;
pub mod llm_provider;
pub mod provider;
pub mod similarity;

pub use corpus_store::CorpusStore;
pub use llm_provider::LlmQuestionProvider;
pub use provider::{GenerationBatch, GenerationRequest, QuestionProvider};
pub use similarity::{cluster, edit_distance, similarity, DuplicateGroup, SimilarItem};
