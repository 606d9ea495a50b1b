pub mod toml_loader;

pub use toml_loader::{load_corpus_snapshot, load_quota_plan, save_corpus_snapshot, CorpusSnapshot};
