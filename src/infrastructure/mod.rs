pub mod memory_corpus;

pub use memory_corpus::InMemoryCorpus;
