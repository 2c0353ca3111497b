//! Knowledge retrieval

mod chunk;
mod keyword;

pub use chunk::{chunk_text, MAX_CHUNK_CHARS, MIN_CHUNK_CHARS, WORDS_PER_PIECE};
pub use keyword::KeywordRetriever;

/// Source of context passages for a query
pub trait Retriever: Send + Sync {
    /// Up to `max_chunks` passages relevant to `query`, most relevant first
    fn retrieve(&self, query: &str, max_chunks: usize) -> Vec<String>;

    /// Number of passages available
    fn chunk_count(&self) -> usize;
}
