//! Keyword-overlap retriever

use std::path::{Path, PathBuf};

use tracing::info;

use super::{chunk_text, Retriever};
use crate::error::RetrievalError;

/// Ranks chunks by how many query words they contain
#[derive(Debug, Clone, Default)]
pub struct KeywordRetriever {
    chunks: Vec<String>,
    lowered: Vec<String>,
    source: Option<PathBuf>,
}

impl KeywordRetriever {
    pub fn from_text(text: &str) -> Self {
        Self::from_chunks(chunk_text(text))
    }

    pub fn from_chunks(chunks: Vec<String>) -> Self {
        let lowered = chunks.iter().map(|c| c.to_lowercase()).collect();
        Self {
            chunks,
            lowered,
            source: None,
        }
    }

    /// Load and chunk a knowledge file
    pub async fn load(path: &Path) -> Result<Self, RetrievalError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RetrievalError::NotFound {
                    path: path.display().to_string(),
                }
            } else {
                RetrievalError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let mut retriever = Self::from_text(&text);
        retriever.source = Some(path.to_path_buf());
        info!(chunks = retriever.chunks.len(), path = %path.display(), "loaded knowledge file");
        Ok(retriever)
    }

    pub fn chunks(&self) -> &[String] {
        &self.chunks
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl Retriever for KeywordRetriever {
    fn retrieve(&self, query: &str, max_chunks: usize) -> Vec<String> {
        let query = query.to_lowercase();
        let words: Vec<&str> = query.split_whitespace().collect();

        let mut scored: Vec<(usize, usize)> = self
            .lowered
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, words.iter().filter(|w| chunk.contains(**w)).count()))
            .filter(|&(_, score)| score > 0)
            .collect();
        // stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        scored
            .into_iter()
            .take(max_chunks)
            .map(|(i, _)| self.chunks[i].clone())
            .collect()
    }

    fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn retriever() -> KeywordRetriever {
        KeywordRetriever::from_chunks(vec![
            "Our office is located downtown near a central station.".to_string(),
            "RAG pairs a retriever with a generator to ground answers.".to_string(),
            "The retriever ranks passages; the generator writes the answer.".to_string(),
        ])
    }

    #[test]
    fn test_ranking_by_overlap() {
        let chunks = retriever().retrieve("How does the RAG retriever work", 3);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("RAG pairs"));
    }

    #[test]
    fn test_ties_keep_corpus_order_and_limit() {
        let chunks = retriever().retrieve("generator", 1);
        assert_eq!(chunks, vec!["RAG pairs a retriever with a generator to ground answers."]);
    }

    #[test]
    fn test_zero_scores_dropped() {
        assert!(retriever().retrieve("zebra", 3).is_empty());
        assert!(retriever().retrieve("", 3).is_empty());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "The knowledge base describes the company handbook in detail.\n\nVacation policy: employees get twenty days of paid leave per year."
        )
        .unwrap();

        let retriever = KeywordRetriever::load(file.path()).await.unwrap();
        assert_eq!(retriever.chunk_count(), 2);
        assert_eq!(retriever.source(), Some(file.path()));
        assert_eq!(retriever.retrieve("vacation", 3).len(), 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = KeywordRetriever::load(Path::new("/nonexistent/knowledge.txt")).await;
        assert!(matches!(result, Err(RetrievalError::NotFound { .. })));
    }
}
