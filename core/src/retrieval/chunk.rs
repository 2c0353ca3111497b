//! Corpus chunking

/// Chunks shorter than this are dropped
pub const MIN_CHUNK_CHARS: usize = 50;
/// Chunks longer than this are split by words
pub const MAX_CHUNK_CHARS: usize = 1000;
pub const WORDS_PER_PIECE: usize = 500;

/// Split a corpus into retrievable passages.
///
/// Paragraphs (blank-line separated) are the unit; a corpus with a single
/// paragraph is split into sentences instead. Lengths are in characters.
pub fn chunk_text(text: &str) -> Vec<String> {
    let mut pieces = split_trimmed(text, "\n\n");
    if pieces.len() == 1 {
        pieces = split_trimmed(text, ".");
    }

    let mut chunks = Vec::with_capacity(pieces.len());
    for piece in pieces {
        let length = piece.chars().count();
        if length < MIN_CHUNK_CHARS {
            continue;
        }
        if length > MAX_CHUNK_CHARS {
            let words: Vec<&str> = piece.split_whitespace().collect();
            chunks.extend(words.chunks(WORDS_PER_PIECE).map(|w| w.join(" ")));
        } else {
            chunks.push(piece.to_string());
        }
    }
    chunks
}

fn split_trimmed<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    text.split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAGRAPH: &str =
        "Retrieval-augmented generation combines a search step with a language model.";

    #[test]
    fn test_paragraph_split_drops_short_chunks() {
        let text = format!("{}\n\nToo short.\n\n  {}  \n\n\n", PARAGRAPH, PARAGRAPH);
        let chunks = chunk_text(&text);
        assert_eq!(chunks, vec![PARAGRAPH.to_string(), PARAGRAPH.to_string()]);
    }

    #[test]
    fn test_single_paragraph_falls_back_to_sentences() {
        let text = "The first sentence is long enough to be kept as a chunk of text. \
                    Short one. The third sentence is also long enough to survive the filter.";
        let chunks = chunk_text(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("The first sentence"));
        assert!(chunks[1].starts_with("The third sentence"));
    }

    #[test]
    fn test_long_chunk_split_by_words() {
        let long = vec!["word"; 1200].join(" ");
        let text = format!("{}\n\n{}", PARAGRAPH, long);
        let chunks = chunk_text(&text);

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[1].split_whitespace().count(), 500);
        assert_eq!(chunks[2].split_whitespace().count(), 500);
        assert_eq!(chunks[3].split_whitespace().count(), 200);
    }

    #[test]
    fn test_empty_corpus() {
        assert!(chunk_text("").is_empty());
        assert!(chunk_text("\n\n  \n\n").is_empty());
    }
}
