//! Fixed-width overlapping text splitter.
//!
//! Splits page text into [`Chunk`]s of at most `chunk_size` characters.
//! A window of `chunk_size` characters slides forward by
//! `chunk_size - chunk_overlap` characters per step, so consecutive chunks
//! share exactly `chunk_overlap` characters; the last window of a page may be
//! shorter. Characters are Unicode scalar values, never bytes, so multi-byte
//! text is never cut mid-character.
//!
//! There is no sentence or paragraph awareness.
//!
//! # Example
//!
//! ```rust
//! use docqa::splitter::split_text;
//!
//! let chunks = split_text("abcdefghij", 4, 1);
//! assert_eq!(chunks, vec!["abcd", "defg", "ghij"]);
//! ```

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::models::{Chunk, Page};

/// Window parameters for [`split_pages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
        }
    }
}

impl From<&ChunkingConfig> for SplitterConfig {
    fn from(c: &ChunkingConfig) -> Self {
        Self {
            chunk_size: c.chunk_size,
            chunk_overlap: c.chunk_overlap,
        }
    }
}

/// Split `text` into windows of `size` characters overlapping by `overlap`.
///
/// Text no longer than `size` (including empty text) yields exactly one
/// chunk. Longer text yields `ceil((L - overlap) / (size - overlap))` chunks.
/// `overlap` must be smaller than `size`; the step is clamped to at least one
/// character so a bad pair can never loop forever.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let size = size.max(1);
    let step = size.saturating_sub(overlap).max(1);

    // Byte offset of every char start, plus the end of the string.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let len = bounds.len() - 1;

    if len <= size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::with_capacity((len - overlap.min(len)).div_ceil(step));
    let mut start = 0;
    loop {
        let end = (start + size).min(len);
        chunks.push(text[bounds[start]..bounds[end]].to_string());
        if end == len {
            break;
        }
        start += step;
    }
    chunks
}

/// Split every page into chunks, keeping page provenance.
///
/// Pages are processed independently so a chunk never spans two pages.
/// Pages with only whitespace are skipped. Chunk indices are contiguous
/// across the document, starting at 0.
pub fn split_pages(pages: &[Page], config: &SplitterConfig) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        for piece in split_text(&page.text, config.chunk_size, config.chunk_overlap) {
            let index = chunks.len();
            chunks.push(make_chunk(page, index, piece));
        }
    }

    chunks
}

fn make_chunk(page: &Page, index: usize, text: String) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        index,
        page: page.number,
        source: page.source.clone(),
        text,
        hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, text: &str) -> Page {
        Page {
            number,
            text: text.to_string(),
            source: "test.pdf".to_string(),
        }
    }

    fn expected_count(len: usize, size: usize, overlap: usize) -> usize {
        if len <= size {
            1
        } else {
            (len - overlap).div_ceil(size - overlap)
        }
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = split_text("Hello, world!", 1000, 150);
        assert_eq!(chunks, vec!["Hello, world!"]);
    }

    #[test]
    fn test_empty_text_single_chunk() {
        assert_eq!(split_text("", 1000, 150), vec![String::new()]);
    }

    #[test]
    fn test_exact_size_single_chunk() {
        let text = "x".repeat(1000);
        assert_eq!(split_text(&text, 1000, 150).len(), 1);
    }

    #[test]
    fn test_chunk_count_formula() {
        for len in [1001, 1850, 1851, 2000, 2550, 5000, 12_345] {
            let text: String = (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect();
            let chunks = split_text(&text, 1000, 150);
            assert_eq!(
                chunks.len(),
                expected_count(len, 1000, 150),
                "count mismatch for len {}",
                len
            );
        }
    }

    #[test]
    fn test_size_bound_and_exact_overlap() {
        let text: String = (0..4321).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = split_text(&text, 1000, 150);
        for c in &chunks {
            assert!(c.chars().count() <= 1000);
        }
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(prev.len(), 1000, "only the last chunk may be short");
            assert_eq!(&prev[prev.len() - 150..], &next[..150]);
        }
    }

    #[test]
    fn test_chunks_cover_text() {
        let text: String = (0..2600).map(|i| char::from(b'0' + (i % 10) as u8)).collect();
        let chunks = split_text(&text, 1000, 150);
        let mut rebuilt = chunks[0].clone();
        for c in &chunks[1..] {
            rebuilt.extend(c.chars().skip(150));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_multibyte_characters() {
        let text = "é".repeat(25);
        let chunks = split_text(&text, 10, 2);
        assert_eq!(chunks.len(), expected_count(25, 10, 2));
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert_eq!(chunks[0], "é".repeat(10));
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta ".repeat(200);
        let a = split_text(&text, 100, 20);
        let b = split_text(&text, 100, 20);
        assert_eq!(a, b);

        let pages = vec![page(1, &text), page(2, &text)];
        let c1 = split_pages(&pages, &SplitterConfig::default());
        let c2 = split_pages(&pages, &SplitterConfig::default());
        assert_eq!(c1.len(), c2.len());
        for (x, y) in c1.iter().zip(c2.iter()) {
            assert_eq!(x.text, y.text);
            assert_eq!(x.hash, y.hash);
            assert_eq!(x.index, y.index);
            assert_eq!(x.page, y.page);
        }
    }

    #[test]
    fn test_split_pages_keeps_page_numbers_and_contiguous_indices() {
        let pages = vec![
            page(1, &"a".repeat(1500)),
            page(2, "   \n  "),
            page(3, "short page"),
        ];
        let chunks = split_pages(&pages, &SplitterConfig::default());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 1);
        assert_eq!(chunks[2].page, 3);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.source, "test.pdf");
        }
    }

    #[test]
    fn test_overlap_not_smaller_than_size_still_terminates() {
        let chunks = split_text("abcdef", 2, 5);
        assert_eq!(chunks.len(), 5);
    }
}
