//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`RecursiveChunker`], which
//! splits text at the highest-priority natural boundary available
//! (paragraph, line, sentence, word, then character) and overlaps
//! consecutive chunks at word boundaries.
//!
//! All sizes are counted in characters, never bytes, and every chunk
//! boundary is a valid UTF-8 boundary of the source text.

use crate::config::{RagConfig, validate_chunking};
use crate::document::{CHUNK_INDEX_KEY, Chunk, Document, START_INDEX_KEY};
use crate::error::Result;

/// Maximum number of characters a chunk may exceed the configured
/// `chunk_size` by.
///
/// [`RecursiveChunker`] never overflows: when no separator fits inside the
/// window it falls back to a hard character cut.
pub const CHUNK_SIZE_SLACK: usize = 0;

/// Separator levels in decreasing priority: paragraph, line, sentence, word.
/// Character-level cutting is the implicit last level.
const SEPARATOR_LEVELS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// A strategy for splitting documents into chunks.
///
/// Implementations are pure: the same document always yields the same
/// chunks, in source order.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document text is empty or whitespace-only.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text hierarchically: paragraphs → lines → sentences → words → characters.
///
/// For each chunk the splitter looks at the next `chunk_size` characters and
/// cuts after the last paragraph break in that window; failing that, after the
/// last line break, sentence end, or space, and finally at the window edge.
/// The following chunk restarts at the first word boundary within the last
/// `chunk_overlap` characters of the previous one, so neighbours share
/// roughly `chunk_overlap` characters of text. When that window holds only
/// whitespace, the next chunk starts at the last word before it instead.
///
/// Each chunk inherits the parent document's metadata plus `chunk_index` and
/// `start_index` (byte offset of the chunk text in the source).
///
/// # Example
///
/// ```rust,ignore
/// use ragbench_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(500, 50)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: approximate number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`](crate::RagError::Configuration) if
    /// `chunk_size == 0` or `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        validate_chunking(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Target overlap between consecutive chunks, in characters.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split raw text into trimmed slices, each paired with its byte offset
    /// in `text`.
    pub fn split_text<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        let mut spans = Vec::new();
        let mut start = skip_whitespace(text, 0);
        let mut prev_cut = None;

        while start < text.len() {
            let window_end = advance_chars(text, start, self.chunk_size);
            let cut = if window_end >= text.len() {
                text.len()
            } else {
                let min_cut = self.min_cut(text, start, prev_cut);
                find_cut(text, start, min_cut, window_end, SEPARATOR_LEVELS)
            };

            push_trimmed(&mut spans, text, start, cut);

            if text[cut..].trim_start().is_empty() {
                break;
            }
            start = self.overlap_start(text, start, cut);
            prev_cut = Some(cut);
        }

        spans
    }

    /// Earliest acceptable cut for a chunk beginning at `start`.
    ///
    /// The cut lies past the overlap window and takes in at least one
    /// non-whitespace character beyond the previous cut, so every chunk
    /// extends its predecessor. With a positive overlap it also
    /// keeps a second non-whitespace character in the chunk, leaving the
    /// next chunk somewhere to start other than `start` itself.
    fn min_cut(&self, text: &str, start: usize, prev_cut: Option<usize>) -> usize {
        let mut min_cut = advance_chars(text, start, self.chunk_overlap + 1);
        if let Some(prev_cut) = prev_cut {
            min_cut = min_cut.max(advance_chars(text, skip_whitespace(text, prev_cut), 1));
        }
        if self.chunk_overlap > 0 {
            let second = skip_whitespace(text, advance_chars(text, start, 1));
            min_cut = min_cut.max(advance_chars(text, second, 1));
        }
        min_cut
    }

    /// Where the chunk following `text[start..cut]` begins.
    fn overlap_start(&self, text: &str, start: usize, cut: usize) -> usize {
        if self.chunk_overlap == 0 {
            return skip_whitespace(text, cut);
        }

        let window_start = retreat_chars(text, cut, self.chunk_overlap);
        let mut prev = text[..window_start].chars().next_back();
        for (offset, ch) in text[window_start..cut].char_indices() {
            if !ch.is_whitespace() && prev.is_some_and(char::is_whitespace) {
                return window_start + offset;
            }
            prev = Some(ch);
        }

        // No word starts inside the window: overlap by raw characters instead.
        let fallback = skip_whitespace(text, window_start);
        if fallback < cut {
            return fallback;
        }

        // The window is all whitespace: back up to the last word before it.
        let Some((offset, last_char)) =
            text[start..window_start].char_indices().rfind(|(_, c)| !c.is_whitespace())
        else {
            return skip_whitespace(text, cut);
        };
        let last = start + offset;
        let word_start = text[..last]
            .char_indices()
            .rfind(|(_, c)| c.is_whitespace())
            .map_or(0, |(i, c)| i + c.len_utf8());

        if word_start > start {
            word_start
        } else if last > start {
            // The chunk is a single word: share its tail.
            let tail = retreat_chars(text, last + last_char.len_utf8(), self.chunk_overlap);
            tail.max(advance_chars(text, start, 1))
        } else {
            // A lone character followed by more than a window of whitespace.
            skip_whitespace(text, cut)
        }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, (offset, text))| {
                let mut metadata = document.metadata.clone();
                metadata.insert(CHUNK_INDEX_KEY.to_string(), i.to_string());
                metadata.insert(START_INDEX_KEY.to_string(), offset.to_string());
                Chunk {
                    text: text.to_string(),
                    source_id: document.id.clone(),
                    sequence_index: i,
                    metadata,
                }
            })
            .collect()
    }
}

/// Pick the cut point for the window `text[start..window_end]`.
///
/// Tries each separator level in turn and cuts right after the last match
/// that lands at or beyond `min_cut`; recurses into lower-priority levels
/// when a level has no usable match.
fn find_cut(
    text: &str,
    start: usize,
    min_cut: usize,
    window_end: usize,
    levels: &[&[&str]],
) -> usize {
    let Some((separators, remaining)) = levels.split_first() else {
        return window_end;
    };

    let window = &text[start..window_end];
    let best = separators
        .iter()
        .filter_map(|sep| window.rfind(sep).map(|pos| start + pos + sep.len()))
        .filter(|&cut| cut >= min_cut)
        .max();

    match best {
        Some(cut) => cut,
        None => find_cut(text, start, min_cut, window_end, remaining),
    }
}

fn push_trimmed<'a>(spans: &mut Vec<(usize, &'a str)>, text: &'a str, start: usize, end: usize) {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return;
    }
    let leading = slice.len() - slice.trim_start().len();
    spans.push((start + leading, trimmed));
}

/// Byte offset reached by moving `n` characters forward from `from`.
fn advance_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..].char_indices().nth(n).map_or(text.len(), |(i, _)| from + i)
}

/// Byte offset reached by moving `n` characters backward from `from`.
fn retreat_chars(text: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    text[..from].char_indices().nth_back(n - 1).map_or(0, |(i, _)| i)
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..].char_indices().find(|(_, c)| !c.is_whitespace()).map_or(text.len(), |(i, _)| from + i)
}
