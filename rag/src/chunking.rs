//! Boundary-aware text chunking.

use std::ops::Range;

/// Splits document text into overlapping, boundary-aware segments.
///
/// The chunker walks the text in windows of `chunk_size` characters. A
/// window that does not reach the end of the text is cut at the last
/// sentence-terminating period or newline inside it, provided that break
/// point sits past 70% of the window; otherwise the full window is taken.
/// Consecutive chunks share `overlap` characters of context.
///
/// All positions are character positions, not byte offsets, so multi-byte
/// text never gets cut mid-codepoint.
#[derive(Debug, Clone)]
pub struct Chunker {
    /// Window size in characters.
    chunk_size: usize,
    /// Characters of overlap between consecutive chunks.
    overlap: usize,
}

impl Chunker {
    /// Creates a chunker.
    ///
    /// # Panics
    /// Panics if `chunk_size` is 0 or `overlap >= chunk_size`. Callers
    /// validate both through
    /// [`EngineConfig::validate`](crate::EngineConfig::validate) before the
    /// chunker is ever constructed; a non-positive advance would make the
    /// window walk loop forever.
    #[must_use]
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be greater than 0");
        assert!(
            overlap < chunk_size,
            "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
        );
        Self {
            chunk_size,
            overlap,
        }
    }

    /// Splits `text` into trimmed, non-empty chunks.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        self.spans(&chars)
            .into_iter()
            .map(|span| chars[span].iter().collect::<String>().trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    /// Computes the raw window spans over `chars`, before trimming.
    ///
    /// Invariant: spans start at 0, end at `chars.len()`, and each span
    /// starts at or before the previous span's end, so the union covers the
    /// text without gaps.
    fn spans(&self, chars: &[char]) -> Vec<Range<usize>> {
        let total = chars.len();
        let mut spans = Vec::new();
        let mut start = 0;

        while start < total {
            let end = start + self.chunk_size;
            if end >= total {
                // Final window: take the remainder verbatim.
                spans.push(start..total);
                break;
            }

            let break_point = chars[start..end]
                .iter()
                .rposition(|&c| c == '.' || c == '\n')
                .map(|pos| start + pos);

            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let boundary_floor = start + (self.chunk_size as f32 * 0.7) as usize;

            match break_point {
                Some(bp) if bp > boundary_floor => {
                    spans.push(start..bp + 1);
                    // Clamp keeps the advance strictly positive even when
                    // the overlap reaches back past the break point.
                    start = (bp + 1).saturating_sub(self.overlap).max(start + 1);
                }
                _ => {
                    spans.push(start..end);
                    // end - start == chunk_size > overlap, so this always
                    // moves forward.
                    start = end - self.overlap;
                }
            }
        }

        spans
    }
}
