//! Sentence-aware chunking with word-count targets and overlap.

/// Split text into sentence-like units: `!` and `?` count as `.`, units are
/// trimmed and empty ones dropped.
pub fn split_units(text: &str) -> Vec<&str> {
    text.split(['.', '!', '?']).map(str::trim).filter(|s| !s.is_empty()).collect()
}

fn word_count(unit: &str) -> usize { unit.split_whitespace().count() }

fn close(units: &[&str]) -> String { format!("{}.", units.join(". ")) }

/// Chunk `text` into segments of roughly `target_size_words` words.
///
/// Units are never split: one oversized sentence becomes its own chunk even
/// if it exceeds the target. Each new chunk starts with the longest suffix of
/// the previous chunk whose word count stays within `overlap_words`.
pub fn chunk_text(text: &str, target_size_words: usize, overlap_words: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_size = 0usize;

    for unit in split_units(text) {
        let size = word_count(unit);
        if current_size + size > target_size_words && !current.is_empty() {
            chunks.push(close(&current));

            let mut carried = 0usize;
            let mut keep_from = current.len();
            for (i, s) in current.iter().enumerate().rev() {
                let n = word_count(s);
                if carried + n > overlap_words { break; }
                carried += n;
                keep_from = i;
            }
            current.drain(..keep_from);
            current_size = carried;
        }
        current.push(unit);
        current_size += size;
    }

    if !current.is_empty() { chunks.push(close(&current)); }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_terminators_and_drops_empty_units() {
        assert_eq!(split_units("One! Two? Three.. . Four"), vec!["One", "Two", "Three", "Four"]);
    }

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(chunk_text("Hello there. General Kenobi!", 50, 5), vec!["Hello there. General Kenobi."]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("  . ! ?  ", 10, 2).is_empty());
    }

    #[test]
    fn oversized_sentence_is_kept_whole() {
        let long = "w ".repeat(30);
        let text = format!("a b. {long}. c d");
        let chunks = chunk_text(&text, 5, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].split_whitespace().count(), 30);
    }

    #[test]
    fn overlap_carries_trailing_sentences() {
        // three-word sentences, target 6 words, overlap 3 words
        let text = "a1 a2 a3. b1 b2 b3. c1 c2 c3. d1 d2 d3";
        let chunks = chunk_text(text, 6, 3);
        assert_eq!(chunks, vec!["a1 a2 a3. b1 b2 b3.", "b1 b2 b3. c1 c2 c3.", "c1 c2 c3. d1 d2 d3."]);
    }
}
