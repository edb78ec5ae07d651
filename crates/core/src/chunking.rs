#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub max_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1_200,
            overlap_chars: 200,
        }
    }
}

/// Splits text into windows of at most `max_chars` characters, each full
/// window sharing its trailing `overlap_chars` with the start of the next.
///
/// The final window always ends exactly at the end of the text, and the
/// start index advances by at least one character per iteration, so the
/// loop terminates even when the text is shorter than the overlap window.
/// Windowing is over chars, not bytes; policy documents contain non-ASCII.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.max_chars).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start = end.saturating_sub(config.overlap_chars).max(start + 1);
    }

    chunks
}
