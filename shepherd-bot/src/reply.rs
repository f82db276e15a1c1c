/// Outgoing messages longer than this are split across several Telegram
/// messages. Comfortably under Telegram's own 4,096-character hard limit.
const MAX_CHUNK_CHARS: usize = 3_500;

/// Split `text` into chunks no longer than [`MAX_CHUNK_CHARS`], preferring
/// to break on a blank line, then any newline, then a space, falling back
/// to a hard cut only when a single "word" exceeds the limit.
pub fn chunk_message(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_CHUNK_CHARS {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + MAX_CHUNK_CHARS).min(chars.len());
        if end == chars.len() {
            chunks.push(chars[start..end].iter().collect());
            break;
        }

        let window = &chars[start..end];
        let split_at = find_break(window, "\n\n")
            .or_else(|| find_break(window, "\n"))
            .or_else(|| find_break(window, " "))
            .unwrap_or(window.len());

        let piece: String = chars[start..start + split_at].iter().collect();
        chunks.push(piece.trim_end().to_string());
        start += split_at;
        while start < chars.len() && chars[start].is_whitespace() {
            start += 1;
        }
    }
    chunks
}

fn find_break(window: &[char], needle: &str) -> Option<usize> {
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() || window.len() < needle_chars.len() {
        return None;
    }
    (0..=window.len() - needle_chars.len())
        .rev()
        .find(|&i| window[i..i + needle_chars.len()] == needle_chars[..])
        .map(|i| i + needle_chars.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_chunk() {
        assert_eq!(chunk_message("hello"), vec!["hello".to_string()]);
    }

    #[test]
    fn long_text_splits_on_word_boundaries() {
        let word = "a".repeat(10);
        let text = std::iter::repeat(word).take(500).collect::<Vec<_>>().join(" ");
        let chunks = chunk_message(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= MAX_CHUNK_CHARS);
        }
        assert_eq!(chunks.join(" "), text);
    }

    #[test]
    fn reassembled_chunks_preserve_content() {
        let text = "word ".repeat(2000);
        let chunks = chunk_message(&text);
        let rejoined = chunks.join(" ");
        assert_eq!(rejoined.split_whitespace().count(), text.split_whitespace().count());
    }
}
