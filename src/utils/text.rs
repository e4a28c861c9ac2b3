//! Text normalization shared by the enrichment and scoring stages.

use once_cell::sync::Lazy;
use regex::Regex;

/// Platform emoji markers such as `[微笑]` or `[赞R]`.
static EMOJI_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]+\]").expect("valid regex"));
static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));
static REPEATED_BANG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[!！]{2,}").expect("valid regex"));
static REPEATED_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?？]{2,}").expect("valid regex"));
static HEX_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9a-fA-F]+$").expect("valid regex"));

/// Length of a comment with emoji markers removed and punctuation
/// stripped, in characters.
pub fn text_length(text: &str) -> usize {
    let without_markers = EMOJI_MARKER.replace_all(text, "");
    PUNCTUATION
        .replace_all(&without_markers, "")
        .trim()
        .chars()
        .count()
}

/// Like [`text_length`], but each emoji marker counts as one character.
pub fn text_length_with_emojis(text: &str) -> usize {
    let markers_as_one = EMOJI_MARKER.replace_all(text, "a");
    PUNCTUATION
        .replace_all(&markers_as_one, "")
        .trim()
        .chars()
        .count()
}

/// Preprocessing applied before a comment reaches a sentiment model:
/// keep emoji, alphanumeric and whitespace characters, collapse repeated
/// `!`/`?` runs, trim.
pub fn preprocess_text(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|&c| is_emoji(c) || c.is_alphanumeric() || c.is_whitespace())
        .collect();
    let collapsed = REPEATED_BANG.replace_all(&kept, "！");
    let collapsed = REPEATED_QUESTION.replace_all(&collapsed, "？");
    collapsed.trim().to_string()
}

/// Single-codepoint emoji check.
pub fn is_emoji(c: char) -> bool {
    let mut buf = [0u8; 4];
    emojis::get(c.encode_utf8(&mut buf)).is_some()
}

/// True when a parent-comment ID is a bare hexadecimal string, which marks
/// the row as a reply.
pub fn is_hex_id(value: &str) -> bool {
    HEX_ID.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_ignore_or_count_emoji_markers() {
        assert_eq!(text_length("你好[微笑]!!world"), 7);
        assert_eq!(text_length_with_emojis("你好[微笑]!!world"), 8);
    }

    #[test]
    fn lengths_trim_surrounding_whitespace() {
        assert_eq!(text_length("  好看 [赞R] "), 2);
        assert_eq!(text_length_with_emojis("  好看 [赞R] "), 4);
        assert_eq!(text_length("[哭惹R]"), 0);
    }

    #[test]
    fn preprocess_keeps_emoji_and_words() {
        assert_eq!(preprocess_text("太美了😍!!!  "), "太美了😍");
        assert_eq!(preprocess_text("what?? ok"), "what ok");
        assert_eq!(preprocess_text("[微笑]赞"), "微笑赞");
    }

    #[test]
    fn hex_ids_detected() {
        assert!(is_hex_id("660675a0000000001a00e578"));
        assert!(!is_hex_id("一级评论"));
        assert!(!is_hex_id(""));
        assert!(!is_hex_id("nan-1"));
    }
}
