//! 文本分块：按固定 token 窗口或按句子累积（cl100k_base 计数）

use crate::memory::tokens::token_windows;
use crate::memory::{bpe, count_tokens};

use super::ChunkMethod;

/// 固定窗口：每 chunk_size 个 token 一块，块首尾空白去掉
pub fn chunk_by_size(text: &str, chunk_size: usize) -> Vec<String> {
    let bpe = bpe();
    let tokens = bpe.encode_with_special_tokens(text);
    token_windows(tokens.len(), chunk_size, |r| bpe.decode(tokens[r].to_vec()).ok())
        .into_iter()
        .map(|chunk| chunk.trim().to_string())
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

/// 句子以 `.` `!` `?` 结尾且后跟空白
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let Some(&(end, next)) = chars.peek() else {
            break;
        };
        if !next.is_whitespace() {
            continue;
        }
        sentences.push(&text[start..end]);
        // 跳过连续空白
        while chars.peek().is_some_and(|&(_, w)| w.is_whitespace()) {
            chars.next();
        }
        start = chars.peek().map(|&(k, _)| k).unwrap_or(text.len());
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// 句子累积：拼上下一句后 token 数不超过 chunk_size 就并入当前块
pub fn chunk_by_sentence(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(text) {
        let candidate = if current.is_empty() {
            sentence.to_string()
        } else {
            format!("{} {}", current, sentence)
        };
        if count_tokens(&candidate) <= chunk_size || current.is_empty() {
            current = candidate;
        } else {
            chunks.push(std::mem::take(&mut current));
            current = sentence.to_string();
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub fn chunk_text(text: &str, chunk_size: usize, method: ChunkMethod) -> Vec<String> {
    match method {
        ChunkMethod::Size => chunk_by_size(text, chunk_size),
        ChunkMethod::Sentence => chunk_by_sentence(text, chunk_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_by_size() {
        let chunks = chunk_by_size("a b c d e", 2);
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
        assert!(chunk_by_size("", 3).is_empty());
    }

    #[test]
    fn test_chunk_by_size_counts_tokens() {
        // 一个长词占多个 token，按词计数时只会得到一块
        let word = "pneumonoultramicroscopicsilicovolcanoconiosis";
        let chunks = chunk_by_size(word, 2);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), word);
    }

    #[test]
    fn test_split_sentences() {
        let s = split_sentences("First one. Second!  Third? tail");
        assert_eq!(s, vec!["First one.", "Second!", "Third?", "tail"]);
        // 小数点不切分
        assert_eq!(split_sentences("pi is 3.14 ok."), vec!["pi is 3.14 ok."]);
    }

    #[test]
    fn test_chunk_by_sentence_accumulates() {
        // 各句 token 数：4、3、5
        let text = "One two three. Four five. Six seven eight nine.";
        let chunks = chunk_by_sentence(text, 8);
        assert_eq!(chunks, vec!["One two three. Four five.", "Six seven eight nine."]);
    }

    #[test]
    fn test_long_sentence_kept_whole() {
        let chunks = chunk_by_sentence("a b c d e f. g.", 3);
        assert_eq!(chunks, vec!["a b c d e f.", "g."]);
    }
}
