//! Token 计数与相似度
//!
//! 论文全文截断与向量库分块按 cl100k_base 计 token；
//! 内存检索的 Jaccard 相似度仍按词比较。

use std::collections::HashSet;
use std::ops::Range;
use std::sync::OnceLock;

use tiktoken_rs::{cl100k_base, CoreBPE};

static CL100K: OnceLock<CoreBPE> = OnceLock::new();

/// cl100k_base 编码器，词表随 crate 打包
pub fn bpe() -> &'static CoreBPE {
    CL100K.get_or_init(|| cl100k_base().expect("bundled cl100k_base vocabulary"))
}

pub fn count_tokens(text: &str) -> usize {
    bpe().encode_with_special_tokens(text).len()
}

/// 从 start 起取至多 size 个 token 解码，返回 (文本, 结束位置)
///
/// 切在多字节字符中间时先向前收缩；单个 token 也无法解码时向后扩展。
fn next_window(
    start: usize,
    len: usize,
    size: usize,
    decode: &impl Fn(Range<usize>) -> Option<String>,
) -> Option<(String, usize)> {
    let end = (start + size.max(1)).min(len);
    (start + 1..=end)
        .rev()
        .chain(end + 1..=len)
        .find_map(|e| decode(start..e).map(|text| (text, e)))
}

/// 把 len 个 token 切成至多 size 个一段的窗口并逐段解码
pub(crate) fn token_windows(
    len: usize,
    size: usize,
    decode: impl Fn(Range<usize>) -> Option<String>,
) -> Vec<String> {
    let mut windows = Vec::new();
    let mut start = 0;
    while start < len {
        let Some((text, end)) = next_window(start, len, size, &decode) else {
            break;
        };
        windows.push(text);
        start = end;
    }
    windows
}

/// 超过 max_tokens 时截断到前 max_tokens 个 token
pub fn cut_to_token_limit(text: &str, max_tokens: usize) -> String {
    let bpe = bpe();
    let tokens = bpe.encode_with_special_tokens(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }
    if max_tokens == 0 {
        return String::new();
    }
    next_window(0, tokens.len(), max_tokens, &|r: Range<usize>| {
        bpe.decode(tokens[r].to_vec()).ok()
    })
    .map(|(text, _)| text)
    .unwrap_or_default()
}

/// 检索用分词：小写、去掉标点包裹、过滤单字符
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|s| {
            s.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|s| s.len() > 1)
        .collect()
}

/// Jaccard 相似度
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let ta: HashSet<String> = tokenize(a).into_iter().collect();
    let tb: HashSet<String> = tokenize(b).into_iter().collect();
    if ta.is_empty() && tb.is_empty() {
        return 0.0;
    }
    let inter = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    inter as f64 / union as f64
}
