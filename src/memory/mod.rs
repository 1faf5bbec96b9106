//! 记忆层：对话线程、截断窗口与分词

pub mod conversation;
pub mod tokens;

pub use conversation::{extend_history, last_n_history, Message, Role};
pub use tokens::{bpe, count_tokens, cut_to_token_limit, jaccard_similarity, tokenize};
