//! 对话线程
//!
//! 网关收到的是与供应商无关的 user/assistant 消息序列；各适配器自行转换为原生格式。
//! `last_n_history` 是唯一的截断规则，所有供应商共用。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致；Developer 仅用于推理系列模型的系统提示）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Developer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Developer => "developer",
        }
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn developer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Developer,
            content: content.into(),
        }
    }
}

/// 截断窗口：None 取全部；Some(0) 取空；Some(k) 取最后 2k 条（一轮 = user + assistant）
pub fn last_n_history(history: &[Message], n_history: Option<usize>) -> Vec<Message> {
    match n_history {
        None => history.to_vec(),
        Some(0) => Vec::new(),
        Some(k) => {
            let keep = k.saturating_mul(2);
            let start = history.len().saturating_sub(keep);
            history[start..].to_vec()
        }
    }
}

/// 一次交互之后的完整线程：原线程（未截断）+ 本轮 user + assistant
pub fn extend_history(history: &[Message], user_prompt: &str, reply: &str) -> Vec<Message> {
    let mut updated = Vec::with_capacity(history.len() + 2);
    updated.extend_from_slice(history);
    updated.push(Message::user(user_prompt));
    updated.push(Message::assistant(reply));
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(turns: usize) -> Vec<Message> {
        (0..turns)
            .flat_map(|i| {
                [
                    Message::user(format!("q{}", i)),
                    Message::assistant(format!("a{}", i)),
                ]
            })
            .collect()
    }

    #[test]
    fn test_window_none_keeps_everything() {
        let h = thread(4);
        assert_eq!(last_n_history(&h, None), h);
    }

    #[test]
    fn test_window_zero_is_empty() {
        assert!(last_n_history(&thread(4), Some(0)).is_empty());
    }

    #[test]
    fn test_window_keeps_last_pairs() {
        let h = thread(4);
        let w = last_n_history(&h, Some(1));
        assert_eq!(w.len(), 2);
        assert_eq!(w[0].content, "q3");
        assert_eq!(w[1].content, "a3");

        let w = last_n_history(&h, Some(3));
        assert_eq!(w.len(), 6);
        assert_eq!(w[0].content, "q1");
    }

    #[test]
    fn test_window_shorter_history() {
        let h = thread(1);
        assert_eq!(last_n_history(&h, Some(5)).len(), 2);
        assert!(last_n_history(&[], Some(2)).is_empty());
    }

    #[test]
    fn test_extend_keeps_full_thread() {
        let h = thread(3);
        let updated = extend_history(&h, "next", "reply");
        assert_eq!(updated.len(), 8);
        assert_eq!(updated[6], Message::user("next"));
        assert_eq!(updated[7].role, Role::Assistant);
    }
}
