//! 从生成代码中提取特征映射类与 PennyLane 调用点

use std::sync::OnceLock;

use regex::Regex;

const QML_PREFIX: &str = "qml.";

/// 第一个顶层类：`class ` 开头的行，加上其后缩进行与空行
pub fn extract_class_code(source: &str) -> Option<String> {
    let mut lines = source.lines();
    let header = lines.by_ref().find(|l| l.starts_with("class "))?;
    let mut body = vec![header];
    body.extend(
        lines.take_while(|l| l.trim().is_empty() || l.starts_with(' ') || l.starts_with('\t')),
    );
    while body.last().is_some_and(|l| l.trim().is_empty()) {
        body.pop();
    }
    Some(body.join("\n"))
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// 完整调用文本，如 `qml.RX(phi=x[0], wires=0)`；括号按栈配对，保留首次出现顺序
pub fn extract_qml_calls(class_code: &str) -> Vec<String> {
    let mut calls: Vec<String> = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = class_code[cursor..].find(QML_PREFIX) {
        let start = cursor + offset;
        let name_end = class_code[start..]
            .char_indices()
            .find(|&(_, c)| !is_ident_char(c))
            .map_or(class_code.len(), |(i, _)| start + i);
        cursor = name_end;
        if !class_code[name_end..].starts_with('(') {
            continue;
        }

        let mut depth = 0usize;
        for (i, c) in class_code[name_end..].char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = name_end + i + 1;
                        let call = &class_code[start..end];
                        if !calls.iter().any(|c| c == call) {
                            calls.push(call.to_string());
                        }
                        cursor = end;
                        break;
                    }
                }
                _ => {}
            }
        }
    }
    calls
}

fn call_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"qml\.\w+").expect("valid regex"))
}

/// 调用名（`qml.RX`），按首次出现去重
pub fn extract_call_names(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for m in call_name_regex().find_iter(source) {
        if !names.iter().any(|n| n == m.as_str()) {
            names.push(m.as_str().to_string());
        }
    }
    names
}
