//! 原始文本 → JSON 整理提示（供解析模型使用）

use super::PromptPair;

const SYSTEM: &str = r#"You are a helpful assistant capable of parsing strings into JSON-compatible formats.
When given an input string, ensure it is transformed into a format that can be successfully parsed by a strict JSON parser.
If the input string is already in a JSON-compatible format, return it without modification.
Handle edge cases like improper quotes, missing brackets, or incorrect separators.
Always prioritize making the string valid JSON."#;

pub fn parse_json_prompt(raw_content: &str) -> PromptPair {
    let user = format!(
        r#"The following string needs to be parsed into a JSON-compatible format for use with a strict JSON parser.
If it is invalid or improperly formatted, correct it.

The value corresponding to each JSON key is enclosed with the same tag name as the key. Please perform formatting only without altering the meaning of the text.

Here is the input:
"{raw_content}"
"#
    );
    PromptPair::new(SYSTEM, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_raw_content() {
        let p = parse_json_prompt("<answer>42</answer>");
        assert!(p.user.contains("\"<answer>42</answer>\""));
        assert!(p.system.contains("JSON"));
    }
}
