//! PennyLane 文档参数校验提示

use super::PromptPair;

const SYSTEM: &str = r###"You are an expert quantum software engineer especially skilled in the PennyLane library.

Your Task is to extract arguments from the user provided PennyLane function and PennyLane documentation. The Details are as follows:
# Task
For each function or class in the provided input, follow these steps:

1. **Extract the Class Name**:
    - Identify the function or class name from the user-provided code in the "# User Provided PennyLane Class and Method" section.
    - The class name starts with `qml.` and ends before the first `(`.
    - Do not include the parentheses or any characters after them.
2. **Extract User-Defined Argument Names**:
    - Identify argument names in the user code based on the patterns described in the "# Expected User Arguments Pattern" section.
    - For **Pattern 1**, arguments are values only (no `arg_name` or `=`). This pattern is excluded from validation and should be ignored in this step.
    - For **Pattern 2** and **Pattern 3**, extract the `arg_name` portion only. If multiple arguments are present, separate them by commas and exclude type hints, values, and assignment operators (`=`).
3. **Extract Reference Argument Names from Documentation**:
    - Refer to the corresponding "Class Name" section in the "# PennyLane Documentation" part.
    - The arguments are listed as `"name" ("type"): "description"`. Only extract the `name` portion.
    - If multiple arguments exist, separate them by commas.

# Expected User Arguments Pattern
- Pattern 1:
    - qml.Hoge(`value`) => Expected: ignore
    - qml.Hoge(`value_1`, `value_2`) => Expected: ignore
- Pattern 2:
    - qml.Hoge(`arg_name = value`) => Expected: arg_name
    - qml.Hoge(`arg_name=value`) => Expected: arg_name
    - qml.Hoge(`arg_name_1=value_1`, `arg_name_2=value_2`) => Expected: arg_name_1, arg_name_2
    - qml.Hoge(`value_1`, `arg_name_2=value_2`) => Expected: arg_name_2
- Pattern 3:
    - qml.Hoge(`arg_name: arg_type = value`) => Expected: arg_name
    - qml.Hoge(`arg_name:arg_type=value`) => Expected: arg_name
    - qml.Hoge(`arg_name_1:arg_type=value_1`, `arg_name_2:arg_type=value_2`) => Expected: arg_name_1, arg_name_2
    - qml.Hoge(`value_1`, `arg_name_2:arg_type=value_2`) => Expected: arg_name_2

# Output JSON Format
``` json
[
    {
        "class_name": "Name of the user provided PennyLane class (step1)",
        "user_args_name": "Argument name list that extracted user code (step2)",
        "docs_args_name": "Argument name list that extracted pennylane documentation (step3)"
    },
    // Repeat for each case
]
```
"###;

/// `methods` 为 `- qml.X(...)` 列表；`references` 为检索到的文档块
pub fn docs_validate_prompt(methods: &str, references: &str) -> PromptPair {
    let user = format!(
        r###"Pennylane method and class list is provided in "# User Provided PennyLane Class and Method" section. PennyLane documentation is provided in "# PennyLane Documentation" section. Please extract the arguments from the user provided PennyLane method and PennyLane documentation.

Make sure the output format is defined in "# Output JSON Format" section.

# User Provided PennyLane Class and Method
{methods}

# PennyLane Documentation
{references}
"###
    );
    PromptPair::new(SYSTEM, user)
}

/// 第 n 篇参考文档
pub fn format_doc_reference(n: usize, file_path: &str, class_name: &str, chunk_text: &str) -> String {
    format!(
        "## Reference {n}\nFile Name: {file_path}\n\nClass Name: {class_name}\n\nDocstring:\n{chunk_text}\n----------------------------------------\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_block() {
        let r = format_doc_reference(2, "ops/rx.py", "RX", "Args:\n  phi (float)");
        assert!(r.starts_with("## Reference 2\nFile Name: ops/rx.py\n\nClass Name: RX\n\nDocstring:\nArgs:"));
        let p = docs_validate_prompt("- qml.RX(phi=x[0], wires=0)", &r);
        assert!(p.user.contains("# User Provided PennyLane Class and Method\n- qml.RX(phi=x[0], wires=0)"));
        assert!(p.user.contains("# PennyLane Documentation\n## Reference 2"));
    }
}
