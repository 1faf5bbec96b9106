//! 论文摘要提示

use super::PromptPair;

pub fn summary_prompt(paper_content: &str, max_summary_words: usize) -> PromptPair {
    let system = format!(
        "You are an academic journal editor. Your task is to thoroughly understand the full content of the paper provided by the user and summarize it. When summarizing, rely solely on the information from the provided paper and avoid referencing external sources. Ensure that the summary accurately reflects the authors' arguments and claims. Write a detailed summary of approximately {max_summary_words} words.\n"
    );
    let user = format!(
        r###"Follow these steps to create a summary of the paper:
1. The full text of the paper is provided in the section titled "## Full content of paper." Carefully read and understand its content.
2. Create a detailed summary with approximately {max_summary_words} words, focusing on the following aspects:
    - Key findings
    - Methodology
    - Results
    - Future works or potential areas for improvement

## Full content of paper
{paper_content}
"###
    );
    PromptPair::new(system, user)
}
