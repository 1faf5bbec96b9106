//! 评分提示
//!
//! 系统提示 = 评审准则 + 基准示例 + 累积的评分历史；用户提示按轮次分三种：
//! 首轮给出想法与相关文献，中间轮只补充文献，最后一轮禁止再要求补充信息。

use super::few_shots::SCORING_FEW_SHOTS;
use super::{PromptPair, NOT_PROVIDED_INFORMATION};

const SYSTEM: &str = r###"As a reviewer for a scientific journal, you are tasked with evaluating new scientific ideas from multiple perspectives while adhering to specific evaluation criteria. Your evaluation should be thorough, objective, and based on the guidelines provided below.

# Evaluation Criteria
Each criterion is scored on a scale of 0.0 to 10.0, in increments of 0.1, where 0.0 represents the lowest score and 10.0 represents the highest score:
- Originality: Assess how the idea differs from existing research. Does it make a novel contribution?
- Feasibility: Evaluate the practicality of implementing the idea.
- Versatility: Consider how broadly the idea can be applied.

# Steps for Evaluation
1. Understand the Idea:
    - Carefully read and comprehend the proposed idea.
    - Organize the information needed to make a well-informed evaluation.
2. Assess Information Sufficiency:
    - First, confirm the round number provided by the user. If it is the final round, skip Step 2 and proceed to Step 3.
    - Otherwise, assess whether the "# Related Work" section provides sufficient information to evaluate the idea.
    - If the related work information is "{not_provided_information}", skip Step 2 and proceed to Step 3.
    - If the information is insufficient for scoring, <is_lack_information> tag set to True, and list up to 5 necessary information key sentences as a comma-separated list within <additional_key_sentences> tags. The search will be conducted by embedded vector for academic paper; therefore, ensure the <additional_key_sentences> are specific and relevant. Each sentence length should be between 50 to 100 words. In this case, terminate the scoring process and set all scores to 0.0.
    - If the information is sufficient, proceed to Step 3.
3. Provide Reasoning:
    - Proceed to evaluate the idea based on the specified criteria.
    - If the related work information is "{not_provided_information}", use your own knowledge to evaluate the idea. DO NOT request additional information and <is_lack_information> tag set to False.
    - Enclose the rationale behind the evaluation results of each indicator in <reason> tags and explain it in text.
4. Assign Scores:
    - Based on the evaluation results and their rationale, assign a score to each indicator.
5. Terminating the Evaluation:
    - Once all scores and reasoning have been assigned, the evaluation is complete. <is_lack_information> tag set to False.

# Baseline
{few_shot_examples}
"###;

pub fn scoring_prompt(
    score_histories: &str,
    idea: &str,
    related_work: &str,
    round: usize,
    max_round: usize,
) -> PromptPair {
    let system = SYSTEM
        .replace("{not_provided_information}", NOT_PROVIDED_INFORMATION)
        .replace("{few_shot_examples}", SCORING_FEW_SHOTS.trim_matches('\n'))
        + score_histories;

    let user = if round == 1 {
        format!(
            r###"Round {round}/{max_round}.

You are tasked with evaluating the following "# Proposed Idea" using the specified criteria and providing scores for each criterion. The idea represents a newly proposed quantum feature map for the quantum kernel method. Your evaluation and scoring should consider multiple perspectives and adhere to the strictest possible standards. Finally, after all the scores have been assigned, summarize the rationale for each score.

# Proposed Idea
{idea}

# Related Work
{related_work}
"###
        )
    } else if round == max_round {
        format!(
            r###"Round {round}/{max_round} (Final Round).

Additional Related Work has been provided for further context.

This marks the final opportunity to request additional information. Based on the provided details, conduct a comprehensive evaluation and ensure scores are assigned to each criterion without exception.
This round DOES NOT return "is_lack_information"=True. You must provide scores for each criterion.

# Related Work
{related_work}
"###
        )
    } else {
        format!(
            r###"Round {round}/{max_round}.

Additional Related Work has been provided for further context. Please evaluate the proposed idea using the specified criteria and provide scores for each criterion.

# Related Work
{related_work}
"###
        )
    };
    PromptPair::new(system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_variants() {
        let first = scoring_prompt("", "idea text", "papers", 1, 3);
        assert!(first.user.contains("# Proposed Idea\nidea text\n\n# Related Work\npapers"));

        let middle = scoring_prompt("", "idea text", "more papers", 2, 3);
        assert!(middle.user.starts_with("Round 2/3.\n"));
        assert!(middle.user.contains("Additional Related Work"));
        assert!(!middle.user.contains("idea text"));

        let last = scoring_prompt("", "idea text", "final papers", 3, 3);
        assert!(last.user.starts_with("Round 3/3 (Final Round)."));
        assert!(last.user.contains("DOES NOT return \"is_lack_information\"=True"));
    }

    #[test]
    fn test_system_includes_baseline_and_histories() {
        let p = scoring_prompt("\n\n- My Map:\n    - scores: ...", "i", "r", 1, 3);
        assert!(p.system.contains("- ZZFeatureMap:"));
        assert!(p.system.contains(NOT_PROVIDED_INFORMATION));
        assert!(p.system.ends_with("- My Map:\n    - scores: ..."));
    }
}
