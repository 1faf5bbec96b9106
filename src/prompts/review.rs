//! 评审提示

use super::PromptPair;

const SYSTEM: &str = r###"You are an expert in quantum physics and quantum machine learning, specializing in quantum feature map design.

# Task
Your task is to review past ideas on quantum feature maps and their evaluation results, and propose improvements to enhance accuracy through continuous refinement. Restrict your review to the quantum feature map design itself; do not propose changes to the overall model, evaluation metrics, or other workflows.

# Quantum Feature Map Definition
Quantum feature maps (Φ(x)) will be used to compute the quantum kernel K(x, x') = |⟨Φ(x)|Φ(x')⟩|^2 for a QSVM (Quantum Support Vector Machine).
1. **Design Considerations**:
    - Define combinations of quantum gates.
    - Define an entanglement pattern for the features.
    - Specify the method for embedding input data and quantum states as rotation angles of quantum gates.
    - Ensure the 80-dimensional input data is utilized effectively, minimizing any loss of information.
        - Avoid excessive feature compression that may lead to information loss (e.g., simple feature averaging, summing, etc.).
2. **Restrictions on Encoding and Embedding**:
    - Only **linear functions** are allowed for encoding and embedding.
    - All parameters in the encoding and embedding must be **non-trainable**.

# Output Format
1. Keep Points:
    - Identify factors that contributed to improved accuracy.
    - Analyze the most accurate idea in detail.
    - Review multiple ideas to identify common elements that contributed to improving accuracy.
2. Suggestions:
    - Limit the number of suggestions to {max_suggestion_num} or fewer.
    - Ensure each suggestion includes only a single proposal.
    - Prioritize the most impactful suggestions.
    - If no suggestions for improvement are identified, return suggestions: ["COMPLETED"].
3. Output Schema: {
    "keep_points": ["point 1", "point 2", ..., "point n"],
    "suggestions": ["suggestion 1", "suggestion 2", ..., "suggestion n"]
    }.

# Notes
- Input Data: The input data, originally represented as 784-dimensional image data, has been compressed to 80 dimensions using PCA and each value normalized to the range [0.0, 1.0]
- Simulation: Use an ideal quantum simulator without noise for evaluation
- Evaluation Metric: Classification accuracy is the primary metric. The goal is to achieve the highest possible accuracy.
"###;

/// 性能评审文本（若有）置于用户提示最前
pub fn review_prompt(
    max_suggestion_num: usize,
    last_trial_num: usize,
    last_trial_results: &str,
    performance_review: Option<&str>,
) -> PromptPair {
    let system = SYSTEM.replace("{max_suggestion_num}", &max_suggestion_num.to_string());
    let last_trial_results = last_trial_results.trim();
    let body = format!(
        r###"The previous idea and experimental results are provided below in the "# Previous Trial Idea and Results" section. These reflect iterative adjustments based on past trial review comments.

Review the trial results to design a quantum feature map for a more accurate QSVM. Identify the factors that contributed to accuracy improvement and areas for further enhancement. Finally, check whether the review results comply with the design rules for the quantum feature map.

# Previous Trial Idea and Results (Trial Number: {last_trial_num})
{last_trial_results}
"###
    );
    let user = match performance_review {
        Some(review) => format!("{}\n{}", review, body),
        None => body,
    };
    PromptPair::new(system, user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_prompt() {
        let p = review_prompt(3, 4, "\n results \n", None);
        assert!(p.system.contains("Limit the number of suggestions to 3 or fewer."));
        assert!(p.system.contains("\"keep_points\""));
        assert!(p.user.ends_with("(Trial Number: 4)\nresults\n"));

        let p = review_prompt(3, 4, "results", Some("In the previous trial, ..."));
        assert!(p.user.starts_with("In the previous trial, ...\n"));
    }
}
