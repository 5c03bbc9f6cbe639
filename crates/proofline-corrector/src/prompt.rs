//! System prompt for proofreading requests

use crate::rules::RuleSet;

const PREAMBLE: &str = "You will receive a passage of text. Proofread it rigorously according to the following rules:";

const OUTPUT_FORMAT: &str = r#"When you are done, reply in exactly this format:
- If corrections are needed: [{"original": "text as written", "corrected": "corrected text", "reason": "short explanation"}]
- If no correction is needed: []

Each "original" must be copied verbatim from the passage so it can be located.

While following the rules above, never:
- add explanations outside the JSON
- use markdown in the reply
- put any other text before or after the JSON"#;

/// Builds the system prompt from a rule set
///
/// The unit text itself is sent as the user message.
pub struct PromptBuilder<'a> {
    rules: &'a RuleSet,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Build the complete system prompt
    pub fn build(&self) -> String {
        let mut prompt = String::with_capacity(PREAMBLE.len() + self.rules.text().len() + OUTPUT_FORMAT.len() + 4);
        prompt.push_str(PREAMBLE);
        prompt.push_str("\n\n");
        prompt.push_str(self.rules.text());
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT);
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_rules_and_contract() {
        let rules = RuleSet::new("1. Prefer the Oxford comma").unwrap();
        let prompt = PromptBuilder::new(&rules).build();

        assert!(prompt.starts_with(PREAMBLE));
        assert!(prompt.contains("1. Prefer the Oxford comma"));
        assert!(prompt.contains(r#""original""#));
        assert!(prompt.contains("reply in exactly this format"));
        assert!(prompt.trim_end().ends_with("after the JSON"));
    }
}
