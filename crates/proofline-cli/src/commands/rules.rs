//! Rules command implementation.

use crate::cli::RulesArgs;
use crate::error::Result;
use crate::output::Formatter;
use proofline_corrector::{PromptBuilder, RuleSet};

/// Execute the rules command.
pub fn execute_rules(args: RulesArgs, rules: &RuleSet, formatter: &Formatter) -> Result<()> {
    let output = if args.prompt {
        formatter.text_block("prompt", &PromptBuilder::new(rules).build())?
    } else {
        formatter.text_block("rules", rules.text())?
    };

    println!("{}", output);
    Ok(())
}
