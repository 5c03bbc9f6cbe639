//! Recover command implementation.

use crate::error::Result;
use crate::output::Formatter;
use crate::Service;
use proofline_domain::traits::LlmProvider;

/// Execute the recover command.
///
/// Only run this when no other `proofline correct` is using the same
/// database; its tasks would be marked as failed too.
pub fn execute_recover<L>(service: &Service<L>, formatter: &Formatter) -> Result<()>
where
    L: LlmProvider + 'static,
{
    let recovered = service.recover_interrupted()?;
    println!("{}", formatter.recovered(&recovered)?);
    Ok(())
}
