//! List command implementation.

use crate::cli::ListArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Service;
use proofline_domain::traits::{LlmProvider, TaskQuery};

/// Execute the list command.
pub fn execute_list<L>(args: ListArgs, service: &Service<L>, formatter: &Formatter) -> Result<()>
where
    L: LlmProvider + 'static,
{
    if args.limit == 0 {
        return Err(CliError::InvalidInput("Limit must be at least 1".to_string()));
    }

    let query = TaskQuery {
        status: args.status.map(Into::into),
        limit: Some(args.limit),
    };
    let tasks = service.list_tasks(&query)?;

    println!("{}", formatter.format_tasks(&tasks)?);
    Ok(())
}
