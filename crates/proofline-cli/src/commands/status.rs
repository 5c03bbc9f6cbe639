//! Status command implementation.

use crate::cli::StatusArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Service;
use proofline_domain::traits::LlmProvider;
use proofline_domain::TaskId;

/// Execute the status command.
pub fn execute_status<L>(args: StatusArgs, service: &Service<L>, formatter: &Formatter) -> Result<()>
where
    L: LlmProvider + 'static,
{
    let task_id = TaskId::from_string(args.id.trim()).map_err(CliError::InvalidInput)?;
    let task = service.get_task(task_id)?;

    println!("{}", formatter.format_task(&task)?);
    Ok(())
}
