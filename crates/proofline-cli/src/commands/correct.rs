//! Correct command implementation.

use crate::cli::CorrectArgs;
use crate::config::OutputFormat;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::Service;
use proofline_corrector::DocumentUpload;
use proofline_domain::traits::LlmProvider;
use proofline_domain::{Task, TaskStatus};

/// Execute the correct command.
///
/// Submits the file, follows its progress until the task finishes and
/// prints the result. Ctrl-C cancels the task; units already in flight are
/// still recorded.
pub async fn execute_correct<L>(args: CorrectArgs, service: &Service<L>, formatter: &Formatter) -> Result<()>
where
    L: LlmProvider + 'static,
{
    let task = run_correction(&args, service, formatter).await?;

    println!("{}", formatter.format_task(&task)?);

    if task.status == TaskStatus::Failed {
        return Err(CliError::TaskFailed(task.error.unwrap_or_default()));
    }
    Ok(())
}

async fn run_correction<L>(args: &CorrectArgs, service: &Service<L>, formatter: &Formatter) -> Result<Task>
where
    L: LlmProvider + 'static,
{
    let filename = args
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| CliError::InvalidInput(format!("Not a file: {}", args.file.display())))?
        .to_string();
    let bytes = tokio::fs::read(&args.file).await?;

    let mut config = service.config().clone();
    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }

    let task_id = service.submit_document_with(DocumentUpload::new(filename, bytes), service.rule_set(), config)?;
    let mut events = service.subscribe_task(task_id)?;

    if formatter.format() == OutputFormat::Table {
        eprintln!("{}", formatter.info(&format!("Task {}", task_id)));
    }

    let mut cancelled = false;
    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => {
                    if args.no_progress {
                        continue;
                    }
                    match formatter.format() {
                        OutputFormat::Table => eprintln!("{}", formatter.progress_line(&event)),
                        OutputFormat::Json => eprintln!("{}", event.to_json()?),
                        OutputFormat::Quiet => {}
                    }
                }
                None => break,
            },
            signal = tokio::signal::ctrl_c(), if !cancelled => {
                signal?;
                cancelled = true;
                if service.cancel(task_id) {
                    eprintln!("{}", formatter.warning("Cancelling, waiting for units in flight"));
                }
            }
        }
    }

    Ok(service.wait(task_id).await?)
}
