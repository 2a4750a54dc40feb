//! One conversation turn
//!
//! Shared by the one-shot path and the interactive loop: build the
//! prompt, call the model, print the completion, and - only when
//! execution was requested - extract and run suggested commands.

use crate::output;
use grassai_common::exec::{CommandRunner, ExecutionReport};
use grassai_common::extract::{CommandExtractor, SuggestedCommand};
use grassai_common::grass::EnvironmentSnapshot;
use grassai_common::ollama::OllamaClient;
use grassai_common::prompt;
use grassai_common::session::Session;
use grassai_common::Result;
use std::time::Duration;

/// Everything a turn needs besides the query itself
pub struct TurnContext {
    pub client: OllamaClient,
    pub model: String,
    pub execute: bool,
    pub stop_on_failure: bool,
    pub command_timeout: Duration,
}

/// Outcome of one completed turn
pub struct TurnResult {
    pub response: String,
    pub report: Option<ExecutionReport>,
}

/// Run one turn: prompt -> inference -> print -> optional execution.
///
/// The caller decides what to do with a failed command (one-shot exits
/// non-zero, the REPL keeps going), so execution failures are reported
/// in TurnResult rather than raised here.
pub async fn run_turn(
    ctx: &TurnContext,
    snapshot: &EnvironmentSnapshot,
    session: &Session,
    query: &str,
) -> Result<TurnResult> {
    let full_prompt = prompt::build_prompt(snapshot, session, query);

    let spinner = output::Spinner::new("thinking...");
    let generated = ctx.client.generate(&ctx.model, &full_prompt).await;
    let elapsed = spinner.stop();

    let response = generated?.response;
    output::print_response(&response, elapsed);

    let commands = commands_to_run(ctx.execute, &response);
    if !ctx.execute {
        return Ok(TurnResult {
            response,
            report: None,
        });
    }

    if commands.is_empty() {
        output::info("No executable commands found in response");
        return Ok(TurnResult {
            response,
            report: None,
        });
    }

    output::info(&format!("Executing {} suggested command(s):", commands.len()));
    let runner = CommandRunner::new(ctx.stop_on_failure, ctx.command_timeout);
    let report = runner.run_all(&commands).await;
    output::print_execution_report(&report);

    Ok(TurnResult {
        response,
        report: Some(report),
    })
}

/// The execution gate: with the flag off, nothing is even extracted,
/// so no subprocess can be spawned regardless of response content.
fn commands_to_run(execute: bool, response: &str) -> Vec<SuggestedCommand> {
    if !execute {
        return Vec::new();
    }
    CommandExtractor::new().extract(response)
}
