//! Interactive session loop
//!
//! Read one line, close on the sentinel, otherwise run a full turn and
//! fold it into the session. Errors inside a turn are printed and the
//! loop continues; only EOF, Ctrl-C or the close command end it.

use crate::ask::{run_turn, TurnContext};
use crate::output;
use grassai_common::grass::EnvironmentSnapshot;
use grassai_common::session::{is_close_command, Session, SessionStore};
use grassai_common::Result;
use std::io::{self, BufRead};

pub async fn run(
    ctx: &TurnContext,
    snapshot: &EnvironmentSnapshot,
    mut session: Session,
    store: Option<SessionStore>,
) -> Result<()> {
    output::print_repl_welcome(&ctx.model);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        output::print_prompt();

        let input = match lines.next() {
            Some(Ok(line)) => line.trim().to_string(),
            Some(Err(e)) => {
                output::warning(&format!("Error reading input: {e}"));
                continue;
            }
            None => break, // EOF
        };

        if input.is_empty() {
            continue;
        }

        // Sentinel closes the loop with no final inference request
        if is_close_command(&input) {
            output::info("Returning to the GRASS shell.");
            break;
        }

        match run_turn(ctx, snapshot, &session, &input).await {
            Ok(turn) => {
                session.push_turn(&input, &turn.response);
                if let Some(store) = &store {
                    if let Err(e) = store.save(&session) {
                        output::warning(&format!("Could not save session: {e}"));
                    }
                }
            }
            Err(e) => {
                // Interactive mode survives a bad turn
                output::print_error(&e);
            }
        }
    }

    Ok(())
}
