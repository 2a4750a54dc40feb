//! grassai - AI assistant for GRASS GIS
//!
//! Forwards a natural-language question to a locally running Ollama
//! service, with the live GRASS session context folded into the prompt,
//! and optionally executes the commands the model suggests.

mod ask;
mod output;
mod repl;

use ask::TurnContext;
use clap::Parser;
use grassai_common::config::Config;
use grassai_common::grass;
use grassai_common::ollama::OllamaClient;
use grassai_common::prompt::validate_query;
use grassai_common::session::{Session, SessionStore};
use grassai_common::{GrassAiError, Result};
use std::time::Duration;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "grassai")]
#[command(about = "AI assistant for GRASS GIS with module knowledge", long_about = None)]
#[command(version)]
struct Cli {
    /// Question or task for the assistant
    query: Option<String>,

    /// Ollama model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama service URL
    #[arg(short, long)]
    url: Option<String>,

    /// Continue (or create) a named session
    #[arg(long)]
    session: Option<String>,

    /// Execute suggested GRASS/GDAL commands automatically
    #[arg(short, long)]
    execute: bool,

    /// Interactive mode (stay in the assistant session)
    #[arg(short, long)]
    interactive: bool,

    /// Show GRASS environment information and exit
    #[arg(short = 's', long = "system-info")]
    system_info: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keep normal output clean; -v surfaces the debug trail
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if let Err(e) = run(cli).await {
        output::print_error(&e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Everything needs an active GRASS session, including -s
    if !grass::in_grass_session() {
        return Err(GrassAiError::NotInGrassSession);
    }

    let config = Config::load();
    let timeout_ms = config.ollama.effective_timeout_secs() * 1000;
    let url = cli.url.unwrap_or(config.ollama.url);
    let model = cli.model.unwrap_or(config.ollama.model);

    if cli.system_info {
        let snapshot = grass::probe()?;
        output::print_system_info(&snapshot);
        return Ok(());
    }

    // Validate the query before touching the network
    let query = match (&cli.query, cli.interactive) {
        (Some(q), _) => Some(validate_query(q)?.to_string()),
        (None, true) => None,
        (None, false) => return Err(GrassAiError::EmptyQuery),
    };

    let client = OllamaClient::with_url(&url).with_timeout(timeout_ms);

    // Preflight: a dead service or missing model is reported before any
    // prompt is sent
    client.list_models().await?;
    if !client.has_model(&model).await? {
        return Err(GrassAiError::ModelNotFound(model));
    }

    let snapshot = grass::probe()?;
    tracing::debug!(
        "Probed session: {}/{}/{}",
        snapshot.database,
        snapshot.location,
        snapshot.mapset
    );

    // Named sessions persist; unnamed one-shot conversations do not
    let store = if cli.session.is_some() || cli.interactive {
        SessionStore::open_default()
    } else {
        None
    };
    let session = match (&cli.session, &store) {
        (Some(id), Some(store)) => store
            .load(id)?
            .unwrap_or_else(|| Session::new(Some(id.clone()))),
        (Some(id), None) => Session::new(Some(id.clone())),
        (None, _) => Session::new(None),
    };

    let ctx = TurnContext {
        client,
        model,
        execute: cli.execute,
        stop_on_failure: config.execute.stop_on_failure,
        command_timeout: Duration::from_secs(config.execute.command_timeout_secs),
    };

    if cli.interactive {
        let mut session = session;
        if let Some(q) = query {
            // A query given alongside -i becomes the first turn
            output::print_question(&q);
            let turn = ask::run_turn(&ctx, &snapshot, &session, &q).await?;
            session.push_turn(&q, &turn.response);
            if let Some(store) = &store {
                store.save(&session)?;
            }
        }
        return repl::run(&ctx, &snapshot, session, store).await;
    }

    let Some(query) = query else {
        return Err(GrassAiError::EmptyQuery);
    };
    let mut session = session;
    let turn = ask::run_turn(&ctx, &snapshot, &session, &query).await?;
    session.push_turn(&query, &turn.response);
    if cli.session.is_some() {
        if let Some(store) = &store {
            store.save(&session)?;
        }
    }

    // In execute mode the exit status mirrors the last executed command
    if let Some(report) = turn.report {
        report.into_result()?;
    }

    Ok(())
}
