//! qlog CLI - encrypted quest log for tasks, goals and daily quests.

use std::path::Path;
use std::process;

use clap::Parser;
use questlog::cli::{Cli, Commands};
use questlog::commands::{self, CommandResult};
use questlog::config::{self, ConfigOverrides, OutputFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut overrides = ConfigOverrides::new();
    if let Some(dir) = &cli.data_dir {
        overrides = overrides.with_data_dir(dir);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }

    let resolved = match config::resolve_config(&overrides) {
        Ok(resolved) => resolved,
        Err(e) => fail(&e, cli.human_readable),
    };
    let human = resolved.output_format() == OutputFormat::Human;

    init_tracing(resolved.log_filter());
    tracing::debug!(
        data_dir = %resolved.data_dir().display(),
        source = %resolved.data_dir.source,
        "resolved data directory"
    );

    if let Err(e) = run_command(cli.command, resolved.data_dir(), human).await {
        fail(&e, human);
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_command(
    command: Commands,
    data_dir: &Path,
    human: bool,
) -> Result<(), questlog::Error> {
    match command {
        Commands::Status => output(&commands::status(data_dir)?, human),
        Commands::Init { auth } => output(&commands::init(data_dir, &auth.password).await?, human),
        Commands::Show { auth, full } => {
            output(&commands::show(data_dir, &auth.password, full).await?, human)
        }
        Commands::Dispatch { auth, action } => output(
            &commands::dispatch(data_dir, &auth.password, &action).await?,
            human,
        ),
        Commands::Quests { auth, response } => output(
            &commands::quests(data_dir, &auth.password, &response).await?,
            human,
        ),
        Commands::Rotate { auth, new_password } => output(
            &commands::rotate(data_dir, &auth.password, &new_password).await?,
            human,
        ),
        Commands::Export { auth, file } => output(
            &commands::export(data_dir, &auth.password, &file).await?,
            human,
        ),
        Commands::Import { file } => output(&commands::import(data_dir, &file)?, human),
    }
    Ok(())
}

/// Print output in JSON or human-readable format.
fn output<T: CommandResult>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}

fn fail(error: &questlog::Error, human: bool) -> ! {
    let message = if error.is_credential_failure() {
        "wrong password or corrupted data".to_string()
    } else {
        error.to_string()
    };
    if human {
        eprintln!("Error: {}", message);
    } else {
        eprintln!("{}", serde_json::json!({ "error": message }));
    }
    process::exit(1);
}
