mod cmd;

use clap::Parser;
use cmd::config::{Effective, RunArgs};

#[derive(Parser)]
#[command(name = "elastic-log-event", about = "Периодическая публикация структурированных log-событий в Kafka")]
struct Cli {
    #[command(flatten)]
    args: RunArgs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging level lives in the config file, so config errors go to stderr.
    let eff = match Effective::new(&cli.args) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    cmd::logging::init(&eff.logging);

    if let Err(e) = cmd::run::run(eff).await {
        tracing::error!(error = %e, "fatal");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
