use crate::commands::{
    run_evaluate, run_export, run_import, run_reset, run_summary, EvaluateArgs, ExportArgs,
    ImportArgs, StoreArgs, SummaryArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use recruit_desk::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Recruit Desk",
    about = "Track recruiting pipelines and screen body composition from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Screen a set of measurements against the body-composition tables
    Evaluate(EvaluateArgs),
    /// Print the dashboard summary for the persisted desk
    Summary(SummaryArgs),
    /// Write the persisted desk as JSON
    Export(ExportArgs),
    /// Merge a JSON export into the persisted desk
    Import(ImportArgs),
    /// Discard persisted data and start over from seed data
    Reset(StoreArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured data directory
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
        Command::Summary(args) => run_summary(args),
        Command::Export(args) => run_export(args),
        Command::Import(args) => run_import(args),
        Command::Reset(args) => run_reset(args),
    }
}
