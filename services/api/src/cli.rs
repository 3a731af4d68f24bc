use clap::{Args, Parser, Subcommand};
use screening_ai::error::AppError;

use crate::demo::{run_screening_demo, ScreenArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "Candidate Screening Engine",
    about = "Run the candidate screening service or score a roster from the command line",
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
    /// Score a roster of candidates offline and print the ranking
    Screen(ScreenArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Screen(args) => run_screening_demo(args).await,
    }
}
