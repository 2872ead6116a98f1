mod commands;
mod terminal;
mod vendors;

use commands::{CommandLine, Commands, arpscan, lookup};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();

    logging::init(cli.verbose, cli.json);

    match cli.command {
        Commands::Arpscan(args) => arpscan::arpscan(args, cli.json).await,
        Commands::Lookup(args) => lookup::lookup(args).await,
    }
}
