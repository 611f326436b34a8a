use clap::Parser;
use tallybridge::cli::{self, CheckCommand, Cli, Commands};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let log_level = cli.log_level.as_deref();

    let result = match &cli.command {
        Commands::Check(CheckCommand::Config(args)) => cli::check::execute_config(&args.config),
        Commands::Check(CheckCommand::Connection(args)) => {
            cli::check::execute_connection(&args.config, log_level).await
        }
        Commands::Discover(args) => cli::discover::execute(&args.config, log_level).await,
        Commands::Fetch(args) => cli::fetch::execute(args, log_level).await,
        Commands::Post(args) => cli::post::execute(args, log_level).await,
    };

    if let Err(e) = result {
        cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
