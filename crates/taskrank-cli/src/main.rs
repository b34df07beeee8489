use clap::{CommandFactory, Parser, Subcommand};
use taskrank_core::Config;

mod commands;
mod logging;
mod terminal;

#[derive(Parser)]
#[command(name = "taskrank", version, about = "Taskrank CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and order the tasks in a JSON file
    Analyze(commands::analyze::AnalyzeArgs),
    /// Show the top three tasks from a JSON file
    Suggest(commands::analyze::SuggestArgs),
    /// Stage tasks interactively, then analyze or suggest
    Session {
        /// Score locally instead of calling the service
        #[arg(long)]
        offline: bool,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default().with_env_overrides();
    logging::init(&config.logging);

    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::run_analyze(args, config).await,
        Commands::Suggest(args) => commands::analyze::run_suggest(args, config).await,
        Commands::Session { offline } => commands::session::run(offline, config).await,
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "taskrank", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
