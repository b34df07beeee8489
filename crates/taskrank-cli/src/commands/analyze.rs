use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use taskrank_core::{scoring_api, ActionKind, ActionOutcome, App, Config, Renderer, Strategy};

use crate::terminal::{JsonRenderer, TerminalSurface, TextRenderer};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// JSON file holding an array of tasks
    #[arg(long, short)]
    pub file: PathBuf,
    /// Scoring strategy (default, fastest_wins, high_impact, deadline)
    #[arg(long, short)]
    pub strategy: Option<Strategy>,
    /// Score locally instead of calling the service
    #[arg(long)]
    pub offline: bool,
    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct SuggestArgs {
    /// JSON file holding an array of tasks
    #[arg(long, short)]
    pub file: PathBuf,
    /// Score locally instead of calling the service
    #[arg(long)]
    pub offline: bool,
    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_analyze(
    args: AnalyzeArgs,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let strategy = args.strategy.unwrap_or(config.ui.default_strategy);
    submit(
        ActionKind::Analyze(strategy),
        &args.file,
        args.offline,
        args.json,
        config,
    )
    .await
}

pub async fn run_suggest(
    args: SuggestArgs,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    submit(ActionKind::Suggest, &args.file, args.offline, args.json, config).await
}

/// The file content plays the part of the bulk textarea: it is sent as-is
/// after the (empty) staging list.
async fn submit(
    kind: ActionKind,
    file: &Path,
    offline: bool,
    json: bool,
    mut config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| format!("cannot read {}: {e}", file.display()))?;

    if offline {
        config.api.offline = true;
    }
    let renderer: Arc<dyn Renderer> = if json {
        Arc::new(JsonRenderer)
    } else {
        Arc::new(TextRenderer)
    };

    let app = App::initialize(
        &config,
        Arc::new(TerminalSurface::new(false)),
        renderer,
        scoring_api(&config)?,
    );

    tracing::debug!(file = %file.display(), api = app.actions().api_name(), %kind, "submitting file");
    match app.actions().run(kind, &text).await? {
        ActionOutcome::Completed { .. } => Ok(()),
        // The surface already printed the message.
        ActionOutcome::Failed { .. } => std::process::exit(1),
        ActionOutcome::Superseded => Err("request superseded".into()),
    }
}
