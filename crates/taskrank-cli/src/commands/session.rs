//! Interactive staging session.
//!
//! Reads one command per line and drives the same controllers a browser
//! host would: the form, the bulk textarea, the staging list and the
//! analyze/suggest buttons.

use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use taskrank_core::{
    scoring_api, ActionKind, ActionOutcome, App, Config, SingleTaskForm, Strategy, Surface, Tab,
};

use crate::terminal::{TerminalSurface, TextRenderer};

const HELP: &str = "\
commands:
  add <title> [--due YYYY-MM-DD] [--hours H] [--importance I] [--deps 1,2]
  paste <file>         put a JSON file into the bulk textarea
  load                 import the bulk textarea into the staging list
  clear-bulk           empty the bulk textarea
  remove <id>          remove a staged task
  list                 show the staging list
  strategy <name>      default | fastest_wins | high_impact | deadline
  tab single|bulk      switch the intake tab
  analyze              score staged tasks plus the bulk textarea
  suggest              top three picks
  state                show the current view state
  help
  quit";

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Session {
    app: App,
    surface: Arc<TerminalSurface>,
    bulk: String,
}

/// Split a command line on whitespace, keeping quoted runs together.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for ch in line.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(ch);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".into());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Fill a form from `add` arguments. Bare words form the title.
fn parse_add(args: &[String]) -> Result<SingleTaskForm, String> {
    let mut form = SingleTaskForm::default();
    let mut title = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let field = match arg.as_str() {
            "--due" => &mut form.due_date,
            "--hours" => &mut form.estimated_hours,
            "--importance" => &mut form.importance,
            "--deps" => &mut form.dependencies,
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}")),
            word => {
                title.push(word.to_string());
                continue;
            }
        };
        *field = iter
            .next()
            .ok_or_else(|| format!("{arg} needs a value"))?
            .clone();
    }

    form.title = title.join(" ");
    Ok(form)
}

impl Session {
    fn new(config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        // Staging changes arrive through the bus and echo as they happen.
        let surface = Arc::new(TerminalSurface::new(true));
        let app = App::initialize(
            config,
            Arc::clone(&surface) as Arc<dyn Surface>,
            Arc::new(TextRenderer),
            scoring_api(config)?,
        );
        Ok(Self {
            app,
            surface,
            bulk: String::new(),
        })
    }

    async fn execute(&mut self, line: &str) -> Result<Flow, String> {
        let tokens = tokenize(line)?;
        let Some((command, args)) = tokens.split_first() else {
            return Ok(Flow::Continue);
        };
        tracing::debug!(%command, args = args.len(), "session command");

        match command.as_str() {
            "add" => {
                let mut form = parse_add(args)?;
                let id = self.app.intake().add_single(&mut form);
                println!("added {id}");
            }
            "paste" => {
                let path = args.first().ok_or("paste needs a file")?;
                self.bulk = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read {path}: {e}"))?;
                println!("bulk textarea: {} bytes", self.bulk.len());
            }
            "load" => {
                let count = self
                    .app
                    .intake()
                    .load_bulk(&mut self.bulk)
                    .map_err(|e| e.to_string())?;
                println!("loaded {count}");
            }
            "clear-bulk" => self.bulk.clear(),
            "remove" => {
                let raw = args.first().map(String::as_str);
                if !self.app.intake().handle_staging_click(raw) {
                    return Err("usage: remove <id>".into());
                }
            }
            "list" => {
                println!("staged: {}", self.app.store().len());
                println!("{}", self.surface.staging());
            }
            "strategy" => match args.first() {
                Some(name) => self.app.set_strategy(name.parse::<Strategy>()?),
                None => println!("{} ({})", self.app.strategy(), self.app.strategy().label()),
            },
            "tab" => {
                let tab = args
                    .first()
                    .ok_or("usage: tab single|bulk")?
                    .parse::<Tab>()?;
                self.app.select_tab(tab);
                println!("tab: {}", self.surface.tab().form_id());
            }
            "analyze" => self.submit(ActionKind::Analyze(self.app.strategy())).await?,
            "suggest" => self.submit(ActionKind::Suggest).await?,
            "state" => {
                println!("view: {}", self.app.ui().state());
                println!("staged: {}", self.app.store().len());
                println!("strategy: {}", self.app.strategy());
                println!("tab: {}", self.surface.tab().form_id());
                println!("bulk textarea: {} bytes", self.bulk.len());
            }
            "help" => println!("{HELP}"),
            "quit" | "exit" => return Ok(Flow::Quit),
            other => return Err(format!("unknown command '{other}' (try help)")),
        }
        Ok(Flow::Continue)
    }

    async fn submit(&self, kind: ActionKind) -> Result<(), String> {
        match self.app.actions().run(kind, &self.bulk).await {
            Ok(ActionOutcome::Superseded) => println!("(superseded)"),
            Ok(_) => {}
            Err(e) => return Err(e.to_string()),
        }
        Ok(())
    }

}

pub async fn run(offline: bool, mut config: Config) -> Result<(), Box<dyn std::error::Error>> {
    if offline {
        config.api.offline = true;
    }
    let mut session = Session::new(&config)?;
    let interactive = std::io::stdin().is_terminal();
    if interactive {
        println!(
            "taskrank session ({}). Type 'help' for commands.",
            session.app.actions().api_name()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("> ");
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match session.execute(&line).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(message) => eprintln!("error: {message}"),
        }
    }
    Ok(())
}
