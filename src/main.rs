use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::style::Stylize;

use modelman::catalog::{CatalogClient, DEFAULT_CATALOG_URL};
use modelman::daemon::DaemonClient;
use modelman::error::flow_error;
use modelman::model::{ManageAction, RunningChoice, Tab};
use modelman::operation;
use modelman::picker::{self, actions};
use modelman::theme::Theme;

/// Manage locally hosted language models from the terminal: browse and
/// install from the remote catalog, inspect what is on disk, and control
/// what stays loaded in memory.
#[derive(Debug, Parser)]
#[command(name = "modelman", version)]
struct Cli {
    /// Base URL of the model-runner daemon.
    #[arg(long, default_value = "http://localhost:11434")]
    base_url: String,

    /// Base URL of the remote model catalog.
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Picker tabs for this session, in order.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = vec![Tab::Install, Tab::Manage, Tab::Monitor]
    )]
    tabs: Vec<Tab>,

    /// Manage actions approved for this session.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = vec![ManageAction::Update, ManageAction::Delete, ManageAction::Chat]
    )]
    actions: Vec<ManageAction>,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("{} {:#}", " ERROR ".white().on_red().bold(), err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let theme = Theme::default();
    let daemon = DaemonClient::new(&cli.base_url)?;
    let catalog = CatalogClient::new(&cli.catalog_url)?;

    daemon.ping()?;

    loop {
        // A cancelled session is quiet but not terminal; the repeat prompt
        // runs after every session outcome.
        match SessionReport::from(run_session(&daemon, &catalog, cli, &theme)) {
            SessionReport::Done(report) => {
                println!("{} {}", " SUCCESS ".white().on_magenta().bold(), report);
            }
            SessionReport::Silent => {}
            SessionReport::Cancelled => println!("No action performed."),
            SessionReport::Failed(err) => {
                eprintln!("{} {:#}", " ERROR ".white().on_red().bold(), err);
            }
        }

        if !another_round()? {
            println!("See you later!");
            return Ok(());
        }
    }
}

/// How one session's outcome is announced. Cancellations get a quiet line
/// instead of the error banner; only real failures render one.
enum SessionReport {
    Done(String),
    Silent,
    Cancelled,
    Failed(anyhow::Error),
}

impl From<Result<Option<String>>> for SessionReport {
    fn from(outcome: Result<Option<String>>) -> Self {
        match outcome {
            Ok(Some(report)) => SessionReport::Done(report),
            Ok(None) => SessionReport::Silent,
            Err(err) => {
                if flow_error(&err).is_some_and(|f| f.is_cancellation()) {
                    SessionReport::Cancelled
                } else {
                    SessionReport::Failed(err)
                }
            }
        }
    }
}

/// One full pick-resolve-execute pass. `None` means the session completed
/// without performing anything worth announcing.
fn run_session(
    daemon: &DaemonClient,
    catalog: &CatalogClient,
    cli: &Cli,
    theme: &Theme,
) -> Result<Option<String>> {
    let selection = picker::pick_model(daemon, catalog, &cli.tabs, &cli.actions, theme)?;
    let name = selection
        .model_name()
        .context("selection carries no model")?
        .to_string();

    match selection.action {
        Some(Tab::Install) => {
            let target = actions::resolve_install_target(catalog, &name, theme)?;
            operation::run_pull(daemon, &target, theme)?;
            Ok(Some(report("install", &target)))
        }
        Some(Tab::Manage) => {
            let action = actions::resolve_manage_action(&selection, theme)?;
            match action {
                ManageAction::Update => operation::run_pull(daemon, &name, theme)?,
                ManageAction::Delete => operation::run_delete(daemon, &name)?,
                // Chat warms the model up and keeps it resident so the
                // first prompt elsewhere responds immediately.
                ManageAction::Chat => daemon
                    .keep_alive(&name, -1)
                    .with_context(|| format!("warm up {name}"))?,
            }
            Ok(Some(report(&action.label().to_lowercase(), &name)))
        }
        Some(Tab::Monitor) => match operation::run_monitor(daemon, &name, theme)? {
            RunningChoice::KeepLoaded => Ok(Some(report("keep-alive", &name))),
            RunningChoice::Free => Ok(Some(report("unload", &name))),
            RunningChoice::Nothing => Ok(None),
        },
        None => Ok(None),
    }
}

fn report(action: &str, model: &str) -> String {
    format!("Performed action {action} on model {model} successfully!")
}

fn another_round() -> Result<bool> {
    print!("Perform another action? [y/N] ");
    io::stdout().flush().context("flush prompt")?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("read answer")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelman::error::FlowError;

    #[test]
    fn cancellations_are_quiet_but_not_failures() {
        let declined = SessionReport::from(Err(FlowError::Declined.into()));
        assert!(matches!(declined, SessionReport::Cancelled));

        let quit = SessionReport::from(Err(FlowError::UserQuit.into()));
        assert!(matches!(quit, SessionReport::Cancelled));
    }

    #[test]
    fn real_failures_keep_the_banner() {
        let failed = SessionReport::from(Err(anyhow::anyhow!("daemon fell over")));
        assert!(matches!(failed, SessionReport::Failed(_)));

        let not_found =
            SessionReport::from(Err(FlowError::ModelNotFound("llama3".into()).into()));
        assert!(matches!(not_found, SessionReport::Failed(_)));
    }

    #[test]
    fn monitor_no_op_announces_nothing() {
        assert!(matches!(
            SessionReport::from(Ok(None)),
            SessionReport::Silent
        ));
        assert!(matches!(
            SessionReport::from(Ok(Some("done".into()))),
            SessionReport::Done(_)
        ));
    }
}
