//! The interactive picker: fetch whatever the configured tabs need, then
//! run the tabbed selector until the user commits or cancels.

use std::time::Duration;

use anyhow::{Context, Result, ensure};
use crossterm::event::{self, Event, KeyEventKind};

use crate::catalog::CatalogClient;
use crate::daemon::DaemonClient;
use crate::error::FlowError;
use crate::model::{CatalogModel, InstalledModel, ManageAction, RunningModel, Selection, Tab};
use crate::prompt;
use crate::theme::Theme;

mod draw;
mod list;
mod selector;

pub mod actions;

pub use selector::{DETAIL_PANE_MIN_WIDTH, Outcome, Selector};

/// Run one picker session over the configured tabs and return what was
/// picked. Not picking anything, for whatever reason, is an error
/// condition distinct from cancelling.
pub fn pick_model(
    daemon: &DaemonClient,
    catalog: &CatalogClient,
    tabs: &[Tab],
    approved: &[ManageAction],
    theme: &Theme,
) -> Result<Selection> {
    ensure!(!tabs.is_empty(), "no tabs configured");

    let installable = if tabs.contains(&Tab::Install) {
        fetch_catalog_models(catalog)?
    } else {
        Vec::new()
    };
    let installed = if tabs.contains(&Tab::Manage) {
        fetch_installed(daemon)?
    } else {
        Vec::new()
    };
    let running = if tabs.contains(&Tab::Monitor) {
        fetch_running(daemon)?
    } else {
        Vec::new()
    };

    let mut selector = Selector::new(
        tabs.to_vec(),
        approved.to_vec(),
        installable,
        installed,
        running,
    );

    let outcome = prompt::with_terminal(|terminal| {
        let size = terminal.size().context("terminal size")?;
        selector.handle_resize(size.width, size.height);

        loop {
            terminal
                .draw(|frame| draw::draw(frame, &selector, theme))
                .context("draw picker")?;

            if !event::poll(Duration::from_millis(50)).context("poll")? {
                continue;
            }
            match event::read().context("read event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(outcome) = selector.handle_key(key) {
                        return Ok(outcome);
                    }
                }
                Event::Resize(width, height) => selector.handle_resize(width, height),
                _ => {}
            }
        }
    })?;

    match outcome {
        Outcome::Cancelled => Err(FlowError::UserQuit.into()),
        Outcome::Committed(selection) => {
            if selection.model_name().is_none() {
                return Err(FlowError::NothingPicked.into());
            }
            Ok(selection)
        }
    }
}

fn fetch_catalog_models(catalog: &CatalogClient) -> Result<Vec<CatalogModel>> {
    let catalog = catalog.clone();
    prompt::run_with_spinner("Fetching available models...", move || {
        catalog.fetch_models()
    })?
}

fn fetch_installed(daemon: &DaemonClient) -> Result<Vec<InstalledModel>> {
    let daemon = daemon.clone();
    prompt::run_with_spinner("Fetching installed models...", move || {
        daemon.list_installed()
    })?
}

/// Monitoring is best-effort: a daemon that cannot report running models
/// degrades to an empty monitor list instead of aborting the session.
fn fetch_running(daemon: &DaemonClient) -> Result<Vec<RunningModel>> {
    let daemon = daemon.clone();
    let fetched =
        prompt::run_with_spinner("Fetching running models...", move || daemon.list_running())?;
    Ok(fetched.unwrap_or_default())
}
