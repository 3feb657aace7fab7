//! Executes the resolved selection against the daemon: streaming pulls with
//! progress rendering, deletes, and running-model keep-alive control.

use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Gauge, Paragraph, Widget};
use ratatui::{Terminal, TerminalOptions, Viewport};

use crate::daemon::{DaemonClient, PullEvent};
use crate::error::FlowError;
use crate::model::{ProgressUpdate, RunningChoice};
use crate::prompt::{self, Spinner};
use crate::theme::Theme;

/// How long the final "Success!" frame stays visible before the renderer
/// terminates.
const FINAL_PAUSE: Duration = Duration::from_millis(750);

/// Result of applying one stream record to the progress state.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Applied {
    /// The status token changed; the spinner should reseed.
    pub status_changed: bool,
    /// A phase ended; this label goes to the scrollback as a "✓" line.
    pub completed_line: Option<String>,
}

/// The spinner-and-bar state machine fed by the pull stream.
#[derive(Debug, Default)]
pub struct PullProgress {
    label: String,
    raw_status: String,
    downloading: bool,
    fraction: f64,
    finished: bool,
}

fn label_for(status: &str) -> String {
    match status {
        "pulling manifest" => "Pulling manifest...".to_string(),
        "verifying sha256 digest" => "Verifying sha256 digest...".to_string(),
        "writing manifest" => "Writing manifest...".to_string(),
        "removing any unused layers" => "Removing any unused layers...".to_string(),
        "success" => "Success!".to_string(),
        other => format!("Downloading... ({other})"),
    }
}

impl PullProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, update: &ProgressUpdate) -> Applied {
        let mut applied = Applied::default();

        if self.raw_status != update.status {
            applied.status_changed = true;
            if !self.label.is_empty() {
                applied.completed_line = Some(self.label.clone());
            }
            self.label = label_for(&update.status);
            if update.is_success() {
                self.finished = true;
            }
        }

        self.downloading = update.total != 0;
        self.raw_status = update.status.clone();
        if update.total != 0 {
            self.fraction = update.completed as f64 / update.total as f64;
        }

        applied
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Pull (or update) a model, rendering streamed progress inline until the
/// daemon reports success, the stream fails, or the user quits.
pub fn run_pull(daemon: &DaemonClient, name: &str, theme: &Theme) -> Result<()> {
    let events = daemon.start_pull(name);

    enable_raw_mode().context("enable raw mode")?;
    let backend = CrosstermBackend::new(io::stdout());
    let res = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(4),
        },
    )
    .context("create inline terminal")
    .and_then(|mut terminal| {
        let res = pull_loop(&mut terminal, &events, theme);
        terminal.clear().ok();
        terminal.show_cursor().ok();
        res
    });
    disable_raw_mode().ok();
    res
}

fn pull_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    events: &Receiver<PullEvent>,
    theme: &Theme,
) -> Result<()> {
    let mut progress = PullProgress::new();
    let mut spinner = Spinner::new();

    loop {
        loop {
            match events.try_recv() {
                Ok(PullEvent::Progress(update)) => {
                    let applied = progress.apply(&update);
                    if let Some(line) = applied.completed_line {
                        let theme = *theme;
                        terminal
                            .insert_before(1, move |buf| {
                                Paragraph::new(Line::from(vec![
                                    Span::styled("  ✓ ", theme.success),
                                    Span::raw(line),
                                ]))
                                .render(buf.area, buf);
                            })
                            .context("scrollback line")?;
                    }
                    if applied.status_changed {
                        spinner.reseed();
                    }
                }
                Ok(PullEvent::Failed(msg)) => {
                    return Err(anyhow::anyhow!(msg)).context("pull failed");
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !progress.is_finished() {
                        anyhow::bail!("pull stream closed unexpectedly");
                    }
                    break;
                }
            }
        }

        terminal
            .draw(|frame| draw_progress(frame, &progress, &spinner, theme))
            .context("draw progress")?;

        if progress.is_finished() {
            std::thread::sleep(FINAL_PAUSE);
            return Ok(());
        }

        if event::poll(Duration::from_millis(80)).context("poll")? {
            if let Event::Key(key) = event::read().context("read event")? {
                if key.kind == KeyEventKind::Press && prompt::is_quit_key(&key) {
                    // The pull thread keeps running server-side; its
                    // outcome is discarded with the receiver.
                    return Err(FlowError::UserQuit.into());
                }
            }
        } else {
            spinner.tick();
        }
    }
}

fn draw_progress(
    frame: &mut ratatui::Frame,
    progress: &PullProgress,
    spinner: &Spinner,
    theme: &Theme,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw("  "),
            Span::styled(spinner.glyph(), theme.spinner),
            Span::raw("  "),
            Span::styled(format!(" {} ", progress.label()), theme.title),
        ])),
        rows[1],
    );

    if progress.is_downloading() {
        let bar_area = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(2),
                Constraint::Max(80),
                Constraint::Min(0),
            ])
            .split(rows[3])[1];
        frame.render_widget(
            Gauge::default()
                .gauge_style(Style::default().fg(theme.accent))
                .ratio(progress.fraction().clamp(0.0, 1.0)),
            bar_area,
        );
    }
}

/// Delete a model from the daemon's disk. Not-found surfaces as the
/// distinct condition so the reporter can name the model.
pub fn run_delete(daemon: &DaemonClient, name: &str) -> Result<()> {
    daemon.delete(name)
}

/// The running-model tri-state control: keep loaded indefinitely, free
/// immediately, or do nothing. Returns the effective choice; "do nothing"
/// (and a declined confirmation) performs no request and is not an error.
pub fn run_monitor(daemon: &DaemonClient, name: &str, theme: &Theme) -> Result<RunningChoice> {
    let options = [
        (
            "Keep loaded in memory (indefinitely)".to_string(),
            RunningChoice::KeepLoaded,
        ),
        (
            "Free up memory by unloading".to_string(),
            RunningChoice::Free,
        ),
        ("Do nothing".to_string(), RunningChoice::Nothing),
    ];
    let mut choice = prompt::select_one(
        &format!("Model {name} is running..."),
        &options,
        theme,
    )?;

    if choice != RunningChoice::Nothing && !prompt::confirm("Would you like to continue?", theme)? {
        choice = RunningChoice::Nothing;
    }

    if let Some(seconds) = choice.keep_alive_seconds() {
        daemon
            .keep_alive(name, seconds)
            .with_context(|| format!("keep-alive for {name}"))?;
    }
    Ok(choice)
}
