//! Blocking sub-UIs shared by the flows between picker and operation:
//! a spinner around a blocking call, a single-choice menu, a yes/no
//! confirmation and the combined choice-plus-confirm form.

use std::io::{self, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::error::FlowError;
use crate::theme::Theme;

const SPINNER_SETS: [&[&str]; 6] = [
    &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
    &["|", "/", "-", "\\"],
    &["∙∙∙", "●∙∙", "∙●∙", "∙∙●"],
    &["◜", "◠", "◝", "◞", "◡", "◟"],
    &["▱▱▱", "▰▱▱", "▰▰▱", "▰▰▰", "▰▰▱", "▰▱▱"],
    &["☱", "☲", "☴", "☲"],
];

/// A tiny frame-cycling spinner. Reseeding jumps to a random glyph set,
/// which marks phase changes visually.
#[derive(Debug)]
pub struct Spinner {
    set: usize,
    idx: usize,
}

impl Spinner {
    pub fn new() -> Self {
        let mut s = Spinner { set: 0, idx: 0 };
        s.reseed();
        s
    }

    pub fn reseed(&mut self) {
        let mut byte = [0u8; 1];
        let _ = getrandom::getrandom(&mut byte);
        self.set = byte[0] as usize % SPINNER_SETS.len();
        self.idx = 0;
    }

    pub fn tick(&mut self) {
        self.idx = (self.idx + 1) % SPINNER_SETS[self.set].len();
    }

    pub fn glyph(&self) -> &'static str {
        SPINNER_SETS[self.set][self.idx]
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

/// Raw mode + alternate screen around a closure, restoring the terminal on
/// every exit path.
pub fn with_terminal<T>(
    f: impl FnOnce(&mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<T>,
) -> Result<T> {
    let mut stdout = io::stdout();
    enable_raw_mode().context("enable raw mode")?;
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let res = Terminal::new(backend)
        .context("create terminal")
        .and_then(|mut terminal| {
            terminal.clear().ok();
            let res = f(&mut terminal);
            execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
            terminal.show_cursor().ok();
            res
        });

    disable_raw_mode().ok();
    res
}

/// Run a blocking call on a worker thread while animating an inline
/// spinner. Quit keys abandon the wait; the worker's outcome is discarded.
pub fn run_with_spinner<T, F>(title: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(f());
    });

    let mut spinner = Spinner::new();
    let mut stdout = io::stdout();
    enable_raw_mode().context("enable raw mode")?;
    execute!(stdout, cursor::Hide).ok();

    let res = loop {
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            Clear(ClearType::CurrentLine),
        )
        .ok();
        write!(stdout, "{} {}", spinner.glyph(), title).ok();
        stdout.flush().ok();

        match rx.recv_timeout(Duration::from_millis(80)) {
            Ok(value) => break Ok(value),
            Err(RecvTimeoutError::Timeout) => {
                spinner.tick();
                if quit_pressed()? {
                    break Err(FlowError::UserQuit.into());
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                break Err(anyhow::anyhow!("background task vanished"));
            }
        }
    };

    execute!(
        stdout,
        cursor::MoveToColumn(0),
        Clear(ClearType::CurrentLine),
        cursor::Show,
    )
    .ok();
    disable_raw_mode().ok();
    res
}

fn quit_pressed() -> Result<bool> {
    while event::poll(Duration::ZERO).context("poll")? {
        if let Event::Key(k) = event::read().context("read event")? {
            if k.kind == KeyEventKind::Press && is_quit_key(&k) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

pub(crate) fn is_quit_key(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn centered_box(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(w)) / 2,
        y: area.y + (area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn menu_lines<'a>(
    labels: &'a [String],
    cursor: usize,
    focused: bool,
    theme: &Theme,
) -> Vec<Line<'a>> {
    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            if i == cursor {
                let style = if focused {
                    Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().add_modifier(Modifier::BOLD)
                };
                Line::from(vec![
                    Span::styled("┃ ", style),
                    Span::styled(label.as_str(), style),
                ])
            } else {
                Line::from(vec![Span::raw("  "), Span::raw(label.as_str())])
            }
        })
        .collect()
}

/// A blocking single-choice menu. Cancelling propagates as the user-quit
/// condition.
pub fn select_one<T: Clone>(title: &str, options: &[(String, T)], theme: &Theme) -> Result<T> {
    let labels: Vec<String> = options.iter().map(|(label, _)| label.clone()).collect();
    let width = labels
        .iter()
        .map(|l| l.len())
        .chain([title.len()])
        .max()
        .unwrap_or(20) as u16
        + 8;

    with_terminal(|terminal| {
        let mut cursor = 0usize;
        loop {
            terminal
                .draw(|frame| {
                    let box_area = centered_box(
                        frame.area(),
                        width.max(30),
                        labels.len() as u16 + 4,
                    );
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(theme.accent))
                        .title(Span::styled(format!(" {} ", title), theme.title));
                    let inner = block.inner(box_area);
                    frame.render_widget(block, box_area);
                    frame.render_widget(
                        Paragraph::new(menu_lines(&labels, cursor, true, theme)),
                        inner,
                    );
                })
                .context("draw menu")?;

            if !event::poll(Duration::from_millis(100)).context("poll")? {
                continue;
            }
            let Event::Key(key) = event::read().context("read event")? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if is_quit_key(&key) {
                return Err(FlowError::UserQuit.into());
            }
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => cursor = cursor.saturating_sub(1),
                KeyCode::Down | KeyCode::Char('j') => {
                    if cursor + 1 < options.len() {
                        cursor += 1;
                    }
                }
                KeyCode::Enter => {
                    let Some((_, value)) = options.get(cursor) else {
                        return Err(FlowError::UserQuit.into());
                    };
                    return Ok(value.clone());
                }
                _ => {}
            }
        }
    })
}

/// A combined single-choice menu plus yes/no confirmation in one form.
/// Returns `None` when the user answers no; cancelling is user-quit.
pub fn select_with_confirm(
    title: &str,
    options: &[String],
    theme: &Theme,
) -> Result<Option<String>> {
    #[derive(PartialEq)]
    enum Focus {
        Options,
        Confirm,
    }

    let width = options
        .iter()
        .map(|l| l.len())
        .chain([title.len(), 30])
        .max()
        .unwrap_or(30) as u16
        + 8;

    with_terminal(|terminal| {
        let mut cursor = 0usize;
        let mut focus = Focus::Options;
        let mut yes = false;

        loop {
            terminal
                .draw(|frame| {
                    let box_area = centered_box(
                        frame.area(),
                        width,
                        options.len() as u16 + 7,
                    );
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(theme.accent))
                        .title(Span::styled(format!(" {} ", title), theme.title));
                    let inner = block.inner(box_area);
                    frame.render_widget(block, box_area);

                    let mut lines =
                        menu_lines(options, cursor, focus == Focus::Options, theme);
                    lines.push(Line::from(""));
                    lines.push(Line::from("Would you like to continue?"));
                    let (yes_style, no_style) = if focus == Focus::Confirm {
                        if yes {
                            (theme.title, Style::default().fg(theme.dim))
                        } else {
                            (Style::default().fg(theme.dim), theme.title)
                        }
                    } else {
                        (
                            Style::default().fg(theme.dim),
                            Style::default().fg(theme.dim),
                        )
                    };
                    lines.push(Line::from(vec![
                        Span::styled("  Yes  ", yes_style),
                        Span::raw("  "),
                        Span::styled("  No  ", no_style),
                    ]));
                    frame.render_widget(Paragraph::new(lines), inner);
                })
                .context("draw form")?;

            if !event::poll(Duration::from_millis(100)).context("poll")? {
                continue;
            }
            let Event::Key(key) = event::read().context("read event")? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if is_quit_key(&key) {
                return Err(FlowError::UserQuit.into());
            }

            match focus {
                Focus::Options => match key.code {
                    KeyCode::Up | KeyCode::Char('k') => cursor = cursor.saturating_sub(1),
                    KeyCode::Down | KeyCode::Char('j') => {
                        if cursor + 1 < options.len() {
                            cursor += 1;
                        }
                    }
                    KeyCode::Enter | KeyCode::Tab => focus = Focus::Confirm,
                    _ => {}
                },
                Focus::Confirm => match key.code {
                    KeyCode::Left
                    | KeyCode::Right
                    | KeyCode::Char('h')
                    | KeyCode::Char('l') => yes = !yes,
                    KeyCode::Char('y') => {
                        return Ok(options.get(cursor).cloned());
                    }
                    KeyCode::Char('n') => return Ok(None),
                    KeyCode::BackTab | KeyCode::Tab => focus = Focus::Options,
                    KeyCode::Enter => {
                        if yes {
                            return Ok(options.get(cursor).cloned());
                        }
                        return Ok(None);
                    }
                    _ => {}
                },
            }
        }
    })
}

/// A plain yes/no confirmation. Cancelling is user-quit.
pub fn confirm(title: &str, theme: &Theme) -> Result<bool> {
    with_terminal(|terminal| {
        let mut yes = false;
        loop {
            terminal
                .draw(|frame| {
                    let box_area =
                        centered_box(frame.area(), title.len() as u16 + 8, 5);
                    let block = Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(theme.accent))
                        .title(Span::styled(format!(" {} ", title), theme.title));
                    let inner = block.inner(box_area);
                    frame.render_widget(block, box_area);

                    let (yes_style, no_style) = if yes {
                        (theme.title, Style::default().fg(theme.dim))
                    } else {
                        (Style::default().fg(theme.dim), theme.title)
                    };
                    frame.render_widget(
                        Paragraph::new(vec![
                            Line::from(""),
                            Line::from(vec![
                                Span::styled("  Yes  ", yes_style),
                                Span::raw("  "),
                                Span::styled("  No  ", no_style),
                            ]),
                        ]),
                        inner,
                    );
                })
                .context("draw confirm")?;

            if !event::poll(Duration::from_millis(100)).context("poll")? {
                continue;
            }
            let Event::Key(key) = event::read().context("read event")? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if is_quit_key(&key) {
                return Err(FlowError::UserQuit.into());
            }
            match key.code {
                KeyCode::Left | KeyCode::Right | KeyCode::Char('h') | KeyCode::Char('l') => {
                    yes = !yes;
                }
                KeyCode::Char('y') => return Ok(true),
                KeyCode::Char('n') => return Ok(false),
                KeyCode::Enter => return Ok(yes),
                _ => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_cycles_within_its_set() {
        let mut s = Spinner::new();
        let len = SPINNER_SETS[s.set].len();
        let first = s.glyph();
        for _ in 0..len {
            s.tick();
        }
        assert_eq!(s.glyph(), first);
    }

    #[test]
    fn reseed_resets_the_frame_index() {
        let mut s = Spinner::new();
        s.tick();
        s.reseed();
        assert_eq!(s.idx, 0);
        assert!(s.set < SPINNER_SETS.len());
    }

    #[test]
    fn quit_key_detection() {
        let quit = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert!(is_quit_key(&quit));
        assert!(is_quit_key(&ctrl_c));
        assert!(!is_quit_key(&plain_c));
    }
}
