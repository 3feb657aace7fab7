use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap};

use crate::format::{human_bytes, relative_time};
use crate::model::{Listable, Tab};
use crate::theme::Theme;

use super::list::{FilterList, FilterState};
use super::selector::Selector;

pub fn draw(frame: &mut Frame, s: &Selector, theme: &Theme) {
    let area = frame.area();

    let (tab_area, body, hint_area) = if s.has_tab_row() {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);
        (Some(rows[0]), rows[1], rows[2])
    } else {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        (None, rows[0], rows[1])
    };

    if let Some(tab_area) = tab_area {
        let labels: Vec<Line> = s.tabs.iter().map(|t| Line::from(t.label())).collect();
        frame.render_widget(
            Tabs::new(labels)
                .select(s.active)
                .style(Style::default().fg(theme.dim))
                .highlight_style(theme.title)
                .divider("│"),
            tab_area,
        );
    }

    let panes = if s.detail_visible() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(s.list_width()), Constraint::Min(0)])
            .split(body);
        (cols[0], Some(cols[1]))
    } else {
        (body, None)
    };

    match s.active_tab() {
        Tab::Install => render_list(frame, panes.0, &s.installable, theme),
        Tab::Manage => render_list(frame, panes.0, &s.installed, theme),
        Tab::Monitor => render_list(frame, panes.0, &s.running, theme),
    }

    if let Some(detail_area) = panes.1 {
        render_detail(frame, detail_area, s, theme);
    }

    frame.render_widget(
        Paragraph::new(hint_line(s)).style(Style::default().fg(theme.dim)),
        hint_area,
    );

    if s.help_visible {
        render_help(frame, s, theme);
    }
}

fn list_title<T: Listable>(list: &FilterList<T>) -> String {
    match list.filter_state() {
        FilterState::Off => format!(" {} ({}) ", list.title(), list.total()),
        FilterState::Editing => format!(" /{}▌ ", list.query()),
        FilterState::Applied => format!(
            " {} (/{} → {}) ",
            list.title(),
            list.query(),
            list.visible_len()
        ),
    }
}

fn render_list<T: Listable>(frame: &mut Frame, area: Rect, list: &FilterList<T>, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(list_title(list));

    let items: Vec<ListItem> = list
        .visible_items()
        .map(|item| {
            ListItem::new(vec![
                Line::from(Span::styled(
                    item.title().to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    item.description(),
                    Style::default().fg(theme.dim),
                )),
            ])
        })
        .collect();

    let mut state = ListState::default();
    if list.visible_len() > 0 {
        state.select(Some(list.cursor()));
    }

    frame.render_stateful_widget(
        List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
            .highlight_symbol("┃ "),
        area,
        &mut state,
    );
}

fn badge<'a>(text: String, theme: &Theme) -> Span<'a> {
    Span::styled(format!(" {} ", text), theme.badge)
}

/// The detail pane is the one place that looks at concrete variant fields.
fn render_detail(frame: &mut Frame, area: Rect, s: &Selector, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dim));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = Vec::new();
    match s.active_tab() {
        Tab::Install => match s.installable.selected() {
            Some(m) => {
                lines.push(Line::from(Span::styled(format!(" {} ", m.name), theme.title)));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    m.updated.clone(),
                    Style::default().fg(theme.dim),
                )));
                if !m.badges.is_empty() {
                    let mut spans = Vec::new();
                    for (i, b) in m.badges.iter().enumerate() {
                        if i > 0 {
                            spans.push(Span::raw(" "));
                        }
                        spans.push(badge(b.clone(), theme));
                    }
                    lines.push(Line::from(spans));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(m.description.clone()));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("{} Pulls • {} Tags", m.pulls, m.tag_count),
                    Style::default().fg(theme.dim),
                )));
            }
            None => lines.push(not_found_line(s.installable.query(), theme)),
        },
        Tab::Manage => match s.installed.selected() {
            Some(m) => {
                lines.push(Line::from(Span::styled(format!(" {} ", m.name), theme.title)));
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    badge(m.details.format.clone(), theme),
                    Span::raw(" "),
                    badge(m.details.quantization_level.clone(), theme),
                ]));
                if m.details.is_multimodal() {
                    lines.push(Line::from(badge("vision".to_string(), theme)));
                }
                lines.push(Line::from(""));
                lines.push(Line::from(m.digest.clone()));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    m.description(),
                    Style::default().fg(theme.dim),
                )));
            }
            None => lines.push(not_found_line(s.installed.query(), theme)),
        },
        Tab::Monitor => match s.running.selected() {
            Some(m) => {
                lines.push(Line::from(Span::styled(format!(" {} ", m.name), theme.title)));
                lines.push(Line::from(""));
                lines.push(Line::from(vec![
                    badge(m.details.format.clone(), theme),
                    Span::raw(" "),
                    badge(m.details.quantization_level.clone(), theme),
                ]));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!(" Expires {} ", relative_time(&m.expires_at)),
                    theme.title,
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(format!(
                    "Total {} | GPU {:.2}% | CPU {:.2}%",
                    human_bytes(m.size),
                    m.vram_percent(),
                    m.cpu_percent(),
                )));
            }
            None => lines.push(not_found_line(s.running.query(), theme)),
        },
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn not_found_line<'a>(query: &str, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {} ", query), theme.title),
        Span::raw(" not found"),
    ])
}

fn hint_line(s: &Selector) -> String {
    if s.has_tab_row() {
        " ?: help │ /: filter │ n/p: tabs │ enter: select │ q: quit".to_string()
    } else {
        " ?: help │ /: filter │ enter: select │ q: quit".to_string()
    }
}

/// Binding rows for the help overlay. Multi-tab bindings are omitted for
/// single-tab sessions; manage shortcuts reflect the approved set.
pub(super) fn help_lines(s: &Selector) -> Vec<String> {
    let mut lines = vec![
        "↑/k        move up".to_string(),
        "↓/j        move down".to_string(),
        "/          filter items".to_string(),
        "esc        clear filter".to_string(),
        "enter      pick selected item".to_string(),
    ];
    if s.has_tab_row() {
        lines.push("→/l/tab    next tab".to_string());
        lines.push("←/h/S-tab  previous tab".to_string());
    }
    if s.tabs.contains(&Tab::Manage) {
        for action in &s.approved {
            lines.push(format!("{}          {}", action.shortcut(), action.label()));
        }
    }
    lines.push("q/ctrl+c   quit".to_string());
    lines
}

fn render_help(frame: &mut Frame, s: &Selector, theme: &Theme) {
    let area = frame.area();
    let w = (area.width * 8 / 10).clamp(24, 60);
    let h = (help_lines(s).len() as u16 + 4).min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    let box_area = Rect {
        x,
        y,
        width: w,
        height: h,
    };

    frame.render_widget(Clear, box_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent))
        .title(Span::styled(" Help ", theme.title));
    let inner = block.inner(box_area);
    frame.render_widget(block, box_area);

    let mut lines: Vec<Line> = help_lines(s)
        .into_iter()
        .map(Line::from)
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "press ? to close",
        Style::default().fg(theme.dim),
    )));
    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ManageAction;

    fn selector(tabs: Vec<Tab>, approved: Vec<ManageAction>) -> Selector {
        Selector::new(tabs, approved, vec![], vec![], vec![])
    }

    #[test]
    fn single_tab_help_omits_tab_bindings() {
        let s = selector(vec![Tab::Install], vec![]);
        let lines = help_lines(&s);
        assert!(!lines.iter().any(|l| l.contains("tab")));
        assert!(!hint_line(&s).contains("n/p"));
    }

    #[test]
    fn multi_tab_help_includes_tab_bindings() {
        let s = selector(vec![Tab::Install, Tab::Manage], vec![]);
        let lines = help_lines(&s);
        assert!(lines.iter().any(|l| l.contains("next tab")));
        assert!(hint_line(&s).contains("n/p"));
    }

    #[test]
    fn manage_help_lists_only_approved_shortcuts() {
        let s = selector(
            vec![Tab::Install, Tab::Manage],
            vec![ManageAction::Update, ManageAction::Chat],
        );
        let lines = help_lines(&s);
        assert!(lines.iter().any(|l| l.contains("Update")));
        assert!(lines.iter().any(|l| l.contains("Chat")));
        assert!(!lines.iter().any(|l| l.contains("Delete")));

        let no_manage = selector(vec![Tab::Install], vec![ManageAction::Update]);
        assert!(!help_lines(&no_manage).iter().any(|l| l.contains("Update")));
    }
}
