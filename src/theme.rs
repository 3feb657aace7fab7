use ratatui::style::{Color, Modifier, Style};

/// Styling shared across the picker, prompts and progress rendering.
/// Constructed once at startup and passed by reference; no component owns
/// mutable style state.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub accent: Color,
    pub dim: Color,
    pub title: Style,
    pub badge: Style,
    pub success: Style,
    pub spinner: Style,
}

impl Default for Theme {
    fn default() -> Self {
        let accent = Color::Indexed(99);
        Self {
            accent,
            dim: Color::DarkGray,
            title: Style::default()
                .fg(Color::White)
                .bg(accent)
                .add_modifier(Modifier::BOLD),
            badge: Style::default().fg(Color::White).bg(Color::Indexed(242)),
            success: Style::default()
                .fg(Color::White)
                .bg(Color::Indexed(99))
                .add_modifier(Modifier::BOLD),
            spinner: Style::default().fg(Color::Indexed(69)),
        }
    }
}
