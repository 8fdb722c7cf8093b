//! Help overlay - keybind reference rendered over the main layout

use crate::tui::theme::get_theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const BINDINGS: &[(&str, &str)] = &[
    ("Enter", "Run search / open selected"),
    ("Tab / Shift-Tab", "Cycle filter chips"),
    ("j / k, Down / Up", "Move selection"),
    ("g / G", "Jump to top / bottom"),
    ("Ctrl-d / Ctrl-u", "Half-page down / up"),
    ("Esc, /", "Back to query input"),
    ("Ctrl-u (input)", "Clear query"),
    ("F5, Ctrl-r", "Re-run current search"),
    ("?", "Toggle this help"),
    ("q", "Quit"),
];

pub fn render(frame: &mut Frame, root: Rect) {
    let theme = get_theme();
    let area = centered_rect(44, BINDINGS.len() as u16 + 4, root);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(theme.palette.accent))
        .title(format!(" {} Keybinds ", theme.icons.help))
        .title_style(Style::default().fg(theme.palette.accent));
    let inner = block.inner(area);

    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = BINDINGS
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(
                    format!(" {key:<16}"),
                    Style::default()
                        .fg(theme.palette.accent)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(*what, Style::default().fg(theme.palette.fg_primary)),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn centered_rect(width: u16, height: u16, root: Rect) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height.min(root.height)),
            Constraint::Min(0),
        ])
        .split(root);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(width.min(root.width)),
            Constraint::Min(0),
        ])
        .split(rows[1]);
    cols[1]
}
