//! Root layout widget - orchestrates main layout structure

use crate::app::state::{AppState, ToastKind};
use crate::piped::Filter;
use crate::tui::theme::get_theme;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{help, result_list};

/// Main layout structure:
/// ┌─────────────────────────────────────────────────────┐
/// │  Query box                                          │
/// ├─────────────────────────────────────────────────────┤
/// │  [All] [Videos] [Channels] ...       filter chips   │
/// ├─────────────────────────────────────────────────────┤
/// │  Results                                            │
/// │                                                     │
/// ├─────────────────────────────────────────────────────┤
/// │  Status line                              toast     │
/// └─────────────────────────────────────────────────────┘
pub fn render(frame: &mut Frame, state: &mut AppState) {
    let root = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query box
            Constraint::Length(1), // Filter chips
            Constraint::Min(3),    // Results
            Constraint::Length(1), // Status line
        ])
        .split(root);

    result_list::render_query_box(frame, state, rows[0]);
    render_filter_chips(frame, state, rows[1]);
    result_list::render(frame, state, rows[2]);
    render_status_line(frame, state, rows[3]);

    if state.show_help {
        help::render(frame, root);
    }
}

fn render_filter_chips(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let active = state.pager.filter();

    let chip_spans: Vec<Span> = Filter::ALL
        .iter()
        .enumerate()
        .flat_map(|(i, filter)| {
            let is_active = *filter == active;
            let style = if is_active {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_secondary)
            };

            let mut spans = vec![
                Span::styled("[", style),
                Span::styled(filter.label(), style),
                Span::styled("]", style),
            ];
            if i < Filter::ALL.len() - 1 {
                spans.push(Span::raw(" "));
            }
            spans
        })
        .collect();

    frame.render_widget(Paragraph::new(Line::from(chip_spans)), area);
}

fn render_status_line(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    // A live toast takes over the status line.
    if let Some(toast) = &state.toast {
        let icon = match toast.kind {
            ToastKind::Success => icons.success,
            ToastKind::Error => icons.error,
        };
        let line = Line::from(vec![
            Span::styled(format!(" {icon} "), Style::default().fg(theme.palette.accent)),
            Span::styled(
                toast.message.as_str(),
                Style::default()
                    .fg(theme.palette.fg_primary)
                    .add_modifier(Modifier::BOLD),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut spans = vec![Span::styled(
        format!(" {}", state.status),
        Style::default().fg(theme.palette.fg_secondary),
    )];

    if state.thumbs_cached > 0 {
        spans.push(Span::styled(
            format!("  {} {}", icons.cache, state.thumbs_cached),
            Style::default().fg(theme.palette.fg_secondary),
        ));
    }

    // Key hint pinned to the right.
    let hint = "?: help  q: quit";
    let left: String = spans.iter().map(|s| s.content.as_ref()).collect();
    let pad = (area.width as usize)
        .saturating_sub(left.chars().count())
        .saturating_sub(hint.len() + 1);
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::styled(
        hint,
        Style::default().fg(theme.palette.fg_secondary),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
