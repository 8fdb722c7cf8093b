//! Result list widget - renders search results with virtual scrolling

use crate::app::state::{AppState, Focus};
use crate::piped::SearchItem;
use crate::search::Phase;
use crate::tui::theme::{get_theme, LoadingSpinner};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Render the query input box
pub fn render_query_box(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();

    let is_focused = state.focus == Focus::Input;
    let border_color = if is_focused {
        theme.palette.accent
    } else {
        theme.palette.border
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(theme.border_set())
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} Search ", theme.icons.search))
        .title_style(Style::default().fg(theme.palette.accent));

    let prompt = if state.results.phase == Phase::Loading {
        let spinner = LoadingSpinner::frame(state.tick);
        format!("{} {}", state.query_input, spinner)
    } else {
        let cursor = if is_focused { "▏" } else { "" };
        format!("{}{}", state.query_input, cursor)
    };

    let p = Paragraph::new(Line::from(prompt))
        .style(Style::default().fg(theme.palette.fg_primary))
        .block(block);
    frame.render_widget(p, area);
}

/// Render the result list (called within an existing block area)
pub fn render(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let results = &state.results;

    if results.phase == Phase::Loading {
        let spinner = LoadingSpinner::frame(state.tick);
        let loading = Paragraph::new(Line::from(format!("{} Loading...", spinner)))
            .style(Style::default().fg(theme.palette.fg_secondary));
        frame.render_widget(loading, area);
        return;
    }

    if results.items.is_empty() {
        render_empty_state(frame, state, area);
        return;
    }

    // Virtual scroll: only render visible items
    let visible_height = area.height as usize;
    let scroll_offset = state.scroll_offset;
    let end_idx = (scroll_offset + visible_height).min(results.items.len());

    let mut items: Vec<ListItem> = results
        .items
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
        .map(|(i, item)| {
            let is_selected = i == state.selected;
            let base_style = if is_selected {
                Style::default()
                    .fg(theme.palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(theme.palette.fg_primary)
            };
            ListItem::new(Line::from(result_spans(item, base_style, &theme, area.width)))
        })
        .collect();

    // Trailing rows communicate pagination state below the last result.
    if results.phase == Phase::LoadingMore && end_idx >= results.items.len() {
        let spinner = LoadingSpinner::frame(state.tick);
        items.push(ListItem::new(Line::from(Span::styled(
            format!("  {} Loading more...", spinner),
            Style::default().fg(theme.palette.fg_secondary),
        ))));
    }
    if results.phase == Phase::Ready && end_idx >= results.items.len() {
        items.push(ListItem::new(Line::from(Span::styled(
            "  ↓ Scroll for more",
            Style::default().fg(theme.palette.fg_secondary),
        ))));
    }
    if results.phase == Phase::Error && end_idx >= results.items.len() {
        items.push(ListItem::new(Line::from(Span::styled(
            format!("  {} Page failed - scroll again or F5 to retry", theme.icons.error),
            Style::default().fg(theme.palette.error),
        ))));
    }

    let adjusted_selected = state.selected.saturating_sub(scroll_offset);
    let mut list_state = ListState::default();
    list_state.select(Some(adjusted_selected));

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .fg(theme.palette.bg_primary)
                .bg(theme.palette.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("\u{f054} "); // nf-fa-chevron_right

    frame.render_stateful_widget(list, area, &mut list_state);

    // Scroll position indicator in the top-right corner
    if results.items.len() > visible_height {
        let pos_text = format!("{}/{}", state.selected + 1, results.items.len());
        let pos_len = pos_text.len() as u16;
        let pos_x = area.x + area.width.saturating_sub(pos_len);
        if pos_x > area.x {
            frame.render_widget(
                Paragraph::new(pos_text).style(Style::default().fg(theme.palette.fg_secondary)),
                Rect::new(pos_x, area.y, pos_len, 1),
            );
        }
    }
}

fn render_empty_state(frame: &mut Frame, state: &AppState, area: Rect) {
    let theme = get_theme();
    let icons = &theme.icons;

    match state.results.phase {
        Phase::Error => {
            let msg = format!("{} Search failed. F5 to retry.", icons.error);
            frame.render_widget(
                Paragraph::new(Line::from(msg))
                    .style(Style::default().fg(theme.palette.error)),
                area,
            );
        }
        Phase::Exhausted => {
            frame.render_widget(
                Paragraph::new(Line::from("No results"))
                    .style(Style::default().fg(theme.palette.fg_secondary)),
                area,
            );
        }
        _ => {
            let mut lines = vec![Line::from(Span::styled(
                "Type a query and press Enter",
                Style::default().fg(theme.palette.fg_secondary),
            ))];
            if !state.recent_searches.is_empty() {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    format!("{} Recent searches", icons.history),
                    Style::default().fg(theme.palette.fg_secondary),
                )));
                for q in &state.recent_searches {
                    lines.push(Line::from(Span::styled(
                        format!("  {} {}", icons.bullet, q),
                        Style::default().fg(theme.palette.fg_primary),
                    )));
                }
            }
            frame.render_widget(Paragraph::new(lines), area);
        }
    }
}

fn result_spans<'a>(
    item: &'a SearchItem,
    base_style: Style,
    theme: &crate::tui::theme::Theme,
    width: u16,
) -> Vec<Span<'a>> {
    let icons = &theme.icons;
    let kind_icon = match item.kind.as_str() {
        "channel" => icons.channel,
        "playlist" => icons.playlist,
        _ => icons.video,
    };

    let meta_style = Style::default().fg(theme.palette.fg_secondary);
    let mut spans = vec![
        Span::styled(format!("{kind_icon} "), base_style),
        Span::styled(
            truncate_str(item.display_title(), (width as usize).saturating_sub(30)),
            base_style,
        ),
    ];

    if let Some(uploader) = &item.uploader_name {
        spans.push(Span::styled(format!("  {uploader}"), meta_style));
        if item.uploader_verified {
            spans.push(Span::styled(format!(" {}", icons.verified), meta_style));
        }
    }
    if let Some(secs) = item.duration
        && secs >= 0
    {
        spans.push(Span::styled(format!("  {}", format_duration(secs)), meta_style));
    }
    if let Some(views) = item.views
        && views >= 0
    {
        spans.push(Span::styled(
            format!("  {} views", format_count(views)),
            meta_style,
        ));
    }

    spans
}

/// "3:05" below an hour, "1:02:45" above.
pub fn format_duration(secs: i64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// Compact view counts: 950 -> "950", 12_400 -> "12.4K", 3_100_000 -> "3.1M".
pub fn format_count(n: i64) -> String {
    let n = n.max(0) as f64;
    if n >= 1_000_000_000.0 {
        format!("{:.1}B", n / 1_000_000_000.0)
    } else if n >= 1_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        format!("{}", n as i64)
    }
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    let char_count: usize = s.chars().count();
    if char_count <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(185), "3:05");
        assert_eq!(format_duration(3765), "1:02:45");
        assert_eq!(format_duration(0), "0:00");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(950), "950");
        assert_eq!(format_count(12_400), "12.4K");
        assert_eq!(format_count(3_100_000), "3.1M");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a very long title indeed", 10), "a very ...");
        assert_eq!(truncate_str("abc", 0), "");
    }
}
