use crate::app::actions::Action;
use crate::app::events::{Event, InputEvent};
use crate::app::state::{AppState, Focus};
use crossterm::event::{
    self, Event as CtEvent, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind,
};
use tokio::sync::mpsc;

pub fn spawn_input_task(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        loop {
            if event::poll(std::time::Duration::from_millis(250)).unwrap_or(false) {
                match event::read() {
                    Ok(CtEvent::Key(k)) => {
                        if k.kind == KeyEventKind::Press
                            && tx.blocking_send(Event::Input(InputEvent::Key(k))).is_err()
                        {
                            break;
                        }
                    }
                    Ok(CtEvent::Mouse(m)) => {
                        if tx.blocking_send(Event::Input(InputEvent::Mouse(m))).is_err() {
                            break;
                        }
                    }
                    Ok(CtEvent::Resize(_, _)) => {
                        if tx.blocking_send(Event::Input(InputEvent::Resize)).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => {}
                }
            }
        }
    });
}

pub fn map_input_to_action(state: &AppState, ev: InputEvent) -> Option<Action> {
    match ev {
        InputEvent::Resize => Some(Action::Resize),
        InputEvent::Mouse(m) => match m.kind {
            MouseEventKind::ScrollUp => Some(Action::ListUp),
            MouseEventKind::ScrollDown => Some(Action::ListDown),
            _ => None,
        },
        InputEvent::Key(k) => {
            if state.show_help {
                return handle_help_overlay(k);
            }
            match state.focus {
                Focus::Input => handle_input_focus(state, k),
                Focus::Results => handle_results_focus(k),
            }
        }
    }
}

fn handle_help_overlay(k: crossterm::event::KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::F(1) => {
            Some(Action::ToggleHelp)
        }
        _ => None,
    }
}

fn handle_input_focus(state: &AppState, k: crossterm::event::KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::Enter => Some(Action::StartSearch),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Tab => Some(Action::NextFilter),
        KeyCode::BackTab => Some(Action::PrevFilter),
        KeyCode::Down if !state.results.items.is_empty() => {
            Some(Action::SetFocus(Focus::Results))
        }
        KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::F(1) => Some(Action::ToggleHelp),
        KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::ClearInput)
        }
        KeyCode::Char('r') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Refresh),
        KeyCode::Char(c) => Some(Action::InputChar(c)),
        _ => None,
    }
}

fn handle_results_focus(k: crossterm::event::KeyEvent) -> Option<Action> {
    match k.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc | KeyCode::Char('/') | KeyCode::Char('i') => {
            Some(Action::SetFocus(Focus::Input))
        }
        KeyCode::Enter => Some(Action::Activate),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::ListUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::ListDown),
        KeyCode::Char('g') => Some(Action::GoTop),
        KeyCode::Char('G') => Some(Action::GoBottom),
        KeyCode::Char('d') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageDown),
        KeyCode::Char('u') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Some(Action::NextFilter),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => Some(Action::PrevFilter),
        KeyCode::Char('r') if k.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Refresh),
        KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Char('?') | KeyCode::F(1) => Some(Action::ToggleHelp),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piped::Filter;
    use crossterm::event::{KeyEvent, KeyEventKind, KeyEventState};

    fn key(code: KeyCode) -> InputEvent {
        InputEvent::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_input_focus_types_chars() {
        let state = AppState::new(Filter::All);
        assert!(matches!(
            map_input_to_action(&state, key(KeyCode::Char('q'))),
            Some(Action::InputChar('q'))
        ));
        assert!(matches!(
            map_input_to_action(&state, key(KeyCode::Enter)),
            Some(Action::StartSearch)
        ));
    }

    #[test]
    fn test_results_focus_navigates() {
        let mut state = AppState::new(Filter::All);
        state.focus = Focus::Results;
        assert!(matches!(
            map_input_to_action(&state, key(KeyCode::Char('j'))),
            Some(Action::ListDown)
        ));
        assert!(matches!(
            map_input_to_action(&state, key(KeyCode::Char('q'))),
            Some(Action::Quit)
        ));
        assert!(matches!(
            map_input_to_action(&state, key(KeyCode::Tab)),
            Some(Action::NextFilter)
        ));
    }

    #[test]
    fn test_down_enters_results_only_with_items() {
        let state = AppState::new(Filter::All);
        assert!(map_input_to_action(&state, key(KeyCode::Down)).is_none());
    }
}
