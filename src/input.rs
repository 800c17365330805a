use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    FocusLeft,
    FocusRight,
    Down,
    Up,
    ToggleExpanded,
    Send,
    Copy,
    Quit,
}

/// Map one key event to at most one action. Releases and unbound keys map
/// to `None`.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Action::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => Some(Action::FocusLeft),
        KeyCode::Char('l') | KeyCode::Right => Some(Action::FocusRight),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('e') => Some(Action::ToggleExpanded),
        KeyCode::Char(' ') => Some(Action::Send),
        KeyCode::Char('c') => Some(Action::Copy),
        _ => None,
    }
}
