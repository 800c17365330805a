use super::{focus::FocusState, session::Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// One line of feedback shown in the status bar until the next action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
}

#[derive(Debug)]
pub struct AppState {
    pub session: Session,
    pub focus: FocusState,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(session: Session, wrap_focus: bool) -> Self {
        let focus = FocusState::new(session.len(), wrap_focus);
        Self {
            session,
            focus,
            status: None,
            should_quit: false,
        }
    }

    pub fn set_status(&mut self, level: StatusLevel, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            level,
            text: text.into(),
        });
    }

    pub fn in_flight(&self) -> usize {
        self.session.entries.iter().filter(|e| e.in_flight).count()
    }
}
