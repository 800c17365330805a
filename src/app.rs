use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::env::store::EnvAccess;
use crate::event::Event;
use crate::http::executor::dispatch;
use crate::input::{Action, map_key};
use crate::scripting::run_postscript;
use crate::state::app_state::{AppState, StatusLevel};
use crate::state::focus::{Bounds, Pane};
use crate::state::response_state::{PostscriptReport, ResponseRecord};
use crate::theme::Theme;
use crate::ui::{request_detail, response_detail};

pub struct App {
    pub state: AppState,
    pub theme: Theme,
    client: reqwest::Client,
    env: Arc<dyn EnvAccess>,
    tx: UnboundedSender<Event>,
    clipboard: Option<arboard::Clipboard>,
}

impl App {
    pub fn new(
        state: AppState,
        theme: Theme,
        client: reqwest::Client,
        env: Arc<dyn EnvAccess>,
        tx: UnboundedSender<Event>,
    ) -> Self {
        Self {
            state,
            theme,
            client,
            env,
            tx,
            clipboard: None,
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                if let Some(action) = map_key(key) {
                    self.apply(action);
                }
            }
            Event::Dispatched {
                index,
                record,
                postscript,
            } => self.handle_dispatched(index, record, postscript),
            // The renderer repaints on its own after a resize.
            Event::Resize(_, _) => {}
        }
    }

    pub fn apply(&mut self, action: Action) {
        self.state.status = None;
        match action {
            Action::Quit => self.state.should_quit = true,
            Action::FocusLeft => self.state.focus.move_left(),
            Action::FocusRight => self.state.focus.move_right(),
            Action::Down => {
                let bounds = self.bounds();
                self.state.focus.move_down(bounds);
            }
            Action::Up => self.state.focus.move_up(),
            Action::ToggleExpanded => {
                self.state.focus.toggle_expanded();
            }
            Action::Send => self.send(),
            Action::Copy => self.copy(),
        }
    }

    fn bounds(&self) -> Bounds {
        Bounds {
            items: self.state.session.len(),
            request_lines: request_detail::lines(&self.state, &self.theme).len(),
            response_lines: response_detail::lines(&self.state, &self.theme).len(),
        }
    }

    fn send(&mut self) {
        let prepared = self
            .state
            .focus
            .send_target()
            .and_then(|index| self.state.session.begin_send(index, self.env.as_ref()));
        let prepared = match prepared {
            Ok(prepared) => prepared,
            Err(rejected) => {
                tracing::info!(reason = %rejected, "Send rejected");
                self.state.set_status(StatusLevel::Warning, rejected.to_string());
                return;
            }
        };

        let label = self.state.session.label(prepared.index);
        tracing::info!(request = %label, "Sending");
        self.state.set_status(StatusLevel::Info, format!("Sending {label}"));

        let client = self.client.clone();
        let env = self.env.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let record = dispatch(&client, &prepared.request).await;
            let postscript = match prepared.postscript {
                Some(path) if record.is_success() => {
                    let response = record.clone();
                    let outcome =
                        tokio::task::spawn_blocking(move || run_postscript(&path, &response, env)).await;
                    match outcome {
                        Ok(report) => Some(report),
                        Err(err) => {
                            tracing::error!(error = %err, "Postscript task panicked");
                            None
                        }
                    }
                }
                _ => None,
            };
            let _ = tx.send(Event::Dispatched {
                index: prepared.index,
                record,
                postscript,
            });
        });
    }

    fn handle_dispatched(&mut self, index: usize, record: ResponseRecord, postscript: Option<PostscriptReport>) {
        let label = self.state.session.label(index);
        let status = match (&record.error, postscript.as_ref().and_then(|p| p.error.as_ref())) {
            (Some(err), _) => (StatusLevel::Error, format!("{label}: {err}")),
            (None, Some(warning)) => (StatusLevel::Warning, format!("{label}: {warning}")),
            (None, None) => (
                StatusLevel::Info,
                format!("{label}: {} {}", record.status.unwrap_or_default(), record.status_text),
            ),
        };

        self.state.session.complete_send(index, record, postscript);
        self.state.set_status(status.0, status.1);
        let bounds = self.bounds();
        self.state.focus.clamp_scroll(bounds);
    }

    /// Text of the focused detail pane, as `c` copies it.
    pub fn copy_text(&self) -> Option<String> {
        let session = &self.state.session;
        let entry = self.state.focus.selected.and_then(|i| session.entry(i))?;
        match self.state.focus.pane {
            Pane::RequestList => None,
            Pane::RequestDetail => match &entry.template {
                Ok(template) => Some(template.to_http()),
                Err(_) => session.block_of(entry).map(|block| block.to_http()),
            },
            Pane::ResponseDetail => entry.response.as_ref().map(|r| match &r.error {
                Some(err) => err.clone(),
                None => r.display_body(),
            }),
        }
    }

    fn copy(&mut self) {
        let Some(text) = self.copy_text() else {
            self.state.set_status(StatusLevel::Info, "Nothing to copy");
            return;
        };
        if self.clipboard.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(err) => {
                    tracing::warn!(error = %err, "Clipboard unavailable");
                    self.state.set_status(StatusLevel::Error, format!("Copy failed: {err}"));
                    return;
                }
            }
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            return;
        };
        let result = clipboard.set_text(text);
        match result {
            Ok(()) => self.state.set_status(StatusLevel::Info, "Copied to clipboard"),
            Err(err) => {
                tracing::warn!(error = %err, "Clipboard write failed");
                self.state.set_status(StatusLevel::Error, format!("Copy failed: {err}"));
            }
        }
    }
}
