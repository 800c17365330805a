use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, ListState, StatefulWidget},
};

use super::layout::pane_block;
use crate::state::app_state::AppState;
use crate::state::focus::Pane;
use crate::theme::Theme;

pub fn render(buf: &mut Buffer, area: Rect, state: &AppState, theme: &Theme) {
    let colors = &theme.colors;
    let session = &state.session;

    let items: Vec<ListItem> = session
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let marker = if entry.in_flight {
                Span::styled("… ", Style::default().fg(colors.warning))
            } else if !entry.is_sendable() {
                Span::styled("✗ ", Style::default().fg(colors.error))
            } else {
                match entry.response.as_ref().and_then(|r| r.status) {
                    Some(code) => Span::styled(format!("{code} "), Style::default().fg(colors.status(code))),
                    None if entry.response.is_some() => Span::styled("✗ ", Style::default().fg(colors.error)),
                    None => Span::raw("  "),
                }
            };
            let document = session
                .document_of(entry)
                .map(|doc| doc.display_name())
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                marker,
                Span::styled(session.label(index), Style::default().fg(colors.text)),
                Span::styled(format!("  {document}"), Style::default().fg(colors.muted)),
            ]))
        })
        .collect();

    let focused = state.focus.pane == Pane::RequestList;
    let list = List::new(items)
        .block(pane_block(" Requests ", focused, theme))
        .highlight_style(
            Style::default()
                .bg(colors.selection)
                .add_modifier(Modifier::BOLD),
        );

    let mut list_state = ListState::default().with_selected(state.focus.selected);
    StatefulWidget::render(list, area, buf, &mut list_state);
}
