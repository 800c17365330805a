use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::state::app_state::{AppState, StatusLevel};
use crate::state::mode::Mode;
use crate::theme::Theme;

pub fn render(buf: &mut Buffer, area: Rect, state: &AppState, theme: &Theme) {
    let colors = &theme.colors;
    let mode_color = match state.focus.mode {
        Mode::Normal => colors.border_focused,
        Mode::Expanded => colors.method,
    };

    let mut spans = vec![Span::styled(
        format!(" {} ", state.focus.mode.label()),
        Style::default()
            .fg(Color::Black)
            .bg(mode_color)
            .add_modifier(Modifier::BOLD),
    )];

    let hints = match state.focus.mode {
        Mode::Normal => "  h/l:focus · j/k:move · e:expand · space:send · c:copy · Ctrl+q:quit",
        Mode::Expanded => "  h/l:pane · j/k:scroll · e:collapse · c:copy · Ctrl+q:quit",
    };
    spans.push(Span::styled(hints, Style::default().fg(colors.border)));

    let in_flight = state.in_flight();
    if in_flight > 0 {
        spans.push(Span::styled(
            format!("  · {in_flight} in flight"),
            Style::default().fg(colors.warning),
        ));
    }

    if let Some(status) = &state.status {
        let fg = match status.level {
            StatusLevel::Info => colors.text,
            StatusLevel::Warning => colors.warning,
            StatusLevel::Error => colors.error,
        };
        spans.push(Span::styled(format!("  {}", status.text), Style::default().fg(fg)));
    }

    Paragraph::new(Line::from(spans)).render(area, buf);
}
