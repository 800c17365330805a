use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::highlight::{json_lines, with_placeholders};
use super::layout::pane_block;
use crate::state::app_state::AppState;
use crate::state::focus::Pane;
use crate::state::request_state::{BodyKind, RequestTemplate};
use crate::theme::{Palette, Theme};

/// The selected template as the pane shows it, one entry per text line.
pub fn lines(state: &AppState, theme: &Theme) -> Vec<Line<'static>> {
    let colors = &theme.colors;
    let session = &state.session;
    let Some(entry) = state.focus.selected.and_then(|i| session.entry(i)) else {
        return vec![Line::styled("No requests loaded", Style::default().fg(colors.muted))];
    };

    match &entry.template {
        Ok(template) => template_lines(template, colors),
        Err(err) => {
            let mut lines = vec![
                Line::styled(format!("✗ {err}"), Style::default().fg(colors.error)),
                Line::default(),
            ];
            if let Some(block) = session.block_of(entry) {
                lines.extend(
                    block
                        .to_http()
                        .lines()
                        .map(|l| Line::styled(l.to_string(), Style::default().fg(colors.muted))),
                );
            }
            lines
        }
    }
}

fn template_lines(template: &RequestTemplate, colors: &Palette) -> Vec<Line<'static>> {
    let text = Style::default().fg(colors.text);
    let mut lines = Vec::new();

    let mut request_line = vec![
        Span::styled(
            template.method.to_string(),
            Style::default().fg(colors.method).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];
    request_line.extend(with_placeholders(&template.url, text, colors));
    request_line.push(Span::styled(
        format!(" {}", template.version.as_str()),
        Style::default().fg(colors.muted),
    ));
    lines.push(Line::from(request_line));

    for header in &template.headers {
        let mut spans = vec![Span::styled(
            format!("{}: ", header.name),
            Style::default().fg(colors.json_key),
        )];
        spans.extend(with_placeholders(&header.value, text, colors));
        lines.push(Line::from(spans));
    }

    if let Some(body) = &template.body {
        lines.push(Line::default());
        match template.body_kind {
            BodyKind::Json => lines.extend(json_lines(body, colors)),
            _ => lines.extend(body.lines().map(|l| Line::from(with_placeholders(l, text, colors)))),
        }
    }

    if let Some(path) = &template.postscript {
        lines.push(Line::default());
        lines.push(Line::styled(
            format!("@postscript {}", path.display()),
            Style::default().fg(colors.muted),
        ));
    }
    lines
}

pub fn render(buf: &mut Buffer, area: Rect, state: &AppState, theme: &Theme) {
    let focused = state.focus.pane == Pane::RequestDetail;
    let title = match state.focus.selected.and_then(|i| state.session.entry(i)) {
        Some(entry) => match &entry.template {
            Ok(template) if template.body.is_some() => format!(" Request · {} ", template.body_kind.label()),
            _ => " Request ".to_string(),
        },
        None => " Request ".to_string(),
    };
    let scroll = state.focus.scroll(Pane::RequestDetail).min(u16::MAX as usize) as u16;
    Paragraph::new(lines(state, theme))
        .block(pane_block(&title, focused, theme))
        .scroll((scroll, 0))
        .render(area, buf);
}
