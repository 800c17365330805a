use std::time::Duration;

use humansize::{DECIMAL, format_size};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use super::highlight::json_lines;
use super::layout::pane_block;
use crate::state::app_state::AppState;
use crate::state::focus::Pane;
use crate::state::response_state::{PostscriptReport, ResponseRecord};
use crate::theme::{Palette, Theme};

pub fn lines(state: &AppState, theme: &Theme) -> Vec<Line<'static>> {
    let colors = &theme.colors;
    let muted = Style::default().fg(colors.muted);
    let Some(entry) = state.focus.selected.and_then(|i| state.session.entry(i)) else {
        return Vec::new();
    };

    if entry.in_flight {
        return vec![Line::styled("Sending…", Style::default().fg(colors.warning))];
    }
    let Some(record) = &entry.response else {
        let hint = if entry.is_sendable() {
            "Press space to send"
        } else {
            "This request cannot be sent"
        };
        return vec![Line::styled(hint, muted)];
    };

    let mut lines = record_lines(record, colors);
    if let Some(report) = &entry.postscript {
        lines.push(Line::default());
        lines.extend(postscript_lines(report, colors));
    }
    lines
}

fn record_lines(record: &ResponseRecord, colors: &Palette) -> Vec<Line<'static>> {
    let muted = Style::default().fg(colors.muted);
    let elapsed = humantime::format_duration(Duration::from_millis(record.elapsed.as_millis() as u64));

    let Some(code) = record.status else {
        let error = record.error.as_deref().unwrap_or("request failed");
        return vec![
            Line::styled(format!("✗ {error}"), Style::default().fg(colors.error)),
            Line::styled(format!("after {elapsed}"), muted),
        ];
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{code} {}", record.status_text),
            Style::default()
                .fg(colors.status(code))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(
                "  ·  {elapsed}  ·  {}  ·  {}",
                format_size(record.size_bytes as u64, DECIMAL),
                record.received_at.format("%H:%M:%S")
            ),
            muted,
        ),
    ])];

    for (name, value) in &record.headers {
        lines.push(Line::from(vec![
            Span::styled(format!("{name}: "), Style::default().fg(colors.json_key)),
            Span::styled(value.clone(), Style::default().fg(colors.text)),
        ]));
    }

    if !record.body.is_empty() {
        lines.push(Line::default());
        let body = record.display_body();
        if serde_json::from_str::<serde_json::Value>(&body).is_ok() {
            lines.extend(json_lines(&body, colors));
        } else {
            lines.extend(body.lines().map(|l| Line::styled(l.to_string(), Style::default().fg(colors.text))));
        }
    }
    lines
}

fn postscript_lines(report: &PostscriptReport, colors: &Palette) -> Vec<Line<'static>> {
    let muted = Style::default().fg(colors.muted);
    let mut lines = vec![Line::styled("── postscript ──", muted)];
    lines.extend(report.output.iter().map(|l| Line::styled(l.clone(), muted)));
    if !report.updated.is_empty() {
        lines.push(Line::styled(format!("set {}", report.updated.join(", ")), muted));
    }
    if let Some(err) = &report.error {
        lines.push(Line::styled(format!("⚠ {err}"), Style::default().fg(colors.warning)));
    }
    lines
}

pub fn render(buf: &mut Buffer, area: Rect, state: &AppState, theme: &Theme) {
    let focused = state.focus.pane == Pane::ResponseDetail;
    let scroll = state.focus.scroll(Pane::ResponseDetail).min(u16::MAX as usize) as u16;
    Paragraph::new(lines(state, theme))
        .block(pane_block(" Response ", focused, theme))
        .scroll((scroll, 0))
        .render(area, buf);
}
