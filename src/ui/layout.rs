use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph, Widget},
};

use super::{request_detail, request_list, response_detail, status_bar};
use crate::state::app_state::AppState;
use crate::state::focus::Pane;
use crate::state::mode::Mode;
use crate::theme::Theme;

pub const TITLE: &str = "HTTP/TUI";

pub fn pane_block(title: &str, focused: bool, theme: &Theme) -> Block<'static> {
    let border_color = if focused {
        theme.colors.border_focused
    } else {
        theme.colors.border
    };
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_type(theme.border.border_type())
        .border_style(Style::default().fg(border_color))
}

/// Draw one full frame into a fresh cell grid.
pub fn compose(state: &AppState, theme: &Theme, width: u16, height: u16) -> Buffer {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);

    let has_banner = !state.session.load_failures.is_empty();
    let mut constraints = vec![Constraint::Length(1)];
    if has_banner {
        constraints.push(Constraint::Length(1));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(1));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    Paragraph::new(TITLE)
        .alignment(Alignment::Center)
        .style(
            Style::default()
                .fg(theme.colors.title)
                .add_modifier(Modifier::BOLD),
        )
        .render(rows[0], &mut buf);

    if has_banner {
        render_banner(&mut buf, rows[1], state, theme);
    }

    let main_area = rows[rows.len() - 2];
    match state.focus.mode {
        Mode::Expanded => match state.focus.pane {
            Pane::ResponseDetail => response_detail::render(&mut buf, main_area, state, theme),
            _ => request_detail::render(&mut buf, main_area, state, theme),
        },
        Mode::Normal => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
                .split(main_area);
            let details = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(columns[1]);

            request_list::render(&mut buf, columns[0], state, theme);
            request_detail::render(&mut buf, details[0], state, theme);
            response_detail::render(&mut buf, details[1], state, theme);
        }
    }

    status_bar::render(&mut buf, rows[rows.len() - 1], state, theme);
    buf
}

fn render_banner(buf: &mut Buffer, area: Rect, state: &AppState, theme: &Theme) {
    let failures = &state.session.load_failures;
    let details: Vec<String> = failures.iter().map(|f| f.describe()).collect();
    let text = format!(
        " ⚠ {} document(s) skipped: {}",
        failures.len(),
        details.join("; ")
    );
    Paragraph::new(text)
        .style(Style::default().fg(theme.colors.warning))
        .render(area, buf);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::document::Document;
    use crate::document::loader::{LoadFailure, LoadReport};
    use crate::document::parser::parse_document;
    use crate::state::session::Session;
    use crate::theme::BorderStyle;

    fn state(failures: Vec<LoadFailure>) -> AppState {
        let text = "&list users\nGET https://example.com/users\nAccept: application/json\n";
        let session = Session::from_report(LoadReport {
            documents: vec![Document {
                path: PathBuf::from("users.http"),
                blocks: parse_document(text).unwrap(),
            }],
            failures,
        });
        AppState::new(session, false)
    }

    fn rows(buf: &Buffer) -> Vec<String> {
        (0..buf.area.height)
            .map(|y| {
                (0..buf.area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn test_normal_layout_shows_all_panes() {
        let state = state(vec![]);
        let buf = compose(&state, &Theme::default(), 100, 20);
        let rows = rows(&buf);

        assert_eq!(rows[0].trim(), TITLE);
        assert_eq!(buf[(46, 0)].fg, Theme::default().colors.title);
        let screen = rows.join("\n");
        assert!(screen.contains("Requests"));
        assert!(screen.contains("list users"));
        assert!(screen.contains("GET https://example.com/users HTTP/1.1"));
        assert!(screen.contains("Press space to send"));
        assert!(rows[19].contains("NORMAL"));
    }

    #[test]
    fn test_expanded_layout_hides_request_list() {
        let mut state = state(vec![]);
        state.focus.move_right();
        state.focus.toggle_expanded();
        let buf = compose(&state, &Theme::default(), 100, 20);
        let screen = rows(&buf).join("\n");

        assert!(!screen.contains("Requests"));
        assert!(screen.contains("Accept: application/json"));
        assert!(screen.contains("EXPANDED"));
    }

    #[test]
    fn test_banner_lists_load_failures() {
        let state = state(vec![LoadFailure {
            path: PathBuf::from("broken.http"),
            reason: "line 2: unknown method 'FETCH'".into(),
        }]);
        let rows = rows(&compose(&state, &Theme::default(), 120, 20));
        assert!(rows[1].contains("broken.http"));
    }

    #[test]
    fn test_double_border_style() {
        let state = state(vec![]);
        let theme = Theme {
            border: BorderStyle::Double,
            ..Theme::default()
        };
        let buf = compose(&state, &theme, 100, 20);
        assert_eq!(buf[(0, 1)].symbol(), "╔");
    }
}
