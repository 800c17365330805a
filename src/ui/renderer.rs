//! Diffing terminal writer. Each frame is a complete cell grid; only the
//! cells that differ from the previous frame are written out.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color as TermColor, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use ratatui::buffer::Buffer;
use ratatui::style::{Color, Modifier};
use unicode_width::UnicodeWidthStr;

use crate::theme::ColorMode;

pub struct Renderer<W: Write> {
    out: W,
    previous: Option<Buffer>,
    color_mode: ColorMode,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, color_mode: ColorMode) -> Self {
        Self {
            out,
            previous: None,
            color_mode,
        }
    }

    /// Forget the previous frame, so the next draw clears and repaints.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Write the cells of `frame` that changed since the last draw and
    /// return how many were written.
    pub fn draw(&mut self, frame: Buffer) -> io::Result<usize> {
        let previous = match self.previous.take() {
            Some(previous) if previous.area == frame.area => previous,
            _ => {
                queue!(self.out, SetAttribute(Attribute::Reset), Clear(ClearType::All))?;
                Buffer::empty(frame.area)
            }
        };

        let changes = previous.diff(&frame);
        let count = changes.len();

        let mut fg = Color::Reset;
        let mut bg = Color::Reset;
        let mut modifier = Modifier::empty();
        let mut cursor: Option<(u16, u16)> = None;

        for (x, y, cell) in changes {
            if cursor != Some((x, y)) {
                queue!(self.out, MoveTo(x, y))?;
            }
            if cell.modifier != modifier {
                // Attribute::Reset also resets colors, so re-emit them.
                queue!(self.out, SetAttribute(Attribute::Reset))?;
                for attribute in attributes(cell.modifier) {
                    queue!(self.out, SetAttribute(attribute))?;
                }
                modifier = cell.modifier;
                fg = Color::Reset;
                bg = Color::Reset;
            }
            if cell.fg != fg {
                let color = self.term_color(cell.fg);
                queue!(self.out, SetForegroundColor(color))?;
                fg = cell.fg;
            }
            if cell.bg != bg {
                let color = self.term_color(cell.bg);
                queue!(self.out, SetBackgroundColor(color))?;
                bg = cell.bg;
            }
            queue!(self.out, Print(cell.symbol()))?;
            let width = cell.symbol().width().max(1) as u16;
            cursor = Some((x.saturating_add(width), y));
        }

        if count > 0 {
            queue!(
                self.out,
                SetForegroundColor(TermColor::Reset),
                SetBackgroundColor(TermColor::Reset),
                SetAttribute(Attribute::Reset)
            )?;
        }
        self.out.flush()?;
        self.previous = Some(frame);
        Ok(count)
    }

    fn term_color(&self, color: Color) -> TermColor {
        to_term_color(self.color_mode.adapt(color))
    }
}

fn attributes(modifier: Modifier) -> Vec<Attribute> {
    [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ]
    .into_iter()
    .filter(|(flag, _)| modifier.contains(*flag))
    .map(|(_, attribute)| attribute)
    .collect()
}

fn to_term_color(color: Color) -> TermColor {
    match color {
        Color::Reset => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::Gray => TermColor::Grey,
        Color::DarkGray => TermColor::DarkGrey,
        Color::LightRed => TermColor::Red,
        Color::LightGreen => TermColor::Green,
        Color::LightYellow => TermColor::Yellow,
        Color::LightBlue => TermColor::Blue,
        Color::LightMagenta => TermColor::Magenta,
        Color::LightCyan => TermColor::Cyan,
        Color::White => TermColor::White,
        Color::Indexed(i) => TermColor::AnsiValue(i),
        Color::Rgb(r, g, b) => TermColor::Rgb { r, g, b },
    }
}

#[cfg(test)]
mod tests {
    use ratatui::layout::Rect;
    use ratatui::style::Style;

    use super::*;

    fn frame(text: &str) -> Buffer {
        let mut buf = Buffer::empty(Rect::new(0, 0, 10, 2));
        buf.set_string(0, 0, text, Style::default().fg(Color::Rgb(255, 0, 0)));
        buf
    }

    fn output(renderer: &mut Renderer<Vec<u8>>) -> String {
        String::from_utf8(std::mem::take(&mut renderer.out)).unwrap()
    }

    #[test]
    fn test_first_frame_clears_and_paints() {
        let mut renderer = Renderer::new(Vec::new(), ColorMode::TrueColor);
        let written = renderer.draw(frame("hello")).unwrap();
        assert_eq!(written, 5);

        let out = output(&mut renderer);
        assert!(out.contains("\x1b[2J"));
        assert!(out.contains("\x1b[38;2;255;0;0m"));
        assert!(out.contains("hello"));
    }

    #[test]
    fn test_identical_frame_writes_nothing() {
        let mut renderer = Renderer::new(Vec::new(), ColorMode::TrueColor);
        renderer.draw(frame("hello")).unwrap();
        output(&mut renderer);

        assert_eq!(renderer.draw(frame("hello")).unwrap(), 0);
        assert!(output(&mut renderer).is_empty());
    }

    #[test]
    fn test_only_changed_cells_are_written() {
        let mut renderer = Renderer::new(Vec::new(), ColorMode::TrueColor);
        renderer.draw(frame("hello")).unwrap();
        output(&mut renderer);

        assert_eq!(renderer.draw(frame("help!")).unwrap(), 2);
        let out = output(&mut renderer);
        assert!(out.starts_with("\x1b[1;4H"));
        assert!(out.contains("p!"));
        assert!(!out.contains("hel"));
    }

    #[test]
    fn test_combining_mark_occupies_one_column() {
        let mut renderer = Renderer::new(Vec::new(), ColorMode::TrueColor);
        renderer.draw(frame("aYb")).unwrap();
        output(&mut renderer);

        assert_eq!(renderer.draw(frame("e\u{301}Yc")).unwrap(), 2);
        let out = output(&mut renderer);
        let accent = out.find("e\u{301}").unwrap();
        let jump = out.find("\x1b[1;3Hc").unwrap();
        assert!(accent < jump);
    }

    #[test]
    fn test_invalidate_forces_full_repaint() {
        let mut renderer = Renderer::new(Vec::new(), ColorMode::TrueColor);
        renderer.draw(frame("hello")).unwrap();
        renderer.invalidate();
        output(&mut renderer);

        assert_eq!(renderer.draw(frame("hello")).unwrap(), 5);
        assert!(output(&mut renderer).contains("\x1b[2J"));
    }

    #[test]
    fn test_colors_are_reduced_to_the_color_mode() {
        let mut renderer = Renderer::new(Vec::new(), ColorMode::Palette);
        renderer.draw(frame("x")).unwrap();
        assert!(output(&mut renderer).contains("\x1b[38;5;196m"));

        let mut renderer = Renderer::new(Vec::new(), ColorMode::Basic);
        renderer.draw(frame("x")).unwrap();
        let out = output(&mut renderer);
        assert!(out.contains("\x1b[38;5;9m"));
        assert!(!out.contains("38;2;"));
    }
}
