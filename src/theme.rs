use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ratatui::style::Color;
use ratatui::widgets::BorderType;
use serde::Deserialize;

use crate::error::StartupError;

/// Terminal color depth. Every color is reduced to this depth when emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
pub enum ColorMode {
    #[serde(rename = "16")]
    #[value(name = "16")]
    Basic,
    #[serde(rename = "256")]
    #[value(name = "256")]
    Palette,
    #[default]
    #[serde(rename = "truecolor", alias = "24bit")]
    #[value(name = "truecolor", alias = "24bit")]
    TrueColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Single,
    Double,
}

impl BorderStyle {
    pub fn border_type(self) -> BorderType {
        match self {
            BorderStyle::Single => BorderType::Plain,
            BorderStyle::Double => BorderType::Double,
        }
    }
}

// TokyoNight palette
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub title: Color,
    pub border: Color,
    pub border_focused: Color,
    pub text: Color,
    pub muted: Color,
    pub selection: Color,
    pub method: Color,
    pub success: Color,
    pub redirect: Color,
    pub client_error: Color,
    pub server_error: Color,
    pub warning: Color,
    pub error: Color,
    pub json_key: Color,
    pub json_string: Color,
    pub json_number: Color,
    pub placeholder: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            title: Color::Indexed(178),
            border: Color::Rgb(65, 72, 104),
            border_focused: Color::Rgb(122, 162, 247),
            text: Color::Reset,
            muted: Color::Rgb(86, 95, 137),
            selection: Color::Rgb(41, 46, 66),
            method: Color::Rgb(187, 154, 247),
            success: Color::Rgb(158, 206, 106),
            redirect: Color::Rgb(122, 162, 247),
            client_error: Color::Rgb(224, 175, 104),
            server_error: Color::Rgb(247, 118, 142),
            warning: Color::Rgb(224, 175, 104),
            error: Color::Rgb(247, 118, 142),
            json_key: Color::Rgb(125, 207, 255),
            json_string: Color::Rgb(158, 206, 106),
            json_number: Color::Rgb(255, 158, 100),
            placeholder: Color::Rgb(224, 175, 104),
        }
    }
}

impl Palette {
    fn slot(&mut self, key: &str) -> Option<&mut Color> {
        let slot = match key {
            "title" => &mut self.title,
            "border" => &mut self.border,
            "border_focused" => &mut self.border_focused,
            "text" => &mut self.text,
            "muted" => &mut self.muted,
            "selection" => &mut self.selection,
            "method" => &mut self.method,
            "success" => &mut self.success,
            "redirect" => &mut self.redirect,
            "client_error" => &mut self.client_error,
            "server_error" => &mut self.server_error,
            "warning" => &mut self.warning,
            "error" => &mut self.error,
            "json_key" => &mut self.json_key,
            "json_string" => &mut self.json_string,
            "json_number" => &mut self.json_number,
            "placeholder" => &mut self.placeholder,
            _ => return None,
        };
        Some(slot)
    }

    pub fn status(&self, code: u16) -> Color {
        match code {
            200..=299 => self.success,
            300..=399 => self.redirect,
            400..=499 => self.client_error,
            _ => self.server_error,
        }
    }
}

/// On-disk theme file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ThemeFile {
    color_mode: Option<ColorMode>,
    border: Option<BorderStyle>,
    wrap_focus: Option<bool>,
    colors: BTreeMap<String, String>,
}

/// Resolved styling, read-only once the UI starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Theme {
    pub color_mode: ColorMode,
    pub border: BorderStyle,
    pub wrap_focus: bool,
    pub colors: Palette,
}

impl Theme {
    /// Load `path`, or the default theme file if it exists, or the built-in
    /// theme. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Theme, StartupError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_theme_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Theme::default()),
            },
        };
        let text = std::fs::read_to_string(&path).map_err(|source| StartupError::ThemeRead {
            path: path.clone(),
            source,
        })?;
        let theme = Theme::from_toml(&text, &path)?;
        tracing::info!(path = %path.display(), "Theme loaded");
        Ok(theme)
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Theme, StartupError> {
        let file: ThemeFile = toml::from_str(text).map_err(|source| StartupError::ThemeParse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut colors = Palette::default();
        for (key, value) in &file.colors {
            let color = Color::from_str(value.trim()).map_err(|_| StartupError::InvalidColor {
                key: key.clone(),
                value: value.clone(),
            })?;
            match colors.slot(key) {
                Some(slot) => *slot = color,
                None => tracing::warn!(key = %key, "Unknown theme color ignored"),
            }
        }

        Ok(Theme {
            color_mode: file.color_mode.unwrap_or_default(),
            border: file.border.unwrap_or_default(),
            wrap_focus: file.wrap_focus.unwrap_or(false),
            colors,
        })
    }
}

fn default_theme_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("httui").join("theme.toml"))
}

const BASIC: [(Color, (u8, u8, u8)); 16] = [
    (Color::Black, (0, 0, 0)),
    (Color::Red, (205, 0, 0)),
    (Color::Green, (0, 205, 0)),
    (Color::Yellow, (205, 205, 0)),
    (Color::Blue, (0, 0, 238)),
    (Color::Magenta, (205, 0, 205)),
    (Color::Cyan, (0, 205, 205)),
    (Color::Gray, (229, 229, 229)),
    (Color::DarkGray, (127, 127, 127)),
    (Color::LightRed, (255, 0, 0)),
    (Color::LightGreen, (0, 255, 0)),
    (Color::LightYellow, (255, 255, 0)),
    (Color::LightBlue, (92, 92, 255)),
    (Color::LightMagenta, (255, 0, 255)),
    (Color::LightCyan, (0, 255, 255)),
    (Color::White, (255, 255, 255)),
];

const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

impl ColorMode {
    /// Reduce `color` to what this mode can display.
    pub fn adapt(self, color: Color) -> Color {
        match (self, color) {
            (ColorMode::TrueColor, c) => c,
            (ColorMode::Palette, Color::Rgb(r, g, b)) => Color::Indexed(rgb_to_ansi256(r, g, b)),
            (ColorMode::Palette, c) => c,
            (ColorMode::Basic, Color::Rgb(r, g, b)) => nearest_basic((r, g, b)),
            (ColorMode::Basic, Color::Indexed(i)) if i < 16 => BASIC[i as usize].0,
            (ColorMode::Basic, Color::Indexed(i)) => nearest_basic(ansi256_to_rgb(i)),
            (ColorMode::Basic, c) => c,
        }
    }
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    let level = |c: u8| -> u8 {
        match c {
            0..=47 => 0,
            48..=114 => 1,
            _ => (c - 35) / 40,
        }
    };
    let (lr, lg, lb) = (level(r), level(g), level(b));
    let cube_index = 16 + 36 * lr + 6 * lg + lb;
    let cube_rgb = (
        CUBE_LEVELS[lr as usize],
        CUBE_LEVELS[lg as usize],
        CUBE_LEVELS[lb as usize],
    );

    let average = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let gray_step = if average > 238 { 23 } else { average.saturating_sub(3) / 10 };
    let gray = 8 + 10 * gray_step;

    if distance((r, g, b), (gray, gray, gray)) < distance((r, g, b), cube_rgb) {
        232 + gray_step
    } else {
        cube_index
    }
}

fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    match index {
        0..=15 => BASIC[index as usize].1,
        16..=231 => {
            let i = index - 16;
            (
                CUBE_LEVELS[(i / 36) as usize],
                CUBE_LEVELS[((i / 6) % 6) as usize],
                CUBE_LEVELS[(i % 6) as usize],
            )
        }
        _ => {
            let v = 8 + 10 * (index - 232);
            (v, v, v)
        }
    }
}

fn nearest_basic(rgb: (u8, u8, u8)) -> Color {
    BASIC
        .iter()
        .min_by_key(|(_, candidate)| distance(rgb, *candidate))
        .map(|(color, _)| *color)
        .unwrap_or(Color::Reset)
}

fn distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let d = |x: u8, y: u8| (x as i32 - y as i32).pow(2) as u32;
    d(a.0, b.0) + d(a.1, b.1) + d(a.2, b.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let theme = Theme::default();
        assert_eq!(theme.color_mode, ColorMode::TrueColor);
        assert_eq!(theme.border, BorderStyle::Single);
        assert!(!theme.wrap_focus);
        assert_eq!(theme.colors.title, Color::Indexed(178));
    }

    #[test]
    fn test_parse_theme_file() {
        let text = r##"
color_mode = "256"
border = "double"
wrap_focus = true

[colors]
title = "yellow"
border_focused = "#ff8800"
muted = "244"
"##;
        let theme = Theme::from_toml(text, Path::new("theme.toml")).unwrap();
        assert_eq!(theme.color_mode, ColorMode::Palette);
        assert_eq!(theme.border, BorderStyle::Double);
        assert!(theme.wrap_focus);
        assert_eq!(theme.colors.title, Color::Yellow);
        assert_eq!(theme.colors.border_focused, Color::Rgb(255, 136, 0));
        assert_eq!(theme.colors.muted, Color::Indexed(244));
        assert_eq!(theme.colors.error, Palette::default().error);
    }

    #[test]
    fn test_invalid_color_is_a_startup_error() {
        let err = Theme::from_toml("[colors]\ntitle = \"not-a-color\"\n", Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, StartupError::InvalidColor { key, .. } if key == "title"));
    }

    #[test]
    fn test_malformed_file_is_a_startup_error() {
        let err = Theme::from_toml("color_mode = 16\n[[", Path::new("t.toml")).unwrap_err();
        assert!(matches!(err, StartupError::ThemeParse { .. }));
    }

    #[test]
    fn test_missing_explicit_theme_fails() {
        let err = Theme::load(Some(Path::new("/no/such/theme.toml"))).unwrap_err();
        assert!(matches!(err, StartupError::ThemeRead { .. }));
    }

    #[test]
    fn test_palette_mode_maps_rgb_into_the_cube() {
        assert_eq!(ColorMode::Palette.adapt(Color::Rgb(255, 0, 0)), Color::Indexed(196));
        assert_eq!(ColorMode::Palette.adapt(Color::Rgb(0, 0, 0)), Color::Indexed(16));
        assert_eq!(ColorMode::Palette.adapt(Color::Rgb(128, 128, 128)), Color::Indexed(244));
        assert_eq!(ColorMode::Palette.adapt(Color::Blue), Color::Blue);
    }

    #[test]
    fn test_basic_mode_picks_nearest_named_color() {
        assert_eq!(ColorMode::Basic.adapt(Color::Rgb(250, 10, 10)), Color::LightRed);
        assert_eq!(ColorMode::Basic.adapt(Color::Indexed(1)), Color::Red);
        assert_eq!(ColorMode::Basic.adapt(Color::Indexed(178)), Color::Yellow);
        assert_eq!(ColorMode::Basic.adapt(Color::Reset), Color::Reset);
    }

    #[test]
    fn test_truecolor_is_unchanged() {
        let c = Color::Rgb(1, 2, 3);
        assert_eq!(ColorMode::TrueColor.adapt(c), c);
    }
}
