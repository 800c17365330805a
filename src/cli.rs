use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::http::client::DEFAULT_TIMEOUT;
use crate::theme::{BorderStyle, ColorMode, Theme};

/// Terminal workbench for HTTP requests kept in `.http` files.
#[derive(Parser, Debug, Clone)]
#[command(name = "httui", version, about, long_about = None)]
pub struct Cli {
    /// A `.http` file, or a directory whose `*.http` files are loaded
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Theme file (TOML)
    #[arg(long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Color depth, overriding the theme file
    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Border style, overriding the theme file
    #[arg(long, value_enum)]
    pub border: Option<BorderStyle>,

    /// Let h/l wrap around past the first and last pane
    #[arg(long)]
    pub wrap_focus: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Log file (default: <data dir>/httui/httui.log)
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Print the resolved requests and exit without starting the UI
    #[arg(long)]
    pub dump: bool,
}

impl Cli {
    pub fn timeout(&self) -> Duration {
        self.timeout.map(Duration::from_secs).unwrap_or(DEFAULT_TIMEOUT)
    }

    /// Flags win over the theme file.
    pub fn apply_overrides(&self, theme: &mut Theme) {
        if let Some(mode) = self.color {
            theme.color_mode = mode;
        }
        if let Some(border) = self.border {
            theme.border = border;
        }
        if self.wrap_focus {
            theme.wrap_focus = true;
        }
    }

    pub fn log_file(&self) -> PathBuf {
        match &self.log_file {
            Some(path) => path.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("httui")
                .join("httui.log"),
        }
    }
}
