use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};

/// Raw mode plus the alternate screen, held for as long as the guard lives.
/// Dropping it restores the terminal on every exit path, including errors
/// propagated out of the main loop.
pub struct TerminalGuard {
    stdout: Stdout,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        install_panic_hook();
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        tracing::debug!("Terminal entered raw mode");
        Ok(Self { stdout })
    }

    pub fn writer(&mut self) -> &mut Stdout {
        &mut self.stdout
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        tracing::debug!("Terminal restored");
    }
}

fn restore() {
    let _ = disable_raw_mode();
    let _ = leave_screen(&mut io::stdout());
}

fn leave_screen<W: Write>(out: &mut W) -> io::Result<()> {
    execute!(out, Show, LeaveAlternateScreen)
}

/// A panic unwinds past the guard only after the default hook has printed
/// to a raw-mode screen, so restore first.
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}
