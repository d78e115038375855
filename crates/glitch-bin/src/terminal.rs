//! Raw-mode alternate screen with guaranteed restoration.

use anyhow::Result;
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
    },
};
use std::io::stdout;
use std::sync::atomic::{AtomicBool, Ordering};

static ENTERED: AtomicBool = AtomicBool::new(false);

/// Leaves the alternate screen on drop, including early returns.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter(title: &str) -> Result<Self> {
        enable_raw_mode()?;
        ENTERED.store(true, Ordering::SeqCst);
        execute!(stdout(), EnterAlternateScreen, Hide, SetTitle(title))?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = restore();
    }
}

/// Restore the terminal if a guard entered it. Safe to call twice; the panic
/// hook calls it too.
pub fn restore() -> Result<()> {
    if ENTERED.swap(false, Ordering::SeqCst) {
        execute!(stdout(), LeaveAlternateScreen, Show)?;
        disable_raw_mode()?;
    }
    Ok(())
}
