//! Output mode flags and terminal styling shared by the CLI commands.

use serde::Serialize;
use std::io::IsTerminal;
use std::sync::OnceLock;

/// Global output flags, set once from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFlags {
    pub json: bool,
    pub quiet: bool,
    pub no_color: bool,
}

static FLAGS: OnceLock<OutputFlags> = OnceLock::new();

/// Record the global flags. Later calls are ignored.
pub fn set_flags(flags: OutputFlags) {
    let _ = FLAGS.set(flags);
}

fn flags() -> OutputFlags {
    FLAGS.get().copied().unwrap_or_default()
}

pub fn is_json() -> bool {
    flags().json
}

pub fn is_quiet() -> bool {
    flags().quiet
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("  Error: failed to serialize output: {e}"),
    }
}

/// ANSI styling, disabled by `--no-color`, `NO_COLOR`, or when the stream
/// being written is not a terminal.
pub struct Styled {
    color: bool,
}

impl Styled {
    /// Styling for messages written to stderr.
    pub fn new() -> Self {
        Self::for_terminal(std::io::stderr().is_terminal())
    }

    /// Styling for results written to stdout.
    pub fn stdout() -> Self {
        Self::for_terminal(std::io::stdout().is_terminal())
    }

    fn for_terminal(is_terminal: bool) -> Self {
        Self {
            color: color_enabled(
                flags().no_color,
                std::env::var_os("NO_COLOR").is_some(),
                is_terminal,
            ),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn ok_sym(&self) -> String {
        self.paint("32", "✓")
    }

    pub fn warn_sym(&self) -> String {
        self.paint("33", "!")
    }

    pub fn err_sym(&self) -> String {
        self.paint("31", "✗")
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint("1", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }
}

fn color_enabled(no_color_flag: bool, no_color_env: bool, is_terminal: bool) -> bool {
    !no_color_flag && !no_color_env && is_terminal
}

impl Default for Styled {
    fn default() -> Self {
        Self::new()
    }
}
