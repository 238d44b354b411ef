//! Where user-facing messages go.

use parking_lot::Mutex;
use std::io::Write;

/// Output sink for notifications and tips.
pub trait UiSink: Send + Sync {
    fn warning(&self, text: &str);
    fn info(&self, text: &str);
    /// Informational text shown in green.
    fn success(&self, text: &str);
}

/// Terminal output: warnings on stderr in yellow, everything else on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleUi {
    pub color: bool,
}

impl ConsoleUi {
    const YELLOW: &'static str = "\x1b[33m";
    const GREEN: &'static str = "\x1b[32m";
    const RESET: &'static str = "\x1b[0m";

    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.color {
            format!("{color}{text}{}", Self::RESET)
        } else {
            text.to_string()
        }
    }
}

impl UiSink for ConsoleUi {
    fn warning(&self, text: &str) {
        let _ = writeln!(std::io::stderr(), "{}", self.paint(Self::YELLOW, text));
    }

    fn info(&self, text: &str) {
        let _ = writeln!(std::io::stdout(), "{text}");
    }

    fn success(&self, text: &str) {
        let _ = writeln!(std::io::stdout(), "{}", self.paint(Self::GREEN, text));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiLevel {
    Warning,
    Info,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiLine {
    pub level: UiLevel,
    pub text: String,
}

/// Captures emitted lines in memory.
#[derive(Debug, Default)]
pub struct RecordingUi {
    lines: Mutex<Vec<UiLine>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<UiLine> {
        self.lines.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines.lock().iter().map(|line| line.text.clone()).collect()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    fn push(&self, level: UiLevel, text: &str) {
        self.lines.lock().push(UiLine {
            level,
            text: text.to_string(),
        });
    }
}

impl UiSink for RecordingUi {
    fn warning(&self, text: &str) {
        self.push(UiLevel::Warning, text);
    }

    fn info(&self, text: &str) {
        self.push(UiLevel::Info, text);
    }

    fn success(&self, text: &str) {
        self.push(UiLevel::Success, text);
    }
}
