//! The transaction log shown on the dashboard.
//!
//! Entries are rendered once, word-wrapped to the panel width, and kept in a
//! bounded history so the panel can be redrawn. Every entry is mirrored to
//! `tracing` at debug level under the `activity` target, so it reaches a
//! `--log-file` transcript without being printed a second time on stderr.

use std::{collections::VecDeque, io::Write};

use colored::{ColoredString, Colorize};
use parking_lot::Mutex;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

/// Rendered lines kept for redraws.
pub const HISTORY_LIMIT: usize = 500;
pub const DEFAULT_WIDTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Bridge,
    System,
    Error,
    Success,
    Warning,
    Info,
}

impl LogKind {
    const ALL: [LogKind; 6] = [
        LogKind::Bridge,
        LogKind::System,
        LogKind::Error,
        LogKind::Success,
        LogKind::Warning,
        LogKind::Info,
    ];

    fn label(self) -> &'static str {
        match self {
            LogKind::Bridge => "[BRIDGE]",
            LogKind::System => "[SYSTEM]",
            LogKind::Error => "[ERROR]",
            LogKind::Success => "[SUCCESS]",
            LogKind::Warning => "[WARNING]",
            LogKind::Info => "[INFO]",
        }
    }

    fn colored_label(self) -> ColoredString {
        let label = self.label();
        match self {
            LogKind::Bridge => label.magenta(),
            LogKind::System => label.normal(),
            LogKind::Error => label.red(),
            LogKind::Success => label.green(),
            LogKind::Warning => label.yellow(),
            LogKind::Info => label.cyan(),
        }
    }

    fn label_width() -> usize {
        Self::ALL
            .iter()
            .map(|kind| kind.label().len())
            .max()
            .unwrap_or_default()
    }
}

struct Inner {
    lines: VecDeque<String>,
    entries: VecDeque<(LogKind, String)>,
}

pub struct ActivityLog {
    width: usize,
    echo: bool,
    offset: UtcOffset,
    inner: Mutex<Inner>,
}

impl ActivityLog {
    /// A log that prints every rendered line to stdout as it is recorded.
    pub fn new(width: usize) -> Self {
        Self::with_echo(width, true)
    }

    /// A log that only records; used where nothing should reach the terminal.
    pub fn silent(width: usize) -> Self {
        Self::with_echo(width, false)
    }

    fn with_echo(width: usize, echo: bool) -> Self {
        Self {
            width,
            echo,
            offset: UtcOffset::UTC,
            inner: Mutex::new(Inner {
                lines: VecDeque::with_capacity(HISTORY_LIMIT),
                entries: VecDeque::with_capacity(HISTORY_LIMIT),
            }),
        }
    }

    /// Timestamps entries in `offset` instead of UTC.
    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn push(&self, kind: LogKind, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "activity", kind = kind.label(), "{message}");

        let timestamp = clock(OffsetDateTime::now_utc(), self.offset);
        let lines = render(kind, &message, &timestamp, self.width);
        let mut inner = self.inner.lock();
        if self.echo {
            let mut stdout = std::io::stdout().lock();
            for line in &lines {
                let _ = writeln!(stdout, "{line}");
            }
        }
        inner.lines.extend(lines);
        while inner.lines.len() > HISTORY_LIMIT {
            inner.lines.pop_front();
        }
        inner.entries.push_back((kind, message));
        while inner.entries.len() > HISTORY_LIMIT {
            inner.entries.pop_front();
        }
    }

    pub fn bridge(&self, message: impl Into<String>) {
        self.push(LogKind::Bridge, message)
    }

    pub fn system(&self, message: impl Into<String>) {
        self.push(LogKind::System, message)
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(LogKind::Error, message)
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(LogKind::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(LogKind::Warning, message)
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(LogKind::Info, message)
    }

    pub fn clear(&self) {
        {
            let mut inner = self.inner.lock();
            inner.lines.clear();
            inner.entries.clear();
        }
        self.system("Transaction logs cleared.");
    }

    /// Rendered history, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.inner.lock().lines.iter().cloned().collect()
    }

    /// Raw entries recorded since the last clear, at most [`HISTORY_LIMIT`].
    pub fn entries(&self) -> Vec<(LogKind, String)> {
        self.inner.lock().entries.iter().cloned().collect()
    }
}

fn clock(now: OffsetDateTime, offset: UtcOffset) -> String {
    now.to_offset(offset)
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default()
}

/// Renders one entry as `[time] LABEL message`, continuation lines indented
/// under the message column.
fn render(kind: LogKind, message: &str, timestamp: &str, width: usize) -> Vec<String> {
    let pad = " ".repeat(LogKind::label_width() - kind.label().len());
    let prefix = format!("[{timestamp}] {}{pad} ", kind.colored_label());
    let plain_prefix_len = timestamp.len() + 3 + LogKind::label_width() + 1;
    let wrap_width = width.saturating_sub(plain_prefix_len).max(1);

    let mut wrapped = word_wrap(message, wrap_width).into_iter();
    let first = wrapped.next().unwrap_or_default();
    let indent = " ".repeat(plain_prefix_len);
    std::iter::once(format!("{prefix}{first}"))
        .chain(wrapped.map(|line| format!("{indent}{line}")))
        .collect()
}

/// Greedy word wrap. Words wider than `max_width` are split hard.
pub fn word_wrap(text: &str, max_width: usize) -> Vec<String> {
    if max_width == 0 || text.chars().count() <= max_width {
        return vec![text.to_owned()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        let word_len = word.chars().count();
        if word_len > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(max_width).peekable();
            while let Some(chunk) = chunks.next() {
                if chunks.peek().is_some() {
                    lines.push(chunk.iter().collect());
                } else {
                    current = chunk.iter().collect();
                }
            }
        } else if current.is_empty() {
            current = word.to_owned();
        } else if current.chars().count() + 1 + word_len > max_width {
            lines.push(std::mem::replace(&mut current, word.to_owned()));
        } else {
            current.push(' ');
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
