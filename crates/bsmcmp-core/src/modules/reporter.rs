//! Leveled, optionally delayed, color-tagged message sink.
//!
//! While a delay scope is open, messages are queued instead of printed. When
//! the outermost scope closes the queue is flushed only if it holds at least
//! `min_flush` messages (or any forced message), otherwise it is discarded.
//! A lone "checking variable x" line therefore disappears when `x` matched.

use crate::domain::{CmpError, RunMode};
use colored::Colorize;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MIN_FLUSH: usize = 2;

/// Verbosity levels. As a message level, `None` means "always shown".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u8")]
pub enum Level {
    None,
    Error,
    Warn,
    Info,
    Max,
    Auto,
}

impl Level {
    pub const fn index(self) -> u8 {
        match self {
            Self::None => 0,
            Self::Error => 1,
            Self::Warn => 2,
            Self::Info => 3,
            Self::Max => 4,
            Self::Auto => 5,
        }
    }

    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::None),
            1 => Some(Self::Error),
            2 => Some(Self::Warn),
            3 => Some(Self::Info),
            4 => Some(Self::Max),
            5 => Some(Self::Auto),
            _ => None,
        }
    }

    /// `Auto` becomes fully verbose for a single pair and summary-only for a batch.
    pub const fn resolve(self, mode: RunMode) -> Self {
        match (self, mode) {
            (Self::Auto, RunMode::SinglePair) => Self::Max,
            (Self::Auto, RunMode::Batch) => Self::None,
            (level, _) => level,
        }
    }
}

impl TryFrom<u8> for Level {
    type Error = CmpError;

    fn try_from(index: u8) -> Result<Self, CmpError> {
        Self::from_index(index).ok_or_else(|| {
            CmpError::input_validation(
                "INPUT.VERBOSE_LEVEL",
                format!("verbose level {} is outside 0..=5", index),
            )
        })
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "NONE",
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Max => "MAX",
            Self::Auto => "AUTO",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tone {
    Plain,
    Success,
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: Level,
    pub tone: Tone,
    pub text: String,
}

#[derive(Debug)]
enum Sink {
    Console { color: bool },
    Memory(Vec<Message>),
}

#[derive(Debug)]
pub struct Reporter {
    verbosity: Level,
    sink: Sink,
    min_flush: usize,
    delay_depth: usize,
    pending: Vec<Message>,
}

impl Reporter {
    pub fn console(verbosity: Level) -> Self {
        let color = colored::control::SHOULD_COLORIZE.should_colorize();
        Self::with_sink(verbosity, Sink::Console { color })
    }

    /// Keeps emitted messages in memory instead of printing them.
    pub fn captured(verbosity: Level) -> Self {
        Self::with_sink(verbosity, Sink::Memory(Vec::new()))
    }

    fn with_sink(verbosity: Level, sink: Sink) -> Self {
        Self {
            verbosity,
            sink,
            min_flush: DEFAULT_MIN_FLUSH,
            delay_depth: 0,
            pending: Vec::new(),
        }
    }

    pub fn with_min_flush(mut self, min_flush: usize) -> Self {
        self.min_flush = min_flush;
        self
    }

    pub const fn verbosity(&self) -> Level {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: Level) {
        self.verbosity = verbosity;
    }

    pub fn enabled(&self, level: Level) -> bool {
        let active = match self.verbosity {
            Level::Auto => Level::Max,
            level => level,
        };
        let level = match level {
            Level::Auto => Level::Max,
            level => level,
        };
        level.index() <= active.index()
    }

    pub fn emit(&mut self, level: Level, tone: Tone, text: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        let message = Message {
            level,
            tone,
            text: text.into(),
        };
        if self.delay_depth > 0 {
            self.pending.push(message);
        } else {
            self.write(message);
        }
    }

    pub fn echo(&mut self, level: Level, text: impl Into<String>) {
        self.emit(level, Tone::Plain, text);
    }

    pub fn error(&mut self, level: Level, text: impl Into<String>) {
        self.emit(level, Tone::Error, text);
    }

    pub fn warning(&mut self, level: Level, text: impl Into<String>) {
        self.emit(level, Tone::Warning, text);
    }

    pub fn success(&mut self, level: Level, text: impl Into<String>) {
        self.emit(level, Tone::Success, text);
    }

    pub fn begin_delay(&mut self) {
        self.delay_depth += 1;
    }

    /// Closes one delay scope; returns whether queued messages were written.
    pub fn end_delay(&mut self) -> bool {
        if self.delay_depth == 0 {
            return false;
        }
        self.delay_depth -= 1;
        if self.delay_depth > 0 {
            return false;
        }

        let pending = std::mem::take(&mut self.pending);
        let forced = pending.iter().any(|message| message.level == Level::None);
        if pending.len() >= self.min_flush || forced {
            for message in pending {
                self.write(message);
            }
            true
        } else {
            false
        }
    }

    /// Closes every open scope and writes whatever is queued.
    pub fn flush_pending(&mut self) {
        self.delay_depth = 0;
        for message in std::mem::take(&mut self.pending) {
            self.write(message);
        }
    }

    pub const fn delay_depth(&self) -> usize {
        self.delay_depth
    }

    /// Messages written so far by a captured reporter; empty for the console.
    pub fn messages(&self) -> &[Message] {
        match &self.sink {
            Sink::Memory(messages) => messages,
            Sink::Console { .. } => &[],
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|message| message.text.contains(needle))
    }

    fn write(&mut self, message: Message) {
        match &mut self.sink {
            Sink::Memory(messages) => messages.push(message),
            Sink::Console { color: false } => println!("{}", message.text),
            Sink::Console { color: true } => match message.tone {
                Tone::Plain => println!("{}", message.text),
                Tone::Success => println!("{}", message.text.green()),
                Tone::Error => println!("{}", message.text.red()),
                Tone::Warning => println!("{}", message.text.blue()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Level, Reporter, Tone};
    use crate::domain::RunMode;

    #[test]
    fn suppresses_messages_above_active_verbosity() {
        let mut reporter = Reporter::captured(Level::Warn);
        reporter.error(Level::Error, "shown error");
        reporter.warning(Level::Warn, "shown warning");
        reporter.echo(Level::Info, "hidden info");
        reporter.echo(Level::None, "always shown");

        let texts: Vec<_> = reporter.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["shown error", "shown warning", "always shown"]);
        assert_eq!(reporter.messages()[0].tone, Tone::Error);
    }

    #[test]
    fn lone_delayed_message_is_discarded() {
        let mut reporter = Reporter::captured(Level::Max);
        reporter.begin_delay();
        reporter.echo(Level::Error, "/x");
        assert!(!reporter.end_delay());
        assert!(reporter.messages().is_empty());
    }

    #[test]
    fn delayed_cluster_is_flushed_in_order() {
        let mut reporter = Reporter::captured(Level::Max);
        reporter.begin_delay();
        reporter.echo(Level::Error, "/y");
        reporter.error(Level::Error, "    data mismatch");
        assert!(reporter.messages().is_empty());
        assert!(reporter.end_delay());

        let texts: Vec<_> = reporter.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["/y", "    data mismatch"]);
    }

    #[test]
    fn nested_scopes_flush_only_at_outermost_exit() {
        let mut reporter = Reporter::captured(Level::Max);
        reporter.begin_delay();
        reporter.echo(Level::Error, "outer");
        reporter.begin_delay();
        reporter.echo(Level::Error, "inner");
        assert!(!reporter.end_delay());
        assert!(reporter.messages().is_empty());
        assert_eq!(reporter.delay_depth(), 1);
        assert!(reporter.end_delay());
        assert_eq!(reporter.messages().len(), 2);
    }

    #[test]
    fn forced_message_survives_threshold_and_min_flush_is_configurable() {
        let mut reporter = Reporter::captured(Level::None);
        reporter.begin_delay();
        reporter.error(Level::None, "mismatch: a.json");
        assert!(reporter.end_delay());
        assert_eq!(reporter.messages().len(), 1);

        let mut reporter = Reporter::captured(Level::Max).with_min_flush(3);
        reporter.begin_delay();
        reporter.echo(Level::Error, "one");
        reporter.echo(Level::Error, "two");
        assert!(!reporter.end_delay());
    }

    #[test]
    fn auto_resolves_per_run_mode() {
        assert_eq!(Level::Auto.resolve(RunMode::SinglePair), Level::Max);
        assert_eq!(Level::Auto.resolve(RunMode::Batch), Level::None);
        assert_eq!(Level::Info.resolve(RunMode::Batch), Level::Info);
        assert_eq!(Level::try_from(3).expect("3 is valid"), Level::Info);
        assert!(Level::try_from(9).is_err());
    }
}
