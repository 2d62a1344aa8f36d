//! Output sink seam for command results and progress.

/// Receives everything a command prints. Levels default to plain lines and
/// progress reporting defaults to nothing.
pub trait OutputSink {
    fn write_line(&mut self, line: &str);

    fn newline(&mut self) {
        self.write_line("");
    }

    fn success(&mut self, message: &str) {
        self.write_line(message);
    }

    fn warning(&mut self, message: &str) {
        self.write_line(message);
    }

    fn error(&mut self, message: &str) {
        self.write_line(message);
    }

    /// Unordered list, one ` - item` line per entry.
    fn list(&mut self, items: &[String]) {
        for item in items {
            self.write_line(&format!(" - {item}"));
        }
    }

    fn progress_start(&mut self, _total: usize) {}

    fn progress_advance(&mut self) {}

    fn progress_finish(&mut self) {}
}

/// Level a buffered line was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Plain,
    Success,
    Warning,
    Error,
}

/// Collects output in memory.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub entries: Vec<(Level, String)>,
    pub progress_total: Option<usize>,
    pub progress_steps: usize,
    pub progress_finished: bool,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line in write order, regardless of level.
    pub fn lines(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, line)| line.as_str()).collect()
    }

    pub fn at(&self, level: Level) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.as_str())
            .collect()
    }

    fn push(&mut self, level: Level, line: &str) {
        self.entries.push((level, line.to_string()));
    }
}

impl OutputSink for BufferSink {
    fn write_line(&mut self, line: &str) {
        self.push(Level::Plain, line);
    }

    fn success(&mut self, message: &str) {
        self.push(Level::Success, message);
    }

    fn warning(&mut self, message: &str) {
        self.push(Level::Warning, message);
    }

    fn error(&mut self, message: &str) {
        self.push(Level::Error, message);
    }

    fn progress_start(&mut self, total: usize) {
        self.progress_total = Some(total);
    }

    fn progress_advance(&mut self) {
        self.progress_steps += 1;
    }

    fn progress_finish(&mut self) {
        self.progress_finished = true;
    }
}
