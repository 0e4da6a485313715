/// # Logger
/// A side channel for per-instruction trace lines. Nothing in the CPU depends on what a
/// Logger does with them.
pub trait Logger {
    fn log(&mut self, message: &str);

    /// Whether lines handed to `log` go anywhere; callers skip formatting them when they don't.
    fn enabled(&self) -> bool {
        true
    }
}

/// Discards every line.
impl Logger for () {
    fn log(&mut self, _message: &str) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Keeps every line in memory, e.g. to show the last executed instruction in a debugger.
#[derive(Debug, Default)]
pub struct TraceLog {
    lines: Vec<String>,
}

impl TraceLog {
    pub fn new() -> Self {
        TraceLog::default()
    }

    pub fn reset(&mut self) {
        self.lines.clear();
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Logger for TraceLog {
    fn log(&mut self, message: &str) {
        self.lines.push(message.to_owned());
    }
}

/// Forwards every line to the `log` facade at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTracer;

impl Logger for LogTracer {
    fn log(&mut self, message: &str) {
        log::trace!("{}", message);
    }

    fn enabled(&self) -> bool {
        log::log_enabled!(log::Level::Trace)
    }
}

#[cfg(test)]
mod test_logger {
    use super::*;

    #[test]
    fn test_trace_log_keeps_lines() {
        let mut logger = TraceLog::new();
        logger.log("00E0 - CLS");
        logger.log("1200 - JP addr");
        assert_eq!(logger.lines().len(), 2);
        assert_eq!(logger.last(), Some("1200 - JP addr"));
    }

    #[test]
    fn test_only_unit_logger_is_disabled() {
        assert!(!().enabled());
        assert!(TraceLog::new().enabled());
    }

    #[test]
    fn test_trace_log_resets() {
        let mut logger = TraceLog::new();
        logger.log("00E0 - CLS");
        logger.reset();
        assert_eq!(logger.last(), None);
    }
}
