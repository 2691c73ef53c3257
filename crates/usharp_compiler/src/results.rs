//! Compiler message log

use std::fmt;

/// Severity of a compiler message
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

/// One message produced while compiling a blueprint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerMessage {
    pub severity: Severity,
    pub text: String,
}

impl fmt::Display for CompilerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}: {}", label, self.text)
    }
}

/// Messages collected while compiling one blueprint
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompilerResultsLog {
    messages: Vec<CompilerMessage>,
    num_warnings: usize,
    num_errors: usize,
}

impl CompilerResultsLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&mut self, text: impl Into<String>) {
        self.push(Severity::Note, text.into());
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.num_warnings += 1;
        self.push(Severity::Warning, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.num_errors += 1;
        self.push(Severity::Error, text.into());
    }

    fn push(&mut self, severity: Severity, text: String) {
        self.messages.push(CompilerMessage { severity, text });
    }

    pub fn messages(&self) -> &[CompilerMessage] {
        &self.messages
    }

    pub fn num_warnings(&self) -> usize {
        self.num_warnings
    }

    pub fn num_errors(&self) -> usize {
        self.num_errors
    }

    pub fn has_errors(&self) -> bool {
        self.num_errors > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_severity() {
        let mut log = CompilerResultsLog::new();
        log.note("compiling");
        log.warning("unused variable");
        log.error("missing parent");
        log.error("missing function");

        assert_eq!(log.messages().len(), 4);
        assert_eq!(log.num_warnings(), 1);
        assert_eq!(log.num_errors(), 2);
        assert!(log.has_errors());
        assert_eq!(log.messages()[2].to_string(), "error: missing parent");
    }
}
