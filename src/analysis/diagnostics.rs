//! Non-fatal findings surfaced to the caller alongside compiled output

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub chart: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(chart: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            chart: chart.into(),
            message: message.into(),
        }
    }

    pub fn note(chart: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            chart: chart.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [{}] {}", self.severity.name(), self.chart, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let d = Diagnostic::warning("door", "state 'UNKNOWN1' has no name");
        assert_eq!(d.to_string(), "warning: [door] state 'UNKNOWN1' has no name");
        assert!(Diagnostic::note("door", "x").severity < d.severity);
    }
}
