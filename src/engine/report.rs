//! Report and severity types produced by rules.

/// Severity tiers, ordered from least to most severe.
///
/// The taxonomy is closed: rule bodies pick one of these five tiers and
/// nothing else. `Success` is mostly reserved for qualification rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    Critical,
}

/// All severities, in taxonomy order. Used for bucket iteration.
pub const SEVERITIES: [Severity; 5] = [
    Severity::Info,
    Severity::Success,
    Severity::Warning,
    Severity::Error,
    Severity::Critical,
];

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// Whether a finding of this severity makes the overall run fail.
    pub fn blocks_pass(&self) -> bool {
        matches!(self, Severity::Error | Severity::Critical)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finding yielded by a rule: a severity and a message.
///
/// Reports are immutable. The runner attaches the qualified name of the
/// originating rule when it wraps the report into a [`TaggedReport`],
/// never the rule body itself.
///
/// [`TaggedReport`]: crate::engine::aggregate::TaggedReport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub message: String,
}

impl Report {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn critical(message: impl Into<String>) -> Self {
        Self::new(Severity::Critical, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Success);
        assert!(Severity::Success < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_blocks_pass() {
        assert!(!Severity::Info.blocks_pass());
        assert!(!Severity::Success.blocks_pass());
        assert!(!Severity::Warning.blocks_pass());
        assert!(Severity::Error.blocks_pass());
        assert!(Severity::Critical.blocks_pass());
    }

    #[test]
    fn test_report_constructors() {
        let r = Report::warning("don't do that");
        assert_eq!(r.severity, Severity::Warning);
        assert_eq!(r.message, "don't do that");
    }
}
