use std::{fmt, io, path::PathBuf};

use crate::lock::LockError;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    IssueNotFound,
    InvalidInput,
    InvalidEnumValue,
    UnsupportedOperation,
    IdSpaceExhausted,
    CorruptSnapshot,
    SnapshotWriteFailed,
    LockContention,
    BridgeUnavailable,
    BridgeFailed,
    BridgeOutputInvalid,
}

impl ErrorCode {
    pub const ALL: [Self; 12] = [
        Self::ConfigParseError,
        Self::IssueNotFound,
        Self::InvalidInput,
        Self::InvalidEnumValue,
        Self::UnsupportedOperation,
        Self::IdSpaceExhausted,
        Self::CorruptSnapshot,
        Self::SnapshotWriteFailed,
        Self::LockContention,
        Self::BridgeUnavailable,
        Self::BridgeFailed,
        Self::BridgeOutputInvalid,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::IssueNotFound => "E2001",
            Self::InvalidInput => "E2002",
            Self::InvalidEnumValue => "E2003",
            Self::UnsupportedOperation => "E2004",
            Self::IdSpaceExhausted => "E3001",
            Self::CorruptSnapshot => "E3002",
            Self::SnapshotWriteFailed => "E5001",
            Self::LockContention => "E5002",
            Self::BridgeUnavailable => "E6001",
            Self::BridgeFailed => "E6002",
            Self::BridgeOutputInvalid => "E6003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::IssueNotFound => "Issue not found",
            Self::InvalidInput => "Invalid input",
            Self::InvalidEnumValue => "Invalid status/type/priority value",
            Self::UnsupportedOperation => "Operation not supported by backend",
            Self::IdSpaceExhausted => "Issue id space exhausted",
            Self::CorruptSnapshot => "Corrupt snapshot file",
            Self::SnapshotWriteFailed => "Snapshot write failed",
            Self::LockContention => "Lock contention",
            Self::BridgeUnavailable => "bd command unavailable",
            Self::BridgeFailed => "bd command failed",
            Self::BridgeOutputInvalid => "Unexpected bd output",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix .beadboard/config.toml or ~/.config/beadboard/config.toml and retry.")
            }
            Self::IssueNotFound => Some("Run `bb list` to see existing issue ids."),
            Self::InvalidInput => None,
            Self::InvalidEnumValue => Some(
                "Statuses: open, in_progress, blocked, closed. Types: bug, feature, task, epic. Priorities: 0-4. Backends: bridge, local.",
            ),
            Self::UnsupportedOperation => {
                Some("Use `bd` directly or switch to the local backend (`--backend local`).")
            }
            Self::IdSpaceExhausted => Some("Archive closed issues or move to a larger id scheme."),
            Self::CorruptSnapshot => {
                Some("Restore .beadboard/issues.json from version control, or remove it to start empty.")
            }
            Self::SnapshotWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `bb` process releases its lock."),
            Self::BridgeUnavailable => {
                Some("Install bd, or point BEADBOARD_BD / [bridge] program at it.")
            }
            Self::BridgeFailed => Some("Run the same bd command by hand to see the full error."),
            Self::BridgeOutputInvalid => Some("Check `bd --version`; a bd with --json support is required."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failures raised by stores and tracker backends.
///
/// The query engine in [`crate::graph`] never produces these.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{backend} backend does not support {operation}")]
    Unsupported {
        backend: &'static str,
        operation: &'static str,
    },

    /// No unused id was found after `attempts` draws.
    #[error("could not allocate an unused issue id after {attempts} attempts")]
    IdSpaceExhausted { attempts: usize },

    #[error("snapshot I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid snapshot JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("lock error: {0}")]
    Lock(#[from] LockError),

    /// The bridge program could not be started at all.
    #[error("failed to run `{program}`: {source}")]
    BridgeSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The bridge program ran and reported failure.
    #[error("{0}")]
    Bridge(String),

    #[error("unexpected bd output: {0}")]
    BridgeOutput(String),
}

impl TrackerError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::IssueNotFound(_) => ErrorCode::IssueNotFound,
            Self::InvalidInput(_) => ErrorCode::InvalidInput,
            Self::Unsupported { .. } => ErrorCode::UnsupportedOperation,
            Self::IdSpaceExhausted { .. } => ErrorCode::IdSpaceExhausted,
            Self::Io(_) => ErrorCode::SnapshotWriteFailed,
            Self::Json { .. } => ErrorCode::CorruptSnapshot,
            Self::Lock(err) => err.code(),
            Self::BridgeSpawn { .. } => ErrorCode::BridgeUnavailable,
            Self::Bridge(_) => ErrorCode::BridgeFailed,
            Self::BridgeOutput(_) => ErrorCode::BridgeOutputInvalid,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorCode, TrackerError};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let mut seen = HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        for code in ErrorCode::ALL {
            let raw = code.code();
            assert_eq!(raw.len(), 5);
            assert!(raw.starts_with('E'));
            assert!(raw.chars().skip(1).all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn tracker_errors_map_to_codes() {
        let missing = TrackerError::IssueNotFound("bd-zzzz".into());
        assert_eq!(missing.code(), ErrorCode::IssueNotFound);
        assert_eq!(missing.to_string(), "issue not found: bd-zzzz");
        assert!(missing.hint().is_some());

        let unsupported = TrackerError::Unsupported {
            backend: "bridge",
            operation: "remove_dependency",
        };
        assert_eq!(unsupported.code().code(), "E2004");
        assert_eq!(
            unsupported.to_string(),
            "bridge backend does not support remove_dependency"
        );
    }

    #[test]
    fn bridge_failure_displays_stderr_verbatim() {
        let err = TrackerError::Bridge("Error: issue bd-1 not found".into());
        assert_eq!(err.to_string(), "Error: issue bd-1 not found");
        assert_eq!(err.code(), ErrorCode::BridgeFailed);
    }
}
