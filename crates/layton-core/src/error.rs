use std::path::PathBuf;
use thiserror::Error;

/// Install hint shown whenever the tracker binary is missing.
pub const BD_INSTALL_HINT: &str = "Install Beads CLI: https://github.com/steveyegge/beads";

#[derive(Debug, Error)]
pub enum LaytonError {
    #[error("{program} CLI not found on PATH")]
    TrackerUnavailable { program: String },

    #[error("epic not configured")]
    NoEpic,

    #[error("errand '{0}' not found")]
    DefinitionNotFound(String),

    #[error("bead '{0}' not found")]
    ItemNotFound(String),

    #[error("already exists: {}", .0.display())]
    DefinitionExists(PathBuf),

    #[error("bd failed: {0}")]
    Tracker(String),

    #[error("invalid JSON variables: {0}")]
    InvalidInput(String),

    #[error("config key not found: {0}")]
    ConfigKeyNotFound(String),

    #[error("invalid name '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidName(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl LaytonError {
    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            LaytonError::TrackerUnavailable { .. } => "BD_UNAVAILABLE",
            LaytonError::NoEpic => "NO_EPIC",
            LaytonError::DefinitionNotFound(_) => "ERRAND_NOT_FOUND",
            LaytonError::ItemNotFound(_) => "BEAD_NOT_FOUND",
            LaytonError::DefinitionExists(_) => "ERRAND_EXISTS",
            LaytonError::Tracker(_) => "BD_ERROR",
            LaytonError::InvalidInput(_) => "INVALID_JSON",
            LaytonError::ConfigKeyNotFound(_) => "KEY_NOT_FOUND",
            LaytonError::InvalidName(_) => "INVALID_NAME",
            LaytonError::Io(_) => "IO_ERROR",
            LaytonError::Json(_) => "JSON_ERROR",
        }
    }

    /// Remediation steps a user can take. Empty when there is nothing to suggest.
    pub fn next_steps(&self) -> Vec<String> {
        match self {
            LaytonError::TrackerUnavailable { .. } => vec![BD_INSTALL_HINT.to_string()],
            LaytonError::NoEpic => {
                vec!["Run 'layton errands epic set <id>' to configure epic".to_string()]
            }
            LaytonError::DefinitionNotFound(_) => {
                vec!["Run 'layton errands' to list available errands".to_string()]
            }
            LaytonError::ItemNotFound(_) => {
                vec!["Check bead ID with 'bd show <id>'".to_string()]
            }
            LaytonError::DefinitionExists(_) => {
                vec!["Review the existing file or choose a different name".to_string()]
            }
            LaytonError::ConfigKeyNotFound(_) => {
                vec!["Run 'layton config keys' to list available keys".to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// Process exit status for this failure. A missing tracker is critical.
    pub fn exit_code(&self) -> i32 {
        match self {
            LaytonError::TrackerUnavailable { .. } => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, LaytonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_is_critical_with_install_hint() {
        let err = LaytonError::TrackerUnavailable {
            program: "bd".to_string(),
        };
        assert_eq!(err.code(), "BD_UNAVAILABLE");
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.next_steps(), vec![BD_INSTALL_HINT.to_string()]);
        assert_eq!(err.to_string(), "bd CLI not found on PATH");
    }

    #[test]
    fn not_found_messages_carry_identifier() {
        assert!(LaytonError::DefinitionNotFound("code-review".into())
            .to_string()
            .contains("code-review"));
        assert!(LaytonError::ItemNotFound("bd-42".into())
            .to_string()
            .contains("bd-42"));
    }

    #[test]
    fn existing_definition_has_stable_code() {
        let err = LaytonError::DefinitionExists(PathBuf::from(".layton/errands/nightly.md"));
        assert_eq!(err.code(), "ERRAND_EXISTS");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("nightly.md"));
    }

    #[test]
    fn tracker_error_forwards_detail_verbatim() {
        let err = LaytonError::Tracker("database locked".into());
        assert_eq!(err.code(), "BD_ERROR");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().ends_with("database locked"));
        assert!(err.next_steps().is_empty());
    }
}
