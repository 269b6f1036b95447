//! Task domain types

use serde::{Deserialize, Serialize};

/// Which pipeline stage a task belongs to
///
/// The style-analysis flow has two stages: the primary analysis task and an
/// optional avatar generation task announced by the primary result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Primary,
    Avatar,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::Primary, TaskKind::Avatar];
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKind::Primary => write!(f, "primary"),
            TaskKind::Avatar => write!(f, "avatar"),
        }
    }
}

/// Backend-reported task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl TaskStatus {
    /// Returns true once the backend will not report any further change
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Error)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        let status: TaskStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, TaskStatus::Running);
        assert_eq!(serde_json::to_string(&TaskKind::Avatar).unwrap(), "\"avatar\"");
    }
}
