use serde::{Deserialize, Serialize};

/// File action recorded by the backend for reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UndoAction {
    Rename,
    Move,
    Delete,
}

impl std::fmt::Display for UndoAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rename => write!(f, "RENAME"),
            Self::Move => write!(f, "MOVE"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

impl std::str::FromStr for UndoAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RENAME" => Ok(Self::Rename),
            "MOVE" => Ok(Self::Move),
            "DELETE" => Ok(Self::Delete),
            _ => Err(format!("unknown undo action: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoChange {
    pub original: String,
    pub new: String,
    pub action: UndoAction,
}

/// One reversible batch of file operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoHistoryEntry {
    pub id: String,
    pub timestamp: String,
    #[serde(default)]
    pub changes: Vec<UndoChange>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub undone_count: u64,
    #[serde(default)]
    pub failed_count: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoAvailability {
    pub available: bool,
    pub latest_operation_id: Option<String>,
    pub entries: Vec<UndoHistoryEntry>,
}

impl UndoAvailability {
    pub fn from_history(entries: Vec<UndoHistoryEntry>) -> Self {
        Self {
            available: !entries.is_empty(),
            latest_operation_id: entries.first().map(|entry| entry.id.clone()),
            entries,
        }
    }
}
