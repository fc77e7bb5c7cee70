use serde::{Deserialize, Serialize};

/// Pipeline stage identifiers, in fixed pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Setup,
    Preview,
    Summary,
    Standardize,
    Deduplicate,
    Filename,
    Group,
    Transfer,
}

impl StepId {
    pub const ALL: [StepId; 8] = [
        Self::Setup,
        Self::Preview,
        Self::Summary,
        Self::Standardize,
        Self::Deduplicate,
        Self::Filename,
        Self::Group,
        Self::Transfer,
    ];

    /// Steps that can be toggled, run, and consolidated.
    pub const PROCESSING: [StepId; 5] = [
        Self::Standardize,
        Self::Deduplicate,
        Self::Filename,
        Self::Group,
        Self::Transfer,
    ];

    pub fn is_structural(self) -> bool {
        matches!(self, Self::Setup | Self::Preview | Self::Summary)
    }

    /// Position in the processing order, `None` for structural steps.
    pub fn pipeline_rank(self) -> Option<usize> {
        Self::PROCESSING.iter().position(|id| *id == self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Preview => "preview",
            Self::Summary => "summary",
            Self::Standardize => "standardize",
            Self::Deduplicate => "deduplicate",
            Self::Filename => "filename",
            Self::Group => "group",
            Self::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown step id: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    #[default]
    Pending,
    Success,
    Error,
}

/// One file's before/after name and outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub original: String,
    pub new: String,
    #[serde(default)]
    pub status: ChangeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileChange {
    pub fn new(original: impl Into<String>, new: impl Into<String>, status: ChangeStatus) -> Self {
        Self {
            original: original.into(),
            new: new.into(),
            status,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: StepId,
    pub enabled: bool,
    pub status: StepStatus,
    pub results: Vec<FileChange>,
    pub error: Option<String>,
}

impl Step {
    pub fn new(id: StepId, enabled: bool) -> Self {
        Self {
            id,
            enabled,
            status: StepStatus::Idle,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn reset(&mut self) {
        self.status = StepStatus::Idle;
        self.results.clear();
        self.error = None;
    }
}
