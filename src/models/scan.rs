use serde::{Deserialize, Serialize};

use crate::models::category::FileCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Source,
    Target,
}

impl Role {
    pub const ALL: [Role; 2] = [Self::Source, Self::Target];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    /// Bounded count that answers quickly.
    Fast,
    /// Unbounded refinement issued when the fast count was truncated.
    Full,
}

impl std::fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => f.write_str("fast"),
            Self::Full => f.write_str("full"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub count: u64,
    pub exists: bool,
    #[serde(default)]
    pub truncated: bool,
}

impl ScanOutcome {
    pub const EMPTY_PATH: ScanOutcome = ScanOutcome {
        count: 0,
        exists: true,
        truncated: false,
    };

    pub const UNREACHABLE: ScanOutcome = ScanOutcome {
        count: 0,
        exists: false,
        truncated: false,
    };
}

/// What the UI shows for one directory role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleView {
    pub path: String,
    pub category: FileCategory,
    pub count: u64,
    pub exists: bool,
    /// True while the shown count is a lower bound awaiting a full scan.
    pub refining: bool,
    /// True while no count is known yet for `path`; `count` is then 0.
    #[serde(default)]
    pub scanning: bool,
}

impl Default for RoleView {
    fn default() -> Self {
        Self {
            path: String::new(),
            category: FileCategory::All,
            count: 0,
            exists: true,
            refining: false,
            scanning: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub source: RoleView,
    pub target: RoleView,
}

impl ScanSnapshot {
    pub fn view(&self, role: Role) -> &RoleView {
        match role {
            Role::Source => &self.source,
            Role::Target => &self.target,
        }
    }

    pub fn view_mut(&mut self, role: Role) -> &mut RoleView {
        match role {
            Role::Source => &mut self.source,
            Role::Target => &mut self.target,
        }
    }
}
