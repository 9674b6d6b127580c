//! Calendar types shared by the materializer, deletion and the manager.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CadenceError;
use crate::occurrence::OccurrenceId;

// ============================================================================
// Deletion Types
// ============================================================================

/// How much of a recurring group a deletion removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    /// Only the targeted occurrence.
    This,
    /// The targeted occurrence and every later one in its group.
    Future,
    /// The whole group, root included.
    All,
}

impl DeleteScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteScope::This => "this",
            DeleteScope::Future => "future",
            DeleteScope::All => "all",
        }
    }
}

impl FromStr for DeleteScope {
    type Err = CadenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "this" => Ok(DeleteScope::This),
            "future" => Ok(DeleteScope::Future),
            "all" => Ok(DeleteScope::All),
            other => Err(CadenceError::InvalidScope(other.to_string())),
        }
    }
}

impl fmt::Display for DeleteScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionReport {
    /// Scope actually applied. `future` on a group root runs as `all`.
    pub scope: DeleteScope,
    /// Rows removed, the target included.
    pub deleted: usize,
    /// Child promoted to group root, if the old root was removed alone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promoted: Option<OccurrenceId>,
}

impl DeletionReport {
    pub fn new(scope: DeleteScope) -> Self {
        Self {
            scope,
            deleted: 0,
            promoted: None,
        }
    }
}

// ============================================================================
// Materialization Types
// ============================================================================

/// Outcome of a materialization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializationReport {
    /// Group roots examined.
    pub roots_processed: usize,
    /// Ids of the children created by this pass.
    pub created: Vec<OccurrenceId>,
}

impl MaterializationReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}
