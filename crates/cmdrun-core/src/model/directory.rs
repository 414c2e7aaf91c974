use serde::{Deserialize, Serialize};

pub type WorkspaceId = i64;
pub type UserId = i64;

/// A named collection scoping command runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    /// Unique, used by every boundary operation to address the workspace
    pub name: String,
}

/// A user that may trigger command runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}
