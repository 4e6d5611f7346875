//! Project domain model (the canonical protected entity)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// user ID
    pub project_manager: String,
    /// user IDs
    #[serde(default)]
    pub team: Vec<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, name: impl Into<String>, project_manager: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            project_manager: project_manager.into(),
            team: Vec::new(),
        }
    }

    pub fn with_team<I, S>(mut self, team: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.team = team.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_managed_by(&self, user_id: &str) -> bool {
        self.project_manager == user_id
    }

    pub fn has_team_member(&self, user_id: &str) -> bool {
        self.team.iter().any(|id| id == user_id)
    }
}
