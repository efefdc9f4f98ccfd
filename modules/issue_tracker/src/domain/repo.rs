use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::contract::model::{Issue, IssueId};

/// Equality constraints for listing. `project` is always applied; every other
/// field constrains the result only when set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueFilter {
    pub project: String,
    pub id: Option<IssueId>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
}

/// Columns to overwrite on update. `updated_on` is always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuePatch {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<bool>,
    pub updated_on: DateTime<Utc>,
}

/// Port for the domain layer: the persistence operations the handler needs.
/// Each operation is exactly one store round-trip.
#[async_trait]
pub trait IssuesRepository: Send + Sync {
    /// All issues matching the filter, in the store's natural order.
    async fn find(&self, filter: &IssueFilter) -> anyhow::Result<Vec<Issue>>;
    /// Persist a fully-formed issue and return the stored representation.
    async fn insert(&self, issue: Issue) -> anyhow::Result<Issue>;
    /// Apply a patch to the issue with this id. Returns false if nothing matched.
    async fn update(&self, id: IssueId, patch: IssuePatch) -> anyhow::Result<bool>;
    /// Delete by id. Returns false if nothing matched.
    async fn delete(&self, id: IssueId) -> anyhow::Result<bool>;
}
