use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument};

use crate::contract::model::{FlagValue, Issue, IssueId, IssueQuery, IssueUpdate, NewIssue};
use crate::domain::error::DomainError;
use crate::domain::repo::{IssueFilter, IssuePatch, IssuesRepository};

/// Domain service for the issue resource.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn IssuesRepository>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upper bound for a single store call.
    pub store_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_millis(5000),
        }
    }
}

/// A text field counts as supplied only when it is non-empty.
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn coerce_open(value: Option<FlagValue>) -> Result<Option<bool>, DomainError> {
    value
        .map(|flag| {
            flag.to_bool()
                .ok_or_else(|| DomainError::invalid_open_flag(flag.to_string()))
        })
        .transpose()
}

fn parse_id(raw: &str) -> Result<IssueId, DomainError> {
    raw.parse().map_err(|_| DomainError::malformed_id(raw))
}

impl Service {
    pub fn new(repo: Arc<dyn IssuesRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// Run one store call under the configured deadline.
    async fn bounded<T, F>(&self, op: &'static str, call: F) -> Result<T, DomainError>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        match tokio::time::timeout(self.config.store_timeout, call).await {
            Ok(result) => result.map_err(|e| DomainError::database(format!("{e:#}"))),
            Err(_) => Err(DomainError::timeout(op, self.config.store_timeout)),
        }
    }

    #[instrument(name = "issue_tracker.service.list_issues", skip(self, query), fields(project = %project))]
    pub async fn list_issues(
        &self,
        project: &str,
        query: IssueQuery,
    ) -> Result<Vec<Issue>, DomainError> {
        debug!("Listing issues");

        let filter = IssueFilter {
            project: project.to_owned(),
            id: supplied(query.id).as_deref().map(parse_id).transpose()?,
            issue_title: supplied(query.issue_title),
            issue_text: supplied(query.issue_text),
            created_by: supplied(query.created_by),
            assigned_to: supplied(query.assigned_to),
            status_text: supplied(query.status_text),
            open: coerce_open(query.open)?,
        };

        let issues = self.bounded("find", self.repo.find(&filter)).await?;
        debug!("Listed {} issues", issues.len());
        Ok(issues)
    }

    #[instrument(name = "issue_tracker.service.create_issue", skip(self, new_issue), fields(project = %project))]
    pub async fn create_issue(
        &self,
        project: &str,
        new_issue: NewIssue,
    ) -> Result<Issue, DomainError> {
        debug!("Creating issue");

        let (Some(issue_title), Some(issue_text), Some(created_by)) = (
            supplied(new_issue.issue_title),
            supplied(new_issue.issue_text),
            supplied(new_issue.created_by),
        ) else {
            return Err(DomainError::RequiredFieldsMissing);
        };

        let now = Utc::now();
        let issue = Issue {
            id: IssueId::new(),
            project: project.to_owned(),
            issue_title,
            issue_text,
            created_by,
            assigned_to: new_issue.assigned_to.unwrap_or_default(),
            status_text: new_issue.status_text.unwrap_or_default(),
            open: true,
            created_on: now,
            updated_on: now,
        };

        let saved = self.bounded("insert", self.repo.insert(issue)).await?;
        info!("Created issue with id={}", saved.id);
        Ok(saved)
    }

    /// Validation order: id present, at least one field, then id/flag coercion.
    /// Empty text fields are ignored; `open` counts whenever it is present.
    #[instrument(name = "issue_tracker.service.update_issue", skip(self, update))]
    pub async fn update_issue(
        &self,
        raw_id: Option<String>,
        update: IssueUpdate,
    ) -> Result<IssueId, DomainError> {
        debug!("Updating issue");

        let raw_id = supplied(raw_id).ok_or(DomainError::MissingId)?;

        let issue_title = supplied(update.issue_title);
        let issue_text = supplied(update.issue_text);
        let created_by = supplied(update.created_by);
        let assigned_to = supplied(update.assigned_to);
        let status_text = supplied(update.status_text);

        if issue_title.is_none()
            && issue_text.is_none()
            && created_by.is_none()
            && assigned_to.is_none()
            && status_text.is_none()
            && update.open.is_none()
        {
            return Err(DomainError::no_update_fields(raw_id));
        }

        let id = parse_id(&raw_id)?;
        let patch = IssuePatch {
            issue_title,
            issue_text,
            created_by,
            assigned_to,
            status_text,
            open: coerce_open(update.open)?,
            updated_on: Utc::now(),
        };

        if !self.bounded("update", self.repo.update(id, patch)).await? {
            return Err(DomainError::not_found(id));
        }

        info!("Updated issue with id={}", id);
        Ok(id)
    }

    #[instrument(name = "issue_tracker.service.delete_issue", skip(self))]
    pub async fn delete_issue(&self, raw_id: Option<String>) -> Result<IssueId, DomainError> {
        debug!("Deleting issue");

        let raw_id = supplied(raw_id).ok_or(DomainError::MissingId)?;
        let id = parse_id(&raw_id)?;

        if !self.bounded("delete", self.repo.delete(id)).await? {
            return Err(DomainError::not_found(id));
        }

        info!("Deleted issue with id={}", id);
        Ok(id)
    }
}
