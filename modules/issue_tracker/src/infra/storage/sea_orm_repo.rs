//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it works with a `DatabaseConnection`
//! or a transaction handle.

use anyhow::Context;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter};

use crate::contract::model::{Issue, IssueId};
use crate::domain::repo::{IssueFilter, IssuePatch, IssuesRepository};
use crate::infra::storage::entity::{ActiveModel as IssueAM, Column, Entity as IssueEntity};

pub struct SeaOrmIssuesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmIssuesRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

fn filter_condition(filter: &IssueFilter) -> Condition {
    let mut cond = Condition::all().add(Column::Project.eq(filter.project.as_str()));
    if let Some(id) = filter.id {
        cond = cond.add(Column::Id.eq(id.as_uuid()));
    }
    for (column, value) in [
        (Column::IssueTitle, &filter.issue_title),
        (Column::IssueText, &filter.issue_text),
        (Column::CreatedBy, &filter.created_by),
        (Column::AssignedTo, &filter.assigned_to),
        (Column::StatusText, &filter.status_text),
    ] {
        if let Some(v) = value {
            cond = cond.add(column.eq(v.as_str()));
        }
    }
    if let Some(open) = filter.open {
        cond = cond.add(Column::Open.eq(open));
    }
    cond
}

#[async_trait::async_trait]
impl<C> IssuesRepository for SeaOrmIssuesRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find(&self, filter: &IssueFilter) -> anyhow::Result<Vec<Issue>> {
        let rows = IssueEntity::find()
            .filter(filter_condition(filter))
            .all(&self.conn)
            .await
            .context("find issues failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, issue: Issue) -> anyhow::Result<Issue> {
        let model = IssueAM::from(issue)
            .insert(&self.conn)
            .await
            .context("insert issue failed")?;
        Ok(model.into())
    }

    async fn update(&self, id: IssueId, patch: IssuePatch) -> anyhow::Result<bool> {
        // One UPDATE ... WHERE id = ? statement; no read-modify-write.
        let mut stmt = IssueEntity::update_many()
            .col_expr(Column::UpdatedOn, Expr::value(patch.updated_on));
        for (column, value) in [
            (Column::IssueTitle, patch.issue_title),
            (Column::IssueText, patch.issue_text),
            (Column::CreatedBy, patch.created_by),
            (Column::AssignedTo, patch.assigned_to),
            (Column::StatusText, patch.status_text),
        ] {
            if let Some(v) = value {
                stmt = stmt.col_expr(column, Expr::value(v));
            }
        }
        if let Some(open) = patch.open {
            stmt = stmt.col_expr(Column::Open, Expr::value(open));
        }

        let res = stmt
            .filter(Column::Id.eq(id.as_uuid()))
            .exec(&self.conn)
            .await
            .context("update issue failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, id: IssueId) -> anyhow::Result<bool> {
        let res = IssueEntity::delete_by_id(id.as_uuid())
            .exec(&self.conn)
            .await
            .context("delete issue failed")?;
        Ok(res.rows_affected > 0)
    }
}
