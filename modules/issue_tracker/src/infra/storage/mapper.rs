use sea_orm::Set;

use crate::contract::model::Issue;
use crate::infra::storage::entity::{ActiveModel, Model};

impl From<Model> for Issue {
    fn from(m: Model) -> Self {
        Self {
            id: m.id.into(),
            project: m.project,
            issue_title: m.issue_title,
            issue_text: m.issue_text,
            created_by: m.created_by,
            assigned_to: m.assigned_to,
            status_text: m.status_text,
            open: m.open,
            created_on: m.created_on,
            updated_on: m.updated_on,
        }
    }
}

impl From<Issue> for ActiveModel {
    fn from(i: Issue) -> Self {
        Self {
            id: Set(i.id.as_uuid()),
            project: Set(i.project),
            issue_title: Set(i.issue_title),
            issue_text: Set(i.issue_text),
            created_by: Set(i.created_by),
            assigned_to: Set(i.assigned_to),
            status_text: Set(i.status_text),
            open: Set(i.open),
            created_on: Set(i.created_on),
            updated_on: Set(i.updated_on),
        }
    }
}
