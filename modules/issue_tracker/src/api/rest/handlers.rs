//! Handlers for `/api/issues/{project}`.
//!
//! Every application-level outcome is a 200 with a JSON body; failures are
//! told apart only by the `error` string.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query},
    response::{IntoResponse, Json, Response},
    Extension,
};
use tracing::{debug, error, info};

use crate::api::rest::dto::{
    messages, CreateIssueReq, DeleteIssueReq, ErrorDto, IssueDto, ListIssuesQuery, ResultDto,
    Scalar, UpdateIssueReq,
};
use crate::api::rest::extract::FormOrJson;
use crate::domain::error::DomainError;
use crate::domain::service::Service;

/// Log a failed operation at a level matching its kind.
fn log_failure(op: &str, e: &DomainError) {
    if e.is_store_fault() {
        error!("Failed to {}: {}", op, e);
    } else if e.is_validation() {
        debug!("Rejected {} request: {}", op, e);
    } else {
        info!("Failed to {}: {}", op, e);
    }
}

/// List issues of a project, filtered by any supplied query parameters.
pub async fn list_issues(
    Extension(svc): Extension<Arc<Service>>,
    Path(project): Path<String>,
    query: Result<Query<ListIssuesQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            info!("Rejected query string for '{}': {}", project, e);
            return Json(ErrorDto::new(messages::COULD_NOT_GET)).into_response();
        }
    };
    debug!("Listing issues of '{}' with query: {:?}", project, query);

    match svc.list_issues(&project, query.into()).await {
        Ok(issues) => {
            let dtos: Vec<IssueDto> = issues.into_iter().map(IssueDto::from).collect();
            Json(dtos).into_response()
        }
        Err(e) => {
            log_failure("list issues", &e);
            Json(ErrorDto::new(messages::COULD_NOT_GET)).into_response()
        }
    }
}

/// Create an issue in the project.
pub async fn create_issue(
    Extension(svc): Extension<Arc<Service>>,
    Path(project): Path<String>,
    FormOrJson(req): FormOrJson<CreateIssueReq>,
) -> Response {
    debug!("Creating issue in '{}': {:?}", project, req);

    match svc.create_issue(&project, req.into()).await {
        Ok(issue) => Json(IssueDto::from(issue)).into_response(),
        Err(e) => {
            log_failure("create issue", &e);
            let message = match e {
                DomainError::RequiredFieldsMissing => messages::REQUIRED_MISSING,
                _ => messages::COULD_NOT_CREATE,
            };
            Json(ErrorDto::new(message)).into_response()
        }
    }
}

/// Patch an issue by `_id`. The project segment is not consulted.
pub async fn update_issue(
    Extension(svc): Extension<Arc<Service>>,
    Path(_project): Path<String>,
    FormOrJson(req): FormOrJson<UpdateIssueReq>,
) -> Response {
    debug!("Updating issue: {:?}", req);

    let (raw_id, update) = req.into_parts();
    let echo_id = raw_id.clone().unwrap_or_default();

    match svc.update_issue(raw_id.map(Scalar::into_text), update).await {
        Ok(_) => Json(ResultDto::new(messages::UPDATED, echo_id)).into_response(),
        Err(e) => {
            log_failure("update issue", &e);
            let body = match e {
                DomainError::MissingId => ErrorDto::new(messages::MISSING_ID),
                DomainError::NoUpdateFields { .. } => {
                    ErrorDto::with_id(messages::NO_UPDATE_FIELDS, echo_id)
                }
                _ => ErrorDto::with_id(messages::COULD_NOT_UPDATE, echo_id),
            };
            Json(body).into_response()
        }
    }
}

/// Delete an issue by `_id`. The project segment is not consulted.
pub async fn delete_issue(
    Extension(svc): Extension<Arc<Service>>,
    Path(_project): Path<String>,
    FormOrJson(req): FormOrJson<DeleteIssueReq>,
) -> Response {
    debug!("Deleting issue: {:?}", req);

    let echo_id = req.id.clone().unwrap_or_default();

    match svc.delete_issue(req.id.map(Scalar::into_text)).await {
        Ok(_) => Json(ResultDto::new(messages::DELETED, echo_id)).into_response(),
        Err(e) => {
            log_failure("delete issue", &e);
            let body = match e {
                DomainError::MissingId => ErrorDto::new(messages::MISSING_ID),
                _ => ErrorDto::with_id(messages::COULD_NOT_DELETE, echo_id),
            };
            Json(body).into_response()
        }
    }
}
