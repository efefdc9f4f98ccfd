use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contract::model::{FlagValue, Issue, IssueQuery, IssueUpdate, NewIssue};

/// Literal outcome strings; clients match on these exactly.
pub mod messages {
    pub const COULD_NOT_GET: &str = "could not get issues";
    pub const REQUIRED_MISSING: &str = "required field(s) missing";
    pub const COULD_NOT_CREATE: &str = "could not create issue";
    pub const MISSING_ID: &str = "missing _id";
    pub const NO_UPDATE_FIELDS: &str = "no update field(s) sent";
    pub const COULD_NOT_UPDATE: &str = "could not update";
    pub const COULD_NOT_DELETE: &str = "could not delete";
    pub const UPDATED: &str = "successfully updated";
    pub const DELETED: &str = "successfully deleted";
}

/// REST DTO for an issue. `project` is deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDto {
    #[serde(rename = "_id")]
    pub id: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// `open` as it arrives on the wire: JSON may carry a boolean or a number,
/// query strings and forms carry text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpenParam {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// A body scalar for text fields and `_id`. JSON callers may send numbers or
/// booleans; they are stringified before use and echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            other => other.to_string(),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Text(String::new())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_owned())
    }
}

fn text(value: Option<Scalar>) -> Option<String> {
    value.map(Scalar::into_text)
}

/// Query parameters for listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListIssuesQuery {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<OpenParam>,
}

/// Body for POST.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIssueReq {
    pub issue_title: Option<Scalar>,
    pub issue_text: Option<Scalar>,
    pub created_by: Option<Scalar>,
    pub assigned_to: Option<Scalar>,
    pub status_text: Option<Scalar>,
}

/// Body for PUT.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIssueReq {
    #[serde(rename = "_id")]
    pub id: Option<Scalar>,
    pub issue_title: Option<Scalar>,
    pub issue_text: Option<Scalar>,
    pub created_by: Option<Scalar>,
    pub assigned_to: Option<Scalar>,
    pub status_text: Option<Scalar>,
    pub open: Option<OpenParam>,
}

/// Body for DELETE.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteIssueReq {
    #[serde(rename = "_id")]
    pub id: Option<Scalar>,
}

/// `{error, _id?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none", default)]
    pub id: Option<Scalar>,
}

impl ErrorDto {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_owned(),
            id: None,
        }
    }

    pub fn with_id(error: &str, id: impl Into<Scalar>) -> Self {
        Self {
            error: error.to_owned(),
            id: Some(id.into()),
        }
    }
}

/// `{result, _id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDto {
    pub result: String,
    #[serde(rename = "_id")]
    pub id: Scalar,
}

impl ResultDto {
    pub fn new(result: &str, id: impl Into<Scalar>) -> Self {
        Self {
            result: result.to_owned(),
            id: id.into(),
        }
    }
}

// Conversion implementations between REST DTOs and contract models

impl From<Issue> for IssueDto {
    fn from(issue: Issue) -> Self {
        Self {
            id: issue.id.to_string(),
            issue_title: issue.issue_title,
            issue_text: issue.issue_text,
            created_by: issue.created_by,
            assigned_to: issue.assigned_to,
            status_text: issue.status_text,
            open: issue.open,
            created_on: issue.created_on,
            updated_on: issue.updated_on,
        }
    }
}

impl From<OpenParam> for FlagValue {
    fn from(p: OpenParam) -> Self {
        match p {
            OpenParam::Bool(b) => FlagValue::Bool(b),
            OpenParam::Int(n) => FlagValue::Int(n),
            OpenParam::Text(s) => FlagValue::Text(s),
        }
    }
}

impl From<ListIssuesQuery> for IssueQuery {
    fn from(q: ListIssuesQuery) -> Self {
        Self {
            id: q.id,
            issue_title: q.issue_title,
            issue_text: q.issue_text,
            created_by: q.created_by,
            assigned_to: q.assigned_to,
            status_text: q.status_text,
            open: q.open.map(Into::into),
        }
    }
}

impl From<CreateIssueReq> for NewIssue {
    fn from(req: CreateIssueReq) -> Self {
        Self {
            issue_title: text(req.issue_title),
            issue_text: text(req.issue_text),
            created_by: text(req.created_by),
            assigned_to: text(req.assigned_to),
            status_text: text(req.status_text),
        }
    }
}

impl UpdateIssueReq {
    /// Split into the raw id (as sent, for echoing) and the field changes.
    pub fn into_parts(self) -> (Option<Scalar>, IssueUpdate) {
        (
            self.id,
            IssueUpdate {
                issue_title: text(self.issue_title),
                issue_text: text(self.issue_text),
                created_by: text(self.created_by),
                assigned_to: text(self.assigned_to),
                status_text: text(self.status_text),
                open: self.open.map(Into::into),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::IssueId;

    #[test]
    fn issue_dto_hides_project_and_renames_id() {
        let now = Utc::now();
        let id = IssueId::new();
        let dto = IssueDto::from(Issue {
            id,
            project: "apitest".into(),
            issue_title: "t".into(),
            issue_text: "x".into(),
            created_by: "me".into(),
            assigned_to: String::new(),
            status_text: String::new(),
            open: true,
            created_on: now,
            updated_on: now,
        });

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["_id"], id.to_string());
        assert!(json.get("project").is_none());
        assert!(json.get("id").is_none());
        assert_eq!(json.as_object().unwrap().len(), 9);
    }

    #[test]
    fn open_param_accepts_bool_number_and_text() {
        let req: UpdateIssueReq = serde_json::from_str(r#"{"_id":"a","open":false}"#).unwrap();
        assert_eq!(req.open, Some(OpenParam::Bool(false)));

        let req: UpdateIssueReq = serde_json::from_str(r#"{"_id":"a","open":0}"#).unwrap();
        assert_eq!(req.open, Some(OpenParam::Int(0)));

        let req: UpdateIssueReq = serde_urlencoded::from_str("_id=a&open=false").unwrap();
        assert_eq!(req.open, Some(OpenParam::Text("false".into())));

        let q: ListIssuesQuery = serde_urlencoded::from_str("open=true&created_by=Tester").unwrap();
        assert_eq!(q.open, Some(OpenParam::Text("true".into())));
        assert_eq!(q.created_by.as_deref(), Some("Tester"));
    }

    #[test]
    fn scalar_text_fields_are_stringified() {
        let req: CreateIssueReq = serde_json::from_str(
            r#"{"issue_title":"t","issue_text":true,"created_by":"me","assigned_to":5,"status_text":1.5}"#,
        )
        .unwrap();
        let new_issue = NewIssue::from(req);
        assert_eq!(new_issue.issue_text.as_deref(), Some("true"));
        assert_eq!(new_issue.assigned_to.as_deref(), Some("5"));
        assert_eq!(new_issue.status_text.as_deref(), Some("1.5"));

        let req: DeleteIssueReq = serde_json::from_str(r#"{"_id":5}"#).unwrap();
        assert_eq!(req.id, Some(Scalar::Int(5)));
        let json = serde_json::to_value(ResultDto::new(messages::DELETED, Scalar::Int(5))).unwrap();
        assert_eq!(json["_id"], 5);

        let req: DeleteIssueReq = serde_json::from_str(r#"{"_id":null}"#).unwrap();
        assert!(req.id.is_none());
        assert!(serde_json::from_str::<DeleteIssueReq>(r#"{"_id":[1]}"#).is_err());
    }

    #[test]
    fn error_dto_omits_absent_id() {
        let json = serde_json::to_string(&ErrorDto::new(messages::MISSING_ID)).unwrap();
        assert_eq!(json, r#"{"error":"missing _id"}"#);

        let json =
            serde_json::to_string(&ErrorDto::with_id(messages::COULD_NOT_UPDATE, "abc")).unwrap();
        assert_eq!(json, r#"{"error":"could not update","_id":"abc"}"#);
    }
}
