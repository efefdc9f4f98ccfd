use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque, globally unique issue identifier. Rendered as a hyphenated UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssueId(Uuid);

impl IssueId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for IssueId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for IssueId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for IssueId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

/// Pure issue model (no serde). `project` never leaves the service boundary
/// through the REST layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: IssueId,
    pub project: String,
    pub issue_title: String,
    pub issue_text: String,
    pub created_by: String,
    pub assigned_to: String,
    pub status_text: String,
    pub open: bool,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

/// Creation input exactly as supplied by the caller; the service decides what counts as present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewIssue {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
}

/// Partial update input as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueUpdate {
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<FlagValue>,
}

/// List filters as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IssueQuery {
    pub id: Option<String>,
    pub issue_title: Option<String>,
    pub issue_text: Option<String>,
    pub created_by: Option<String>,
    pub assigned_to: Option<String>,
    pub status_text: Option<String>,
    pub open: Option<FlagValue>,
}

/// A raw value for the `open` flag: JSON bodies may carry a boolean or a
/// number, query strings and forms always carry text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FlagValue {
    /// Coerce to a boolean. Accepted spellings: `true`/`1`/`yes` and
    /// `false`/`0`/`no`; anything else is `None`.
    pub fn to_bool(&self) -> Option<bool> {
        match self {
            FlagValue::Bool(b) => Some(*b),
            FlagValue::Int(1) => Some(true),
            FlagValue::Int(0) => Some(false),
            FlagValue::Int(_) => None,
            FlagValue::Text(s) => match s.as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(b) => write!(f, "{b}"),
            FlagValue::Int(n) => write!(f, "{n}"),
            FlagValue::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_spellings() {
        for (raw, expected) in [
            ("true", Some(true)),
            ("1", Some(true)),
            ("yes", Some(true)),
            ("false", Some(false)),
            ("0", Some(false)),
            ("no", Some(false)),
            ("TRUE", None),
            ("", None),
            ("maybe", None),
        ] {
            assert_eq!(FlagValue::Text(raw.into()).to_bool(), expected, "{raw:?}");
        }
        assert_eq!(FlagValue::Bool(false).to_bool(), Some(false));
        assert_eq!(FlagValue::Int(1).to_bool(), Some(true));
        assert_eq!(FlagValue::Int(2).to_bool(), None);
    }

    #[test]
    fn issue_id_text_form() {
        let id = IssueId::new();
        let parsed: IssueId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("5f1d7f0e0000000000000000".parse::<IssueId>().is_err());
    }
}
