pub mod model;

pub use model::{FlagValue, Issue, IssueId, IssueQuery, IssueUpdate, NewIssue};
