//! Handler behaviour against a scripted repository: store faults, deadlines
//! and the tracing the service layer emits along the way.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing_test::traced_test;

use issue_tracker::api::rest::routes::register_routes;
use issue_tracker::contract::model::{Issue, IssueId};
use issue_tracker::domain::repo::{IssueFilter, IssuePatch, IssuesRepository};
use issue_tracker::domain::service::{Service, ServiceConfig};

#[derive(Clone, Copy)]
enum Behaviour {
    /// Answer immediately; update/delete report a match.
    Healthy,
    /// Every call fails.
    Broken,
    /// Every call sleeps past any reasonable deadline.
    Hanging,
}

struct ScriptedRepo {
    behaviour: Behaviour,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedRepo {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer<T>(&self, op: &'static str, value: T) -> Result<T> {
        self.calls.lock().unwrap().push(op);
        match self.behaviour {
            Behaviour::Healthy => Ok(value),
            Behaviour::Broken => Err(anyhow!("connection reset")),
            Behaviour::Hanging => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(value)
            }
        }
    }
}

#[async_trait::async_trait]
impl IssuesRepository for ScriptedRepo {
    async fn find(&self, _filter: &IssueFilter) -> Result<Vec<Issue>> {
        self.answer("find", Vec::new()).await
    }

    async fn insert(&self, issue: Issue) -> Result<Issue> {
        self.answer("insert", issue).await
    }

    async fn update(&self, _id: IssueId, _patch: IssuePatch) -> Result<bool> {
        self.answer("update", true).await
    }

    async fn delete(&self, _id: IssueId) -> Result<bool> {
        self.answer("delete", true).await
    }
}

fn router_for(repo: Arc<ScriptedRepo>) -> Router {
    let config = ServiceConfig {
        store_timeout: Duration::from_millis(50),
    };
    register_routes(Router::new(), Arc::new(Service::new(repo, config)))
}

async fn call(router: Router, method: &str, uri: &str, body: Option<Value>) -> Value {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn new_issue() -> Value {
    json!({"issue_title": "t", "issue_text": "x", "created_by": "me"})
}

const SOME_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

#[traced_test]
#[tokio::test]
async fn store_faults_map_to_fixed_errors() {
    let repo = ScriptedRepo::new(Behaviour::Broken);
    let router = router_for(repo.clone());

    let list = call(router.clone(), "GET", "/api/issues/p", None).await;
    assert_eq!(list, json!({"error": "could not get issues"}));

    let create = call(router.clone(), "POST", "/api/issues/p", Some(new_issue())).await;
    assert_eq!(create, json!({"error": "could not create issue"}));

    let update = call(
        router.clone(),
        "PUT",
        "/api/issues/p",
        Some(json!({"_id": SOME_ID, "open": false})),
    )
    .await;
    assert_eq!(update, json!({"error": "could not update", "_id": SOME_ID}));

    let delete = call(
        router,
        "DELETE",
        "/api/issues/p",
        Some(json!({"_id": SOME_ID})),
    )
    .await;
    assert_eq!(delete, json!({"error": "could not delete", "_id": SOME_ID}));

    assert_eq!(repo.calls(), vec!["find", "insert", "update", "delete"]);
    assert!(logs_contain("connection reset"));
    assert!(logs_contain("issue_tracker.service.create_issue"));
}

#[traced_test]
#[tokio::test]
async fn slow_store_hits_the_deadline() {
    let repo = ScriptedRepo::new(Behaviour::Hanging);
    let router = router_for(repo);

    let list = call(router.clone(), "GET", "/api/issues/p", None).await;
    assert_eq!(list, json!({"error": "could not get issues"}));

    let create = call(router, "POST", "/api/issues/p", Some(new_issue())).await;
    assert_eq!(create, json!({"error": "could not create issue"}));

    assert!(logs_contain("did not complete within 50 ms"));
}

#[traced_test]
#[tokio::test]
async fn validation_failures_never_reach_the_store() {
    let repo = ScriptedRepo::new(Behaviour::Healthy);
    let router = router_for(repo.clone());

    let create = call(
        router.clone(),
        "POST",
        "/api/issues/p",
        Some(json!({"issue_title": "t", "created_by": "me"})),
    )
    .await;
    assert_eq!(create, json!({"error": "required field(s) missing"}));

    let update = call(
        router.clone(),
        "PUT",
        "/api/issues/p",
        Some(json!({"_id": "", "issue_text": "x"})),
    )
    .await;
    assert_eq!(update, json!({"error": "missing _id"}));

    let update = call(
        router.clone(),
        "PUT",
        "/api/issues/p",
        Some(json!({"_id": SOME_ID})),
    )
    .await;
    assert_eq!(
        update,
        json!({"error": "no update field(s) sent", "_id": SOME_ID})
    );

    // Malformed identifiers and open flags are rejected before the store too.
    let update = call(
        router.clone(),
        "PUT",
        "/api/issues/p",
        Some(json!({"_id": "nope", "issue_text": "x"})),
    )
    .await;
    assert_eq!(update, json!({"error": "could not update", "_id": "nope"}));

    let list = call(router.clone(), "GET", "/api/issues/p?open=maybe", None).await;
    assert_eq!(list, json!({"error": "could not get issues"}));

    let delete = call(router, "DELETE", "/api/issues/p", None).await;
    assert_eq!(delete, json!({"error": "missing _id"}));

    assert!(repo.calls().is_empty());
}

#[traced_test]
#[tokio::test]
async fn open_alone_counts_as_an_update_field() {
    let repo = ScriptedRepo::new(Behaviour::Healthy);
    let router = router_for(repo.clone());

    let update = call(
        router,
        "PUT",
        "/api/issues/p",
        Some(json!({"_id": SOME_ID, "open": "false"})),
    )
    .await;
    assert_eq!(
        update,
        json!({"result": "successfully updated", "_id": SOME_ID})
    );
    assert_eq!(repo.calls(), vec!["update"]);
    assert!(logs_contain("Updated issue with id="));
}

#[traced_test]
#[tokio::test]
async fn successful_create_logs_the_new_id() {
    let repo = ScriptedRepo::new(Behaviour::Healthy);
    let router = router_for(repo);

    let created = call(router, "POST", "/api/issues/p", Some(new_issue())).await;
    let id = created["_id"].as_str().unwrap();

    assert!(logs_contain(&format!("Created issue with id={id}")));
    assert!(logs_contain("project=p"));
}
