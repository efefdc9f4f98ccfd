use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::api::rest::dto::ErrorDto;

/// Request body decoded from JSON or from a urlencoded form, chosen by
/// `Content-Type`. An empty body decodes to `T::default()`.
#[derive(Debug, Clone, Default)]
pub struct FormOrJson<T>(pub T);

#[derive(Debug, Error)]
pub enum BodyRejection {
    #[error(transparent)]
    Read(#[from] BytesRejection),
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),
}

impl IntoResponse for BodyRejection {
    fn into_response(self) -> Response {
        match self {
            BodyRejection::Read(inner) => inner.into_response(),
            other => {
                tracing::debug!(error = %other, "rejecting request body");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorDto::new(&other.to_string())),
                )
                    .into_response()
            }
        }
    }
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = BodyRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let json = is_json(&req);
        let bytes = Bytes::from_request(req, state).await?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }

        let value = if json {
            serde_json::from_slice(&bytes)?
        } else {
            serde_urlencoded::from_bytes(&bytes)?
        };
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::dto::{DeleteIssueReq, Scalar};
    use axum::body::Body;

    async fn extract(content_type: Option<&str>, body: &str) -> Result<DeleteIssueReq, StatusCode> {
        let mut builder = Request::builder().method("DELETE").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header(CONTENT_TYPE, ct);
        }
        let req = builder.body(Body::from(body.to_owned())).unwrap();
        FormOrJson::<DeleteIssueReq>::from_request(req, &())
            .await
            .map(|FormOrJson(v)| v)
            .map_err(|e| e.into_response().status())
    }

    #[tokio::test]
    async fn decodes_json_and_form_bodies() {
        let json = extract(Some("application/json; charset=utf-8"), r#"{"_id":"abc"}"#)
            .await
            .unwrap();
        assert_eq!(json.id, Some(Scalar::from("abc")));

        let form = extract(Some("application/x-www-form-urlencoded"), "_id=abc")
            .await
            .unwrap();
        assert_eq!(form.id, Some(Scalar::from("abc")));
    }

    #[tokio::test]
    async fn empty_body_is_default() {
        let req = extract(None, "").await.unwrap();
        assert!(req.id.is_none());
        let req = extract(Some("application/json"), "  ").await.unwrap();
        assert!(req.id.is_none());
    }

    #[tokio::test]
    async fn garbage_json_is_bad_request() {
        let status = extract(Some("application/json"), "{not json").await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
