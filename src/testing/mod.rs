//! In-process test client for JSON APIs.
//!
//! Requests go straight through the router with [`tower::ServiceExt::oneshot`];
//! responses come back with their body parsed as JSON when it is JSON.

use crate::error::{JsonToolsError, Result};
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use serde_json::Value;
use std::ops::Index;
use tower::ServiceExt;

/// A response captured by [`JsonClient`].
#[derive(Debug, Clone)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    json: Option<Value>,
}

impl TestResponse {
    /// The parsed body, `None` unless the response is `application/json`.
    pub fn get_json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Items of the parsed JSON body; `null` when missing or not JSON.
impl Index<&str> for TestResponse {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        static NULL: Value = Value::Null;
        match &self.json {
            Some(json) => &json[key],
            None => &NULL,
        }
    }
}

/// Test client that sends JSON bodies and decodes JSON responses.
///
/// # Example
/// ```
/// use jsontools::testing::JsonClient;
/// use jsontools::axum::{Router, routing::get};
/// use jsontools::JsonApi;
///
/// # async fn run() -> jsontools::Result<()> {
/// let app = Router::new().route("/", get(|| async { JsonApi(vec![1, 2, 3]) }));
/// let response = JsonClient::new(app).get("/").await?;
/// assert_eq!(response.get_json(), Some(&serde_json::json!([1, 2, 3])));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JsonClient {
    router: Router,
}

impl JsonClient {
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Send a request. A JSON body is serialized with a JSON content type;
    /// an empty `method` means POST when a body is given and GET otherwise.
    pub async fn open(&self, method: &str, path: &str, json: Option<&Value>) -> Result<TestResponse> {
        let method = match (method, json) {
            ("", Some(_)) => Method::POST,
            ("", None) => Method::GET,
            (verb, _) => Method::from_bytes(verb.as_bytes())
                .map_err(|e| JsonToolsError::Internal(format!("invalid method {verb:?}: {e}")))?,
        };

        let mut builder = Request::builder().method(method).uri(path);
        let body = match json {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(value)?)
            }
            None => Body::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|e| JsonToolsError::Internal(format!("invalid request: {e}")))?;

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| JsonToolsError::Internal(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|e| JsonToolsError::Internal(format!("failed to read body: {e}")))?;

        let is_json = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));
        let json = if is_json && !body.is_empty() {
            Some(serde_json::from_slice(&body)?)
        } else {
            None
        };

        Ok(TestResponse {
            status,
            headers,
            body,
            json,
        })
    }

    pub async fn get(&self, path: &str) -> Result<TestResponse> {
        self.open("GET", path, None).await
    }

    pub async fn post(&self, path: &str, json: Option<&Value>) -> Result<TestResponse> {
        self.open("POST", path, json).await
    }

    pub async fn put(&self, path: &str, json: Option<&Value>) -> Result<TestResponse> {
        self.open("PUT", path, json).await
    }

    pub async fn patch(&self, path: &str, json: Option<&Value>) -> Result<TestResponse> {
        self.open("PATCH", path, json).await
    }

    pub async fn delete(&self, path: &str) -> Result<TestResponse> {
        self.open("DELETE", path, None).await
    }
}
