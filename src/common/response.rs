use crate::config::json_config;
use crate::error::Result;
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::ops::Index;

/// Response from a JSON API view
///
/// Keeps the response data as a JSON value until it is rendered, so tests
/// and outer layers can still inspect it.
///
/// # Example
/// ```
/// use jsontools::common::JsonResponse;
/// use jsontools::axum::http::StatusCode;
/// use serde_json::json;
///
/// let response = JsonResponse::new(&json!({"error": "Denied"}))
///     .unwrap()
///     .with_status(StatusCode::FORBIDDEN);
/// assert_eq!(response["error"], "Denied");
/// assert_eq!(response.status(), StatusCode::FORBIDDEN);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonResponse {
    data: Value,
    status: StatusCode,
    headers: HeaderMap,
}

impl JsonResponse {
    /// Serialize `data` into a 200 OK response.
    pub fn new<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        Ok(Self::from_value(serde_json::to_value(data)?))
    }

    pub fn from_value(data: Value) -> Self {
        Self {
            data,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add headers; later values replace earlier ones of the same name.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers {
            if let Some(name) = name {
                self.headers.insert(name, value);
            }
        }
        self
    }

    /// Get the response data object
    pub fn get_json(&self) -> &Value {
        &self.data
    }

    pub fn into_json(self) -> Value {
        self.data
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Render the body, with a two-space indent when `pretty` is set.
    pub fn to_body(&self, pretty: bool) -> Result<Vec<u8>> {
        let body = if pretty {
            serde_json::to_vec_pretty(&self.data)?
        } else {
            serde_json::to_vec(&self.data)?
        };
        Ok(body)
    }
}

/// Proxy to items of the underlying data; missing keys read as `null`.
impl Index<&str> for JsonResponse {
    type Output = Value;

    fn index(&self, key: &str) -> &Value {
        &self.data[key]
    }
}

impl IntoResponse for JsonResponse {
    fn into_response(self) -> Response {
        let body = match self.to_body(json_config().pretty_print) {
            Ok(body) => body,
            Err(e) => return e.into_response(),
        };
        let mut response = (self.status, body).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        response.headers_mut().extend(self.headers);
        response
    }
}

/// Values a view may return to produce a [`JsonResponse`].
///
/// Mirrors the `(data, status, headers)` convention: a bare value, a pair
/// with a status, or a triple with headers.
pub trait IntoJsonResponse {
    fn into_json_response(self) -> Result<JsonResponse>;
}

impl IntoJsonResponse for JsonResponse {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(self)
    }
}

impl IntoJsonResponse for Value {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(JsonResponse::from_value(self))
    }
}

impl IntoJsonResponse for (Value, StatusCode) {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(JsonResponse::from_value(self.0).with_status(self.1))
    }
}

impl IntoJsonResponse for (Value, StatusCode, HeaderMap) {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(JsonResponse::from_value(self.0)
            .with_status(self.1)
            .with_headers(self.2))
    }
}

impl<T: Serialize> IntoJsonResponse for JsonApi<T> {
    fn into_json_response(self) -> Result<JsonResponse> {
        JsonResponse::new(&self.0)
    }
}

impl<T: Serialize> IntoJsonResponse for (JsonApi<T>, StatusCode) {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(self.0.into_json_response()?.with_status(self.1))
    }
}

impl<T: Serialize> IntoJsonResponse for (JsonApi<T>, StatusCode, HeaderMap) {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(self.0.into_json_response()?.with_status(self.1).with_headers(self.2))
    }
}

impl IntoJsonResponse for (JsonResponse, StatusCode) {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(self.0.with_status(self.1))
    }
}

impl IntoJsonResponse for (JsonResponse, StatusCode, HeaderMap) {
    fn into_json_response(self) -> Result<JsonResponse> {
        Ok(self.0.with_status(self.1).with_headers(self.2))
    }
}

/// Make a JsonResponse; an existing JsonResponse is returned unchanged.
pub fn make_json_response<R: IntoJsonResponse>(rv: R) -> Result<JsonResponse> {
    rv.into_json_response()
}

/// Declare a view result as a JSON API value.
///
/// Anything serializable returned as `JsonApi(value)` is rendered as a
/// [`JsonResponse`]; combine with a status as `(StatusCode, JsonApi(value))`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonApi<T>(pub T);

impl<T: Serialize> IntoResponse for JsonApi<T> {
    fn into_response(self) -> Response {
        match self.into_json_response() {
            Ok(response) => response.into_response(),
            Err(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_make_json_response_from_value() {
        let response = make_json_response(json!([1, 2, 3])).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.get_json(), &json!([1, 2, 3]));
    }

    #[test]
    fn test_make_json_response_from_tuples() {
        let created = make_json_response((JsonApi(vec!["a", "b"]), StatusCode::CREATED)).unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        assert_eq!(created.get_json(), &json!(["a", "b"]));

        let mut headers = HeaderMap::new();
        headers.insert("x-id", HeaderValue::from_static("7"));
        let accepted =
            make_json_response((JsonApi(7), StatusCode::ACCEPTED, headers.clone())).unwrap();
        assert_eq!(accepted.status(), StatusCode::ACCEPTED);
        assert_eq!(accepted.headers()["x-id"], "7");

        let existing = JsonResponse::from_value(json!({"ok": true}));
        let gone = make_json_response((existing, StatusCode::GONE, headers)).unwrap();
        assert_eq!(gone.status(), StatusCode::GONE);
        assert_eq!(gone["ok"], true);
        assert_eq!(gone.headers()["x-id"], "7");
    }

    #[test]
    fn test_make_json_response_with_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-total", HeaderValue::from_static("3"));

        let response =
            make_json_response((json!({"error": "Denied"}), StatusCode::FORBIDDEN, headers)).unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response["error"], "Denied");
        assert_eq!(response["missing"], Value::Null);
        assert_eq!(response.headers()["x-total"], "3");
    }

    #[test]
    fn test_existing_response_passes_through() {
        let original = JsonResponse::from_value(json!(true)).with_status(StatusCode::CREATED);
        let response = make_json_response(original.clone()).unwrap();
        assert_eq!(response, original);
    }

    #[test]
    fn test_pretty_body() {
        let response = JsonResponse::new(&json!({"a": 1})).unwrap();
        assert_eq!(response.to_body(false).unwrap(), br#"{"a":1}"#);
        assert_eq!(
            String::from_utf8(response.to_body(true).unwrap()).unwrap(),
            "{\n  \"a\": 1\n}"
        );
    }

    #[test]
    fn test_into_response_sets_content_type() {
        let mut headers = HeaderMap::new();
        headers.insert("x-extra", HeaderValue::from_static("1"));
        let response = JsonApi(vec!["a", "b"])
            .into_json_response()
            .unwrap()
            .with_headers(headers)
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(response.headers()["x-extra"], "1");
    }
}
