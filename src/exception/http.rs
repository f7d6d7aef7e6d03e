use crate::error::JsonToolsError;
use crate::exception::ExceptionFilter;
use axum::{
    Json,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The default exception filter: every error becomes a JSON body
///
/// ```json
/// {
///   "error": { "name": "MethodNotSupported", "title": "Method Not Allowed", "message": "..." },
///   "statusCode": 405,
///   "timestamp": "2024-01-01T00:00:00+00:00"
/// }
/// ```
///
/// `MethodNotSupported` responses also carry an `Allow` header with the
/// verbs the view declares.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExceptionFilter;

impl JsonExceptionFilter {
    /// The JSON body for an error, without the timestamp.
    pub fn error_body(error: &JsonToolsError) -> serde_json::Value {
        let status = error.status_code();
        json!({
            "name": error.name(),
            "title": status.canonical_reason().unwrap_or("Unknown"),
            "message": error.to_string(),
        })
    }
}

impl ExceptionFilter for JsonExceptionFilter {
    fn catch(&self, error: JsonToolsError) -> Response {
        let status = error.status_code();
        if status.is_server_error() {
            tracing::error!(error = %error, "view request failed");
        }

        let mut response = (
            status,
            Json(json!({
                "error": Self::error_body(&error),
                "statusCode": status.as_u16(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
            .into_response();

        if let JsonToolsError::MethodNotSupported { allowed, .. } = &error {
            if let Ok(value) = HeaderValue::from_str(&allowed.join(", ")) {
                response.headers_mut().insert(header::ALLOW, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_method_not_supported_response() {
        let response = JsonExceptionFilter.catch(JsonToolsError::MethodNotSupported {
            view: "rest".to_string(),
            verb: "PATCH".to_string(),
            params: vec!["id".to_string()],
            allowed: vec!["DELETE".to_string(), "GET".to_string()],
        });
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "DELETE, GET");
    }

    #[test]
    fn test_error_body() {
        let body = JsonExceptionFilter::error_body(&JsonToolsError::MissingParam {
            name: "id".to_string(),
        });
        assert_eq!(
            body,
            json!({
                "name": "MissingParam",
                "title": "Bad Request",
                "message": "Missing route parameter: id",
            })
        );
    }

    #[test]
    fn test_invalid_path_is_bad_request() {
        let response = JsonExceptionFilter.catch(JsonToolsError::InvalidPath(
            "Invalid UTF-8 in `id`".to_string(),
        ));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::ALLOW).is_none());
    }

    #[test]
    fn test_closure_filter() {
        let filter = |e: JsonToolsError| (StatusCode::IM_A_TEAPOT, e.to_string()).into_response();
        let response = filter.catch(JsonToolsError::Internal("boom".to_string()));
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
