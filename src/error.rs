use axum::http::StatusCode;
use strum_macros::IntoStaticStr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JsonToolsError>;

#[derive(Debug, Error, IntoStaticStr)]
pub enum JsonToolsError {
    /// No declared handler accepts this verb with this set of bound route parameters.
    #[error("No view implemented for {verb}({})", params.join(", "))]
    MethodNotSupported {
        view: String,
        verb: String,
        params: Vec<String>,
        allowed: Vec<String>,
    },

    #[error("Invalid declaration for {view}::{handler}: {reason}")]
    InvalidDeclaration {
        view: String,
        handler: String,
        reason: String,
    },

    #[error("Missing route parameter: {name}")]
    MissingParam { name: String },

    #[error("Invalid route parameter {name}={value:?}: {reason}")]
    InvalidParam {
        name: String,
        value: String,
        reason: String,
    },

    /// The request path could not be decoded into route parameters.
    #[error("Invalid request path: {0}")]
    InvalidPath(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl JsonToolsError {
    pub fn invalid_declaration(
        view: impl Into<String>,
        handler: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidDeclaration {
            view: view.into(),
            handler: handler.into(),
            reason: reason.into(),
        }
    }

    /// Variant name, e.g. `"MethodNotSupported"`.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            JsonToolsError::MethodNotSupported { .. } => StatusCode::METHOD_NOT_ALLOWED,
            JsonToolsError::MissingParam { .. }
            | JsonToolsError::InvalidParam { .. }
            | JsonToolsError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            JsonToolsError::InvalidDeclaration { .. }
            | JsonToolsError::Serialization(_)
            | JsonToolsError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for JsonToolsError {
    fn into_response(self) -> axum::response::Response {
        use crate::exception::{ExceptionFilter, http::JsonExceptionFilter};
        JsonExceptionFilter.catch(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_supported_message() {
        let err = JsonToolsError::MethodNotSupported {
            view: "UserView".to_string(),
            verb: "CUSTOM".to_string(),
            params: vec!["id".to_string(), "slug".to_string()],
            allowed: vec!["GET".to_string()],
        };
        assert_eq!(err.to_string(), "No view implemented for CUSTOM(id, slug)");
        assert_eq!(err.name(), "MethodNotSupported");
        assert_eq!(err.status_code(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_status_codes() {
        let missing = JsonToolsError::MissingParam {
            name: "id".to_string(),
        };
        assert_eq!(missing.status_code(), StatusCode::BAD_REQUEST);

        let invalid = JsonToolsError::invalid_declaration("V", "get", "empty verb");
        assert_eq!(invalid.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(invalid.to_string(), "Invalid declaration for V::get: empty verb");
    }
}
