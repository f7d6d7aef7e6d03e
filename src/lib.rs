//! # jsontools
//!
//! JSON API tools for axum.
//!
//! ## Features
//!
//! - **Method views**: one view type per resource. Each request goes to the
//!   handler declared for its HTTP verb and for the route params it binds
//! - **REST views**: set a primary key and `list`/`create`/`get`/`replace`/
//!   `update`/`delete` are routed without further declarations
//! - **View inheritance**: derived views reuse, override or disable the
//!   handlers of a parent view
//! - **JSON responses**: `JsonApi`, `JsonResponse` and JSON error bodies
//! - **Model formatting**: serialize only the loaded attributes of a model
//! - **Test client**: drive a `Router` in-process with JSON bodies
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jsontools::prelude::*;
//!
//! pub struct RestView;
//!
//! #[view(primary_key = "id")]
//! impl RestView {
//!     fn list(&self) -> JsonApi<Vec<u32>> {
//!         JsonApi(vec![1, 2, 3])
//!     }
//!
//!     fn get(&self, id: u32) -> JsonApi<u32> {
//!         JsonApi(id)
//!     }
//!
//!     #[methodview("CUSTOM", if_set = "id")]
//!     fn custom(&self, id: u32) -> &'static str {
//!         ":)"
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     tracing_subscriber::fmt::init();
//!     jsontools::config::install(JsonConfig::from_env());
//!
//!     let app = route_as_view(Router::new(), "rest", &["/api/", "/api/{id}"], RestView)?;
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod common;
pub mod config;
pub mod error;
pub mod exception;
pub mod formatting;
pub mod testing;
pub mod view;

// Re-export core types
pub use common::{IntoJsonResponse, JsonApi, JsonResponse, make_json_response};
pub use error::{JsonToolsError, Result};
pub use view::{
    BoundView, Handler, HandlerDeclaration, HandlerFuture, HandlerResult, IntoNames, MethodView,
    RestOperation, RouteParams, ViewMember, ViewRegistry, ViewRegistryBuilder, route_as_view,
    route_as_view_with,
};

// Re-export macros
pub use jsontools_macro::{methodview, view};

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use jsontools::prelude::*;
/// ```
pub mod prelude {
    pub use crate::common::{IntoJsonResponse, JsonApi, JsonResponse, make_json_response};
    pub use crate::config::{ConfigService, JsonConfig};
    pub use crate::error::{JsonToolsError, Result};
    pub use crate::exception::ExceptionFilter;
    pub use crate::exception::http::JsonExceptionFilter;
    pub use crate::formatting::{EntityState, JsonSerializable, SerializedModel};
    pub use crate::view::{
        HandlerDeclaration, MethodView, RestOperation, RouteParams, ViewRegistry, route_as_view,
        route_as_view_with,
    };
    pub use crate::{methodview, view};
    pub use axum::{
        Router,
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
