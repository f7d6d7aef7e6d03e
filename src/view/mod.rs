//! Method views: handlers selected by HTTP verb and by which route params are bound.
//!
//! A view type lists its handlers together with a [`HandlerDeclaration`] each
//! (usually through the `#[view]` / `#[methodview]` attributes). The list is
//! compiled once into a [`ViewRegistry`]; [`route_as_view`] mounts the view on
//! one or more axum routes and every request is dispatched to the first
//! handler whose declaration matches.
//!
//! ```rust,ignore
//! use jsontools::prelude::*;
//!
//! pub struct UserView;
//!
//! #[view]
//! impl UserView {
//!     #[methodview("GET", if_not_set = "id")]
//!     async fn list(&self) -> JsonApi<Vec<u32>> {
//!         JsonApi(vec![1, 2, 3])
//!     }
//!
//!     #[methodview("GET", if_set = "id")]
//!     async fn get(&self, id: u32) -> JsonApi<u32> {
//!         JsonApi(id)
//!     }
//! }
//!
//! let router = route_as_view(Router::new(), "user", &["/user/", "/user/{id}"], UserView)?;
//! ```

mod declaration;
mod dispatch;
mod params;
mod registry;
mod restful;

pub use declaration::{HandlerDeclaration, IntoNames};
pub use dispatch::{BoundView, route_as_view, route_as_view_with, rule_params};
pub use params::RouteParams;
pub use registry::{
    Handler, HandlerFuture, HandlerResult, ViewMember, ViewRegistry, ViewRegistryBuilder,
};
pub use restful::RestOperation;

use crate::error::Result;
use std::sync::Arc;

/// A type whose methods are dispatched through a [`ViewRegistry`].
///
/// Implemented by the `#[view]` attribute; implement it by hand with
/// [`ViewRegistry::builder`] for views assembled at runtime.
pub trait MethodView: Send + Sync + Sized + 'static {
    /// Collect the handlers of this view into a registry.
    ///
    /// # Errors
    /// Returns [`JsonToolsError::InvalidDeclaration`](crate::JsonToolsError::InvalidDeclaration)
    /// if any handler declaration can never match.
    fn build_registry() -> Result<ViewRegistry<Self>>;

    /// The registry shared by every mount of this view.
    ///
    /// `#[view]` builds it once per type and caches it; the default builds a
    /// fresh one on every call.
    fn registry() -> Result<Arc<ViewRegistry<Self>>> {
        Self::build_registry().map(Arc::new)
    }
}
