use proc_macro::TokenStream;

mod declaration;
mod view;

/// Attribute macro turning an impl block into a method view
///
/// Methods carrying `#[methodview(...)]` become handlers. Methods named
/// `list`, `create`, `get`, `replace`, `update` or `delete` become members
/// that are dispatched as REST operations once a primary key is set.
///
/// Handler arguments after `&self` are read from the route params by name:
/// `T` must be bound, `Option<T>` may be unbound, and a `RouteParams`
/// argument receives all of them. Leading underscores are ignored, so `_id`
/// reads `id`. A handler returning `Result` has its error
/// converted into `JsonToolsError`.
///
/// The registry of a non-generic view is built on the first call to
/// `MethodView::registry` and shared afterwards.
///
/// # Arguments
/// - `primary_key = "id"` or `["a", "b"]`
/// - `extends = Parent`: inherit the handlers of `Parent`; the view must
///   implement `AsRef<Parent>`
/// - `disable = "name"` or `[..]`: drop inherited handlers
/// - `name = "..."`: registry name, the type name by default
///
/// # Example
/// ```ignore
/// use jsontools::{methodview, view, JsonApi};
///
/// pub struct RestView;
///
/// #[view(primary_key = "id")]
/// impl RestView {
///     fn list(&self) -> JsonApi<Vec<u32>> {
///         JsonApi(vec![1, 2, 3])
///     }
///
///     fn get(&self, id: u32) -> JsonApi<u32> {
///         JsonApi(id)
///     }
///
///     #[methodview("CUSTOM", if_set = "id")]
///     async fn custom(&self, id: u32) -> &'static str {
///         ":)"
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn view(attr: TokenStream, item: TokenStream) -> TokenStream {
    view::view_attribute(attr, item)
}

/// Declares a view handler: the verbs it serves and which route params must
/// be set (`if_set`) or unset (`if_not_set`)
///
/// Read by `#[view]`; on its own it only checks its arguments.
///
/// # Example
/// ```ignore
/// #[methodview("GET", if_not_set = "id")]
/// fn list(&self) -> JsonApi<Vec<User>> { ... }
///
/// #[methodview(["PUT", "PATCH"], if_set = ["org", "id"])]
/// async fn save(&self, org: String, id: u32) -> JsonApi<User> { ... }
///
/// // any verb, no param constraints
/// #[methodview]
/// fn fallback(&self) -> JsonApi<()> { ... }
/// ```
#[proc_macro_attribute]
pub fn methodview(attr: TokenStream, item: TokenStream) -> TokenStream {
    declaration::methodview_attribute(attr, item)
}
