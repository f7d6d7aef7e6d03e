use crate::error::{JsonToolsError, Result};
use crate::exception::ExceptionFilter;
use crate::exception::http::JsonExceptionFilter;
use crate::view::MethodView;
use crate::view::params::RouteParams;
use crate::view::registry::{HandlerResult, ViewRegistry};
use axum::extract::Path;
use axum::extract::rejection::PathRejection;
use axum::http::Method;
use axum::response::Response;
use axum::routing::any;
use axum::Router;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// A view instance paired with its registry, ready to serve requests.
pub struct BoundView<V> {
    name: Arc<str>,
    view: Arc<V>,
    registry: Arc<ViewRegistry<V>>,
}

impl<V> Clone for BoundView<V> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            view: Arc::clone(&self.view),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<V: MethodView> BoundView<V> {
    /// Bind `view` to the registry of `V`.
    pub fn new(name: impl Into<String>, view: V) -> Result<Self> {
        Ok(Self::from_parts(name, Arc::new(view), V::registry()?))
    }

    pub fn from_parts(name: impl Into<String>, view: Arc<V>, registry: Arc<ViewRegistry<V>>) -> Self {
        Self {
            name: Arc::from(name.into()),
            view,
            registry,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn registry(&self) -> &ViewRegistry<V> {
        &self.registry
    }

    /// Run the handler matching `verb` and the bound names of `params`.
    ///
    /// # Errors
    /// [`JsonToolsError::MethodNotSupported`] when no handler matches, or
    /// whatever the handler itself fails with.
    pub async fn dispatch_request(&self, verb: &str, params: RouteParams) -> HandlerResult {
        self.registry.dispatch(&self.view, verb, params).await
    }

    async fn respond(
        self,
        filter: Arc<dyn ExceptionFilter>,
        method: Method,
        params: Result<RouteParams>,
    ) -> Response {
        let result = match params {
            Ok(params) => self.dispatch_request(method.as_str(), params).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(view = %self.name, verb = %method, error = %e, "view dispatch failed");
                filter.catch(e)
            }
        }
    }
}

/// Names of the params captured by an axum route rule, e.g. `/a/{id}/{*rest}`.
pub fn rule_params(rule: &str) -> Vec<String> {
    rule.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| name.trim_start_matches('*').to_string())
        .collect()
}

/// Mount `view` on every rule in `rules`, answering errors with JSON bodies.
///
/// See [`route_as_view_with`].
pub fn route_as_view<V, S>(router: Router<S>, name: &str, rules: &[&str], view: V) -> Result<Router<S>>
where
    V: MethodView,
    S: Clone + Send + Sync + 'static,
{
    route_as_view_with(router, name, rules, view, Arc::new(JsonExceptionFilter))
}

/// Mount `view` on every rule in `rules`.
///
/// The registry of `V` is fetched here, so declaration errors surface at
/// startup. Each rule accepts every verb; verbs without a matching handler
/// are answered by `filter` with the `MethodNotSupported` error, and so are
/// paths that cannot be decoded, with `InvalidPath`. Params
/// captured by a sibling rule but not by the matched one are passed unbound.
pub fn route_as_view_with<V, S>(
    mut router: Router<S>,
    name: &str,
    rules: &[&str],
    view: V,
    filter: Arc<dyn ExceptionFilter>,
) -> Result<Router<S>>
where
    V: MethodView,
    S: Clone + Send + Sync + 'static,
{
    let bound = BoundView::new(name, view)?;

    let mut seen = BTreeSet::new();
    for rule in rules {
        if !rule.starts_with('/') {
            return Err(JsonToolsError::invalid_declaration(
                name,
                *rule,
                "route rule must start with '/'",
            ));
        }
        if !seen.insert(*rule) {
            return Err(JsonToolsError::invalid_declaration(name, *rule, "duplicate route rule"));
        }
    }

    let known: Arc<Vec<String>> = Arc::new(
        rules
            .iter()
            .flat_map(|rule| rule_params(rule))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    );

    for rule in rules {
        let view = bound.clone();
        let filter = Arc::clone(&filter);
        let known = Arc::clone(&known);

        let route = if rule_params(rule).is_empty() {
            any(move |method: Method| {
                let params = RouteParams::from_path(known.iter().map(String::as_str), HashMap::new());
                view.clone().respond(Arc::clone(&filter), method, Ok(params))
            })
        } else {
            any(
                move |method: Method, path: std::result::Result<Path<HashMap<String, String>>, PathRejection>| {
                    let params = path
                        .map(|Path(values)| RouteParams::from_path(known.iter().map(String::as_str), values))
                        .map_err(|rejection| JsonToolsError::InvalidPath(rejection.body_text()));
                    view.clone().respond(Arc::clone(&filter), method, params)
                },
            )
        };

        tracing::debug!(view = %name, rule = %rule, "routed method view");
        router = router.route(rule, route);
    }

    Ok(router)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::declaration::HandlerDeclaration;
    use crate::view::registry::HandlerFuture;
    use axum::response::IntoResponse;

    struct Echo {
        greeting: String,
    }

    fn hello(view: &Echo, params: RouteParams) -> HandlerFuture<'_> {
        Box::pin(async move {
            let id = params.required::<u32>("id")?;
            Ok::<_, JsonToolsError>(format!("{} {}", view.greeting, id).into_response())
        })
    }

    impl MethodView for Echo {
        fn build_registry() -> Result<ViewRegistry<Self>> {
            ViewRegistry::builder("Echo")
                .handler(
                    "hello",
                    HandlerDeclaration::new().verbs("GET").requires_present("id"),
                    hello,
                )
                .build()
        }
    }

    #[test]
    fn test_rule_params() {
        assert!(rule_params("/api/").is_empty());
        assert_eq!(rule_params("/api/{id}"), vec!["id"]);
        assert_eq!(rule_params("/org/{org}/user/{id}/{*rest}"), vec!["org", "id", "rest"]);
    }

    #[tokio::test]
    async fn test_bound_view_dispatch() {
        let bound = BoundView::new("echo", Echo { greeting: "hi".to_string() }).unwrap();
        assert_eq!(bound.name(), "echo");

        let ok = bound
            .dispatch_request("GET", RouteParams::new().with("id", "5"))
            .await
            .unwrap();
        assert_eq!(ok.status(), axum::http::StatusCode::OK);

        let err = bound
            .dispatch_request("GET", RouteParams::new().with_unbound("id"))
            .await
            .unwrap_err();
        assert!(matches!(err, JsonToolsError::MethodNotSupported { .. }));

        let bad = bound
            .dispatch_request("GET", RouteParams::new().with("id", "five"))
            .await
            .unwrap_err();
        assert!(matches!(bad, JsonToolsError::InvalidParam { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_path_goes_through_filter() {
        use crate::testing::JsonClient;

        let router = route_as_view(
            Router::new(),
            "echo",
            &["/echo/{id}"],
            Echo { greeting: "hi".to_string() },
        )
        .unwrap();
        let client = JsonClient::new(router);

        let rv = client.get("/echo/%FF").await.unwrap();
        assert_eq!(rv.status, axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(rv.headers["content-type"], "application/json");
        assert_eq!(rv["error"]["name"], "InvalidPath");
        assert_eq!(rv["statusCode"], 400);

        let rv = client.get("/echo/7").await.unwrap();
        assert_eq!(rv.text(), "hi 7");
    }

    #[test]
    fn test_route_as_view_rejects_bad_rules() {
        let relative = route_as_view(
            Router::<()>::new(),
            "echo",
            &["api/{id}"],
            Echo { greeting: String::new() },
        );
        assert!(matches!(relative, Err(JsonToolsError::InvalidDeclaration { .. })));

        let duplicate = route_as_view(
            Router::<()>::new(),
            "echo",
            &["/api/{id}", "/api/{id}"],
            Echo { greeting: String::new() },
        );
        assert!(matches!(duplicate, Err(JsonToolsError::InvalidDeclaration { .. })));
    }
}
