use crate::error::{JsonToolsError, Result};
use crate::view::declaration::{HandlerDeclaration, IntoNames};
use crate::view::params::RouteParams;
use crate::view::restful::RestOperation;
use axum::response::Response;
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// What a view handler produces.
pub type HandlerResult = Result<Response>;

/// Boxed future returned by a view handler, borrowing the view for `'a`.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>>;

/// A type-erased view handler: a method of `V` taking the request's route params.
pub type Handler<V> = Arc<dyn for<'a> Fn(&'a V, RouteParams) -> HandlerFuture<'a> + Send + Sync>;

fn erase<V, F>(f: F) -> Handler<V>
where
    F: for<'a> Fn(&'a V, RouteParams) -> HandlerFuture<'a> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A named handler of a view, with its declaration if it has one.
///
/// Members without a declaration never match a request on their own; they
/// exist so that a primary key (set here or on a derived view) can turn the
/// CRUD-named ones into handlers.
pub struct ViewMember<V> {
    name: String,
    handler: Handler<V>,
    declaration: Option<HandlerDeclaration>,
}

impl<V> ViewMember<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declaration(&self) -> Option<&HandlerDeclaration> {
        self.declaration.as_ref()
    }

    pub fn handler(&self) -> &Handler<V> {
        &self.handler
    }
}

impl<V> Clone for ViewMember<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: Arc::clone(&self.handler),
            declaration: self.declaration.clone(),
        }
    }
}

impl<V> fmt::Debug for ViewMember<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewMember")
            .field("name", &self.name)
            .field("declaration", &self.declaration)
            .finish_non_exhaustive()
    }
}

/// Immutable verb -> handler lookup table of one view type.
///
/// Built once by [`ViewRegistryBuilder::build`]; derived views copy it into
/// their own builder instead of mutating it.
pub struct ViewRegistry<V> {
    name: String,
    primary_key: Vec<String>,
    members: Vec<ViewMember<V>>,
    verb_to_handlers: BTreeMap<String, Vec<usize>>,
    any_verb: Vec<usize>,
}

impl<V: 'static> ViewRegistry<V> {
    pub fn builder(name: impl Into<String>) -> ViewRegistryBuilder<V> {
        ViewRegistryBuilder::new(name)
    }

    /// Start a derived registry for the same view type.
    pub fn extend(&self, name: impl Into<String>) -> ViewRegistryBuilder<V> {
        ViewRegistryBuilder::new(name).inherit(self, |view| view)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Sorted verbs with at least one declared handler.
    pub fn declared_verbs(&self) -> Vec<&str> {
        self.verb_to_handlers.keys().map(String::as_str).collect()
    }

    /// Whether some handler is declared without a verb constraint.
    pub fn accepts_any_verb(&self) -> bool {
        !self.any_verb.is_empty()
    }

    pub fn members(&self) -> impl Iterator<Item = &ViewMember<V>> {
        self.members.iter()
    }

    pub fn member(&self, name: &str) -> Option<&ViewMember<V>> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn declaration(&self, name: &str) -> Option<&HandlerDeclaration> {
        self.member(name).and_then(ViewMember::declaration)
    }

    /// Handlers considered for `verb`, in match order.
    pub fn handlers_for(&self, verb: &str) -> Vec<(&str, &HandlerDeclaration)> {
        let verb = verb.to_ascii_uppercase();
        self.candidates(&verb)
            .iter()
            .filter_map(|&i| {
                let member = &self.members[i];
                member.declaration.as_ref().map(|d| (member.name.as_str(), d))
            })
            .collect()
    }

    fn candidates(&self, verb: &str) -> &[usize] {
        self.verb_to_handlers
            .get(verb)
            .map(Vec::as_slice)
            .unwrap_or(&self.any_verb)
    }

    /// Resolve the handler for a verb and the set of bound route params.
    ///
    /// Returns the first declared handler, in registry order, whose
    /// declaration matches.
    pub fn resolve<S>(&self, verb: &str, bound: &BTreeSet<S>) -> Option<&ViewMember<V>>
    where
        S: Borrow<str> + Ord,
    {
        let verb = verb.to_ascii_uppercase();
        let found = self.candidates(&verb).iter().map(|&i| &self.members[i]).find(|m| {
            m.declaration
                .as_ref()
                .is_some_and(|decl| decl.matches(&verb, bound))
        });
        tracing::trace!(
            view = %self.name,
            verb = %verb,
            handler = found.map(ViewMember::name),
            "resolved view handler"
        );
        found
    }

    /// Name of the handler [`resolve`](Self::resolve) picks, if any.
    pub fn find_handler<S>(&self, verb: &str, bound: &BTreeSet<S>) -> Option<&str>
    where
        S: Borrow<str> + Ord,
    {
        self.resolve(verb, bound).map(ViewMember::name)
    }

    /// Resolve and invoke the handler for one request on `view`.
    pub async fn dispatch(&self, view: &V, verb: &str, params: RouteParams) -> HandlerResult {
        let handler = {
            let bound = params.bound_names();
            match self.resolve(verb, &bound) {
                Some(member) => Arc::clone(&member.handler),
                None => {
                    tracing::debug!(
                        view = %self.name,
                        verb = %verb,
                        params = ?bound,
                        "no view handler matches request"
                    );
                    return Err(JsonToolsError::MethodNotSupported {
                        view: self.name.clone(),
                        verb: verb.to_ascii_uppercase(),
                        params: params.names(),
                        allowed: self.declared_verbs().into_iter().map(String::from).collect(),
                    });
                }
            }
        };
        (handler)(view, params).await
    }
}

impl<V> fmt::Debug for ViewRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRegistry")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("members", &self.members)
            .field("verb_to_handlers", &self.verb_to_handlers)
            .finish()
    }
}

/// Collects the members of a view and builds its [`ViewRegistry`].
///
/// Members keep the order they are added in. Re-adding a name replaces the
/// earlier member in place, so an override of an inherited handler keeps the
/// parent's position.
///
/// # Example
/// ```
/// use jsontools::{HandlerDeclaration, JsonToolsError, RouteParams, ViewRegistry};
/// use jsontools::axum::response::IntoResponse;
/// use std::collections::BTreeSet;
///
/// struct Users;
///
/// let registry = ViewRegistry::<Users>::builder("Users")
///     .handler(
///         "get",
///         HandlerDeclaration::new().verbs("GET").requires_present("id"),
///         |_: &Users, params: RouteParams| Box::pin(async move {
///             let id = params.required::<u64>("id")?;
///             Ok::<_, JsonToolsError>(id.to_string().into_response())
///         }),
///     )
///     .build()
///     .unwrap();
///
/// assert_eq!(registry.find_handler("get", &BTreeSet::from(["id"])), Some("get"));
/// assert_eq!(registry.find_handler("GET", &BTreeSet::<&str>::new()), None);
/// ```
pub struct ViewRegistryBuilder<V> {
    name: String,
    primary_key: Option<Vec<String>>,
    members: Vec<ViewMember<V>>,
    disabled: BTreeSet<String>,
}

impl<V: 'static> ViewRegistryBuilder<V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            members: Vec::new(),
            disabled: BTreeSet::new(),
        }
    }

    /// Copy the members and primary key of a parent view.
    ///
    /// `project` gives access to the parent part of `V`; for a parent of the
    /// same type it is the identity. Members and a primary key already set on
    /// this builder take precedence over the parent's, wherever `inherit`
    /// sits in the chain.
    pub fn inherit<P: 'static>(mut self, parent: &ViewRegistry<P>, project: fn(&V) -> &P) -> Self {
        if self.primary_key.is_none() {
            self.primary_key = Some(parent.primary_key.clone());
        }
        for member in &parent.members {
            if self.disabled.contains(&member.name) || self.has_member(&member.name) {
                continue;
            }
            let inner = Arc::clone(&member.handler);
            let handler = erase::<V, _>(move |view, params| (inner)(project(view), params));
            self.put(member.name.clone(), handler, member.declaration.clone());
        }
        self
    }

    /// Route params that address a single entity. An empty key turns CRUD
    /// synthesis off.
    pub fn primary_key(mut self, fields: impl IntoNames) -> Self {
        self.primary_key = Some(fields.into_names());
        self
    }

    /// Add a handler with an explicit declaration.
    pub fn handler<F>(self, name: impl Into<String>, declaration: HandlerDeclaration, f: F) -> Self
    where
        F: for<'a> Fn(&'a V, RouteParams) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.member_with(name, Some(declaration), f)
    }

    /// Add an undeclared member, e.g. a CRUD method awaiting a primary key.
    pub fn member<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a V, RouteParams) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        self.member_with(name, None, f)
    }

    pub fn member_with<F>(
        mut self,
        name: impl Into<String>,
        declaration: Option<HandlerDeclaration>,
        f: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a V, RouteParams) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        let name = name.into();
        self.disabled.remove(&name);
        self.put(name, erase(f), declaration);
        self
    }

    /// Remove a member, inherited or not. Inheriting later does not bring it back.
    pub fn disable(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.members.retain(|m| m.name != name);
        self.disabled.insert(name);
        self
    }

    fn has_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m.name == name)
    }

    fn put(&mut self, name: String, handler: Handler<V>, declaration: Option<HandlerDeclaration>) {
        let member = ViewMember {
            name,
            handler,
            declaration,
        };
        match self.members.iter_mut().find(|m| m.name == member.name) {
            Some(slot) => *slot = member,
            None => self.members.push(member),
        }
    }

    pub fn build(mut self) -> Result<ViewRegistry<V>> {
        let primary_key = self.primary_key.take().unwrap_or_default();
        if primary_key.iter().any(|f| f.trim().is_empty()) {
            return Err(JsonToolsError::invalid_declaration(
                &self.name,
                "primary_key",
                "empty primary key field name",
            ));
        }

        if !primary_key.is_empty() {
            for member in &mut self.members {
                if let Some(op) = RestOperation::from_handler_name(&member.name) {
                    member.declaration = Some(op.declaration(&primary_key));
                }
            }
        }

        let mut verb_to_handlers: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut any_verb = Vec::new();
        for (index, member) in self.members.iter().enumerate() {
            let Some(decl) = &member.declaration else {
                continue;
            };
            if let Err(e) = decl.validate(&self.name, &member.name) {
                tracing::warn!(view = %self.name, handler = %member.name, "{}", e);
                return Err(e);
            }
            match decl.verb_set() {
                Some(verbs) => {
                    for verb in verbs {
                        verb_to_handlers.entry(verb.clone()).or_default().push(index);
                    }
                }
                None => any_verb.push(index),
            }
        }

        if !any_verb.is_empty() {
            for indices in verb_to_handlers.values_mut() {
                indices.extend_from_slice(&any_verb);
                indices.sort_unstable();
                indices.dedup();
            }
        }

        tracing::debug!(
            view = %self.name,
            members = self.members.len(),
            verbs = ?verb_to_handlers.keys().collect::<Vec<_>>(),
            "built view registry"
        );

        Ok(ViewRegistry {
            name: self.name,
            primary_key,
            members: self.members,
            verb_to_handlers,
            any_verb,
        })
    }
}
