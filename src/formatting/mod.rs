//! JSON serialization of ORM model instances.
//!
//! [`JsonSerializable`] serializes only the attributes that are loaded on an
//! instance: lazily-loaded relationships stay out of the JSON unless they
//! were eagerly loaded or listed in `json_include`.
//!
//! The ORM specific part is [`EntityState`], the snapshot of what is loaded
//! on an instance, which the model fills from its ORM's introspection API.

use crate::error::{JsonToolsError, Result};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Load state of one model instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityState {
    /// Column attributes of the model.
    pub columns: BTreeSet<String>,
    /// Relationship attributes of the model.
    pub relationships: BTreeSet<String>,
    /// Attributes not loaded on this instance.
    pub unloaded: BTreeSet<String>,
    /// Attributes expired on this instance; they reload on first read.
    pub expired_attributes: BTreeSet<String>,
    /// Never persisted, not attached to a session.
    pub transient: bool,
    pub expired: bool,
    pub deleted: bool,
    pub detached: bool,
}

impl EntityState {
    pub fn new<C, R>(columns: C, relationships: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            relationships: relationships.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_unloaded<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.unloaded = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_expired<I>(mut self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.expired = true;
        self.expired_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    pub fn detached(mut self) -> Self {
        self.detached = true;
        self
    }

    /// The attribute names to serialize.
    ///
    /// `exclude` is applied last and beats everything else, `include`.
    pub fn json_keys(&self, include: &[&str], exclude: &[&str]) -> BTreeSet<String> {
        let mut keys: BTreeSet<String> = self.columns.union(&self.relationships).cloned().collect();

        // Lazy attributes only show up once loaded; a transient instance
        // would load defaults anyway.
        if !self.transient {
            keys.retain(|k| !self.unloaded.contains(k));
        }

        // Expired attributes get refreshed on read.
        if self.expired {
            keys.extend(self.expired_attributes.iter().cloned());
        }

        keys.extend(include.iter().map(|k| k.to_string()));

        // Nothing can be loaded without a live row and session.
        if self.deleted || self.detached {
            keys.retain(|k| !self.relationships.contains(k) && !self.unloaded.contains(k));
        }

        keys.retain(|k| !exclude.contains(&k.as_str()));
        keys
    }
}

/// Mixin for models that serialize to JSON objects restricted to their
/// loaded attributes.
///
/// # Example
/// ```
/// use jsontools::formatting::{EntityState, JsonSerializable};
/// use serde::Serialize;
/// use serde_json::json;
///
/// #[derive(Serialize)]
/// struct User {
///     id: i32,
///     login: String,
///     password: String,
///     articles: Option<Vec<i32>>,
/// }
///
/// impl JsonSerializable for User {
///     fn entity_state(&self) -> EntityState {
///         EntityState::new(["id", "login", "password"], ["articles"]).with_unloaded(["articles"])
///     }
///
///     fn json_exclude(&self) -> &[&str] {
///         &["password"]
///     }
/// }
///
/// let user = User { id: 1, login: "a".into(), password: "x".into(), articles: None };
/// assert_eq!(user.to_json().unwrap(), json!({"id": 1, "login": "a"}));
/// ```
pub trait JsonSerializable: Serialize {
    /// Load state of this instance.
    fn entity_state(&self) -> EntityState;

    /// Attributes serialized even when not loaded.
    fn json_include(&self) -> &[&str] {
        &[]
    }

    /// Attributes never serialized.
    fn json_exclude(&self) -> &[&str] {
        &[]
    }

    fn to_json(&self) -> Result<Value> {
        self.to_json_excluding(&[])
    }

    /// Serialize, additionally leaving out `excluded` keys.
    fn to_json_excluding(&self, excluded: &[&str]) -> Result<Value> {
        let mut exclude: Vec<&str> = self.json_exclude().to_vec();
        exclude.extend_from_slice(excluded);
        let keys = self
            .entity_state()
            .json_keys(self.json_include(), &exclude);

        let Value::Object(mut fields) = serde_json::to_value(self)? else {
            return Err(JsonToolsError::Internal(format!(
                "{} does not serialize to a JSON object",
                std::any::type_name::<Self>()
            )));
        };

        let selected: Map<String, Value> = keys
            .into_iter()
            .filter_map(|key| fields.remove(&key).map(|value| (key, value)))
            .collect();
        Ok(Value::Object(selected))
    }
}

/// Serializes a model through [`JsonSerializable`], so models can be nested
/// in any serializable response.
pub struct SerializedModel<'a, M: ?Sized>(pub &'a M);

impl<M: JsonSerializable + ?Sized> Serialize for SerializedModel<'_, M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0
            .to_json()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}
