use crate::error::{JsonToolsError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use std::str::FromStr;

/// Route parameters of one request.
///
/// A name mapped to `None` is known to the view (some sibling route declares
/// it) but not bound for this request. Only bound names take part in
/// handler matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: BTreeMap<String, Option<String>>,
}

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the values axum extracted for the matched rule, marking
    /// every other name in `known` as unbound.
    pub fn from_path<'a>(
        known: impl IntoIterator<Item = &'a str>,
        values: HashMap<String, String>,
    ) -> Self {
        let mut params: BTreeMap<String, Option<String>> = known
            .into_iter()
            .map(|name| (name.to_string(), None))
            .collect();
        params.extend(values.into_iter().map(|(k, v)| (k, Some(v))));
        Self { params }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, Some(value.into()));
        self
    }

    pub fn with_unbound(mut self, name: impl Into<String>) -> Self {
        self.insert(name, None);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Option<String>) {
        self.params.insert(name.into(), value);
    }

    /// Names that carry a value.
    pub fn bound_names(&self) -> BTreeSet<&str> {
        self.params
            .iter()
            .filter(|(_, v)| v.is_some())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    /// All names, bound or not.
    pub fn names(&self) -> Vec<String> {
        self.params.keys().cloned().collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.as_deref())
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parse a bound parameter, failing if it is missing or malformed.
    pub fn required<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.optional(name)?
            .ok_or_else(|| JsonToolsError::MissingParam {
                name: name.to_string(),
            })
    }

    /// Parse a parameter if it is bound.
    pub fn optional<T>(&self, name: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| JsonToolsError::InvalidParam {
                    name: name.to_string(),
                    value: raw.to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, Option<V>)> for RouteParams {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }
}
