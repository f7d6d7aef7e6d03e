use crate::error::{JsonToolsError, Result};
use axum::http::Method;
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Anything that can name one or more verbs / route parameters.
///
/// A single string counts as one name, so `"GET"` and `["GET"]` are equivalent.
pub trait IntoNames {
    fn into_names(self) -> Vec<String>;
}

impl IntoNames for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoNames for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoNames for &String {
    fn into_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: AsRef<str>> IntoNames for Vec<S> {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoNames for &[S] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>, const N: usize> IntoNames for [S; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: AsRef<str>> IntoNames for BTreeSet<S> {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<T: IntoNames> IntoNames for Option<T> {
    fn into_names(self) -> Vec<String> {
        self.map(IntoNames::into_names).unwrap_or_default()
    }
}

fn name_set(names: impl IntoNames) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = names.into_names().into_iter().collect();
    if set.is_empty() { None } else { Some(set) }
}

/// Static matching conditions attached to a view handler.
///
/// Each axis is either unconstrained (`None`) or a non-empty set:
///
/// - `verbs`: HTTP verbs, uppercase
/// - `requires_present`: route params that must be bound to a value
/// - `requires_absent`: route params that must be unbound (missing or null)
///
/// ```
/// use jsontools::HandlerDeclaration;
/// use std::collections::BTreeSet;
///
/// let get = HandlerDeclaration::new().verbs("get").requires_present("id");
/// assert!(get.matches("GET", &BTreeSet::from(["id", "format"])));
/// assert!(!get.matches("GET", &BTreeSet::from(["format"])));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerDeclaration {
    verbs: Option<BTreeSet<String>>,
    requires_present: Option<BTreeSet<String>>,
    requires_absent: Option<BTreeSet<String>>,
}

impl HandlerDeclaration {
    /// A declaration that matches every request.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbs(mut self, verbs: impl IntoNames) -> Self {
        let upper: Vec<String> = verbs
            .into_names()
            .into_iter()
            .map(|v| v.to_ascii_uppercase())
            .collect();
        self.verbs = name_set(upper);
        self
    }

    pub fn requires_present(mut self, params: impl IntoNames) -> Self {
        self.requires_present = name_set(params);
        self
    }

    pub fn requires_absent(mut self, params: impl IntoNames) -> Self {
        self.requires_absent = name_set(params);
        self
    }

    /// `None` means any verb.
    pub fn verb_set(&self) -> Option<&BTreeSet<String>> {
        self.verbs.as_ref()
    }

    pub fn present_set(&self) -> Option<&BTreeSet<String>> {
        self.requires_present.as_ref()
    }

    pub fn absent_set(&self) -> Option<&BTreeSet<String>> {
        self.requires_absent.as_ref()
    }

    pub fn accepts_any_verb(&self) -> bool {
        self.verbs.is_none()
    }

    /// Test whether the declaration matches a request.
    ///
    /// `verb` must already be uppercase; `bound` holds the names of the route
    /// params that carry a value.
    pub fn matches<S>(&self, verb: &str, bound: &BTreeSet<S>) -> bool
    where
        S: Borrow<str> + Ord,
    {
        self.requires_present
            .as_ref()
            .is_none_or(|present| present.iter().all(|p| bound.contains(p.as_str())))
            && self
                .requires_absent
                .as_ref()
                .is_none_or(|absent| !absent.iter().any(|p| bound.contains(p.as_str())))
            && self.verbs.as_ref().is_none_or(|verbs| verbs.contains(verb))
    }

    /// Reject declarations that could never be dispatched to.
    pub fn validate(&self, view: &str, handler: &str) -> Result<()> {
        for verb in self.verbs.iter().flatten() {
            if verb.is_empty() || Method::from_bytes(verb.as_bytes()).is_err() {
                return Err(JsonToolsError::invalid_declaration(
                    view,
                    handler,
                    format!("invalid HTTP verb {:?}", verb),
                ));
            }
        }

        let params = self
            .requires_present
            .iter()
            .flatten()
            .chain(self.requires_absent.iter().flatten());
        for param in params {
            if param.trim().is_empty() {
                return Err(JsonToolsError::invalid_declaration(
                    view,
                    handler,
                    "empty route parameter name",
                ));
            }
        }

        if let (Some(present), Some(absent)) = (&self.requires_present, &self.requires_absent) {
            let overlap: Vec<&str> = present.intersection(absent).map(String::as_str).collect();
            if !overlap.is_empty() {
                return Err(JsonToolsError::invalid_declaration(
                    view,
                    handler,
                    format!(
                        "route params [{}] are required both set and unset",
                        overlap.join(", ")
                    ),
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for HandlerDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn axis(set: Option<&BTreeSet<String>>, any: &str) -> String {
            match set {
                Some(set) => format!("{{{}}}", set.iter().cloned().collect::<Vec<_>>().join(", ")),
                None => any.to_string(),
            }
        }
        write!(
            f,
            "<HandlerDeclaration: verbs={} if_set={} if_not_set={}>",
            axis(self.verb_set(), "*"),
            axis(self.present_set(), "-"),
            axis(self.absent_set(), "-"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(names: &[&'static str]) -> BTreeSet<&'static str> {
        names.iter().copied().collect()
    }

    #[test]
    fn test_verbs_are_uppercased() {
        let decl = HandlerDeclaration::new().verbs(["get", "Post"]);
        let verbs: Vec<&str> = decl.verb_set().unwrap().iter().map(String::as_str).collect();
        assert_eq!(verbs, vec!["GET", "POST"]);
    }

    #[test]
    fn test_single_string_and_list_are_equivalent() {
        let a = HandlerDeclaration::new().verbs("GET").requires_present("id");
        let b = HandlerDeclaration::new().verbs(vec!["GET"]).requires_present(["id"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_axes_are_unconstrained() {
        let decl = HandlerDeclaration::new()
            .verbs(Vec::<String>::new())
            .requires_present(None::<&str>)
            .requires_absent([] as [&str; 0]);
        assert!(decl.accepts_any_verb());
        assert!(decl.present_set().is_none());
        assert!(decl.absent_set().is_none());
        assert!(decl.matches("ANYTHING", &bound(&["x"])));
    }

    #[test]
    fn test_matches_conditions() {
        let list = HandlerDeclaration::new().verbs("GET").requires_absent("id");
        let get = HandlerDeclaration::new().verbs("GET").requires_present("id");
        let custom = HandlerDeclaration::new().verbs("CUSTOM").requires_present("id");

        assert!(list.matches("GET", &bound(&["a"])));
        assert!(!list.matches("GET", &bound(&["id", "a"])));
        assert!(get.matches("GET", &bound(&["id", "a"])));
        assert!(!get.matches("GET", &bound(&["a"])));
        assert!(custom.matches("CUSTOM", &bound(&["id", "a"])));
        assert!(!custom.matches("CUSTOM", &bound(&["a"])));
        assert!(!custom.matches("????", &bound(&["a"])));
    }

    #[test]
    fn test_validate_rejects_overlap() {
        let decl = HandlerDeclaration::new()
            .verbs("GET")
            .requires_present(["id", "slug"])
            .requires_absent("id");
        let err = decl.validate("UserView", "get").unwrap_err();
        assert!(matches!(err, JsonToolsError::InvalidDeclaration { .. }));
        assert!(err.to_string().contains("[id]"));
    }

    #[test]
    fn test_validate_rejects_bad_verb_and_param() {
        let bad_verb = HandlerDeclaration::new().verbs("GET ME");
        assert!(bad_verb.validate("V", "h").is_err());

        let bad_param = HandlerDeclaration::new().verbs("GET").requires_present(" ");
        assert!(bad_param.validate("V", "h").is_err());

        let ok = HandlerDeclaration::new().verbs("CUSTOM").requires_present("id");
        assert!(ok.validate("V", "h").is_ok());
    }

    #[test]
    fn test_display() {
        let decl = HandlerDeclaration::new().verbs("GET").requires_present("id");
        assert_eq!(
            decl.to_string(),
            "<HandlerDeclaration: verbs={GET} if_set={id} if_not_set=->"
        );
    }
}
