use crate::view::declaration::HandlerDeclaration;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The standard CRUD handlers a view with a primary key gets for free.
///
/// ```text
/// Collection:
///     GET    /      -> list()
///     POST   /      -> create()
/// Individual item:
///     GET    /<pk>  -> get()
///     PUT    /<pk>  -> replace()
///     POST   /<pk>  -> update()
///     DELETE /<pk>  -> delete()
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum RestOperation {
    List,
    Create,
    Get,
    Replace,
    Update,
    Delete,
}

impl RestOperation {
    /// Look up the operation a handler name stands for.
    pub fn from_handler_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }

    /// Item operations address a single entity through the primary key.
    pub fn needs_primary_key(self) -> bool {
        !matches!(self, RestOperation::List | RestOperation::Create)
    }

    pub fn verb(self) -> &'static str {
        match self {
            RestOperation::List | RestOperation::Get => "GET",
            RestOperation::Create | RestOperation::Update => "POST",
            RestOperation::Replace => "PUT",
            RestOperation::Delete => "DELETE",
        }
    }

    /// Declaration for this operation under the given primary key.
    pub fn declaration(self, primary_key: &[String]) -> HandlerDeclaration {
        let decl = HandlerDeclaration::new().verbs(self.verb());
        if self.needs_primary_key() {
            decl.requires_present(primary_key)
        } else {
            decl.requires_absent(primary_key)
        }
    }
}
