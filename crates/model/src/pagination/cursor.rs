use serde::{Deserialize, Serialize};

/// Represents the pagination position within a source collection.
///
/// The token is opaque: it is whatever the source API returned as `endCursor`
/// and is only ever handed back verbatim in the next page request.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// No position stored; the next fetch starts from the first page.
    Start,

    /// Resume after the page whose `endCursor` this token was.
    At(String),
}

impl Cursor {
    /// The token to bind as the `after` variable, if any.
    pub fn token(&self) -> Option<&str> {
        match self {
            Cursor::Start => None,
            Cursor::At(token) => Some(token.as_str()),
        }
    }

    pub fn is_start(&self) -> bool {
        matches!(self, Cursor::Start)
    }
}

impl From<Option<String>> for Cursor {
    fn from(token: Option<String>) -> Self {
        match token {
            Some(t) => Cursor::At(t),
            None => Cursor::Start,
        }
    }
}
