// ── Navigation location ──
//
// A screen is addressed like a web route: `/policies/edit?id=42&tablestate=..`.
// The `id` query parameter selects the record; `new` means create-mode.

use std::fmt;

use indexmap::IndexMap;
use url::form_urlencoded;

/// Query parameter carrying the record identifier.
pub const ID_PARAM: &str = "id";
/// Query parameter carrying the link back to the referring report view.
pub const RETURN_TO_PARAM: &str = "returnto";

const NEW_ID: &str = "new";

/// Which record a location refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum RecordId {
    /// `id=new`: nothing is loaded and save creates a record.
    New,
    /// Any other non-empty id: load and update that record.
    Existing(String),
    /// No id: collection screens and singleton documents.
    #[default]
    Collection,
}

impl RecordId {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::Collection,
            Some(NEW_ID) => Self::New,
            Some(id) => Self::Existing(id.to_owned()),
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, Self::New)
    }

    /// The id string of an existing record.
    pub fn existing(&self) -> Option<&str> {
        match self {
            Self::Existing(id) => Some(id),
            _ => None,
        }
    }

    /// The value as it appears in the query string.
    pub fn as_param(&self) -> Option<&str> {
        match self {
            Self::New => Some(NEW_ID),
            Self::Existing(id) => Some(id),
            Self::Collection => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param().unwrap_or(""))
    }
}

/// Loader input: the record id plus every query parameter of the location.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pub id: RecordId,
    pub query: IndexMap<String, String>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Query parameters other than `id`.
    pub fn non_id(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query
            .iter()
            .filter(|(k, _)| k.as_str() != ID_PARAM)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A route path plus its ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    path: String,
    query: IndexMap<String, String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: IndexMap::new(),
        }
    }

    /// Parse `path?query`. Percent-escapes in the query are decoded; a
    /// repeated parameter keeps its last value.
    pub fn parse(raw: &str) -> Self {
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let query = form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self {
            path: path.to_owned(),
            query,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn with_param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.insert(name.to_owned(), value.into());
        self
    }

    pub fn without_param(mut self, name: &str) -> Self {
        self.query.shift_remove(name);
        self
    }

    pub fn record_id(&self) -> RecordId {
        RecordId::parse(self.param(ID_PARAM))
    }

    pub fn params(&self) -> Params {
        Params {
            id: self.record_id(),
            query: self.query.clone(),
        }
    }

    /// Location of the edit screen for `id`, keeping the other parameters.
    pub fn edit_location(&self, id: &str) -> Self {
        self.clone().with_param(ID_PARAM, id)
    }

    /// Where the `returnto` parameter points, if present.
    pub fn return_target(&self) -> Option<Self> {
        self.param(RETURN_TO_PARAM).map(Self::parse)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)?;
        if !self.query.is_empty() {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.query)
                .finish();
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

impl From<&str> for Location {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn record_id_modes() {
        assert_eq!(Location::parse("/lists/edit?id=new").record_id(), RecordId::New);
        assert_eq!(
            Location::parse("/lists/edit?id=42").record_id(),
            RecordId::Existing("42".into())
        );
        assert_eq!(Location::parse("/lists/edit?id=").record_id(), RecordId::Collection);
        assert_eq!(Location::parse("/lists").record_id(), RecordId::Collection);
    }

    #[test]
    fn params_are_decoded_and_ordered() {
        let loc = Location::parse("/broadcasts/domains?id=7&search=a%20b&start=2024-01-01");
        let params = loc.params();
        assert_eq!(params.id, RecordId::Existing("7".into()));
        assert_eq!(params.get("search"), Some("a b"));
        let rest: Vec<_> = params.non_id().collect();
        assert_eq!(rest, vec![("search", "a b"), ("start", "2024-01-01")]);
    }

    #[test]
    fn edit_location_replaces_id() {
        let loc = Location::parse("/webhooks/edit?id=new&tab=2");
        assert_eq!(loc.edit_location("abc123").to_string(), "/webhooks/edit?id=abc123&tab=2");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let loc = Location::new("/reports")
            .with_param("q", "a&b=c")
            .with_param("id", "9");
        let again = Location::parse(&loc.to_string());
        assert_eq!(again, loc);
        assert_eq!(again.without_param("q").to_string(), "/reports?id=9");
    }

    #[test]
    fn return_target_is_parsed() {
        let back = Location::new("/broadcasts/domains").with_param("id", "5");
        let drill = Location::new("/broadcasts/details").with_param(RETURN_TO_PARAM, back.to_string());
        let reparsed = Location::parse(&drill.to_string());
        assert_eq!(reparsed.return_target(), Some(back));
    }
}
