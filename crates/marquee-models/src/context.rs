use serde::{Deserialize, Serialize};
use std::fmt;

/// What a page window is listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ListingContext {
    NowPlaying,
    Search(String),
}

impl ListingContext {
    /// Search context with surrounding whitespace removed from the term
    pub fn search(query: impl AsRef<str>) -> Self {
        ListingContext::Search(query.as_ref().trim().to_string())
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            ListingContext::NowPlaying => None,
            ListingContext::Search(query) => Some(query.as_str()),
        }
    }
}

impl fmt::Display for ListingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingContext::NowPlaying => write!(f, "now_playing"),
            ListingContext::Search(query) => write!(f, "search({:?})", query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_context_trims_query() {
        assert_eq!(ListingContext::search("  dune "), ListingContext::Search("dune".to_string()));
        assert_eq!(ListingContext::search("dune").query(), Some("dune"));
        assert_eq!(ListingContext::NowPlaying.query(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(ListingContext::NowPlaying.to_string(), "now_playing");
        assert_eq!(ListingContext::search("dune").to_string(), "search(\"dune\")");
    }
}
