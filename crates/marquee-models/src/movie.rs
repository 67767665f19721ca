use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Remote movie identifier. Stable across listings, search and details.
pub type MovieId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub overview: String,
    pub poster_path: Option<String>, // Relative path, e.g. "/abc.jpg"
    pub release_date: Option<String>, // Usually YYYY-MM-DD, kept raw when it isn't
}

impl Movie {
    pub fn new(id: MovieId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            overview: String::new(),
            poster_path: None,
            release_date: None,
        }
    }

    /// Parsed release date, if the raw value is a valid `YYYY-MM-DD` date
    pub fn release(&self) -> Option<NaiveDate> {
        self.release_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release().map(|date| date.year())
    }

    /// Absolute poster URL for the given image base, e.g. `https://image.tmdb.org/t/p/w500`
    pub fn poster_url(&self, image_base_url: &str) -> Option<String> {
        let path = self.poster_path.as_deref().filter(|p| !p.is_empty())?;
        let base = image_base_url.trim_end_matches('/');
        if path.starts_with('/') {
            Some(format!("{}{}", base, path))
        } else {
            Some(format!("{}/{}", base, path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_with_date(date: Option<&str>) -> Movie {
        Movie {
            release_date: date.map(|d| d.to_string()),
            ..Movie::new(603, "The Matrix")
        }
    }

    #[test]
    fn test_release_year_parses_iso_date() {
        assert_eq!(movie_with_date(Some("1999-03-30")).release_year(), Some(1999));
    }

    #[test]
    fn test_release_year_unparseable_raw_value() {
        assert_eq!(movie_with_date(Some("")).release_year(), None);
        assert_eq!(movie_with_date(Some("1999")).release_year(), None);
        assert_eq!(movie_with_date(Some("soon")).release_year(), None);
        assert_eq!(movie_with_date(None).release_year(), None);
        // Raw value is preserved even when it can't be parsed
        assert_eq!(movie_with_date(Some("soon")).release_date.as_deref(), Some("soon"));
    }

    #[test]
    fn test_poster_url() {
        let mut movie = Movie::new(1, "Dune");
        assert_eq!(movie.poster_url("https://image.tmdb.org/t/p/w500"), None);

        movie.poster_path = Some("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg".to_string());
        assert_eq!(
            movie.poster_url("https://image.tmdb.org/t/p/w500/").as_deref(),
            Some("https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg")
        );

        movie.poster_path = Some(String::new());
        assert_eq!(movie.poster_url("https://image.tmdb.org/t/p/w500"), None);
    }

    #[test]
    fn test_equality_uses_all_fields() {
        let a = Movie::new(42, "Original");
        let mut b = a.clone();
        assert_eq!(a, b);
        b.overview = "changed upstream".to_string();
        assert_ne!(a, b);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_serializes_with_snake_case_fields() {
        let movie = Movie {
            poster_path: Some("/p.jpg".to_string()),
            release_date: Some("2021-10-22".to_string()),
            ..Movie::new(438631, "Dune")
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert_eq!(json["poster_path"], "/p.jpg");
        assert_eq!(json["release_date"], "2021-10-22");
    }
}
