use anyhow::{Context, Result};
use serde::Deserialize;

use cinex_types::api::MovieCandidate;

const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";
const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// Catalog collaborator: read-only movie metadata lookups against TMDB.
/// Nothing here mutates local state; saving a candidate locally goes through
/// `POST /movies`.
pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    pub async fn search(&self, query: &str) -> Result<Vec<MovieCandidate>> {
        self.fetch("search/movie", &[("query", query)]).await
    }

    pub async fn popular(&self) -> Result<Vec<MovieCandidate>> {
        self.fetch("movie/popular", &[]).await
    }

    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<Vec<MovieCandidate>> {
        let url = format!("{}/{}", self.base_url, path);
        let page: SearchPage = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .with_context(|| format!("TMDB request to {} failed", path))?
            .error_for_status()
            .with_context(|| format!("TMDB rejected request to {}", path))?
            .json()
            .await
            .context("TMDB returned an unreadable payload")?;

        Ok(page.results.into_iter().map(candidate_from_tmdb).collect())
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    title: String,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
}

fn candidate_from_tmdb(movie: TmdbMovie) -> MovieCandidate {
    // release_date is "YYYY-MM-DD"; an empty string means unreleased/unknown.
    let year = movie
        .release_date
        .as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<i32>().ok());

    let poster_url = movie
        .poster_path
        .filter(|p| !p.is_empty())
        .map(|p| format!("{POSTER_BASE_URL}{p}"));

    MovieCandidate {
        tmdb_id: movie.id,
        title: movie.title,
        year,
        synopsis: movie.overview.filter(|o| !o.is_empty()),
        poster_url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_mapping_extracts_year_and_poster() {
        let movie = TmdbMovie {
            id: 438631,
            title: "Dune".to_string(),
            overview: Some("Paul Atreides...".to_string()),
            release_date: Some("2021-09-15".to_string()),
            poster_path: Some("/d5NXSklXo0qyIYkgV94XAgMIckC.jpg".to_string()),
        };

        let candidate = candidate_from_tmdb(movie);
        assert_eq!(candidate.tmdb_id, 438631);
        assert_eq!(candidate.year, Some(2021));
        assert_eq!(
            candidate.poster_url.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/d5NXSklXo0qyIYkgV94XAgMIckC.jpg")
        );
    }

    #[test]
    fn candidate_mapping_tolerates_missing_fields() {
        let movie = TmdbMovie {
            id: 1,
            title: "Unknown".to_string(),
            overview: Some(String::new()),
            release_date: Some(String::new()),
            poster_path: None,
        };

        let candidate = candidate_from_tmdb(movie);
        assert_eq!(candidate.year, None);
        assert_eq!(candidate.synopsis, None);
        assert_eq!(candidate.poster_url, None);
    }
}
