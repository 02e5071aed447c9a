use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Canonical movie record. Created the first time a TMDB result is saved
/// locally, updated in place when the same tmdb_id is imported again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub tmdb_id: i64,
    pub title: String,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomList {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub private: bool,
    pub created_at: DateTime<Utc>,
}

/// The three predefined lists every user has. Stored in the database as the
/// discriminator column of `list_entries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    ToWatch,
    Watched,
    Favorites,
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::ToWatch => "to_watch",
            ListKind::Watched => "watched",
            ListKind::Favorites => "favorites",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ListKind::ToWatch => "To Watch",
            ListKind::Watched => "Watched",
            ListKind::Favorites => "Favorites",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "to_watch" => Some(ListKind::ToWatch),
            "watched" => Some(ListKind::Watched),
            "favorites" => Some(ListKind::Favorites),
            _ => None,
        }
    }

    pub const ALL: [ListKind; 3] = [ListKind::ToWatch, ListKind::Watched, ListKind::Favorites];
}

/// A list identifier from the URL, parsed exactly once: either one of the
/// three reserved kind tokens or the integer id of a custom list. Anything
/// else is an input error, reported by the caller as a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListSelector {
    Predefined(ListKind),
    Custom(i64),
}

impl ListSelector {
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(kind) = ListKind::parse(raw) {
            return Some(ListSelector::Predefined(kind));
        }
        raw.parse::<i64>().ok().map(ListSelector::Custom)
    }
}
