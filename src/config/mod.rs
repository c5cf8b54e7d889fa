use std::env;
use std::num::NonZeroUsize;
use std::str::FromStr;

use chrono::{FixedOffset, Offset, Utc};

use crate::utils::utc_offset_from_minutes;

#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub project_id: Option<String>,
    pub dataset: String,
    pub api_version: String,
    /// Needed for writes only.
    pub token: Option<String>,
    pub use_cdn: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            dataset: "production".to_string(),
            api_version: "2024-03-23".to_string(),
            token: None,
            use_cdn: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub content: ContentConfig,
    pub database_url: String,
    pub fixtures_page_size: NonZeroUsize,
    pub players_page_size: NonZeroUsize,
    /// Offset used for day labels and kickoff times.
    pub display_offset: FixedOffset,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            content: ContentConfig::default(),
            database_url: "sqlite:data/league.db".to_string(),
            fixtures_page_size: NonZeroUsize::MIN.saturating_add(9),
            players_page_size: NonZeroUsize::MIN.saturating_add(6),
            display_offset: Utc.fix(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let content = ContentConfig {
            project_id: non_empty("CONTENT_PROJECT_ID"),
            dataset: non_empty("CONTENT_DATASET").unwrap_or(defaults.content.dataset),
            api_version: non_empty("CONTENT_API_VERSION")
                .map(|v| v.trim_start_matches('v').to_string())
                .unwrap_or(defaults.content.api_version),
            token: non_empty("CONTENT_TOKEN"),
            use_cdn: parse_or(non_empty("CONTENT_USE_CDN"), "CONTENT_USE_CDN", false),
        };

        let display_offset = parse_or(
            non_empty("DISPLAY_UTC_OFFSET_MINUTES"),
            "DISPLAY_UTC_OFFSET_MINUTES",
            0i32,
        );
        let display_offset = utc_offset_from_minutes(display_offset).unwrap_or_else(|| {
            tracing::warn!("DISPLAY_UTC_OFFSET_MINUTES out of range, using UTC");
            defaults.display_offset
        });

        Self {
            content,
            database_url: non_empty("DATABASE_URL").unwrap_or(defaults.database_url),
            fixtures_page_size: parse_or(
                non_empty("FIXTURES_PAGE_SIZE"),
                "FIXTURES_PAGE_SIZE",
                defaults.fixtures_page_size,
            ),
            players_page_size: parse_or(
                non_empty("PLAYERS_PAGE_SIZE"),
                "PLAYERS_PAGE_SIZE",
                defaults.players_page_size,
            ),
            display_offset,
        }
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}='{}', using default", key, raw);
            default
        }),
        None => default,
    }
}
