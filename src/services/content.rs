use std::future::Future;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ContentConfig;
use crate::models::documents::{ClubDoc, LeagueTableEntryDoc, PlayerDoc, SeasonDoc};
use crate::models::{Club, Player, Season, StandingsRow};

// ── queries ──────────────────────────────────────────────────────────────────

const SEASON_PROJECTION: &str = r#"{
  _id,
  season,
  main,
  league_table[] {
    _key, points, gf, ga, played, won, drawn, lost, position_change,
    "club_ref": club._ref,
    club->{ _id, name, link, image }
  },
  matchweeks[] {
    name, startDate, endDate,
    days[] {
      date,
      fixtures[] {
        _key,
        home_club->{ _id, name, link, image },
        away_club->{ _id, name, link, image },
        scheduled_date_time,
        score { home_score, away_score },
        live_mode,
        location
      }
    }
  }
}"#;

const CLUBS_QUERY: &str = r#"*[_type == "clubs"] | order(name asc) { _id, name, link, image }"#;

const PLAYERS_QUERY: &str = r#"*[_type == "players"] | order(last_name asc) {
  _id, first_name, last_name, position, nationality, number, date_of_birth, height,
  club->{ _id, name, link, image },
  related_seasons[]->{ season },
  season_stats[] { season, appearances, goals, assists, clean_sheets, club->{ _id, name, link, image } }
}"#;

fn seasons_query() -> String {
    format!(r#"*[_type == "seasons" && !(_id in path("drafts.**"))] {}"#, SEASON_PROJECTION)
}

fn season_by_label_query() -> String {
    format!(
        r#"*[_type == "seasons" && season == $season && !(_id in path("drafts.**"))][0] {}"#,
        SEASON_PROJECTION
    )
}

/// Site documents passed through untyped; only presentation code reads them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Nav,
    General,
    Sponsors,
    Footer,
    Social,
    Policies,
    Banner,
    News,
    Video,
}

impl DocumentKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            DocumentKind::Nav => "nav",
            DocumentKind::General => "general",
            DocumentKind::Sponsors => "sponsors",
            DocumentKind::Footer => "footer",
            DocumentKind::Social => "social",
            DocumentKind::Policies => "policies",
            DocumentKind::Banner => "banner",
            DocumentKind::News => "news",
            DocumentKind::Video => "video",
        }
    }

    fn is_singleton(&self) -> bool {
        matches!(
            self,
            DocumentKind::Nav | DocumentKind::General | DocumentKind::Footer | DocumentKind::Banner
        )
    }

    pub fn query(&self) -> String {
        if self.is_singleton() {
            format!(r#"*[_type == "{}"][0]"#, self.type_name())
        } else {
            format!(
                r#"*[_type == "{}"] | order(_createdAt desc)"#,
                self.type_name()
            )
        }
    }
}

// ── errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content project is not configured (set CONTENT_PROJECT_ID)")]
    NotConfigured,
    #[error("content writes need a token (set CONTENT_TOKEN)")]
    MissingToken,
    #[error("content request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("content API error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not encode query parameter: {0}")]
    Encode(#[from] serde_json::Error),
}

// ── boundary ─────────────────────────────────────────────────────────────────

/// Read/write access to the content store. Everything above this trait works
/// on validated domain records only.
pub trait ContentSource: Send + Sync {
    fn fetch_seasons(&self) -> impl Future<Output = Result<Vec<Season>, ContentError>> + Send;

    fn fetch_season_by_label(
        &self,
        label: &str,
    ) -> impl Future<Output = Result<Option<Season>, ContentError>> + Send;

    fn fetch_clubs(&self) -> impl Future<Output = Result<Vec<Club>, ContentError>> + Send;

    fn fetch_players(&self) -> impl Future<Output = Result<Vec<Player>, ContentError>> + Send;

    fn fetch_document(
        &self,
        kind: DocumentKind,
    ) -> impl Future<Output = Result<Value, ContentError>> + Send;

    /// Replace the season's whole league table in one atomic patch.
    fn set_league_table(
        &self,
        season_id: &str,
        rows: &[StandingsRow],
    ) -> impl Future<Output = Result<(), ContentError>> + Send;
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

pub struct ContentClient {
    client: Client,
    config: ContentConfig,
}

impl ContentClient {
    pub fn new(config: ContentConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.config.project_id.is_some()
    }

    fn project_id(&self) -> Result<&str, ContentError> {
        self.config
            .project_id
            .as_deref()
            .ok_or(ContentError::NotConfigured)
    }

    fn endpoint(&self, action: &str, cdn: bool) -> Result<String, ContentError> {
        let host = if cdn { "apicdn" } else { "api" };
        Ok(format!(
            "https://{}.{}.sanity.io/v{}/data/{}/{}",
            self.project_id()?,
            host,
            self.config.api_version,
            action,
            self.config.dataset
        ))
    }

    async fn query<T: DeserializeOwned>(
        &self,
        groq: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ContentError> {
        let url = self.endpoint("query", self.config.use_cdn)?;

        let mut query: Vec<(String, String)> = vec![("query".to_string(), groq.to_string())];
        for (name, value) in params {
            // parameters travel JSON-encoded
            query.push((format!("${}", name), serde_json::to_string(value)?));
        }

        let mut request = self.client.get(&url).query(&query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Status { status, body });
        }

        let data: QueryResponse<T> = response.json().await?;
        Ok(data.result)
    }

    async fn mutate(&self, mutations: Value) -> Result<(), ContentError> {
        let url = self.endpoint("mutate", false)?;
        let token = self
            .config
            .token
            .as_deref()
            .ok_or(ContentError::MissingToken)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ContentError::Status { status, body });
        }

        Ok(())
    }

    /// CDN URL for an image asset reference, if the project is configured.
    pub fn image_url(&self, asset_ref: &str) -> Option<String> {
        let project_id = self.config.project_id.as_deref()?;
        image_url(project_id, &self.config.dataset, asset_ref)
    }
}

impl ContentSource for ContentClient {
    async fn fetch_seasons(&self) -> Result<Vec<Season>, ContentError> {
        let docs: Vec<SeasonDoc> = self.query(&seasons_query(), &[]).await?;
        let seasons: Vec<Season> = docs.into_iter().filter_map(SeasonDoc::into_season).collect();
        tracing::debug!("Loaded {} seasons", seasons.len());
        Ok(seasons)
    }

    async fn fetch_season_by_label(&self, label: &str) -> Result<Option<Season>, ContentError> {
        let doc: Option<SeasonDoc> = self
            .query(&season_by_label_query(), &[("season", label)])
            .await?;
        Ok(doc.and_then(SeasonDoc::into_season))
    }

    async fn fetch_clubs(&self) -> Result<Vec<Club>, ContentError> {
        let docs: Vec<ClubDoc> = self.query(CLUBS_QUERY, &[]).await?;
        Ok(docs.into_iter().filter_map(ClubDoc::into_club).collect())
    }

    async fn fetch_players(&self) -> Result<Vec<Player>, ContentError> {
        let docs: Vec<PlayerDoc> = self.query(PLAYERS_QUERY, &[]).await?;
        Ok(docs.into_iter().filter_map(PlayerDoc::into_player).collect())
    }

    async fn fetch_document(&self, kind: DocumentKind) -> Result<Value, ContentError> {
        self.query(&kind.query(), &[]).await
    }

    async fn set_league_table(
        &self,
        season_id: &str,
        rows: &[StandingsRow],
    ) -> Result<(), ContentError> {
        let entries: Vec<LeagueTableEntryDoc> = rows.iter().map(LeagueTableEntryDoc::from).collect();
        self.mutate(json!([
            { "patch": { "id": season_id, "set": { "league_table": entries } } }
        ]))
        .await?;
        tracing::info!("League table of season {} updated ({} rows)", season_id, rows.len());
        Ok(())
    }
}

/// Resolve `image-<hash>-<W>x<H>-<ext>` to its CDN URL.
pub fn image_url(project_id: &str, dataset: &str, asset_ref: &str) -> Option<String> {
    let rest = asset_ref.strip_prefix("image-")?;
    let (rest, ext) = rest.rsplit_once('-')?;
    let (hash, dimensions) = rest.rsplit_once('-')?;
    let (width, height) = dimensions.split_once('x')?;

    let valid = !hash.is_empty()
        && !ext.is_empty()
        && width.parse::<u32>().is_ok()
        && height.parse::<u32>().is_ok();
    if !valid {
        return None;
    }

    Some(format!(
        "https://cdn.sanity.io/images/{}/{}/{}-{}.{}",
        project_id, dataset, hash, dimensions, ext
    ))
}

// ── page context ─────────────────────────────────────────────────────────────

/// Everything a page render needs, fetched together.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub nav: Value,
    pub clubs: Vec<Club>,
    pub general: Value,
    pub sponsors: Value,
    pub footer: Value,
    pub social: Value,
    pub policies: Value,
    pub banner: Value,
    pub news: Value,
    pub video: Value,
    pub seasons: Vec<Season>,
}

/// Concurrent fan-out; the first failure fails the whole load.
pub async fn load_page_context<S: ContentSource>(source: &S) -> Result<PageContext, ContentError> {
    let (nav, clubs, general, sponsors, footer, social, policies, banner, news, video, seasons) =
        tokio::try_join!(
            source.fetch_document(DocumentKind::Nav),
            source.fetch_clubs(),
            source.fetch_document(DocumentKind::General),
            source.fetch_document(DocumentKind::Sponsors),
            source.fetch_document(DocumentKind::Footer),
            source.fetch_document(DocumentKind::Social),
            source.fetch_document(DocumentKind::Policies),
            source.fetch_document(DocumentKind::Banner),
            source.fetch_document(DocumentKind::News),
            source.fetch_document(DocumentKind::Video),
            source.fetch_seasons(),
        )?;

    Ok(PageContext {
        nav,
        clubs,
        general,
        sponsors,
        footer,
        social,
        policies,
        banner,
        news,
        video,
        seasons,
    })
}

#[cfg(test)]
pub mod testing {
    //! In-memory content store for exercising code above the boundary.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemorySource {
        pub seasons: Mutex<Vec<Season>>,
        pub clubs: Vec<Club>,
        pub players: Vec<Player>,
        pub documents: HashMap<&'static str, Value>,
        pub fail_reads: bool,
        pub fail_writes: bool,
        pub writes: Mutex<Vec<(String, Vec<StandingsRow>)>>,
    }

    impl MemorySource {
        pub fn with_seasons(seasons: Vec<Season>) -> Self {
            Self {
                seasons: Mutex::new(seasons),
                ..Default::default()
            }
        }

        fn unavailable() -> ContentError {
            ContentError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "unavailable".to_string(),
            }
        }

        fn check_read(&self) -> Result<(), ContentError> {
            if self.fail_reads {
                Err(Self::unavailable())
            } else {
                Ok(())
            }
        }

        pub fn write_count(&self) -> usize {
            self.writes.lock().unwrap().len()
        }
    }

    impl ContentSource for MemorySource {
        async fn fetch_seasons(&self) -> Result<Vec<Season>, ContentError> {
            self.check_read()?;
            Ok(self.seasons.lock().unwrap().clone())
        }

        async fn fetch_season_by_label(&self, label: &str) -> Result<Option<Season>, ContentError> {
            self.check_read()?;
            Ok(self
                .seasons
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.label == label)
                .cloned())
        }

        async fn fetch_clubs(&self) -> Result<Vec<Club>, ContentError> {
            self.check_read()?;
            Ok(self.clubs.clone())
        }

        async fn fetch_players(&self) -> Result<Vec<Player>, ContentError> {
            self.check_read()?;
            Ok(self.players.clone())
        }

        async fn fetch_document(&self, kind: DocumentKind) -> Result<Value, ContentError> {
            self.check_read()?;
            Ok(self
                .documents
                .get(kind.type_name())
                .cloned()
                .unwrap_or(Value::Null))
        }

        async fn set_league_table(
            &self,
            season_id: &str,
            rows: &[StandingsRow],
        ) -> Result<(), ContentError> {
            if self.fail_writes {
                return Err(Self::unavailable());
            }
            let mut seasons = self.seasons.lock().unwrap();
            if let Some(season) = seasons.iter_mut().find(|s| s.id == season_id) {
                season.league_table = rows.to_vec();
            }
            self.writes
                .lock()
                .unwrap()
                .push((season_id.to_string(), rows.to_vec()));
            Ok(())
        }
    }
}
