use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::db::{create_pool, init_database_with_pool};
use crate::models::{ApiResponse, Player, Season};
use crate::services::content::{load_page_context, PageContext};
use crate::services::finalizer::{FinalizeOutcome, IncompleteTableError};
use crate::services::players::{find_by_slug, PlayerFilter};
use crate::services::standings::{season_options, select_season, SeasonLabelError};
use crate::services::{finalize_standings, ContentClient, ContentSource, FixtureScheduler};

pub mod views;

use views::{
    FixturesPageView, LeagueTableView, MatchweekView, PlayerView, PlayersPageView, Presenter,
};

#[derive(Clone)]
pub struct AppState {
    content: Arc<ContentClient>,
    pool: SqlitePool,
    config: Arc<AppConfig>,
    /// Serializes finalize runs; reads never take it.
    finalize_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(content: ContentClient, pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            content: Arc::new(content),
            pool,
            config: Arc::new(config),
            finalize_lock: Arc::new(Mutex::new(())),
        }
    }

    fn presenter(&self) -> Presenter<'_> {
        Presenter {
            now: Utc::now(),
            offset: self.config.display_offset,
            content: &self.content,
        }
    }

    /// Seasons for a read path; a failed fetch reads as "no seasons".
    async fn seasons(&self) -> Vec<Season> {
        self.content.fetch_seasons().await.unwrap_or_else(|e| {
            tracing::error!("Failed to fetch seasons: {}", e);
            Vec::new()
        })
    }

    async fn players(&self) -> Vec<Player> {
        self.content.fetch_players().await.unwrap_or_else(|e| {
            tracing::error!("Failed to fetch players: {}", e);
            Vec::new()
        })
    }
}

pub async fn serve(port: u16, config: AppConfig) -> anyhow::Result<()> {
    let pool = create_pool(&config.database_url).await?;
    init_database_with_pool(&pool).await?;

    if config.content.project_id.is_none() {
        tracing::warn!("CONTENT_PROJECT_ID is not set; content reads will come back empty");
    }

    let content = ContentClient::new(config.content.clone());
    let app = create_router().with_state(AppState::new(content, pool, config));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("League hub API listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/seasons", get(seasons_handler))
        .route("/league-table", get(league_table_handler))
        .route("/matchweeks/current", get(current_matchweek_handler))
        .route("/fixtures", get(fixtures_handler))
        .route("/players", get(players_handler))
        .route("/players/{slug}", get(player_handler))
        .route("/site", get(site_handler))
        .route("/standings/finalize", post(finalize_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("League hub API is running"))
}

#[derive(Debug, Default, Deserialize)]
struct SeasonParams {
    season: Option<String>,
}

// GET /seasons - season filter options, main season first
async fn seasons_handler(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    let seasons = state.seasons().await;
    Json(ApiResponse::success(season_options(&seasons)))
}

// GET /league-table - ranked table of the selected season
async fn league_table_handler(
    State(state): State<AppState>,
    Query(params): Query<SeasonParams>,
) -> Json<ApiResponse<LeagueTableView>> {
    let seasons = state.seasons().await;
    let season = select_season(&seasons, params.season.as_deref());
    let view = state
        .presenter()
        .league_table(season, season_options(&seasons));
    Json(ApiResponse::success(view))
}

// GET /matchweeks/current - matchweek in progress, else the next one
async fn current_matchweek_handler(
    State(state): State<AppState>,
    Query(params): Query<SeasonParams>,
) -> Json<ApiResponse<Option<MatchweekView>>> {
    let seasons = state.seasons().await;
    let presenter = state.presenter();

    let view = select_season(&seasons, params.season.as_deref())
        .and_then(|season| {
            FixtureScheduler::select_current_matchweek(&season.matchweeks, presenter.now)
        })
        .map(|mw| presenter.matchweek(mw));

    Json(ApiResponse::success(view))
}

#[derive(Debug, Default, Deserialize)]
struct FixturesQuery {
    season: Option<String>,
    matchweek: Option<String>,
    page: Option<usize>,
    page_size: Option<usize>,
}

// GET /fixtures - one page of the selected matchweeks' fixtures, grouped by day
async fn fixtures_handler(
    State(state): State<AppState>,
    Query(params): Query<FixturesQuery>,
) -> Json<ApiResponse<FixturesPageView>> {
    let seasons = state.seasons().await;
    let season = select_season(&seasons, params.season.as_deref());
    let page_size = params
        .page_size
        .and_then(NonZeroUsize::new)
        .unwrap_or(state.config.fixtures_page_size);

    let view = state.presenter().fixtures_page(
        season,
        params.matchweek.as_deref().unwrap_or_default(),
        params.page.unwrap_or(0),
        page_size,
    );
    Json(ApiResponse::success(view))
}

#[derive(Debug, Default, Deserialize)]
struct PlayersQuery {
    club: Option<String>,
    search: Option<String>,
    season: Option<String>,
    page: Option<usize>,
}

// GET /players - filtered, paged player listing
async fn players_handler(
    State(state): State<AppState>,
    Query(params): Query<PlayersQuery>,
) -> Json<ApiResponse<PlayersPageView>> {
    let players = state.players().await;
    let filter = PlayerFilter {
        club: params.club,
        search: params.search,
        season: params.season,
    };

    let view = state.presenter().players_page(
        &players,
        &filter,
        params.page.unwrap_or(0),
        state.config.players_page_size,
    );
    Json(ApiResponse::success(view))
}

// GET /players/{slug} - single player profile
async fn player_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<PlayerView>>, StatusCode> {
    let players = state.players().await;
    match find_by_slug(&players, &slug) {
        Some(player) => Ok(Json(ApiResponse::success(state.presenter().player(player)))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// GET /site - shared page context (navigation, clubs, sponsors, ...)
async fn site_handler(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<PageContext>>, StatusCode> {
    match load_page_context(state.content.as_ref()).await {
        Ok(context) => Ok(Json(ApiResponse::success(context))),
        Err(e) => {
            tracing::error!("Failed to load page context: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

type Failure<T> = (StatusCode, Json<ApiResponse<T>>);

// POST /standings/finalize - recompute and persist position changes
async fn finalize_handler(
    State(state): State<AppState>,
    request: Option<Json<SeasonParams>>,
) -> Result<Json<ApiResponse<FinalizeOutcome>>, Failure<FinalizeOutcome>> {
    let season = request.and_then(|Json(params)| params.season);
    let _guard = state.finalize_lock.lock().await;

    match finalize_standings(state.content.as_ref(), &state.pool, season.as_deref()).await {
        Ok(outcome) => Ok(Json(ApiResponse::success(outcome))),
        Err(e) => {
            tracing::error!("Failed to finalize standings: {:#}", e);
            let status = if e.downcast_ref::<SeasonLabelError>().is_some() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else if e.downcast_ref::<IncompleteTableError>().is_some() {
                StatusCode::CONFLICT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err((status, Json(ApiResponse::error(format!("{:#}", e)))))
        }
    }
}
