use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::str::FromStr;

use crate::models::{ClubId, Season, StandingsRow};
use crate::services::standings::Ranking;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if !file_path.starts_with(":memory:") {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database(database_url: &str) -> Result<()> {
    let pool = create_pool(database_url).await?;
    init_database_with_pool(&pool).await
}

/// Called wherever a pool already exists so schema creation shares it.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS standings_snapshots (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            season_id TEXT NOT NULL,
            season_label TEXT NOT NULL,
            taken_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS snapshot_ranks (
            snapshot_id TEXT NOT NULL,
            club_id TEXT NOT NULL,
            rank INTEGER NOT NULL,
            points INTEGER NOT NULL,
            PRIMARY KEY (snapshot_id, club_id),
            FOREIGN KEY (snapshot_id) REFERENCES standings_snapshots (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_snapshots_season ON standings_snapshots(season_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

/// A finalized table ranking as it was recorded.
#[derive(Debug, Clone)]
pub struct StoredSnapshot {
    pub id: String,
    pub season_label: String,
    pub taken_at: DateTime<Utc>,
    pub ranking: Ranking,
}

/// Record `ranked` (already in table order) as the season's newest snapshot.
pub async fn record_snapshot(
    pool: &SqlitePool,
    season: &Season,
    ranked: &[StandingsRow],
) -> Result<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let taken_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO standings_snapshots (id, season_id, season_label, taken_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&season.id)
    .bind(&season.label)
    .bind(&taken_at)
    .execute(&mut *tx)
    .await?;

    for (index, row) in ranked.iter().enumerate() {
        sqlx::query(
            "INSERT OR REPLACE INTO snapshot_ranks (snapshot_id, club_id, rank, points) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(row.club.id.as_str())
        .bind((index + 1) as i64)
        .bind(row.points)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "Recorded standings snapshot {} for season {} ({} clubs)",
        id,
        season.label,
        ranked.len()
    );
    Ok(id)
}

pub async fn latest_snapshot(pool: &SqlitePool, season_id: &str) -> Result<Option<StoredSnapshot>> {
    let row = sqlx::query(
        "SELECT id, season_label, taken_at FROM standings_snapshots WHERE season_id = ? ORDER BY seq DESC LIMIT 1",
    )
    .bind(season_id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let id: String = row.get("id");
    let ranks = sqlx::query("SELECT club_id, rank FROM snapshot_ranks WHERE snapshot_id = ?")
        .bind(&id)
        .fetch_all(pool)
        .await?;

    let mut ranking = Ranking::new();
    for r in ranks {
        let club_id: String = r.get("club_id");
        let rank: i64 = r.get("rank");
        ranking.insert(ClubId(club_id), usize::try_from(rank)?);
    }

    Ok(Some(StoredSnapshot {
        id,
        season_label: row.get("season_label"),
        taken_at: DateTime::parse_from_rfc3339(&row.get::<String, _>("taken_at"))?
            .with_timezone(&Utc),
        ranking,
    }))
}


#[cfg(test)]
mod tests {
    use super::testing::memory_pool;
    use super::*;
    use crate::models::{Club, PositionChange};

    fn row(club: &str, points: i32) -> StandingsRow {
        StandingsRow {
            key: None,
            club: Club {
                id: ClubId::from(club),
                name: club.to_string(),
                link: None,
                logo: None,
            },
            played: 0,
            won: 0,
            drawn: 0,
            lost: 0,
            goals_for: 0,
            goals_against: 0,
            points,
            position_change: PositionChange::Neither,
        }
    }

    fn season() -> Season {
        Season {
            id: "season-2024".into(),
            label: "2024/2025".into(),
            main: true,
            league_table: vec![],
            skipped_table_rows: 0,
            matchweeks: vec![],
        }
    }

    #[tokio::test]
    async fn test_no_snapshot_yet() {
        let pool = memory_pool().await;
        assert!(latest_snapshot(&pool, "season-2024").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_snapshot_wins() {
        let pool = memory_pool().await;
        let season = season();

        record_snapshot(&pool, &season, &[row("a", 9), row("b", 3)]).await.unwrap();
        let second = record_snapshot(&pool, &season, &[row("b", 12), row("a", 9)]).await.unwrap();

        let latest = latest_snapshot(&pool, &season.id).await.unwrap().unwrap();
        assert_eq!(latest.id, second);
        assert_eq!(latest.season_label, "2024/2025");
        assert_eq!(latest.ranking[&ClubId::from("b")], 1);
        assert_eq!(latest.ranking[&ClubId::from("a")], 2);

        assert!(latest_snapshot(&pool, "other-season").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let pool = memory_pool().await;
        init_database_with_pool(&pool).await.unwrap();
    }
}
